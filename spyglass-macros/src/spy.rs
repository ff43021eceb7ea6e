//! Implementation of the `#[spy]` attribute.
//!
//! For `trait Foo` the expansion emits, next to the trait itself:
//!
//! - `struct FooSpy { spy: Spy }` with `Debug`, `Deref<Target = Spy>` and
//!   `SpyContract` (descriptor built from the method signatures)
//! - a hidden marker trait `__SpyglassFooMarker`, implemented for `FooSpy`
//! - a blanket `impl<T: SpyContract + __SpyglassFooMarker> Foo for T` that
//!   forwards every intercepted method to `Spy::handle`
//!
//! The blanket impl lets a spy of a subtrait implement a spied supertrait:
//! `#[spy(supertraits(Foo))] trait Bar: Foo` implements `__SpyglassFooMarker`
//! for `BarSpy`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{ToTokens, format_ident, quote};
use syn::{
    Attribute, Error, FnArg, GenericParam, Ident, ItemTrait, Pat, Path, PathArguments, ReturnType,
    Token, TraitItem, TraitItemFn, Type, parse::Parser, punctuated::Punctuated, spanned::Spanned,
};

/// Options of the trait-level attribute.
#[derive(Default)]
struct SpyArgs {
    supertraits: Vec<Path>,
}

impl SpyArgs {
    fn parse(attr: TokenStream2) -> syn::Result<Self> {
        let mut args = Self::default();
        let parser = syn::meta::parser(|meta| {
            if meta.path.is_ident("supertraits") {
                let content;
                syn::parenthesized!(content in meta.input);
                let paths = Punctuated::<Path, Token![,]>::parse_terminated(&content)?;
                args.supertraits.extend(paths);
                Ok(())
            } else {
                Err(meta.error("unsupported #[spy] option; expected `supertraits(...)`"))
            }
        });
        parser.parse2(attr)?;
        Ok(args)
    }
}

/// How one trait method is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Plan {
    /// Forwarded to the spy.
    Intercept,
    /// Left to its default body; described as final.
    Passthrough,
    /// No receiver; left to its default body; described as static and final.
    Static,
}

pub fn spy_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    match expand(attr.into(), item.into()) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(attr: TokenStream2, item: TokenStream2) -> syn::Result<TokenStream2> {
    let args = SpyArgs::parse(attr)?;
    let mut item_trait: ItemTrait = syn::parse2(item)?;
    validate_trait(&item_trait)?;
    let methods = plan_methods(&mut item_trait)?;

    let vis = &item_trait.vis;
    let trait_ident = &item_trait.ident;
    let trait_name = trait_ident.to_string();
    let spy_ident = format_ident!("{}Spy", trait_ident);
    let marker_ident = marker_for(trait_ident);
    let blanket = format_ident!("__SpyglassT");

    let super_bounds = &item_trait.supertraits;
    let super_where = if super_bounds.is_empty() {
        quote! {}
    } else {
        quote! { #blanket: #super_bounds, }
    };

    let super_names: Vec<String> = args
        .supertraits
        .iter()
        .filter_map(|p| p.segments.last().map(|s| s.ident.to_string()))
        .collect();
    let super_markers: Vec<Path> = args
        .supertraits
        .iter()
        .map(|p| sibling_path(p, marker_for))
        .collect();
    let super_spies: Vec<Path> = args
        .supertraits
        .iter()
        .map(|p| sibling_path(p, |ident| format_ident!("{}Spy", ident)))
        .collect();

    let supertype_descriptors = if super_spies.is_empty() {
        quote! { ::std::vec::Vec::new() }
    } else {
        quote! {
            let mut out = ::std::vec::Vec::new();
            #(
                out.extend(<#super_spies as ::spyglass::SpyContract>::supertype_descriptors());
                out.push(<#super_spies as ::spyglass::SpyContract>::contract_descriptor());
            )*
            out
        }
    };

    let descriptors = methods.iter().map(|(method, plan)| describe_method(method, *plan));
    let forwards = methods
        .iter()
        .filter(|(_, plan)| *plan == Plan::Intercept)
        .map(|(method, _)| forward_method(method));

    let struct_doc = format!("Spy proxy implementing [`{trait_name}`].");
    let marker_doc = format!("Marks spy proxies that implement `{trait_name}` by forwarding.");

    Ok(quote! {
        #item_trait

        #[doc = #struct_doc]
        #vis struct #spy_ident {
            spy: ::spyglass::Spy,
        }

        #[doc = #marker_doc]
        #[doc(hidden)]
        #vis trait #marker_ident {}

        impl #marker_ident for #spy_ident {}
        #( impl #super_markers for #spy_ident {} )*

        impl<#blanket> #trait_ident for #blanket
        where
            #blanket: ::spyglass::SpyContract + #marker_ident,
            #super_where
        {
            #(#forwards)*
        }

        impl ::spyglass::SpyContract for #spy_ident {
            fn contract_descriptor() -> ::spyglass::__private::ContractDescriptor {
                ::spyglass::__private::ContractDescriptor::interface(#trait_name)
                    #( .extends(#super_names) )*
                    #(#descriptors)*
            }

            fn supertype_descriptors() -> ::std::vec::Vec<::spyglass::__private::ContractDescriptor> {
                #supertype_descriptors
            }

            fn from_spy(spy: ::spyglass::Spy) -> Self {
                Self { spy }
            }

            fn as_spy(&self) -> &::spyglass::Spy {
                &self.spy
            }
        }

        impl ::core::ops::Deref for #spy_ident {
            type Target = ::spyglass::Spy;

            fn deref(&self) -> &::spyglass::Spy {
                &self.spy
            }
        }

        impl ::core::fmt::Debug for #spy_ident {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.debug_tuple(::core::stringify!(#spy_ident)).field(&self.spy).finish()
            }
        }
    })
}

fn marker_for(trait_ident: &Ident) -> Ident {
    format_ident!("__Spyglass{}Marker", trait_ident)
}

/// Replaces the last segment of `path` with `f(last)`.
fn sibling_path(path: &Path, f: impl Fn(&Ident) -> Ident) -> Path {
    let mut path = path.clone();
    if let Some(last) = path.segments.last_mut() {
        last.ident = f(&last.ident);
        last.arguments = PathArguments::None;
    }
    path
}

fn validate_trait(item: &ItemTrait) -> syn::Result<()> {
    if let Some(unsafety) = &item.unsafety {
        return Err(Error::new(unsafety.span(), "#[spy] does not support unsafe traits"));
    }
    if !item.generics.params.is_empty() {
        return Err(Error::new(
            item.generics.span(),
            "#[spy] does not support generic traits",
        ));
    }
    for trait_item in &item.items {
        match trait_item {
            TraitItem::Fn(method) => validate_method(method)?,
            TraitItem::Type(ty) => {
                return Err(Error::new(
                    ty.span(),
                    "#[spy] does not support associated types",
                ));
            }
            TraitItem::Const(c) => {
                return Err(Error::new(
                    c.span(),
                    "#[spy] does not support associated constants",
                ));
            }
            other => {
                return Err(Error::new(other.span(), "#[spy] cannot expand this trait item"));
            }
        }
    }
    Ok(())
}

fn validate_method(method: &TraitItemFn) -> syn::Result<()> {
    let sig = &method.sig;
    if let Some(asyncness) = &sig.asyncness {
        return Err(Error::new(asyncness.span(), "#[spy] does not support async methods"));
    }
    if let Some(unsafety) = &sig.unsafety {
        return Err(Error::new(unsafety.span(), "#[spy] does not support unsafe methods"));
    }
    if let Some(param) = sig
        .generics
        .params
        .iter()
        .find(|p| !matches!(p, GenericParam::Lifetime(_)))
    {
        return Err(Error::new(param.span(), "#[spy] does not support generic methods"));
    }
    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input
            && matches!(*pat_type.ty, Type::ImplTrait(_))
        {
            return Err(Error::new(
                pat_type.ty.span(),
                "#[spy] does not support `impl Trait` arguments",
            ));
        }
    }
    if let ReturnType::Type(_, ty) = &sig.output {
        match &**ty {
            Type::Reference(r) => {
                return Err(Error::new(
                    r.span(),
                    "#[spy] cannot return references; return an owned value",
                ));
            }
            Type::ImplTrait(i) => {
                return Err(Error::new(
                    i.span(),
                    "#[spy] does not support `impl Trait` return types",
                ));
            }
            _ => {}
        }
    }
    if sig.receiver().is_none() && method.default.is_none() {
        return Err(Error::new(
            sig.ident.span(),
            "#[spy] methods without a receiver need a default body",
        ));
    }
    Ok(())
}

/// Classifies every method and strips `#[spy(passthrough)]` from the trait.
fn plan_methods(item: &mut ItemTrait) -> syn::Result<Vec<(TraitItemFn, Plan)>> {
    let mut out = Vec::new();
    for trait_item in &mut item.items {
        let TraitItem::Fn(method) = trait_item else {
            continue;
        };
        let passthrough = take_passthrough(&mut method.attrs)?;
        if passthrough && method.default.is_none() {
            return Err(Error::new(
                method.sig.ident.span(),
                "#[spy(passthrough)] requires a default body",
            ));
        }
        let plan = if method.sig.receiver().is_none() {
            Plan::Static
        } else if passthrough {
            Plan::Passthrough
        } else {
            Plan::Intercept
        };
        out.push((method.clone(), plan));
    }
    Ok(out)
}

fn take_passthrough(attrs: &mut Vec<Attribute>) -> syn::Result<bool> {
    let mut found = false;
    let mut kept = Vec::with_capacity(attrs.len());
    for attr in attrs.drain(..) {
        if attr.path().is_ident("spy") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("passthrough") {
                    found = true;
                    Ok(())
                } else {
                    Err(meta.error("unsupported #[spy] method option; expected `passthrough`"))
                }
            })?;
        } else {
            kept.push(attr);
        }
    }
    *attrs = kept;
    Ok(found)
}

fn describe_method(method: &TraitItemFn, plan: Plan) -> TokenStream2 {
    let name = method.sig.ident.to_string();
    let params = typed_inputs(method).enumerate().map(|(i, pat_type)| {
        let param_name = match &*pat_type.pat {
            Pat::Ident(p) => p.ident.to_string(),
            _ => format!("arg{i}"),
        };
        let type_name = type_string(&pat_type.ty);
        quote! { .param(::spyglass::__private::Param::new(#param_name).typed(#type_name)) }
    });
    let modifiers = match plan {
        Plan::Intercept => quote! {},
        Plan::Passthrough => quote! { .final_method() },
        Plan::Static => quote! { .static_method().final_method() },
    };
    quote! {
        .method(::spyglass::__private::MethodSignature::new(#name) #(#params)* #modifiers)
    }
}

fn forward_method(method: &TraitItemFn) -> TokenStream2 {
    let mut sig = method.sig.clone();
    let name = sig.ident.to_string();
    let mut args = Vec::new();
    for input in &mut sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            let ident = format_ident!("__spyglass_arg{}", args.len());
            *pat_type.pat = syn::parse_quote!(#ident);
            args.push(ident);
        }
    }
    let outcome = quote! {
        <Self as ::spyglass::SpyContract>::as_spy(&self).handle(
            #name,
            ::std::vec![#(::spyglass::__private::ToValue::to_value(&#args)),*],
        )
    };
    let body = if returns_result(&sig.output) {
        quote! { ::spyglass::__private::returned_result(#outcome) }
    } else {
        quote! { ::spyglass::__private::returned(#outcome) }
    };
    quote! {
        #sig {
            #body
        }
    }
}

fn typed_inputs(method: &TraitItemFn) -> impl Iterator<Item = &syn::PatType> {
    method.sig.inputs.iter().filter_map(|input| match input {
        FnArg::Typed(pat_type) => Some(pat_type),
        FnArg::Receiver(_) => None,
    })
}

fn returns_result(output: &ReturnType) -> bool {
    let ReturnType::Type(_, ty) = output else {
        return false;
    };
    let Type::Path(type_path) = &**ty else {
        return false;
    };
    type_path.qself.is_none()
        && type_path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Result")
}

/// Renders a type compactly: `&str`, `Vec<String>`, `Option<&'a T>`.
fn type_string(ty: &Type) -> String {
    let mut s = ty.to_token_stream().to_string();
    for (from, to) in [
        ("& ", "&"),
        (" <", "<"),
        ("< ", "<"),
        (" >", ">"),
        (" ,", ","),
        (" ::", "::"),
        (":: ", "::"),
        ("( ", "("),
        (" )", ")"),
    ] {
        s = s.replace(from, to);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_ok(attr: TokenStream2, item: TokenStream2) -> String {
        expand(attr, item).unwrap().to_string()
    }

    fn expand_err(attr: TokenStream2, item: TokenStream2) -> String {
        expand(attr, item).unwrap_err().to_string()
    }

    #[test]
    fn test_generates_spy_struct_and_contract() {
        let out = expand_ok(
            quote! {},
            quote! {
                pub trait Greeter {
                    fn greet(&self, name: &str) -> String;
                    fn count(&mut self) -> u32;
                }
            },
        );
        assert!(out.contains("pub struct GreeterSpy"));
        assert!(out.contains("__SpyglassGreeterMarker"));
        assert!(out.contains("\"greet\""));
        assert!(out.contains("\"count\""));
        assert!(out.contains("\"&str\""));
        assert!(out.contains("__spyglass_arg0"));
        assert!(out.contains("returned"));
        assert!(!out.contains("returned_result"));
    }

    #[test]
    fn test_result_returns_use_result_helper() {
        let out = expand_ok(
            quote! {},
            quote! {
                trait Store {
                    fn put(&self, key: String, value: i64) -> Result<(), StoreError>;
                }
            },
        );
        assert!(out.contains("returned_result"));
        assert!(out.contains("__spyglass_arg1"));
    }

    #[test]
    fn test_passthrough_is_stripped_and_final() {
        let out = expand_ok(
            quote! {},
            quote! {
                trait Shape {
                    fn area(&self) -> f64;
                    #[spy(passthrough)]
                    fn describe(&self) -> String { String::from("shape") }
                    fn unit() -> Self where Self: Sized { unimplemented!() }
                }
            },
        );
        assert!(!out.contains("passthrough"));
        assert!(out.contains("final_method"));
        assert!(out.contains("static_method"));
    }

    #[test]
    fn test_supertraits_implement_markers() {
        let out = expand_ok(
            quote! { supertraits(Base, outer::Other) },
            quote! {
                trait Derived: Base + outer::Other {
                    fn derived(&self);
                }
            },
        );
        assert!(out.contains("impl __SpyglassBaseMarker for DerivedSpy"));
        assert!(out.contains("__SpyglassOtherMarker for DerivedSpy"));
        assert!(out.contains("BaseSpy as :: spyglass :: SpyContract"));
        assert!(out.contains(". extends (\"Base\")") || out.contains(".extends(\"Base\")"));
    }

    #[test]
    fn test_parse_args_rejects_unknown_option() {
        let err = expand_err(quote! { frobnicate }, quote! { trait T { fn a(&self); } });
        assert!(err.contains("unsupported #[spy] option"));
    }

    #[test]
    fn test_rejects_unsupported_shapes() {
        let cases = [
            (quote! { trait T<X> { fn a(&self); } }, "generic traits"),
            (quote! { trait T { type Item; } }, "associated types"),
            (quote! { trait T { const N: usize; } }, "associated constants"),
            (quote! { trait T { async fn a(&self); } }, "async methods"),
            (quote! { trait T { fn a(&self) -> &str; } }, "cannot return references"),
            (quote! { trait T { fn a<U>(&self, u: U); } }, "generic methods"),
            (quote! { trait T { fn a(&self, u: impl Clone); } }, "`impl Trait` arguments"),
            (quote! { trait T { fn make() -> u8; } }, "need a default body"),
            (
                quote! { trait T { #[spy(passthrough)] fn a(&self); } },
                "requires a default body",
            ),
        ];
        for (item, expected) in cases {
            let err = expand_err(quote! {}, item);
            assert!(err.contains(expected), "{err:?} does not mention {expected:?}");
        }
    }

    #[test]
    fn test_lifetime_generics_are_allowed() {
        let out = expand_ok(
            quote! {},
            quote! { trait T { fn a<'a>(&self, s: &'a str) -> usize; } },
        );
        assert!(out.contains("TSpy"));
    }

    #[test]
    fn test_type_string_is_compact() {
        let ty: Type = syn::parse_quote!(Option<Vec<&'a str>>);
        assert_eq!(type_string(&ty), "Option<Vec<&'a str>>");
        let ty: Type = syn::parse_quote!(std::collections::BTreeMap<String, i64>);
        assert_eq!(type_string(&ty), "std::collections::BTreeMap<String, i64>");
    }
}
