//! Conversions between Rust types and [`Value`].
//!
//! [`ToValue`] borrows a typed argument and produces the [`Value`] recorded in
//! the ledger. [`FromValue`] turns a responder's [`Value`] back into the
//! return type a typed proxy method declares. `Null` converts to the target
//! type's zero value, which is how the default fallback responder presents
//! through a typed proxy.

use crate::error::{Error, ErrorKind};
use crate::value::{ObjectRef, Value};
use std::collections::BTreeMap;

/// Error converting a [`Value`] into a Rust type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// The value has a different variant than the target type accepts.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// What the target type accepts.
        expected: &'static str,
        /// The variant that was supplied.
        found: &'static str,
    },
    /// The integer does not fit the target integer type.
    #[error("integer {value} out of range for {target}")]
    OutOfRange {
        /// The supplied integer.
        value: i64,
        /// The target type name.
        target: &'static str,
    },
    /// The object does not hold a value of the target type.
    #[error("object of type {found} is not a {expected}")]
    ObjectType {
        /// The requested Rust type.
        expected: &'static str,
        /// The type held by the object.
        found: &'static str,
    },
}

impl ConversionError {
    fn mismatch(expected: &'static str, found: &Value) -> Self {
        Self::TypeMismatch {
            expected,
            found: found.type_name(),
        }
    }
}

impl From<ConversionError> for Error {
    fn from(err: ConversionError) -> Self {
        Self::new(ErrorKind::Conversion)
            .with_message(err.to_string())
            .with_source(err)
    }
}

/// Borrowing conversion into a recorded [`Value`].
pub trait ToValue {
    /// Produces the value recorded for this argument.
    fn to_value(&self) -> Value;
}

/// Conversion of a responder result into a declared return type.
pub trait FromValue: Sized {
    /// Converts the value, consuming it.
    fn from_value(value: Value) -> Result<Self, ConversionError>;
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for &mut T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for Box<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl ToValue for ObjectRef {
    fn to_value(&self) -> Value {
        Value::Object(self.clone())
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Str(self.to_owned())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }
}

impl ToValue for () {
    fn to_value(&self) -> Value {
        Value::Null
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, ToValue::to_value)
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

impl<T: ToValue, const N: usize> ToValue for [T; N] {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

impl<V: ToValue> ToValue for BTreeMap<String, V> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_value()))
                .collect(),
        )
    }
}

macro_rules! copy_to_value {
    ($($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::from(*self)
                }
            }
        )*
    };
}

copy_to_value!(bool, i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64, char);

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        Ok(value)
    }
}

impl FromValue for () {
    fn from_value(_value: Value) -> Result<Self, ConversionError> {
        Ok(())
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(b),
            other => Err(ConversionError::mismatch("bool", &other)),
        }
    }
}

macro_rules! int_from_value {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, ConversionError> {
                    match value {
                        Value::Null => Ok(0),
                        Value::Int(i) => <$ty>::try_from(i).map_err(|_| {
                            ConversionError::OutOfRange {
                                value: i,
                                target: stringify!($ty),
                            }
                        }),
                        other => Err(ConversionError::mismatch("int", &other)),
                    }
                }
            }
        )*
    };
}

int_from_value!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(0.0),
            other => other
                .as_f64()
                .ok_or_else(|| ConversionError::mismatch("number", &other)),
        }
    }
}

impl FromValue for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        f64::from_value(value).map(|f| f as Self)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Str(s) => Ok(s),
            other => Err(ConversionError::mismatch("string", &other)),
        }
    }
}

impl FromValue for ObjectRef {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Object(obj) => Ok(obj),
            other => Err(ConversionError::mismatch("object", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(ConversionError::mismatch("list", &other)),
        }
    }
}

impl<V: FromValue> FromValue for BTreeMap<String, V> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Map(map) => map
                .into_iter()
                .map(|(k, v)| V::from_value(v).map(|v| (k, v)))
                .collect(),
            other => Err(ConversionError::mismatch("map", &other)),
        }
    }
}

/// Recovers a concrete value stored in a [`Value::Object`] by cloning it.
///
/// Returns `None` for `Null`, so a default fallback reads as "no object".
pub fn object_from_value<T>(value: Value) -> Result<Option<T>, ConversionError>
where
    T: Clone + Send + Sync + 'static,
{
    match value {
        Value::Null => Ok(None),
        Value::Object(obj) => obj
            .downcast_ref::<T>()
            .cloned()
            .map(Some)
            .ok_or(ConversionError::ObjectType {
                expected: std::any::type_name::<T>(),
                found: obj.type_name(),
            }),
        other => Err(ConversionError::mismatch("object", &other)),
    }
}
