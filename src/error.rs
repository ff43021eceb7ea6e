//! Error types for spyglass.
//!
//! Every fallible operation returns [`Error`], a small struct carrying an
//! [`ErrorKind`], an optional message and an optional shared source error.
//!
//! # Error Kinds
//!
//! - **InvalidArgument**: unknown contract, zero causal query lists,
//!   non-callable returnable, missing required proxy argument
//! - **Responder**: an error raised by a bound responder; it reaches the caller
//!   of the spied method unmodified
//! - **Conversion**: a responder's value cannot become the declared return type
//! - **NotInterceptable**: a final contract method was called on a dynamic proxy
//! - **Config**: configuration loading or validation failed
//!
//! Nothing in spyglass retries. Every operation is a single deterministic attempt.

use core::fmt;
use std::sync::Arc;

/// The kind of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A caller supplied an argument the operation cannot accept.
    InvalidArgument,
    /// A bound responder raised an error.
    Responder,
    /// A responder value could not be converted to the expected type.
    Conversion,
    /// The method exists on the contract but cannot be intercepted.
    NotInterceptable,
    /// Configuration error (invalid env var, bad config file, etc.).
    Config,
}

impl ErrorKind {
    /// Returns a short, stable name for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid argument",
            Self::Responder => "responder error",
            Self::Conversion => "conversion error",
            Self::NotInterceptable => "method not interceptable",
            Self::Config => "configuration error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The main error type for spyglass operations.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Creates an invalid-argument error with a message.
    #[must_use]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument).with_message(msg)
    }

    /// Wraps an error raised by a responder.
    ///
    /// The wrapped error stays reachable through [`source`](std::error::Error::source)
    /// and [`downcast_source`](Self::downcast_source).
    #[must_use]
    pub fn responder(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::new(ErrorKind::Responder).with_source(source)
    }

    /// Wraps an already shared responder error without re-allocating it.
    #[must_use]
    pub fn responder_shared(source: Arc<dyn std::error::Error + Send + Sync>) -> Self {
        Self {
            kind: ErrorKind::Responder,
            message: None,
            source: Some(source),
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns true if this is an invalid-argument error.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidArgument)
    }

    /// Returns true if this error was raised by a responder.
    #[must_use]
    pub const fn is_responder_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Responder)
    }

    /// Adds a message description to the error.
    #[must_use]
    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Adds a source error to the chain.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Returns the source error downcast to `E`, if it has that type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_deref().and_then(|s| s.downcast_ref::<E>())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(msg) = &self.message {
            write!(f, ": {msg}")?;
        }
        if let Some(source) = &self.source {
            write!(f, " ({source})")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// A specialized Result type for spyglass operations.
pub type Result<T> = core::result::Result<T, Error>;
