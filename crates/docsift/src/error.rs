//! Error types for docsift.
//!
//! Every fallible operation in the crate returns [`DocsiftError`]. The variants
//! line up with the failure classes a caller has to tell apart:
//!
//! - **Resource errors**: `Io` (local path could not be opened or read) and
//!   `Network` (connection refused, timeout, non-2xx status, FTP failure).
//!   These always bubble up unchanged.
//! - **Unsupported types**: `UnsupportedFormat` carries the resolved media type.
//! - **Encrypted content**: `Encrypted` when a credential is missing or wrong.
//! - **Malformed options**: `Validation`, raised before any input byte is read.
//! - **Decode-time errors**: `Parsing`, propagated from the decoder as-is.
//!
//! # Example
//!
//! ```rust
//! use docsift::{DocsiftError, Result};
//!
//! fn parse_tolerance(raw: &str) -> Result<f32> {
//!     raw.parse::<f32>()
//!         .map_err(|e| DocsiftError::validation_with_source(format!("'{}' is not a number", raw), e))
//! }
//!
//! assert!(parse_tolerance("abc").is_err());
//! ```
use thiserror::Error;

/// Result type alias using `DocsiftError`.
pub type Result<T> = std::result::Result<T, DocsiftError>;

/// Main error type for all docsift operations.
#[derive(Debug, Error)]
pub enum DocsiftError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error for '{locator}': {message}")]
    Network {
        locator: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported media type: {mime_type}")]
    UnsupportedFormat { mime_type: String },

    #[error("Encrypted document: {message}")]
    Encrypted { message: String },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Parsing error: {message}")]
    Parsing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("OCR error: {message}")]
    Ocr {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Plugin error in '{plugin_name}': {message}")]
    Plugin { message: String, plugin_name: String },

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Embedded documents nested deeper than {depth} levels")]
    RecursionLimit { depth: usize },

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for DocsiftError {
    fn from(err: serde_json::Error) -> Self {
        DocsiftError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl DocsiftError {
    error_constructor!(parsing, Parsing);
    error_constructor!(ocr, Ocr);
    error_constructor!(validation, Validation);
    error_constructor!(serialization, Serialization);

    /// Create a Network error for the given locator.
    pub fn network<L: Into<String>, S: Into<String>>(locator: L, message: S) -> Self {
        Self::Network {
            locator: locator.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a Network error for the given locator with source.
    pub fn network_with_source<L, S, E>(locator: L, message: S, source: E) -> Self
    where
        L: Into<String>,
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            locator: locator.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an UnsupportedFormat error naming the resolved media type.
    pub fn unsupported<S: Into<String>>(mime_type: S) -> Self {
        Self::UnsupportedFormat {
            mime_type: mime_type.into(),
        }
    }

    /// Create an Encrypted error.
    pub fn encrypted<S: Into<String>>(message: S) -> Self {
        Self::Encrypted {
            message: message.into(),
        }
    }

    /// True for failures to acquire the input (local I/O or network).
    pub fn is_resource_error(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Network { .. })
    }
}
