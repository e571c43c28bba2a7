//! Error types for Edgeflow.
//!
//! All errors in Edgeflow are represented by the `EdgeflowError` enum,
//! which provides specific variants for different error categories.

use std::io::ErrorKind;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all Edgeflow operations.
///
/// Errors are cloneable and serializable so a view controller can report
/// them back over the view channel without losing the category.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum EdgeflowError {
    /// A route string that does not follow the route grammar.
    #[error("malformed route: {text}")]
    RouteDecode {
        text: String,
    },

    /// Route creation rejected (self loop, unknown or illegal endpoint).
    #[error("{0}")]
    InvalidRoute(String),

    /// Module lookup or naming errors.
    #[error("{0}")]
    Module(String),

    /// Manifest shape errors.
    #[error("{0}")]
    Manifest(String),

    /// Edit session misuse.
    #[error("{0}")]
    Session(String),

    /// View protocol errors.
    #[error("{0}")]
    Protocol(String),

    /// Configuration parsing errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON, TOML).
    #[error("{0}")]
    Convert(String),

    /// Message queue errors.
    #[error("{0}")]
    Queue(String),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),
}

impl EdgeflowError {
    pub(crate) fn route_decode(text: &str) -> Self {
        EdgeflowError::RouteDecode {
            text: text.to_string(),
        }
    }
}

impl From<EdgeflowError> for String {
    fn from(val: EdgeflowError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for EdgeflowError {
    fn from(error: std::io::Error) -> Self {
        EdgeflowError::IoError(error.to_string())
    }
}

impl From<EdgeflowError> for std::io::Error {
    fn from(val: EdgeflowError) -> Self {
        #[allow(clippy::io_other_error)]
        std::io::Error::new(ErrorKind::Other, val.to_string())
    }
}

impl From<serde_json::Error> for EdgeflowError {
    fn from(error: serde_json::Error) -> Self {
        EdgeflowError::Convert(error.to_string())
    }
}

impl From<toml::de::Error> for EdgeflowError {
    fn from(error: toml::de::Error) -> Self {
        EdgeflowError::Config(error.to_string())
    }
}

impl From<jsonschema::ValidationError<'_>> for EdgeflowError {
    fn from(error: jsonschema::ValidationError<'_>) -> Self {
        EdgeflowError::Manifest(format!("invalid manifest: {}", error))
    }
}
