//! Error types for loader operations

use crate::client::FetchError;
use std::io;
use thiserror::Error;

// Internal use only
use secretsmanager_loader_core::ParseError;

/// The main error type for loader operations
///
/// Fetch and decode failures carry the storage key and the version label
/// that was attempted so callers can log actionable context.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),
    #[error(
        "No environment configured for service '{service}'.\n\nSet SECRETSMANAGER_ENVIRONMENT or pass an environment when constructing the loader"
    )]
    MissingEnvironment { service: String },
    #[error("Failed to fetch secret '{key}' (version: {}): {source}", display_version(.version))]
    SecretFetch {
        key: String,
        version: Option<String>,
        #[source]
        source: FetchError,
    },
    #[error("Failed to decode secret '{key}' (version: {}): {reason}", display_version(.version))]
    SecretDecode {
        key: String,
        version: Option<String>,
        reason: String,
    },
    #[error("Client backend '{0}' not found")]
    ClientNotFound(String),
    #[error("Client operation failed: {0}")]
    ClientOperationFailed(String),
    #[error("Invalid settings: {0}")]
    Settings(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LoaderError {
    /// Returns the storage key attached to fetch and decode failures.
    pub fn key(&self) -> Option<&str> {
        match self {
            LoaderError::SecretFetch { key, .. } | LoaderError::SecretDecode { key, .. } => {
                Some(key)
            }
            _ => None,
        }
    }

    /// Returns the version label attached to fetch and decode failures.
    pub fn version(&self) -> Option<&str> {
        match self {
            LoaderError::SecretFetch { version, .. } | LoaderError::SecretDecode { version, .. } => {
                version.as_deref()
            }
            _ => None,
        }
    }
}

fn display_version(version: &Option<String>) -> &str {
    version.as_deref().unwrap_or("current")
}

/// A type alias for `Result<T, LoaderError>`
pub type Result<T> = std::result::Result<T, LoaderError>;

impl From<ParseError> for LoaderError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Io(io_err) => LoaderError::Io(io_err),
            ParseError::Toml(toml_err) => LoaderError::Settings(toml_err.to_string()),
            ParseError::Validation(msg) => LoaderError::Settings(msg),
        }
    }
}
