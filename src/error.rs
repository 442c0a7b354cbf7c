// src/error.rs

//! Unified error handling for the checker.
//!
//! Errors here are fatal to a run. Failures that only affect a single target
//! are modelled by [`CheckError`](crate::models::CheckError) instead and never
//! leave that target's processing.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for checker operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A configured target was rejected before any check ran
    #[error("Invalid target '{target}': {message}")]
    ConfigInvalid { target: String, message: String },

    /// The persisted state file exists but cannot be parsed
    #[error("State file {} is corrupt: {source}", path.display())]
    StateFileCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid-target error.
    pub fn config_invalid(target: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::ConfigInvalid {
            target: target.into(),
            message: message.to_string(),
        }
    }

    /// Create a corrupt-state error.
    pub fn state_corrupt(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::StateFileCorrupt {
            path: path.into(),
            source,
        }
    }
}
