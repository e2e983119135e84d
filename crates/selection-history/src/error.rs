#![forbid(unsafe_code)]

//! Error types for persistence and configuration.
//!
//! Navigation itself never fails: empty history and dead references are
//! ordinary conditions. Only the store and config layers can error, and
//! [`HistorySession`](crate::HistorySession) logs and swallows store errors
//! so nothing reaches the end user.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures reading or writing persisted history.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The backing file could not be read or written.
    #[error("history store I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A record or store file could not be encoded or decoded.
    #[error("history JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// The store file exists but is not a key/value object.
    #[error("history store at {} is corrupt: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },
    /// The record was written by an incompatible format version.
    #[error("unsupported history record version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures loading a [`HistoryConfig`](crate::HistoryConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading the config file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// TOML parse error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// JSON parse error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// Parsed values out of range.
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}
