//! Error types shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by a key/value store backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A stored value could not be decoded.
    #[error("corrupt value under '{key}': {message}")]
    Corrupt { key: String, message: String },
}

/// Errors raised while refreshing the translation cache from disk.
#[derive(Error, Debug)]
pub enum RefreshError {
    #[error("resource directory {0} does not exist")]
    MissingDirectory(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("invalid resource pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// Errors raised while parsing a culture tag.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid culture tag '{0}'")]
pub struct CultureError(pub String);

/// Errors raised while applying positional format arguments.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("placeholder {{{index}}} has no matching argument ({count} supplied)")]
    MissingArgument { index: usize, count: usize },

    #[error("malformed placeholder at byte {0}")]
    Malformed(usize),
}

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be a number, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },

    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },

    #[error("{name}: {source}")]
    InvalidCulture {
        name: &'static str,
        #[source]
        source: CultureError,
    },
}
