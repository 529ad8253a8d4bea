//! Error types for the configuration change-detection engine.

use thiserror::Error;

/// Tree construction errors
///
/// The only fatal condition in the engine; lookups on missing paths are
/// expected and surface as `Option`/sentinel values instead.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Unsupported digest algorithm: {0}")]
    UnsupportedDigest(String),
}

/// Configuration and logging-setup errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid log directive: {0}")]
    InvalidLogDirective(String),

    #[error("Invalid log format: {0} (must be 'json' or 'text')")]
    InvalidLogFormat(String),

    #[error("Tree error: {0}")]
    TreeError(#[from] TreeError),
}
