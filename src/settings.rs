//! Engine settings
//!
//! Serde-deserializable settings block a host application embeds in its own
//! configuration file to select the digest algorithm and logging behavior.

use crate::logging::LoggingConfig;
use crate::tree::digest::DigestAlgorithm;
use serde::{Deserialize, Serialize};

/// Root settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Digest algorithm for built trees
    #[serde(default)]
    pub digest: DigestAlgorithm,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}
