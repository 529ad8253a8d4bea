//! Digest algorithm selection and hash folding for tree nodes

use crate::error::TreeError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use std::str::FromStr;
use std::sync::Arc;

/// Content digest of a tree node.
///
/// Length depends on the algorithm that produced it (32 bytes for SHA-256).
pub type Hash = Vec<u8>;

/// Sentinel returned when a path does not exist in a tree.
///
/// Empty by construction, so it can never be byte-equal to a real digest.
pub const ABSENT: Hash = Vec::new();

/// Folds an ordered sequence of byte chunks into a single digest.
///
/// Folding zero chunks yields the algorithm's fixed empty-input digest.
pub type HashProvider = Arc<dyn Fn(&[&[u8]]) -> Hash + Send + Sync>;

/// Digest algorithm used to compute node hashes, selectable by name
/// at tree construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DigestAlgorithm {
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    /// Canonical name of the default algorithm.
    pub const DEFAULT_NAME: &'static str = "SHA-256";

    /// Resolve an algorithm by name (case-insensitive, dash optional).
    ///
    /// An unknown name is a construction-time error; it is surfaced here,
    /// never during later tree operations.
    pub fn by_name(name: &str) -> Result<Self, TreeError> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "sha224" => Ok(DigestAlgorithm::Sha224),
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha384" => Ok(DigestAlgorithm::Sha384),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            _ => Err(TreeError::UnsupportedDigest(name.to_string())),
        }
    }

    /// Canonical name of this algorithm.
    pub fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha224 => "SHA-224",
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Sha384 => "SHA-384",
            DigestAlgorithm::Sha512 => "SHA-512",
        }
    }

    /// Digest output size in bytes.
    pub fn output_len(self) -> usize {
        match self {
            DigestAlgorithm::Sha224 => 28,
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }

    /// Build the hash provider for this algorithm.
    pub fn provider(self) -> HashProvider {
        match self {
            DigestAlgorithm::Sha224 => Arc::new(digest_chunks::<Sha224>),
            DigestAlgorithm::Sha256 => Arc::new(digest_chunks::<Sha256>),
            DigestAlgorithm::Sha384 => Arc::new(digest_chunks::<Sha384>),
            DigestAlgorithm::Sha512 => Arc::new(digest_chunks::<Sha512>),
        }
    }
}

impl Default for DigestAlgorithm {
    fn default() -> Self {
        DigestAlgorithm::Sha256
    }
}

impl FromStr for DigestAlgorithm {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DigestAlgorithm::by_name(s)
    }
}

impl TryFrom<String> for DigestAlgorithm {
    type Error = TreeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        DigestAlgorithm::by_name(&s)
    }
}

impl From<DigestAlgorithm> for String {
    fn from(algorithm: DigestAlgorithm) -> String {
        algorithm.name().to_string()
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn digest_chunks<D: Digest>(chunks: &[&[u8]]) -> Hash {
    let mut hasher = D::new();
    for chunk in chunks {
        hasher.update(chunk);
    }
    hasher.finalize().to_vec()
}
