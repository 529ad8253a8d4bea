//! Configuration Merkle Tree
//!
//! Represents a nested configuration document as an immutable tree where each
//! node carries a content hash derived from its children, enabling O(1)
//! change detection on arbitrary subtrees.

pub mod builder;
pub mod digest;
pub mod merkle;
pub mod node;
pub mod path;

pub use builder::TreeBuilder;
pub use digest::{DigestAlgorithm, Hash, HashProvider};
pub use merkle::{utf8_serializer, MerkleTree, ValueSerializer};
