//! Immutable content-hashed configuration tree
//!
//! Each node is labelled with a string label; a path is the label sequence
//! from the root. Subtree equality between two snapshots is a byte comparison
//! of node hashes, never a deep value comparison.

use crate::error::TreeError;
use crate::tree::digest::{DigestAlgorithm, Hash, HashProvider, ABSENT};
use crate::tree::node::MerkleNode;
use std::sync::Arc;

/// Serializes a value to the byte sequence its leaf hash is derived from.
pub type ValueSerializer<V> = Arc<dyn Fn(&V) -> Vec<u8> + Send + Sync>;

/// UTF-8 serializer for the conventional string-valued configuration tree.
pub fn utf8_serializer() -> ValueSerializer<String> {
    Arc::new(|value: &String| value.as_bytes().to_vec())
}

/// An immutable Merkle tree.
///
/// Every update returns a new tree that shares all unaffected subtrees with
/// its predecessor, so snapshots are cheap to keep and cheap to compare.
/// Two trees are equal iff their root hashes are byte-equal; the residual
/// collision risk of the digest is accepted.
pub struct MerkleTree<V> {
    serializer: ValueSerializer<V>,
    hasher: HashProvider,
    root: Arc<MerkleNode<V>>,
}

impl MerkleTree<String> {
    /// Empty string-valued tree with UTF-8 leaf serialization and the
    /// default digest. The conventional instantiation for configuration
    /// documents.
    pub fn empty_utf8() -> Self {
        Self::empty(utf8_serializer())
    }
}

impl<V> MerkleTree<V> {
    /// Empty tree using the default digest algorithm (SHA-256).
    pub fn empty(serializer: ValueSerializer<V>) -> Self {
        Self::empty_with_hash_provider(serializer, DigestAlgorithm::default().provider())
    }

    /// Empty tree using a digest algorithm selected by name.
    ///
    /// Fails fast on an unsupported name; this is the only fallible
    /// construction path and no later operation can fail on it.
    pub fn empty_with_digest(
        algorithm_name: &str,
        serializer: ValueSerializer<V>,
    ) -> Result<Self, TreeError> {
        let algorithm = DigestAlgorithm::by_name(algorithm_name)?;
        Ok(Self::empty_with_hash_provider(serializer, algorithm.provider()))
    }

    /// Empty tree with a caller-supplied hash provider.
    pub fn empty_with_hash_provider(serializer: ValueSerializer<V>, hasher: HashProvider) -> Self {
        let root = Arc::new(MerkleNode::empty(&hasher));
        Self {
            serializer,
            hasher,
            root,
        }
    }

    /// Assign a value to a path, overriding any current value.
    ///
    /// Returns a new tree sharing all untouched subtrees with `self`, or a
    /// clone of `self` (same root reference) when the resulting root hash is
    /// unchanged, i.e. the value serializes identically to what was already
    /// there.
    pub fn add<S: AsRef<str>>(&self, path: &[S], value: V) -> Self {
        let serialized = (self.serializer)(&value);
        let value_hash = (self.hasher)(&[serialized.as_slice()]);
        let leaf = Arc::new(MerkleNode::leaf(value, value_hash));
        let root = self.root.insert(path, leaf, &self.hasher);
        if root.hash() == self.root.hash() {
            return self.clone();
        }
        Self {
            serializer: Arc::clone(&self.serializer),
            hasher: Arc::clone(&self.hasher),
            root,
        }
    }

    /// Value assigned to a path, if the path exists and holds one directly.
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<&V> {
        self.root.find(path).and_then(|node| node.value())
    }

    /// Hash of the node at a path, or the empty sentinel when the path does
    /// not exist.
    pub fn hash_of<S: AsRef<str>>(&self, path: &[S]) -> Hash {
        self.root
            .find(path)
            .map(|node| node.hash().clone())
            .unwrap_or(ABSENT)
    }

    /// Whether the subtree at a path is identical in `self` and `other`.
    ///
    /// Compares hashes only, so the cost is independent of subtree size.
    /// Both-absent counts as same.
    pub fn is_same<S: AsRef<str>>(&self, path: &[S], other: &MerkleTree<V>) -> bool {
        self.hash_of(path) == other.hash_of(path)
    }

    /// Tree rooted at the node found by walking `path`, sharing the node and
    /// hash provider with `self`; `None` when any label is missing.
    pub fn subtree<S: AsRef<str>>(&self, path: &[S]) -> Option<Self> {
        self.root.find(path).map(|node| Self {
            serializer: Arc::clone(&self.serializer),
            hasher: Arc::clone(&self.hasher),
            root: Arc::clone(node),
        })
    }

    /// Root hash.
    pub fn hash(&self) -> Hash {
        self.root.hash().clone()
    }

    /// Whether two trees share the same root node allocation.
    ///
    /// Observable effect of the no-op `add` optimization; stronger than
    /// equality, which only compares hashes.
    pub fn shares_root(&self, other: &MerkleTree<V>) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }
}

impl<V> Clone for MerkleTree<V> {
    fn clone(&self) -> Self {
        Self {
            serializer: Arc::clone(&self.serializer),
            hasher: Arc::clone(&self.hasher),
            root: Arc::clone(&self.root),
        }
    }
}

impl<V> PartialEq for MerkleTree<V> {
    fn eq(&self, other: &Self) -> bool {
        self.root.hash() == other.root.hash()
    }
}

impl<V> Eq for MerkleTree<V> {}

impl<V> std::fmt::Debug for MerkleTree<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MerkleTree")
            .field("root", &hex::encode(self.root.hash()))
            .finish()
    }
}
