//! Immutable tree nodes with structural sharing

use crate::tree::digest::{Hash, HashProvider};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Direct value held by a node, together with the digest of its serialized form.
#[derive(Debug)]
pub(crate) struct Leaf<V> {
    pub(crate) value: V,
    pub(crate) hash: Hash,
}

/// A single immutable node.
///
/// A node may hold a direct value, children, both, or neither. Nodes along an
/// updated path are freshly allocated; all other nodes are shared by reference
/// between tree versions.
#[derive(Debug)]
pub(crate) struct MerkleNode<V> {
    hash: Hash,
    leaf: Option<Arc<Leaf<V>>>,
    children: BTreeMap<String, Arc<MerkleNode<V>>>,
}

impl<V> MerkleNode<V> {
    /// Node with no value and no children. Its hash is the empty-input digest.
    pub(crate) fn empty(hasher: &HashProvider) -> Self {
        Self {
            hash: hasher(&[]),
            leaf: None,
            children: BTreeMap::new(),
        }
    }

    /// Node holding only a direct value; `value_hash` is the digest of the
    /// serialized value and doubles as the node hash.
    pub(crate) fn leaf(value: V, value_hash: Hash) -> Self {
        Self {
            hash: value_hash.clone(),
            leaf: Some(Arc::new(Leaf {
                value,
                hash: value_hash,
            })),
            children: BTreeMap::new(),
        }
    }

    pub(crate) fn hash(&self) -> &Hash {
        &self.hash
    }

    pub(crate) fn value(&self) -> Option<&V> {
        self.leaf.as_deref().map(|leaf| &leaf.value)
    }

    /// Walk `path` down from this node.
    pub(crate) fn find<'a, S: AsRef<str>>(
        self: &'a Arc<Self>,
        path: &[S],
    ) -> Option<&'a Arc<Self>> {
        match path.split_first() {
            None => Some(self),
            Some((label, rest)) => self
                .children
                .get(label.as_ref())
                .and_then(|child| child.find(rest)),
        }
    }

    /// Replace the node at `path` below this node with `node`, recomposing the
    /// hash of every ancestor on the way back up. Siblings off the path are
    /// reused by reference.
    pub(crate) fn insert<S: AsRef<str>>(
        self: &Arc<Self>,
        path: &[S],
        node: Arc<Self>,
        hasher: &HashProvider,
    ) -> Arc<Self> {
        match path.split_first() {
            None => node,
            Some((label, rest)) => {
                let label = label.as_ref();
                let child = match self.children.get(label) {
                    Some(existing) => existing.insert(rest, node, hasher),
                    None => Arc::new(Self::empty(hasher)).insert(rest, node, hasher),
                };
                self.with_child(label, child, hasher)
            }
        }
    }

    /// Copy of this node with one child replaced and the hash recomposed.
    /// Returns the node itself when the recomposed hash is unchanged.
    fn with_child(
        self: &Arc<Self>,
        label: &str,
        child: Arc<Self>,
        hasher: &HashProvider,
    ) -> Arc<Self> {
        let mut children = self.children.clone();
        children.insert(label.to_string(), child);
        let hash = compose(self.leaf.as_deref(), &children, hasher);
        if hash == self.hash {
            return Arc::clone(self);
        }
        Arc::new(Self {
            hash,
            leaf: self.leaf.clone(),
            children,
        })
    }
}

/// Node hash: the value's digest (when present) followed by one
/// `digest(label ‖ child_hash)` contribution per child, folded in sorted
/// label order so equal content hashes equally regardless of insertion order.
fn compose<V>(
    leaf: Option<&Leaf<V>>,
    children: &BTreeMap<String, Arc<MerkleNode<V>>>,
    hasher: &HashProvider,
) -> Hash {
    let mut contributions: Vec<Hash> = Vec::with_capacity(children.len() + 1);
    if let Some(leaf) = leaf {
        contributions.push(leaf.hash.clone());
    }
    for (label, child) in children {
        contributions.push(hasher(&[label.as_bytes(), child.hash.as_slice()]));
    }
    let chunks: Vec<&[u8]> = contributions.iter().map(|c| c.as_slice()).collect();
    hasher(&chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::digest::DigestAlgorithm;

    fn hasher() -> HashProvider {
        DigestAlgorithm::Sha256.provider()
    }

    fn leaf_node(value: &str, hasher: &HashProvider) -> Arc<MerkleNode<String>> {
        let value_hash = hasher(&[value.as_bytes()]);
        Arc::new(MerkleNode::leaf(value.to_string(), value_hash))
    }

    #[test]
    fn test_insert_order_does_not_affect_hash() {
        let hasher = hasher();
        let root = Arc::new(MerkleNode::empty(&hasher));

        let ab = root
            .insert(&["a"], leaf_node("1", &hasher), &hasher)
            .insert(&["b"], leaf_node("2", &hasher), &hasher);
        let ba = root
            .insert(&["b"], leaf_node("2", &hasher), &hasher)
            .insert(&["a"], leaf_node("1", &hasher), &hasher);

        assert_eq!(ab.hash(), ba.hash());
    }

    #[test]
    fn test_untouched_siblings_are_shared() {
        let hasher = hasher();
        let root = Arc::new(MerkleNode::empty(&hasher))
            .insert(&["left", "x"], leaf_node("1", &hasher), &hasher)
            .insert(&["right", "y"], leaf_node("2", &hasher), &hasher);

        let updated = root.insert(&["right", "y"], leaf_node("3", &hasher), &hasher);

        let old_left = root.find(&["left"]).unwrap();
        let new_left = updated.find(&["left"]).unwrap();
        assert!(Arc::ptr_eq(old_left, new_left));

        let old_right = root.find(&["right"]).unwrap();
        let new_right = updated.find(&["right"]).unwrap();
        assert!(!Arc::ptr_eq(old_right, new_right));
    }

    #[test]
    fn test_reinserting_same_value_returns_same_node() {
        let hasher = hasher();
        let root = Arc::new(MerkleNode::empty(&hasher)).insert(
            &["a", "b"],
            leaf_node("v", &hasher),
            &hasher,
        );

        let again = root.insert(&["a", "b"], leaf_node("v", &hasher), &hasher);
        assert!(Arc::ptr_eq(&root, &again));
    }

    #[test]
    fn test_insert_at_terminal_replaces_node_and_children() {
        let hasher = hasher();
        let root = Arc::new(MerkleNode::empty(&hasher)).insert(
            &["a", "b"],
            leaf_node("v", &hasher),
            &hasher,
        );

        let replaced = root.insert(&["a"], leaf_node("w", &hasher), &hasher);
        assert!(replaced.find(&["a", "b"]).is_none());
        assert_eq!(replaced.find(&["a"]).unwrap().value().unwrap(), "w");
    }

    #[test]
    fn test_value_survives_gaining_children_and_affects_hash() {
        let hasher = hasher();
        let root = Arc::new(MerkleNode::empty(&hasher));

        let with_value = root
            .insert(&["a"], leaf_node("v", &hasher), &hasher)
            .insert(&["a", "b"], leaf_node("w", &hasher), &hasher);
        let without_value = root.insert(&["a", "b"], leaf_node("w", &hasher), &hasher);

        let node = with_value.find(&["a"]).unwrap();
        assert_eq!(node.value().unwrap(), "v");
        assert!(node.find(&["b"]).is_some());

        // The direct value folds into the node hash, so the two shapes differ.
        assert_ne!(
            with_value.find(&["a"]).unwrap().hash(),
            without_value.find(&["a"]).unwrap().hash()
        );
    }

    #[test]
    fn test_find_missing_label_is_none() {
        let hasher = hasher();
        let root = Arc::new(MerkleNode::empty(&hasher)).insert(
            &["a", "b"],
            leaf_node("v", &hasher),
            &hasher,
        );

        assert!(root.find(&["a", "c"]).is_none());
        assert!(root.find(&["a", "b", "deeper"]).is_none());
    }
}
