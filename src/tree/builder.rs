//! Tree builder for parsed configuration documents
//!
//! Folds an already-parsed generic document (`serde_json::Value`) into a
//! string-valued [`MerkleTree`]. Parsing text formats is the caller's concern.

use crate::tree::digest::DigestAlgorithm;
use crate::tree::merkle::{utf8_serializer, MerkleTree};
use crate::tree::path::TreePath;
use serde_json::Value;
use tracing::{debug, trace};

/// Leaf value recorded for an explicit JSON `null`.
///
/// Values starting with `'\u{1}'` form a reserved namespace so the marker can
/// never collide with a stringified primitive; "present but null" stays
/// distinguishable from "path absent".
pub const NULL_MARKER: &str = "\u{1}null";

/// Builds a [`MerkleTree`] from a parsed document.
///
/// Object entries append their key to the path prefix; array elements append
/// their zero-based index as a synthetic label (`"0"`, `"1"`, …), which is how
/// an ordered array is lowered into a labelled tree; primitives are
/// stringified.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    digest: DigestAlgorithm,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the digest algorithm for the built tree.
    pub fn with_digest(mut self, digest: DigestAlgorithm) -> Self {
        self.digest = digest;
        self
    }

    /// Fold a parsed document into a tree.
    ///
    /// A non-object document (including an empty one) produces the empty
    /// tree. The order in which leaves are folded cannot affect the final
    /// hash, so an identical document always builds an identical tree.
    pub fn build(&self, document: &Value) -> MerkleTree<String> {
        let empty = MerkleTree::empty_with_hash_provider(utf8_serializer(), self.digest.provider());

        let entries = match document {
            Value::Object(entries) => entries,
            other => {
                debug!(kind = json_kind(other), "Non-object document, producing empty tree");
                return empty;
            }
        };

        let mut leaves: Vec<(TreePath, String)> = Vec::new();
        for (key, value) in entries {
            flatten(key, value, &[], &mut leaves);
        }

        let tree = leaves
            .into_iter()
            .fold(empty, |tree, (path, value)| tree.add(&path, value));

        debug!(root = %hex::encode(tree.hash()), "Built configuration tree");
        tree
    }
}

/// Recursively map a document element to path→value pairs.
fn flatten(label: &str, element: &Value, prefix: &[String], out: &mut Vec<(TreePath, String)>) {
    let mut path = prefix.to_vec();
    path.push(label.to_string());

    match element {
        Value::Object(entries) => {
            for (key, value) in entries {
                flatten(key, value, &path, out);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten(&index.to_string(), item, &path, out);
            }
        }
        Value::Null => {
            trace!(path = %path.join("."), "Recording null leaf");
            out.push((path, NULL_MARKER.to_string()));
        }
        Value::String(text) => out.push((path, text.clone())),
        // Numbers and booleans keep their JSON textual form.
        other => out.push((path, other.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
