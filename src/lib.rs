//! Confwatch: Hierarchical Configuration Change Detection
//!
//! Represents a nested configuration document as an immutable, content-hashed
//! Merkle tree with structural sharing, and notifies path-scoped subscribers
//! only when the subtree at their path actually changed between two installed
//! snapshots.

pub mod error;
pub mod logging;
pub mod settings;
pub mod tree;
pub mod watch;
