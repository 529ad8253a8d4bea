//! Path-scoped configuration subscriptions
//!
//! Holds the currently-installed tree snapshot and a registry of listeners
//! keyed by tree path. Installing a new snapshot via [`ListenableConfig::update`]
//! diffs every registered path by hash and notifies only the listeners whose
//! subtree actually changed.

pub mod stream;

pub use stream::SubtreeChanges;

use crate::tree::merkle::MerkleTree;
use crate::tree::path::{join, TreePath};
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, trace};

/// Callback invoked with the new subtree at a registered path after each
/// change; `None` means the subtree was removed.
pub type TreeChangeListener = Box<dyn Fn(Option<MerkleTree<String>>) + Send + Sync>;

/// Handle identifying one registered listener, used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        ListenerId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Fan-out set of listeners registered under one path.
#[derive(Default)]
struct CompositeListener {
    listeners: HashMap<ListenerId, Arc<TreeChangeListener>>,
}

impl CompositeListener {
    fn add(&mut self, id: ListenerId, listener: TreeChangeListener) {
        self.listeners.insert(id, Arc::new(listener));
    }

    fn remove(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }

    fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    fn snapshot(&self) -> Vec<(ListenerId, Arc<TreeChangeListener>)> {
        self.listeners
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect()
    }
}

struct Inner {
    /// Currently-installed snapshot; starts as the empty tree so the first
    /// `update` fires like any other.
    tree: Mutex<MerkleTree<String>>,
    path_listeners: Mutex<HashMap<TreePath, CompositeListener>>,
}

/// Long-lived registry of path subscriptions over successive tree snapshots.
///
/// Cheap to clone; clones share the same registry and installed tree.
///
/// Registration and snapshot installation are guarded by two independent
/// locks so `listen`/`cancel` never block an in-flight `update`. As a
/// consequence a `listen` racing an `update` may or may not observe that
/// update's notification, depending on interleaving.
#[derive(Clone)]
pub struct ListenableConfig {
    inner: Arc<Inner>,
}

impl ListenableConfig {
    /// Registry with the empty tree installed.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                tree: Mutex::new(MerkleTree::empty_utf8()),
                path_listeners: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Register a listener under a path.
    ///
    /// Every listener registered under the same path is invoked on every
    /// change at that path; invocation order within a path is unspecified.
    pub fn listen<S, F>(&self, path: &[S], listener: F) -> ListenerId
    where
        S: AsRef<str>,
        F: Fn(Option<MerkleTree<String>>) + Send + Sync + 'static,
    {
        let path = owned_path(path);
        let id = ListenerId::next();
        let mut registry = self.inner.path_listeners.lock();
        registry
            .entry(path)
            .or_default()
            .add(id, Box::new(listener));
        id
    }

    /// Deregister a listener.
    ///
    /// Idempotent: cancelling twice, or cancelling an id never registered
    /// under the path, is a no-op. Notifications already dispatched are not
    /// revoked.
    pub fn cancel<S: AsRef<str>>(&self, path: &[S], id: ListenerId) {
        let path = owned_path(path);
        let mut registry = self.inner.path_listeners.lock();
        if let Some(composite) = registry.get_mut(&path) {
            composite.remove(id);
            if composite.is_empty() {
                registry.remove(&path);
            }
        }
    }

    /// Install a new snapshot and notify listeners whose subtree changed.
    ///
    /// For every registered path the old and new snapshots are compared by
    /// hash; listeners under a changed path receive the new subtree, or
    /// `None` when the path no longer exists. Callbacks run synchronously on
    /// the calling thread; a panicking listener is logged and skipped without
    /// affecting the others or the installed snapshot.
    pub fn update(&self, new_tree: MerkleTree<String>) {
        let old_tree = {
            let mut installed = self.inner.tree.lock();
            std::mem::replace(&mut *installed, new_tree.clone())
        };

        let registered: Vec<(TreePath, Vec<(ListenerId, Arc<TreeChangeListener>)>)> = {
            let registry = self.inner.path_listeners.lock();
            registry
                .iter()
                .map(|(path, composite)| (path.clone(), composite.snapshot()))
                .collect()
        };

        debug!(
            root = %hex::encode(new_tree.hash()),
            paths = registered.len(),
            "Installing configuration snapshot"
        );

        for (path, listeners) in registered {
            if new_tree.is_same(&path, &old_tree) {
                trace!(path = %join(&path), "Subtree unchanged");
                continue;
            }

            let subtree = new_tree.subtree(&path);
            debug!(
                path = %join(&path),
                listeners = listeners.len(),
                removed = subtree.is_none(),
                "Subtree changed"
            );

            for (id, listener) in listeners {
                let subtree = subtree.clone();
                if catch_unwind(AssertUnwindSafe(|| listener(subtree))).is_err() {
                    error!(
                        listener = id.as_u64(),
                        path = %join(&path),
                        "Listener panicked during update"
                    );
                }
            }
        }
    }

    /// Snapshot currently installed.
    pub fn current(&self) -> MerkleTree<String> {
        self.inner.tree.lock().clone()
    }

    /// Changes at a path as an unbounded, non-restartable stream.
    ///
    /// Each change produces one `Option<MerkleTree>` element. Dropping the
    /// stream cancels the underlying listener.
    pub fn subtree_changes<S: AsRef<str>>(&self, path: &[S]) -> SubtreeChanges {
        stream::subtree_changes(self, owned_path(path))
    }

    /// Drive this registry from a stream of snapshots, installing each one
    /// in order. Completes when the input stream completes.
    pub async fn subscribe_for_updates<U>(&self, updates: U)
    where
        U: Stream<Item = MerkleTree<String>>,
    {
        futures::pin_mut!(updates);
        while let Some(tree) = updates.next().await {
            self.update(tree);
        }
    }
}

#[cfg(test)]
impl ListenableConfig {
    pub(crate) fn registered_path_count(&self) -> usize {
        self.inner.path_listeners.lock().len()
    }
}

impl Default for ListenableConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn owned_path<S: AsRef<str>>(path: &[S]) -> TreePath {
    path.iter().map(|label| label.as_ref().to_string()).collect()
}
