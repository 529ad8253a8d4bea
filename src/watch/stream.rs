//! Stream adapter for path subscriptions

use crate::tree::merkle::MerkleTree;
use crate::tree::path::TreePath;
use crate::watch::{ListenableConfig, ListenerId};
use futures::channel::mpsc::{self, UnboundedReceiver};
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Live sequence of changes at one registered path.
///
/// Produced by [`ListenableConfig::subtree_changes`]; one element per change,
/// unbounded and non-restartable. Dropping the stream cancels the underlying
/// listener.
pub struct SubtreeChanges {
    receiver: UnboundedReceiver<Option<MerkleTree<String>>>,
    config: ListenableConfig,
    path: TreePath,
    id: ListenerId,
}

pub(crate) fn subtree_changes(config: &ListenableConfig, path: TreePath) -> SubtreeChanges {
    let (sender, receiver) = mpsc::unbounded();
    let id = config.listen(path.as_slice(), move |subtree| {
        // The receiving half may already be gone; such sends are dropped and
        // the listener itself is cancelled in SubtreeChanges::drop.
        let _ = sender.unbounded_send(subtree);
    });
    SubtreeChanges {
        receiver,
        config: config.clone(),
        path,
        id,
    }
}

impl Stream for SubtreeChanges {
    type Item = Option<MerkleTree<String>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_next(cx)
    }
}

impl Drop for SubtreeChanges {
    fn drop(&mut self) {
        self.config.cancel(&self.path, self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use futures::StreamExt;

    fn tree() -> MerkleTree<String> {
        MerkleTree::empty_utf8()
    }

    #[test]
    fn test_stream_emits_one_element_per_change() {
        let config = ListenableConfig::new();
        let changes = config.subtree_changes(&["key"]);

        config.update(tree().add(&["key"], "1".to_string()));
        config.update(tree().add(&["key"], "2".to_string()));
        config.update(tree()); // removal

        let collected: Vec<String> = block_on(
            changes
                .take(3)
                .map(|subtree| {
                    subtree
                        .and_then(|sub| sub.get::<&str>(&[]).cloned())
                        .unwrap_or_else(|| "[None]".to_string())
                })
                .collect(),
        );

        assert_eq!(collected, vec!["1", "2", "[None]"]);
    }

    #[test]
    fn test_dropping_stream_cancels_listener() {
        let config = ListenableConfig::new();
        let changes = config.subtree_changes(&["key"]);
        assert_eq!(config.registered_path_count(), 1);

        drop(changes);
        assert_eq!(config.registered_path_count(), 0);

        config.update(tree().add(&["key"], "1".to_string()));
    }
}
