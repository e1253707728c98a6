//! Store events and the observers that receive them.
//!
//! Every [`BlockStore`](super::store::BlockStore) mutation emits exactly one
//! [`StoreEvent`] synchronously, after the mutation has been applied and the
//! priorities renumbered. Observers see the collection as it is after the
//! change.
//!
//! | Observer | Use case |
//! |----------|----------|
//! | [`NoopObserver`] | Tests, headless use |
//! | [`LoggingObserver`] | Structured logging via `tracing` |
//! | [`FnObserver`] | Quick closures |
//! | [`CompositeObserver`] | Fan out to several observers in order |

use super::block::PromptBlock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Why the whole collection was replaced.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceReason {
    /// JSON import from a file.
    Import,
    /// A template library entry was loaded.
    Template,
    /// A reorder suggestion was applied.
    Suggestion,
    /// Everything was removed.
    Clear,
    /// Any other bulk replacement.
    Bulk,
}

/// A single mutation of the block collection.
#[derive(Debug)]
pub enum StoreEvent<'a> {
    Added {
        block: &'a PromptBlock,
        revision: u64,
    },
    Updated {
        block: &'a PromptBlock,
        revision: u64,
    },
    Deleted {
        id: &'a str,
        remaining: &'a [PromptBlock],
        revision: u64,
    },
    Reordered {
        dragged_id: &'a str,
        blocks: &'a [PromptBlock],
        revision: u64,
    },
    Replaced {
        reason: ReplaceReason,
        blocks: &'a [PromptBlock],
        revision: u64,
    },
}

impl StoreEvent<'_> {
    /// Store revision after the mutation.
    pub fn revision(&self) -> u64 {
        match self {
            StoreEvent::Added { revision, .. }
            | StoreEvent::Updated { revision, .. }
            | StoreEvent::Deleted { revision, .. }
            | StoreEvent::Reordered { revision, .. }
            | StoreEvent::Replaced { revision, .. } => *revision,
        }
    }

    /// Short name for logs and wire messages.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreEvent::Added { .. } => "added",
            StoreEvent::Updated { .. } => "updated",
            StoreEvent::Deleted { .. } => "deleted",
            StoreEvent::Reordered { .. } => "reordered",
            StoreEvent::Replaced { .. } => "replaced",
        }
    }
}

/// Receiver of store events.
///
/// The default implementation ignores everything.
pub trait StoreObserver: Send + Sync {
    fn on_event(&self, event: &StoreEvent<'_>) {
        let _ = event;
    }
}

/// Observer that does nothing.
pub struct NoopObserver;
impl StoreObserver for NoopObserver {}

/// Observer that logs every event through `tracing`.
pub struct LoggingObserver;

impl StoreObserver for LoggingObserver {
    fn on_event(&self, event: &StoreEvent<'_>) {
        match event {
            StoreEvent::Added { block, revision } => {
                info!(
                    "Block added: id={} type={} priority={} (rev {revision})",
                    block.id, block.block_type, block.priority
                );
            }
            StoreEvent::Updated { block, revision } => {
                debug!(
                    "Block updated: id={} ({} chars, rev {revision})",
                    block.id,
                    block.char_len()
                );
            }
            StoreEvent::Deleted {
                id,
                remaining,
                revision,
            } => {
                info!(
                    "Block deleted: id={id}, {} remaining (rev {revision})",
                    remaining.len()
                );
            }
            StoreEvent::Reordered {
                dragged_id,
                blocks,
                revision,
            } => {
                let position = blocks
                    .iter()
                    .position(|b| b.id == *dragged_id)
                    .unwrap_or_default();
                debug!("Block {dragged_id} moved to position {position} (rev {revision})");
            }
            StoreEvent::Replaced {
                reason,
                blocks,
                revision,
            } => {
                info!(
                    "Blocks replaced ({reason:?}): {} blocks (rev {revision})",
                    blocks.len()
                );
            }
        }
    }
}

/// Observer backed by a closure.
///
/// ```ignore
/// let observer = FnObserver::new(|event| println!("{}", event.kind()));
/// ```
pub struct FnObserver<F>(F)
where
    F: Fn(&StoreEvent<'_>) + Send + Sync;

impl<F> FnObserver<F>
where
    F: Fn(&StoreEvent<'_>) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> StoreObserver for FnObserver<F>
where
    F: Fn(&StoreEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &StoreEvent<'_>) {
        (self.0)(event)
    }
}

/// Observer that forwards each event to several observers in registration
/// order.
pub struct CompositeObserver {
    observers: Vec<Box<dyn StoreObserver>>,
}

impl CompositeObserver {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Add an observer to the chain.
    pub fn with(mut self, observer: impl StoreObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }
}

impl Default for CompositeObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreObserver for CompositeObserver {
    fn on_event(&self, event: &StoreEvent<'_>) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}
