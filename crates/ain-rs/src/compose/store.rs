//! Ordered collection of prompt blocks.
//!
//! The store keeps its blocks in display order and maintains one invariant
//! after every mutation: the `priority` fields are exactly `0..len` in that
//! order. Each mutation also bumps [`revision`](BlockStore::revision) so that
//! derived results (reorder suggestions) can tell whether they are stale.

use super::block::{BlockType, PromptBlock};
use super::events::{NoopObserver, ReplaceReason, StoreEvent, StoreObserver};
use tracing::{debug, trace};

/// Blocks as they were at a given store revision.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub blocks: Vec<PromptBlock>,
    pub revision: u64,
}

/// Owned, ordered block collection with a single observer.
pub struct BlockStore {
    blocks: Vec<PromptBlock>,
    revision: u64,
    observer: Box<dyn StoreObserver>,
}

impl std::fmt::Debug for BlockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockStore")
            .field("blocks", &self.blocks.len())
            .field("revision", &self.revision)
            .finish()
    }
}

impl Default for BlockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStore {
    /// Empty store with no observer.
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            revision: 0,
            observer: Box::new(NoopObserver),
        }
    }

    /// Store seeded with persisted blocks. Blocks are ordered by their stored
    /// priority and renumbered; no event is emitted.
    pub fn from_blocks(blocks: Vec<PromptBlock>) -> Self {
        let mut store = Self::new();
        store.blocks = normalized(blocks);
        store
    }

    /// Replace the observer (builder form).
    pub fn with_observer(mut self, observer: impl StoreObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Replace the observer.
    pub fn set_observer(&mut self, observer: Box<dyn StoreObserver>) {
        self.observer = observer;
    }

    // ── Queries ────────────────────────────────────────────────────

    /// Blocks in priority order.
    pub fn blocks(&self) -> &[PromptBlock] {
        &self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PromptBlock> {
        self.blocks.iter()
    }

    pub fn get(&self, id: &str) -> Option<&PromptBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Monotonic mutation counter.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Blocks whose content contains `query`, case-insensitively. An empty
    /// query matches everything. Filtering never removes anything.
    pub fn filter(&self, query: &str) -> Vec<&PromptBlock> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.blocks.iter().collect();
        }
        self.blocks
            .iter()
            .filter(|b| b.content.to_lowercase().contains(&needle))
            .collect()
    }

    /// Owned copy of the current blocks tagged with the current revision.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            blocks: self.blocks.clone(),
            revision: self.revision,
        }
    }

    // ── Mutations ──────────────────────────────────────────────────

    /// Append a block. Blank content is ignored and returns `None`.
    pub fn add(&mut self, content: &str, block_type: BlockType) -> Option<&PromptBlock> {
        let content = content.trim();
        if content.is_empty() {
            trace!("Ignoring blank block");
            return None;
        }

        let priority = self.blocks.len() as u32;
        self.blocks
            .push(PromptBlock::new(content, priority, block_type));
        let revision = self.bump();

        let index = self.blocks.len() - 1;
        self.observer.on_event(&StoreEvent::Added {
            block: &self.blocks[index],
            revision,
        });
        self.blocks.get(index)
    }

    /// Append several blocks at once (template expansion). Blank entries are
    /// skipped. Emits one `Replaced` event and returns the number added.
    pub fn add_many<I, S>(&mut self, contents: I, block_type: BlockType) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let before = self.blocks.len();
        for content in contents {
            let content = content.as_ref().trim();
            if content.is_empty() {
                continue;
            }
            let priority = self.blocks.len() as u32;
            self.blocks
                .push(PromptBlock::new(content, priority, block_type));
        }
        let added = self.blocks.len() - before;
        if added > 0 {
            let revision = self.bump();
            self.observer.on_event(&StoreEvent::Replaced {
                reason: ReplaceReason::Bulk,
                blocks: &self.blocks,
                revision,
            });
        }
        added
    }

    /// Replace the content of block `id`. Returns `false` if no such block.
    pub fn update(&mut self, id: &str, content: &str) -> bool {
        let Some(index) = self.blocks.iter().position(|b| b.id == id) else {
            debug!("update: unknown block {id}");
            return false;
        };
        self.blocks[index].content = content.to_string();
        let revision = self.bump();
        self.observer.on_event(&StoreEvent::Updated {
            block: &self.blocks[index],
            revision,
        });
        true
    }

    /// Remove block `id` and renumber the rest. Returns `false` if no such
    /// block.
    pub fn delete(&mut self, id: &str) -> bool {
        let Some(index) = self.blocks.iter().position(|b| b.id == id) else {
            debug!("delete: unknown block {id}");
            return false;
        };
        let removed = self.blocks.remove(index);
        self.renumber();
        let revision = self.bump();
        self.observer.on_event(&StoreEvent::Deleted {
            id: &removed.id,
            remaining: &self.blocks,
            revision,
        });
        true
    }

    /// Move `dragged_id` to the position currently held by `target_id`.
    ///
    /// The dragged block is taken out first and reinserted at the target's
    /// original index, so dragging down lands after the target and dragging
    /// up lands before it. No-op when either id is unknown or both are the
    /// same.
    pub fn reorder(&mut self, dragged_id: &str, target_id: &str) -> bool {
        if dragged_id == target_id {
            return false;
        }
        let dragged = self.blocks.iter().position(|b| b.id == dragged_id);
        let target = self.blocks.iter().position(|b| b.id == target_id);
        let (Some(from), Some(to)) = (dragged, target) else {
            debug!("reorder: unknown block ({dragged_id} -> {target_id})");
            return false;
        };

        let block = self.blocks.remove(from);
        let to = to.min(self.blocks.len());
        self.blocks.insert(to, block);
        self.renumber();

        let revision = self.bump();
        self.observer.on_event(&StoreEvent::Reordered {
            dragged_id: &self.blocks[to].id,
            blocks: &self.blocks,
            revision,
        });
        true
    }

    /// Replace the whole collection. Incoming blocks are ordered by their
    /// `priority` (stable for ties) and renumbered.
    pub fn replace_all(&mut self, blocks: Vec<PromptBlock>, reason: ReplaceReason) {
        self.blocks = normalized(blocks);
        let revision = self.bump();
        self.observer.on_event(&StoreEvent::Replaced {
            reason,
            blocks: &self.blocks,
            revision,
        });
    }

    /// Remove every block.
    pub fn clear(&mut self) {
        self.replace_all(Vec::new(), ReplaceReason::Clear);
    }

    fn renumber(&mut self) {
        for (index, block) in self.blocks.iter_mut().enumerate() {
            block.priority = index as u32;
        }
    }

    fn bump(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }
}

/// Sort by priority (stable) and renumber densely from zero.
pub fn normalized(mut blocks: Vec<PromptBlock>) -> Vec<PromptBlock> {
    blocks.sort_by_key(|b| b.priority);
    for (index, block) in blocks.iter_mut().enumerate() {
        block.priority = index as u32;
    }
    blocks
}

/// Whether priorities are exactly `0..len` in slice order.
pub fn is_dense(blocks: &[PromptBlock]) -> bool {
    blocks
        .iter()
        .enumerate()
        .all(|(index, b)| b.priority == index as u32)
}
