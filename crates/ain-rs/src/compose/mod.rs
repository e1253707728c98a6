//! Prompt composition: the block entity, the ordered store and the
//! assembler.
//!
//! - [`block::PromptBlock`]: one unit of prompt text.
//! - [`store::BlockStore`]: ordered collection with dense priorities and a
//!   revision counter. Start here.
//! - [`events`]: [`StoreObserver`] trait and [`StoreEvent`] enum for
//!   observing mutations.
//! - [`assemble`](mod@assemble): joining, compressing and wrapping block text.

pub mod assemble;
pub mod block;
pub mod events;
pub mod store;

pub use assemble::{assemble, compress, enhance_prompt, truncate_preview};
pub use block::{BlockType, PromptBlock, id_order, new_block_id};
pub use events::{
    CompositeObserver, FnObserver, LoggingObserver, NoopObserver, ReplaceReason, StoreEvent,
    StoreObserver,
};
pub use store::{BlockStore, Snapshot, is_dense, normalized};
