//! Convenience re-exports for common `ain-rs` types.
//!
//! ```ignore
//! use ain_rs::prelude::*;
//! ```
//!
//! Covers the workspace, its configuration, the block types, both analysis
//! traits and the API client. Template, proposal and export helpers live in
//! their own modules.

// ── Core types ──────────────────────────────────────────────────────
pub use crate::{
    AinError, ApiResponse, Language, ProposalClient, RefinementKind, RefinementRequest,
    RefinementResponse, Result, UserPayload,
};

// ── Composer ────────────────────────────────────────────────────────
pub use crate::compose::{
    BlockStore, BlockType, CompositeObserver, FnObserver, LoggingObserver, NoopObserver,
    PromptBlock, ReplaceReason, Snapshot, StoreEvent, StoreObserver,
};
pub use crate::config::{ComposerConfig, StalenessPolicy};
pub use crate::workspace::{ComposerState, PendingAnalysis, Workspace};

// ── Analysis ────────────────────────────────────────────────────────
pub use crate::analysis::{
    HeuristicScorer, KeywordReorderAdvisor, QualityAnalysis, QualityScore, QualityScorer,
    ReorderAdvisor, ReorderSuggestion, SuggestionKind,
};

// ── Voice ───────────────────────────────────────────────────────────
pub use crate::voice::{PlaceholderTranscriber, Recording, Transcriber, TranscribeFuture};
