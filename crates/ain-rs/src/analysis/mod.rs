//! Deterministic prompt analysis: quality scoring and reorder suggestions.
//!
//! Both analyses are keyword and length heuristics behind strategy traits
//! ([`QualityScorer`], [`ReorderAdvisor`]) so that a model-backed
//! implementation can replace them without changing callers.

pub mod classify;
pub mod quality;
pub mod reorder;

pub use quality::{
    Feedback, HeuristicScorer, MetricKind, QualityAnalysis, QualityMetric, QualityScore,
    QualityScorer, analyze_quality, score_blocks,
};
pub use reorder::{
    KeywordReorderAdvisor, ReorderAdvisor, ReorderSuggestion, SuggestionKind, analyze_after,
    suggest, suggest_for,
};
