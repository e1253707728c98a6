//! Reorder suggestions from keyword classification.
//!
//! The advisor proposes up to three candidate orderings of the same block
//! set. Each candidate is a full block list renumbered `0..N` and tagged
//! with the store revision it was computed from, so that applying it later
//! can detect a stale result.

use super::classify::{self, Family};
use crate::compose::{PromptBlock, Snapshot, id_order};
use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Stable identifier of a candidate ordering.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionKind {
    /// Context blocks moved to the front.
    ContextFirst,
    /// Context, requirements, everything else, technical details.
    LogicalFlow,
    /// Sorted by keyword importance score.
    PriorityBased,
}

impl SuggestionKind {
    pub fn id(self) -> &'static str {
        match self {
            Self::ContextFirst => "context-first",
            Self::LogicalFlow => "logical-flow",
            Self::PriorityBased => "priority-based",
        }
    }

    /// Fixed heuristic confidence, 0-100.
    pub fn confidence(self) -> u8 {
        match self {
            Self::ContextFirst => 85,
            Self::LogicalFlow => 92,
            Self::PriorityBased => 78,
        }
    }

    pub fn reason(self, language: Language) -> &'static str {
        match self {
            Self::ContextFirst => language.pick(
                "Move context and background information to the beginning",
                "コンテキストと背景情報を最初に移動",
            ),
            Self::LogicalFlow => language.pick(
                "Place requirements after context for better flow",
                "より良いフローのためにコンテキストの後に要件を配置",
            ),
            Self::PriorityBased => language.pick(
                "Reorder based on implementation priority",
                "実装優先度に基づいて並び替え",
            ),
        }
    }
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for SuggestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "context-first" => Ok(Self::ContextFirst),
            "logical-flow" => Ok(Self::LogicalFlow),
            "priority-based" => Ok(Self::PriorityBased),
            other => Err(format!(
                "unknown suggestion: {other} (expected context-first, logical-flow or priority-based)"
            )),
        }
    }
}

/// One candidate ordering.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ReorderSuggestion {
    pub kind: SuggestionKind,
    pub reason: String,
    pub confidence: u8,
    pub new_order: Vec<PromptBlock>,
    /// Store revision of the blocks this was computed from.
    pub revision: u64,
}

impl ReorderSuggestion {
    fn new(kind: SuggestionKind, language: Language, new_order: Vec<PromptBlock>) -> Self {
        Self {
            kind,
            reason: kind.reason(language).to_string(),
            confidence: kind.confidence(),
            new_order,
            revision: 0,
        }
    }
}

/// Strategy for proposing alternative orderings.
pub trait ReorderAdvisor: Send + Sync {
    /// Candidate orderings of `blocks`, taken in slice order. Fewer than two
    /// blocks yields nothing.
    fn suggest(&self, blocks: &[PromptBlock], language: Language) -> Vec<ReorderSuggestion>;
}

/// Keyword-family advisor.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeywordReorderAdvisor;

impl ReorderAdvisor for KeywordReorderAdvisor {
    fn suggest(&self, blocks: &[PromptBlock], language: Language) -> Vec<ReorderSuggestion> {
        if blocks.len() < 2 {
            return Vec::new();
        }

        let classified: Vec<(Vec<Family>, &PromptBlock)> = blocks
            .iter()
            .map(|b| (classify::families(&b.content), b))
            .collect();
        let in_family = |family: Family| {
            classified
                .iter()
                .filter(move |(families, _)| families.contains(&family))
                .map(|(_, b)| *b)
        };
        let has_context = in_family(Family::Context).next().is_some();
        let has_requirement = in_family(Family::Requirement).next().is_some();

        let mut suggestions = Vec::new();

        if has_context {
            let rest = classified
                .iter()
                .filter(|(families, _)| !families.contains(&Family::Context))
                .map(|(_, b)| *b);
            let order = renumbered(in_family(Family::Context).chain(rest));
            suggestions.push(ReorderSuggestion::new(
                SuggestionKind::ContextFirst,
                language,
                order,
            ));
        }

        if has_context && has_requirement {
            // A block lands in its first matching group.
            let group = |families: &[Family]| match families.first() {
                Some(Family::Context) => 0,
                Some(Family::Requirement) => 1,
                Some(Family::Technical) => 3,
                None => 2,
            };
            let mut grouped: Vec<(usize, &PromptBlock)> = classified
                .iter()
                .map(|(families, b)| (group(families.as_slice()), *b))
                .collect();
            grouped.sort_by_key(|(g, _)| *g);
            let order = renumbered(grouped.into_iter().map(|(_, b)| b));
            suggestions.push(ReorderSuggestion::new(
                SuggestionKind::LogicalFlow,
                language,
                order,
            ));
        }

        let mut scored: Vec<(f64, &PromptBlock)> = blocks
            .iter()
            .map(|b| (classify::priority_score(&b.content), b))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        let order = renumbered(scored.into_iter().map(|(_, b)| b));
        if id_order(&order) != id_order(blocks) {
            suggestions.push(ReorderSuggestion::new(
                SuggestionKind::PriorityBased,
                language,
                order,
            ));
        }

        debug!(
            "Reorder analysis of {} blocks produced {} suggestions",
            blocks.len(),
            suggestions.len()
        );
        suggestions
    }
}

fn renumbered<'a>(blocks: impl Iterator<Item = &'a PromptBlock>) -> Vec<PromptBlock> {
    blocks
        .enumerate()
        .map(|(index, b)| PromptBlock {
            priority: index as u32,
            ..b.clone()
        })
        .collect()
}

/// Suggestions for `snapshot`, stamped with its revision.
pub fn suggest_for<A: ReorderAdvisor + ?Sized>(
    advisor: &A,
    snapshot: &Snapshot,
    language: Language,
) -> Vec<ReorderSuggestion> {
    let mut suggestions = advisor.suggest(&snapshot.blocks, language);
    for suggestion in &mut suggestions {
        suggestion.revision = snapshot.revision;
    }
    suggestions
}

/// Run [`suggest_for`] after a simulated analysis delay.
///
/// The result is computed from `snapshot` as it was when the analysis was
/// triggered, whatever happens to the store in the meantime.
pub async fn analyze_after<A: ReorderAdvisor + ?Sized>(
    advisor: &A,
    snapshot: Snapshot,
    language: Language,
    delay: Duration,
) -> Vec<ReorderSuggestion> {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    suggest_for(advisor, &snapshot, language)
}

/// Suggestions from the keyword advisor.
pub fn suggest(blocks: &[PromptBlock], language: Language) -> Vec<ReorderSuggestion> {
    KeywordReorderAdvisor.suggest(blocks, language)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{BlockType, is_dense};

    fn blocks(contents: &[&str]) -> Vec<PromptBlock> {
        contents
            .iter()
            .enumerate()
            .map(|(i, c)| PromptBlock::new(*c, i as u32, BlockType::Text))
            .collect()
    }

    fn contents(order: &[PromptBlock]) -> Vec<&str> {
        order.iter().map(|b| b.content.as_str()).collect()
    }

    fn find(suggestions: &[ReorderSuggestion], kind: SuggestionKind) -> Option<&ReorderSuggestion> {
        suggestions.iter().find(|s| s.kind == kind)
    }

    #[test]
    fn fewer_than_two_blocks_gives_nothing() {
        assert!(suggest(&[], Language::En).is_empty());
        assert!(suggest(&blocks(&["Background of the project"]), Language::En).is_empty());
    }

    #[test]
    fn logical_flow_orders_context_requirement_technical() {
        let input = blocks(&[
            "Background of the project",
            "We require a login feature",
            "Use PostgreSQL for implementation",
        ]);
        let suggestions = suggest(&input, Language::En);
        let flow = find(&suggestions, SuggestionKind::LogicalFlow).unwrap();
        assert_eq!(flow.confidence, 92);
        assert_eq!(
            contents(&flow.new_order),
            vec![
                "Background of the project",
                "We require a login feature",
                "Use PostgreSQL for implementation",
            ]
        );
        assert!(is_dense(&flow.new_order));
    }

    #[test]
    fn logical_flow_puts_unclassified_before_technical() {
        let input = blocks(&[
            "Database schema notes",
            "Some other thoughts",
            "Must have a login feature",
            "Project overview",
        ]);
        let suggestions = suggest(&input, Language::En);
        let flow = find(&suggestions, SuggestionKind::LogicalFlow).unwrap();
        assert_eq!(
            contents(&flow.new_order),
            vec![
                "Project overview",
                "Must have a login feature",
                "Some other thoughts",
                "Database schema notes",
            ]
        );
    }

    #[test]
    fn multi_family_blocks_appear_once() {
        let input = blocks(&[
            "Login feature requirement",
            "Background and technical context",
        ]);
        let suggestions = suggest(&input, Language::En);
        for s in &suggestions {
            assert_eq!(s.new_order.len(), 2);
        }
        let flow = find(&suggestions, SuggestionKind::LogicalFlow).unwrap();
        assert_eq!(
            contents(&flow.new_order),
            vec!["Background and technical context", "Login feature requirement"]
        );
    }

    #[test]
    fn context_first_preserves_relative_order() {
        let input = blocks(&["alpha", "Overview one", "beta", "背景の説明"]);
        let suggestions = suggest(&input, Language::En);
        let first = find(&suggestions, SuggestionKind::ContextFirst).unwrap();
        assert_eq!(first.confidence, 85);
        assert_eq!(
            contents(&first.new_order),
            vec!["Overview one", "背景の説明", "alpha", "beta"]
        );
        assert!(find(&suggestions, SuggestionKind::LogicalFlow).is_none());
    }

    #[test]
    fn priority_suggestion_only_when_order_changes() {
        let unchanged = blocks(&[
            "Background of the project",
            "We require a login feature",
            "Use PostgreSQL for implementation",
        ]);
        assert!(find(&suggest(&unchanged, Language::En), SuggestionKind::PriorityBased).is_none());

        let changed = blocks(&["plain words", "our goal is clear"]);
        let suggestions = suggest(&changed, Language::En);
        let by_priority = find(&suggestions, SuggestionKind::PriorityBased).unwrap();
        assert_eq!(by_priority.confidence, 78);
        assert_eq!(
            contents(&by_priority.new_order),
            vec!["our goal is clear", "plain words"]
        );
    }

    #[test]
    fn reasons_are_localized() {
        let input = blocks(&["背景", "機能"]);
        let suggestions = suggest(&input, Language::Ja);
        assert_eq!(suggestions[0].reason, "コンテキストと背景情報を最初に移動");
    }

    #[test]
    fn kind_ids_round_trip_through_from_str() {
        for kind in [
            SuggestionKind::ContextFirst,
            SuggestionKind::LogicalFlow,
            SuggestionKind::PriorityBased,
        ] {
            assert_eq!(kind.id().parse::<SuggestionKind>().unwrap(), kind);
        }
        assert!("random".parse::<SuggestionKind>().is_err());
    }

    #[tokio::test]
    async fn delayed_analysis_uses_snapshot_and_revision() {
        let snapshot = Snapshot {
            blocks: blocks(&["plain words", "Background goal"]),
            revision: 7,
        };
        let suggestions = analyze_after(
            &KeywordReorderAdvisor,
            snapshot,
            Language::En,
            Duration::from_millis(5),
        )
        .await;
        assert!(!suggestions.is_empty());
        assert!(suggestions.iter().all(|s| s.revision == 7));
    }
}
