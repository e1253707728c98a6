//! Prompt quality heuristics.
//!
//! Two views over the same block collection:
//!
//! - [`QualityScorer::score`]: a single 0-100 score with improvement hints.
//! - [`QualityScorer::analyze`]: four metrics of 25 points each with a
//!   feedback category and suggestions.
//!
//! Both are pure: the same blocks and language always give the same result,
//! regardless of block order.

use super::classify;
use crate::compose::PromptBlock;
use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Upper bound of [`QualityScore::score`].
pub const MAX_SCORE: u32 = 100;

/// Upper bound of each [`QualityMetric`].
pub const METRIC_MAX: u32 = 25;

/// Result of [`QualityScorer::score`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct QualityScore {
    pub score: u32,
    pub feedback: Vec<String>,
}

/// Coarse rating shown next to a metric.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    Excellent,
    Good,
    NeedsWork,
}

impl Feedback {
    pub fn label(self, language: Language) -> &'static str {
        match self {
            Self::Excellent => language.pick("Excellent", "優秀"),
            Self::Good => language.pick("Good", "良好"),
            Self::NeedsWork => language.pick("Needs Work", "要改善"),
        }
    }
}

/// Which aspect of the prompt a metric measures.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Clarity,
    Structure,
    Context,
    Completeness,
}

impl MetricKind {
    pub fn name(self, language: Language) -> &'static str {
        match self {
            Self::Clarity => language.pick("Clarity & Specificity", "明確性・具体性"),
            Self::Structure => language.pick("Structure & Organization", "構造・整理"),
            Self::Context => language.pick("Context & Background", "コンテキスト・背景"),
            Self::Completeness => language.pick("Completeness", "完全性"),
        }
    }

    fn suggestions(self, language: Language) -> [&'static str; 2] {
        match self {
            Self::Clarity => [
                language.pick("Add more specific details", "より具体的な詳細を追加"),
                language.pick("Use precise terminology", "正確な用語を使用"),
            ],
            Self::Structure => [
                language.pick("Break down into more components", "より多くの要素に分解"),
                language.pick("Organize by priority", "優先度で整理"),
            ],
            Self::Context => [
                language.pick("Add project context", "プロジェクトのコンテキストを追加"),
                language.pick("Specify goals and constraints", "目標と制約を明記"),
            ],
            Self::Completeness => [
                language.pick("Include functional requirements", "機能要件を含める"),
                language.pick("Add technical constraints", "技術的制約を追加"),
            ],
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct QualityMetric {
    pub kind: MetricKind,
    pub name: String,
    pub score: u32,
    pub max_score: u32,
    pub feedback: Feedback,
    pub suggestions: Vec<String>,
}

impl QualityMetric {
    fn new(kind: MetricKind, score: u32, language: Language) -> Self {
        let feedback = match kind {
            _ if score >= 20 => Feedback::Excellent,
            // Missing requirements is never worse than "good".
            MetricKind::Completeness => Feedback::Good,
            _ if score >= 15 => Feedback::Good,
            _ => Feedback::NeedsWork,
        };
        let suggestions = if score < 20 {
            kind.suggestions(language)
                .iter()
                .map(|s| s.to_string())
                .collect()
        } else {
            Vec::new()
        };
        Self {
            kind,
            name: kind.name(language).to_string(),
            score,
            max_score: METRIC_MAX,
            feedback,
            suggestions,
        }
    }
}

/// Result of [`QualityScorer::analyze`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct QualityAnalysis {
    pub metrics: Vec<QualityMetric>,
    pub overall: u32,
}

impl QualityAnalysis {
    /// Every suggestion across all metrics, in metric order.
    pub fn suggestions(&self) -> impl Iterator<Item = &str> {
        self.metrics
            .iter()
            .flat_map(|m| m.suggestions.iter().map(String::as_str))
    }
}

/// Strategy for rating a block collection.
///
/// [`HeuristicScorer`] is the keyword implementation; a model-backed scorer
/// can be swapped in without touching the store or the assembler.
pub trait QualityScorer: Send + Sync {
    fn score(&self, blocks: &[PromptBlock], language: Language) -> QualityScore;

    fn analyze(&self, blocks: &[PromptBlock], language: Language) -> QualityAnalysis;
}

/// Deterministic keyword and length heuristics.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicScorer;

impl QualityScorer for HeuristicScorer {
    fn score(&self, blocks: &[PromptBlock], language: Language) -> QualityScore {
        let mut score = 0;
        let mut feedback = Vec::new();
        let mut hint = |en: &str, ja: &str| feedback.push(language.pick(en, ja).to_string());

        let total_chars: usize = blocks.iter().map(PromptBlock::char_len).sum();
        match total_chars {
            200.. => score += 30,
            100.. => score += 20,
            50.. => score += 10,
            _ => hint(
                "Add more detail to your prompts",
                "プロンプトにより詳細を追加してください",
            ),
        }

        match distinct_long_tokens(blocks) {
            30.. => score += 25,
            20.. => score += 20,
            10.. => score += 15,
            _ => hint(
                "Use more diverse vocabulary",
                "より多様な語彙を使用してください",
            ),
        }

        match blocks.len() {
            5.. => score += 25,
            3.. => score += 20,
            2.. => score += 15,
            _ => hint(
                "Break down into more specific components",
                "より具体的な要素に分解してください",
            ),
        }

        if blocks.iter().any(|b| classify::has_score_context(&b.content)) {
            score += 20;
        } else {
            hint(
                "Add context and specific goals",
                "コンテキストと具体的な目標を追加してください",
            );
        }

        QualityScore {
            score: score.min(MAX_SCORE),
            feedback,
        }
    }

    fn analyze(&self, blocks: &[PromptBlock], language: Language) -> QualityAnalysis {
        let clarity = if blocks.is_empty() {
            0
        } else {
            let total: usize = blocks.iter().map(PromptBlock::char_len).sum();
            // Integer division floors the average and the tenth.
            ((total / blocks.len()) / 10).min(METRIC_MAX as usize) as u32
        };
        let structure = (blocks.len() as u32).saturating_mul(5).min(METRIC_MAX);
        let context = if blocks
            .iter()
            .any(|b| classify::has_quality_context(&b.content))
        {
            25
        } else {
            10
        };
        let completeness = if blocks
            .iter()
            .any(|b| classify::has_quality_requirement(&b.content))
        {
            25
        } else {
            15
        };

        let metrics = vec![
            QualityMetric::new(MetricKind::Clarity, clarity, language),
            QualityMetric::new(MetricKind::Structure, structure, language),
            QualityMetric::new(MetricKind::Context, context, language),
            QualityMetric::new(MetricKind::Completeness, completeness, language),
        ];
        let overall = metrics.iter().map(|m| m.score).sum();
        QualityAnalysis { metrics, overall }
    }
}

/// Distinct lowercase whitespace-separated tokens longer than three
/// characters, across all blocks.
fn distinct_long_tokens(blocks: &[PromptBlock]) -> usize {
    blocks
        .iter()
        .flat_map(|b| {
            b.content
                .to_lowercase()
                .split_whitespace()
                .filter(|w| w.chars().count() > 3)
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect::<HashSet<_>>()
        .len()
}

/// Score `blocks` with the default heuristics.
pub fn score_blocks(blocks: &[PromptBlock], language: Language) -> QualityScore {
    HeuristicScorer.score(blocks, language)
}

/// Analyze `blocks` with the default heuristics.
pub fn analyze_quality(blocks: &[PromptBlock], language: Language) -> QualityAnalysis {
    HeuristicScorer.analyze(blocks, language)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::BlockType;

    fn blocks(contents: &[&str]) -> Vec<PromptBlock> {
        contents
            .iter()
            .enumerate()
            .map(|(i, c)| PromptBlock::new(*c, i as u32, BlockType::Text))
            .collect()
    }

    fn rich_blocks() -> Vec<PromptBlock> {
        blocks(&[
            "Background: small clinics struggle with appointment scheduling today",
            "Patients should book visits online through mobile browsers easily",
            "Doctors receive automatic reminders about upcoming daily schedules",
            "Administrators manage staff availability using simple dashboards",
            "Payments integrate with existing insurance providers securely",
        ])
    }

    #[test]
    fn full_marks_score_exactly_one_hundred() {
        let result = score_blocks(&rich_blocks(), Language::En);
        assert_eq!(result.score, 100);
        assert!(result.feedback.is_empty());
    }

    #[test]
    fn scoring_is_deterministic_and_order_independent() {
        let mut input = rich_blocks();
        let first = score_blocks(&input, Language::En);
        assert_eq!(first, score_blocks(&input, Language::En));
        input.reverse();
        assert_eq!(first, score_blocks(&input, Language::En));
    }

    #[test]
    fn empty_collection_gets_every_hint() {
        let result = score_blocks(&[], Language::En);
        assert_eq!(result.score, 0);
        assert_eq!(result.feedback.len(), 4);
        assert_eq!(result.feedback[0], "Add more detail to your prompts");
    }

    #[test]
    fn staircases_award_partial_points() {
        // 2 blocks, 60 chars, no context keyword, few long tokens.
        let input = blocks(&[&"a".repeat(30), &"b".repeat(30)]);
        let result = score_blocks(&input, Language::En);
        assert_eq!(result.score, 10 + 15);
        assert_eq!(result.feedback.len(), 2);
    }

    fn score_of(contents: &[&str]) -> u32 {
        score_blocks(&blocks(contents), Language::En).score
    }

    /// One block of `count` distinct four-character tokens.
    fn tokens(count: usize) -> String {
        (0..count)
            .map(|i| format!("t{i:03}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn length_tiers_switch_at_exact_boundaries() {
        // One unbroken token, one block, no context: only length scores.
        let len = |n: usize| score_of(&[&"x".repeat(n)]);
        assert_eq!(len(49), 0);
        assert_eq!(len(50), 10);
        assert_eq!(len(99), 10);
        assert_eq!(len(100), 20);
        assert_eq!(len(199), 20);
        assert_eq!(len(200), 30);
    }

    #[test]
    fn vocabulary_tiers_switch_at_exact_boundaries() {
        // n tokens take 5n - 1 chars, so the length tier is known.
        let vocab = |n: usize| score_of(&[&tokens(n)]);
        assert_eq!(vocab(9), 0);
        assert_eq!(vocab(10), 15);
        assert_eq!(vocab(19), 10 + 15);
        assert_eq!(vocab(20), 10 + 20);
        assert_eq!(vocab(29), 20 + 20);
        assert_eq!(vocab(30), 20 + 25);
    }

    #[test]
    fn block_count_tiers_switch_at_exact_boundaries() {
        // Single-character blocks add no length or vocabulary points.
        let count = |n: usize| score_of(&vec!["a"; n]);
        assert_eq!(count(1), 0);
        assert_eq!(count(2), 15);
        assert_eq!(count(3), 20);
        assert_eq!(count(4), 20);
        assert_eq!(count(5), 25);
    }

    #[test]
    fn context_keyword_alone_is_worth_twenty() {
        let result = score_blocks(&blocks(&["goal"]), Language::En);
        assert_eq!(result.score, 20);
        assert_eq!(result.feedback.len(), 3);
        assert!(!result.feedback.contains(&"Add context and specific goals".to_string()));
    }

    #[test]
    fn feedback_is_localized() {
        let result = score_blocks(&[], Language::Ja);
        assert_eq!(result.feedback[3], "コンテキストと具体的な目標を追加してください");
    }

    #[test]
    fn analysis_metrics_follow_formulas() {
        let input = blocks(&[&"x".repeat(95), &"y".repeat(40)]);
        let analysis = analyze_quality(&input, Language::En);
        let scores: Vec<u32> = analysis.metrics.iter().map(|m| m.score).collect();
        // avg 67 -> 6; 2 blocks -> 10; no context -> 10; no requirement -> 15
        assert_eq!(scores, vec![6, 10, 10, 15]);
        assert_eq!(analysis.overall, 41);
        assert_eq!(analysis.metrics[3].feedback, Feedback::Good);
        assert_eq!(analysis.metrics[2].feedback, Feedback::NeedsWork);
        assert_eq!(analysis.suggestions().count(), 8);
    }

    #[test]
    fn strong_collection_has_no_suggestions() {
        let input: Vec<PromptBlock> = (0..5)
            .map(|i| {
                let content = format!("Background and feature notes {}", "detail ".repeat(40));
                PromptBlock::new(content, i, BlockType::Text)
            })
            .collect();
        let analysis = analyze_quality(&input, Language::En);
        assert_eq!(analysis.overall, 100);
        assert!(analysis
            .metrics
            .iter()
            .all(|m| m.feedback == Feedback::Excellent && m.suggestions.is_empty()));
    }
}
