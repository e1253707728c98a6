//! Keyword families used by the scorer, the quality analyzer and the
//! reorder advisor.
//!
//! Every family has an English pattern (case-insensitive) and a Japanese
//! pattern. Matching is independent per family: one block may belong to
//! several.

use regex::Regex;
use std::sync::LazyLock;

/// Keyword family used to classify a block for reordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Family {
    Context,
    Requirement,
    Technical,
}

static CONTEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)context|background|overview|introduction|コンテキスト|背景|概要|導入")
        .expect("Invalid context regex")
});

static REQUIREMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)requirement|feature|function|need|must|要件|機能|必要|仕様")
        .expect("Invalid requirement regex")
});

static TECHNICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)technical|implementation|code|api|database|技術|実装|コード|データベース")
        .expect("Invalid technical regex")
});

// Quality analyzer keywords.
static QUALITY_CONTEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)context|background|goal|objective|purpose|コンテキスト|背景|目標|目的")
        .expect("Invalid quality context regex")
});

static QUALITY_REQUIREMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)requirement|feature|function|need|要件|機能|必要")
        .expect("Invalid quality requirement regex")
});

// Priority score weights. Matched against lowercased content.
static PRIORITY_CONTEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"context|background|overview").expect("Invalid priority context regex")
});
static PRIORITY_REQUIREMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"requirement|feature|function").expect("Invalid priority requirement regex")
});
static PRIORITY_GOAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"goal|objective|purpose").expect("Invalid priority goal regex")
});
static PRIORITY_TECHNICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"technical|implementation|code").expect("Invalid priority technical regex")
});

/// Keywords that earn the scorer its context points.
const SCORE_CONTEXT_KEYWORDS: &[&str] = &[
    "context",
    "background",
    "goal",
    "requirement",
    "コンテキスト",
    "背景",
    "目標",
    "要件",
];

/// Whether `content` belongs to `family`.
pub fn matches(family: Family, content: &str) -> bool {
    let re = match family {
        Family::Context => &CONTEXT,
        Family::Requirement => &REQUIREMENT,
        Family::Technical => &TECHNICAL,
    };
    re.is_match(content)
}

/// All families `content` belongs to, in context, requirement, technical
/// order.
pub fn families(content: &str) -> Vec<Family> {
    [Family::Context, Family::Requirement, Family::Technical]
        .into_iter()
        .filter(|f| matches(*f, content))
        .collect()
}

/// Whether `content` carries one of the scorer's context keywords.
pub fn has_score_context(content: &str) -> bool {
    let lower = content.to_lowercase();
    SCORE_CONTEXT_KEYWORDS.iter().any(|k| lower.contains(k))
}

pub fn has_quality_context(content: &str) -> bool {
    QUALITY_CONTEXT.is_match(content)
}

pub fn has_quality_requirement(content: &str) -> bool {
    QUALITY_REQUIREMENT.is_match(content)
}

/// Importance score used by the priority-based reorder suggestion.
///
/// Context-like +10, goal-like +9, requirement-like +8, technical-like +3,
/// plus one point per hundred characters up to five.
pub fn priority_score(content: &str) -> f64 {
    let lower = content.to_lowercase();
    let mut score = 0.0;
    if PRIORITY_CONTEXT.is_match(&lower) {
        score += 10.0;
    }
    if PRIORITY_REQUIREMENT.is_match(&lower) {
        score += 8.0;
    }
    if PRIORITY_GOAL.is_match(&lower) {
        score += 9.0;
    }
    if PRIORITY_TECHNICAL.is_match(&lower) {
        score += 3.0;
    }
    score + (content.chars().count() as f64 / 100.0).min(5.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_can_match_several_families() {
        let found = families("Background: the API must support login");
        assert_eq!(
            found,
            vec![Family::Context, Family::Requirement, Family::Technical]
        );
    }

    #[test]
    fn japanese_keywords_match() {
        assert!(matches(Family::Context, "プロジェクトの背景"));
        assert!(matches(Family::Requirement, "ログイン機能"));
        assert!(matches(Family::Technical, "データベース設計"));
        assert!(families("こんにちは").is_empty());
    }

    #[test]
    fn english_matching_ignores_case() {
        assert!(matches(Family::Context, "OVERVIEW"));
        assert!(matches(Family::Technical, "REST Api"));
    }

    #[test]
    fn priority_score_adds_weights_and_length_bonus() {
        assert_eq!(priority_score("context"), 10.0 + 0.07);
        let long = format!("goal {}", "x".repeat(995));
        assert_eq!(priority_score(&long), 9.0 + 5.0);
        assert_eq!(priority_score(""), 0.0);
    }

    #[test]
    fn score_context_keywords() {
        assert!(has_score_context("Our GOAL is simple"));
        assert!(has_score_context("要件一覧"));
        assert!(!has_score_context("nothing relevant"));
    }
}
