//! Turning an ordered block collection into prompt text.
//!
//! [`assemble`] is the payload actually submitted. [`compress`] is a
//! first-sentence summarizer; it is a pure heuristic, not a model call.

use super::block::PromptBlock;
use crate::language::Language;
use regex::Regex;
use std::sync::LazyLock;

/// Separator between blocks in the assembled prompt.
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// Minimum trimmed length (in characters) for a sentence to summarize a block.
const MIN_SENTENCE_CHARS: usize = 10;

/// Characters kept when no sentence in a block qualifies.
const FALLBACK_CHARS: usize = 50;

/// Characters kept by [`truncate_preview`].
const PREVIEW_CHARS: usize = 200;

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?。！？]").expect("Invalid sentence regex"));

/// Blocks sorted by priority, leaving the input untouched.
fn by_priority(blocks: &[PromptBlock]) -> Vec<&PromptBlock> {
    let mut sorted: Vec<&PromptBlock> = blocks.iter().collect();
    sorted.sort_by_key(|b| b.priority);
    sorted
}

/// Join block contents in ascending priority order, separated by a blank
/// line.
///
/// ```
/// use ain_rs::compose::{BlockType, PromptBlock, assemble};
///
/// let b = PromptBlock::new("B", 1, BlockType::Text);
/// let a = PromptBlock::new("A", 0, BlockType::Text);
/// assert_eq!(assemble(&[b, a]), "A\n\nB");
/// ```
pub fn assemble(blocks: &[PromptBlock]) -> String {
    by_priority(blocks)
        .into_iter()
        .map(|b| b.content.as_str())
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

/// Summarize each block to its first qualifying sentence.
///
/// A sentence qualifies when it is longer than ten characters after
/// trimming. Blocks with no qualifying sentence contribute their first fifty
/// characters. Summaries are joined with `". "` and end with a period.
/// Blocks with blank content are skipped; no blocks gives an empty string.
pub fn compress(blocks: &[PromptBlock]) -> String {
    let summaries: Vec<String> = by_priority(blocks)
        .into_iter()
        .filter_map(|b| summarize_block(&b.content))
        .collect();

    if summaries.is_empty() {
        return String::new();
    }
    format!("{}.", summaries.join(". "))
}

fn summarize_block(content: &str) -> Option<String> {
    let content = content.trim();
    if content.is_empty() {
        return None;
    }
    let sentence = SENTENCE_END
        .split(content)
        .map(str::trim)
        .find(|s| s.chars().count() > MIN_SENTENCE_CHARS);

    Some(match sentence {
        Some(s) => s.to_string(),
        None => content.chars().take(FALLBACK_CHARS).collect(),
    })
}

/// Wrap an assembled prompt with the project context the proposal service
/// expects: development time budget, language preference and a closing
/// request.
pub fn enhance_prompt(combined: &str, development_time: u32, language: Language) -> String {
    match language {
        Language::En => format!(
            "Project Context:\n\
             - Development time budget: {development_time} months\n\
             - Language preference: English\n\n\
             User Requirements:\n\
             {combined}\n\n\
             Please provide a comprehensive project proposal based on the above requirements and constraints."
        ),
        Language::Ja => format!(
            "プロジェクトコンテキスト:\n\
             - 開発時間予算: {development_time}ヶ月\n\
             - 言語設定: 日本語\n\n\
             ユーザー要件:\n\
             {combined}\n\n\
             上記の要件と制約に基づいて、包括的なプロジェクト提案を提供してください。"
        ),
    }
}

/// Cut a long prompt down for preview display.
pub fn truncate_preview(prompt: &str) -> String {
    if prompt.chars().count() <= PREVIEW_CHARS {
        return prompt.to_string();
    }
    let head: String = prompt.chars().take(PREVIEW_CHARS).collect();
    format!("{head}... [truncated]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::block::BlockType;

    fn block(content: &str, priority: u32) -> PromptBlock {
        PromptBlock::new(content, priority, BlockType::Text)
    }

    #[test]
    fn assemble_orders_by_priority() {
        let blocks = vec![block("B", 1), block("A", 0)];
        assert_eq!(assemble(&blocks), "A\n\nB");
    }

    #[test]
    fn assemble_of_nothing_is_empty() {
        assert_eq!(assemble(&[]), "");
    }

    #[test]
    fn compress_takes_first_long_sentence() {
        let blocks = vec![
            block("Hi. This is the real first sentence! And more.", 0),
            block("Short. Tiny? Another proper sentence here.", 1),
        ];
        assert_eq!(
            compress(&blocks),
            "This is the real first sentence. Another proper sentence here."
        );
    }

    #[test]
    fn compress_falls_back_to_first_fifty_chars() {
        let content = "ok. ".repeat(30);
        let blocks = vec![block(&content, 0)];
        let expected: String = content.trim().chars().take(50).collect();
        assert_eq!(compress(&blocks), format!("{expected}."));
    }

    #[test]
    fn compress_respects_priority_and_skips_blank() {
        let blocks = vec![
            block("Second block sentence here", 1),
            block("   ", 2),
            block("First block sentence here", 0),
        ];
        assert_eq!(
            compress(&blocks),
            "First block sentence here. Second block sentence here."
        );
        assert_eq!(compress(&[]), "");
    }

    #[test]
    fn enhance_prompt_includes_budget_and_requirements() {
        let text = enhance_prompt("Build a CRM", 6, Language::En);
        assert!(text.starts_with("Project Context:"));
        assert!(text.contains("Development time budget: 6 months"));
        assert!(text.contains("User Requirements:\nBuild a CRM"));

        let ja = enhance_prompt("CRM", 3, Language::Ja);
        assert!(ja.contains("3ヶ月"));
    }

    #[test]
    fn truncate_preview_only_cuts_long_text() {
        assert_eq!(truncate_preview("short"), "short");
        let long = "a".repeat(250);
        let out = truncate_preview(&long);
        assert!(out.starts_with(&"a".repeat(200)));
        assert!(out.ends_with("[truncated]"));
    }
}
