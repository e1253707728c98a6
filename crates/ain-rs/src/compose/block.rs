//! The [`PromptBlock`] entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a block came into existence. Fixed at creation.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    /// Typed by the user.
    Text,
    /// Produced from a voice recording or an uploaded audio file.
    Voice,
    /// Materialized from a template library entry.
    Template,
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockType::Text => write!(f, "text"),
            BlockType::Voice => write!(f, "voice"),
            BlockType::Template => write!(f, "template"),
        }
    }
}

/// One unit of prompt text.
///
/// `id`, `timestamp` and `block_type` never change after creation. `content`
/// changes through edits; `priority` is rewritten by the store whenever the
/// ordering changes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PromptBlock {
    pub id: String,
    pub content: String,
    pub priority: u32,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub block_type: BlockType,
}

impl PromptBlock {
    /// Create a block with a fresh id and the current time.
    pub fn new(content: impl Into<String>, priority: u32, block_type: BlockType) -> Self {
        Self {
            id: new_block_id(),
            content: content.into(),
            priority,
            timestamp: Utc::now(),
            block_type,
        }
    }

    /// Length of the content in characters.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Opaque unique identifier for a new block.
pub fn new_block_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Ids of `blocks` in their current order.
pub fn id_order(blocks: &[PromptBlock]) -> Vec<&str> {
    blocks.iter().map(|b| b.id.as_str()).collect()
}
