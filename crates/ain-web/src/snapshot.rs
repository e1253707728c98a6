//! Serializable projection of a [`Workspace`] for WebSocket and REST
//! transport.

use ain_rs::Language;
use ain_rs::analysis::{QualityScore, ReorderSuggestion};
use ain_rs::compose::PromptBlock;
use ain_rs::workspace::{ComposerState, Workspace};
use serde::Serialize;

/// Everything the composer screen renders, in one document.
#[derive(Debug, Serialize)]
pub struct WorkspaceSnapshot {
    pub state: ComposerState,
    pub revision: u64,
    pub language: Language,
    pub development_time: u32,
    pub blocks: Vec<PromptBlock>,
    /// Character count of the assembled prompt.
    pub prompt_chars: usize,
    pub quality: QualityScore,
    pub suggestions: Vec<ReorderSuggestion>,
    pub voice_memo_count: usize,
}

impl WorkspaceSnapshot {
    /// Build a snapshot. Call while holding the workspace lock.
    pub fn from_workspace(ws: &Workspace) -> Self {
        Self {
            state: ws.state(),
            revision: ws.revision(),
            language: ws.language(),
            development_time: ws.development_time(),
            blocks: ws.blocks().to_vec(),
            prompt_chars: ws.assembled_prompt().chars().count(),
            quality: ws.quality_score(),
            suggestions: ws.suggestions().to_vec(),
            voice_memo_count: ws.voice_memos().len(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ain_rs::config::ComposerConfig;

    #[test]
    fn snapshot_of_empty_workspace() {
        let ws = Workspace::in_memory(ComposerConfig::default());
        let snap = WorkspaceSnapshot::from_workspace(&ws);

        assert_eq!(snap.state, ComposerState::Idle);
        assert_eq!(snap.revision, 0);
        assert!(snap.blocks.is_empty());
        assert_eq!(snap.prompt_chars, 0);
        assert_eq!(snap.quality.score, 0);
        assert_eq!(snap.development_time, 6);
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let mut ws = Workspace::in_memory(ComposerConfig::default());
        ws.add_text("Background: a clinic booking tool");
        ws.add_text("Requirement: reminders");

        let json = WorkspaceSnapshot::from_workspace(&ws).to_json();
        assert_eq!(json["state"], "editing");
        assert_eq!(json["revision"], 2);
        assert_eq!(json["language"], "en");
        assert_eq!(json["blocks"].as_array().unwrap().len(), 2);
        assert_eq!(json["blocks"][1]["type"], "text");
        assert_eq!(
            json["prompt_chars"],
            "Background: a clinic booking tool\n\nRequirement: reminders"
                .chars()
                .count()
        );
    }
}
