//! The composer workspace: one block store plus everything around it.
//!
//! [`Workspace`] owns the [`BlockStore`], the persisted settings, the
//! analysis strategies and the transcriber. Every mutation goes through it
//! so that settings are rewritten and pending reorder suggestions are
//! handled according to the configured [`StalenessPolicy`].
//!
//! # State machine
//!
//! ```text
//!            mutation                 begin_analysis
//!   Idle ──────────────▶ Editing ─────────────────────▶ Analyzing
//!    ▲                      │                              │
//!    │                      └──── begin_analysis ──────────┤
//!    └──────────── complete_analysis / cancel_analysis ────┘
//! ```
//!
//! Mutations while `Analyzing` keep the state; whether the eventual result
//! is kept depends on the staleness policy.

use crate::analysis::{
    HeuristicScorer, KeywordReorderAdvisor, QualityAnalysis, QualityScore, QualityScorer,
    ReorderAdvisor, ReorderSuggestion, SuggestionKind, analyze_after,
};
use crate::compose::{
    self, BlockStore, BlockType, LoggingObserver, PromptBlock, ReplaceReason, Snapshot,
    StoreObserver,
};
use crate::config::{ComposerConfig, StalenessPolicy};
use crate::error::{AinError, Result};
use crate::export::{self, FileSink};
use crate::language::Language;
use crate::persist::{self, AppSettings, LocalStore};
use crate::templates::{self, PromptTemplate};
use crate::voice::{PlaceholderTranscriber, Recording, Transcriber, VoiceMemo};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComposerState {
    #[default]
    Idle,
    Editing,
    /// A reorder analysis has been started and not yet completed.
    Analyzing,
}

/// A reorder analysis detached from the workspace.
///
/// Produced by [`Workspace::begin_analysis`]. Run it without holding the
/// workspace, then hand the result to [`Workspace::complete_analysis`].
pub struct PendingAnalysis {
    snapshot: Snapshot,
    language: Language,
    delay: Duration,
    advisor: Arc<dyn ReorderAdvisor>,
}

impl PendingAnalysis {
    /// Revision of the blocks being analyzed.
    pub fn revision(&self) -> u64 {
        self.snapshot.revision
    }

    /// Wait for the simulated delay, then compute suggestions from the
    /// snapshot.
    pub async fn run(self) -> Vec<ReorderSuggestion> {
        analyze_after(
            self.advisor.as_ref(),
            self.snapshot,
            self.language,
            self.delay,
        )
        .await
    }
}

pub struct Workspace {
    store: BlockStore,
    settings: AppSettings,
    local: Option<LocalStore>,
    config: ComposerConfig,
    scorer: Arc<dyn QualityScorer>,
    advisor: Arc<dyn ReorderAdvisor>,
    transcriber: Arc<dyn Transcriber>,
    state: ComposerState,
    suggestions: Vec<ReorderSuggestion>,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("store", &self.store)
            .field("state", &self.state)
            .field("language", &self.settings.language)
            .field("persistent", &self.local.is_some())
            .finish()
    }
}

impl Workspace {
    /// Open the workspace persisted under `config.state_dir`.
    ///
    /// The language comes from the stored language document, falling back
    /// to `config.default_language`.
    pub fn open(config: ComposerConfig) -> Result<Self> {
        let local = LocalStore::new(&config.state_dir)?;
        let mut settings = AppSettings::load(&local);
        settings.language = persist::load_language(&local).unwrap_or(config.default_language);
        let blocks = std::mem::take(&mut settings.prompt_blocks);
        info!(
            "Opened workspace at {} ({} blocks)",
            local.dir().display(),
            blocks.len()
        );
        Ok(Self::assemble_parts(config, settings, Some(local), blocks))
    }

    /// Workspace that persists nothing.
    pub fn in_memory(config: ComposerConfig) -> Self {
        let settings = AppSettings {
            language: config.default_language,
            ..AppSettings::default()
        };
        Self::assemble_parts(config, settings, None, Vec::new())
    }

    fn assemble_parts(
        config: ComposerConfig,
        settings: AppSettings,
        local: Option<LocalStore>,
        blocks: Vec<PromptBlock>,
    ) -> Self {
        Self {
            store: BlockStore::from_blocks(blocks).with_observer(LoggingObserver),
            settings,
            local,
            config,
            scorer: Arc::new(HeuristicScorer),
            advisor: Arc::new(KeywordReorderAdvisor),
            transcriber: Arc::new(PlaceholderTranscriber),
            state: ComposerState::Idle,
            suggestions: Vec::new(),
        }
    }

    pub fn with_scorer(mut self, scorer: impl QualityScorer + 'static) -> Self {
        self.scorer = Arc::new(scorer);
        self
    }

    pub fn with_advisor(mut self, advisor: impl ReorderAdvisor + 'static) -> Self {
        self.advisor = Arc::new(advisor);
        self
    }

    pub fn with_transcriber(mut self, transcriber: impl Transcriber + 'static) -> Self {
        self.transcriber = Arc::new(transcriber);
        self
    }

    /// Replace the store observer (the default logs every event).
    pub fn with_observer(mut self, observer: impl StoreObserver + 'static) -> Self {
        self.store.set_observer(Box::new(observer));
        self
    }

    // ── Queries ────────────────────────────────────────────────────

    pub fn blocks(&self) -> &[PromptBlock] {
        self.store.blocks()
    }

    pub fn store(&self) -> &BlockStore {
        &self.store
    }

    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    pub fn state(&self) -> ComposerState {
        self.state
    }

    pub fn language(&self) -> Language {
        self.settings.language
    }

    pub fn development_time(&self) -> u32 {
        self.settings.development_time
    }

    pub fn voice_memos(&self) -> &[VoiceMemo] {
        &self.settings.voice_memos
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Suggestions from the last completed analysis that are still
    /// applicable.
    pub fn suggestions(&self) -> &[ReorderSuggestion] {
        &self.suggestions
    }

    /// Blocks whose content contains `query`, case-insensitively.
    pub fn filter(&self, query: &str) -> Vec<&PromptBlock> {
        self.store.filter(query)
    }

    // ── Editing ────────────────────────────────────────────────────

    /// Add a typed block. Blank content is ignored.
    pub fn add_text(&mut self, content: &str) -> Option<PromptBlock> {
        let added = self.store.add(content, BlockType::Text).cloned();
        if added.is_some() {
            self.after_mutation();
        }
        added
    }

    pub fn edit(&mut self, id: &str, content: &str) -> bool {
        let changed = self.store.update(id, content);
        if changed {
            self.after_mutation();
        }
        changed
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let changed = self.store.delete(id);
        if changed {
            self.after_mutation();
        }
        changed
    }

    /// Drag `dragged_id` onto `target_id`.
    pub fn move_block(&mut self, dragged_id: &str, target_id: &str) -> bool {
        let changed = self.store.reorder(dragged_id, target_id);
        if changed {
            self.after_mutation();
        }
        changed
    }

    pub fn clear(&mut self) {
        self.store.clear();
        self.after_mutation();
    }

    /// Replace all blocks with the expansion of template `id`. Returns the
    /// template that was loaded.
    pub fn load_template(&mut self, id: &str) -> Result<PromptTemplate> {
        let template = templates::find_template(id, self.language(), self.development_time())?;
        let blocks = template
            .blocks
            .iter()
            .enumerate()
            .map(|(index, content)| PromptBlock::new(content, index as u32, BlockType::Template))
            .collect();
        self.store.replace_all(blocks, ReplaceReason::Template);
        self.after_mutation();
        info!("Loaded template '{}'", template.id);
        Ok(template)
    }

    /// Replace all blocks with a JSON array of blocks.
    ///
    /// On a parse failure the error is logged and returned and the current
    /// blocks are left untouched.
    pub fn import_json(&mut self, json: &str) -> Result<usize> {
        let blocks = export::import_blocks_json(json).inspect_err(|e| {
            warn!("Failed to import blocks: {e}");
        })?;
        let count = blocks.len();
        self.store.replace_all(blocks, ReplaceReason::Import);
        self.after_mutation();
        Ok(count)
    }

    pub fn export_json(&self) -> Result<String> {
        export::blocks_to_json(self.blocks())
    }

    /// Write the blocks to `sink` as `prompt-blocks.json`.
    pub fn export_to(&self, sink: &dyn FileSink) -> Result<()> {
        export::export_blocks_json(sink, self.blocks())
    }

    // ── Voice ──────────────────────────────────────────────────────

    /// Transcribe a microphone recording into a `voice` block.
    ///
    /// A transcription failure is logged and returned; nothing changes.
    pub async fn add_recording(&mut self, recording: Recording) -> Result<Option<PromptBlock>> {
        self.add_transcribed(recording).await
    }

    /// Transcribe an uploaded audio file into a `voice` block. Files that
    /// are not `audio/*` are ignored.
    pub async fn upload_audio(&mut self, recording: Recording) -> Result<Option<PromptBlock>> {
        if !recording.is_audio() {
            debug!("Ignoring upload of type '{}'", recording.mime_type);
            return Ok(None);
        }
        self.add_transcribed(recording).await
    }

    async fn add_transcribed(&mut self, recording: Recording) -> Result<Option<PromptBlock>> {
        let transcriber = Arc::clone(&self.transcriber);
        let text = transcriber
            .transcribe(&recording, self.language())
            .await
            .inspect_err(|e| warn!("Transcription failed: {e}"))?;

        let Some(block) = self.store.add(&text, BlockType::Voice).cloned() else {
            return Ok(None);
        };
        self.settings.voice_memos.push(VoiceMemo::new(text));
        self.after_mutation();
        Ok(Some(block))
    }

    // ── Settings ───────────────────────────────────────────────────

    pub fn set_language(&mut self, language: Language) {
        self.settings.language = language;
        if let Some(local) = &self.local
            && let Err(e) = persist::save_language(local, language)
        {
            warn!("Failed to save language: {e}");
        }
        self.persist();
    }

    /// Set the development time budget, clamped to 1..=18 months.
    pub fn set_development_time(&mut self, months: u32) {
        self.settings.set_development_time(months);
        self.persist();
    }

    // ── Analysis ───────────────────────────────────────────────────

    pub fn quality_score(&self) -> QualityScore {
        self.scorer.score(self.blocks(), self.language())
    }

    pub fn quality_analysis(&self) -> QualityAnalysis {
        self.scorer.analyze(self.blocks(), self.language())
    }

    /// Snapshot the blocks and enter `Analyzing`.
    pub fn begin_analysis(&mut self) -> PendingAnalysis {
        self.state = ComposerState::Analyzing;
        let snapshot = self.store.snapshot();
        debug!("Reorder analysis started at revision {}", snapshot.revision);
        PendingAnalysis {
            snapshot,
            language: self.language(),
            delay: self.config.analysis_delay,
            advisor: Arc::clone(&self.advisor),
        }
    }

    /// Store the result of an analysis and return to `Idle`.
    ///
    /// Under [`StalenessPolicy::Invalidate`], results computed from an
    /// older revision are discarded. Returns the number of suggestions kept.
    pub fn complete_analysis(&mut self, suggestions: Vec<ReorderSuggestion>) -> usize {
        self.state = ComposerState::Idle;
        let current = self.revision();
        let stale = suggestions.iter().any(|s| s.revision != current);
        if stale && self.config.staleness == StalenessPolicy::Invalidate {
            warn!("Discarding reorder suggestions computed before revision {current}");
            self.suggestions.clear();
            return 0;
        }
        self.suggestions = suggestions;
        self.suggestions.len()
    }

    /// Abandon a running analysis and return to `Idle`.
    ///
    /// Pending suggestions are left as they are. A result that still arrives
    /// goes through [`Workspace::complete_analysis`] as usual.
    pub fn cancel_analysis(&mut self) {
        if self.state == ComposerState::Analyzing {
            self.state = ComposerState::Idle;
        }
    }

    /// Run a full analysis in place: begin, wait, complete.
    pub async fn analyze_reorder(&mut self) -> &[ReorderSuggestion] {
        let pending = self.begin_analysis();
        let suggestions = pending.run().await;
        self.complete_analysis(suggestions);
        &self.suggestions
    }

    /// Apply the pending suggestion of `kind` as a bulk replace.
    pub fn apply_suggestion(&mut self, kind: SuggestionKind) -> Result<()> {
        let position = self
            .suggestions
            .iter()
            .position(|s| s.kind == kind)
            .ok_or_else(|| AinError::UnknownSuggestion(kind.id().to_string()))?;

        let current = self.revision();
        let suggestion = &self.suggestions[position];
        if suggestion.revision != current && self.config.staleness == StalenessPolicy::Invalidate {
            let expected = suggestion.revision;
            self.suggestions.clear();
            return Err(AinError::StaleSuggestion {
                expected,
                actual: current,
            });
        }

        let suggestion = self.suggestions.swap_remove(position);
        info!(
            "Applying '{}' suggestion ({}% confidence)",
            suggestion.kind, suggestion.confidence
        );
        self.store
            .replace_all(suggestion.new_order, ReplaceReason::Suggestion);
        self.suggestions.clear();
        self.after_mutation();
        Ok(())
    }

    // ── Prompt text ────────────────────────────────────────────────

    pub fn assembled_prompt(&self) -> String {
        compose::assemble(self.blocks())
    }

    /// First-sentence summary of the blocks, after the simulated
    /// compression delay.
    pub async fn compressed_prompt(&self) -> String {
        let blocks = self.blocks().to_vec();
        if !self.config.compression_delay.is_zero() {
            tokio::time::sleep(self.config.compression_delay).await;
        }
        compose::compress(&blocks)
    }

    /// Assembled prompt wrapped with the project context header.
    pub fn enhanced_prompt(&self) -> String {
        compose::enhance_prompt(
            &self.assembled_prompt(),
            self.development_time(),
            self.language(),
        )
    }

    // ── Internals ──────────────────────────────────────────────────

    fn after_mutation(&mut self) {
        if self.state != ComposerState::Analyzing {
            self.state = ComposerState::Editing;
        }
        if self.config.staleness == StalenessPolicy::Invalidate && !self.suggestions.is_empty() {
            debug!("Blocks changed; dropping {} suggestions", self.suggestions.len());
            self.suggestions.clear();
        }
        self.persist();
    }

    /// Rewrite the settings document. Failures are logged.
    fn persist(&mut self) {
        let Some(local) = &self.local else {
            return;
        };
        self.settings.prompt_blocks = self.store.snapshot().blocks;
        let result = self.settings.save(local);
        self.settings.prompt_blocks.clear();
        if let Err(e) = result {
            warn!("Failed to save settings: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::is_dense;
    use crate::voice::TranscribeFuture;

    fn workspace() -> Workspace {
        Workspace::in_memory(ComposerConfig::default().without_delays())
    }

    fn flow_blocks(ws: &mut Workspace) {
        ws.add_text("Use PostgreSQL for implementation");
        ws.add_text("We require a login feature");
        ws.add_text("Background of the project");
    }

    struct FailingTranscriber;

    impl Transcriber for FailingTranscriber {
        fn transcribe<'a>(
            &'a self,
            _recording: &'a Recording,
            _language: Language,
        ) -> TranscribeFuture<'a> {
            Box::pin(async { Err(AinError::Transcription("microphone denied".into())) })
        }
    }

    #[test]
    fn mutations_move_to_editing() {
        let mut ws = workspace();
        assert_eq!(ws.state(), ComposerState::Idle);
        ws.add_text("hello");
        assert_eq!(ws.state(), ComposerState::Editing);
        assert!(ws.add_text("   ").is_none());
        assert_eq!(ws.blocks().len(), 1);
    }

    #[tokio::test]
    async fn analysis_then_apply_reorders_blocks() {
        let mut ws = workspace();
        flow_blocks(&mut ws);

        let count = ws.analyze_reorder().await.len();
        assert!(count > 0);
        assert_eq!(ws.state(), ComposerState::Idle);

        ws.apply_suggestion(SuggestionKind::LogicalFlow).unwrap();
        let order: Vec<&str> = ws.blocks().iter().map(|b| b.content.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "Background of the project",
                "We require a login feature",
                "Use PostgreSQL for implementation",
            ]
        );
        assert!(is_dense(ws.blocks()));
        assert!(ws.suggestions().is_empty());
    }

    #[tokio::test]
    async fn mutation_during_analysis_discards_result() {
        let mut ws = workspace();
        flow_blocks(&mut ws);

        let pending = ws.begin_analysis();
        assert_eq!(ws.state(), ComposerState::Analyzing);
        ws.add_text("A late addition");
        assert_eq!(ws.state(), ComposerState::Analyzing);

        let kept = ws.complete_analysis(pending.run().await);
        assert_eq!(kept, 0);
        assert!(matches!(
            ws.apply_suggestion(SuggestionKind::ContextFirst),
            Err(AinError::UnknownSuggestion(_))
        ));
    }

    #[test]
    fn cancel_returns_to_idle_only_from_analyzing() {
        let mut ws = workspace();
        ws.add_text("Background of the project");
        ws.cancel_analysis();
        assert_eq!(ws.state(), ComposerState::Editing);

        let _pending = ws.begin_analysis();
        assert_eq!(ws.state(), ComposerState::Analyzing);
        ws.cancel_analysis();
        assert_eq!(ws.state(), ComposerState::Idle);
    }

    #[test]
    fn in_memory_workspace_uses_default_language() {
        let ws = Workspace::in_memory(ComposerConfig::default().with_language(Language::Ja));
        assert_eq!(ws.language(), Language::Ja);
    }

    #[tokio::test]
    async fn snapshot_and_ignore_applies_stale_order() {
        let config = ComposerConfig::default()
            .without_delays()
            .with_staleness(StalenessPolicy::SnapshotAndIgnore);
        let mut ws = Workspace::in_memory(config);
        flow_blocks(&mut ws);

        let pending = ws.begin_analysis();
        ws.add_text("A late addition");
        assert!(ws.complete_analysis(pending.run().await) > 0);

        ws.apply_suggestion(SuggestionKind::LogicalFlow).unwrap();
        // The snapshot had three blocks; the late one is lost.
        assert_eq!(ws.blocks().len(), 3);
    }

    #[tokio::test]
    async fn edit_after_analysis_invalidates_suggestions() {
        let mut ws = workspace();
        flow_blocks(&mut ws);
        ws.analyze_reorder().await;
        let id = ws.blocks()[0].id.clone();
        ws.edit(&id, "Use SQLite for implementation");
        assert!(ws.suggestions().is_empty());
    }

    #[test]
    fn template_replaces_blocks() {
        let mut ws = workspace();
        ws.add_text("old");
        let template = ws.load_template("ai-chatbot").unwrap();
        assert_eq!(ws.blocks().len(), template.blocks.len());
        assert!(ws.blocks().iter().all(|b| b.block_type == BlockType::Template));
        assert!(ws.blocks()[0].content.contains("6 months"));
        assert!(ws.load_template("missing").is_err());
    }

    #[test]
    fn malformed_import_keeps_blocks() {
        let mut ws = workspace();
        ws.add_text("keep me");
        let rev = ws.revision();
        assert!(ws.import_json("[{broken").is_err());
        assert_eq!(ws.blocks().len(), 1);
        assert_eq!(ws.revision(), rev);
    }

    #[test]
    fn export_import_round_trip() {
        let mut ws = workspace();
        ws.add_text("first");
        ws.add_text("second");
        let json = ws.export_json().unwrap();

        let mut other = workspace();
        assert_eq!(other.import_json(&json).unwrap(), 2);
        assert_eq!(other.blocks(), ws.blocks());
    }

    #[tokio::test]
    async fn uploads_must_be_audio() {
        let mut ws = workspace();
        let ignored = ws
            .upload_audio(Recording::uploaded(vec![1, 2], "image/png"))
            .await
            .unwrap();
        assert!(ignored.is_none());

        let block = ws
            .upload_audio(Recording::uploaded(vec![1, 2], "audio/mpeg"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(block.block_type, BlockType::Voice);
        assert_eq!(ws.voice_memos().len(), 1);
    }

    #[tokio::test]
    async fn failed_transcription_changes_nothing() {
        let mut ws = workspace().with_transcriber(FailingTranscriber);
        let result = ws
            .add_recording(Recording::captured(vec![0], "audio/webm"))
            .await;
        assert!(matches!(result, Err(AinError::Transcription(_))));
        assert!(ws.blocks().is_empty());
        assert!(ws.voice_memos().is_empty());
    }

    #[test]
    fn persisted_workspace_reopens_with_blocks_and_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ComposerConfig::default()
            .without_delays()
            .with_state_dir(tmp.path());

        {
            let mut ws = Workspace::open(config.clone()).unwrap();
            ws.add_text("Background info");
            ws.add_text("Feature list");
            ws.set_language(Language::Ja);
            ws.set_development_time(12);
        }

        let ws = Workspace::open(config).unwrap();
        assert_eq!(ws.blocks().len(), 2);
        assert_eq!(ws.language(), Language::Ja);
        assert_eq!(ws.development_time(), 12);
        assert!(is_dense(ws.blocks()));
    }

    #[test]
    fn enhanced_prompt_uses_settings() {
        let mut ws = workspace();
        ws.add_text("Build a booking app");
        ws.set_development_time(4);
        let prompt = ws.enhanced_prompt();
        assert!(prompt.contains("Development time budget: 4 months"));
        assert!(prompt.contains("Build a booking app"));
    }

    #[tokio::test]
    async fn compressed_prompt_summarizes() {
        let mut ws = workspace();
        ws.add_text("Tiny. This sentence is long enough. Another one.");
        assert_eq!(ws.compressed_prompt().await, "This sentence is long enough.");
    }
}
