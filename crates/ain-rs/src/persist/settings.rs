//! The versioned application settings document.

use super::local_store::{LANGUAGE_KEY, LocalStore, SETTINGS_KEY};
use crate::compose::PromptBlock;
use crate::error::Result;
use crate::language::Language;
use crate::voice::VoiceMemo;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Current schema version of [`AppSettings`].
pub const SETTINGS_VERSION: u32 = 1;

/// Development time budget when nothing is stored, in months.
pub const DEFAULT_DEVELOPMENT_TIME: u32 = 6;

/// Bounds of the development time budget, in months.
pub const DEVELOPMENT_TIME_RANGE: std::ops::RangeInclusive<u32> = 1..=18;

fn current_version() -> u32 {
    SETTINGS_VERSION
}

/// Everything the composer persists between runs.
///
/// Field names on disk are camelCase (`developmentTime`, `promptBlocks`,
/// `voiceMemos`). Missing fields take their defaults.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    #[serde(default = "current_version")]
    pub version: u32,
    pub language: Language,
    pub development_time: u32,
    pub prompt_blocks: Vec<PromptBlock>,
    pub voice_memos: Vec<VoiceMemo>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            language: Language::default(),
            development_time: DEFAULT_DEVELOPMENT_TIME,
            prompt_blocks: Vec::new(),
            voice_memos: Vec::new(),
        }
    }
}

impl AppSettings {
    /// Load settings from `store`.
    ///
    /// A missing document gives defaults. An unreadable or unparsable one is
    /// logged and also gives defaults; it is overwritten on the next save.
    pub fn load(store: &LocalStore) -> Self {
        match store.load::<AppSettings>(SETTINGS_KEY) {
            Ok(Some(mut settings)) => {
                if settings.version != SETTINGS_VERSION {
                    debug!(
                        "Settings version {} read, current is {SETTINGS_VERSION}",
                        settings.version
                    );
                    settings.version = SETTINGS_VERSION;
                }
                settings.development_time = clamp_development_time(settings.development_time);
                debug!(
                    "Loaded settings: {} blocks, {} voice memos",
                    settings.prompt_blocks.len(),
                    settings.voice_memos.len()
                );
                settings
            }
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("Ignoring stored settings: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &LocalStore) -> Result<()> {
        store.save(SETTINGS_KEY, self)
    }

    /// Set the development time budget, clamped to
    /// [`DEVELOPMENT_TIME_RANGE`].
    pub fn set_development_time(&mut self, months: u32) {
        self.development_time = clamp_development_time(months);
    }
}

pub fn clamp_development_time(months: u32) -> u32 {
    months.clamp(*DEVELOPMENT_TIME_RANGE.start(), *DEVELOPMENT_TIME_RANGE.end())
}

/// Stored interface language, if any. Unparsable values are ignored.
pub fn load_language(store: &LocalStore) -> Option<Language> {
    match store.load::<Language>(LANGUAGE_KEY) {
        Ok(language) => language,
        Err(e) => {
            warn!("Ignoring stored language: {e}");
            None
        }
    }
}

pub fn save_language(store: &LocalStore, language: Language) -> Result<()> {
    store.save(LANGUAGE_KEY, &language)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::BlockType;

    fn store() -> (tempfile::TempDir, LocalStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalStore::new(tmp.path()).unwrap();
        (tmp, store)
    }

    #[test]
    fn missing_settings_give_defaults() {
        let (_tmp, store) = store();
        let settings = AppSettings::load(&store);
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.development_time, 6);
    }

    #[test]
    fn garbage_settings_give_defaults() {
        let (_tmp, store) = store();
        store.write_raw(SETTINGS_KEY, "[1, 2").unwrap();
        assert_eq!(AppSettings::load(&store), AppSettings::default());
    }

    #[test]
    fn settings_round_trip_with_blocks() {
        let (_tmp, store) = store();
        let mut settings = AppSettings {
            language: Language::Ja,
            ..AppSettings::default()
        };
        settings.set_development_time(40);
        settings
            .prompt_blocks
            .push(PromptBlock::new("Background", 0, BlockType::Text));
        settings.voice_memos.push(VoiceMemo::new("memo"));
        settings.save(&store).unwrap();

        let loaded = AppSettings::load(&store);
        assert_eq!(loaded, settings);
        assert_eq!(loaded.development_time, 18);
    }

    #[test]
    fn unversioned_documents_load_as_current_version() {
        let (_tmp, store) = store();
        store
            .write_raw(
                SETTINGS_KEY,
                r#"{"language":"ja","developmentTime":3,"promptBlocks":[],"voiceMemos":[]}"#,
            )
            .unwrap();
        let settings = AppSettings::load(&store);
        assert_eq!(settings.version, SETTINGS_VERSION);
        assert_eq!(settings.language, Language::Ja);
        assert_eq!(settings.development_time, 3);
    }

    #[test]
    fn language_is_persisted_separately() {
        let (_tmp, store) = store();
        assert_eq!(load_language(&store), None);
        save_language(&store, Language::Ja).unwrap();
        assert_eq!(load_language(&store), Some(Language::Ja));
    }
}
