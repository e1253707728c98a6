//! Directory of JSON documents keyed by fixed names.
//!
//! Each key maps to `<dir>/<key>.json`. Writes go to a temp file first and
//! are renamed into place, so a crash never leaves a half-written document.
//!
//! ```text
//! .ain/
//!   ain-language.json
//!   ain-settings.json
//! ```

use crate::error::{AinError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Key of the persisted interface language.
pub const LANGUAGE_KEY: &str = "ain-language";

/// Key of the persisted [`AppSettings`](super::AppSettings) document.
pub const SETTINGS_KEY: &str = "ain-settings";

#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the document stored under `key`.
    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Raw document text, or `None` if nothing is stored under `key`.
    pub fn read_raw(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key);
        if !path.exists() {
            trace!("No document at {}", path.display());
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(&path)?))
    }

    /// Atomic write: temp file, then rename into place.
    pub fn write_raw(&self, key: &str, contents: &str) -> Result<()> {
        let final_path = self.path(key);
        let tmp_path = self.dir.join(format!(".{key}.json.tmp"));
        std::fs::write(&tmp_path, contents)?;
        std::fs::rename(&tmp_path, &final_path)?;
        debug!("Saved {key} ({} bytes)", contents.len());
        Ok(())
    }

    /// Deserialize the document under `key`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.read_raw(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| AinError::Settings(format!("failed to parse {key}: {e}")))
    }

    /// Serialize `value` under `key`.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| AinError::Settings(format!("failed to serialize {key}: {e}")))?;
        self.write_raw(key, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Doc {
        n: u32,
    }

    #[test]
    fn save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalStore::new(tmp.path().join("state")).unwrap();
        store.save("doc", &Doc { n: 4 }).unwrap();
        assert_eq!(store.load::<Doc>("doc").unwrap(), Some(Doc { n: 4 }));
        assert!(!tmp.path().join("state/.doc.json.tmp").exists());
    }

    #[test]
    fn missing_key_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalStore::new(tmp.path()).unwrap();
        assert!(store.load::<Doc>("absent").unwrap().is_none());
    }

    #[test]
    fn unparsable_document_is_settings_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalStore::new(tmp.path()).unwrap();
        store.write_raw("doc", "{ not json").unwrap();
        let err = store.load::<Doc>("doc").unwrap_err();
        assert!(matches!(err, AinError::Settings(_)));
    }
}
