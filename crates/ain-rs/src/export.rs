//! Exporting blocks and proposals as files, and importing blocks back.
//!
//! Where the bytes end up is behind [`FileSink`]; [`FsSink`] writes into a
//! directory.

use crate::compose::PromptBlock;
use crate::error::{AinError, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name used for block exports.
pub const BLOCKS_FILENAME: &str = "prompt-blocks.json";

pub const JSON_MIME: &str = "application/json";
pub const MARKDOWN_MIME: &str = "text/markdown;charset=utf-8";

/// Destination for exported files ("save bytes as a file").
pub trait FileSink {
    fn save(&self, filename: &str, mime_type: &str, bytes: &[u8]) -> Result<()>;
}

/// Sink writing files into a directory.
#[derive(Debug, Clone)]
pub struct FsSink {
    dir: PathBuf,
}

impl FsSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where `filename` would be written.
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }
}

impl FileSink for FsSink {
    fn save(&self, filename: &str, mime_type: &str, bytes: &[u8]) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(filename);
        std::fs::write(&path, bytes)?;
        info!("Exported {} ({mime_type}, {} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

/// Pretty-printed JSON array of `blocks`.
pub fn blocks_to_json(blocks: &[PromptBlock]) -> Result<String> {
    serde_json::to_string_pretty(blocks).map_err(|e| AinError::Encode(e.to_string()))
}

/// Parse a JSON array of blocks. Nothing beyond a parse is validated.
pub fn import_blocks_json(json: &str) -> Result<Vec<PromptBlock>> {
    let blocks: Vec<PromptBlock> = serde_json::from_str(json).map_err(AinError::Import)?;
    debug!("Parsed {} blocks for import", blocks.len());
    Ok(blocks)
}

/// Write `blocks` to the sink as [`BLOCKS_FILENAME`].
pub fn export_blocks_json(sink: &dyn FileSink, blocks: &[PromptBlock]) -> Result<()> {
    let json = blocks_to_json(blocks)?;
    sink.save(BLOCKS_FILENAME, JSON_MIME, json.as_bytes())
}

/// Write markdown `content` to the sink.
pub fn export_markdown(sink: &dyn FileSink, filename: &str, content: &str) -> Result<()> {
    sink.save(filename, MARKDOWN_MIME, content.as_bytes())
}

/// Download name for a proposal generated on `date`.
pub fn proposal_filename(date: NaiveDate) -> String {
    format!("AIN企画書_{}.md", date.format("%Y-%m-%d"))
}
