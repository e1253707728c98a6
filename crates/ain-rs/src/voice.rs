//! Voice input: recordings, transcription and voice memos.
//!
//! Audio capture itself happens outside this crate. A [`Recording`] is the
//! opaque result of a capture or a file upload; a [`Transcriber`] turns it
//! into text that becomes a `voice` block.

use crate::compose::new_block_id;
use crate::error::Result;
use crate::language::Language;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use tracing::debug;

/// Boxed future returned by [`Transcriber::transcribe`].
pub type TranscribeFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// Where a recording came from.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordingSource {
    /// Captured live from a microphone.
    Microphone,
    /// Uploaded as an audio file.
    Upload,
}

/// Captured or uploaded audio.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recording {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub source: RecordingSource,
}

impl Recording {
    pub fn captured(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            source: RecordingSource::Microphone,
        }
    }

    pub fn uploaded(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            source: RecordingSource::Upload,
        }
    }

    /// Whether the MIME type is `audio/*`.
    pub fn is_audio(&self) -> bool {
        self.mime_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("audio/")
    }
}

/// Strategy for turning audio into text.
pub trait Transcriber: Send + Sync {
    fn transcribe<'a>(&'a self, recording: &'a Recording, language: Language)
    -> TranscribeFuture<'a>;
}

/// Transcriber that returns a fixed localized placeholder instead of
/// recognizing speech.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlaceholderTranscriber;

impl PlaceholderTranscriber {
    pub fn placeholder(source: RecordingSource, language: Language) -> &'static str {
        match source {
            RecordingSource::Microphone => language.pick(
                "[Voice transcription would appear here]",
                "[音声の転写がここに表示されます]",
            ),
            RecordingSource::Upload => language.pick(
                "[Audio file transcription would appear here]",
                "[音声ファイルの転写がここに表示されます]",
            ),
        }
    }
}

impl Transcriber for PlaceholderTranscriber {
    fn transcribe<'a>(
        &'a self,
        recording: &'a Recording,
        language: Language,
    ) -> TranscribeFuture<'a> {
        Box::pin(async move {
            debug!(
                "Placeholder transcription of {} bytes ({})",
                recording.bytes.len(),
                recording.mime_type
            );
            Ok(Self::placeholder(recording.source, language).to_string())
        })
    }
}

/// A transcribed recording kept in the settings document.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VoiceMemo {
    pub id: String,
    pub transcription: String,
    pub timestamp: DateTime<Utc>,
}

impl VoiceMemo {
    pub fn new(transcription: impl Into<String>) -> Self {
        Self {
            id: new_block_id(),
            transcription: transcription.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_audio_mime_types_are_audio() {
        assert!(Recording::uploaded(vec![1], "audio/webm").is_audio());
        assert!(Recording::uploaded(vec![1], "Audio/MPEG").is_audio());
        assert!(!Recording::uploaded(vec![1], "video/mp4").is_audio());
        assert!(!Recording::uploaded(vec![1], "").is_audio());
    }

    #[tokio::test]
    async fn placeholder_depends_on_source_and_language() {
        let transcriber = PlaceholderTranscriber;
        let mic = Recording::captured(vec![0; 16], "audio/webm");
        let file = Recording::uploaded(vec![0; 16], "audio/wav");

        assert_eq!(
            transcriber.transcribe(&mic, Language::En).await.unwrap(),
            "[Voice transcription would appear here]"
        );
        assert_eq!(
            transcriber.transcribe(&file, Language::Ja).await.unwrap(),
            "[音声ファイルの転写がここに表示されます]"
        );
    }

    #[test]
    fn memo_serializes_with_rfc3339_timestamp() {
        let memo = VoiceMemo::new("hello");
        let json = serde_json::to_value(&memo).unwrap();
        let ts = json["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
    }
}
