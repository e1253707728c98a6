//! [`StoreObserver`] that turns block store events into WebSocket messages.
//!
//! [`WebBroadcastObserver`] serializes every [`StoreEvent`] into a
//! [`WsMessage`] and sends it to all connected clients through a
//! `tokio::sync::broadcast` channel.

use ain_rs::Language;
use ain_rs::analysis::ReorderSuggestion;
use ain_rs::compose::{PromptBlock, ReplaceReason, StoreEvent, StoreObserver};
use serde::Serialize;
use tokio::sync::broadcast;

/// A message sent from the server to WebSocket clients.
///
/// Discriminated on the `type` field when serialized to JSON.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Full workspace snapshot (on connect and after a client lags).
    Snapshot { data: serde_json::Value },
    BlockAdded { block: PromptBlock, revision: u64 },
    BlockUpdated { block: PromptBlock, revision: u64 },
    BlockDeleted {
        id: String,
        blocks: Vec<PromptBlock>,
        revision: u64,
    },
    /// A block was dragged to a new position.
    Reordered {
        dragged_id: String,
        blocks: Vec<PromptBlock>,
        revision: u64,
    },
    /// The whole collection was replaced (import, template, suggestion,
    /// clear).
    Replaced {
        reason: ReplaceReason,
        blocks: Vec<PromptBlock>,
        revision: u64,
    },
    /// A reorder analysis finished.
    Suggestions {
        suggestions: Vec<ReorderSuggestion>,
        revision: u64,
    },
    /// Language or development time changed.
    Settings {
        language: Language,
        development_time: u32,
    },
}

impl WsMessage {
    /// Wire form of a store event.
    pub fn from_event(event: &StoreEvent<'_>) -> Self {
        match event {
            StoreEvent::Added { block, revision } => Self::BlockAdded {
                block: (*block).clone(),
                revision: *revision,
            },
            StoreEvent::Updated { block, revision } => Self::BlockUpdated {
                block: (*block).clone(),
                revision: *revision,
            },
            StoreEvent::Deleted {
                id,
                remaining,
                revision,
            } => Self::BlockDeleted {
                id: id.to_string(),
                blocks: remaining.to_vec(),
                revision: *revision,
            },
            StoreEvent::Reordered {
                dragged_id,
                blocks,
                revision,
            } => Self::Reordered {
                dragged_id: dragged_id.to_string(),
                blocks: blocks.to_vec(),
                revision: *revision,
            },
            StoreEvent::Replaced {
                reason,
                blocks,
                revision,
            } => Self::Replaced {
                reason: *reason,
                blocks: blocks.to_vec(),
                revision: *revision,
            },
        }
    }
}

/// Store observer that broadcasts events to WebSocket clients.
///
/// Compose alongside [`LoggingObserver`](ain_rs::compose::LoggingObserver)
/// in a [`CompositeObserver`](ain_rs::compose::CompositeObserver):
///
/// ```ignore
/// let observer = CompositeObserver::new()
///     .with(LoggingObserver)
///     .with(WebBroadcastObserver::new(ws_tx.clone()));
/// ```
pub struct WebBroadcastObserver {
    sender: broadcast::Sender<WsMessage>,
}

impl WebBroadcastObserver {
    pub fn new(sender: broadcast::Sender<WsMessage>) -> Self {
        Self { sender }
    }
}

impl StoreObserver for WebBroadcastObserver {
    fn on_event(&self, event: &StoreEvent<'_>) {
        // No subscribers is fine.
        let _ = self.sender.send(WsMessage::from_event(event));
    }
}
