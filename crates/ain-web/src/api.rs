//! REST API endpoint handlers.
//!
//! Block mutations are broadcast by the store observer; handlers only
//! broadcast what the store does not see (analysis results, settings).

use std::sync::Arc;

use ain_rs::AinError;
use ain_rs::Language;
use ain_rs::analysis::{QualityAnalysis, SuggestionKind};
use ain_rs::compose::{self, PromptBlock};
use ain_rs::export::{BLOCKS_FILENAME, JSON_MIME};
use ain_rs::templates::{self, PromptTemplate, TemplateCategory};
use ain_rs::voice::Recording;
use ain_rs::workspace::Workspace;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, warn};

use crate::broadcast::WsMessage;
use crate::snapshot::WorkspaceSnapshot;

/// Shared application state passed to all handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub workspace: Arc<Mutex<Workspace>>,
    pub broadcast_tx: broadcast::Sender<WsMessage>,
}

/// Library error mapped onto an HTTP status with a `{"error": ...}` body.
pub struct ApiError(AinError);

impl From<AinError> for ApiError {
    fn from(err: AinError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AinError::UnknownBlock(_)
            | AinError::UnknownTemplate(_)
            | AinError::UnknownSuggestion(_) => StatusCode::NOT_FOUND,
            AinError::StaleSuggestion { .. } => StatusCode::CONFLICT,
            AinError::Import(_) => StatusCode::BAD_REQUEST,
            AinError::Transcription(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        debug!("API error ({status}): {}", self.0);
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// GET /api/state: full workspace snapshot.
pub async fn get_state(State(app): State<AppState>) -> Json<serde_json::Value> {
    let ws = app.workspace.lock().await;
    Json(WorkspaceSnapshot::from_workspace(&ws).to_json())
}

// ── Blocks ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ContentRequest {
    pub content: String,
}

/// POST /api/blocks: append a text block.
///
/// Returns 201 with the block, or 400 if the content is blank.
pub async fn post_block(
    State(app): State<AppState>,
    Json(body): Json<ContentRequest>,
) -> Response {
    let mut ws = app.workspace.lock().await;
    match ws.add_text(&body.content) {
        Some(block) => (StatusCode::CREATED, Json(block)).into_response(),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "content is blank" })),
        )
            .into_response(),
    }
}

/// PUT /api/blocks/{id}: replace a block's content.
pub async fn put_block(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ContentRequest>,
) -> ApiResult<Json<PromptBlock>> {
    let mut ws = app.workspace.lock().await;
    if !ws.edit(&id, &body.content) {
        return Err(AinError::UnknownBlock(id).into());
    }
    ws.store()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AinError::UnknownBlock(id).into())
}

/// DELETE /api/blocks/{id}. Returns 204, or 404 for an unknown id.
pub async fn delete_block(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let mut ws = app.workspace.lock().await;
    if ws.delete(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AinError::UnknownBlock(id).into())
    }
}

/// DELETE /api/blocks: remove every block.
pub async fn clear_blocks(State(app): State<AppState>) -> StatusCode {
    app.workspace.lock().await.clear();
    StatusCode::NO_CONTENT
}

#[derive(Deserialize)]
pub struct ReorderRequest {
    pub dragged_id: String,
    pub target_id: String,
}

/// POST /api/blocks/reorder: drop one block onto another.
///
/// Returns the reordered blocks. Dropping a block onto itself is a no-op.
pub async fn post_reorder(
    State(app): State<AppState>,
    Json(body): Json<ReorderRequest>,
) -> ApiResult<Json<Vec<PromptBlock>>> {
    let mut ws = app.workspace.lock().await;
    if body.dragged_id != body.target_id && !ws.move_block(&body.dragged_id, &body.target_id) {
        let missing = if ws.store().get(&body.dragged_id).is_none() {
            body.dragged_id
        } else {
            body.target_id
        };
        return Err(AinError::UnknownBlock(missing).into());
    }
    Ok(Json(ws.blocks().to_vec()))
}

/// POST /api/blocks/import: replace all blocks with a JSON array.
///
/// The body is the raw exported JSON. A malformed body is a 400 and leaves
/// the blocks untouched.
pub async fn post_import(
    State(app): State<AppState>,
    body: String,
) -> ApiResult<Json<serde_json::Value>> {
    let mut ws = app.workspace.lock().await;
    let imported = ws.import_json(&body)?;
    Ok(Json(json!({ "imported": imported, "revision": ws.revision() })))
}

/// GET /api/blocks/export: the blocks as a `prompt-blocks.json` download.
pub async fn get_export(State(app): State<AppState>) -> ApiResult<Response> {
    let json = app.workspace.lock().await.export_json()?;
    Ok((
        [
            (header::CONTENT_TYPE, JSON_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{BLOCKS_FILENAME}\""),
            ),
        ],
        json,
    )
        .into_response())
}

// ── Voice ──────────────────────────────────────────────────────────

/// POST /api/voice: transcribe an uploaded audio file into a voice block.
///
/// The body is the raw audio; its `Content-Type` must be `audio/*`
/// (415 otherwise).
pub async fn post_voice(
    State(app): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let recording = Recording::uploaded(body.to_vec(), mime_type);
    if !recording.is_audio() {
        return Ok(StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response());
    }

    let mut ws = app.workspace.lock().await;
    match ws.upload_audio(recording).await? {
        Some(block) => Ok((StatusCode::CREATED, Json(block)).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

// ── Analysis ───────────────────────────────────────────────────────

/// GET /api/quality: the four-metric analysis.
pub async fn get_quality(State(app): State<AppState>) -> Json<QualityAnalysis> {
    Json(app.workspace.lock().await.quality_analysis())
}

/// POST /api/suggestions: run a reorder analysis.
///
/// The workspace is locked only to take the snapshot and to store the
/// result; the simulated delay runs unlocked so edits can continue. Results
/// made stale by those edits are dropped by the workspace.
pub async fn post_suggestions(State(app): State<AppState>) -> Json<serde_json::Value> {
    let pending = app.workspace.lock().await.begin_analysis();
    let analyzed_at = pending.revision();
    let suggestions = pending.run().await;

    let mut ws = app.workspace.lock().await;
    let kept = ws.complete_analysis(suggestions);
    if kept == 0 && analyzed_at != ws.revision() {
        debug!(
            "Reorder analysis of revision {analyzed_at} outdated by revision {}",
            ws.revision()
        );
    }
    let suggestions = ws.suggestions().to_vec();
    let revision = ws.revision();
    drop(ws);

    let _ = app.broadcast_tx.send(WsMessage::Suggestions {
        suggestions: suggestions.clone(),
        revision,
    });
    Json(json!({ "revision": revision, "suggestions": suggestions }))
}

/// DELETE /api/suggestions: abandon a running reorder analysis.
///
/// Returns the composer state afterwards.
pub async fn cancel_suggestions(State(app): State<AppState>) -> Json<serde_json::Value> {
    let mut ws = app.workspace.lock().await;
    ws.cancel_analysis();
    Json(json!({ "state": ws.state(), "revision": ws.revision() }))
}

#[derive(Deserialize)]
pub struct ApplyRequest {
    pub kind: SuggestionKind,
}

/// POST /api/suggestions/apply: apply a pending suggestion.
///
/// 404 if no such suggestion is pending, 409 if it is stale.
pub async fn post_apply(
    State(app): State<AppState>,
    Json(body): Json<ApplyRequest>,
) -> ApiResult<Json<Vec<PromptBlock>>> {
    let mut ws = app.workspace.lock().await;
    ws.apply_suggestion(body.kind)?;
    Ok(Json(ws.blocks().to_vec()))
}

// ── Prompt text ────────────────────────────────────────────────────

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    #[default]
    Plain,
    Compressed,
    Enhanced,
    /// The plain prompt cut down for display.
    Preview,
}

#[derive(Deserialize)]
pub struct PromptQuery {
    #[serde(default)]
    pub mode: PromptMode,
}

/// GET /api/prompt?mode=plain|compressed|enhanced|preview
pub async fn get_prompt(
    State(app): State<AppState>,
    Query(query): Query<PromptQuery>,
) -> Json<serde_json::Value> {
    let prompt = match query.mode {
        PromptMode::Plain => app.workspace.lock().await.assembled_prompt(),
        PromptMode::Enhanced => app.workspace.lock().await.enhanced_prompt(),
        PromptMode::Preview => {
            compose::truncate_preview(&app.workspace.lock().await.assembled_prompt())
        }
        PromptMode::Compressed => {
            let (blocks, delay) = {
                let ws = app.workspace.lock().await;
                (ws.blocks().to_vec(), ws.config().compression_delay)
            };
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            compose::compress(&blocks)
        }
    };
    Json(json!({
        "mode": query.mode,
        "chars": prompt.chars().count(),
        "prompt": prompt,
    }))
}

// ── Templates ──────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct TemplateQuery {
    pub search: Option<String>,
    pub category: Option<TemplateCategory>,
}

/// GET /api/templates?search=..&category=..
pub async fn get_templates(
    State(app): State<AppState>,
    Query(query): Query<TemplateQuery>,
) -> Json<Vec<PromptTemplate>> {
    let (language, months) = {
        let ws = app.workspace.lock().await;
        (ws.language(), ws.development_time())
    };
    let library = templates::template_library(language, months);
    let found = templates::search_templates(
        &library,
        query.search.as_deref().unwrap_or(""),
        query.category,
    );
    Json(found.into_iter().cloned().collect())
}

/// POST /api/templates/{id}: replace all blocks with a template.
pub async fn post_template(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let mut ws = app.workspace.lock().await;
    let template = ws.load_template(&id)?;
    Ok(Json(json!({ "template": template, "blocks": ws.blocks() })))
}

// ── Settings ───────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SettingsRequest {
    pub language: Option<Language>,
    pub development_time: Option<u32>,
}

/// PUT /api/settings: change language and/or development time.
pub async fn put_settings(
    State(app): State<AppState>,
    Json(body): Json<SettingsRequest>,
) -> Json<serde_json::Value> {
    let mut ws = app.workspace.lock().await;
    if let Some(language) = body.language {
        ws.set_language(language);
    }
    if let Some(months) = body.development_time {
        ws.set_development_time(months);
    }
    let msg = WsMessage::Settings {
        language: ws.language(),
        development_time: ws.development_time(),
    };
    if app.broadcast_tx.send(msg).is_err() {
        warn!("Settings changed with no WebSocket subscribers");
    }
    Json(WorkspaceSnapshot::from_workspace(&ws).to_json())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reorder_request_deserializes() {
        let json = r#"{"dragged_id":"a","target_id":"b"}"#;
        let req: ReorderRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.dragged_id, "a");
        assert_eq!(req.target_id, "b");
    }

    #[test]
    fn apply_request_uses_kebab_ids() {
        let req: ApplyRequest = serde_json::from_str(r#"{"kind":"logical-flow"}"#).unwrap();
        assert_eq!(req.kind, SuggestionKind::LogicalFlow);
    }

    #[test]
    fn prompt_mode_defaults_to_plain() {
        let q: PromptQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.mode, PromptMode::Plain);
        let q: PromptQuery = serde_json::from_str(r#"{"mode":"enhanced"}"#).unwrap();
        assert_eq!(q.mode, PromptMode::Enhanced);
    }

    #[test]
    fn errors_map_to_statuses() {
        let status = |e: AinError| ApiError(e).into_response().status();
        assert_eq!(status(AinError::UnknownBlock("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status(AinError::StaleSuggestion {
                expected: 1,
                actual: 2
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(AinError::Settings("bad".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
