//! Prompt composition toolkit for drafting AI-assisted project proposals.
//!
//! `ain-rs` keeps an ordered collection of prompt blocks, scores it with
//! deterministic heuristics, proposes better block orderings, assembles the
//! final prompt and sends it to a remote proposal-generation API.
//!
//! # Getting started
//!
//! ```ignore
//! use ain_rs::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> ain_rs::Result<()> {
//!     let config = ComposerConfig::from_env();
//!     let mut workspace = Workspace::open(config.clone())?;
//!
//!     workspace.add_text("Background: clinics schedule visits by phone");
//!     workspace.add_text("We need online booking and reminders");
//!
//!     let report = workspace.quality_score();
//!     println!("quality: {}/100", report.score);
//!
//!     let client = ProposalClient::from_config(&config)?;
//!     let prompt = workspace.enhanced_prompt();
//!     let reply = client.execute_custom_prompt(&prompt, workspace.language()).await?;
//!     println!("{}", reply.suggestion);
//!     Ok(())
//! }
//! ```
//!
//! # Where to find things
//!
//! - **Blocks and ordering:** [`compose::BlockStore`] keeps priorities dense
//!   after every mutation and notifies a [`compose::StoreObserver`].
//! - **Prompt text:** [`compose::assemble`], [`compose::compress`] and
//!   [`compose::enhance_prompt`].
//! - **Analysis:** [`analysis::QualityScorer`] and
//!   [`analysis::ReorderAdvisor`] with their keyword implementations.
//! - **The whole composer:** [`workspace::Workspace`] ties the store, the
//!   analyses, persistence and voice input together.
//! - **Templates:** [`templates::template_library`].
//! - **Persistence:** [`persist::LocalStore`] and [`persist::AppSettings`].
//! - **Files:** [`export`] for JSON and markdown, [`proposal`] for splitting
//!   proposal text.
//! - **Remote API:** [`ProposalClient`].

pub mod analysis;
pub mod compose;
pub mod config;
pub mod error;
pub mod export;
pub mod language;
pub mod persist;
pub mod prelude;
pub mod proposal;
pub mod templates;
pub mod voice;
pub mod workspace;

pub use error::{AinError, Result};
pub use language::Language;

use config::ComposerConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, trace, warn};

// ── Wire types ─────────────────────────────────────────────────────

/// Project description sent to the proposal endpoints.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct UserPayload {
    pub purpose: String,
    pub project_type: String,
    pub budget: i64,
    pub experience_level: String,
    pub weekly_hours: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub development_time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
}

/// Response of the single-text endpoints.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
    pub suggestion: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RefinementRequest {
    pub user_payload: UserPayload,
    pub current_proposal: String,
    pub refinement_request: String,
}

/// How the backend treated a refinement request.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RefinementKind {
    /// A direct answer; the proposal is unchanged.
    Answer,
    /// A revised proposal.
    Proposal,
    /// The request was declined.
    Rejection,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct RefinementResponse {
    #[serde(rename = "type")]
    pub kind: RefinementKind,
    pub content: String,
}

// Either `{type, content}` or a plain `{suggestion}`.
#[derive(Deserialize)]
struct RawRefinementResponse {
    #[serde(rename = "type")]
    kind: Option<RefinementKind>,
    content: Option<String>,
    suggestion: Option<String>,
}

impl TryFrom<RawRefinementResponse> for RefinementResponse {
    type Error = AinError;

    fn try_from(raw: RawRefinementResponse) -> Result<Self> {
        match (raw.content, raw.suggestion) {
            (Some(content), _) => Ok(Self {
                kind: raw.kind.unwrap_or(RefinementKind::Proposal),
                content,
            }),
            (None, Some(suggestion)) => Ok(Self {
                kind: raw.kind.unwrap_or(RefinementKind::Proposal),
                content: suggestion,
            }),
            (None, None) => Err(AinError::Decode(
                "refinement response has neither 'content' nor 'suggestion'".into(),
            )),
        }
    }
}

#[derive(Serialize, Debug)]
struct CustomPromptRequest<'a> {
    prompt: &'a str,
    language: Language,
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for the proposal-generation API.
///
/// No retries. A non-2xx response becomes [`AinError::Http`]. When a request
/// fails at the transport level the client probes `GET /`; if the probe
/// fails too the error is [`AinError::Unreachable`].
#[derive(Debug, Clone)]
pub struct ProposalClient {
    client: reqwest::Client,
    base_url: String,
}

impl ProposalClient {
    /// Client for `base_url` with no request timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::build(base_url.into(), None)
    }

    /// Client using the configured base URL and timeout.
    pub fn from_config(config: &ComposerConfig) -> Result<Self> {
        Self::build(config.api_base_url.clone(), config.request_timeout)
    }

    fn build(base_url: String, timeout: Option<std::time::Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent("ain-rs/0.1");
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AinError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether `GET /` answers with a 2xx status.
    pub async fn health(&self) -> bool {
        match self.client.get(format!("{}/", self.base_url)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!("Backend health check failed: {e}");
                false
            }
        }
    }

    /// `POST /analyze_purpose/`: short analysis of the project purpose.
    pub async fn analyze_purpose(&self, payload: &UserPayload) -> Result<ApiResponse> {
        self.post("/analyze_purpose/", payload).await
    }

    /// `POST /generate_full_proposal/`: the complete proposal text.
    pub async fn generate_full_proposal(&self, payload: &UserPayload) -> Result<ApiResponse> {
        self.post("/generate_full_proposal/", payload).await
    }

    /// `POST /refine_proposal/`.
    pub async fn refine_proposal(&self, request: &RefinementRequest) -> Result<RefinementResponse> {
        let raw: RawRefinementResponse = self.post("/refine_proposal/", request).await?;
        raw.try_into()
    }

    /// `POST /execute_custom_prompt/`: run an assembled prompt as is.
    pub async fn execute_custom_prompt(
        &self,
        prompt: &str,
        language: Language,
    ) -> Result<ApiResponse> {
        let body = CustomPromptRequest { prompt, language };
        self.post("/execute_custom_prompt/", &body).await
    }

    /// `POST /generate_prompt/`: an optimized prompt from requirements.
    pub async fn generate_prompt(&self, payload: &UserPayload) -> Result<ApiResponse> {
        self.post("/generate_prompt/", payload).await
    }

    async fn post<B, T>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{endpoint}", self.base_url);
        debug!("API request: POST {endpoint}");
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(body).map_or(0, |s| s.len())
        );
        let start = Instant::now();

        let resp = match self.client.post(&url).json(body).send().await {
            Ok(resp) => resp,
            Err(e) => return Err(self.transport_error(endpoint, e).await),
        };

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| AinError::Request(format!("failed to read response: {e}")))?;
        debug!(
            "API response: HTTP {} from {endpoint} in {:.1}s ({} bytes)",
            status.as_u16(),
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            warn!("API error at {endpoint}: HTTP {status}");
            return Err(AinError::Http {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        serde_json::from_str(&text).map_err(|e| AinError::Decode(e.to_string()))
    }

    async fn transport_error(&self, endpoint: &str, err: reqwest::Error) -> AinError {
        warn!("API error at {endpoint}: {err}");
        if !err.is_timeout() && !self.health().await {
            return AinError::Unreachable {
                base_url: self.base_url.clone(),
            };
        }
        AinError::Request(err.to_string())
    }
}
