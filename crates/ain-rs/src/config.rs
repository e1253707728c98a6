//! Configuration for a composer [`Workspace`](crate::workspace::Workspace)
//! and the [`ProposalClient`](crate::ProposalClient).
//!
//! Defaults match the local development setup. Override through struct
//! fields, the `with_*` builder methods, or environment variables:
//!
//! ```ignore
//! let config = ComposerConfig::from_env()
//!     .with_state_dir("/tmp/ain")
//!     .with_analysis_delay(Duration::ZERO);
//! ```

use crate::language::Language;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Proposal API used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Environment variable overriding the proposal API base URL.
pub const API_URL_ENV: &str = "AIN_API_URL";

/// Environment variable overriding the state directory.
pub const STATE_DIR_ENV: &str = "AIN_STATE_DIR";

/// Default state directory, relative to the working directory.
pub const DEFAULT_STATE_DIR: &str = ".ain";

/// Simulated latency of reorder analysis.
pub const DEFAULT_ANALYSIS_DELAY: Duration = Duration::from_millis(1500);

/// Simulated latency of prompt compression.
pub const DEFAULT_COMPRESSION_DELAY: Duration = Duration::from_millis(2000);

/// What happens to reorder suggestions when the blocks change before they
/// are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StalenessPolicy {
    /// Any mutation discards pending suggestions; applying one computed at
    /// an older revision fails.
    #[default]
    Invalidate,
    /// Suggestions are applied as computed, even against newer blocks.
    SnapshotAndIgnore,
}

#[derive(Debug, Clone)]
pub struct ComposerConfig {
    /// Base URL of the proposal API, without a trailing slash.
    pub api_base_url: String,
    /// Directory holding the persisted language and settings documents.
    pub state_dir: PathBuf,
    pub analysis_delay: Duration,
    pub compression_delay: Duration,
    /// Language used until one is persisted.
    pub default_language: Language,
    pub staleness: StalenessPolicy,
    /// HTTP request timeout. `None` leaves requests unbounded.
    pub request_timeout: Option<Duration>,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            analysis_delay: DEFAULT_ANALYSIS_DELAY,
            compression_delay: DEFAULT_COMPRESSION_DELAY,
            default_language: Language::default(),
            staleness: StalenessPolicy::default(),
            request_timeout: None,
        }
    }
}

impl ComposerConfig {
    /// Defaults with `AIN_API_URL` and `AIN_STATE_DIR` applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(url) = non_empty_env(API_URL_ENV) {
            debug!("Using {API_URL_ENV}={url}");
            config = config.with_api_base_url(url);
        }
        if let Some(dir) = non_empty_env(STATE_DIR_ENV) {
            config.state_dir = PathBuf::from(dir);
        }
        config
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = dir.into();
        self
    }

    pub fn with_analysis_delay(mut self, delay: Duration) -> Self {
        self.analysis_delay = delay;
        self
    }

    pub fn with_compression_delay(mut self, delay: Duration) -> Self {
        self.compression_delay = delay;
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.default_language = language;
        self
    }

    pub fn with_staleness(mut self, policy: StalenessPolicy) -> Self {
        self.staleness = policy;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Zero simulated delays, for tests and scripted use.
    pub fn without_delays(self) -> Self {
        self.with_analysis_delay(Duration::ZERO)
            .with_compression_delay(Duration::ZERO)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_local_setup() {
        let config = ComposerConfig::default();
        assert_eq!(config.api_base_url, "http://127.0.0.1:8000");
        assert_eq!(config.analysis_delay, Duration::from_millis(1500));
        assert_eq!(config.compression_delay, Duration::from_millis(2000));
        assert_eq!(config.staleness, StalenessPolicy::Invalidate);
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        let config = ComposerConfig::default().with_api_base_url("https://api.example.com/");
        assert_eq!(config.api_base_url, "https://api.example.com");
    }

    #[test]
    fn without_delays_zeroes_both() {
        let config = ComposerConfig::default().without_delays();
        assert!(config.analysis_delay.is_zero());
        assert!(config.compression_delay.is_zero());
    }
}
