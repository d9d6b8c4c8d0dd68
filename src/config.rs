//! Aggregator configuration.
//!
//! [`MentionsConfig`] carries every policy constant the aggregator uses,
//! so tests can inject arbitrary durations and deployments can pick the
//! cooldown that suits them:
//!
//! ```rust
//! # use huginn::{Environment, MentionsConfig};
//! # use std::time::Duration;
//! let config = MentionsConfig::for_environment(Environment::Development)
//!     .token("my-webmention-io-token")
//!     .success_ttl(Duration::from_secs(120));
//! assert_eq!(config.failure_cooldown, Duration::from_secs(60));
//! assert!(config.has_credential());
//! ```

use std::fmt;
use std::time::Duration;

/// Default webmention.io JF2 endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://webmention.io/api/mentions.jf2";

/// Environment variable holding the webmention.io API token.
pub const TOKEN_ENV_VAR: &str = "WEBMENTION_IO_TOKEN";

/// Environment variable selecting the [`Environment`] (`development` | `production`).
pub const ENVIRONMENT_ENV_VAR: &str = "HUGINN_ENV";

/// Token values shipped in sample env files; treated as "not configured".
const PLACEHOLDER_TOKENS: &[&str] = &["", "updateme", "your_api_token_here"];

/// Deployment environment, which picks the failure cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Short cooldown for fast feedback while writing.
    Development,
    /// Five times longer cooldown to protect the upstream service.
    #[default]
    Production,
}

impl Environment {
    /// Parse an environment name. Unknown names return `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Environment::Development),
            "production" | "prod" => Some(Environment::Production),
            _ => None,
        }
    }

    /// Failure cooldown for this environment.
    pub fn failure_cooldown(self) -> Duration {
        match self {
            Environment::Development => Duration::from_secs(60),
            Environment::Production => Duration::from_secs(5 * 60),
        }
    }
}

/// Configuration for the mention [`Aggregator`](crate::Aggregator).
#[derive(Clone)]
pub struct MentionsConfig {
    /// Mentions endpoint. Default: webmention.io JF2 API.
    pub endpoint: String,
    /// API token. `None` or a placeholder disables fetching.
    pub token: Option<String>,
    /// Page-size cap sent upstream. Default: 1,000.
    pub per_page: u32,
    /// Hard bound on one upstream request. Default: 10s.
    pub request_timeout: Duration,
    /// How long a successful fetch stays fresh. Default: 5 minutes.
    pub success_ttl: Duration,
    /// Backoff after a failed fetch. Default: production cooldown (5 minutes).
    pub failure_cooldown: Duration,
    /// Window in which repeated log lines per key are dropped. Default: 60s.
    pub log_window: Duration,
}

impl Default for MentionsConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

impl fmt::Debug for MentionsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MentionsConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("per_page", &self.per_page)
            .field("request_timeout", &self.request_timeout)
            .field("success_ttl", &self.success_ttl)
            .field("failure_cooldown", &self.failure_cooldown)
            .field("log_window", &self.log_window)
            .finish()
    }
}

impl MentionsConfig {
    /// Create a config with production defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config whose failure cooldown matches `env`.
    pub fn for_environment(env: Environment) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: None,
            per_page: 1_000,
            request_timeout: Duration::from_secs(10),
            success_ttl: Duration::from_secs(5 * 60),
            failure_cooldown: env.failure_cooldown(),
            log_window: Duration::from_secs(60),
        }
    }

    /// Build a config from process environment variables.
    ///
    /// Reads [`TOKEN_ENV_VAR`] for the token and [`ENVIRONMENT_ENV_VAR`] for
    /// the environment (production when unset or unrecognised).
    pub fn from_env() -> Self {
        let env = std::env::var(ENVIRONMENT_ENV_VAR)
            .ok()
            .and_then(|name| Environment::parse(&name))
            .unwrap_or_default();
        let mut config = Self::for_environment(env);
        config.token = std::env::var(TOKEN_ENV_VAR).ok();
        config
    }

    /// Set the mentions endpoint (used to point at a mock server in tests).
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    /// Set the API token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the page-size cap.
    pub fn per_page(mut self, n: u32) -> Self {
        self.per_page = n;
        self
    }

    /// Set the upstream request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set how long successful results are cached.
    pub fn success_ttl(mut self, ttl: Duration) -> Self {
        self.success_ttl = ttl;
        self
    }

    /// Set the backoff applied after a failed fetch.
    pub fn failure_cooldown(mut self, cooldown: Duration) -> Self {
        self.failure_cooldown = cooldown;
        self
    }

    /// Set the log throttling window.
    pub fn log_window(mut self, window: Duration) -> Self {
        self.log_window = window;
        self
    }

    /// The trimmed token, if one is configured and is not a placeholder.
    pub fn credential(&self) -> Option<&str> {
        let token = self.token.as_deref()?.trim();
        (!PLACEHOLDER_TOKENS.contains(&token)).then_some(token)
    }

    /// Whether a usable token is configured.
    pub fn has_credential(&self) -> bool {
        self.credential().is_some()
    }
}
