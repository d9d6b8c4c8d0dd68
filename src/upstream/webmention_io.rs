//! webmention.io client.
//!
//! See: <https://github.com/aaronpk/webmention.io#api>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CACHE_CONTROL;

use super::{MentionSource, feed};
use crate::config::MentionsConfig;
use crate::types::Mention;
use crate::{HuginnError, Result};

/// Client for the webmention.io JF2 mentions API.
#[derive(Clone)]
pub struct WebmentionIoClient {
    http: Client,
    endpoint: String,
    token: String,
    per_page: String,
    timeout: Duration,
}

impl WebmentionIoClient {
    /// Build a client from the endpoint, token, page size and timeout in `config`.
    ///
    /// A missing token is not an error here: the aggregator refuses to call
    /// the source until a usable token is configured.
    pub fn new(config: &MentionsConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| HuginnError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            token: config.credential().unwrap_or_default().to_string(),
            per_page: config.per_page.to_string(),
            timeout: config.request_timeout,
        })
    }

    fn map_send_error(&self, err: reqwest::Error) -> HuginnError {
        if err.is_timeout() {
            HuginnError::Timeout(self.timeout)
        } else {
            err.into()
        }
    }
}

#[async_trait]
impl MentionSource for WebmentionIoClient {
    fn name(&self) -> &str {
        "webmention.io"
    }

    async fn fetch(&self, target: &str) -> Result<Vec<Mention>> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("target", target),
                ("token", self.token.as_str()),
                ("per-page", self.per_page.as_str()),
            ])
            .header(CACHE_CONTROL, "max-age=300")
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HuginnError::Api {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        feed::parse_feed(&body)
    }
}
