//! One send: build the provider request, make a single HTTP attempt, map the
//! answer. No retries; callers own retry policy.

use crate::adapter::{adapter_for, reject_images};
use crate::error::GatewayError;
use reqwest::Client;
use shared::agent_api::Turn;
use shared::settings::ProviderConfig;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

static SHARED_HTTP: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .pool_max_idle_per_host(2)
        .build()
        .unwrap_or_else(|_| Client::new())
});

/// Stateless front door to every provider. Clones share one connection pool.
#[derive(Clone)]
pub struct Gateway {
    http: Client,
    timeout: Duration,
}

impl Default for Gateway {
    fn default() -> Self {
        Self::new()
    }
}

impl Gateway {
    pub fn new() -> Self {
        Self {
            http: SHARED_HTTP.clone(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Upper bound for the whole exchange, connect through last body byte.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send the full history and return the reply text.
    pub async fn send(&self, config: &ProviderConfig, turns: &[Turn]) -> Result<String, GatewayError> {
        let provider = config.provider;
        let adapter = adapter_for(provider);

        if config.api_key.trim().is_empty() {
            return Err(GatewayError::Credential {
                provider,
                status: None,
                detail: format!(
                    "no API key configured (set {} or {})",
                    provider.api_key_setting(),
                    provider.api_key_env()
                ),
            });
        }

        if !adapter.supports_images() {
            reject_images(provider, turns)?;
        }
        let request = adapter.build_request(config, turns)?;
        debug!(
            provider = %provider,
            model = %config.model,
            turns = turns.len(),
            url = %request.url,
            "sending chat request"
        );

        let mut builder = self
            .http
            .post(&request.url)
            .timeout(self.timeout)
            .json(&request.body);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| GatewayError::transport(provider, e))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| GatewayError::transport(provider, e))?;

        if !status.is_success() {
            let err = adapter.classify_error(status.as_u16(), &body);
            warn!(provider = %provider, status = status.as_u16(), "chat request failed");
            return Err(err);
        }

        let reply = adapter.parse_response(&body)?;
        debug!(provider = %provider, chars = reply.chars().count(), "received reply");
        Ok(reply)
    }
}
