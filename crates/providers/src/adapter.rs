//! The per-provider strategy: how a turn history becomes an HTTP request and
//! how the provider's answer becomes reply text.

use crate::anthropic::AnthropicAdapter;
use crate::error::{classify_status, GatewayError};
use crate::gemini::GeminiAdapter;
use crate::openai::OpenAIAdapter;
use crate::openrouter::OpenRouterAdapter;
use shared::agent_api::Turn;
use shared::settings::{ProviderConfig, ProviderId};
use std::fmt;

/// A fully described outbound request, ready for the HTTP client.
pub struct ProviderRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub query: Vec<(&'static str, String)>,
    pub body: serde_json::Value,
}

impl ProviderRequest {
    pub fn post(url: String, body: serde_json::Value) -> Self {
        Self {
            url,
            headers: Vec::new(),
            query: Vec::new(),
            body,
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn query(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.query.push((name, value.into()));
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

// Header and query values carry credentials.
impl fmt::Debug for ProviderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |pairs: &[(&'static str, String)]| -> Vec<&'static str> {
            pairs.iter().map(|(n, _)| *n).collect()
        };
        f.debug_struct("ProviderRequest")
            .field("url", &self.url)
            .field("headers", &names(&self.headers))
            .field("query", &names(&self.query))
            .field("body", &self.body)
            .finish()
    }
}

pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> ProviderId;

    /// Origin (plus any fixed path prefix) used when the config has no override.
    fn default_base_url(&self) -> &'static str;

    fn supports_images(&self) -> bool;

    fn build_request(
        &self,
        config: &ProviderConfig,
        turns: &[Turn],
    ) -> Result<ProviderRequest, GatewayError>;

    /// Extract the reply text from a success body.
    fn parse_response(&self, body: &str) -> Result<String, GatewayError>;

    fn classify_error(&self, status: u16, body: &str) -> GatewayError {
        classify_status(self.provider(), status, body)
    }

    fn base_url(&self, config: &ProviderConfig) -> String {
        config
            .base_url
            .as_deref()
            .unwrap_or(self.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }
}

static ANTHROPIC: AnthropicAdapter = AnthropicAdapter;
static OPENAI: OpenAIAdapter = OpenAIAdapter;
static GEMINI: GeminiAdapter = GeminiAdapter;
static OPENROUTER: OpenRouterAdapter = OpenRouterAdapter;

pub fn adapter_for(provider: ProviderId) -> &'static dyn ProviderAdapter {
    match provider {
        ProviderId::Anthropic => &ANTHROPIC,
        ProviderId::OpenAI => &OPENAI,
        ProviderId::Gemini => &GEMINI,
        ProviderId::OpenRouter => &OPENROUTER,
    }
}

/// The two halves of a `data:<mime>;base64,<payload>` URI.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct DataUri<'a> {
    pub mime_type: &'a str,
    pub data: &'a str,
}

pub(crate) fn parse_data_uri(url: &str) -> Option<DataUri<'_>> {
    let rest = url.strip_prefix("data:")?;
    let (meta, data) = rest.split_once(',')?;
    let mime_type = meta.strip_suffix(";base64")?;
    if mime_type.is_empty() || data.is_empty() {
        return None;
    }
    Some(DataUri { mime_type, data })
}

/// Inline image bytes for providers that cannot fetch URLs themselves.
pub(crate) fn require_data_uri(provider: ProviderId, url: &str) -> Result<DataUri<'_>, GatewayError> {
    parse_data_uri(url).ok_or_else(|| {
        GatewayError::unsupported(provider, "images must be base64 data URIs")
    })
}

pub(crate) fn reject_images(provider: ProviderId, turns: &[Turn]) -> Result<(), GatewayError> {
    if turns.iter().any(|t| t.content.has_images()) {
        return Err(GatewayError::unsupported(
            provider,
            "image input is not supported; send text only or switch provider",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_data_uri() {
        assert_eq!(
            parse_data_uri("data:image/png;base64,iVBOR"),
            Some(DataUri {
                mime_type: "image/png",
                data: "iVBOR"
            })
        );
        assert_eq!(parse_data_uri("https://example.com/cat.png"), None);
        assert_eq!(parse_data_uri("data:image/png,raw"), None);
        assert_eq!(parse_data_uri("data:;base64,AAAA"), None);
        assert_eq!(parse_data_uri("data:image/png;base64,"), None);
    }

    #[test]
    fn test_every_provider_has_an_adapter() {
        for p in ProviderId::ALL {
            assert_eq!(adapter_for(p).provider(), p);
        }
    }

    #[test]
    fn test_base_url_override_is_trimmed() {
        let cfg = ProviderConfig::new(ProviderId::OpenAI, "k", "m")
            .with_base_url("http://localhost:8080/");
        assert_eq!(adapter_for(ProviderId::OpenAI).base_url(&cfg), "http://localhost:8080");

        let cfg = ProviderConfig::new(ProviderId::OpenAI, "k", "m");
        assert_eq!(
            adapter_for(ProviderId::OpenAI).base_url(&cfg),
            "https://api.openai.com"
        );
    }

    #[test]
    fn test_debug_hides_credentials() {
        let req = ProviderRequest::post("https://x".into(), serde_json::json!({}))
            .header("x-api-key", "secret")
            .query("key", "secret");
        let shown = format!("{:?}", req);
        assert!(!shown.contains("secret"));
        assert_eq!(req.header_value("X-API-KEY"), Some("secret"));
        assert_eq!(req.query_value("key"), Some("secret"));
    }

    fn golden(provider: ProviderId) -> serde_json::Value {
        let raw = match provider {
            ProviderId::Anthropic => include_str!("../testdata/anthropic_hello.json"),
            ProviderId::OpenAI => include_str!("../testdata/openai_hello.json"),
            ProviderId::Gemini => include_str!("../testdata/gemini_hello.json"),
            ProviderId::OpenRouter => include_str!("../testdata/openrouter_hello.json"),
        };
        serde_json::from_str(raw).expect("golden file is valid JSON")
    }

    fn hello_config(provider: ProviderId) -> ProviderConfig {
        ProviderConfig::new(provider, "test-key", provider.default_model())
    }

    #[test]
    fn test_hello_body_matches_golden_for_every_provider() {
        let turns = vec![Turn::user("hello")];
        for provider in ProviderId::ALL {
            let req = adapter_for(provider)
                .build_request(&hello_config(provider), &turns)
                .expect("text-only history builds");
            assert_eq!(req.body, golden(provider), "body mismatch for {}", provider);
        }
    }

    #[test]
    fn test_hello_endpoint_and_auth_per_provider() {
        let turns = vec![Turn::user("hello")];

        let req = adapter_for(ProviderId::Anthropic)
            .build_request(&hello_config(ProviderId::Anthropic), &turns)
            .unwrap();
        assert_eq!(req.url, "https://api.anthropic.com/v1/messages");
        assert_eq!(req.header_value("x-api-key"), Some("test-key"));
        assert_eq!(req.header_value("anthropic-version"), Some("2023-06-01"));
        assert_eq!(req.header_value("authorization"), None);

        let req = adapter_for(ProviderId::OpenAI)
            .build_request(&hello_config(ProviderId::OpenAI), &turns)
            .unwrap();
        assert_eq!(req.url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(req.header_value("authorization"), Some("Bearer test-key"));

        let req = adapter_for(ProviderId::Gemini)
            .build_request(&hello_config(ProviderId::Gemini), &turns)
            .unwrap();
        assert_eq!(
            req.url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert_eq!(req.query_value("key"), Some("test-key"));

        let req = adapter_for(ProviderId::OpenRouter)
            .build_request(&hello_config(ProviderId::OpenRouter), &turns)
            .unwrap();
        assert_eq!(req.url, "https://openrouter.ai/api/v1/chat/completions");
        assert_eq!(req.header_value("authorization"), Some("Bearer test-key"));
    }

    #[test]
    fn test_only_openrouter_is_text_only() {
        for provider in ProviderId::ALL {
            let expected = provider != ProviderId::OpenRouter;
            assert_eq!(adapter_for(provider).supports_images(), expected, "{}", provider);
        }
    }
}
