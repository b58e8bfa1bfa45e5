use crate::adapter::{ProviderAdapter, ProviderRequest};
use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use shared::agent_api::{Content, Turn};
use shared::settings::{ProviderConfig, ProviderId};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

// ── Request types ────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatCompletionMessage<'a>>,
}

/// Our turn content already has the chat-completions shape: a string, or
/// `text` / `image_url` parts.
#[derive(Debug, Serialize)]
struct ChatCompletionMessage<'a> {
    role: &'static str,
    content: &'a Content,
}

// ── Response types ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

// ── Shared with OpenAI-compatible providers ──────────────────────────

pub(crate) fn chat_completions_body(
    provider: ProviderId,
    model: &str,
    turns: &[Turn],
) -> Result<serde_json::Value, GatewayError> {
    let req = ChatCompletionRequest {
        model,
        messages: turns
            .iter()
            .map(|t| ChatCompletionMessage {
                role: t.role.as_str(),
                content: &t.content,
            })
            .collect(),
    };
    serde_json::to_value(&req).map_err(|e| GatewayError::unsupported(provider, e.to_string()))
}

pub(crate) fn chat_completions_request(
    provider: ProviderId,
    base_url: &str,
    config: &ProviderConfig,
    turns: &[Turn],
) -> Result<ProviderRequest, GatewayError> {
    let body = chat_completions_body(provider, &config.model, turns)?;
    Ok(
        ProviderRequest::post(format!("{}/v1/chat/completions", base_url), body)
            .header("Authorization", format!("Bearer {}", config.api_key.as_str())),
    )
}

pub(crate) fn parse_chat_completion(provider: ProviderId, body: &str) -> Result<String, GatewayError> {
    let resp: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| GatewayError::malformed(provider, e))?;
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| GatewayError::malformed(provider, "no message content in choices"))
}

// ── Client ───────────────────────────────────────────────────────────

/// Chat Completions API with a bearer token.
pub struct OpenAIAdapter;

impl ProviderAdapter for OpenAIAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::OpenAI
    }

    fn default_base_url(&self) -> &'static str {
        DEFAULT_BASE_URL
    }

    fn supports_images(&self) -> bool {
        true
    }

    fn build_request(
        &self,
        config: &ProviderConfig,
        turns: &[Turn],
    ) -> Result<ProviderRequest, GatewayError> {
        chat_completions_request(ProviderId::OpenAI, &self.base_url(config), config, turns)
    }

    fn parse_response(&self, body: &str) -> Result<String, GatewayError> {
        parse_chat_completion(ProviderId::OpenAI, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_image_parts_pass_through() {
        let cfg = ProviderConfig::new(ProviderId::OpenAI, "sk", "gpt-4o");
        let turns = vec![Turn::user_with_image("see", "data:image/png;base64,AAAA")];
        let req = OpenAIAdapter.build_request(&cfg, &turns).unwrap();
        assert_eq!(
            req.body["messages"][0]["content"][1],
            serde_json::json!({"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}})
        );
        assert_eq!(req.header_value("authorization"), Some("Bearer sk"));
    }

    #[test]
    fn test_parse_first_choice() {
        let body = r#"{"id":"c","choices":[{"index":0,"message":{"role":"assistant","content":"4"},"finish_reason":"stop"}]}"#;
        assert_eq!(OpenAIAdapter.parse_response(body).unwrap(), "4");
    }

    #[test]
    fn test_parse_missing_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert_eq!(
            OpenAIAdapter.parse_response(body).unwrap_err().kind(),
            ErrorKind::Upstream
        );
        assert_eq!(
            OpenAIAdapter.parse_response(r#"{"choices":[]}"#).unwrap_err().kind(),
            ErrorKind::Upstream
        );
    }
}
