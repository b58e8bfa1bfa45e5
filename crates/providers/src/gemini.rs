use crate::adapter::{require_data_uri, ProviderAdapter, ProviderRequest};
use crate::error::{classify_status, truncate_detail, GatewayError};
use serde::{Deserialize, Serialize};
use shared::agent_api::{Content, ContentPart, Role, Turn};
use shared::settings::{ProviderConfig, ProviderId};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// generateContent API. Key goes in the query string; roles are user/model.
pub struct GeminiAdapter;

impl GeminiAdapter {
    fn role(role: Role) -> &'static str {
        match role {
            Role::User => "user",
            Role::Assistant => "model",
        }
    }

    fn to_content(turn: &Turn) -> Result<GeminiContent, GatewayError> {
        let parts = match &turn.content {
            Content::Text(text) => vec![GeminiPart::Text { text: text.clone() }],
            Content::Parts(parts) => parts
                .iter()
                .map(|part| match part {
                    ContentPart::Text { text } => Ok(GeminiPart::Text { text: text.clone() }),
                    ContentPart::ImageUrl { image_url } => {
                        let image = require_data_uri(ProviderId::Gemini, &image_url.url)?;
                        Ok(GeminiPart::InlineData {
                            inline_data: GeminiInlineData {
                                mime_type: image.mime_type.to_string(),
                                data: image.data.to_string(),
                            },
                        })
                    }
                })
                .collect::<Result<Vec<_>, GatewayError>>()?,
        };
        Ok(GeminiContent {
            role: Self::role(turn.role),
            parts,
        })
    }
}

impl ProviderAdapter for GeminiAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Gemini
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
        let contents = turns
            .iter()
            .map(Self::to_content)
            .collect::<Result<Vec<_>, _>>()?;
        let body = serde_json::to_value(GeminiRequest { contents })
            .map_err(|e| GatewayError::unsupported(ProviderId::Gemini, e.to_string()))?;
        // Model ids are sometimes copied with their resource prefix.
        let model = config.model.trim_start_matches("models/");
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url(config),
            model
        );
        Ok(ProviderRequest::post(url, body).query("key", config.api_key.as_str()))
    }

    fn parse_response(&self, body: &str) -> Result<String, GatewayError> {
        let resp: GeminiResponse = serde_json::from_str(body)
            .map_err(|e| GatewayError::malformed(ProviderId::Gemini, e))?;
        let texts: Vec<String> = resp
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if !texts.is_empty() {
            return Ok(texts.concat());
        }
        match resp.prompt_feedback.and_then(|f| f.block_reason) {
            Some(reason) => Err(GatewayError::Upstream {
                provider: ProviderId::Gemini,
                status: None,
                detail: format!("prompt blocked: {}", reason),
            }),
            None => Err(GatewayError::malformed(
                ProviderId::Gemini,
                "no text in first candidate",
            )),
        }
    }

    /// Gemini reports a bad key as 400 INVALID_ARGUMENT.
    fn classify_error(&self, status: u16, body: &str) -> GatewayError {
        if status == 400 && (body.contains("API_KEY_INVALID") || body.contains("API key not valid"))
        {
            return GatewayError::Credential {
                provider: ProviderId::Gemini,
                status: Some(status),
                detail: truncate_detail(body),
            };
        }
        classify_status(ProviderId::Gemini, status, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn config() -> ProviderConfig {
        ProviderConfig::new(ProviderId::Gemini, "g-key", "gemini-1.5-flash")
    }

    #[test]
    fn test_assistant_is_renamed_model() {
        let turns = vec![Turn::user("hi"), Turn::assistant("hello")];
        let req = GeminiAdapter.build_request(&config(), &turns).unwrap();
        assert_eq!(req.body["contents"][1]["role"], "model");
        assert_eq!(req.body["contents"][1]["parts"][0]["text"], "hello");
    }

    #[test]
    fn test_image_becomes_inline_data() {
        let turns = vec![Turn::user_with_image("what", "data:image/png;base64,QUJD")];
        let req = GeminiAdapter.build_request(&config(), &turns).unwrap();
        assert_eq!(
            req.body["contents"][0]["parts"],
            serde_json::json!([
                {"text": "what"},
                {"inline_data": {"mime_type": "image/png", "data": "QUJD"}}
            ])
        );
    }

    #[test]
    fn test_key_in_query_and_prefix_stripped() {
        let cfg = ProviderConfig::new(ProviderId::Gemini, "g-key", "models/gemini-1.5-pro");
        let req = GeminiAdapter.build_request(&cfg, &[Turn::user("x")]).unwrap();
        assert_eq!(
            req.url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro:generateContent"
        );
        assert_eq!(req.query_value("key"), Some("g-key"));
        assert!(req.headers.is_empty());
    }

    #[test]
    fn test_parse_concatenates_parts() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"4"},{"text":"!"}]},"finishReason":"STOP"}]}"#;
        assert_eq!(GeminiAdapter.parse_response(body).unwrap(), "4!");
    }

    #[test]
    fn test_blocked_prompt_is_upstream_error() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let err = GeminiAdapter.parse_response(body).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_invalid_key_400_is_credential() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(GeminiAdapter.classify_error(400, body).kind(), ErrorKind::Credential);
        assert_eq!(
            GeminiAdapter.classify_error(400, r#"{"error":{"message":"bad request"}}"#).kind(),
            ErrorKind::Upstream
        );
    }
}
