use crate::adapter::{require_data_uri, ProviderAdapter, ProviderRequest};
use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use shared::agent_api::{Content, ContentPart, Turn};
use shared::settings::{ProviderConfig, ProviderId};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: AnthropicContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum AnthropicContent {
    Text(String),
    Blocks(Vec<AnthropicBlock>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicBlock {
    Text { text: String },
    Image { source: AnthropicImageSource },
}

#[derive(Debug, Serialize)]
struct AnthropicImageSource {
    #[serde(rename = "type")]
    source_type: &'static str,
    media_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponseBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

/// Messages API. Key in `x-api-key`, images as base64 `source` blocks.
pub struct AnthropicAdapter;

impl AnthropicAdapter {
    fn to_message(turn: &Turn) -> Result<AnthropicMessage, GatewayError> {
        let content = match &turn.content {
            Content::Text(text) => AnthropicContent::Text(text.clone()),
            Content::Parts(parts) => {
                let mut blocks = Vec::with_capacity(parts.len());
                for part in parts {
                    blocks.push(match part {
                        ContentPart::Text { text } => AnthropicBlock::Text { text: text.clone() },
                        ContentPart::ImageUrl { image_url } => {
                            let image = require_data_uri(ProviderId::Anthropic, &image_url.url)?;
                            AnthropicBlock::Image {
                                source: AnthropicImageSource {
                                    source_type: "base64",
                                    media_type: image.mime_type.to_string(),
                                    data: image.data.to_string(),
                                },
                            }
                        }
                    });
                }
                AnthropicContent::Blocks(blocks)
            }
        };
        Ok(AnthropicMessage {
            role: turn.role.as_str(),
            content,
        })
    }
}

impl ProviderAdapter for AnthropicAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Anthropic
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
        let messages = turns
            .iter()
            .map(Self::to_message)
            .collect::<Result<Vec<_>, _>>()?;
        let req = AnthropicRequest {
            model: &config.model,
            max_tokens: MAX_TOKENS,
            messages,
        };
        let body = serde_json::to_value(&req)
            .map_err(|e| GatewayError::unsupported(ProviderId::Anthropic, e.to_string()))?;
        Ok(
            ProviderRequest::post(format!("{}/v1/messages", self.base_url(config)), body)
                .header("x-api-key", config.api_key.as_str())
                .header("anthropic-version", API_VERSION),
        )
    }

    fn parse_response(&self, body: &str) -> Result<String, GatewayError> {
        let resp: AnthropicResponse = serde_json::from_str(body)
            .map_err(|e| GatewayError::malformed(ProviderId::Anthropic, e))?;
        let texts: Vec<String> = resp
            .content
            .into_iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text)
            .collect();
        if texts.is_empty() {
            return Err(GatewayError::malformed(
                ProviderId::Anthropic,
                "no text block in content",
            ));
        }
        Ok(texts.concat())
    }
}
