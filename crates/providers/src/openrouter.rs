use crate::adapter::{ProviderAdapter, ProviderRequest};
use crate::error::GatewayError;
use crate::openai::{chat_completions_request, parse_chat_completion};
use shared::agent_api::Turn;
use shared::settings::{ProviderConfig, ProviderId};

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api";
const APP_TITLE: &str = "Panel Assistant";

/// OpenAI-compatible routing service. Routed models differ in what they
/// accept, so it is declared text-only and the gateway refuses images.
pub struct OpenRouterAdapter;

impl ProviderAdapter for OpenRouterAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::OpenRouter
    }

    fn default_base_url(&self) -> &'static str {
        DEFAULT_BASE_URL
    }

    fn supports_images(&self) -> bool {
        false
    }

    fn build_request(
        &self,
        config: &ProviderConfig,
        turns: &[Turn],
    ) -> Result<ProviderRequest, GatewayError> {
        let req =
            chat_completions_request(ProviderId::OpenRouter, &self.base_url(config), config, turns)?;
        Ok(req.header("X-Title", APP_TITLE))
    }

    fn parse_response(&self, body: &str) -> Result<String, GatewayError> {
        parse_chat_completion(ProviderId::OpenRouter, body)
    }
}
