//! User-facing wording for everything that can go wrong in a chat.

use crate::error::ChatError;
use providers::GatewayError;
use shared::settings::ProviderId;

pub const BUSY_NEW_CONVERSATION: &str =
    "You can't start a new conversation while I'm still answering.";
pub const BUSY_SEND: &str = "Hold on, I'm still working on your last message.";
pub const EMPTY_INPUT: &str = "Type a message first.";

/// Friendly text for `err`. `provider` is the one that was active for the send.
pub fn describe_error(provider: ProviderId, err: &ChatError) -> String {
    match err {
        ChatError::Busy => BUSY_SEND.to_string(),
        ChatError::EmptyInput => EMPTY_INPUT.to_string(),
        ChatError::Gateway(GatewayError::Credential { provider, .. }) => {
            credential_notice(*provider)
        }
        ChatError::Gateway(GatewayError::UnsupportedInput { provider, reason }) => format!(
            "{} can't take that message: {}.\n\nTry sending text only, or pick a provider that accepts images.",
            provider.display_name(),
            reason
        ),
        ChatError::StaleRequest => generic_notice(provider, &err.to_string()),
        ChatError::Gateway(e) => generic_notice(provider, &e.to_string()),
        ChatError::Settings(e) => generic_notice(provider, &format!("{:#}", e)),
    }
}

fn credential_notice(provider: ProviderId) -> String {
    format!(
        "I couldn't get an answer from the assistant.\n\
        Check your API key and model settings for {} and try again. \
        Your internet connection could also be the cause.",
        provider.display_name()
    )
}

fn generic_notice(provider: ProviderId, error: &str) -> String {
    format!(
        "I'm having trouble getting a response from {}.\n\n\
        Error: {}\n\n\
        Some things to try:\n\
        - Check your internet connection\n\
        - If you recently switched provider, start a new conversation",
        provider.display_name(),
        error
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use providers::classify_status;

    #[test]
    fn test_credential_notice_names_provider() {
        let err = ChatError::Gateway(classify_status(ProviderId::Gemini, 403, "denied"));
        let text = describe_error(ProviderId::Gemini, &err);
        assert!(text.contains("API key"));
        assert!(text.contains("Gemini"));
        assert!(!text.contains("denied"));
    }

    #[test]
    fn test_upstream_notice_shows_raw_error_and_tips() {
        let err = ChatError::Gateway(classify_status(ProviderId::OpenAI, 500, "model overloaded"));
        let text = describe_error(ProviderId::OpenAI, &err);
        assert!(text.contains("model overloaded"));
        assert!(text.contains("internet connection"));
    }

    #[test]
    fn test_unsupported_input_notice() {
        let err = ChatError::Gateway(GatewayError::UnsupportedInput {
            provider: ProviderId::OpenRouter,
            reason: "image input is not supported".into(),
        });
        let text = describe_error(ProviderId::OpenRouter, &err);
        assert!(text.starts_with("OpenRouter can't take that message"));
    }

    #[test]
    fn test_busy_and_empty() {
        assert_eq!(describe_error(ProviderId::Anthropic, &ChatError::Busy), BUSY_SEND);
        assert_eq!(
            describe_error(ProviderId::Anthropic, &ChatError::EmptyInput),
            EMPTY_INPUT
        );
    }
}
