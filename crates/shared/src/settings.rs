//! Typed access to the assistant's settings.

use crate::store::SettingsStore;
use anyhow::Result;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;
use zeroize::Zeroizing;

pub mod keys {
    pub const LLM_PROVIDER: &str = "llm-provider";
    pub const HUMAN_MESSAGE_COLOR: &str = "human-message-color";
    pub const LLM_MESSAGE_COLOR: &str = "llm-message-color";
    pub const HUMAN_MESSAGE_TEXT_COLOR: &str = "human-message-text-color";
    pub const LLM_MESSAGE_TEXT_COLOR: &str = "llm-message-text-color";
    pub const HISTORY: &str = "history";
    pub const OPEN_CHAT_SHORTCUT: &str = "open-chat-shortcut";
    pub const OPEN_DIALOG_SHORTCUT: &str = "open-dialog-shortcut";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Anthropic,
    OpenAI,
    Gemini,
    OpenRouter,
}

impl ProviderId {
    pub const ALL: [ProviderId; 4] = [
        ProviderId::Anthropic,
        ProviderId::OpenAI,
        ProviderId::Gemini,
        ProviderId::OpenRouter,
    ];

    /// Identifier as stored in settings.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Anthropic => "anthropic",
            ProviderId::OpenAI => "openai",
            ProviderId::Gemini => "gemini",
            ProviderId::OpenRouter => "openrouter",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::Anthropic => "Anthropic",
            ProviderId::OpenAI => "OpenAI",
            ProviderId::Gemini => "Gemini",
            ProviderId::OpenRouter => "OpenRouter",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderId::Anthropic => "claude-3-5-sonnet-20241022",
            ProviderId::OpenAI => "gpt-4o-mini",
            ProviderId::Gemini => "gemini-1.5-flash",
            ProviderId::OpenRouter => "openai/gpt-4o-mini",
        }
    }

    /// Environment variable consulted when no key is stored.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderId::Anthropic => "ANTHROPIC_API_KEY",
            ProviderId::OpenAI => "OPENAI_API_KEY",
            ProviderId::Gemini => "GEMINI_API_KEY",
            ProviderId::OpenRouter => "OPENROUTER_API_KEY",
        }
    }

    pub fn api_key_setting(&self) -> String {
        format!("{}-api-key", self.as_str())
    }

    pub fn model_setting(&self) -> String {
        format!("{}-model", self.as_str())
    }

    pub fn base_url_setting(&self) -> String {
        format!("{}-base-url", self.as_str())
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderId {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ProviderId::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| UnknownProvider(s.to_string()))
    }
}

/// Everything the gateway needs for one request.
#[derive(Clone)]
pub struct ProviderConfig {
    pub provider: ProviderId,
    pub api_key: Zeroizing<String>,
    pub model: String,
    /// Replaces the provider's default origin (proxies, tests).
    pub base_url: Option<String>,
}

impl ProviderConfig {
    pub fn new(provider: ProviderId, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: Zeroizing::new(api_key.into()),
            model: model.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Chat bubble colors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleSettings {
    pub human_message_color: String,
    pub llm_message_color: String,
    pub human_message_text_color: String,
    pub llm_message_text_color: String,
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self {
            human_message_color: "#3a3a3a".into(),
            llm_message_color: "#1e3a5f".into(),
            human_message_text_color: "#ffffff".into(),
            llm_message_text_color: "#ffffff".into(),
        }
    }
}

pub type SubscriptionId = u64;

type ChangeCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Typed settings on top of a [`SettingsStore`], with change notification.
pub struct SettingsManager<S> {
    store: S,
    subscribers: Mutex<Vec<(SubscriptionId, ChangeCallback)>>,
    next_subscription: AtomicU64,
}

impl<S: SettingsStore> SettingsManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            subscribers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn get_non_empty(&self, key: &str) -> Option<String> {
        self.store.get(key).filter(|v| !v.trim().is_empty())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.store.set(key, value)?;
        self.notify(key);
        Ok(())
    }

    /// Active provider. Unset means Anthropic; an unknown identifier is an error.
    pub fn provider(&self) -> Result<ProviderId> {
        match self.get_non_empty(keys::LLM_PROVIDER) {
            Some(raw) => Ok(raw.parse()?),
            None => Ok(ProviderId::Anthropic),
        }
    }

    /// Like [`Self::provider`], but an unknown identifier is logged and
    /// treated as Anthropic so the user can still pick a valid one.
    pub fn provider_or_default(&self) -> ProviderId {
        self.provider().unwrap_or_else(|e| {
            warn!(error = %e, "unknown provider in settings, using anthropic");
            ProviderId::Anthropic
        })
    }

    pub fn set_provider(&self, provider: ProviderId) -> Result<()> {
        self.set(keys::LLM_PROVIDER, provider.as_str())
    }

    /// Stored key, else the provider's environment variable, else empty.
    pub fn api_key(&self, provider: ProviderId) -> Zeroizing<String> {
        if let Some(key) = self.get_non_empty(&provider.api_key_setting()) {
            return Zeroizing::new(key.trim().to_string());
        }
        let from_env = std::env::var(provider.api_key_env()).unwrap_or_default();
        Zeroizing::new(from_env.trim().to_string())
    }

    pub fn set_api_key(&self, provider: ProviderId, api_key: &str) -> Result<()> {
        self.set(&provider.api_key_setting(), api_key.trim())
    }

    pub fn model(&self, provider: ProviderId) -> String {
        self.get_non_empty(&provider.model_setting())
            .map(|m| m.trim().to_string())
            .unwrap_or_else(|| provider.default_model().to_string())
    }

    pub fn set_model(&self, provider: ProviderId, model: &str) -> Result<()> {
        self.set(&provider.model_setting(), model.trim())
    }

    pub fn base_url(&self, provider: ProviderId) -> Option<String> {
        self.get_non_empty(&provider.base_url_setting())
            .map(|u| u.trim().trim_end_matches('/').to_string())
    }

    /// `None` restores the provider's default origin.
    pub fn set_base_url(&self, provider: ProviderId, base_url: Option<&str>) -> Result<()> {
        self.set(&provider.base_url_setting(), base_url.unwrap_or(""))
    }

    /// Fresh snapshot of what a send to `provider` should use.
    pub fn provider_config(&self, provider: ProviderId) -> ProviderConfig {
        ProviderConfig {
            provider,
            api_key: self.api_key(provider),
            model: self.model(provider),
            base_url: self.base_url(provider),
        }
    }

    pub fn active_provider_config(&self) -> ProviderConfig {
        self.provider_config(self.provider_or_default())
    }

    /// Raw serialized turn history, if any was ever stored.
    pub fn history_blob(&self) -> Option<String> {
        self.store.get(keys::HISTORY)
    }

    pub fn set_history_blob(&self, blob: &str) -> Result<()> {
        self.set(keys::HISTORY, blob)
    }

    pub fn style(&self) -> StyleSettings {
        let defaults = StyleSettings::default();
        let pick = |key: &str, fallback: String| self.get_non_empty(key).unwrap_or(fallback);
        StyleSettings {
            human_message_color: pick(keys::HUMAN_MESSAGE_COLOR, defaults.human_message_color),
            llm_message_color: pick(keys::LLM_MESSAGE_COLOR, defaults.llm_message_color),
            human_message_text_color: pick(
                keys::HUMAN_MESSAGE_TEXT_COLOR,
                defaults.human_message_text_color,
            ),
            llm_message_text_color: pick(
                keys::LLM_MESSAGE_TEXT_COLOR,
                defaults.llm_message_text_color,
            ),
        }
    }

    pub fn set_style(&self, style: &StyleSettings) -> Result<()> {
        self.set(keys::HUMAN_MESSAGE_COLOR, &style.human_message_color)?;
        self.set(keys::LLM_MESSAGE_COLOR, &style.llm_message_color)?;
        self.set(keys::HUMAN_MESSAGE_TEXT_COLOR, &style.human_message_text_color)?;
        self.set(keys::LLM_MESSAGE_TEXT_COLOR, &style.llm_message_text_color)
    }

    pub fn open_chat_shortcut(&self) -> String {
        self.get_non_empty(keys::OPEN_CHAT_SHORTCUT)
            .unwrap_or_else(|| "<Super>a".to_string())
    }

    pub fn set_open_chat_shortcut(&self, accelerator: &str) -> Result<()> {
        self.set(keys::OPEN_CHAT_SHORTCUT, accelerator)
    }

    pub fn open_dialog_shortcut(&self) -> String {
        self.get_non_empty(keys::OPEN_DIALOG_SHORTCUT)
            .unwrap_or_else(|| "<Super>d".to_string())
    }

    pub fn set_open_dialog_shortcut(&self, accelerator: &str) -> Result<()> {
        self.set(keys::OPEN_DIALOG_SHORTCUT, accelerator)
    }

    /// Register `callback` to receive the key of every successful change.
    /// Callbacks run on the thread that made the change.
    pub fn connect_to_changes<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().push((id, Arc::new(callback)));
        id
    }

    pub fn disconnect(&self, id: SubscriptionId) {
        self.subscribers.lock().retain(|(sub, _)| *sub != id);
    }

    pub fn disconnect_all(&self) {
        self.subscribers.lock().clear();
    }

    fn notify(&self, key: &str) {
        // Clone out so callbacks may (dis)connect without deadlocking.
        let callbacks: Vec<ChangeCallback> = self
            .subscribers
            .lock()
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        for cb in callbacks {
            cb(key);
        }
    }
}
