//! A chat session: one conversation, its settings, and the gateway.

use crate::conversation::{ConversationStore, RequestToken};
use crate::error::ChatError;
use parking_lot::Mutex;
use providers::Gateway;
use shared::agent_api::Turn;
use shared::settings::SettingsManager;
use shared::store::SettingsStore;
use std::sync::Arc;
use tracing::{info, warn};

/// What the user asked to send. Blank text is never a message; anything
/// else is sent as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    Text(String),
    /// Text plus an already encoded `data:` image (e.g. a screenshot).
    TextWithImage { text: String, image_data_uri: String },
}

impl UserInput {
    pub fn text(&self) -> &str {
        match self {
            UserInput::Text(text) | UserInput::TextWithImage { text, .. } => text,
        }
    }

    fn into_turn(self) -> Turn {
        match self {
            UserInput::Text(text) => Turn::user(text),
            UserInput::TextWithImage {
                text,
                image_data_uri,
            } => Turn::user_with_image(text, image_data_uri),
        }
    }
}

/// Rolls the pending user turn back if a `submit` future is dropped early.
struct PendingRequest<'a, S: SettingsStore> {
    store: &'a Mutex<ConversationStore<S>>,
    token: Option<RequestToken>,
}

impl<S: SettingsStore> PendingRequest<'_, S> {
    fn finish(mut self, result: &Result<String, ChatError>) -> Result<(), ChatError> {
        let Some(token) = self.token.take() else {
            return Ok(());
        };
        let mut store = self.store.lock();
        match result {
            Ok(reply) => store.complete_request(token, reply.clone()),
            Err(_) => store.abort_request(token),
        }
    }
}

impl<S: SettingsStore> Drop for PendingRequest<'_, S> {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            warn!("chat request abandoned before completion");
            let _ = self.store.lock().abort_request(token);
        }
    }
}

pub struct ChatSession<S> {
    settings: Arc<SettingsManager<S>>,
    store: Mutex<ConversationStore<S>>,
    gateway: Gateway,
}

impl<S: SettingsStore> ChatSession<S> {
    /// Session over the persisted history in `settings`.
    pub fn new(settings: Arc<SettingsManager<S>>, gateway: Gateway) -> Self {
        let store = ConversationStore::open(settings.clone());
        Self {
            settings,
            store: Mutex::new(store),
            gateway,
        }
    }

    pub fn settings(&self) -> &Arc<SettingsManager<S>> {
        &self.settings
    }

    pub fn history(&self) -> Vec<Turn> {
        self.store.lock().turns().to_vec()
    }

    pub fn is_busy(&self) -> bool {
        self.store.lock().is_busy()
    }

    /// Send `input` with the full history and record the exchange.
    ///
    /// On failure the user turn is taken back out of the history, so memory
    /// and storage agree again.
    pub async fn submit(&self, input: UserInput) -> Result<String, ChatError> {
        if input.text().trim().is_empty() {
            return Err(ChatError::EmptyInput);
        }
        // Read fresh every time so key/model edits apply without a restart.
        let config = self.settings.active_provider_config();

        let (pending, turns) = {
            let mut store = self.store.lock();
            let token = store.begin_request(input.into_turn())?;
            let pending = PendingRequest {
                store: &self.store,
                token: Some(token),
            };
            (pending, store.turns().to_vec())
        };

        info!(provider = %config.provider, model = %config.model, turns = turns.len(), "submitting message");
        let result = self
            .gateway
            .send(&config, &turns)
            .await
            .map_err(ChatError::from);
        pending.finish(&result)?;
        result
    }

    /// Empty the conversation. Refused with [`ChatError::Busy`] while a
    /// request is outstanding.
    pub fn new_conversation(&self) -> Result<(), ChatError> {
        self.store.lock().clear()
    }
}
