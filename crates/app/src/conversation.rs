//! Conversation history: ordered turns in memory, mirrored to the `history`
//! settings key as a JSON array.
//!
//! At most one request may be outstanding. [`ConversationStore::begin_request`]
//! hands out a [`RequestToken`]; until it is completed or aborted the store
//! refuses to clear and persists only the turns before the pending one.

use crate::error::ChatError;
use shared::agent_api::Turn;
use shared::settings::SettingsManager;
use shared::store::SettingsStore;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(Uuid);

#[derive(Debug)]
struct InFlight {
    token: RequestToken,
    /// History length before the unanswered user turn.
    committed: usize,
}

pub struct ConversationStore<S> {
    settings: Arc<SettingsManager<S>>,
    turns: Vec<Turn>,
    in_flight: Option<InFlight>,
}

impl<S: SettingsStore> ConversationStore<S> {
    /// Store with the persisted history already loaded.
    pub fn open(settings: Arc<SettingsManager<S>>) -> Self {
        let turns = Self::read_persisted(&settings);
        info!(turns = turns.len(), "loaded conversation history");
        Self {
            settings,
            turns,
            in_flight: None,
        }
    }

    fn read_persisted(settings: &SettingsManager<S>) -> Vec<Turn> {
        let Some(blob) = settings.history_blob() else {
            return Vec::new();
        };
        if blob.trim().is_empty() {
            return Vec::new();
        }
        match serde_json::from_str::<Vec<Turn>>(&blob) {
            Ok(turns) => turns,
            Err(e) => {
                warn!(error = %e, "persisted history is unreadable, starting empty");
                Vec::new()
            }
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Replace memory with what is persisted. Refused while a request is out.
    pub fn load(&mut self) -> Result<Vec<Turn>, ChatError> {
        if self.is_busy() {
            return Err(ChatError::Busy);
        }
        self.turns = Self::read_persisted(&self.settings);
        Ok(self.turns.clone())
    }

    /// Overwrite the persisted history with the committed turns.
    pub fn persist(&self) -> Result<(), ChatError> {
        let committed = match &self.in_flight {
            Some(pending) => &self.turns[..pending.committed],
            None => &self.turns[..],
        };
        let blob = serde_json::to_string(committed).map_err(anyhow::Error::from)?;
        self.settings.set_history_blob(&blob)?;
        debug!(turns = committed.len(), "persisted conversation history");
        Ok(())
    }

    /// Start a new conversation. Refused while a request is out so the turn
    /// being answered is not lost.
    pub fn clear(&mut self) -> Result<(), ChatError> {
        if self.is_busy() {
            return Err(ChatError::Busy);
        }
        self.turns.clear();
        self.persist()?;
        info!("conversation cleared");
        Ok(())
    }

    /// Claim the single request slot and append the user turn to send.
    pub fn begin_request(&mut self, user_turn: Turn) -> Result<RequestToken, ChatError> {
        if self.is_busy() {
            return Err(ChatError::Busy);
        }
        let token = RequestToken(Uuid::new_v4());
        self.in_flight = Some(InFlight {
            token,
            committed: self.turns.len(),
        });
        self.turns.push(user_turn);
        Ok(token)
    }

    fn take_in_flight(&mut self, token: RequestToken) -> Result<InFlight, ChatError> {
        match &self.in_flight {
            Some(pending) if pending.token == token => {}
            _ => return Err(ChatError::StaleRequest),
        }
        self.in_flight.take().ok_or(ChatError::StaleRequest)
    }

    /// Record the reply and persist the whole exchange once.
    ///
    /// A failed save is logged, not returned: the reply stays in memory and
    /// the next successful persist (a full overwrite) writes it out.
    pub fn complete_request(&mut self, token: RequestToken, reply: String) -> Result<(), ChatError> {
        self.take_in_flight(token)?;
        self.turns.push(Turn::assistant(reply));
        if let Err(e) = self.persist() {
            warn!(error = %e, turns = self.turns.len(), "could not save conversation history");
        }
        Ok(())
    }

    /// Drop the unanswered user turn; storage is untouched.
    pub fn abort_request(&mut self, token: RequestToken) -> Result<(), ChatError> {
        let pending = self.take_in_flight(token)?;
        self.turns.truncate(pending.committed);
        Ok(())
    }
}
