pub mod chat;
pub mod command;
pub mod conversation;
pub mod error;
pub mod notices;

pub use chat::{ChatSession, UserInput};
pub use conversation::{ConversationStore, RequestToken};
pub use error::ChatError;
