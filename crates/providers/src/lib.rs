//! Provider gateway: one adapter per hosted LLM API behind a single `send`.

pub mod adapter;
pub mod anthropic;
pub mod error;
pub mod gateway;
pub mod gemini;
pub mod openai;
pub mod openrouter;

pub use adapter::{adapter_for, ProviderAdapter, ProviderRequest};
pub use error::{classify_status, ErrorKind, GatewayError};
pub use gateway::{Gateway, DEFAULT_TIMEOUT};
