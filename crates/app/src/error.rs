use providers::GatewayError;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("a request is already in flight for this conversation")]
    Busy,

    #[error("nothing to send")]
    EmptyInput,

    #[error("request token does not match the request in flight")]
    StaleRequest,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("settings error: {0:#}")]
    Settings(#[from] anyhow::Error),
}
