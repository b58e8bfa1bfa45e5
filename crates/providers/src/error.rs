use shared::settings::ProviderId;

/// Upstream error bodies are cut to this many characters.
pub(crate) const MAX_ERROR_DETAIL: usize = 800;

/// Coarse class of a [`GatewayError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Credential,
    Upstream,
    Transport,
    UnsupportedInput,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Missing key, or the provider answered 401/403.
    #[error("{provider} rejected the credentials ({}): {detail}", status_label(.status))]
    Credential {
        provider: ProviderId,
        status: Option<u16>,
        detail: String,
    },

    /// Any other non-success status, or a body we could not read a reply from.
    #[error("{provider} error ({}): {detail}", status_label(.status))]
    Upstream {
        provider: ProviderId,
        status: Option<u16>,
        detail: String,
    },

    #[error("could not reach {provider}: {detail}")]
    Transport {
        provider: ProviderId,
        detail: String,
        timed_out: bool,
    },

    #[error("{provider} cannot handle this input: {reason}")]
    UnsupportedInput { provider: ProviderId, reason: String },
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {}", code),
        None => "no status".to_string(),
    }
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Credential { .. } => ErrorKind::Credential,
            GatewayError::Upstream { .. } => ErrorKind::Upstream,
            GatewayError::Transport { .. } => ErrorKind::Transport,
            GatewayError::UnsupportedInput { .. } => ErrorKind::UnsupportedInput,
        }
    }

    pub fn provider(&self) -> ProviderId {
        match self {
            GatewayError::Credential { provider, .. }
            | GatewayError::Upstream { provider, .. }
            | GatewayError::Transport { provider, .. }
            | GatewayError::UnsupportedInput { provider, .. } => *provider,
        }
    }

    pub(crate) fn transport(provider: ProviderId, err: reqwest::Error) -> Self {
        let timed_out = err.is_timeout();
        // reqwest's Display stops at the outermost layer; the cause is further down.
        let mut detail = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            detail.push_str(": ");
            detail.push_str(&cause.to_string());
            source = cause.source();
        }
        GatewayError::Transport {
            provider,
            detail,
            timed_out,
        }
    }

    pub(crate) fn malformed(provider: ProviderId, what: impl std::fmt::Display) -> Self {
        GatewayError::Upstream {
            provider,
            status: None,
            detail: format!("malformed response: {}", what),
        }
    }

    pub(crate) fn unsupported(provider: ProviderId, reason: impl Into<String>) -> Self {
        GatewayError::UnsupportedInput {
            provider,
            reason: reason.into(),
        }
    }
}

/// Default mapping of a non-success status: 401/403 are credential problems,
/// everything else is the provider's fault and keeps the raw body.
pub fn classify_status(provider: ProviderId, status: u16, body: &str) -> GatewayError {
    let detail = truncate_detail(body);
    if status == 401 || status == 403 {
        GatewayError::Credential {
            provider,
            status: Some(status),
            detail,
        }
    } else {
        GatewayError::Upstream {
            provider,
            status: Some(status),
            detail,
        }
    }
}

pub(crate) fn truncate_detail(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= MAX_ERROR_DETAIL {
        return body.to_string();
    }
    let cut: String = body.chars().take(MAX_ERROR_DETAIL).collect();
    format!("{}...", cut)
}
