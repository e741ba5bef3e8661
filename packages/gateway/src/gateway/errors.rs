use thiserror::Error;

/// Failure classification for outbound calls.
///
/// 401 is special-cased: by the time callers see `Unauthorized`, the
/// invalidation handler has already run. Everything else is surfaced
/// untouched for the caller to recover locally; the gateway never retries.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("session rejected by server")]
    Unauthorized { message: Option<String> },

    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GatewayError {
    /// Server-provided message, when the response body carried one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            GatewayError::Unauthorized { message } => message.as_deref(),
            GatewayError::Api { message, .. } => Some(message),
            _ => None,
        }
    }
}
