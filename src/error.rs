use thiserror::Error;

/// Failure taxonomy for the portal client.
///
/// Every network operation is a single attempt; the caller decides whether
/// to restart the action. Server-supplied messages are preserved wherever
/// the backend sends one, otherwise a generic fallback is used.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{message}")]
    Api { message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payment step {step} failed: {message}")]
    PaymentStep { step: &'static str, message: String },

    #[error("Response did not match the expected contract; probed fields: {}", field_candidates.join(", "))]
    Contract { field_candidates: Vec<String> },

    #[error("Realtime channel error: {0}")]
    Realtime(String),

    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed response body: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    pub fn api<S: Into<String>>(message: S) -> Self {
        ClientError::Api { message: message.into() }
    }

    /// Server message when present, generic fallback otherwise.
    pub fn from_server_message(message: Option<String>) -> Self {
        ClientError::Api {
            message: message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Something went wrong. Please try again.".to_string()),
        }
    }
}

impl From<String> for ClientError {
    fn from(err: String) -> Self {
        ClientError::Api { message: err }
    }
}
