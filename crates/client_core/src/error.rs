use thiserror::Error;

/// Failure talking to the clinic backend.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("request to {path} failed with status {status}")]
    Http {
        path: String,
        status: u16,
        detail: Option<String>,
    },
    #[error("request to {path} failed: {message}")]
    Transport { path: String, message: String },
    #[error("invalid response from {path}: {message}")]
    Decode { path: String, message: String },
    #[error("invalid endpoint url: {0}")]
    Endpoint(String),
}

impl ClientError {
    /// Server-provided `detail`, when the failure response carried one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Http { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Message for the user: the server detail when present, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail()
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string())
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
