use crate::normalize::{normalize_error, ErrorMessages, NormalizedError};

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum SantaError {
    /// A caller-side precondition failed before any request was sent.
    #[error("validation error: {0}")]
    Validation(String),
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// The request deadline elapsed before the response settled.
    #[error("GATEWAY_TIMEOUT")]
    Timeout,
    /// Non-success HTTP status carrying the backend error envelope.
    #[error("api error {status} ({code}): {message}")]
    Api {
        status: u16,
        /// Stable error code from the envelope, or derived from the status.
        code: String,
        /// Human-readable message from the envelope.
        message: String,
    },
    /// Non-success HTTP status code with raw response body.
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    /// Response decoding or request encoding error.
    #[error("decode error: {0}")]
    Decode(String),
    /// An error that was already normalized upstream.
    #[error(transparent)]
    Normalized(NormalizedError),
}

impl SantaError {
    /// HTTP status of the failed response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::Http { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` when this error means "deadline exceeded".
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout => true,
            Self::Transport(err) => err.is_timeout(),
            _ => false,
        }
    }

    /// Converts this error into the `{ code, message }` shape shown to users.
    pub fn normalize(&self, messages: &ErrorMessages) -> NormalizedError {
        normalize_error(self, messages)
    }

    /// Message text without the variant prefix where the variant carries its own text.
    ///
    /// A raw `Http` body is kept out of it; the body stays available on the variant
    /// and in `Display`.
    pub(crate) fn message_text(&self) -> String {
        match self {
            Self::Validation(message) | Self::Decode(message) => message.clone(),
            Self::Api { message, .. } => message.clone(),
            Self::Http { status, .. } => {
                match reqwest::StatusCode::from_u16(*status)
                    .ok()
                    .and_then(|status| status.canonical_reason())
                {
                    Some(reason) => format!("HTTP {status}: {reason}"),
                    None => format!("HTTP {status}"),
                }
            }
            Self::Normalized(error) => error.message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<NormalizedError> for SantaError {
    fn from(error: NormalizedError) -> Self {
        Self::Normalized(error)
    }
}
