//! Conversion of arbitrary failures into the `{ code, message }` shape the UI shows.

use std::{collections::HashMap, error::Error as StdError, io};

use serde::{Deserialize, Serialize};

use crate::SantaError;

/// Code for a request whose deadline elapsed.
pub const GATEWAY_TIMEOUT: &str = "GATEWAY_TIMEOUT";
/// Fallback code for any failure that is neither normalized nor a timeout.
pub const AI_API_ERROR: &str = "AI_API_ERROR";

const DEFAULT_TIMEOUT_MESSAGE: &str = "Request timed out";
const DEFAULT_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Uniform error value surfaced to the presentation layer.
///
/// Serializes to the same shape as the `error` object of the backend envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct NormalizedError {
    pub code: String,
    pub message: String,
}

/// Code → user-facing message table consulted during normalization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorMessages(HashMap<String, String>);

impl ErrorMessages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the message for `code`.
    pub fn with(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.0.insert(code.into(), message.into());
        self
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.0.get(code).map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for ErrorMessages
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(code, message)| (code.into(), message.into()))
                .collect(),
        )
    }
}

/// Builds a [`NormalizedError`].
pub fn create_error(code: impl Into<String>, message: impl Into<String>) -> NormalizedError {
    NormalizedError {
        code: code.into(),
        message: message.into(),
    }
}

/// Classifies `err` into a [`NormalizedError`].
///
/// - Values that already carry a code and message (a [`NormalizedError`],
///   [`SantaError::Normalized`] or [`SantaError::Api`]) pass through unchanged.
/// - Timeouts become [`GATEWAY_TIMEOUT`] with the table message or `"Request timed out"`.
/// - Everything else becomes [`AI_API_ERROR`] with the error's own message, falling
///   back to the table entry and then to `"An unexpected error occurred"`.
///
/// A message that is empty or only whitespace counts as missing and takes the
/// fallback, so a blank string is never shown to the user.
///
/// The function is pure and idempotent: normalizing its own output returns an equal value.
pub fn normalize_error(err: &(dyn StdError + 'static), messages: &ErrorMessages) -> NormalizedError {
    if let Some(normalized) = as_normalized(err) {
        return normalized;
    }

    if is_timeout(err) {
        let message = messages
            .get(GATEWAY_TIMEOUT)
            .unwrap_or(DEFAULT_TIMEOUT_MESSAGE);
        return create_error(GATEWAY_TIMEOUT, message);
    }

    let message = own_message(err).unwrap_or_else(|| {
        messages
            .get(AI_API_ERROR)
            .unwrap_or(DEFAULT_ERROR_MESSAGE)
            .to_owned()
    });
    create_error(AI_API_ERROR, message)
}

fn as_normalized(err: &(dyn StdError + 'static)) -> Option<NormalizedError> {
    if let Some(normalized) = err.downcast_ref::<NormalizedError>() {
        return Some(normalized.clone());
    }
    match err.downcast_ref::<SantaError>()? {
        SantaError::Normalized(normalized) => Some(normalized.clone()),
        SantaError::Api { code, message, .. } => Some(create_error(code.clone(), message.clone())),
        _ => None,
    }
}

fn is_timeout(err: &(dyn StdError + 'static)) -> bool {
    if let Some(err) = err.downcast_ref::<SantaError>() {
        return err.is_timeout();
    }
    if err.is::<tokio::time::error::Elapsed>() {
        return true;
    }
    if let Some(err) = err.downcast_ref::<reqwest::Error>() {
        return err.is_timeout();
    }
    err.downcast_ref::<io::Error>()
        .is_some_and(|err| err.kind() == io::ErrorKind::TimedOut)
}

fn own_message(err: &(dyn StdError + 'static)) -> Option<String> {
    let message = match err.downcast_ref::<SantaError>() {
        Some(err) => err.message_text(),
        None => err.to_string(),
    };
    (!message.trim().is_empty()).then_some(message)
}
