use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

/// The `error` object of a non-success backend response.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

/// Returns `true` when `value` has the shape `{ "error": { "message": <string>, .. } }`.
pub fn is_api_error_response(value: &serde_json::Value) -> bool {
    value
        .get("error")
        .and_then(|error| error.get("message"))
        .is_some_and(serde_json::Value::is_string)
}

/// Parses a response body as the backend error envelope.
pub fn parse_error_envelope(body: &str) -> Option<ErrorBody> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error)
}
