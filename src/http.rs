use reqwest::header::{self, HeaderMap, HeaderValue};

use crate::{Result, SantaError};

/// Returns `true` for 500, 502, 503 and 504.
pub fn is_retryable_status_code(status: u16) -> bool {
    matches!(status, 500 | 502 | 503 | 504)
}

/// Returns `true` when the request failed before any response was received.
///
/// Non-success statuses are application errors, not network errors, and
/// timeouts are reported separately through [`SantaError::is_timeout`]. A body
/// that breaks off after the response arrived is not a network error either.
pub fn is_network_error(err: &SantaError) -> bool {
    match err {
        SantaError::Transport(inner) => {
            !inner.is_timeout() && !inner.is_status() && !inner.is_decode() && !inner.is_body()
        }
        _ => false,
    }
}

/// Returns `true` when the request never reached the server.
///
/// Only these failures are safe to retry for requests that are not idempotent.
pub fn is_connect_error(err: &SantaError) -> bool {
    match err {
        SantaError::Transport(inner) => inner.is_connect(),
        _ => false,
    }
}

/// Default retry predicate for idempotent requests: network errors, timeouts and
/// responses with a retryable status.
pub fn is_transient(err: &SantaError) -> bool {
    is_network_error(err) || err.is_timeout() || err.status().is_some_and(is_retryable_status_code)
}

/// Stable error code for a non-success status whose body carried no code.
pub fn error_code_for_status(status: u16) -> &'static str {
    match status {
        400 => "INVALID_REQUEST",
        401 => "UNAUTHORIZED",
        403 => "FORBIDDEN",
        404 => "NOT_FOUND",
        429 => "RATE_LIMIT_EXCEEDED",
        500 => "SERVER_ERROR",
        502 => "BAD_GATEWAY",
        503 => "SERVICE_UNAVAILABLE",
        504 => "GATEWAY_TIMEOUT",
        _ => "UNKNOWN_ERROR",
    }
}

/// Builds JSON request headers with optional bearer authorization.
///
/// A participant `token` travels in the query string, so when one is present
/// no `Authorization` header is added even if a session `access_token` exists.
pub fn build_auth_headers(token: Option<&str>, access_token: Option<&str>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    if let (None, Some(access_token)) = (token, access_token) {
        let mut value = HeaderValue::from_str(&normalize_bearer_authorization(access_token))
            .map_err(|_| {
                SantaError::Validation(
                    "access token contains characters not allowed in a header".to_owned(),
                )
            })?;
        value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, value);
    }

    Ok(headers)
}

pub(crate) fn normalize_bearer_authorization(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}
