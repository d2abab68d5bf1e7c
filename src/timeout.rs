//! Deadline enforcement for single network calls.

use std::{future::Future, time::Duration};

use crate::{Result, SantaError};

/// Runs `future` under a deadline of `timeout`.
///
/// When the future settles first its outcome is returned unchanged. When the
/// deadline elapses first the future is dropped, which cancels the in-flight
/// work, and [`SantaError::Timeout`] is returned. The deadline timer is owned by
/// this call and released on every exit path.
pub async fn with_timeout<T, F>(future: F, timeout: Duration) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(outcome) => outcome,
        Err(_elapsed) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                timeout_ms = timeout.as_millis() as u64,
                "request deadline elapsed"
            );
            Err(SantaError::Timeout)
        }
    }
}

/// Sends `request` with a deadline of `timeout`.
///
/// Transport failures that settle before the deadline come back as
/// [`SantaError::Transport`]; a missed deadline, including one reported by
/// `reqwest` itself, comes back as [`SantaError::Timeout`]. Non-success statuses
/// are not errors at this level.
pub async fn fetch_with_timeout(
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<reqwest::Response> {
    with_timeout(
        async move { request.send().await.map_err(transport_error) },
        timeout,
    )
    .await
}

pub(crate) fn transport_error(err: reqwest::Error) -> SantaError {
    if err.is_timeout() {
        SantaError::Timeout
    } else {
        SantaError::Transport(err)
    }
}
