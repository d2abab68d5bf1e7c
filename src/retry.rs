//! Bounded retry with pluggable predicate and delay schedule.

use std::{fmt, future::Future, time::Duration};

use tokio::time::sleep;

const BASE_BACKOFF: Duration = Duration::from_millis(1_000);

type ShouldRetry<E> = Box<dyn Fn(&E, usize) -> bool + Send + Sync>;
type CalculateDelay = Box<dyn Fn(usize) -> Duration + Send + Sync>;
type OnRetry<E> = Box<dyn Fn(&E, usize, Duration) + Send + Sync>;

/// Retry configuration for [`retry`].
///
/// Only `max_retries` is required. The predicate defaults to "always retry", the
/// delay schedule to [`calculate_backoff`] and the retry callback to a no-op.
pub struct RetryOptions<E> {
    max_retries: usize,
    should_retry: ShouldRetry<E>,
    calculate_delay: CalculateDelay,
    on_retry: Option<OnRetry<E>>,
}

impl<E> RetryOptions<E> {
    /// Allows `max_retries` retries after the initial attempt.
    pub fn new(max_retries: usize) -> Self {
        Self {
            max_retries,
            should_retry: Box::new(|_: &E, _: usize| true),
            calculate_delay: Box::new(calculate_backoff),
            on_retry: None,
        }
    }

    /// Decides, per failed attempt, whether another attempt is made.
    pub fn should_retry<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E, usize) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Box::new(predicate);
        self
    }

    /// Maps a failed attempt index to the delay before the next attempt.
    pub fn calculate_delay<F>(mut self, schedule: F) -> Self
    where
        F: Fn(usize) -> Duration + Send + Sync + 'static,
    {
        self.calculate_delay = Box::new(schedule);
        self
    }

    /// Observes each retry: error, failed attempt index and the delay about to be slept.
    pub fn on_retry<F>(mut self, callback: F) -> Self
    where
        F: Fn(&E, usize, Duration) + Send + Sync + 'static,
    {
        self.on_retry = Some(Box::new(callback));
        self
    }

    /// Retries allowed after the first attempt; the operation runs at most
    /// `max_retries() + 1` times.
    pub fn max_retries(&self) -> usize {
        self.max_retries
    }
}

impl<E> fmt::Debug for RetryOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("max_retries", &self.max_retries)
            .field("on_retry", &self.on_retry.is_some())
            .finish_non_exhaustive()
    }
}

/// Default delay schedule: `2^attempt` seconds (1s, 2s, 4s, 8s, ...).
pub fn calculate_backoff(attempt: usize) -> Duration {
    exponential_backoff(BASE_BACKOFF, attempt)
}

/// `base * 2^attempt`, with the exponent capped at 16 and saturating on overflow.
pub fn exponential_backoff(base: Duration, attempt: usize) -> Duration {
    let exp = attempt.min(16) as u32;
    base.saturating_mul(1u32 << exp)
}

/// Runs `operation` until it succeeds or the retry budget is spent.
///
/// At most `max_retries + 1` executions happen, one at a time. A failure is
/// returned unchanged when it occurs on the last attempt or when the predicate
/// rejects it; otherwise the callback runs, the delay is slept and the next
/// attempt starts. The error returned is always the one from the last execution.
///
/// ```no_run
/// use std::time::Duration;
/// use santa_http::{is_transient, retry, RetryOptions, SantaError};
///
/// # async fn load() -> santa_http::Result<String> { Ok(String::new()) }
/// # async fn run() -> santa_http::Result<()> {
/// let options = RetryOptions::<SantaError>::new(3)
///     .should_retry(|err, _| is_transient(err))
///     .on_retry(|err, attempt, delay: Duration| eprintln!("attempt {attempt} failed: {err}; waiting {delay:?}"));
/// let _body = retry(load, &options).await?;
/// # Ok(())
/// # }
/// ```
pub async fn retry<T, E, F, Fut>(mut operation: F, options: &RetryOptions<E>) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0usize;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if attempt >= options.max_retries || !(options.should_retry)(&err, attempt) {
            return Err(err);
        }

        let delay = (options.calculate_delay)(attempt);
        if let Some(on_retry) = &options.on_retry {
            on_retry(&err, attempt, delay);
        }
        drop(err);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            attempt,
            max_retries = options.max_retries,
            delay_ms = delay.as_millis() as u64,
            "retrying after failed attempt"
        );

        sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
        time::Duration,
    };

    use tokio::time::Instant;

    use super::{calculate_backoff, exponential_backoff, retry, RetryOptions};

    #[test]
    fn backoff_doubles_from_one_second() {
        let delays: Vec<u128> = (0..4).map(|i| calculate_backoff(i).as_millis()).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000]);
    }

    #[test]
    fn backoff_exponent_is_capped() {
        assert_eq!(
            exponential_backoff(Duration::from_millis(1), 40),
            Duration::from_millis(1 << 16)
        );
        assert_eq!(exponential_backoff(Duration::MAX, 3), Duration::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_operation_runs_max_retries_plus_one_times() {
        for max_retries in 0..4 {
            let calls = AtomicUsize::new(0);
            let options = RetryOptions::new(max_retries);

            let result: Result<(), usize> = retry(
                || {
                    let attempt = calls.fetch_add(1, Ordering::SeqCst);
                    async move { Err(attempt) }
                },
                &options,
            )
            .await;

            assert_eq!(calls.load(Ordering::SeqCst), max_retries + 1);
            assert_eq!(result, Err(max_retries), "last error must be returned");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stops_at_first_success() {
        let calls = AtomicUsize::new(0);
        let options = RetryOptions::new(5);

        let result: Result<&str, &str> = retry(
            || {
                let attempt = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 2 {
                        Err("boom")
                    } else {
                        Ok("done")
                    }
                }
            },
            &options,
        )
        .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_first_attempt_does_not_wait() {
        let start = Instant::now();
        let options: RetryOptions<()> = RetryOptions::new(3);

        let result = retry(|| async { Ok::<_, ()>(7) }, &options).await;

        assert_eq!(result, Ok(7));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_error_is_returned_without_retrying() {
        let calls = AtomicUsize::new(0);
        let retried = Arc::new(AtomicUsize::new(0));
        let observed = Arc::clone(&retried);
        let options = RetryOptions::new(10)
            .should_retry(|_: &String, _| false)
            .on_retry(move |_, _, _| {
                observed.fetch_add(1, Ordering::SeqCst);
            });

        let result: Result<(), String> = retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("validation failed".to_owned()) }
            },
            &options,
        )
        .await;

        assert_eq!(result, Err("validation failed".to_owned()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(retried.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn predicate_sees_attempt_index() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);
        let options = RetryOptions::new(5)
            .should_retry(move |_: &(), attempt| {
                record
                    .lock()
                    .expect("attempt log mutex must not be poisoned")
                    .push(attempt);
                attempt < 1
            })
            .calculate_delay(|_| Duration::from_millis(1));

        let result: Result<(), ()> = retry(|| async { Err(()) }, &options).await;

        assert!(result.is_err());
        assert_eq!(
            *seen.lock().expect("attempt log mutex must not be poisoned"),
            vec![0, 1]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn two_network_failures_then_success_with_default_backoff() {
        let calls = AtomicUsize::new(0);
        let retries = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&retries);
        let options = RetryOptions::new(3).on_retry(move |err: &String, attempt, delay| {
            record
                .lock()
                .expect("retry log mutex must not be poisoned")
                .push((err.clone(), attempt, delay));
        });
        let start = Instant::now();

        let result = retry(
            || {
                let attempt = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 2 {
                        Err(format!("network error #{attempt}"))
                    } else {
                        Ok(format!("payload from attempt {attempt}"))
                    }
                }
            },
            &options,
        )
        .await;

        assert_eq!(result, Ok("payload from attempt 2".to_owned()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            *retries.lock().expect("retry log mutex must not be poisoned"),
            vec![
                ("network error #0".to_owned(), 0, Duration::from_millis(1000)),
                ("network error #1".to_owned(), 1, Duration::from_millis(2000)),
            ]
        );
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(3000), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(3100), "elapsed {elapsed:?}");
    }

    #[test]
    fn debug_does_not_require_debug_error_type() {
        struct Opaque;
        let options: RetryOptions<Opaque> = RetryOptions::new(2);
        assert!(format!("{options:?}").contains("max_retries: 2"));
        assert_eq!(options.max_retries(), 2);
    }
}
