//! Retry/Backoff Executor
//!
//! Generic wrapper around a fallible async operation. Each failure is
//! classified against the policy:
//!
//! - **Fatal**: returned immediately, no further attempts
//! - **Retryable**: wait `min(initial × multiplier^n, max)` then try again
//!
//! After `max_retries` additional attempts the last failure is wrapped in
//! `PrdError::RetriesExhausted` with the attempt count. The executor knows
//! nothing about prompts or evidence.

use std::future::Future;
use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBuilder};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::types::{PrdError, Result};

/// Retry policy value object; cloned into each executor call
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Additional attempts after the first
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f32,
    /// Lower-case substrings that mark an error message as transient
    pub retryable_signatures: Vec<String>,
}

/// Classification of one failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Retryable,
    Fatal,
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            retryable_signatures: Vec::new(),
        }
    }

    pub fn classify(&self, err: &PrdError) -> Failure {
        if err.is_structurally_fatal() {
            return Failure::Fatal;
        }
        let message = err.to_string().to_lowercase();
        if self
            .retryable_signatures
            .iter()
            .any(|sig| message.contains(&sig.to_lowercase()))
        {
            Failure::Retryable
        } else {
            Failure::Fatal
        }
    }

    /// Delay schedule: initial, initial × multiplier, ... capped at `max_delay`
    pub fn backoff(&self) -> impl Iterator<Item = Duration> + use<> {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_max_delay(self.max_delay)
            .with_factor(self.backoff_multiplier)
            .with_max_times(self.max_retries as usize)
            .build()
    }
}

/// Run `operation` until it succeeds, fails fatally, or runs out of retries.
///
/// `cancel` is checked before every attempt and interrupts a pending backoff
/// sleep; an attempt already in flight is never interrupted.
pub async fn execute_with_retry<T, F, Fut>(
    policy: RetryPolicy,
    cancel: &CancellationToken,
    operation_name: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_retries.saturating_add(1);
    let mut delays = policy.backoff();
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(PrdError::Cancelled);
        }
        attempt += 1;

        let err = match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation = operation_name, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if policy.classify(&err) == Failure::Fatal {
            warn!(operation = operation_name, attempt, error = %err, "Fatal failure, not retrying");
            return Err(err);
        }

        // The schedule yields exactly `max_retries` delays
        let next_delay = if attempt < max_attempts {
            delays.next()
        } else {
            None
        };
        let Some(delay) = next_delay else {
            warn!(
                operation = operation_name,
                attempts = attempt,
                error = %err,
                "Retries exhausted"
            );
            return Err(PrdError::RetriesExhausted {
                operation: operation_name.to_string(),
                attempts: attempt,
                source: Box::new(err),
            });
        };
        warn!(
            operation = operation_name,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Transient failure, backing off"
        );

        tokio::select! {
            _ = cancel.cancelled() => return Err(PrdError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CompletionError, ErrorCategory};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            backoff_multiplier: 2.0,
            retryable_signatures: vec!["rate limit".into(), "timeout".into()],
        }
    }

    fn rate_limited() -> PrdError {
        CompletionError::new(ErrorCategory::RateLimit, "rate limit exceeded").into()
    }

    #[tokio::test]
    async fn test_always_failing_operation_runs_n_plus_one_times() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<()> =
            execute_with_retry(fast_policy(3), &CancellationToken::new(), "op", |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(rate_limited()) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match result {
            Err(PrdError::RetriesExhausted { attempts, source, .. }) => {
                assert_eq!(attempts, 4);
                assert!(source.to_string().contains("rate limit"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fatal_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<()> =
            execute_with_retry(fast_policy(5), &CancellationToken::new(), "op", |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(PrdError::Config("invalid api key".into())) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(PrdError::Config(_))));
    }

    #[tokio::test]
    async fn test_malformed_response_is_fatal_even_if_message_matches() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<()> =
            execute_with_retry(fast_policy(5), &CancellationToken::new(), "op", |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(PrdError::malformed("tier2", "timeout field missing")) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(PrdError::MalformedResponse { .. })));
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let result =
            execute_with_retry(fast_policy(3), &CancellationToken::new(), "op", |attempt| {
                async move {
                    if attempt < 3 {
                        Err(PrdError::timeout("call", Duration::from_millis(5)))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_cancellation_stops_between_attempts() {
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let token = cancel.clone();

        let result: Result<()> = execute_with_retry(fast_policy(10), &cancel, "op", |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            token.cancel();
            async { Err(rate_limited()) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(PrdError::Cancelled)));
    }

    #[test]
    fn test_delay_schedule_is_capped() {
        let policy = RetryPolicy {
            max_retries: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            retryable_signatures: vec![],
        };
        let delays: Vec<u128> = policy.backoff().map(|d| d.as_millis()).collect();
        assert_eq!(delays, vec![100, 200, 400, 500, 500]);
    }

    #[test]
    fn test_classify_by_signature() {
        let policy = fast_policy(1);
        assert_eq!(policy.classify(&rate_limited()), Failure::Retryable);
        assert_eq!(
            policy.classify(&PrdError::Scan("permission denied".into())),
            Failure::Fatal
        );
    }
}
