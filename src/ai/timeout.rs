//! Deadlines and Timeouts
//!
//! - `with_timeout`: bound a single transport call, failing with `PrdError::Timeout`
//! - `race_deadline`: race a whole call (retries included) against a
//!   deadline and report which side won as a `CallOutcome`

use std::future::Future;
use std::time::Duration;

use crate::types::{PrdError, Result};

/// Outcome of a call raced against a deadline
#[derive(Debug)]
pub enum CallOutcome<T> {
    Completed(T),
    /// The deadline elapsed first
    Deadline,
    Failed(PrdError),
}

impl<T> CallOutcome<T> {
    pub fn is_deadline(&self) -> bool {
        matches!(self, Self::Deadline)
    }
}

/// Execute an async operation with a timeout
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(PrdError::timeout(operation_name, timeout)),
    }
}

/// Race `call` against `deadline`.
///
/// Whichever side loses is dropped before returning: an unfinished call
/// abandons its in-flight request, an unfired timer is deregistered.
pub async fn race_deadline<T, F>(deadline: Duration, call: F) -> CallOutcome<T>
where
    F: Future<Output = Result<T>>,
{
    let mut call = Box::pin(call);
    let mut timer = Box::pin(tokio::time::sleep(deadline));

    let outcome = tokio::select! {
        result = &mut call => match result {
            Ok(value) => CallOutcome::Completed(value),
            Err(err) => CallOutcome::Failed(err),
        },
        _ = &mut timer => CallOutcome::Deadline,
    };

    drop(call);
    drop(timer);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(
            Duration::from_secs(1),
            async { Ok::<_, PrdError>(42) },
            "test operation",
        )
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, PrdError>(42)
            },
            "slow operation",
        )
        .await;
        assert!(matches!(result, Err(PrdError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_race_deadline_reports_completion() {
        let outcome =
            race_deadline(Duration::from_secs(5), async { Ok::<_, PrdError>("done") }).await;
        assert!(matches!(outcome, CallOutcome::Completed("done")));
    }

    #[tokio::test]
    async fn test_race_deadline_reports_deadline() {
        let outcome: CallOutcome<()> = race_deadline(
            Duration::from_millis(10),
            std::future::pending::<Result<()>>(),
        )
        .await;
        assert!(outcome.is_deadline());
    }

    #[tokio::test]
    async fn test_race_deadline_passes_failure_through() {
        let outcome: CallOutcome<()> = race_deadline(Duration::from_secs(5), async {
            Err(PrdError::Config("bad".into()))
        })
        .await;
        assert!(matches!(outcome, CallOutcome::Failed(PrdError::Config(_))));
    }
}
