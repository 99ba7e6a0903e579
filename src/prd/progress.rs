//! Progress reporting port.
//!
//! Observers are injected into the pipeline and notified at fixed
//! milestones. An observer that errors or panics is logged and ignored;
//! it never changes the outcome of a run.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::{info, warn};

pub trait ProgressObserver: Send + Sync {
    /// `percent` is clamped to `0..=100`
    fn on_progress(&self, percent: u8, message: &str) -> anyhow::Result<()>;
}

impl<F> ProgressObserver for F
where
    F: Fn(u8, &str) -> anyhow::Result<()> + Send + Sync,
{
    fn on_progress(&self, percent: u8, message: &str) -> anyhow::Result<()> {
        self(percent, message)
    }
}

/// Observer that writes milestones to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_progress(&self, percent: u8, message: &str) -> anyhow::Result<()> {
        info!(percent, "{}", message);
        Ok(())
    }
}

/// Shields the pipeline from its observer
#[derive(Clone, Default)]
pub struct ProgressReporter {
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl ProgressReporter {
    pub fn new(observer: Arc<dyn ProgressObserver>) -> Self {
        Self {
            observer: Some(observer),
        }
    }

    pub fn report(&self, percent: u8, message: &str) {
        let Some(observer) = &self.observer else {
            return;
        };
        let percent = percent.min(100);
        match catch_unwind(AssertUnwindSafe(|| observer.on_progress(percent, message))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(percent, error = %e, "Progress observer failed"),
            Err(_) => warn!(percent, "Progress observer panicked"),
        }
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("observer", &self.observer.is_some())
            .finish()
    }
}
