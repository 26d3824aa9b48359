use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Progress and cancellation hooks offered by whoever schedules an invocation
pub trait ProgressMonitor {
    /// Start the task with the given amount of work units
    fn begin_task(&self, name: &str, total: u64);

    /// Describe the step currently being worked on
    fn sub_task(&self, _name: &str) {}

    /// Report completed work units
    fn worked(&self, amount: u64);

    /// Whether the scheduler asked the invocation to stop
    fn is_cancelled(&self) -> bool;

    /// The task is over, successfully or not
    fn done(&self);
}

/// Shared flag used to request cancellation of running invocations
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A token observes cancellation without displaying anything
impl ProgressMonitor for CancellationToken {
    fn begin_task(&self, _name: &str, _total: u64) {}

    fn worked(&self, _amount: u64) {}

    fn is_cancelled(&self) -> bool {
        CancellationToken::is_cancelled(self)
    }

    fn done(&self) {}
}

/// Monitor that ignores progress and never cancels
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMonitor;

impl ProgressMonitor for NullMonitor {
    fn begin_task(&self, _name: &str, _total: u64) {}

    fn worked(&self, _amount: u64) {}

    fn is_cancelled(&self) -> bool {
        false
    }

    fn done(&self) {}
}

/// Progress tracker rendering one spinner per invocation
pub struct ProgressTracker {
    bar: ProgressBar,
    token: CancellationToken,
}

impl ProgressTracker {
    /// Create a tracker whose spinner is drawn by `multi_progress`
    pub fn new(multi_progress: &MultiProgress, token: CancellationToken) -> Self {
        let bar = multi_progress.add(ProgressBar::new_spinner());
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {prefix} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);

        Self { bar, token }
    }

    /// Create a tracker that draws nothing
    pub fn hidden(token: CancellationToken) -> Self {
        Self {
            bar: ProgressBar::hidden(),
            token,
        }
    }
}

impl ProgressMonitor for ProgressTracker {
    fn begin_task(&self, name: &str, total: u64) {
        self.bar.set_length(total);
        self.bar.set_prefix(name.to_string());
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    fn sub_task(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn worked(&self, amount: u64) {
        self.bar.inc(amount);
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn done(&self) {
        let message = if self.token.is_cancelled() { "cancelled" } else { "done" };
        self.bar.finish_with_message(message);
    }
}
