//! Progress reporting for pipeline runs

use std::sync::atomic::{AtomicU8, Ordering};

/// Receives progress updates from a running pipeline
pub trait ProgressReporter: Send + Sync {
    /// `phase` is 1..=3, `percent` is 0..=100
    fn report(&self, phase: u8, message: &str, percent: u8);
}

/// Discards every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _phase: u8, _message: &str, _percent: u8) {}
}

impl<F> ProgressReporter for F
where
    F: Fn(u8, &str, u8) + Send + Sync,
{
    fn report(&self, phase: u8, message: &str, percent: u8) {
        self(phase, message, percent)
    }
}

/// Forwards updates, never letting the reported percentage go backwards
///
/// Fetch completions arrive from concurrently polled futures, so a late
/// callback may carry a smaller value than one already forwarded.
pub(crate) struct MonotonicProgress<'a> {
    inner: &'a dyn ProgressReporter,
    high_water: AtomicU8,
}

impl<'a> MonotonicProgress<'a> {
    pub(crate) fn new(inner: &'a dyn ProgressReporter) -> Self {
        Self {
            inner,
            high_water: AtomicU8::new(0),
        }
    }
}

impl ProgressReporter for MonotonicProgress<'_> {
    fn report(&self, phase: u8, message: &str, percent: u8) {
        let percent = percent.min(100);
        let previous = self.high_water.fetch_max(percent, Ordering::SeqCst);
        self.inner.report(phase, message, percent.max(previous));
    }
}

/// Percentage for `done` of `total` fetches, spread over 35..=60
pub(crate) fn fetch_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 60;
    }
    let step = 25 * done.min(total) / total;
    35 + step as u8
}
