//! Cooperative progress reporting and cancellation.
//!
//! Every long-running operation in this crate drives a
//! [`ProgressController`] owned by the caller. The controller's range is
//! reset at the start of each operation, so one controller can be reused
//! across calls. Cancellation is polled, never preemptive: a stop request
//! takes effect at the next triangle boundary, so partial records or tokens
//! are never exposed to a sink.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::error::Error;


/// Relative delta of the range below which observer notifications are
/// suppressed. One percent by default.
pub const DEFAULT_NOTIFY_THRESHOLD: f64 = 0.01;

/// The observer side of a progress controller, typically implemented by a
/// telemetry or UI layer (progress bar, cancel button). Borrowed by the
/// controller for the duration of one codec call, never stored beyond it.
pub trait ProgressObserver {
    /// Called with the current progress in percent (0..=100). Guaranteed to
    /// be called at most once per threshold step.
    fn progress(&mut self, percent: u8);
}

impl<F: FnMut(u8)> ProgressObserver for F {
    fn progress(&mut self, percent: u8) {
        self(percent)
    }
}

/// Observable states of a [`ProgressController`].
///
/// Transitions: `Idle -> Active -> {Completed, Stopped}`; [`reset`] returns
/// to `Idle` from anywhere and clears a pending stop request.
///
/// [`reset`]: ProgressController::reset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressState {
    Idle,
    Active,
    Completed,
    Stopped,
}

/// A handle that allows requesting a stop from outside the running
/// operation, e.g. from a UI thread behind a cancel button.
#[derive(Debug, Clone)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Progress + cancellation contract used by every read/write operation.
///
/// The codec calls [`set_range`][Self::set_range] once at the start of an
/// operation and then polls [`check`][Self::check] at triangle granularity.
/// Values are mapped to a percentage of the range; an attached observer is
/// only notified when the value moved by at least the configured relative
/// threshold since the last notification.
pub struct ProgressController<'a> {
    observer: Option<&'a mut dyn ProgressObserver>,
    threshold: f64,
    state: ProgressState,
    range: (u64, u64),
    value: u64,
    last_notified: Option<u64>,
    stop: Arc<AtomicBool>,
}

impl<'a> ProgressController<'a> {
    /// A controller without an observer. Progress values are still tracked
    /// and stop requests are still honored.
    pub fn new() -> Self {
        Self {
            observer: None,
            threshold: DEFAULT_NOTIFY_THRESHOLD,
            state: ProgressState::Idle,
            range: (0, 0),
            value: 0,
            last_notified: None,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_observer(observer: &'a mut dyn ProgressObserver) -> Self {
        Self {
            observer: Some(observer),
            ..Self::new()
        }
    }

    /// Overrides the notification threshold (a fraction of the range,
    /// default 1%).
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn state(&self) -> ProgressState {
        self.state
    }

    /// Current value mapped into 0..=100.
    pub fn percent(&self) -> u8 {
        percentage(self.range.0, self.range.1, self.value)
    }

    /// Returns to `Idle` and clears any pending stop request.
    pub fn reset(&mut self) {
        self.state = ProgressState::Idle;
        self.range = (0, 0);
        self.value = 0;
        self.last_notified = None;
        self.stop.store(false, Ordering::Relaxed);
    }

    /// Starts a new operation over `min..=max`. Transitions to `Active`.
    pub fn set_range(&mut self, min: u64, max: u64) {
        self.state = ProgressState::Active;
        self.range = (min, max);
        self.value = min;
        self.last_notified = None;
    }

    /// Records the current value and notifies the observer if the value
    /// moved by at least the threshold since the last notification.
    pub fn set_value(&mut self, value: u64) {
        self.state = ProgressState::Active;
        self.value = value;

        let (min, max) = self.range;
        if max <= min {
            // Empty range: nothing meaningful to report.
            return;
        }

        let min_delta = (((max - min) as f64) * self.threshold).max(1.0) as u64;
        let moved = match self.last_notified {
            None => true,
            Some(last) => value.saturating_sub(last) >= min_delta || value >= max,
        };

        if moved {
            self.last_notified = Some(value);
            let percent = percentage(min, max, value);
            if let Some(observer) = &mut self.observer {
                observer.progress(percent);
            }
        }
    }

    /// Marks the operation as successfully finished, notifying 100%.
    pub fn complete(&mut self) {
        self.state = ProgressState::Completed;
        self.value = self.range.1;
        if let Some(observer) = &mut self.observer {
            observer.progress(100);
        }
    }

    /// May be called by any external observer at any time. Takes effect at
    /// the next triangle boundary of the running operation.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// A cloneable handle for cross-thread cancellation.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle { flag: Arc::clone(&self.stop) }
    }

    /// Cancellation checkpoint: fails with [`Error::Stopped`] if a stop was
    /// requested, transitioning to `Stopped`.
    pub(crate) fn poll_stop(&mut self) -> Result<(), Error> {
        if self.is_stop_requested() {
            self.state = ProgressState::Stopped;
            return Err(Error::Stopped);
        }
        Ok(())
    }

    /// `poll_stop` plus a progress update, the per-triangle/per-batch call
    /// used by the codecs.
    pub(crate) fn check(&mut self, value: u64) -> Result<(), Error> {
        self.poll_stop()?;
        self.set_value(value);
        Ok(())
    }
}

impl<'a> Default for ProgressController<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> std::fmt::Debug for ProgressController<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("ProgressController")
            .field("state", &self.state)
            .field("range", &self.range)
            .field("value", &self.value)
            .finish()
    }
}

fn percentage(min: u64, max: u64, value: u64) -> u8 {
    if value >= max {
        100
    } else if value <= min || min >= max {
        0
    } else {
        ((value - min).saturating_mul(100) / (max - min)) as u8
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_machine_transitions() {
        let mut ctrl = ProgressController::new();
        assert_eq!(ctrl.state(), ProgressState::Idle);

        ctrl.set_range(0, 10);
        assert_eq!(ctrl.state(), ProgressState::Active);

        ctrl.set_value(5);
        assert_eq!(ctrl.percent(), 50);

        ctrl.complete();
        assert_eq!(ctrl.state(), ProgressState::Completed);

        ctrl.reset();
        assert_eq!(ctrl.state(), ProgressState::Idle);
    }

    #[test]
    fn stop_request_survives_until_reset() {
        let mut ctrl = ProgressController::new();
        let handle = ctrl.stop_handle();
        handle.request_stop();

        assert!(ctrl.is_stop_requested());
        assert!(ctrl.poll_stop().unwrap_err().is_stopped());
        assert_eq!(ctrl.state(), ProgressState::Stopped);

        ctrl.reset();
        assert!(!ctrl.is_stop_requested());
        assert!(ctrl.poll_stop().is_ok());
    }

    #[test]
    fn observer_notifications_are_rate_limited() {
        let mut percents = Vec::new();
        {
            let mut obs = |p: u8| percents.push(p);
            let mut ctrl = ProgressController::with_observer(&mut obs);
            ctrl.set_range(0, 1000);
            for v in 0..=1000 {
                ctrl.set_value(v);
            }
        }
        // 1% threshold over 0..1000 means at most ~101 notifications.
        assert!(percents.len() <= 101, "got {} notifications", percents.len());
        assert_eq!(*percents.last().unwrap(), 100);
    }

    #[test]
    fn empty_range_reports_nothing() {
        let mut calls = 0u32;
        {
            let mut obs = |_p: u8| calls += 1;
            let mut ctrl = ProgressController::with_observer(&mut obs);
            ctrl.set_range(0, 0);
            ctrl.set_value(42);
        }
        assert_eq!(calls, 0);
    }
}
