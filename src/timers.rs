//! Polled one-shot timers.

use std::time::{Duration, Instant};

/// A countdown timer polled against the monotonic clock.
///
/// Timers never deliver callbacks; their owners poll [`Timer::is_running`]
/// and [`Timer::has_expired`] from a clock routine. A timer with a zero
/// timeout can run but never expires.
#[derive(Copy, Clone, Debug)]
pub struct Timer {
    timeout: Duration,
    started: Option<Instant>,
}

impl Timer {
    /// Construct a stopped `Timer` with the given timeout in milliseconds.
    pub fn new(timeout_ms: u64) -> Timer {
        Timer {
            timeout: Duration::from_millis(timeout_ms),
            started: None,
        }
    }

    /// Replace the timeout, leaving the running state alone.
    pub fn set_timeout(&mut self, timeout_ms: u64) {
        self.timeout = Duration::from_millis(timeout_ms);
    }

    /// Start the timer, or restart it from now if already running.
    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Stop the timer.
    pub fn stop(&mut self) {
        self.started = None;
    }

    /// Whether the timer has been started and not yet stopped.
    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Whether a running timer's timeout has elapsed. Stopped and
    /// zero-timeout timers never expire.
    pub fn has_expired(&self) -> bool {
        match self.started {
            Some(start) => !self.timeout.is_zero() && start.elapsed() >= self.timeout,
            None => false,
        }
    }
}
