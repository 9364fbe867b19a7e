//! Cooperative stop conditions for an archive run.
//!
//! # Invariants
//! - Both conditions are polled between files only. A file that has started
//!   streaming is always finished (or aborted on a read failure), never cut.
//! - A clock that cannot report the time makes the budget unbounded; it is
//!   never an error.
//! - The time budget is soft: one large file can overrun it by that file's
//!   full transfer time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Soft wall-clock limit for one archive run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeBudget {
    /// No limit.
    #[default]
    Unbounded,
    /// Stop once this much time has elapsed since the run started.
    Limit(Duration),
}

impl TimeBudget {
    /// Interpret a seconds value the way the host does: anything that is not
    /// a positive, representable number means "no limit".
    pub fn from_secs_f64(secs: f64) -> Self {
        if !(secs.is_finite() && secs > 0.0) {
            return Self::Unbounded;
        }
        Duration::try_from_secs_f64(secs)
            .map(Self::Limit)
            .unwrap_or(Self::Unbounded)
    }

    /// True when `elapsed` is known and has reached the limit.
    pub fn is_exceeded(&self, elapsed: Option<Duration>) -> bool {
        match (self, elapsed) {
            (Self::Limit(limit), Some(elapsed)) => elapsed >= *limit,
            _ => false,
        }
    }
}

/// Source of the current time for budget checks.
pub trait Clock {
    /// Current instant, or `None` when the time is unavailable.
    fn now(&self) -> Option<Instant>;

    /// Time elapsed since `start`, or `None` when it cannot be measured.
    fn elapsed_since(&self, start: Option<Instant>) -> Option<Duration> {
        let start = start?;
        self.now()?.checked_duration_since(start)
    }
}

/// The process monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Option<Instant> {
        Some(Instant::now())
    }
}

/// External request to end a run early, polled once between files.
pub trait StopSignal {
    /// True to stop before the next file.
    fn should_stop(&self) -> bool;
}

impl<F> StopSignal for F
where
    F: Fn() -> bool,
{
    fn should_stop(&self) -> bool {
        self()
    }
}

/// A signal that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverStop;

impl StopSignal for NeverStop {
    fn should_stop(&self) -> bool {
        false
    }
}

/// Shared flag another thread (or a signal handler) can raise.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    /// Create a lowered flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. The run stops before its next file.
    pub fn raise(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// True once raised.
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl StopSignal for StopFlag {
    fn should_stop(&self) -> bool {
        self.is_raised()
    }
}
