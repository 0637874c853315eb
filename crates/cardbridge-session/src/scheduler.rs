//! Poll scheduling.
//!
//! A recurring timer drives the read-tag polls. The scheduler's only piece
//! of state is whether a poll is currently in flight: a tick that lands
//! while one is outstanding is skipped entirely. That skip is the
//! backpressure mechanism keeping at most one read command in flight, not
//! an optimization.

use std::time::Duration;

/// Tracks the poll cadence and the single in-flight poll slot.
///
/// # Examples
///
/// ```
/// use cardbridge_session::scheduler::PollScheduler;
/// use std::time::Duration;
///
/// let mut scheduler = PollScheduler::new(Duration::from_millis(1500));
/// assert!(scheduler.try_begin());
/// // A second tick while the first poll is outstanding is skipped.
/// assert!(!scheduler.try_begin());
///
/// scheduler.finish();
/// assert!(scheduler.try_begin());
/// ```
#[derive(Debug, Clone)]
pub struct PollScheduler {
    period: Duration,
    in_flight: bool,
}

impl PollScheduler {
    /// Create a scheduler with the given poll period.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            in_flight: false,
        }
    }

    /// The poll period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Claim the in-flight slot. Returns false if a poll is outstanding,
    /// in which case the current tick must be skipped.
    pub fn try_begin(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    /// Release the in-flight slot once the poll completed or failed.
    pub fn finish(&mut self) {
        self.in_flight = false;
    }

    /// Whether a poll is currently outstanding.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}
