//! Clock abstraction for the presence wait.
//!
//! The controller never sleeps on its own: pauses are delegated to
//! [`ArmAdapter::pause`](crate::ArmAdapter::pause) and elapsed time is read
//! from a [`TimeSource`]. Implement the traits below over your HAL's timer
//! types (e.g. `embassy_time::Instant`, `std::time::Instant`).

/// Reads the current time.
pub trait TimeSource<I: TimeInstant> {
    /// Returns the current time instant.
    fn now(&self) -> I;
}

/// Span of time with millisecond resolution.
pub trait TimeDuration: Copy + PartialEq {
    /// Zero duration constant.
    const ZERO: Self;

    /// Whole milliseconds in this duration.
    fn as_millis(&self) -> u64;

    /// Creates a duration of `millis` milliseconds.
    fn from_millis(millis: u64) -> Self;

    /// Saturating subtraction (returns ZERO on underflow).
    fn saturating_sub(self, other: Self) -> Self;
}

/// Point in time read from a [`TimeSource`].
pub trait TimeInstant: Copy {
    /// Duration type for this instant.
    type Duration: TimeDuration;

    /// Time elapsed since an earlier instant.
    fn duration_since(&self, earlier: Self) -> Self::Duration;
}

/// Doubling poll interval for one presence wait, bounded by an optional
/// timeout.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Backoff<I: TimeInstant> {
    started: I,
    timeout: Option<I::Duration>,
    interval: u64,
    max_interval: u64,
}

impl<I: TimeInstant> Backoff<I> {
    pub(crate) fn new(
        started: I,
        first: I::Duration,
        max: I::Duration,
        timeout: Option<I::Duration>,
    ) -> Self {
        Self {
            started,
            timeout,
            interval: first.as_millis(),
            max_interval: max.as_millis(),
        }
    }

    /// Milliseconds to sleep before the next poll, or `None` once the
    /// timeout has run out. The last nap is cut short to end on the deadline.
    pub(crate) fn next_nap(&mut self, now: I) -> Option<u64> {
        let mut nap = self.interval;

        if let Some(timeout) = self.timeout {
            let remaining = timeout.saturating_sub(now.duration_since(self.started));
            if remaining == I::Duration::ZERO {
                return None;
            }
            nap = nap.min(remaining.as_millis());
        }

        self.interval = self.interval.saturating_mul(2).min(self.max_interval).max(1);
        Some(nap)
    }
}
