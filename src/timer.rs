//! Deadlines for bounded waits on engine output.

use std::time::{Duration, Instant};

/// Calculate the duration from now until a deadline, if the deadline is in the future.
///
/// Returns `None` if the deadline has already passed.
#[inline]
fn duration_until(deadline: Instant) -> Option<Duration> {
    let now = Instant::now();
    if deadline > now {
        Some(deadline - now)
    } else {
        None
    }
}

/// A fixed point in time after which a wait is abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    start: Instant,
    at: Instant,
}

impl Deadline {
    /// A deadline `duration` from now.
    #[must_use]
    pub fn after(duration: Duration) -> Self {
        let start = Instant::now();
        let at = start.checked_add(duration).unwrap_or(start + Duration::from_secs(86_400));
        Deadline { start, at }
    }

    /// Time left before expiry, or `None` once expired.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        duration_until(self.at)
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining().is_none()
    }

    /// Time elapsed since the deadline was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Total length of the wait.
    #[must_use]
    pub fn budget(&self) -> Duration {
        self.at - self.start
    }
}
