//! Shared cancellation flag for the auto-play loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::timer::Deadline;

/// Longest single nap taken while waiting on a flag.
const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// A thread-safe stop flag.
///
/// Clones share the same state: the GUI thread keeps one clone and calls
/// [`StopFlag::stop`], the play loop polls another.
#[derive(Clone, Debug)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    #[must_use]
    pub fn new() -> Self {
        StopFlag(Arc::new(AtomicBool::new(false)))
    }

    #[inline]
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    /// Sleep for `duration`, waking early if the flag is set.
    ///
    /// Returns `true` if the full duration elapsed without a stop request.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Deadline::after(duration);
        while let Some(left) = deadline.remaining() {
            if self.is_stopped() {
                return false;
            }
            thread::sleep(left.min(SLEEP_SLICE));
        }
        !self.is_stopped()
    }
}

impl Default for StopFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_stop_flag_lifecycle() {
        let flag = StopFlag::new();
        assert!(!flag.is_stopped());

        flag.stop();
        assert!(flag.is_stopped());

        flag.reset();
        assert!(!flag.is_stopped());
    }

    #[test]
    fn test_stop_flag_clone_shares_state() {
        let flag1 = StopFlag::new();
        let flag2 = flag1.clone();

        flag1.stop();
        assert!(flag2.is_stopped());
    }

    #[test]
    fn test_sleep_completes_when_not_stopped() {
        let flag = StopFlag::new();
        assert!(flag.sleep(Duration::from_millis(20)));
    }

    #[test]
    fn test_sleep_wakes_on_stop() {
        let flag = StopFlag::new();
        let other = flag.clone();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            other.stop();
        });

        let start = Instant::now();
        assert!(!flag.sleep(Duration::from_secs(5)));
        assert!(start.elapsed() < Duration::from_secs(2));
        stopper.join().unwrap();
    }
}
