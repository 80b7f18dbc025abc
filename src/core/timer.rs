//! Cancellable single-shot timers.
//!
//! A [`DeadlineTimer`] holds at most one pending deadline. Scheduling again
//! replaces the pending deadline, which is how debouncing is expressed. The
//! owner polls the timer from its update loop; nothing runs in the
//! background, so a cancelled or dropped timer can never fire late.

use std::time::{Duration, Instant};

/// A single-shot timer driven by explicit polling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeadlineTimer {
    deadline: Option<Instant>,
}

impl DeadlineTimer {
    /// Create an idle timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer to fire `delay` after `now`, replacing any pending deadline.
    pub fn schedule(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    /// Disarm the timer. Returns true if a deadline was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// Returns true if the timer is armed.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left until the deadline, or `None` when idle.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Fire the timer if its deadline has passed.
    ///
    /// Returns true exactly once per scheduled deadline.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_after_deadline() {
        let start = Instant::now();
        let mut timer = DeadlineTimer::new();
        timer.schedule(start, Duration::from_millis(150));

        assert!(!timer.fire(start + Duration::from_millis(149)));
        assert!(timer.fire(start + Duration::from_millis(150)));
        assert!(!timer.fire(start + Duration::from_millis(400)));
        assert!(!timer.is_pending());
    }

    #[test]
    fn test_reschedule_replaces_deadline() {
        let start = Instant::now();
        let mut timer = DeadlineTimer::new();
        timer.schedule(start, Duration::from_millis(150));
        timer.schedule(start + Duration::from_millis(100), Duration::from_millis(150));

        assert!(!timer.fire(start + Duration::from_millis(200)));
        assert!(timer.fire(start + Duration::from_millis(250)));
    }

    #[test]
    fn test_cancel() {
        let start = Instant::now();
        let mut timer = DeadlineTimer::new();
        assert!(!timer.cancel());

        timer.schedule(start, Duration::from_millis(10));
        assert!(timer.cancel());
        assert!(!timer.fire(start + Duration::from_secs(1)));
    }

    #[test]
    fn test_remaining() {
        let start = Instant::now();
        let mut timer = DeadlineTimer::new();
        assert_eq!(timer.remaining(start), None);

        timer.schedule(start, Duration::from_millis(150));
        assert_eq!(
            timer.remaining(start + Duration::from_millis(50)),
            Some(Duration::from_millis(100))
        );
        assert_eq!(
            timer.remaining(start + Duration::from_secs(1)),
            Some(Duration::ZERO)
        );
    }
}
