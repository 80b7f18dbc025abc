//! Time sources.
//!
//! The marker controller reads time only through [`Clock`], so timers and
//! scroll animations can be driven by a manual clock in tests.

use chrono::{DateTime, Utc};
use std::time::Instant;

/// A source of monotonic and wall-clock time.
pub trait Clock {
    /// Monotonic time used for timers and animations.
    fn now(&self) -> Instant;

    /// Wall-clock time used to close ongoing events.
    fn wall_time(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_time(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
pub use manual::ManualClock;

#[cfg(test)]
mod manual {
    use super::Clock;
    use chrono::{DateTime, TimeDelta, Utc};
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    /// A clock that only moves when told to. Clones share the same time.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        origin: Instant,
        wall_origin: DateTime<Utc>,
        elapsed: Rc<Cell<Duration>>,
    }

    impl ManualClock {
        /// Create a clock whose wall time starts at `epoch_seconds`.
        pub fn starting_at(epoch_seconds: i64) -> Self {
            Self {
                origin: Instant::now(),
                wall_origin: DateTime::from_timestamp(epoch_seconds, 0).unwrap(),
                elapsed: Rc::new(Cell::new(Duration::ZERO)),
            }
        }

        /// Move time forward.
        pub fn advance(&self, by: Duration) {
            self.elapsed.set(self.elapsed.get() + by);
        }

        /// Move time forward by `ms` milliseconds.
        pub fn advance_ms(&self, ms: u64) {
            self.advance(Duration::from_millis(ms));
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.origin + self.elapsed.get()
        }

        fn wall_time(&self) -> DateTime<Utc> {
            let elapsed = TimeDelta::from_std(self.elapsed.get()).unwrap();
            self.wall_origin + elapsed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::starting_at(1000);
        let shared = clock.clone();
        let start = clock.now();

        shared.advance_ms(1500);

        assert_eq!(clock.now() - start, std::time::Duration::from_millis(1500));
        assert_eq!(clock.wall_time().timestamp(), 1001);
    }
}
