//! Virtual simulation clock implementing `VilleClock`.

use chrono::{Duration, NaiveDateTime};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use ville_env::{parse_stamp, EnvError, VilleClock};

/// Simulated clock that only moves when told to.
///
/// Clones share the same elapsed time, so the scheduler and the task
/// injector always observe one timeline.
#[derive(Debug, Clone)]
pub struct SimClock {
    /// Simulated time at construction
    start: NaiveDateTime,

    /// Minutes elapsed since `start`
    elapsed_minutes: Arc<AtomicI64>,
}

impl SimClock {
    /// Creates a clock starting at `start`.
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            start,
            elapsed_minutes: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Creates a clock from a `%Y%m%d-%H:%M` stamp.
    pub fn from_stamp(stamp: &str) -> Result<Self, EnvError> {
        parse_stamp(stamp).map(Self::new)
    }

    /// Simulated time the clock was created at.
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Minutes advanced so far.
    pub fn elapsed_minutes(&self) -> i64 {
        self.elapsed_minutes.load(Ordering::SeqCst)
    }
}

impl VilleClock for SimClock {
    fn now(&self) -> NaiveDateTime {
        self.start + Duration::minutes(self.elapsed_minutes())
    }

    fn forward(&self, minutes: i64) {
        self.elapsed_minutes.fetch_add(minutes, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_advances_time() {
        let clock = SimClock::from_stamp("20240213-09:30").unwrap();
        assert_eq!(clock.stamp(), "20240213-09:30");

        clock.forward(10);
        assert_eq!(clock.stamp(), "20240213-09:40");
        assert_eq!(clock.elapsed_minutes(), 10);
    }

    #[test]
    fn test_clones_share_time() {
        let clock = SimClock::from_stamp("20240213-23:55").unwrap();
        let shared = clock.clone();

        shared.forward(10);
        assert_eq!(clock.stamp(), "20240214-00:05");
        assert_eq!(clock.date("%m月%d日 %H:%M"), "02月14日 00:05");
    }

    #[test]
    fn test_bad_stamp_is_rejected() {
        assert!(SimClock::from_stamp("09:30").is_err());
    }
}
