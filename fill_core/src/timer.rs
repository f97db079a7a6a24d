use std::sync::Arc;
use std::time::{Duration, Instant};

use fill_traits::Clock;

/// Stopwatch that fires once after a set duration; can be re-armed or
/// expired early. Timebase is a monotonic wall-clock substitute and need
/// not survive a process restart.
pub struct CountdownTimer {
    clock: Arc<dyn Clock + Send + Sync>,
    last_duration: Duration,
    t_end: Instant,
}

impl CountdownTimer {
    pub fn new(clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let now = clock.now();
        Self {
            clock,
            last_duration: Duration::ZERO,
            t_end: now,
        }
    }

    /// Records `t_end = now + duration`.
    pub fn start(&mut self, duration: Duration) {
        self.last_duration = duration;
        self.t_end = self.clock.now() + duration;
    }

    /// Re-arms with the most recently supplied duration.
    pub fn restart(&mut self) {
        self.t_end = self.clock.now() + self.last_duration;
    }

    /// True iff `now >= t_end`.
    pub fn expired(&self) -> bool {
        self.clock.now() >= self.t_end
    }

    /// Forces `t_end = now` so the next `expired` read is true.
    pub fn expire(&mut self) {
        self.t_end = self.clock.now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fill_traits::clock::test_clock::TestClock;

    fn clock() -> (Arc<TestClock>, Arc<dyn Clock + Send + Sync>) {
        let c = Arc::new(TestClock::new());
        let dyn_c: Arc<dyn Clock + Send + Sync> = c.clone();
        (c, dyn_c)
    }

    #[test]
    fn not_expired_before_duration_elapses() {
        let (tc, dyn_c) = clock();
        let mut timer = CountdownTimer::new(dyn_c);
        timer.start(Duration::from_millis(1000));
        tc.advance(Duration::from_millis(999));
        assert!(!timer.expired());
        tc.advance(Duration::from_millis(1));
        assert!(timer.expired());
    }

    #[test]
    fn restart_reuses_last_duration() {
        let (tc, dyn_c) = clock();
        let mut timer = CountdownTimer::new(dyn_c);
        timer.start(Duration::from_millis(500));
        tc.advance(Duration::from_millis(500));
        assert!(timer.expired());
        timer.restart();
        assert!(!timer.expired());
        tc.advance(Duration::from_millis(500));
        assert!(timer.expired());
    }

    #[test]
    fn expire_forces_immediate_expiry() {
        let (_tc, dyn_c) = clock();
        let mut timer = CountdownTimer::new(dyn_c);
        timer.start(Duration::from_secs(60));
        assert!(!timer.expired());
        timer.expire();
        assert!(timer.expired());
    }
}
