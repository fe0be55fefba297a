//! 20 TPS pacing with catch-up.
//!
//! The loop accumulates wall-clock time into a debt counter and runs one
//! tick per 50 ms owed. More than two seconds of debt is clamped: the
//! server logs how many ticks it is skipping instead of spiraling.

use std::time::{Duration, Instant};

use tracing::warn;

pub const MS_PER_TICK: u64 = 50;
const MAX_CATCHUP_MS: u64 = 2000;

pub struct TickTimer {
    last: Instant,
    debt_ms: u64,
}

impl TickTimer {
    pub fn new(now: Instant) -> Self {
        Self { last: now, debt_ms: 0 }
    }

    /// Account the time since the last call and return how many ticks are
    /// now due. A monotonic clock cannot run backwards; a wakeup earlier
    /// than `last` (clock weirdness) counts as zero elapsed.
    pub fn due_ticks(&mut self, now: Instant) -> u64 {
        let mut elapsed = now
            .checked_duration_since(self.last)
            .unwrap_or(Duration::ZERO)
            .as_millis() as u64;
        if elapsed > MAX_CATCHUP_MS {
            let skipped = (elapsed - MAX_CATCHUP_MS) / MS_PER_TICK;
            warn!(
                "Can't keep up! Did the system time change, or is the server overloaded? \
                 Skipping {skipped} tick(s)"
            );
            elapsed = MAX_CATCHUP_MS;
        }
        self.last = now;
        self.debt_ms += elapsed;
        let ticks = self.debt_ms / MS_PER_TICK;
        self.debt_ms %= MS_PER_TICK;
        ticks
    }

    /// When the next tick becomes due.
    pub fn next_deadline(&self) -> Instant {
        self.last + Duration::from_millis(MS_PER_TICK - self.debt_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_cadence() {
        let t0 = Instant::now();
        let mut timer = TickTimer::new(t0);
        assert_eq!(timer.due_ticks(t0 + Duration::from_millis(50)), 1);
        assert_eq!(timer.due_ticks(t0 + Duration::from_millis(100)), 1);
    }

    #[test]
    fn debt_accumulates_across_short_wakeups() {
        let t0 = Instant::now();
        let mut timer = TickTimer::new(t0);
        assert_eq!(timer.due_ticks(t0 + Duration::from_millis(30)), 0);
        assert_eq!(timer.due_ticks(t0 + Duration::from_millis(60)), 1);
        // 10 ms of debt remain; 40 more close the next tick.
        assert_eq!(timer.due_ticks(t0 + Duration::from_millis(100)), 1);
    }

    #[test]
    fn late_wakeup_catches_up() {
        let t0 = Instant::now();
        let mut timer = TickTimer::new(t0);
        assert_eq!(timer.due_ticks(t0 + Duration::from_millis(275)), 5);
        // 25 ms debt: one more tick 25 ms later.
        assert_eq!(timer.due_ticks(t0 + Duration::from_millis(300)), 1);
    }

    #[test]
    fn overload_clamps_to_forty_ticks() {
        let t0 = Instant::now();
        let mut timer = TickTimer::new(t0);
        assert_eq!(timer.due_ticks(t0 + Duration::from_secs(60)), 40);
        // The excess was dropped, not deferred.
        assert_eq!(timer.due_ticks(t0 + Duration::from_secs(60)), 0);
    }

    #[test]
    fn ten_simulated_seconds_is_two_hundred_ticks() {
        let t0 = Instant::now();
        let mut timer = TickTimer::new(t0);
        let mut ticks = 0u64;
        // Wake every 47 ms, an awkward non-multiple of the tick length.
        let mut now = t0;
        while now < t0 + Duration::from_secs(10) {
            now += Duration::from_millis(47);
            ticks += timer.due_ticks(now);
        }
        assert!((198..=202).contains(&ticks), "got {ticks}");
    }

    #[test]
    fn deadline_accounts_for_debt() {
        let t0 = Instant::now();
        let mut timer = TickTimer::new(t0);
        timer.due_ticks(t0 + Duration::from_millis(70)); // 20 ms debt
        assert_eq!(
            timer.next_deadline(),
            t0 + Duration::from_millis(70) + Duration::from_millis(30)
        );
    }
}
