//! Repeating interval timer
//!
//! Stands in for a host `setInterval`: the owner feeds it wall-clock time
//! and it reports how many intervals elapsed. Cancelling is synchronous, so
//! no fire can arrive after `cancel` returns.

#[derive(Debug, Clone, Default)]
pub struct IntervalTimer {
    interval_ms: f32,
    elapsed_ms: f32,
    active: bool,
}

impl IntervalTimer {
    /// (Re)start from zero; any previous schedule is dropped
    pub fn start(&mut self, interval_ms: f32) {
        self.interval_ms = interval_ms;
        self.elapsed_ms = 0.0;
        self.active = interval_ms > 0.0;
        if !self.active {
            log::warn!("Ignoring interval timer with non-positive period {interval_ms}");
        }
    }

    pub fn cancel(&mut self) {
        self.active = false;
        self.elapsed_ms = 0.0;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Advance by `dt_ms`, returning the number of intervals that completed
    pub fn advance(&mut self, dt_ms: f32) -> u32 {
        if !self.active || dt_ms <= 0.0 {
            return 0;
        }
        self.elapsed_ms += dt_ms;

        let mut fired = 0;
        while self.elapsed_ms >= self.interval_ms {
            self.elapsed_ms -= self.interval_ms;
            fired += 1;
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_per_interval() {
        let mut timer = IntervalTimer::default();
        timer.start(1000.0);
        assert_eq!(timer.advance(400.0), 0);
        assert_eq!(timer.advance(600.0), 1);
        assert_eq!(timer.advance(2500.0), 2);
        assert_eq!(timer.advance(500.0), 1);
    }

    #[test]
    fn test_cancel_stops_fires() {
        let mut timer = IntervalTimer::default();
        timer.start(100.0);
        timer.advance(90.0);
        timer.cancel();
        assert!(!timer.is_active());
        assert_eq!(timer.advance(1000.0), 0);
    }

    #[test]
    fn test_restart_discards_progress() {
        let mut timer = IntervalTimer::default();
        timer.start(100.0);
        timer.advance(90.0);
        timer.start(100.0);
        assert_eq!(timer.advance(20.0), 0);
    }

    #[test]
    fn test_inactive_by_default() {
        let mut timer = IntervalTimer::default();
        assert!(!timer.is_active());
        assert_eq!(timer.advance(1e6), 0);
    }
}
