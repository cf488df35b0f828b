//! Deadline timers evaluated from a controller's `tick`

/// One-shot timer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeout {
    due: Option<u64>,
}

impl Timeout {
    pub fn start(&mut self, now: u64, delay_ms: u64) {
        self.due = Some(now.saturating_add(delay_ms));
    }

    pub fn cancel(&mut self) {
        self.due = None;
    }

    pub fn is_pending(&self) -> bool {
        self.due.is_some()
    }

    /// Returns true exactly once, when the deadline has passed
    pub fn fire(&mut self, now: u64) -> bool {
        match self.due {
            Some(due) if now >= due => {
                self.due = None;
                true
            }
            _ => false,
        }
    }
}

/// Repeating timer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Interval {
    period_ms: u64,
    next: Option<u64>,
}

impl Interval {
    pub fn start(&mut self, now: u64, period_ms: u64) {
        self.period_ms = period_ms.max(1);
        self.next = Some(now.saturating_add(self.period_ms));
    }

    pub fn stop(&mut self) {
        self.next = None;
    }

    pub fn is_running(&self) -> bool {
        self.next.is_some()
    }

    /// Returns true when at least one period elapsed. Missed periods collapse
    /// into a single firing.
    pub fn fire(&mut self, now: u64) -> bool {
        match self.next {
            Some(next) if now >= next => {
                let behind = (now - next) / self.period_ms;
                self.next = Some(next.saturating_add((behind + 1).saturating_mul(self.period_ms)));
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
    fn test_timeout_fires_once() {
        let mut t = Timeout::default();
        t.start(100, 200);
        assert!(!t.fire(299));
        assert!(t.fire(300));
        assert!(!t.fire(400));
        assert!(!t.is_pending());
    }

    #[test]
    fn test_timeout_cancel() {
        let mut t = Timeout::default();
        t.start(0, 10);
        t.cancel();
        assert!(!t.fire(100));
    }

    #[test]
    fn test_interval_collapses_missed_periods() {
        let mut i = Interval::default();
        i.start(0, 500);
        assert!(!i.fire(499));
        assert!(i.fire(500));
        assert!(i.fire(2_100));
        assert!(!i.fire(2_400));
        assert!(i.fire(2_500));
        i.stop();
        assert!(!i.fire(10_000));
    }

    #[test]
    fn test_huge_delays_never_fire() {
        let mut t = Timeout::default();
        t.start(1_700_000_000_000, u64::MAX);
        assert!(t.is_pending());
        assert!(!t.fire(1_700_000_000_000 + 3_600_000));

        let mut i = Interval::default();
        i.start(1_700_000_000_000, u64::MAX);
        assert!(!i.fire(1_700_000_000_000 + 3_600_000));
        assert!(i.fire(u64::MAX));
        assert!(i.is_running());
    }
}
