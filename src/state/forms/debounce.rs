//! Debounce policy for fragment writes
//!
//! Holds at most one pending write. Scheduling again pushes the deadline
//! out; the caller polls with the current instant and performs the write
//! when the policy says it is due. No timer primitive is involved.

use std::time::{Duration, Instant};

/// Default coalescing window for keystroke-driven writes
pub const DEFAULT_PERSIST_DELAY: Duration = Duration::from_millis(150);

#[derive(Debug, Clone)]
pub struct PersistScheduler {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Default for PersistScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_PERSIST_DELAY)
    }
}

impl PersistScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Queue a write, superseding any pending one
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Time left until the pending write is due
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Take the pending write if its deadline has passed
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Take the pending write regardless of its deadline
    pub fn flush(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_default_delay() {
        let start = Instant::now();
        let mut s = PersistScheduler::default();
        s.schedule(start);
        assert_eq!(s.time_until_due(start), Some(ms(150)));
    }

    #[test]
    fn test_poll_before_deadline_is_false() {
        let start = Instant::now();
        let mut s = PersistScheduler::new(ms(150));
        s.schedule(start);
        assert!(!s.poll(start + ms(149)));
        assert!(s.time_until_due(start + ms(149)).is_some());
        assert!(s.poll(start + ms(150)));
        assert_eq!(s.time_until_due(start + ms(150)), None);
    }

    #[test]
    fn test_newer_schedule_supersedes() {
        let start = Instant::now();
        let mut s = PersistScheduler::new(ms(150));
        s.schedule(start);
        s.schedule(start + ms(100));
        assert!(!s.poll(start + ms(200)));
        assert!(s.poll(start + ms(250)));
        assert!(!s.poll(start + ms(400)));
    }

    #[test]
    fn test_flush_and_cancel() {
        let start = Instant::now();
        let mut s = PersistScheduler::new(ms(150));
        assert!(!s.flush());
        s.schedule(start);
        assert!(s.flush());
        assert_eq!(s.time_until_due(start), None);
        s.schedule(start);
        s.cancel();
        assert!(!s.poll(start + ms(1000)));
    }

    #[test]
    fn test_time_until_due() {
        let start = Instant::now();
        let mut s = PersistScheduler::new(ms(150));
        assert_eq!(s.time_until_due(start), None);
        s.schedule(start);
        assert_eq!(s.time_until_due(start + ms(50)), Some(ms(100)));
        assert_eq!(s.time_until_due(start + ms(500)), Some(Duration::ZERO));
    }
}
