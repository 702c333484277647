//! Single-slot timers driven by an explicit clock.
//!
//! Nothing here spawns timers; the host calls `poll` with the current
//! time from its own event loop.

use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
pub use std::time::Instant;
#[cfg(target_arch = "wasm32")]
pub use web_time::Instant;

/// At most one pending task with a deadline.
///
/// Scheduling again cancels the previous task.
#[derive(Debug, Clone)]
pub struct ScheduledTask<T> {
    slot: Option<(Instant, T)>,
}

impl<T> Default for ScheduledTask<T> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<T> ScheduledTask<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any pending task with `payload`, due at `deadline`.
    pub fn schedule(&mut self, deadline: Instant, payload: T) -> Option<T> {
        self.slot.replace((deadline, payload)).map(|(_, p)| p)
    }

    /// Cancel the pending task, returning its payload.
    pub fn cancel(&mut self) -> Option<T> {
        self.slot.take().map(|(_, p)| p)
    }

    pub fn is_pending(&self) -> bool {
        self.slot.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.slot.as_ref().map(|(deadline, _)| *deadline)
    }

    /// Take the payload if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match &self.slot {
            Some((deadline, _)) if now >= *deadline => self.cancel(),
            _ => None,
        }
    }
}

/// Trailing-edge debounce: fires once after `delay` of quiet.
#[derive(Debug, Clone)]
pub struct Debounce<T> {
    delay: Duration,
    task: ScheduledTask<T>,
}

impl<T> Debounce<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            task: ScheduledTask::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Restart the quiet period.
    pub fn trigger(&mut self, now: Instant, payload: T) {
        self.task.schedule(now + self.delay, payload);
    }

    /// Fire if the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        self.task.take_due(now)
    }

    /// Fire immediately, bypassing the timer.
    pub fn flush(&mut self) -> Option<T> {
        self.task.cancel()
    }

    /// Drop the pending payload without firing.
    pub fn cancel(&mut self) {
        self.task.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.task.is_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduled_task_due() {
        let start = Instant::now();
        let mut task = ScheduledTask::new();
        task.schedule(start + Duration::from_millis(100), "save");
        assert_eq!(task.take_due(start + Duration::from_millis(99)), None);
        assert_eq!(task.take_due(start + Duration::from_millis(100)), Some("save"));
        assert!(!task.is_pending());
    }

    #[test]
    fn test_schedule_replaces_previous() {
        let start = Instant::now();
        let mut task = ScheduledTask::new();
        assert_eq!(task.schedule(start, 1), None);
        assert_eq!(task.schedule(start + Duration::from_millis(5), 2), Some(1));
        assert_eq!(task.deadline(), Some(start + Duration::from_millis(5)));
        assert_eq!(task.cancel(), Some(2));
        assert_eq!(task.cancel(), None);
    }

    #[test]
    fn test_debounce_coalesces() {
        let start = Instant::now();
        let mut debounce = Debounce::new(Duration::from_millis(150));
        for i in 0..5u64 {
            debounce.trigger(start + Duration::from_millis(i * 50), i);
        }
        // Last trigger at 200ms, so nothing fires before 350ms.
        assert_eq!(debounce.poll(start + Duration::from_millis(340)), None);
        assert_eq!(debounce.poll(start + Duration::from_millis(350)), Some(4));
        assert_eq!(debounce.poll(start + Duration::from_millis(1000)), None);
    }

    #[test]
    fn test_debounce_flush() {
        let start = Instant::now();
        let mut debounce = Debounce::new(Duration::from_millis(150));
        debounce.trigger(start, 'a');
        assert!(debounce.is_pending());
        assert_eq!(debounce.flush(), Some('a'));
        assert_eq!(debounce.poll(start + Duration::from_secs(1)), None);
    }
}
