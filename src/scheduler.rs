//! Cooperative timers driven by the host event loop
//!
//! Nothing here spawns threads or sleeps. The host calls `poll` with the
//! current instant (typically from its frame or timer callback) and acts on
//! the answer. Bursts of requests coalesce: only the latest deadline counts.

use std::time::{Duration, Instant};
use tracing::trace;

/// Fires once after `delay` has passed without a new request
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, deadline: None }
    }

    /// Push the deadline out to `now + delay`
    pub fn request(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// True once when the deadline has passed
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// Decides when unsaved edits should be flushed: after the edit debounce, or
/// at the periodic interval, whichever comes first
#[derive(Debug, Clone)]
pub struct AutosaveScheduler {
    interval: Duration,
    debounce: Debouncer,
    dirty: bool,
    last_flush: Instant,
}

impl AutosaveScheduler {
    pub fn new(interval: Duration, debounce: Duration, now: Instant) -> Self {
        Self {
            interval,
            debounce: Debouncer::new(debounce),
            dirty: false,
            last_flush: now,
        }
    }

    /// A user edit: flush after the debounce unless more edits follow
    pub fn note_edit(&mut self, now: Instant) {
        self.dirty = true;
        self.debounce.request(now);
        trace!("Autosave debounce restarted");
    }

    /// Unsaved state that only needs the periodic flush
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// True when a flush is due
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.dirty {
            return false;
        }
        let debounced = self.debounce.poll(now);
        debounced || now.saturating_duration_since(self.last_flush) >= self.interval
    }

    /// Record a completed flush
    pub fn flushed(&mut self, now: Instant) {
        self.dirty = false;
        self.debounce.cancel();
        self.last_flush = now;
    }

    /// Forget unsaved state without flushing
    pub fn discard(&mut self) {
        self.dirty = false;
        self.debounce.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_debouncer_coalesces_bursts() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(ms(150));
        debouncer.request(start);
        debouncer.request(start + ms(100));

        assert!(!debouncer.poll(start + ms(200)));
        assert!(debouncer.poll(start + ms(250)));
        // Fires only once
        assert!(!debouncer.poll(start + ms(300)));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_autosave_after_edit_debounce() {
        let start = Instant::now();
        let mut autosave = AutosaveScheduler::new(ms(30_000), ms(1_000), start);
        assert!(!autosave.poll(start + ms(5_000)));

        autosave.note_edit(start + ms(5_000));
        autosave.note_edit(start + ms(5_500));
        assert!(!autosave.poll(start + ms(6_000)));
        assert!(autosave.poll(start + ms(6_500)));

        autosave.flushed(start + ms(6_500));
        assert!(!autosave.is_dirty());
        assert!(!autosave.poll(start + ms(60_000)));
    }

    #[test]
    fn test_autosave_periodic_flush() {
        let start = Instant::now();
        let mut autosave = AutosaveScheduler::new(ms(30_000), ms(1_000), start);
        autosave.mark_dirty();
        assert!(!autosave.poll(start + ms(29_999)));
        assert!(autosave.poll(start + ms(30_000)));
    }

    #[test]
    fn test_discard_drops_pending_flush() {
        let start = Instant::now();
        let mut autosave = AutosaveScheduler::new(ms(30_000), ms(1_000), start);
        autosave.note_edit(start);
        autosave.discard();
        assert!(!autosave.poll(start + ms(31_000)));
    }
}
