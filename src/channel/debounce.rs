use std::time::Duration;
use tokio::time::Instant;

/// Default quiet interval before a filter change triggers a refresh.
pub const DEFAULT_FILTER_QUIET: Duration = Duration::from_millis(100);

/// Coalesces rapid filter edits into one delayed refresh.
///
/// Each edit cancels the pending fire and schedules a new one `quiet` later.
/// Only the most recent value is kept.
#[derive(Debug)]
pub struct FilterDebouncer {
    quiet: Duration,
    deadline: Option<Instant>,
    pending: Option<String>,
}

impl FilterDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
            pending: None,
        }
    }

    /// Record an edit and push the deadline out.
    pub fn on_change(&mut self, value: String, now: Instant) {
        self.pending = Some(value);
        self.deadline = Some(now + self.quiet);
    }

    /// When the pending refresh is due, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Take the pending value once its deadline has passed.
    pub fn fire(&mut self, now: Instant) -> Option<String> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }

    /// Drop any scheduled refresh without firing it.
    pub fn cancel(&mut self) {
        self.deadline = None;
        self.pending = None;
    }
}

impl Default for FilterDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_FILTER_QUIET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_pending_initially() {
        let mut debouncer = FilterDebouncer::default();
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.fire(Instant::now()), None);
    }

    #[test]
    fn test_fires_once_after_quiet_interval() {
        let start = Instant::now();
        let mut debouncer = FilterDebouncer::default();
        debouncer.on_change("a".into(), start);

        assert_eq!(debouncer.fire(start + Duration::from_millis(99)), None);
        assert_eq!(
            debouncer.fire(start + Duration::from_millis(100)),
            Some("a".to_string())
        );
        assert_eq!(debouncer.fire(start + Duration::from_millis(500)), None);
    }

    #[test]
    fn test_burst_collapses_to_last_value() {
        let start = Instant::now();
        let mut debouncer = FilterDebouncer::default();
        for (i, value) in ["r", "ru", "rus", "rust"].iter().enumerate() {
            debouncer.on_change(value.to_string(), start + Duration::from_millis(30 * i as u64));
        }

        // Last edit at +90ms pushes the deadline to +190ms.
        assert_eq!(debouncer.fire(start + Duration::from_millis(150)), None);
        assert_eq!(
            debouncer.fire(start + Duration::from_millis(190)),
            Some("rust".to_string())
        );
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_cancel_drops_pending() {
        let start = Instant::now();
        let mut debouncer = FilterDebouncer::default();
        debouncer.on_change("x".into(), start);
        debouncer.cancel();
        assert_eq!(debouncer.fire(start + Duration::from_secs(1)), None);
    }
}
