use chrono::{DateTime, Duration, Utc};

/// Periodic save deadline, polled from the UI loop's timer tick.
///
/// A zero interval, or one that reaches past the representable date range,
/// creates a timer that never fires. Once cancelled the timer stays inert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutosaveTimer {
    interval: Duration,
    next_due: Option<DateTime<Utc>>,
}

impl AutosaveTimer {
    #[must_use]
    pub fn new(interval: std::time::Duration, now: DateTime<Utc>) -> Self {
        let interval = Duration::from_std(interval).unwrap_or(Duration::zero());
        let next_due = if interval > Duration::zero() {
            now.checked_add_signed(interval)
        } else {
            None
        };
        Self { interval, next_due }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    #[must_use]
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.next_due
    }

    /// Returns `true` when the deadline has passed, and schedules the next one.
    pub fn fire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = now.checked_add_signed(self.interval);
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }
}
