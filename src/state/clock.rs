use std::sync::Mutex;

use time::{Date, OffsetDateTime};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> OffsetDateTime;

    /// Current UTC calendar date.
    fn today(&self) -> Date {
        self.now().date()
    }
}

/// Wall clock in UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Manually driven clock.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<OffsetDateTime>,
}

impl FixedClock {
    /// Clock frozen at `now`.
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Clock frozen at noon UTC on `date`.
    pub fn on(date: Date) -> Self {
        Self::new(date.midnight().assume_utc() + time::Duration::hours(12))
    }

    /// Move the clock to `now`.
    pub fn set(&self, now: OffsetDateTime) {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
