use chrono::{DateTime, FixedOffset, Local};

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of time for a session.
///
/// Wall-clock time stamps lines; the monotonic elapsed time drives timers.
pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;
    fn elapsed(&self) -> Duration;
}

#[derive(Debug, Clone)]
pub struct SystemClock {
    started: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let now = Local::now();
        now.with_timezone(now.offset())
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: DateTime<FixedOffset>,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new(base: DateTime<FixedOffset>) -> Self {
        Self {
            base,
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.base + chrono::Duration::milliseconds(self.offset.get().as_millis() as i64)
    }

    fn elapsed(&self) -> Duration {
        self.offset.get()
    }
}
