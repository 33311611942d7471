/// Bonus countdown and the clock it reads.
///
/// The timer stores a wall-clock deadline. While the game is paused or
/// finished the deadline is pushed forward every frame
/// (`deadline = now + remaining`), so time spent paused is never counted
/// and the countdown resumes from the frozen value.

#[cfg(test)]
use std::cell::Cell;
#[cfg(test)]
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of "now" in epoch milliseconds. Injected so tests control time.
pub trait Clock {
    fn now_millis(&self) -> u64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Hand-driven clock. Clones share the same time.
#[cfg(test)]
#[derive(Clone, Debug, Default)]
pub struct ManualClock(Rc<Cell<u64>>);

#[cfg(test)]
impl ManualClock {
    pub fn new(start: u64) -> Self {
        ManualClock(Rc::new(Cell::new(start)))
    }

    pub fn advance(&self, millis: u64) {
        self.0.set(self.0.get() + millis);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.0.get()
    }
}

#[derive(Clone, Debug)]
pub struct BonusTimer {
    deadline: u64,
    remaining_secs: u64,
    seconds: u64,
}

impl BonusTimer {
    /// Arm for `seconds`. One extra second of grace makes the first
    /// displayed value equal `seconds` rather than `seconds - 1`; the
    /// display never shows more than `seconds`.
    pub fn start(now: u64, seconds: u64) -> Self {
        BonusTimer {
            deadline: now.saturating_add(seconds.saturating_add(1).saturating_mul(1000)),
            remaining_secs: seconds,
            seconds,
        }
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    /// Recompute from the clock. When `frozen`, the remaining value is
    /// kept and the deadline slides forward instead.
    /// Returns the new remaining seconds.
    pub fn tick(&mut self, now: u64, frozen: bool) -> u64 {
        if frozen {
            self.deadline = now.saturating_add(self.remaining_secs.saturating_mul(1000));
        } else {
            self.remaining_secs = (self.deadline.saturating_sub(now) / 1000).min(self.seconds);
        }
        self.remaining_secs
    }
}
