//! Modification clock
//!
//! Every mutation of a tracked object records a fresh tick from a single
//! process-wide counter. Two stamps taken anywhere in the process are
//! therefore totally ordered, and "has X changed since Y was computed"
//! becomes `x.modified_time() > y_time`.
//!
//! The clock is a logical counter, not wall time.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

static GLOBAL_CLOCK: ModificationClock = ModificationClock::new();

/// Monotonic tick source
pub struct ModificationClock {
    ticks: AtomicU64,
}

impl ModificationClock {
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
        }
    }

    /// The process-wide clock shared by all tracked objects
    #[inline]
    pub fn global() -> &'static ModificationClock {
        &GLOBAL_CLOCK
    }

    /// Advance the clock and return the new tick (never 0)
    #[inline]
    pub fn tick(&self) -> TimeStamp {
        TimeStamp(self.ticks.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Latest tick handed out so far
    #[inline]
    pub fn current(&self) -> TimeStamp {
        TimeStamp(self.ticks.load(Ordering::Relaxed))
    }
}

impl Default for ModificationClock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ModificationClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModificationClock")
            .field("ticks", &self.ticks.load(Ordering::Relaxed))
            .finish()
    }
}

/// A point on the global modification clock
///
/// `TimeStamp::NEVER` is older than every tick the clock can produce.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeStamp(u64);

impl TimeStamp {
    /// Older than any recorded modification
    pub const NEVER: Self = Self(0);

    /// Take a fresh tick from the global clock
    #[inline]
    pub fn now() -> Self {
        ModificationClock::global().tick()
    }

    /// Record a modification: move this stamp to a fresh tick
    #[inline]
    pub fn modified(&mut self) {
        *self = Self::now();
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_never(self) -> bool {
        self.0 == 0
    }

    /// True if this stamp is strictly newer than `other`
    #[inline]
    pub fn is_newer_than(self, other: TimeStamp) -> bool {
        self.0 > other.0
    }
}

impl fmt::Display for TimeStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_never() {
            write!(f, "never")
        } else {
            write!(f, "t{}", self.0)
        }
    }
}
