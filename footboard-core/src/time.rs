//! Millisecond timestamps and the clock trait.
//!
//! The firmware counts milliseconds in a `u32` that wraps after ~49.7 days,
//! so all arithmetic on [`Instant`] is wrapping.

use core::fmt;

/// A point in time, in milliseconds since an arbitrary epoch (usually boot).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Instant(u32);

impl Instant {
    pub const fn from_millis(ms: u32) -> Self {
        Self(ms)
    }

    pub const fn as_millis(self) -> u32 {
        self.0
    }

    /// Time elapsed from `earlier` to `self`, correct across one wrap of the counter.
    pub const fn duration_since(self, earlier: Instant) -> Duration {
        Duration(self.0.wrapping_sub(earlier.0))
    }

    pub const fn wrapping_add(self, d: Duration) -> Instant {
        Instant(self.0.wrapping_add(d.0))
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// A span of time in milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration(u32);

impl Duration {
    pub const fn from_millis(ms: u32) -> Self {
        Self(ms)
    }

    pub const fn as_millis(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Monotonic millisecond time source.
pub trait Clock {
    fn now(&self) -> Instant;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_since_handles_counter_wrap() {
        let before = Instant::from_millis(u32::MAX - 4);
        let after = before.wrapping_add(Duration::from_millis(10));
        assert_eq!(after.as_millis(), 5);
        assert_eq!(after.duration_since(before), Duration::from_millis(10));
    }
}
