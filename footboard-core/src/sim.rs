//! Simulation doubles: a virtual clock, scripted pins and a recording HID sink.
//!
//! Time only moves when something sleeps on a [`SimDelay`] or calls
//! [`SimClock::advance`], so timing-dependent behaviour can be checked
//! without wall-clock waits. Clones share state: keep a clone of a pin or
//! of the clock to drive it from outside the footboard.

use core::fmt;
use std::cell::Cell;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorType, InputPin};

use crate::hid::{HardwareFault, HidSink, MouseButton};
use crate::keycode::Keycode;
use crate::report::KeyboardReport;
use crate::time::{Clock, Duration, Instant};

#[derive(Clone, Debug, Default)]
pub struct SimClock {
    now: Rc<Cell<u32>>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get().wrapping_add(by.as_millis()));
    }

    /// A delay that advances this clock.
    pub fn delay(&self) -> SimDelay {
        SimDelay {
            clock: self.clone(),
            pending_ns: 0,
        }
    }
}

impl Clock for SimClock {
    fn now(&self) -> Instant {
        Instant::from_millis(self.now.get())
    }
}

/// Sleeping advances the shared [`SimClock`]. Sub-millisecond sleeps
/// accumulate until they add up to a whole millisecond.
#[derive(Clone, Debug)]
pub struct SimDelay {
    clock: SimClock,
    pending_ns: u32,
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        let total = u64::from(self.pending_ns) + u64::from(ns);
        let ms = (total / 1_000_000) as u32;
        self.pending_ns = (total % 1_000_000) as u32;
        self.clock.advance(Duration::from_millis(ms));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.advance(Duration::from_millis(ms));
    }
}

/// Error returned by a [`SimPin`] told to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimPinFault;

impl digital::Error for SimPinFault {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

/// A pin whose level is set by the test.
#[derive(Clone, Debug)]
pub struct SimPin {
    level: Rc<Cell<bool>>,
    fail_next: Rc<Cell<bool>>,
}

impl SimPin {
    pub fn new(level: bool) -> Self {
        Self {
            level: Rc::new(Cell::new(level)),
            fail_next: Rc::new(Cell::new(false)),
        }
    }

    pub fn set(&self, level: bool) {
        self.level.set(level);
    }

    pub fn set_high(&self) {
        self.set(true);
    }

    pub fn set_low(&self) {
        self.set(false);
    }

    /// Make the next read return an error.
    pub fn fail_next_read(&self) {
        self.fail_next.set(true);
    }
}

impl ErrorType for SimPin {
    type Error = SimPinFault;
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        if self.fail_next.replace(false) {
            return Err(SimPinFault);
        }
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HidEventKind {
    MouseClick(MouseButton),
    KeyDown(Keycode),
    KeyUp(Keycode),
}

/// One operation seen by a [`RecordingHid`], stamped with the virtual time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HidEvent {
    pub at: Instant,
    pub kind: HidEventKind,
}

impl HidEvent {
    pub fn click(ms: u32, button: MouseButton) -> Self {
        Self {
            at: Instant::from_millis(ms),
            kind: HidEventKind::MouseClick(button),
        }
    }

    pub fn key_down(ms: u32, key: Keycode) -> Self {
        Self {
            at: Instant::from_millis(ms),
            kind: HidEventKind::KeyDown(key),
        }
    }

    pub fn key_up(ms: u32, key: Keycode) -> Self {
        Self {
            at: Instant::from_millis(ms),
            kind: HidEventKind::KeyUp(key),
        }
    }

    pub fn is_click(&self, button: MouseButton) -> bool {
        self.kind == HidEventKind::MouseClick(button)
    }
}

impl fmt::Display for HidEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6}ms  ", self.at.as_millis())?;
        match self.kind {
            HidEventKind::MouseClick(button) => write!(f, "mouse {} click", button),
            HidEventKind::KeyDown(key) => write!(f, "key down {}", key),
            HidEventKind::KeyUp(key) => write!(f, "key up {}", key),
        }
    }
}

/// Records every HID operation with its timestamp and tracks held keys.
#[derive(Debug)]
pub struct RecordingHid {
    clock: SimClock,
    events: Vec<HidEvent>,
    keyboard: KeyboardReport,
    available: bool,
    remaining_ok: Option<usize>,
}

impl RecordingHid {
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            events: Vec::new(),
            keyboard: KeyboardReport::empty(),
            available: true,
            remaining_ok: None,
        }
    }

    pub fn events(&self) -> &[HidEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<HidEvent> {
        core::mem::take(&mut self.events)
    }

    pub fn is_key_down(&self, key: Keycode) -> bool {
        self.keyboard.is_down(key)
    }

    /// While unavailable every operation fails with [`HardwareFault::HidUnavailable`].
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Let `n` more operations succeed, then become unavailable.
    pub fn fail_after(&mut self, n: usize) {
        self.remaining_ok = Some(n);
    }

    fn record(&mut self, kind: HidEventKind) -> Result<(), HardwareFault> {
        if !self.available {
            return Err(HardwareFault::HidUnavailable);
        }
        if let Some(remaining) = self.remaining_ok.as_mut() {
            if *remaining == 0 {
                return Err(HardwareFault::HidUnavailable);
            }
            *remaining -= 1;
        }
        self.events.push(HidEvent {
            at: self.clock.now(),
            kind,
        });
        Ok(())
    }
}

impl HidSink for RecordingHid {
    fn mouse_click(&mut self, button: MouseButton) -> Result<(), HardwareFault> {
        self.record(HidEventKind::MouseClick(button))
    }

    fn key_press(&mut self, key: Keycode) -> Result<(), HardwareFault> {
        self.record(HidEventKind::KeyDown(key))?;
        self.keyboard.press(key);
        Ok(())
    }

    fn key_release(&mut self, key: Keycode) -> Result<(), HardwareFault> {
        self.record(HidEventKind::KeyUp(key))?;
        self.keyboard.release(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_advances_shared_clock() {
        let clock = SimClock::new();
        let mut delay = clock.delay();
        delay.delay_ms(25);
        delay.delay_us(1500);
        assert_eq!(clock.now(), Instant::from_millis(26));
        delay.delay_us(500);
        assert_eq!(clock.now(), Instant::from_millis(27));
    }

    #[test]
    fn pin_clones_share_level() {
        let pin = SimPin::new(true);
        let mut reader = pin.clone();
        pin.set_low();
        assert_eq!(reader.is_high(), Ok(false));
        pin.fail_next_read();
        assert_eq!(reader.is_high(), Err(SimPinFault));
        assert_eq!(reader.is_low(), Ok(true));
    }
}
