//! Input channels: a debounced pin with a role and a wiring polarity.
//!
//! Downstream code reasons about "pressed" and "released", never about
//! line levels. With pull-up wiring the line idles high and a press pulls it
//! low, so a falling edge is a press; active-high wiring is the reverse.

use core::fmt;

use embedded_hal::digital::InputPin;

use crate::debounce::Debouncer;
use crate::hid::HardwareFault;
use crate::time::{Duration, Instant};

/// Which button a channel is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    A,
    B,
    C,
}

impl Role {
    pub fn name(self) -> &'static str {
        match self {
            Role::A => "A",
            Role::B => "B",
            Role::C => "C",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Line level that means "pressed".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Polarity {
    /// Pull-up wiring, switch to ground: low = pressed.
    ActiveLow,
    /// Pull-down wiring, switch to supply: high = pressed.
    ActiveHigh,
}

impl Polarity {
    /// The raw line level while the button is pressed.
    pub fn pressed_level(self) -> bool {
        matches!(self, Polarity::ActiveHigh)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Pressed,
    Released,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Edge::Pressed => "pressed",
            Edge::Released => "released",
        })
    }
}

pub struct InputChannel<P> {
    role: Role,
    polarity: Polarity,
    pin: P,
    debouncer: Debouncer,
}

impl<P: InputPin> InputChannel<P> {
    /// The debouncer starts at the released level so an idle button emits nothing.
    pub fn new(role: Role, polarity: Polarity, pin: P, now: Instant, stable_for: Duration) -> Self {
        Self {
            role,
            polarity,
            pin,
            debouncer: Debouncer::new(!polarity.pressed_level(), now, stable_for),
        }
    }

    /// Sample the pin and debounce it.
    ///
    /// A failed read leaves the debounce state untouched and clears this
    /// tick's edges.
    pub fn poll(&mut self, now: Instant) -> Result<(), HardwareFault> {
        match self.pin.is_high() {
            Ok(raw) => {
                self.update(raw, now);
                Ok(())
            }
            Err(_) => {
                self.debouncer.clear_edges();
                Err(HardwareFault::PinRead)
            }
        }
    }
}

impl<P> InputChannel<P> {
    /// Debounce an already-sampled raw level.
    pub fn update(&mut self, raw: bool, now: Instant) {
        self.debouncer.update(raw, now);
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_pressed_edge(&self) -> bool {
        match self.polarity {
            Polarity::ActiveLow => self.debouncer.fell(),
            Polarity::ActiveHigh => self.debouncer.rose(),
        }
    }

    pub fn is_released_edge(&self) -> bool {
        match self.polarity {
            Polarity::ActiveLow => self.debouncer.rose(),
            Polarity::ActiveHigh => self.debouncer.fell(),
        }
    }

    /// This tick's edge, if any. Never both: the debouncer emits one per update.
    pub fn edge(&self) -> Option<Edge> {
        if self.is_pressed_edge() {
            Some(Edge::Pressed)
        } else if self.is_released_edge() {
            Some(Edge::Released)
        } else {
            None
        }
    }

    /// Current debounced state.
    pub fn is_pressed(&self) -> bool {
        self.debouncer.stable_value() == self.polarity.pressed_level()
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimPin;

    const STABLE: Duration = Duration::from_millis(10);

    fn at(ms: u32) -> Instant {
        Instant::from_millis(ms)
    }

    fn settle<P>(ch: &mut InputChannel<P>, raw: bool, from: u32) -> Option<Edge> {
        ch.update(raw, at(from));
        ch.update(raw, at(from + 10));
        ch.edge()
    }

    #[test]
    fn active_low_fall_is_press() {
        let pin = SimPin::new(true);
        let mut ch = InputChannel::new(Role::A, Polarity::ActiveLow, pin, at(0), STABLE);
        assert!(!ch.is_pressed());

        assert_eq!(settle(&mut ch, false, 10), Some(Edge::Pressed));
        assert!(ch.debouncer().fell());
        assert!(ch.is_pressed_edge());
        assert!(!ch.is_released_edge());
        assert!(ch.is_pressed());

        assert_eq!(settle(&mut ch, true, 30), Some(Edge::Released));
        assert!(ch.debouncer().rose());
        assert!(!ch.is_pressed());
    }

    #[test]
    fn active_high_rise_is_press() {
        let pin = SimPin::new(false);
        let mut ch = InputChannel::new(Role::B, Polarity::ActiveHigh, pin, at(0), STABLE);

        assert_eq!(settle(&mut ch, true, 10), Some(Edge::Pressed));
        assert!(ch.debouncer().rose());
        assert_eq!(settle(&mut ch, false, 30), Some(Edge::Released));
        assert!(ch.debouncer().fell());
    }

    #[test]
    fn poll_reads_the_pin() {
        let pin = SimPin::new(true);
        let mut ch = InputChannel::new(Role::A, Polarity::ActiveLow, pin.clone(), at(0), STABLE);

        pin.set_low();
        ch.poll(at(10)).unwrap();
        ch.poll(at(20)).unwrap();
        assert_eq!(ch.edge(), Some(Edge::Pressed));
    }

    #[test]
    fn failed_read_clears_edges_and_reports_fault() {
        let pin = SimPin::new(true);
        let mut ch = InputChannel::new(Role::A, Polarity::ActiveLow, pin.clone(), at(0), STABLE);

        pin.set_low();
        ch.poll(at(10)).unwrap();
        ch.poll(at(20)).unwrap();
        assert!(ch.is_pressed_edge());

        pin.fail_next_read();
        assert_eq!(ch.poll(at(30)), Err(HardwareFault::PinRead));
        assert_eq!(ch.edge(), None);
        assert!(ch.is_pressed());
    }
}
