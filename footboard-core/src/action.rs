//! Fixed HID output sequences.
//!
//! Every action runs to completion before returning and blocks the caller
//! for its whole duration (a triple click takes at least two inter-click
//! gaps). Input is not sampled meanwhile.

use core::fmt;

use embedded_hal::delay::DelayNs;

use crate::config::Timing;
use crate::hid::{HardwareFault, HidSink, MouseButton};
use crate::keycode::Keycode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// `count` clicks of `button`, separated by the inter-click delay.
    Click { button: MouseButton, count: u8 },
    /// Key down, hold for the key-hold delay, key up.
    KeyPulse { key: Keycode },
}

impl Action {
    pub const CLICK_ONCE: Action = Action::Click {
        button: MouseButton::Left,
        count: 1,
    };
    pub const CLICK_TRIPLE: Action = Action::Click {
        button: MouseButton::Left,
        count: 3,
    };
    pub const ENTER_PULSE: Action = Action::KeyPulse { key: Keycode::Enter };

    /// Perform the sequence against `hid`, sleeping on `delay`.
    ///
    /// The first fault aborts the rest of the sequence. A key that was
    /// pressed is still released before the fault is returned.
    pub fn execute<H, D>(
        &self,
        hid: &mut H,
        delay: &mut D,
        timing: &Timing,
    ) -> Result<(), HardwareFault>
    where
        H: HidSink + ?Sized,
        D: DelayNs + ?Sized,
    {
        match *self {
            Action::Click { button, count } => {
                for i in 0..count {
                    if i > 0 {
                        delay.delay_ms(timing.inter_click.as_millis());
                    }
                    hid.mouse_click(button)?;
                }
                Ok(())
            }
            Action::KeyPulse { key } => {
                hid.key_press(key)?;
                delay.delay_ms(timing.key_hold.as_millis());
                hid.key_release(key)
            }
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Action::Click {
                button: MouseButton::Left,
                count: 1,
            } => f.write_str("Mouse single click"),
            Action::Click {
                button: MouseButton::Left,
                count: 3,
            } => f.write_str("Mouse triple click"),
            Action::Click { button, count } => write!(f, "Mouse {} click x{}", button, count),
            Action::KeyPulse { key } => write!(f, "Keyboard {}", key),
        }
    }
}

/// One left click.
pub fn click_once<H: HidSink + ?Sized>(hid: &mut H) -> Result<(), HardwareFault> {
    hid.mouse_click(MouseButton::Left)
}

/// Three left clicks, `timing.inter_click` apart.
pub fn click_triple<H, D>(hid: &mut H, delay: &mut D, timing: &Timing) -> Result<(), HardwareFault>
where
    H: HidSink + ?Sized,
    D: DelayNs + ?Sized,
{
    Action::CLICK_TRIPLE.execute(hid, delay, timing)
}

/// Enter down, hold `timing.key_hold`, Enter up.
pub fn enter_pulse<H, D>(hid: &mut H, delay: &mut D, timing: &Timing) -> Result<(), HardwareFault>
where
    H: HidSink + ?Sized,
    D: DelayNs + ?Sized,
{
    Action::ENTER_PULSE.execute(hid, delay, timing)
}

#[cfg(test)]
mod tests {
    use std::format;
    use std::vec;

    use super::*;
    use crate::sim::{HidEvent, RecordingHid, SimClock};
    use crate::time::{Clock, Instant};

    fn rig() -> (SimClock, RecordingHid) {
        let clock = SimClock::new();
        let hid = RecordingHid::new(clock.clone());
        (clock, hid)
    }

    #[test]
    fn click_once_is_one_click() {
        let (_clock, mut hid) = rig();
        click_once(&mut hid).unwrap();
        assert_eq!(hid.events(), vec![HidEvent::click(0, MouseButton::Left)]);
    }

    #[test]
    fn triple_click_spacing() {
        let (clock, mut hid) = rig();
        let mut delay = clock.delay();
        click_triple(&mut hid, &mut delay, &Timing::DEFAULT).unwrap();

        let times: std::vec::Vec<u32> = hid.events().iter().map(|e| e.at.as_millis()).collect();
        assert_eq!(times, vec![0, 100, 200]);
        assert!(hid.events().iter().all(|e| e.is_click(MouseButton::Left)));
        // No trailing gap after the third click.
        assert_eq!(clock.now(), Instant::from_millis(200));
    }

    #[test]
    fn enter_pulse_holds_key() {
        let (clock, mut hid) = rig();
        let mut delay = clock.delay();
        enter_pulse(&mut hid, &mut delay, &Timing::DEFAULT).unwrap();

        assert_eq!(
            hid.events(),
            vec![
                HidEvent::key_down(0, Keycode::Enter),
                HidEvent::key_up(50, Keycode::Enter),
            ]
        );
        assert!(!hid.is_key_down(Keycode::Enter));
    }

    #[test]
    fn fault_aborts_remaining_clicks() {
        let (clock, mut hid) = rig();
        let mut delay = clock.delay();
        hid.fail_after(1);
        let result = click_triple(&mut hid, &mut delay, &Timing::DEFAULT);
        assert_eq!(result, Err(HardwareFault::HidUnavailable));
        assert_eq!(hid.events().len(), 1);
    }

    #[test]
    fn failed_key_down_sends_no_key_up() {
        let (clock, mut hid) = rig();
        let mut delay = clock.delay();
        hid.fail_after(0);
        let result = enter_pulse(&mut hid, &mut delay, &Timing::DEFAULT);
        assert_eq!(result, Err(HardwareFault::HidUnavailable));
        assert!(hid.events().is_empty());
        // No hold either.
        assert_eq!(clock.now(), Instant::from_millis(0));
    }

    #[test]
    fn failed_key_up_reports_fault_after_hold() {
        let (clock, mut hid) = rig();
        let mut delay = clock.delay();
        hid.fail_after(1);
        let result = enter_pulse(&mut hid, &mut delay, &Timing::DEFAULT);
        assert_eq!(result, Err(HardwareFault::HidUnavailable));
        assert_eq!(hid.events(), vec![HidEvent::key_down(0, Keycode::Enter)]);
        // The release was attempted after the hold, and the key is still down.
        assert_eq!(clock.now(), Instant::from_millis(50));
        assert!(hid.is_key_down(Keycode::Enter));
    }

    #[test]
    fn display_names() {
        assert_eq!(format!("{}", Action::CLICK_ONCE), "Mouse single click");
        assert_eq!(format!("{}", Action::CLICK_TRIPLE), "Mouse triple click");
        assert_eq!(format!("{}", Action::ENTER_PULSE), "Keyboard ENTER");
        let right = Action::Click {
            button: MouseButton::Right,
            count: 2,
        };
        assert_eq!(format!("{}", right), "Mouse right click x2");
    }
}
