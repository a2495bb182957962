//! HID input reports for the composite keyboard + mouse interface.
//!
//! Both reports travel over the same interrupt endpoint and are told apart
//! by a leading report ID byte.

use crate::hid::MouseButton;
use crate::keycode::Keycode;

pub const KEYBOARD_REPORT_ID: u8 = 1;
pub const MOUSE_REPORT_ID: u8 = 2;

/// Keyboard report (boot layout plus report ID).
/// Byte 0: modifier keys bitmask (unused, always 0)
/// Byte 1: reserved (0x00)
/// Bytes 2-7: up to 6 simultaneous keycodes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyboardReport {
    pub modifiers: u8,
    pub reserved: u8,
    pub keys: [u8; 6],
}

impl KeyboardReport {
    pub const fn empty() -> Self {
        Self {
            modifiers: 0,
            reserved: 0,
            keys: [0; 6],
        }
    }

    /// Mark `key` as held. Returns false if all six slots are taken.
    pub fn press(&mut self, key: Keycode) -> bool {
        if self.is_down(key) {
            return true;
        }
        match self.keys.iter_mut().find(|slot| **slot == 0) {
            Some(slot) => {
                *slot = key.usage();
                true
            }
            None => false,
        }
    }

    pub fn release(&mut self, key: Keycode) {
        for slot in self.keys.iter_mut().filter(|slot| **slot == key.usage()) {
            *slot = 0;
        }
    }

    /// The report as it would be with `key` also held, or `None` when the
    /// rollover is full. `self` is left as is until the new report is sent.
    pub fn pressing(&self, key: Keycode) -> Option<Self> {
        let mut next = *self;
        next.press(key).then_some(next)
    }

    /// The report as it would be with `key` let go.
    pub fn releasing(&self, key: Keycode) -> Self {
        let mut next = *self;
        next.release(key);
        next
    }

    pub fn is_down(&self, key: Keycode) -> bool {
        self.keys.contains(&key.usage())
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers == 0 && self.keys.iter().all(|&k| k == 0)
    }

    pub fn to_bytes(&self) -> [u8; 9] {
        let mut out = [0u8; 9];
        out[0] = KEYBOARD_REPORT_ID;
        out[1] = self.modifiers;
        out[2] = self.reserved;
        out[3..].copy_from_slice(&self.keys);
        out
    }
}

/// Relative mouse report: buttons, x, y, wheel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MouseReport {
    pub buttons: u8,
    pub x: i8,
    pub y: i8,
    pub wheel: i8,
}

impl MouseReport {
    pub const fn released() -> Self {
        Self {
            buttons: 0,
            x: 0,
            y: 0,
            wheel: 0,
        }
    }

    pub fn pressed(button: MouseButton) -> Self {
        Self {
            buttons: button.bit(),
            ..Self::released()
        }
    }

    pub fn to_bytes(&self) -> [u8; 5] {
        [
            MOUSE_REPORT_ID,
            self.buttons,
            self.x as u8,
            self.y as u8,
            self.wheel as u8,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release_enter() {
        let mut report = KeyboardReport::empty();
        assert!(report.press(Keycode::Enter));
        assert_eq!(report.keys[0], 0x28);
        assert!(report.is_down(Keycode::Enter));

        report.release(Keycode::Enter);
        assert!(report.is_empty());
    }

    #[test]
    fn releasing_leaves_the_held_report_alone() {
        let mut report = KeyboardReport::empty();
        report.press(Keycode::Enter);

        let next = report.releasing(Keycode::Enter);
        assert!(next.is_empty());
        assert!(report.is_down(Keycode::Enter));
        assert_eq!(report.to_bytes()[..4], [KEYBOARD_REPORT_ID, 0, 0, 0x28]);
    }

    #[test]
    fn pressing_into_a_full_report_is_refused() {
        let mut report = KeyboardReport::empty();
        for key in [
            Keycode::Enter,
            Keycode::Escape,
            Keycode::Backspace,
            Keycode::Tab,
            Keycode::Space,
            Keycode::PageUp,
        ] {
            report.press(key);
        }
        assert_eq!(report.pressing(Keycode::PageDown), None);
        assert!(report.pressing(Keycode::Tab).is_some());
    }

    #[test]
    fn pressing_twice_takes_one_slot() {
        let mut report = KeyboardReport::empty();
        report.press(Keycode::Tab);
        report.press(Keycode::Tab);
        assert_eq!(report.keys.iter().filter(|&&k| k != 0).count(), 1);
    }

    #[test]
    fn seventh_key_is_dropped() {
        let mut report = KeyboardReport::empty();
        let keys = [
            Keycode::Enter,
            Keycode::Escape,
            Keycode::Backspace,
            Keycode::Tab,
            Keycode::Space,
            Keycode::PageUp,
        ];
        for key in keys {
            assert!(report.press(key));
        }
        assert!(!report.press(Keycode::PageDown));
        assert!(!report.is_down(Keycode::PageDown));
    }

    #[test]
    fn mouse_click_reports() {
        assert_eq!(
            MouseReport::pressed(MouseButton::Left).to_bytes(),
            [MOUSE_REPORT_ID, 0x01, 0, 0, 0]
        );
        assert_eq!(MouseReport::released().to_bytes(), [MOUSE_REPORT_ID, 0, 0, 0, 0]);
    }
}
