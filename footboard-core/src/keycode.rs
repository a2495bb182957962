//! USB HID keyboard usages a key pulse can emit.
//! See USB HID Usage Tables, Section 10 (Keyboard/Keypad Page 0x07).
//!
//! Only plain keys: a pulse is one key down then up, so modifiers have no
//! use here.

use core::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Keycode {
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,

    // Navigation
    PageUp = 0x4B,
    PageDown = 0x4E,
}

impl Keycode {
    pub fn usage(self) -> u8 {
        self as u8
    }

    /// Upper-case label used in diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            Keycode::Enter => "ENTER",
            Keycode::Escape => "ESC",
            Keycode::Backspace => "BACKSPACE",
            Keycode::Tab => "TAB",
            Keycode::Space => "SPACE",
            Keycode::PageUp => "PAGE UP",
            Keycode::PageDown => "PAGE DOWN",
        }
    }
}

impl fmt::Display for Keycode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::format;

    #[test]
    fn usages_and_labels() {
        assert_eq!(Keycode::Enter.usage(), 0x28);
        assert_eq!(Keycode::PageDown.usage(), 0x4E);
        assert_eq!(format!("{}", Keycode::PageUp), "PAGE UP");
    }
}
