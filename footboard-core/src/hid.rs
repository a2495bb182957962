//! The HID output seam and the hardware fault type.

use core::fmt;

use crate::keycode::Keycode;

/// A collaborator failed: a pin could not be read or the USB HID interface
/// could not take a report. The dispatch loop logs these and keeps polling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HardwareFault {
    #[error("pin read failed")]
    PinRead,
    #[error("HID interface not configured by host")]
    HidUnavailable,
    #[error("HID endpoint not ready in time")]
    HidTimeout,
}

/// Mouse buttons, valued as their bit in the HID mouse report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MouseButton {
    Left = 0x01,
    Right = 0x02,
    Middle = 0x04,
}

impl MouseButton {
    pub fn bit(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        })
    }
}

/// Destination for keyboard and mouse events.
pub trait HidSink {
    /// Press and release `button` as one click.
    fn mouse_click(&mut self, button: MouseButton) -> Result<(), HardwareFault>;

    fn key_press(&mut self, key: Keycode) -> Result<(), HardwareFault>;

    fn key_release(&mut self, key: Keycode) -> Result<(), HardwareFault>;
}

impl<T: HidSink + ?Sized> HidSink for &mut T {
    fn mouse_click(&mut self, button: MouseButton) -> Result<(), HardwareFault> {
        (**self).mouse_click(button)
    }

    fn key_press(&mut self, key: Keycode) -> Result<(), HardwareFault> {
        (**self).key_press(key)
    }

    fn key_release(&mut self, key: Keycode) -> Result<(), HardwareFault> {
        (**self).key_release(key)
    }
}
