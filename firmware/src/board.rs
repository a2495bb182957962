//! Button wiring on the Teensy 2.0.
//!
//! Each button connects its pin to GND. The pins are inputs with the
//! internal pull-up enabled, so an idle button reads high and a pressed one
//! reads low (active-low). All three sit on PORTB, away from the JTAG pins
//! on PORTF and the USART1 pins on PORTD.
//!
//!   Button A: PB4
//!   Button B: PB5
//!   Button C: PB6

use core::convert::Infallible;

use avr_device::atmega32u4::{Peripherals, PORTB};
use embedded_hal::digital::{ErrorType, InputPin};

/// PORTB bit masks, in `REFERENCE_CHANNELS` order (A, B, C).
pub const BUTTON_MASKS: [u8; 3] = [1 << 4, 1 << 5, 1 << 6];

const ALL_BUTTONS: u8 = (1 << 4) | (1 << 5) | (1 << 6);

/// Configure the button pins as inputs with pull-ups.
pub fn init_gpio(dp: &Peripherals) {
    let portb = &dp.PORTB;

    portb.ddrb.modify(|r, w| unsafe { w.bits(r.bits() & !ALL_BUTTONS) });
    portb.portb.modify(|r, w| unsafe { w.bits(r.bits() | ALL_BUTTONS) });
}

/// One button input on PORTB.
pub struct ButtonPin<'a> {
    port: &'a PORTB,
    mask: u8,
}

impl<'a> ButtonPin<'a> {
    pub fn new(port: &'a PORTB, mask: u8) -> Self {
        Self { port, mask }
    }
}

/// Pins for buttons A, B and C, in declaration order.
pub fn buttons(dp: &Peripherals) -> [ButtonPin<'_>; 3] {
    BUTTON_MASKS.map(|mask| ButtonPin::new(&dp.PORTB, mask))
}

impl ErrorType for ButtonPin<'_> {
    type Error = Infallible;
}

impl InputPin for ButtonPin<'_> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.port.pinb.read().bits() & self.mask != 0)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}
