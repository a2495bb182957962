//! Millisecond time base and blocking delays.
//!
//! Timer0 runs in CTC mode at 1 kHz (16 MHz / 64 / 250) and its compare
//! interrupt bumps a wrapping millisecond counter.

use core::cell::{Cell, RefCell};

use avr_device::atmega32u4::{Peripherals, TC0};
use avr_device::interrupt::Mutex;
use embedded_hal::delay::DelayNs;
use footboard_core::{Clock, Instant};

use crate::hid::UsbHid;

/// Timer0 compare value for a 1 ms period at prescaler 64.
const TICKS_PER_MS: u8 = 249;

static MILLIS: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

/// Start the 1 kHz tick. Interrupts must be enabled separately.
pub fn init(tc0: &TC0) {
    tc0.tccr0a.write(|w| w.wgm0().ctc());
    tc0.ocr0a.write(|w| w.bits(TICKS_PER_MS));
    tc0.tccr0b.write(|w| w.cs0().prescale_64());
    tc0.timsk0.write(|w| w.ocie0a().set_bit());

    avr_device::interrupt::free(|cs| MILLIS.borrow(cs).set(0));
}

#[avr_device::interrupt(atmega32u4)]
fn TIMER0_COMPA() {
    avr_device::interrupt::free(|cs| {
        let millis = MILLIS.borrow(cs);
        millis.set(millis.get().wrapping_add(1));
    })
}

/// Milliseconds since [`init`].
pub fn millis() -> u32 {
    avr_device::interrupt::free(|cs| MILLIS.borrow(cs).get())
}

pub struct SysClock;

impl Clock for SysClock {
    fn now(&self) -> Instant {
        Instant::from_millis(millis())
    }
}

/// Blocking delay that keeps answering USB control requests while it waits.
///
/// Millisecond waits run on the timer; anything shorter is a busy loop.
pub struct PollingDelay<'a> {
    usb: &'a RefCell<UsbHid>,
    dp: &'a Peripherals,
}

impl<'a> PollingDelay<'a> {
    pub fn new(usb: &'a RefCell<UsbHid>, dp: &'a Peripherals) -> Self {
        Self { usb, dp }
    }
}

impl DelayNs for PollingDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        // One iteration is at least 4 cycles = 250 ns at 16 MHz.
        for _ in 0..ns / 250 {
            unsafe { core::arch::asm!("nop") };
        }
    }

    fn delay_ms(&mut self, ms: u32) {
        let start = millis();
        // `<=` because `start` may be read just before the counter ticks.
        while millis().wrapping_sub(start) <= ms {
            if let Ok(mut usb) = self.usb.try_borrow_mut() {
                usb.poll(self.dp);
            }
        }
    }
}
