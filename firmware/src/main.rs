//! Three-button HID footboard firmware for ATmega32U4 (Teensy 2.0).
//!
//! - Buttons A, B, C on PB4-PB6, active-low with pull-ups
//! - Time-based debouncing and release-triggered actions (footboard-core)
//! - Composite USB HID keyboard + mouse
//! - Diagnostics on USART1

#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]
#![feature(asm_experimental_arch)]

mod board;
mod clock;
mod hid;
mod serial;

use core::cell::RefCell;

use avr_device::atmega32u4::Peripherals;
use footboard_core::{Footboard, Timing, REFERENCE_BINDINGS, REFERENCE_CHANNELS};
use log::{error, info, LevelFilter};

use clock::{PollingDelay, SysClock};
use hid::{HidHandle, UsbHid};

/// On-board LED (PD6).
const LED: u8 = 0x40;

/// Nothing to report to on panic; halt.
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {}
}

#[avr_device::entry]
fn main() -> ! {
    let dp = unsafe { Peripherals::steal() };

    // Disable clock prescaler (16MHz)
    dp.CPU.clkpr.write(|w| w.clkpce().set_bit());
    dp.CPU.clkpr.write(|w| unsafe { w.bits(0) });

    dp.PORTD.ddrd.modify(|r, w| unsafe { w.bits(r.bits() | LED) });

    serial::init(&dp.USART1);
    serial::init_logger(LevelFilter::Info);
    serial::println(format_args!("Footboard firmware {}", env!("CARGO_PKG_VERSION")));

    board::init_gpio(&dp);
    clock::init(&dp.TC0);

    let usb = RefCell::new(UsbHid::new());
    usb.borrow_mut().init(&dp);

    unsafe { avr_device::interrupt::enable() };

    let footboard = Footboard::new(
        HidHandle::new(&usb, &dp),
        SysClock,
        PollingDelay::new(&usb, &dp),
        Timing::DEFAULT,
        &REFERENCE_BINDINGS,
    )
    .and_then(|footboard| footboard.with_channels(&REFERENCE_CHANNELS, board::buttons(&dp)));

    let mut footboard = match footboard {
        Ok(footboard) => footboard,
        Err(e) => {
            error!("bad configuration: {}", e);
            // LED stays off
            loop {}
        }
    };

    // LED on to indicate the loop is running
    dp.PORTD
        .portd
        .modify(|r, w| unsafe { w.bits(r.bits() | LED) });

    info!("Ready! Press your buttons...");
    footboard.run()
}
