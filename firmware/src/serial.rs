//! Diagnostic log lines on USART1 (TX = PD3), 38400 baud 8N1.
//!
//! Installed as the `log` backend so the core's `info!`/`warn!` lines come
//! out of the serial port. Writes busy-wait on the data register, so keep
//! the log level at info or quieter.

use core::fmt::{self, Write};

use avr_device::atmega32u4::USART1;
use log::{LevelFilter, Log, Metadata, Record};

/// UBRR1 for 38400 baud at 16 MHz (normal speed, 0.2% error).
const UBRR: u16 = 25;

const UCSR1A_UDRE1: u8 = 1 << 5;
const UCSR1B_TXEN1: u8 = 1 << 3;
/// 8 data bits, no parity, 1 stop bit.
const UCSR1C_8N1: u8 = 0b0000_0110;

pub fn init(usart: &USART1) {
    usart.ubrr1.write(|w| unsafe { w.bits(UBRR) });
    usart.ucsr1a.write(|w| unsafe { w.bits(0) });
    usart.ucsr1c.write(|w| unsafe { w.bits(UCSR1C_8N1) });
    usart.ucsr1b.write(|w| unsafe { w.bits(UCSR1B_TXEN1) });
}

struct Tx;

impl Tx {
    fn usart() -> &'static avr_device::atmega32u4::usart1::RegisterBlock {
        // Only the logger touches USART1 after `init`.
        unsafe { &*USART1::ptr() }
    }

    fn write_byte(byte: u8) {
        let usart = Self::usart();
        while usart.ucsr1a.read().bits() & UCSR1A_UDRE1 == 0 {}
        usart.udr1.write(|w| unsafe { w.bits(byte) });
    }
}

impl Write for Tx {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            Self::write_byte(byte);
        }
        Ok(())
    }
}

/// Print one line without going through the logger.
pub fn println(args: fmt::Arguments<'_>) {
    let _ = Tx.write_fmt(args);
    let _ = Tx.write_str("\r\n");
}

struct SerialLogger;

static LOGGER: SerialLogger = SerialLogger;

impl Log for SerialLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            let _ = write!(Tx, "[{}] {}\r\n", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Route `log` output to USART1.
pub fn init_logger(level: LevelFilter) {
    // No atomics on AVR, so the racy setters are the only option. This runs
    // once from `main` before interrupts are enabled.
    unsafe {
        let _ = log::set_logger_racy(&LOGGER);
        log::set_max_level_racy(level);
    }
}
