//! Debounce and dispatch core for the three-button HID footboard.
//!
//! This crate is `no_std` so the same logic runs in the AVR firmware and in
//! the host tool's simulator. Hardware lives behind small traits:
//!
//! - pins are [`embedded_hal::digital::InputPin`]s,
//! - time comes from a [`Clock`] and blocking waits from
//!   [`embedded_hal::delay::DelayNs`],
//! - HID output goes to a [`HidSink`].
//!
//! A [`Footboard`] owns all of it and runs one polling tick at a time.

#![no_std]

#[cfg(any(test, feature = "sim"))]
extern crate std;

pub mod action;
pub mod binding;
pub mod channel;
pub mod config;
pub mod debounce;
pub mod dispatch;
pub mod hid;
pub mod keycode;
pub mod report;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod time;

pub use action::{click_once, click_triple, enter_pulse, Action};
pub use binding::{Binding, Bindings, ConfigError, REFERENCE_BINDINGS};
pub use channel::{Edge, InputChannel, Polarity, Role};
pub use config::{ChannelSpec, Timing, REFERENCE_CHANNELS};
pub use debounce::{Debouncer, Edges};
pub use dispatch::{Footboard, TickReport, MAX_CHANNELS};
pub use hid::{HardwareFault, HidSink, MouseButton};
pub use keycode::Keycode;
pub use time::{Clock, Duration, Instant};
