use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rusb::{Device, GlobalContext};
use std::time::{Duration, Instant};

/// Van Ooijen Technische Informatica shared VID.
const VID: u16 = 0x16C0;
/// Footboard firmware (shared keyboard/mouse PID).
const FOOTBOARD_PID: u16 = 0x27DB;
/// Teensy 2.0 HalfKay bootloader.
const HALFKAY_PID: u16 = 0x0478;

/// Vendor request the firmware answers by jumping to the bootloader.
const REQUEST_TYPE_VENDOR_OUT: u8 = 0x40;
const REQUEST_REBOOT_TO_BOOTLOADER: u8 = 0xFF;

const USB_TIMEOUT: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Footboard,
    Bootloader,
    Absent,
}

fn find(pid: u16) -> Result<Option<Device<GlobalContext>>> {
    let devices = rusb::devices().context("failed to enumerate USB devices")?;
    for device in devices.iter() {
        let desc = device
            .device_descriptor()
            .context("failed to read device descriptor")?;
        if desc.vendor_id() == VID && desc.product_id() == pid {
            return Ok(Some(device));
        }
    }
    Ok(None)
}

/// Which of the footboard or its bootloader is on the bus.
pub fn detect() -> Result<Presence> {
    if find(FOOTBOARD_PID)?.is_some() {
        Ok(Presence::Footboard)
    } else if find(HALFKAY_PID)?.is_some() {
        Ok(Presence::Bootloader)
    } else {
        Ok(Presence::Absent)
    }
}

/// Ask a running footboard to jump to its bootloader.
/// Returns false if no footboard is connected.
pub fn reboot_to_bootloader() -> Result<bool> {
    let Some(device) = find(FOOTBOARD_PID)? else {
        return Ok(false);
    };
    let handle = device
        .open()
        .context("failed to open footboard (may need root/sudo or udev rules)")?;

    // The board detaches right after acknowledging, which some hosts report as an error.
    if let Err(e) = handle.write_control(
        REQUEST_TYPE_VENDOR_OUT,
        REQUEST_REBOOT_TO_BOOTLOADER,
        0,
        0,
        &[],
        USB_TIMEOUT,
    ) {
        log::debug!("reboot request returned {}", e);
    }
    Ok(true)
}

/// Poll for the HalfKay bootloader, showing a spinner while waiting.
pub fn wait_for_bootloader(timeout: Duration) -> Result<bool> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg} ({elapsed})")
            .context("invalid spinner template")?,
    );
    spinner.set_message("Waiting for bootloader");

    let start = Instant::now();
    while start.elapsed() < timeout {
        if find(HALFKAY_PID)?.is_some() {
            spinner.finish_with_message("Bootloader ready");
            return Ok(true);
        }
        spinner.tick();
        std::thread::sleep(POLL_INTERVAL);
    }

    spinner.finish_with_message("Bootloader did not appear");
    Ok(false)
}
