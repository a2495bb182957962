mod simulate;
mod trace;
mod usb;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use footboard_core::{Duration, Timing, REFERENCE_BINDINGS};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "footboard")]
#[command(about = "Host tools for the three-button HID footboard")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a pin trace through the dispatch loop and print the HID output
    Simulate {
        /// Trace file: one `<ms> <A|B|C> <high|low>` event per line
        trace: PathBuf,
        /// Keep ticking this many milliseconds after the last event
        #[arg(long, default_value_t = 200)]
        settle: u32,
    },
    /// Print the button-to-action bindings and timing
    Bindings,
    /// Check whether the footboard or its bootloader is connected
    Detect,
    /// Reboot the footboard into the HalfKay bootloader for flashing
    Reboot {
        /// Seconds to wait for the bootloader to appear
        #[arg(long, default_value_t = 5)]
        wait: u64,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Simulate { trace, settle } => {
            let contents = fs::read_to_string(&trace)
                .with_context(|| format!("reading {}", trace.display()))?;
            let events = trace::parse_trace(&contents)
                .with_context(|| format!("parsing {}", trace.display()))?;

            let sim = simulate::run(&events, Timing::DEFAULT, Duration::from_millis(settle))?;

            println!(
                "{} trace events, {} ticks, ended at {}",
                events.len(),
                sim.ticks,
                sim.end
            );
            if sim.events.is_empty() {
                println!("No HID output.");
            }
            for event in &sim.events {
                println!("{}", event);
            }
        }
        Command::Bindings => {
            for binding in &REFERENCE_BINDINGS {
                println!("{}", binding);
            }
            let timing = Timing::DEFAULT;
            println!(
                "stable {}, tick {}, inter-click {}, key hold {}",
                timing.stable_for, timing.tick, timing.inter_click, timing.key_hold
            );
        }
        Command::Detect => match usb::detect()? {
            usb::Presence::Footboard => println!("Footboard detected."),
            usb::Presence::Bootloader => println!("Teensy bootloader detected (HalfKay mode)."),
            usb::Presence::Absent => println!("No footboard or bootloader detected."),
        },
        Command::Reboot { wait } => {
            if !usb::reboot_to_bootloader()? {
                eprintln!("Footboard not found.");
                std::process::exit(1);
            }
            println!("Rebooting footboard into bootloader...");
            if !usb::wait_for_bootloader(std::time::Duration::from_secs(wait))? {
                eprintln!("Teensy bootloader not detected after reboot.");
                eprintln!("Press the reset button on the Teensy and try again.");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
