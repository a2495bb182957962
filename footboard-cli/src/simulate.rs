//! Replay a pin trace through the real dispatch loop on a virtual clock.

use anyhow::{Context, Result};
use footboard_core::sim::{HidEvent, RecordingHid, SimClock, SimPin};
use footboard_core::{
    Clock, Duration, Footboard, Instant, Timing, REFERENCE_BINDINGS, REFERENCE_CHANNELS,
};
use log::debug;

use crate::trace::TraceEvent;

pub struct Simulation {
    pub events: Vec<HidEvent>,
    pub ticks: u32,
    pub end: Instant,
}

/// Run the reference footboard until `settle` after the last trace event.
///
/// Trace events are applied at the first tick at or after their time. An
/// event that falls inside a blocking action lands when the loop resumes,
/// just as on the board.
pub fn run(trace: &[TraceEvent], timing: Timing, settle: Duration) -> Result<Simulation> {
    let clock = SimClock::new();
    let pins = REFERENCE_CHANNELS.map(|_| SimPin::new(true));

    let mut board = Footboard::new(
        RecordingHid::new(clock.clone()),
        clock.clone(),
        clock.delay(),
        timing,
        &REFERENCE_BINDINGS,
    )?
    .with_channels(&REFERENCE_CHANNELS, pins.clone())?;

    let last = trace.last().map_or(0, |event| event.at);
    let end = last.checked_add(settle.as_millis()).with_context(|| {
        format!(
            "trace ends at {}ms; with {} of settle time it runs past the {}ms clock limit",
            last,
            settle,
            u32::MAX
        )
    })?;

    let mut pending = trace.iter().peekable();
    let mut ticks = 0;
    let mut now = clock.now().as_millis();
    loop {
        while let Some(event) = pending.next_if(|event| event.at <= now) {
            let index = REFERENCE_CHANNELS
                .iter()
                .position(|spec| spec.role == event.role)
                .with_context(|| format!("button {} has no channel", event.role))?;
            debug!(
                "{}ms: button {} line {}",
                now,
                event.role,
                if event.level { "high" } else { "low" }
            );
            pins[index].set(event.level);
        }
        board.tick();
        ticks += 1;

        let next = clock.now().as_millis();
        // A wrapped clock is also past the end.
        if next > end || next < now {
            break;
        }
        now = next;
    }

    Ok(Simulation {
        events: board.hid_mut().take_events(),
        ticks,
        end: clock.now(),
    })
}
