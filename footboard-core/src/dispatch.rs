//! The control loop.
//!
//! [`Footboard`] owns every channel, the binding table, the HID sink, the
//! clock and the delay. Each [`tick`](Footboard::tick):
//!
//! 1. polls every channel in declaration order,
//! 2. walks the channels again in the same order and runs the bound action
//!    for each confirmed edge,
//! 3. sleeps for the tick interval.
//!
//! Actions block. An edge that happens while an action runs is only seen if
//! the new level is still there when polling resumes.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use heapless::Vec;
use log::{info, warn};

use crate::action::Action;
use crate::binding::{Binding, Bindings, ConfigError};
use crate::channel::{Edge, InputChannel, Polarity, Role};
use crate::config::{ChannelSpec, Timing};
use crate::hid::HidSink;
use crate::time::Clock;

/// Most input channels a footboard can carry.
pub const MAX_CHANNELS: usize = 4;

/// What happened during one tick.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Confirmed edges, in dispatch order.
    pub edges: Vec<(Role, Edge), MAX_CHANNELS>,
    /// Actions that ran to completion, in order.
    pub actions: Vec<Action, MAX_CHANNELS>,
    /// Pin reads or HID operations that failed.
    pub faults: u8,
}

impl TickReport {
    pub fn is_idle(&self) -> bool {
        self.edges.is_empty() && self.faults == 0
    }
}

pub struct Footboard<P, H, C, D> {
    channels: Vec<InputChannel<P>, MAX_CHANNELS>,
    bindings: Bindings,
    hid: H,
    clock: C,
    delay: D,
    timing: Timing,
}

impl<P, H, C, D> Footboard<P, H, C, D>
where
    P: InputPin,
    H: HidSink,
    C: Clock,
    D: DelayNs,
{
    pub fn new(
        hid: H,
        clock: C,
        delay: D,
        timing: Timing,
        bindings: &[Binding],
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            channels: Vec::new(),
            bindings: Bindings::from_slice(bindings)?,
            hid,
            clock,
            delay,
            timing,
        })
    }

    /// Append a channel. Declaration order is dispatch order.
    pub fn add_channel(
        &mut self,
        role: Role,
        polarity: Polarity,
        pin: P,
    ) -> Result<(), ConfigError> {
        if self.channels.iter().any(|ch| ch.role() == role) {
            return Err(ConfigError::DuplicateChannel(role));
        }
        let now = self.clock.now();
        let channel = InputChannel::new(role, polarity, pin, now, self.timing.stable_for);
        self.channels
            .push(channel)
            .map_err(|_| ConfigError::TooManyChannels)
    }

    /// Add channels for `specs`, taking pins from `pins` in the same order.
    pub fn with_channels<I>(mut self, specs: &[ChannelSpec], pins: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = P>,
    {
        for (spec, pin) in specs.iter().zip(pins) {
            self.add_channel(spec.role, spec.polarity, pin)?;
        }
        Ok(self)
    }

    /// Run one polling iteration, including the trailing tick sleep.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        let now = self.clock.now();

        for channel in self.channels.iter_mut() {
            if let Err(fault) = channel.poll(now) {
                warn!("Button {}: {}", channel.role(), fault);
                report.faults = report.faults.saturating_add(1);
            }
        }

        let Self {
            channels,
            bindings,
            hid,
            delay,
            timing,
            ..
        } = self;

        for channel in channels.iter() {
            let Some(edge) = channel.edge() else {
                continue;
            };
            let role = channel.role();
            info!("Button {} {}", role, edge);
            // One edge per channel per tick, so this never overflows.
            let _ = report.edges.push((role, edge));

            let Some(action) = bindings.lookup(role, edge) else {
                continue;
            };
            info!("{}", action);
            match action.execute(hid, delay, timing) {
                Ok(()) => {
                    let _ = report.actions.push(*action);
                }
                Err(fault) => {
                    warn!("{} aborted: {}", action, fault);
                    report.faults = report.faults.saturating_add(1);
                }
            }
        }

        self.delay.delay_ms(self.timing.tick.as_millis());
        report
    }

    /// Poll forever.
    pub fn run(&mut self) -> ! {
        loop {
            self.tick();
        }
    }

    pub fn channels(&self) -> &[InputChannel<P>] {
        &self.channels
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn hid(&self) -> &H {
        &self.hid
    }

    pub fn hid_mut(&mut self) -> &mut H {
        &mut self.hid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::REFERENCE_BINDINGS;
    use crate::config::REFERENCE_CHANNELS;
    use crate::sim::{RecordingHid, SimClock, SimDelay, SimPin};

    type SimBoard = Footboard<SimPin, RecordingHid, SimClock, SimDelay>;

    fn board() -> (SimBoard, [SimPin; 3]) {
        let clock = SimClock::new();
        let pins = [SimPin::new(true), SimPin::new(true), SimPin::new(true)];
        let board = Footboard::new(
            RecordingHid::new(clock.clone()),
            clock.clone(),
            clock.delay(),
            Timing::DEFAULT,
            &REFERENCE_BINDINGS,
        )
        .unwrap()
        .with_channels(&REFERENCE_CHANNELS, pins.clone())
        .unwrap();
        (board, pins)
    }

    #[test]
    fn idle_tick_sleeps_one_interval() {
        let (mut board, _pins) = board();
        let report = board.tick();
        assert!(report.is_idle());
        assert_eq!(board.clock.now().as_millis(), 10);
    }

    #[test]
    fn duplicate_channel_is_rejected() {
        let (mut board, _pins) = board();
        assert_eq!(
            board.add_channel(Role::A, Polarity::ActiveLow, SimPin::new(true)),
            Err(ConfigError::DuplicateChannel(Role::A))
        );
    }

    #[test]
    fn channels_keep_declaration_order() {
        let clock = SimClock::new();
        let mut board: SimBoard = Footboard::new(
            RecordingHid::new(clock.clone()),
            clock.clone(),
            clock.delay(),
            Timing::DEFAULT,
            &[],
        )
        .unwrap();
        for role in [Role::C, Role::A, Role::B] {
            board.add_channel(role, Polarity::ActiveLow, SimPin::new(true)).unwrap();
        }
        let roles: std::vec::Vec<Role> = board.channels().iter().map(|ch| ch.role()).collect();
        assert_eq!(roles, [Role::C, Role::A, Role::B]);
        assert!(board.bindings().is_empty());
    }

    #[test]
    fn pin_fault_is_counted_and_skipped() {
        let (mut board, pins) = board();
        pins[0].fail_next_read();
        let report = board.tick();
        assert_eq!(report.faults, 1);
        assert!(report.edges.is_empty());
        assert!(board.hid().events().is_empty());
    }

    #[test]
    fn hid_fault_does_not_stop_the_loop() {
        let (mut board, pins) = board();
        board.hid_mut().set_available(false);

        pins[0].set_low();
        board.tick();
        board.tick();
        pins[0].set_high();
        board.tick();
        let report = board.tick();
        assert_eq!(report.edges.as_slice(), &[(Role::A, Edge::Released)]);
        assert!(report.actions.is_empty());
        assert_eq!(report.faults, 1);

        // Next release goes through once the host is back.
        board.hid_mut().set_available(true);
        pins[0].set_low();
        board.tick();
        board.tick();
        pins[0].set_high();
        board.tick();
        let report = board.tick();
        assert_eq!(report.actions.as_slice(), &[Action::CLICK_ONCE]);
    }
}
