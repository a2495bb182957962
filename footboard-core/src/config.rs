//! Compile-time configuration: timing constants and the reference wiring.

use crate::channel::{Polarity, Role};
use crate::time::Duration;

/// All timing knobs of the loop and the actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    /// How long a raw level must hold before it is accepted.
    pub stable_for: Duration,
    /// Gap between the clicks of a multi-click.
    pub inter_click: Duration,
    /// How long a key pulse keeps the key down.
    pub key_hold: Duration,
    /// Sleep at the end of every loop iteration.
    pub tick: Duration,
}

impl Timing {
    /// The stable duration matches the tick so a single bounced sample never confirms.
    pub const DEFAULT: Timing = Timing {
        stable_for: Duration::from_millis(10),
        inter_click: Duration::from_millis(100),
        key_hold: Duration::from_millis(50),
        tick: Duration::from_millis(10),
    };
}

impl Default for Timing {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Role and wiring of one input. The pin itself is supplied by the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelSpec {
    pub role: Role,
    pub polarity: Polarity,
}

/// Three buttons to ground with internal pull-ups, in dispatch order.
pub const REFERENCE_CHANNELS: [ChannelSpec; 3] = [
    ChannelSpec {
        role: Role::A,
        polarity: Polarity::ActiveLow,
    },
    ChannelSpec {
        role: Role::B,
        polarity: Polarity::ActiveLow,
    },
    ChannelSpec {
        role: Role::C,
        polarity: Polarity::ActiveLow,
    },
];
