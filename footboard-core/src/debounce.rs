//! Time-based debounce logic.
//!
//! A raw reading becomes the new stable value only after it has been seen
//! unchanged for at least the configured stable duration. Any disagreement
//! restarts the wait, so contact bounce shorter than the threshold never
//! produces an edge.

use crate::time::{Duration, Instant};

/// One-shot edge flags for a single update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Edges {
    /// Stable value went false → true this update.
    pub rose: bool,
    /// Stable value went true → false this update.
    pub fell: bool,
}

impl Edges {
    pub const NONE: Edges = Edges {
        rose: false,
        fell: false,
    };

    pub fn any(self) -> bool {
        self.rose || self.fell
    }
}

pub struct Debouncer {
    /// Last confirmed value.
    stable: bool,
    /// Most recent raw sample.
    candidate: bool,
    /// When the current candidate was first seen.
    candidate_since: Instant,
    stable_for: Duration,
    edges: Edges,
}

impl Debouncer {
    /// Create a debouncer that starts out stable at `initial`.
    pub const fn new(initial: bool, now: Instant, stable_for: Duration) -> Self {
        Self {
            stable: initial,
            candidate: initial,
            candidate_since: now,
            stable_for,
            edges: Edges::NONE,
        }
    }

    /// Feed one raw sample taken at `now`.
    ///
    /// Edge flags from the previous update are cleared first, so the returned
    /// edges describe this update only. At most one of `rose`/`fell` is set.
    pub fn update(&mut self, raw: bool, now: Instant) -> Edges {
        self.edges = Edges::NONE;

        if raw != self.candidate {
            self.candidate = raw;
            self.candidate_since = now;
        } else if self.candidate != self.stable
            && now.duration_since(self.candidate_since) >= self.stable_for
        {
            self.stable = self.candidate;
            if self.stable {
                self.edges.rose = true;
            } else {
                self.edges.fell = true;
            }
        }

        self.edges
    }

    /// Drop this tick's edges without sampling (used when a read failed).
    pub fn clear_edges(&mut self) {
        self.edges = Edges::NONE;
    }

    pub fn stable_value(&self) -> bool {
        self.stable
    }

    pub fn rose(&self) -> bool {
        self.edges.rose
    }

    pub fn fell(&self) -> bool {
        self.edges.fell
    }
}
