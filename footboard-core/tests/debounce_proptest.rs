//! Property tests for the debouncer.
//! Raw samples are generated as (level, gap-in-ms) pairs.

use footboard_core::{Debouncer, Duration, Instant};
use proptest::prelude::*;

const STABLE_MS: u32 = 10;

fn stable() -> Duration {
    Duration::from_millis(STABLE_MS)
}

proptest! {
    /// Noise whose levels never hold for the stable duration produces no edges.
    #[test]
    fn fast_noise_never_changes_stable_value(
        initial in any::<bool>(),
        gaps in proptest::collection::vec(1u32..STABLE_MS, 1..200),
    ) {
        let mut d = Debouncer::new(initial, Instant::from_millis(0), stable());
        let mut now = 0u32;
        let mut level = initial;
        for gap in gaps {
            // Toggle on every sample so each level lasts less than the threshold.
            level = !level;
            now += gap;
            let edges = d.update(level, Instant::from_millis(now));
            prop_assert!(!edges.any());
            prop_assert_eq!(d.stable_value(), initial);
        }
    }

    /// A single level change held long enough fires exactly one matching edge.
    #[test]
    fn held_change_fires_exactly_once(
        initial in any::<bool>(),
        tick in 1u32..=STABLE_MS,
        extra_samples in 0usize..50,
    ) {
        let mut d = Debouncer::new(initial, Instant::from_millis(0), stable());
        let target = !initial;
        let samples = STABLE_MS.div_ceil(tick) as usize + 1 + extra_samples;

        let mut rises = 0;
        let mut falls = 0;
        for i in 1..=samples {
            let edges = d.update(target, Instant::from_millis(i as u32 * tick));
            rises += edges.rose as u32;
            falls += edges.fell as u32;
        }

        prop_assert_eq!(rises + falls, 1);
        prop_assert_eq!(rises == 1, target);
        prop_assert_eq!(d.stable_value(), target);
    }

    /// Whatever the input, rose and fell are never set together.
    #[test]
    fn edges_are_mutually_exclusive(
        samples in proptest::collection::vec((any::<bool>(), 0u32..30), 1..300),
    ) {
        let mut d = Debouncer::new(true, Instant::from_millis(0), stable());
        let mut now = 0u32;
        let mut previous = d.stable_value();
        for (level, gap) in samples {
            now += gap;
            let edges = d.update(level, Instant::from_millis(now));
            prop_assert!(!(edges.rose && edges.fell));
            // Edges appear exactly when the stable value changes.
            prop_assert_eq!(edges.any(), d.stable_value() != previous);
            previous = d.stable_value();
        }
    }
}
