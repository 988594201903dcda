//! Property-based invariant tests for the window controller.
//!
//! For any domain and any sequence of value updates:
//!
//! 1. `min <= start <= max - size` and `end = min(start + size, max)`.
//! 2. With no drag active, the tracked value lies inside `[start, end]`.
//! 3. The snapshot value always lies inside `[start, end]`.
//! 4. A single update never plans more than `ceil((max - min) / step)` steps.
//! 5. Repeating the current value changes nothing.
//! 6. The window never moves during a drag, and catches up after settle.
//! 7. Degenerate domains never shift.
//! 8. Sweeping the value monotonically moves `start` monotonically and ends
//!    with the window flush against the far edge.

use std::time::Duration;

use proptest::prelude::*;
use slidewin_core::{SeedStrategy, WindowConfig, WindowController};
use web_time::Instant;

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct DomainCase {
    min: i64,
    max: i64,
    size: i64,
    step: Option<i64>,
    seed: SeedStrategy,
    threshold: f64,
}

fn seed_strategy() -> impl Strategy<Value = SeedStrategy> {
    prop_oneof![Just(SeedStrategy::Bucket), Just(SeedStrategy::Centered)]
}

fn domain_strategy() -> impl Strategy<Value = DomainCase> {
    (
        -50_000i64..50_000,
        1i64..200_000,
        1i64..40_000,
        proptest::option::of(1i64..60_000),
        seed_strategy(),
        prop_oneof![Just(0.0), 0.0f64..0.45],
    )
        .prop_map(|(min, span, size, step, seed, threshold)| DomainCase {
            min,
            max: min + span,
            size,
            step,
            seed,
            threshold,
        })
}

fn case_with_values() -> impl Strategy<Value = (DomainCase, i64, Vec<i64>)> {
    domain_strategy().prop_flat_map(|case| {
        // Values may fall outside the domain to exercise clamping.
        let lo = case.min - 1_000;
        let hi = case.max + 1_000;
        (
            Just(case),
            lo..=hi,
            proptest::collection::vec(lo..=hi, 1..40),
        )
    })
}

fn build(case: &DomainCase, initial: i64) -> WindowController<i64> {
    let mut config = WindowConfig::new(case.min, case.max, case.size, case.seed)
        .threshold(case.threshold);
    if let Some(step) = case.step {
        config = config.step(step);
    }
    WindowController::new(config, initial).expect("generated config is valid")
}

fn assert_window_bounds(c: &WindowController<i64>) -> Result<(), TestCaseError> {
    let domain = c.domain();
    prop_assert!(c.start() >= domain.min(), "start {} below min", c.start());
    prop_assert!(
        c.start() <= domain.max_start(),
        "start {} above max_start {}",
        c.start(),
        domain.max_start()
    );
    prop_assert_eq!(c.end(), (c.start() + domain.size()).min(domain.max()));
    let snap = c.snapshot();
    prop_assert!(snap.start <= snap.value && snap.value <= snap.end, "{:?}", snap);
    Ok(())
}

// ═════════════════════════════════════════════════════════════════════════
// 1-4. Containment and bounded shifts without drag
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn idle_updates_keep_value_in_window((case, initial, values) in case_with_values()) {
        let mut c = build(&case, initial);
        let t = Instant::now();
        assert_window_bounds(&c)?;
        prop_assert!(c.start() <= c.external_value() && c.external_value() <= c.end());

        let max_steps = c.domain().max_shift_steps() as u64;
        for value in values {
            let shifts_before = c.shift_count();
            c.on_value_change(value, t);
            assert_window_bounds(&c)?;
            prop_assert!(
                c.start() <= c.external_value() && c.external_value() <= c.end(),
                "value {} outside [{}, {}] for {:?}",
                c.external_value(), c.start(), c.end(), case
            );
            if c.shift_count() > shifts_before {
                let plan = c.last_plan().expect("shift recorded");
                prop_assert!(plan.steps >= 1);
                prop_assert!(plan.steps <= max_steps, "{} > {}", plan.steps, max_steps);
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Repeats are no-ops
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn repeated_value_is_stable((case, initial, values) in case_with_values()) {
        let mut c = build(&case, initial);
        let t = Instant::now();
        for value in values {
            c.on_value_change(value, t);
            let before = (c.snapshot(), c.shift_count());
            c.on_value_change(value, t);
            prop_assert_eq!((c.snapshot(), c.shift_count()), before);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Drag suppression and settle
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn window_is_frozen_during_drag((case, initial, values) in case_with_values()) {
        let mut c = build(&case, initial);
        let t = Instant::now();
        let frozen = (c.start(), c.end());

        c.on_drag_begin(t);
        for (i, value) in values.iter().enumerate() {
            let now = t + Duration::from_millis(i as u64 * 16);
            c.on_value_change(*value, now);
            prop_assert!(c.tick(now).is_none());
            prop_assert_eq!((c.start(), c.end()), frozen);
            assert_window_bounds(&c)?;
        }

        let released = t + Duration::from_secs(10);
        c.on_drag_end(released);
        c.tick(released + c.options().settle_delay);
        assert_window_bounds(&c)?;
        prop_assert!(
            c.start() <= c.external_value() && c.external_value() <= c.end(),
            "value {} outside [{}, {}] after settle",
            c.external_value(), c.start(), c.end()
        );
        prop_assert!(c.pending_shift().is_none());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7. Degenerate domains
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn degenerate_domain_never_shifts(
        min in -1_000i64..1_000,
        span in 1i64..1_000,
        extra in 0i64..500,
        values in proptest::collection::vec(-3_000i64..3_000, 1..30),
        seed in seed_strategy(),
    ) {
        let config = WindowConfig::new(min, min + span, span + extra, seed);
        let mut c = WindowController::new(config, min).expect("valid config");
        let t = Instant::now();
        for value in values {
            c.on_value_change(value, t);
            prop_assert_eq!((c.start(), c.end()), (min, min + span));
        }
        prop_assert_eq!(c.shift_count(), 0);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 8. Monotonic tracking
// ═════════════════════════════════════════════════════════════════════════

fn sweep_case() -> impl Strategy<Value = (DomainCase, i64)> {
    domain_strategy().prop_flat_map(|case| {
        let span = case.max - case.min;
        let lo = (span / 500).max(1);
        let hi = (span / 10).max(lo);
        (Just(case), lo..=hi)
    })
}

proptest! {
    #[test]
    fn upward_sweep_advances_start_to_the_last_window((case, stride) in sweep_case()) {
        let mut c = build(&case, case.min);
        let t = Instant::now();
        let mut value = case.min;
        let mut last_start = c.start();
        while value < case.max {
            value = (value + stride).min(case.max);
            c.on_value_change(value, t);
            prop_assert!(
                c.start() >= last_start,
                "start moved back from {} to {} at {} for {:?}",
                last_start, c.start(), value, case
            );
            prop_assert!(
                c.start() <= value && value <= c.end(),
                "value {} outside [{}, {}] for {:?}",
                value, c.start(), c.end(), case
            );
            last_start = c.start();
        }
        prop_assert_eq!(c.start(), c.domain().max_start());
    }

    #[test]
    fn downward_sweep_retreats_start_to_the_first_window((case, stride) in sweep_case()) {
        let mut c = build(&case, case.max);
        let t = Instant::now();
        let mut value = case.max;
        let mut last_start = c.start();
        while value > case.min {
            value = (value - stride).max(case.min);
            c.on_value_change(value, t);
            prop_assert!(
                c.start() <= last_start,
                "start moved forward from {} to {} at {} for {:?}",
                last_start, c.start(), value, case
            );
            prop_assert!(
                c.start() <= value && value <= c.end(),
                "value {} outside [{}, {}] for {:?}",
                value, c.start(), c.end(), case
            );
            last_start = c.start();
        }
        prop_assert_eq!(c.start(), c.domain().min());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 9. Float domains
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn float_domain_never_panics_and_stays_bounded(
        values in proptest::collection::vec(prop_oneof![
            -2.0f64..12.0,
            Just(f64::NAN),
            Just(f64::INFINITY),
        ], 1..40),
    ) {
        let config = WindowConfig::new(0.0f64, 10.0, 1.0, SeedStrategy::Centered).step(0.25);
        let mut c = WindowController::new(config, 0.0).expect("valid config");
        let t = Instant::now();
        for value in values {
            let snap = c.on_value_change(value, t);
            prop_assert!(snap.start >= 0.0 && snap.start <= 9.0);
            prop_assert!(snap.start <= snap.value && snap.value <= snap.end);
            prop_assert!(c.external_value().is_finite());
        }
    }
}
