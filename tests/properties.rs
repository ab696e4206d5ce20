//! Property tests for the adaptive core: bounds are never left, the
//! estimator converges, wrapping time arithmetic is exact, and the dead
//! band holds.

use proptest::prelude::*;

use adaptick::clock::elapsed_us;
use adaptick::config::{MAX_EST_RUNTIME_US, MAX_PERIOD_MS};
use adaptick::{
    Adjustment, MockClock, PeriodBounds, PeriodController, RuntimeEstimator, Scheduler,
    SchedulerConfig, TaskSpec,
};

fn bounds() -> impl Strategy<Value = PeriodBounds> {
    (1u32..=10_000, 1u32..=10_000).prop_map(|(a, b)| PeriodBounds {
        min_ms: a.min(b),
        max_ms: a.max(b),
    })
}

proptest! {
    #[test]
    fn prop_controller_stays_within_bounds(
        bounds in bounds(),
        period in 0u32..=20_000,
        est_us in 0u32..=MAX_EST_RUNTIME_US,
    ) {
        let controller = PeriodController::default();
        match controller.evaluate(period, est_us, bounds) {
            Adjustment::Changed { period_ms, .. } => {
                prop_assert!(bounds.contains(period_ms));
                prop_assert_ne!(period_ms, period);
            }
            Adjustment::Unchanged => {}
        }
    }

    #[test]
    fn prop_registered_period_within_normalised_bounds(
        period in any::<u32>(),
        min in any::<u32>(),
        max in any::<u32>(),
    ) {
        let clock = MockClock::new();
        let mut noop = || {};
        let mut sched: Scheduler<_, 1> = Scheduler::new(&clock);
        let id = sched
            .register(TaskSpec::new(period).bounds(min, max).callback(&mut noop))
            .unwrap();

        let stats = sched.stats(id).unwrap();
        prop_assert!(stats.min_period_ms >= 1);
        prop_assert!(stats.min_period_ms <= stats.max_period_ms);
        prop_assert!(stats.max_period_ms <= MAX_PERIOD_MS);
        prop_assert!(stats.period_ms >= stats.min_period_ms);
        prop_assert!(stats.period_ms <= stats.max_period_ms);
    }

    #[test]
    fn prop_dispatch_keeps_period_in_bounds(
        costs in prop::collection::vec(0u32..=400_000, 1..40),
        min in 1u32..=200,
        span in 0u32..=800,
    ) {
        let max = min + span;
        let clock = MockClock::new();
        let cost = std::cell::Cell::new(0u32);
        let mut work = || clock.advance(cost.get());
        let config = SchedulerConfig::new().with_tune_interval(1);
        let mut sched: Scheduler<_, 1> = Scheduler::with_config(&clock, config).unwrap();
        let id = sched
            .register(TaskSpec::new(min).bounds(min, max).callback(&mut work))
            .unwrap();

        for c in costs {
            cost.set(c);
            sched.dispatch();
            clock.advance(max * 1000);
            let period = sched.stats(id).unwrap().period_ms;
            prop_assert!((min..=max).contains(&period));
        }
    }

    #[test]
    fn prop_estimator_converges_to_constant_sample(
        sample in 0u32..=MAX_EST_RUNTIME_US,
        seed in 0u32..=MAX_EST_RUNTIME_US,
        alpha in 64u16..=1024,
    ) {
        let mut est = RuntimeEstimator::new(alpha);
        est.update(seed);
        for _ in 0..400 {
            est.update(sample);
        }
        prop_assert_eq!(est.estimate_us(), sample);
    }

    #[test]
    fn prop_elapsed_matches_true_delta(start in any::<u32>(), delta in any::<u32>()) {
        let end = start.wrapping_add(delta);
        prop_assert_eq!(elapsed_us(end, start), delta);
    }

    #[test]
    fn prop_dead_band_is_stable(
        bounds in bounds(),
        pct_tenths in 301u32..700,
    ) {
        // Period inside the bounds, load strictly between 30% and 70%
        let period = bounds.min_ms + (bounds.max_ms - bounds.min_ms) / 2;
        let est_us = (period as u64 * 1000 * pct_tenths as u64 / 1000) as u32;
        prop_assume!(est_us as u64 * 100 > period as u64 * 1000 * 30);
        prop_assume!((est_us as u64 * 100) < period as u64 * 1000 * 70);

        let controller = PeriodController::default();
        prop_assert_eq!(controller.evaluate(period, est_us, bounds), Adjustment::Unchanged);
    }
}
