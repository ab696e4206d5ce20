//! # Period Controller
//!
//! Hysteresis policy that nudges a task's period toward a target load,
//! where load is the share of the period spent executing the task:
//!
//! ```text
//!   load = est_runtime_us / (period_ms · 1000)
//!
//!   0%          low_load_pct          high_load_pct          100%
//!   |── shrink ──────|────── dead band ──────|──── grow ──────|
//!      −period/10                                +period/5
//! ```
//!
//! Every step is at least 1 ms and the result is clamped into
//! `[min_period, max_period]`. Inside the dead band the period is left
//! alone, so noise in the estimate cannot make the period oscillate.
//!
//! All comparisons are done by cross-multiplication in `u64`; no division
//! and no floating point on the hot path.

use crate::config::ControllerConfig;

/// Direction of a period change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Period lengthened: the task was using too much of its budget.
    Up,
    /// Period shortened: the task has headroom to run more often.
    Down,
}

/// Outcome of one controller evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Adjustment {
    /// The period moved to `period_ms`.
    Changed { direction: Direction, period_ms: u32 },
    /// Load inside the dead band, or already pinned at the bound.
    Unchanged,
}

/// Period bounds of one task, inclusive, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeriodBounds {
    pub min_ms: u32,
    pub max_ms: u32,
}

impl PeriodBounds {
    #[inline]
    pub fn clamp(&self, period_ms: u32) -> u32 {
        period_ms.clamp(self.min_ms, self.max_ms)
    }

    #[inline]
    pub fn contains(&self, period_ms: u32) -> bool {
        (self.min_ms..=self.max_ms).contains(&period_ms)
    }
}

/// Load in whole percent, saturating at `u32::MAX`. Diagnostics only.
pub fn load_pct(est_runtime_us: u32, period_ms: u32) -> u32 {
    let period_us = period_ms as u64 * 1000;
    if period_us == 0 {
        return u32::MAX;
    }
    (est_runtime_us as u64 * 100 / period_us).min(u32::MAX as u64) as u32
}

/// Stateless hysteresis controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeriodController {
    config: ControllerConfig,
}

impl PeriodController {
    pub const fn new(config: ControllerConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Evaluate one task and propose its next period.
    pub fn evaluate(&self, period_ms: u32, est_runtime_us: u32, bounds: PeriodBounds) -> Adjustment {
        let cfg = &self.config;
        let runtime_pct = est_runtime_us as u64 * 100;
        let period_us = period_ms as u64 * 1000;

        let next = if runtime_pct > period_us * cfg.high_load_pct as u64 {
            let step = (period_ms / cfg.grow_divisor).max(1);
            period_ms.saturating_add(step).min(bounds.max_ms)
        } else if runtime_pct < period_us * cfg.low_load_pct as u64 {
            let step = (period_ms / cfg.shrink_divisor).max(1);
            period_ms.saturating_sub(step).max(bounds.min_ms)
        } else {
            return Adjustment::Unchanged;
        };

        // A period that drifted outside the bounds is pulled back in
        let next = bounds.clamp(next);
        if next == period_ms {
            Adjustment::Unchanged
        } else if next > period_ms {
            Adjustment::Changed {
                direction: Direction::Up,
                period_ms: next,
            }
        } else {
            Adjustment::Changed {
                direction: Direction::Down,
                period_ms: next,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: PeriodBounds = PeriodBounds {
        min_ms: 50,
        max_ms: 500,
    };

    fn controller() -> PeriodController {
        PeriodController::new(ControllerConfig::default())
    }

    #[test]
    fn test_heavy_load_grows_by_a_fifth() {
        // 90 ms of a 100 ms period = 90%
        let adj = controller().evaluate(100, 90_000, BOUNDS);
        assert_eq!(
            adj,
            Adjustment::Changed {
                direction: Direction::Up,
                period_ms: 120
            }
        );
    }

    #[test]
    fn test_light_load_shrinks_by_a_tenth() {
        let adj = controller().evaluate(100, 5_000, BOUNDS);
        assert_eq!(
            adj,
            Adjustment::Changed {
                direction: Direction::Down,
                period_ms: 90
            }
        );
    }

    #[test]
    fn test_dead_band_holds() {
        let c = controller();
        assert_eq!(c.evaluate(100, 50_000, BOUNDS), Adjustment::Unchanged);
        // Exactly on a threshold counts as inside the band
        assert_eq!(c.evaluate(100, 70_000, BOUNDS), Adjustment::Unchanged);
        assert_eq!(c.evaluate(100, 30_000, BOUNDS), Adjustment::Unchanged);
    }

    #[test]
    fn test_clamped_at_max() {
        let c = controller();
        assert_eq!(
            c.evaluate(480, 480_000, BOUNDS),
            Adjustment::Changed {
                direction: Direction::Up,
                period_ms: 500
            }
        );
        assert_eq!(c.evaluate(500, 500_000, BOUNDS), Adjustment::Unchanged);
    }

    #[test]
    fn test_clamped_at_min() {
        let c = controller();
        assert_eq!(
            c.evaluate(52, 0, BOUNDS),
            Adjustment::Changed {
                direction: Direction::Down,
                period_ms: 50
            }
        );
        assert_eq!(c.evaluate(50, 0, BOUNDS), Adjustment::Unchanged);
    }

    #[test]
    fn test_minimum_step_is_one_ms() {
        let bounds = PeriodBounds { min_ms: 1, max_ms: 10 };
        let c = controller();
        assert_eq!(
            c.evaluate(3, 3_000, bounds),
            Adjustment::Changed {
                direction: Direction::Up,
                period_ms: 4
            }
        );
        assert_eq!(
            c.evaluate(3, 0, bounds),
            Adjustment::Changed {
                direction: Direction::Down,
                period_ms: 2
            }
        );
    }

    #[test]
    fn test_load_pct() {
        assert_eq!(load_pct(90_000, 100), 90);
        assert_eq!(load_pct(5_000, 100), 5);
        assert_eq!(load_pct(1, 0), u32::MAX);
    }
}
