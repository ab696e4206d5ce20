//! # Adaptick Configuration
//!
//! Compile-time constants governing the dispatcher, plus the runtime
//! [`SchedulerConfig`] that carries the tunable controller and guard
//! parameters. All limits are fixed at compile time, with no dynamic allocation.

use crate::error::{Result, SchedulerError};

// ---------------------------------------------------------------------------
// Table and fixed-point limits
// ---------------------------------------------------------------------------

/// Default number of task slots in a [`Scheduler`](crate::scheduler::Scheduler).
/// The table is stored inline, so each slot costs one task record of RAM.
pub const MAX_TASKS: usize = 8;

/// Maximum length in bytes of a task's display name. Longer names are
/// truncated at registration.
pub const NAME_LEN: usize = 16;

/// Fixed-point scale of the runtime estimator (Q10: 1024 = 1.0).
pub const SCALE: u32 = 1024;

/// Runtime samples above this (2 s) are capped before entering the filter.
/// `MAX_EST_RUNTIME_US * SCALE` must fit in a `u32` estimate.
pub const MAX_EST_RUNTIME_US: u32 = 2_000_000;

/// Default smoothing weight (256/1024 ≈ 0.25).
pub const DEFAULT_ALPHA_Q: u16 = 256;

// ---------------------------------------------------------------------------
// Period bounds
// ---------------------------------------------------------------------------

/// Default lower bound for a task's period, in milliseconds.
pub const DEFAULT_MIN_PERIOD_MS: u32 = 1;

/// Default upper bound for a task's period, in milliseconds.
pub const DEFAULT_MAX_PERIOD_MS: u32 = 60_000;

/// Largest period whose microsecond form still fits the 32-bit clock
/// modulus. Anything longer could never be observed as elapsed.
pub const MAX_PERIOD_MS: u32 = u32::MAX / 1000;

// ---------------------------------------------------------------------------
// Period controller defaults
// ---------------------------------------------------------------------------

/// Load (runtime / period, percent) above which the period grows.
pub const HIGH_LOAD_PCT: u32 = 70;

/// Load (runtime / period, percent) below which the period shrinks.
pub const LOW_LOAD_PCT: u32 = 30;

/// Growth step divisor: `period / 5` = +20%.
pub const GROW_DIVISOR: u32 = 5;

/// Shrink step divisor: `period / 10` = −10%.
pub const SHRINK_DIVISOR: u32 = 10;

/// The controller runs once every `TUNE_INTERVAL` executions of a task.
pub const TUNE_INTERVAL: u32 = 8;

// ---------------------------------------------------------------------------
// Resource guard defaults
// ---------------------------------------------------------------------------

/// Free-memory low-water mark in bytes. `0` disables the guard.
pub const DEFAULT_LOW_WATER_BYTES: usize = 0;

/// Tasks with a priority strictly above this are shed under memory pressure.
pub const DEFAULT_CRITICAL_PRIORITY: u8 = 1;

/// System clock frequency in Hz (default for STM32F4 at 16 MHz HSI).
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;

// ---------------------------------------------------------------------------
// Runtime configuration
// ---------------------------------------------------------------------------

/// When a freshly registered task becomes due for the first time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FirstRun {
    /// The task has no last-run timestamp and runs on the next pass.
    #[default]
    Immediate,
    /// The last-run timestamp is primed with the clock at registration,
    /// so the first execution happens one full period later.
    AfterPeriod,
}

/// Hysteresis thresholds and step sizes of the period controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerConfig {
    /// Grow the period when load exceeds this percentage.
    pub high_load_pct: u32,
    /// Shrink the period when load falls below this percentage.
    pub low_load_pct: u32,
    /// Growth step is `period / grow_divisor`, at least 1 ms.
    pub grow_divisor: u32,
    /// Shrink step is `period / shrink_divisor`, at least 1 ms.
    pub shrink_divisor: u32,
}

impl ControllerConfig {
    pub const fn new() -> Self {
        Self {
            high_load_pct: HIGH_LOAD_PCT,
            low_load_pct: LOW_LOAD_PCT,
            grow_divisor: GROW_DIVISOR,
            shrink_divisor: SHRINK_DIVISOR,
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Memory-pressure policy of the resource guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GuardConfig {
    /// Trip when the free-memory signal drops below this value.
    pub low_water_mark: usize,
    /// Tasks whose priority is strictly greater are disabled on a trip.
    pub critical_priority: u8,
}

impl GuardConfig {
    pub const fn new() -> Self {
        Self {
            low_water_mark: DEFAULT_LOW_WATER_BYTES,
            critical_priority: DEFAULT_CRITICAL_PRIORITY,
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Runtime configuration of a [`Scheduler`](crate::scheduler::Scheduler).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SchedulerConfig {
    pub controller: ControllerConfig,
    pub guard: GuardConfig,
    /// Run the controller every `tune_interval` executions (1 = every run).
    pub tune_interval: u32,
    pub first_run: FirstRun,
}

impl SchedulerConfig {
    pub const fn new() -> Self {
        Self {
            controller: ControllerConfig::new(),
            guard: GuardConfig::new(),
            tune_interval: TUNE_INTERVAL,
            first_run: FirstRun::Immediate,
        }
    }

    pub const fn with_thresholds(mut self, low_load_pct: u32, high_load_pct: u32) -> Self {
        self.controller.low_load_pct = low_load_pct;
        self.controller.high_load_pct = high_load_pct;
        self
    }

    pub const fn with_steps(mut self, grow_divisor: u32, shrink_divisor: u32) -> Self {
        self.controller.grow_divisor = grow_divisor;
        self.controller.shrink_divisor = shrink_divisor;
        self
    }

    pub const fn with_tune_interval(mut self, runs: u32) -> Self {
        self.tune_interval = runs;
        self
    }

    pub const fn with_first_run(mut self, policy: FirstRun) -> Self {
        self.first_run = policy;
        self
    }

    pub const fn with_guard(mut self, low_water_mark: usize, critical_priority: u8) -> Self {
        self.guard.low_water_mark = low_water_mark;
        self.guard.critical_priority = critical_priority;
        self
    }

    /// Reject parameter combinations that would break the dead band or
    /// divide by zero.
    pub fn validate(&self) -> Result<()> {
        let c = &self.controller;
        if c.high_load_pct > 100 {
            return Err(SchedulerError::InvalidConfig {
                reason: "high load threshold above 100%",
            });
        }
        if c.low_load_pct >= c.high_load_pct {
            return Err(SchedulerError::InvalidConfig {
                reason: "low load threshold must be below high threshold",
            });
        }
        if c.grow_divisor == 0 || c.shrink_divisor == 0 {
            return Err(SchedulerError::InvalidConfig {
                reason: "step divisor is zero",
            });
        }
        if self.tune_interval == 0 {
            return Err(SchedulerError::InvalidConfig {
                reason: "tune interval is zero",
            });
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SchedulerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tune_interval, TUNE_INTERVAL);
        assert_eq!(config.first_run, FirstRun::Immediate);
        assert_eq!(config.controller.high_load_pct, 70);
        assert_eq!(config.controller.low_load_pct, 30);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let config = SchedulerConfig::new().with_thresholds(70, 30);
        assert!(matches!(
            config.validate(),
            Err(SchedulerError::InvalidConfig { .. })
        ));

        let config = SchedulerConfig::new().with_thresholds(50, 50);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_divisor_and_interval_rejected() {
        assert!(SchedulerConfig::new().with_steps(0, 10).validate().is_err());
        assert!(SchedulerConfig::new().with_steps(5, 0).validate().is_err());
        assert!(SchedulerConfig::new().with_tune_interval(0).validate().is_err());
        assert!(SchedulerConfig::new().with_thresholds(10, 101).validate().is_err());
    }

    #[test]
    fn test_fixed_point_limits_fit() {
        // The scaled cap must be representable in the u32 estimate
        assert!((MAX_EST_RUNTIME_US as u64) * (SCALE as u64) <= u32::MAX as u64);
        assert!((MAX_PERIOD_MS as u64) * 1000 <= u32::MAX as u64);
    }
}
