//! # Runtime Estimator
//!
//! Fixed-point exponentially-weighted moving average of a task's measured
//! execution time. No floating point: the estimate is stored scaled by
//! [`SCALE`] (Q10) and the update is computed in a `u64` accumulator.
//!
//! ```text
//! first sample:   est_q = sample · SCALE
//! afterwards:     est_q = (α · sample · SCALE + (SCALE − α) · est_q + SCALE/2) / SCALE
//! ```
//!
//! Both the mix and the conversion back to microseconds round to nearest,
//! so a constant input (with α ≥ 2) reads back exactly.
//!
//! Samples are capped at [`MAX_EST_RUNTIME_US`] before entering the filter
//! so a single pathological measurement cannot overflow the estimate or pin
//! it for many periods.

use crate::config::{MAX_EST_RUNTIME_US, SCALE};

/// Smoothed runtime of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RuntimeEstimator {
    /// Estimate in µs, scaled by `SCALE`.
    estimate_q: u32,
    /// Weight of a new sample, in `[0, SCALE]`.
    alpha_q: u16,
    /// Whether at least one sample has been taken since the last reset.
    primed: bool,
}

impl RuntimeEstimator {
    /// Create an empty estimator. `alpha_q` is capped at `SCALE`.
    pub const fn new(alpha_q: u16) -> Self {
        let alpha_q = if alpha_q as u32 > SCALE {
            SCALE as u16
        } else {
            alpha_q
        };
        Self {
            estimate_q: 0,
            alpha_q,
            primed: false,
        }
    }

    /// Feed one measured runtime in microseconds.
    pub fn update(&mut self, sample_us: u32) {
        let sample_q = sample_us.min(MAX_EST_RUNTIME_US) as u64 * SCALE as u64;

        if !self.primed {
            self.estimate_q = sample_q as u32;
            self.primed = true;
            return;
        }

        let alpha = self.alpha_q as u64;
        let keep = SCALE as u64 - alpha;
        let half = SCALE as u64 / 2;
        let mixed = (alpha * sample_q + keep * self.estimate_q as u64 + half) / SCALE as u64;
        // Both terms are bounded by the capped sample, so this never truncates
        self.estimate_q = mixed as u32;
    }

    /// Smoothed runtime in microseconds, rounded to nearest.
    #[inline]
    pub const fn estimate_us(&self) -> u32 {
        (self.estimate_q + SCALE / 2) / SCALE
    }

    /// Raw Q10 estimate.
    #[inline]
    pub const fn estimate_q(&self) -> u32 {
        self.estimate_q
    }

    #[inline]
    pub const fn alpha_q(&self) -> u16 {
        self.alpha_q
    }

    #[inline]
    pub const fn is_primed(&self) -> bool {
        self.primed
    }

    /// Forget all samples. The smoothing weight is kept.
    pub fn reset(&mut self) {
        self.estimate_q = 0;
        self.primed = false;
    }
}
