//! # Resource Guard
//!
//! Memory-pressure policy run once per dispatch pass. When the platform's
//! free-memory signal drops below the configured low-water mark, every
//! enabled task whose priority is strictly above the critical threshold is
//! disabled. Lower priority numbers are more critical.
//!
//! There is no automatic re-enable. Shed tasks stay off until the embedding
//! program turns them back on with `enable`/`toggle`, so a signal hovering
//! around the mark cannot make tasks flap.

use core::cell::Cell;

use crate::config::GuardConfig;

/// Free-memory signal supplied by the platform.
///
/// Units are implementation-defined (bytes for the Cortex-M port); the
/// guard only compares the value against the low-water mark.
pub trait MemorySignal {
    fn free_memory_estimate(&self) -> usize;
}

impl<M: MemorySignal + ?Sized> MemorySignal for &M {
    fn free_memory_estimate(&self) -> usize {
        (**self).free_memory_estimate()
    }
}

/// Stateless decision half of the guard. The scheduler applies it to the
/// task table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceGuard {
    config: GuardConfig,
}

impl ResourceGuard {
    pub const fn new(config: GuardConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Whether `free` is below the low-water mark.
    #[inline]
    pub const fn is_tripped(&self, free: usize) -> bool {
        free < self.config.low_water_mark
    }

    /// Whether a task of this priority is shed when the guard trips.
    #[inline]
    pub const fn sheds(&self, priority: u8) -> bool {
        priority > self.config.critical_priority
    }
}

/// Settable memory signal for host tests and simulation.
#[derive(Debug, Default)]
pub struct MockMemory {
    free: Cell<usize>,
    reads: Cell<u32>,
}

impl MockMemory {
    pub const fn new(free: usize) -> Self {
        Self {
            free: Cell::new(free),
            reads: Cell::new(0),
        }
    }

    pub fn set(&self, free: usize) {
        self.free.set(free);
    }

    /// Number of times the signal was polled.
    pub fn reads(&self) -> u32 {
        self.reads.get()
    }
}

impl MemorySignal for MockMemory {
    fn free_memory_estimate(&self) -> usize {
        self.reads.set(self.reads.get().wrapping_add(1));
        self.free.get()
    }
}
