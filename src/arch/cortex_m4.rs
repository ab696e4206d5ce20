//! # Cortex-M4 Port Layer
//!
//! Hardware-specific collaborators for the ARM Cortex-M4 (Thumb-2):
//!
//! - [`DwtClock`]: microsecond clock derived from the DWT cycle counter
//! - [`StackGapSignal`]: free RAM between the main stack pointer and the
//!   start of the heap region
//!
//! ## Clock Extension
//!
//! `CYCCNT` wraps every 2³² cycles (~268 s at 16 MHz). Dividing it directly
//! would produce a microsecond value that wraps at an odd modulus and breaks
//! wrapping subtraction, so the clock accumulates cycle deltas instead and
//! keeps its own 32-bit microsecond counter, which wraps at `u32::MAX` like
//! the dispatcher expects. It must be read at least once per `CYCCNT` wrap;
//! any dispatch loop does that many times over.
//!
//! ## Memory Signal
//!
//! With no allocator the stack grows down toward the end of static data.
//! The gap between the live stack pointer and `__sheap` (provided by the
//! `cortex-m-rt` linker script) is the RAM still available, minus whatever
//! the application reserves for its own heap.

use core::cell::Cell;

use cortex_m::peripheral::{DCB, DWT};
use cortex_m::register;

use crate::clock::Clock;
use crate::memory::MemorySignal;

// ---------------------------------------------------------------------------
// DWT cycle-counter clock
// ---------------------------------------------------------------------------

/// Free-running microsecond clock built on `DWT.CYCCNT`.
pub struct DwtClock {
    cycles_per_us: u32,
    last_cycles: Cell<u32>,
    /// Cycles not yet converted into a whole microsecond.
    carry: Cell<u32>,
    now_us: Cell<u32>,
}

impl DwtClock {
    /// Enable the trace unit and the cycle counter, and start counting.
    ///
    /// # Parameters
    /// - `sysclk_hz`: core clock frequency; values below 1 MHz are treated
    ///   as 1 MHz
    pub fn new(dcb: &mut DCB, dwt: &mut DWT, sysclk_hz: u32) -> Self {
        dcb.enable_trace();
        dwt.enable_cycle_counter();
        Self {
            cycles_per_us: (sysclk_hz / 1_000_000).max(1),
            last_cycles: Cell::new(DWT::cycle_count()),
            carry: Cell::new(0),
            now_us: Cell::new(0),
        }
    }
}

impl Clock for DwtClock {
    fn now_us(&self) -> u32 {
        let cycles = DWT::cycle_count();
        let delta = cycles.wrapping_sub(self.last_cycles.get());
        self.last_cycles.set(cycles);

        let total = delta as u64 + self.carry.get() as u64;
        let per_us = self.cycles_per_us as u64;
        self.carry.set((total % per_us) as u32);

        let now = self.now_us.get().wrapping_add((total / per_us) as u32);
        self.now_us.set(now);
        now
    }
}

// ---------------------------------------------------------------------------
// Stack-gap memory signal
// ---------------------------------------------------------------------------

extern "C" {
    /// Start of the heap region (end of `.bss`/`.uninit`), from `link.x`.
    static __sheap: u32;
}

/// Free bytes between the main stack pointer and the heap start.
pub struct StackGapSignal {
    heap_reserved: usize,
}

impl StackGapSignal {
    /// `heap_reserved` bytes above `__sheap` are not counted as free.
    pub const fn new(heap_reserved: usize) -> Self {
        Self { heap_reserved }
    }
}

impl MemorySignal for StackGapSignal {
    fn free_memory_estimate(&self) -> usize {
        let sp = register::msp::read() as usize;
        // Safety: only the address of the linker symbol is taken, never
        // its contents.
        let heap_start = unsafe { core::ptr::addr_of!(__sheap) } as usize;
        sp.saturating_sub(heap_start.saturating_add(self.heap_reserved))
    }
}
