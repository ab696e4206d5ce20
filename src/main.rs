//! # Adaptick Example Firmware
//!
//! Runs the adaptive dispatcher with four tasks of very different cost:
//!
//! | Task | Period | Bounds (ms) | Priority | Behavior |
//! |------|--------|-------------|----------|----------|
//! | `imu` | 10 ms | 5–100 | 0 | Short fixed burst, stays fast |
//! | `filter` | 20 ms | 10–400 | 1 | Heavy burst, backs off |
//! | `telemetry` | 250 ms | 100–2000 | 2 | Light work, shrinks toward its minimum |
//! | `housekeeping` | 1000 ms | 500–5000 | 3 | Cost grows with every run |
//!
//! ## Expected Dynamics
//!
//! 1. **First pass**: every task runs once immediately and seeds its
//!    runtime estimate with the first measurement.
//!
//! 2. **Tuning**: every eighth run the controller compares each estimate
//!    against the current period:
//!    - `filter` sits above 70% load and its period grows by a fifth.
//!    - `telemetry` sits under 30% load and its period shrinks by a tenth.
//!    - `imu` stays in the dead band and keeps its period.
//!
//! 3. **Pressure**: `housekeeping` keeps a growing stack buffer. Once the
//!    gap between stack and heap falls under the low-water mark, the guard
//!    sheds every task above priority 1; `imu` and `filter` keep running.

#![no_std]
#![no_main]

use cortex_m_rt::entry;
use panic_halt as _;

use adaptick::arch::cortex_m4::{DwtClock, StackGapSignal};
use adaptick::config::SYSTEM_CLOCK_HZ;
use adaptick::{LogSink, Scheduler, SchedulerConfig, TaskSpec};

/// Free bytes under which non-critical tasks are shed.
const LOW_WATER_BYTES: usize = 4 * 1024;

/// Bytes above `__sheap` kept out of the free-memory estimate.
const HEAP_RESERVED_BYTES: usize = 1024;

// ---------------------------------------------------------------------------
// Workloads
// ---------------------------------------------------------------------------

/// Spin for roughly `iterations` loop turns.
fn burn(iterations: u32) -> u32 {
    let mut acc: u32 = 0;
    for i in 0..iterations {
        acc = acc.wrapping_add(i);
        cortex_m::asm::nop();
    }
    acc
}

/// Touch `depth` bytes of stack so the memory signal sees it.
fn deep_work(depth: usize) -> u32 {
    let mut buf = [0u8; 256];
    let mut sum: u32 = 0;
    for chunk in 0..depth / buf.len() {
        buf.fill(chunk as u8);
        sum = sum.wrapping_add(buf.iter().map(|&b| b as u32).sum::<u32>());
    }
    sum
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

#[entry]
fn main() -> ! {
    let mut cp = cortex_m::Peripherals::take().expect("core peripherals taken twice");

    let clock = DwtClock::new(&mut cp.DCB, &mut cp.DWT, SYSTEM_CLOCK_HZ);
    let memory = StackGapSignal::new(HEAP_RESERVED_BYTES);
    let mut sink = LogSink;

    // Callback state lives on this frame, which never returns.
    let mut samples: u32 = 0;
    let mut imu = || samples = samples.wrapping_add(burn(2_000));

    let mut filtered: u32 = 0;
    let mut filter = || filtered = filtered.wrapping_add(burn(60_000));

    let mut frames: u32 = 0;
    let mut telemetry = || frames = frames.wrapping_add(burn(500));

    let mut depth: usize = 256;
    let mut housekeeping = || {
        let _ = deep_work(depth);
        depth = depth.saturating_add(256);
    };

    let config = SchedulerConfig::new().with_guard(LOW_WATER_BYTES, 1);
    let mut sched: Scheduler<'_, DwtClock> =
        Scheduler::with_config(clock, config).expect("scheduler config");
    sched.attach_memory_signal(&memory);
    sched.attach_sink(&mut sink);

    sched
        .register(
            TaskSpec::new(10)
                .name("imu")
                .bounds(5, 100)
                .priority(0)
                .callback(&mut imu),
        )
        .expect("register imu");
    sched
        .register(
            TaskSpec::new(20)
                .name("filter")
                .bounds(10, 400)
                .priority(1)
                .callback(&mut filter),
        )
        .expect("register filter");
    sched
        .register(
            TaskSpec::new(250)
                .name("telemetry")
                .bounds(100, 2_000)
                .priority(2)
                .callback(&mut telemetry),
        )
        .expect("register telemetry");
    sched
        .register(
            TaskSpec::new(1_000)
                .name("housekeeping")
                .bounds(500, 5_000)
                .priority(3)
                .callback(&mut housekeeping),
        )
        .expect("register housekeeping");

    loop {
        sched.dispatch();
    }
}
