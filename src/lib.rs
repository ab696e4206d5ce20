//! # Adaptick: Adaptive Cooperative Task Scheduler
//!
//! A small, allocation-free periodic task dispatcher for microcontrollers
//! that retunes each task's period from its measured execution time.
//!
//! ## Overview
//!
//! Tasks are plain callbacks registered with a nominal period and a pair of
//! period bounds. A caller-driven dispatch loop runs every enabled task whose
//! period has elapsed, to completion, and feeds the measured runtime into a
//! per-task estimator. A hysteresis controller then compares the estimated
//! load (`runtime / period`) against two thresholds:
//!
//! - **Above the high threshold**: the period grows so the task backs off
//! - **Below the low threshold**: the period shrinks toward its minimum
//! - **Between them**: nothing changes, so periods do not oscillate
//!
//! An optional resource guard watches a free-memory signal and sheds
//! non-critical tasks when it drops below a low-water mark.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │             Application callbacks (Runnable)            │
//! ├────────────────────────────────────────────────────────┤
//! │               Scheduler (scheduler.rs)                  │
//! │   register() · enable() · disable() · dispatch()        │
//! ├──────────────┬──────────────────┬──────────────────────┤
//! │  Estimator   │   Controller     │   Resource guard      │
//! │ estimator.rs │   controller.rs  │   memory.rs           │
//! │  ─ update()  │   ─ evaluate()   │   ─ is_tripped()      │
//! │  Q10 EWMA    │   hysteresis     │   ─ sheds()           │
//! ├──────────────┴──────────────────┴──────────────────────┤
//! │          Task model (task.rs) · Events (event.rs)       │
//! │     TaskSpec · Task · TaskStats · Event · EventSink     │
//! ├────────────────────────────────────────────────────────┤
//! │    Collaborators: Clock (clock.rs) · MemorySignal       │
//! │    Cortex-M4 port: DwtClock · StackGapSignal (arch/)    │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Fixed-Point Model
//!
//! Runtime estimates are kept in Q10 fixed point (`SCALE = 1024`):
//!
//! ```text
//! est_q' = (est_q · (SCALE − α) + sample · SCALE · α + SCALE/2) / SCALE
//! ```
//!
//! with all intermediates in `u64` and rounding to nearest. Samples are
//! capped at [`MAX_EST_RUNTIME_US`](config::MAX_EST_RUNTIME_US) first, so the
//! stored estimate always fits in `u32`. Load comparisons cross-multiply
//! (`est · 100` against `threshold · period · 1000`) instead of dividing.
//!
//! ## Time Model
//!
//! The clock is a free-running 32-bit microsecond counter that wraps after
//! about 71.6 minutes. Every interval is computed with wrapping subtraction,
//! which stays correct across a single wrap for intervals shorter than the
//! full range.
//!
//! ## Memory Model
//!
//! - **No heap**: the task table is a `heapless::Vec<Task, N>`
//! - **No `alloc`**: pure `core`, `std` only under `cfg(test)`
//! - **Borrowed callbacks**: the scheduler holds `&mut dyn Runnable` for
//!   its own lifetime, so callback state lives wherever the caller puts it
//! - **Single-threaded**: dispatch runs in one execution context; nothing
//!   in the crate is touched from interrupt handlers

#![cfg_attr(not(test), no_std)]

mod logging;

pub mod arch;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod estimator;
pub mod event;
pub mod memory;
pub mod scheduler;
pub mod task;

pub use clock::{Clock, MockClock};
pub use config::{FirstRun, SchedulerConfig};
pub use controller::{Adjustment, Direction, PeriodBounds, PeriodController};
pub use error::{Result, SchedulerError};
pub use estimator::RuntimeEstimator;
pub use event::{Event, EventSink, LogSink};
pub use memory::{MemorySignal, MockMemory, ResourceGuard};
pub use scheduler::{DispatchReport, Scheduler};
pub use task::{Runnable, Task, TaskId, TaskSpec, TaskStats};
