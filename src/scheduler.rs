//! # Scheduler
//!
//! Task registry and dispatch loop for Adaptick. Cooperative and
//! single-threaded: the embedding program calls [`Scheduler::dispatch`] from
//! its own main loop as often as it can, and every due task runs to
//! completion inside that call.
//!
//! ## Dispatch Algorithm
//!
//! On each call:
//! 1. **Sample the clock once**: every due-check in the pass uses the same
//!    `now`, so tasks keep consistent phase relative to each other.
//! 2. **Walk the table in registration order**: skip disabled tasks; a task
//!    is due when it never ran or `now − last_run ≥ period` (wrapping).
//! 3. **Execute**: time the callback with two more clock reads, then record
//!    `last_run = now`, bump `run_count`, and feed the estimator.
//! 4. **Tune** (every `tune_interval` runs): let the period controller move
//!    the period by one clamped step.
//! 5. **Guard**: after the walk, poll the memory signal once and shed
//!    non-critical tasks if it is below the low-water mark.
//!
//! ## Safety Net
//!
//! Nothing here panics. Unknown ids come back as `NotFound`, a full table
//! as `CapacityExceeded`, and all time arithmetic wraps or saturates.

use heapless::Vec;

use crate::clock::Clock;
use crate::config::{FirstRun, SchedulerConfig, MAX_TASKS};
use crate::controller::{Adjustment, Direction, PeriodController};
use crate::error::{Result, SchedulerError};
use crate::event::{Event, EventSink};
use crate::memory::{MemorySignal, ResourceGuard};
use crate::task::{Task, TaskId, TaskSpec, TaskStats};
use crate::{log_debug, log_error, log_info, log_trace, log_warn};

// ---------------------------------------------------------------------------
// Pass summary
// ---------------------------------------------------------------------------

/// What one call to [`Scheduler::dispatch`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DispatchReport {
    /// Callbacks invoked.
    pub executed: usize,
    /// Periods changed by the controller.
    pub retuned: usize,
    /// Tasks disabled by the resource guard.
    pub shed: usize,
}

// ---------------------------------------------------------------------------
// Scheduler struct
// ---------------------------------------------------------------------------

/// The adaptive dispatcher. Owns a fixed-capacity table of `N` tasks.
///
/// ## Design Notes
///
/// - Tasks live inline in a `heapless::Vec` (no heap)
/// - Ids are table indices; the table only grows, so ids stay valid
/// - Callbacks, the memory signal and the event sink are borrowed for `'a`,
///   which keeps their state owned by the caller
pub struct Scheduler<'a, C: Clock, const N: usize = MAX_TASKS> {
    tasks: Vec<Task<'a>, N>,
    clock: C,
    config: SchedulerConfig,
    controller: PeriodController,
    guard: ResourceGuard,
    memory: Option<&'a dyn MemorySignal>,
    sink: Option<&'a mut dyn EventSink>,
    passes: u32,
    guard_trips: u32,
}

impl<'a, C: Clock, const N: usize> Scheduler<'a, C, N> {
    /// Create an empty scheduler with the default configuration.
    pub fn new(clock: C) -> Self {
        let config = SchedulerConfig::new();
        Self {
            tasks: Vec::new(),
            clock,
            config,
            controller: PeriodController::new(config.controller),
            guard: ResourceGuard::new(config.guard),
            memory: None,
            sink: None,
            passes: 0,
            guard_trips: 0,
        }
    }

    /// Create an empty scheduler after validating `config`.
    pub fn with_config(clock: C, config: SchedulerConfig) -> Result<Self> {
        if let Err(err) = config.validate() {
            log_error!("scheduler config rejected: {}", err);
            return Err(err);
        }
        let mut scheduler = Self::new(clock);
        scheduler.config = config;
        scheduler.controller = PeriodController::new(config.controller);
        scheduler.guard = ResourceGuard::new(config.guard);
        Ok(scheduler)
    }

    /// Attach the platform's free-memory signal. Without one the resource
    /// guard never runs.
    pub fn attach_memory_signal(&mut self, signal: &'a dyn MemorySignal) {
        self.memory = Some(signal);
    }

    pub fn attach_sink(&mut self, sink: &'a mut dyn EventSink) {
        self.sink = Some(sink);
    }

    pub fn detach_sink(&mut self) {
        self.sink = None;
    }

    // -----------------------------------------------------------------------
    // Registry
    // -----------------------------------------------------------------------

    /// Register a new task.
    ///
    /// The period is clamped into the (normalised) bounds before it is
    /// stored. On error the table is untouched.
    ///
    /// # Returns
    /// - `Ok(id)`: the task's stable id
    /// - `Err(InvalidCallback)`: the spec has no callback
    /// - `Err(CapacityExceeded)`: all `N` slots are taken
    pub fn register(&mut self, mut spec: TaskSpec<'a>) -> Result<TaskId> {
        let Some(callback) = spec.callback.take() else {
            log_warn!("register rejected: no callback");
            return Err(SchedulerError::InvalidCallback);
        };
        if self.tasks.is_full() {
            log_warn!("register rejected: table full ({} slots)", N);
            return Err(SchedulerError::CapacityExceeded { capacity: N });
        }

        let id = TaskId::new(self.tasks.len());
        let last_run_us = match self.config.first_run {
            FirstRun::Immediate => None,
            FirstRun::AfterPeriod => Some(self.clock.now_us()),
        };
        let task = Task::new(id, spec, callback, last_run_us);
        let period_ms = task.period_ms();
        self.tasks
            .push(task)
            .map_err(|_| SchedulerError::CapacityExceeded { capacity: N })?;

        log_info!("task {} registered, period {} ms", id.index(), period_ms);
        self.emit(Event::Registered { id, period_ms });
        Ok(id)
    }

    /// Enable a task. Enabling an enabled task is a no-op.
    pub fn enable(&mut self, id: TaskId) -> Result<()> {
        self.set_enabled(id, true)
    }

    /// Disable a task. Takes effect at its next due-check.
    pub fn disable(&mut self, id: TaskId) -> Result<()> {
        self.set_enabled(id, false)
    }

    /// Flip a task's enabled flag and return the new state.
    pub fn toggle(&mut self, id: TaskId) -> Result<bool> {
        let enabled = !self.task(id)?.is_enabled();
        self.set_enabled(id, enabled)?;
        Ok(enabled)
    }

    fn set_enabled(&mut self, id: TaskId, enabled: bool) -> Result<()> {
        let task = self.task_mut(id)?;
        if task.is_enabled() == enabled {
            return Ok(());
        }
        task.set_enabled(enabled);
        self.emit(if enabled {
            Event::Enabled { id }
        } else {
            Event::Disabled { id }
        });
        Ok(())
    }

    /// Operator override of a task's current period, clamped into its
    /// bounds. Returns the period actually stored.
    pub fn set_period(&mut self, id: TaskId, period_ms: u32) -> Result<u32> {
        let task = self.task_mut(id)?;
        let old_ms = task.period_ms();
        let new_ms = task.set_period(period_ms);
        if new_ms != old_ms {
            let direction = if new_ms > old_ms {
                Direction::Up
            } else {
                Direction::Down
            };
            self.emit(Event::PeriodTuned {
                id,
                direction,
                old_ms,
                new_ms,
            });
        }
        Ok(new_ms)
    }

    /// Restore every task to its registered period and clear runtime
    /// history and run counts. Enabled flags are not touched.
    pub fn reset_adaptive_state(&mut self) {
        for task in self.tasks.iter_mut() {
            task.reset_adaptive();
        }
        let tasks = self.tasks.len();
        log_info!("adaptive state reset for {} tasks", tasks);
        self.emit(Event::AdaptiveReset { tasks });
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Run one pass over the table. Never blocks waiting for work.
    pub fn dispatch(&mut self) -> DispatchReport {
        let now = self.clock.now_us();
        let mut report = DispatchReport::default();

        for index in 0..self.tasks.len() {
            let task = &mut self.tasks[index];
            if !task.is_enabled() || !task.is_due(now) {
                continue;
            }

            let clock = &self.clock;
            let runtime_us = task.execute(|| clock.now_us());
            task.record_run(now, runtime_us);
            report.executed += 1;
            log_trace!("task {} ran in {} us", index, runtime_us);

            let tune_now = task.run_count() % self.config.tune_interval == 0;
            if tune_now && self.tune(index) {
                report.retuned += 1;
            }

            self.clock.yield_now();
        }

        report.shed = self.run_guard();
        self.passes = self.passes.wrapping_add(1);
        report
    }

    /// Let the controller adjust one task. Returns whether the period moved.
    fn tune(&mut self, index: usize) -> bool {
        let task = &mut self.tasks[index];
        let old_ms = task.period_ms();
        let est_us = task.estimator().estimate_us();

        match self.controller.evaluate(old_ms, est_us, task.bounds()) {
            Adjustment::Unchanged => false,
            Adjustment::Changed {
                direction,
                period_ms,
            } => {
                let new_ms = task.set_period(period_ms);
                let id = task.id();
                log_debug!(
                    "task {} period {} -> {} ms (est {} us)",
                    id.index(),
                    old_ms,
                    new_ms,
                    est_us
                );
                self.emit(Event::PeriodTuned {
                    id,
                    direction,
                    old_ms,
                    new_ms,
                });
                true
            }
        }
    }

    /// Poll the memory signal and shed non-critical tasks if it is low.
    fn run_guard(&mut self) -> usize {
        let Some(signal) = self.memory else {
            return 0;
        };
        let free = signal.free_memory_estimate();
        if !self.guard.is_tripped(free) {
            return 0;
        }

        let mut shed = 0;
        for index in 0..self.tasks.len() {
            let task = &mut self.tasks[index];
            if !task.is_enabled() || !self.guard.sheds(task.priority()) {
                continue;
            }
            task.set_enabled(false);
            let (id, priority) = (task.id(), task.priority());
            self.emit(Event::GuardDisabled { id, priority, free });
            shed += 1;
        }

        if shed > 0 {
            self.guard_trips = self.guard_trips.wrapping_add(1);
            log_warn!("memory low ({} free): disabled {} tasks", free, shed);
        }
        shed
    }

    fn emit(&mut self, event: Event) {
        if let Some(sink) = self.sink.as_mut() {
            sink.notify(&event);
        }
    }

    // -----------------------------------------------------------------------
    // Lookup and diagnostics
    // -----------------------------------------------------------------------

    pub fn task(&self, id: TaskId) -> Result<&Task<'a>> {
        self.tasks
            .get(id.index())
            .ok_or(SchedulerError::NotFound { id: id.index() })
    }

    fn task_mut(&mut self, id: TaskId) -> Result<&mut Task<'a>> {
        self.tasks
            .get_mut(id.index())
            .ok_or(SchedulerError::NotFound { id: id.index() })
    }

    /// Read-only snapshot of one task.
    pub fn stats(&self, id: TaskId) -> Result<TaskStats> {
        self.task(id).map(Task::stats)
    }

    pub fn is_enabled(&self, id: TaskId) -> Result<bool> {
        self.task(id).map(Task::is_enabled)
    }

    /// First task whose display name matches exactly.
    pub fn find_by_name(&self, name: &str) -> Option<TaskId> {
        self.tasks.iter().find(|t| t.name() == name).map(Task::id)
    }

    pub fn tasks(&self) -> &[Task<'a>] {
        &self.tasks
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        N
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Completed dispatch passes (wrapping).
    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Passes in which the guard disabled at least one task.
    pub fn guard_trips(&self) -> u32 {
        self.guard_trips
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
