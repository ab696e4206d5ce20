//! # Task Record
//!
//! Defines the unit of periodic work managed by the dispatcher. Each task
//! carries its callback, its timing state, and its own runtime estimator.
//!
//! ## Timing Model
//!
//! - `base_period` is the period requested at registration and never changes.
//! - `period` is the current period; the controller moves it within
//!   `[min_period, max_period]`.
//! - `last_run` is the dispatch timestamp of the most recent execution, or
//!   `None` for a task that has never run and is due immediately.
//!
//! Periods are kept in milliseconds and timestamps in microseconds, the
//! same split the measurements naturally have on a small MCU.

use core::fmt;

use heapless::String;

use crate::clock::elapsed_us;
use crate::config::{
    DEFAULT_ALPHA_Q, DEFAULT_MAX_PERIOD_MS, DEFAULT_MIN_PERIOD_MS, MAX_PERIOD_MS, NAME_LEN,
};
use crate::controller::{load_pct, PeriodBounds};
use crate::estimator::RuntimeEstimator;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Stable task handle: the task's index in registration order.
///
/// Ids are never reused; tasks are disabled, not removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskId(usize);

impl TaskId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for TaskId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Callback capability
// ---------------------------------------------------------------------------

/// Work executed by a task.
///
/// Implementations run to completion and must not block: a callback that
/// never returns stalls every other task. Any state the callback needs is
/// captured by the implementor, never owned by the scheduler.
pub trait Runnable {
    fn run(&mut self);
}

impl<F: FnMut()> Runnable for F {
    fn run(&mut self) {
        self()
    }
}

// ---------------------------------------------------------------------------
// Registration parameters
// ---------------------------------------------------------------------------

/// Registration request for one task.
///
/// ```
/// use adaptick::task::TaskSpec;
///
/// let mut blink = || {};
/// let spec = TaskSpec::new(100)
///     .name("blink")
///     .bounds(50, 500)
///     .priority(2)
///     .callback(&mut blink);
/// # let _ = spec;
/// ```
pub struct TaskSpec<'a> {
    pub(crate) callback: Option<&'a mut dyn Runnable>,
    pub(crate) name: &'a str,
    pub(crate) period_ms: u32,
    pub(crate) min_period_ms: u32,
    pub(crate) max_period_ms: u32,
    pub(crate) alpha_q: u16,
    pub(crate) priority: u8,
    pub(crate) enabled: bool,
}

impl<'a> TaskSpec<'a> {
    /// New spec with default bounds (1 ms – 60 s), α = 0.25, priority 0,
    /// enabled. A callback must be attached before registration.
    pub fn new(period_ms: u32) -> Self {
        Self {
            callback: None,
            name: "",
            period_ms,
            min_period_ms: DEFAULT_MIN_PERIOD_MS,
            max_period_ms: DEFAULT_MAX_PERIOD_MS,
            alpha_q: DEFAULT_ALPHA_Q,
            priority: 0,
            enabled: true,
        }
    }

    pub fn callback(mut self, callback: &'a mut dyn Runnable) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Display name; truncated to `NAME_LEN` bytes at a char boundary.
    pub fn name(mut self, name: &'a str) -> Self {
        self.name = name;
        self
    }

    /// Inclusive period bounds in milliseconds.
    pub fn bounds(mut self, min_period_ms: u32, max_period_ms: u32) -> Self {
        self.min_period_ms = min_period_ms;
        self.max_period_ms = max_period_ms;
        self
    }

    /// EWMA weight in Q10 (`0..=1024`); larger reacts faster.
    pub fn alpha(mut self, alpha_q: u16) -> Self {
        self.alpha_q = alpha_q;
        self
    }

    /// Lower is more critical; see the resource guard.
    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Normalised bounds: ordered, at least 1 ms, at most `MAX_PERIOD_MS`.
    pub(crate) fn period_bounds(&self) -> PeriodBounds {
        let lo = self.min_period_ms.min(self.max_period_ms);
        let hi = self.min_period_ms.max(self.max_period_ms);
        let max_ms = hi.clamp(1, MAX_PERIOD_MS);
        let min_ms = lo.clamp(1, max_ms);
        PeriodBounds { min_ms, max_ms }
    }
}

// ---------------------------------------------------------------------------
// Task record
// ---------------------------------------------------------------------------

/// One registered task. Owned by the scheduler's table.
pub struct Task<'a> {
    id: TaskId,
    name: String<NAME_LEN>,
    callback: &'a mut dyn Runnable,
    period_ms: u32,
    base_period_ms: u32,
    bounds: PeriodBounds,
    last_run_us: Option<u32>,
    estimator: RuntimeEstimator,
    run_count: u32,
    enabled: bool,
    priority: u8,
}

impl<'a> Task<'a> {
    /// Build a record from a spec. The caller has already checked that a
    /// callback is present.
    pub(crate) fn new(
        id: TaskId,
        spec: TaskSpec<'a>,
        callback: &'a mut dyn Runnable,
        last_run_us: Option<u32>,
    ) -> Self {
        let bounds = spec.period_bounds();
        let period_ms = bounds.clamp(spec.period_ms);
        Self {
            id,
            name: truncated_name(spec.name),
            callback,
            period_ms,
            base_period_ms: period_ms,
            bounds,
            last_run_us,
            estimator: RuntimeEstimator::new(spec.alpha_q),
            run_count: 0,
            enabled: spec.enabled,
            priority: spec.priority,
        }
    }

    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    #[inline]
    pub fn base_period_ms(&self) -> u32 {
        self.base_period_ms
    }

    #[inline]
    pub fn bounds(&self) -> PeriodBounds {
        self.bounds
    }

    #[inline]
    pub fn last_run_us(&self) -> Option<u32> {
        self.last_run_us
    }

    #[inline]
    pub fn estimator(&self) -> &RuntimeEstimator {
        &self.estimator
    }

    #[inline]
    pub fn run_count(&self) -> u32 {
        self.run_count
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Store a new period, clamped into the task's bounds. Returns the
    /// value actually stored.
    pub(crate) fn set_period(&mut self, period_ms: u32) -> u32 {
        self.period_ms = self.bounds.clamp(period_ms);
        self.period_ms
    }

    /// Due when it has never run or a full period has elapsed since the
    /// last dispatch timestamp.
    pub fn is_due(&self, now_us: u32) -> bool {
        match self.last_run_us {
            None => true,
            Some(last) => elapsed_us(now_us, last) as u64 >= self.period_ms as u64 * 1000,
        }
    }

    /// Invoke the callback and return its wall time in microseconds.
    pub(crate) fn execute(&mut self, read_clock: impl Fn() -> u32) -> u32 {
        let start = read_clock();
        self.callback.run();
        let end = read_clock();
        elapsed_us(end, start)
    }

    /// Book-keeping after an execution started at dispatch time `now_us`.
    pub(crate) fn record_run(&mut self, now_us: u32, runtime_us: u32) {
        self.last_run_us = Some(now_us);
        self.run_count = self.run_count.wrapping_add(1);
        self.estimator.update(runtime_us);
    }

    /// Back to the registered period with no runtime history.
    /// The enabled flag and last-run timestamp are left alone.
    pub(crate) fn reset_adaptive(&mut self) {
        self.period_ms = self.base_period_ms;
        self.estimator.reset();
        self.run_count = 0;
    }

    pub fn stats(&self) -> TaskStats {
        TaskStats {
            id: self.id,
            name: self.name.clone(),
            est_runtime_us: self.estimator.estimate_us(),
            last_run_us: self.last_run_us,
            period_ms: self.period_ms,
            base_period_ms: self.base_period_ms,
            min_period_ms: self.bounds.min_ms,
            max_period_ms: self.bounds.max_ms,
            run_count: self.run_count,
            priority: self.priority,
            enabled: self.enabled,
        }
    }
}

impl fmt::Debug for Task<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("period_ms", &self.period_ms)
            .field("base_period_ms", &self.base_period_ms)
            .field("bounds", &self.bounds)
            .field("last_run_us", &self.last_run_us)
            .field("estimator", &self.estimator)
            .field("run_count", &self.run_count)
            .field("enabled", &self.enabled)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

fn truncated_name(name: &str) -> String<NAME_LEN> {
    let mut out = String::new();
    for c in name.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Diagnostics snapshot
// ---------------------------------------------------------------------------

/// Read-only snapshot of one task for telemetry and CLI layers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskStats {
    pub id: TaskId,
    pub name: String<NAME_LEN>,
    pub est_runtime_us: u32,
    pub last_run_us: Option<u32>,
    pub period_ms: u32,
    pub base_period_ms: u32,
    pub min_period_ms: u32,
    pub max_period_ms: u32,
    pub run_count: u32,
    pub priority: u8,
    pub enabled: bool,
}

impl TaskStats {
    /// Estimated share of the current period spent running, in percent.
    pub fn load_pct(&self) -> u32 {
        load_pct(self.est_runtime_us, self.period_ms)
    }
}

impl fmt::Display for TaskStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task {}", self.id)?;
        if !self.name.is_empty() {
            write!(f, " ({})", self.name)?;
        }
        write!(
            f,
            " | period(ms): {} | est(us): {} | load: {}% | min: {} | max: {} | runs: {} | {}",
            self.period_ms,
            self.est_runtime_us,
            self.load_pct(),
            self.min_period_ms,
            self.max_period_ms,
            self.run_count,
            if self.enabled { "on" } else { "off" }
        )
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    fn noop() {}

    #[test]
    fn test_period_clamped_into_bounds() {
        let mut cb = noop;
        let spec = TaskSpec::new(10).bounds(50, 500);
        let task = Task::new(TaskId::new(0), spec, &mut cb, None);
        assert_eq!(task.period_ms(), 50);
        assert_eq!(task.base_period_ms(), 50);

        let mut cb = noop;
        let spec = TaskSpec::new(9_000).bounds(50, 500);
        let task = Task::new(TaskId::new(1), spec, &mut cb, None);
        assert_eq!(task.period_ms(), 500);
    }

    #[test]
    fn test_bounds_normalised() {
        let b = TaskSpec::new(100).bounds(500, 50).period_bounds();
        assert_eq!(b, PeriodBounds { min_ms: 50, max_ms: 500 });

        let b = TaskSpec::new(100).bounds(0, 0).period_bounds();
        assert_eq!(b, PeriodBounds { min_ms: 1, max_ms: 1 });

        let b = TaskSpec::new(100).bounds(0, u32::MAX).period_bounds();
        assert_eq!(b.max_ms, MAX_PERIOD_MS);
        assert_eq!(b.min_ms, 1);
    }

    #[test]
    fn test_name_truncated_at_char_boundary() {
        let name = truncated_name("a-very-long-task-name-indeed");
        assert_eq!(name.len(), NAME_LEN);
        assert_eq!(name.as_str(), "a-very-long-task");

        // 'é' is two bytes; it must not be split
        let name = truncated_name("ééééééééé");
        assert_eq!(name.len(), 16);
        let name = truncated_name("aéééééééé");
        assert_eq!(name.len(), 15);
    }

    #[test]
    fn test_never_run_is_due() {
        let mut cb = noop;
        let task = Task::new(TaskId::new(0), TaskSpec::new(100), &mut cb, None);
        assert!(task.is_due(0));
        assert!(task.is_due(12345));
    }

    #[test]
    fn test_due_after_full_period() {
        let mut cb = noop;
        let task = Task::new(TaskId::new(0), TaskSpec::new(100), &mut cb, Some(1_000));
        assert!(!task.is_due(1_000));
        assert!(!task.is_due(100_999));
        assert!(task.is_due(101_000));
    }

    #[test]
    fn test_due_across_clock_wrap() {
        let start = u32::MAX - 50_000;
        let mut cb = noop;
        let task = Task::new(TaskId::new(0), TaskSpec::new(100), &mut cb, Some(start));
        assert!(!task.is_due(start.wrapping_add(99_999)));
        assert!(task.is_due(start.wrapping_add(100_000)));
    }

    #[test]
    fn test_execute_measures_runtime() {
        let hits = Cell::new(0);
        let mut cb = || hits.set(hits.get() + 1);
        let mut task = Task::new(TaskId::new(0), TaskSpec::new(100), &mut cb, None);

        let ticks = Cell::new(u32::MAX - 10);
        let runtime = task.execute(|| {
            let t = ticks.get();
            ticks.set(t.wrapping_add(40));
            t
        });
        assert_eq!(runtime, 40);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_record_run_and_reset() {
        let mut cb = noop;
        let mut task = Task::new(TaskId::new(3), TaskSpec::new(100).bounds(50, 500), &mut cb, None);
        task.record_run(7_000, 900);
        task.set_period(250);
        assert_eq!(task.run_count(), 1);
        assert_eq!(task.last_run_us(), Some(7_000));
        assert_eq!(task.estimator().estimate_us(), 900);

        task.set_enabled(false);
        task.reset_adaptive();
        assert_eq!(task.period_ms(), 100);
        assert_eq!(task.run_count(), 0);
        assert_eq!(task.estimator().estimate_q(), 0);
        assert!(!task.is_enabled());
    }

    #[test]
    fn test_set_period_clamps() {
        let mut cb = noop;
        let mut task = Task::new(TaskId::new(0), TaskSpec::new(100).bounds(50, 500), &mut cb, None);
        assert_eq!(task.set_period(5), 50);
        assert_eq!(task.set_period(5_000), 500);
    }

    #[test]
    fn test_stats_display() {
        let spec = TaskSpec::new(100).name("imu").bounds(50, 500);
        let mut cb = noop;
        let task = Task::new(TaskId::new(1), spec, &mut cb, None);
        let line = task.stats().to_string();
        assert_eq!(
            line,
            "Task 1 (imu) | period(ms): 100 | est(us): 0 | load: 0% | min: 50 | max: 500 | runs: 0 | on"
        );
    }

    #[test]
    fn test_stats_load_after_run() {
        let mut cb = noop;
        let mut task = Task::new(TaskId::new(2), TaskSpec::new(200).bounds(50, 500), &mut cb, None);
        task.record_run(0, 150_000);
        let stats = task.stats();
        assert_eq!(stats.load_pct(), 75);
        assert!(stats.to_string().contains("| load: 75% |"));
    }
}
