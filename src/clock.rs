//! Clock source abstraction.
//!
//! The dispatcher only ever reads a free-running 32-bit microsecond counter
//! that wraps silently at `u32::MAX`. All durations are computed with
//! wrapping subtraction, which yields the true elapsed time across a wrap as
//! long as the interval itself is shorter than the counter's modulus
//! (~71.6 minutes).

use core::cell::Cell;

/// Monotonic microsecond counter supplied by the platform.
pub trait Clock {
    /// Current counter value. Wraps at `u32::MAX`; no epoch is implied.
    fn now_us(&self) -> u32;

    /// Cooperative yield hook, called after every executed task.
    ///
    /// Ports with a background service loop (radio stacks, watchdogs) feed
    /// it here. The default does nothing.
    fn yield_now(&self) {}
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_us(&self) -> u32 {
        (**self).now_us()
    }

    fn yield_now(&self) {
        (**self).yield_now()
    }
}

/// Microseconds from `then` to `now` in the counter's native modulus.
#[inline]
pub const fn elapsed_us(now: u32, then: u32) -> u32 {
    now.wrapping_sub(then)
}

// ============================================================================
// Mock Implementation (always available for testing)
// ============================================================================

/// Mock clock with controllable time, for host tests and simulation.
///
/// `auto_step` advances the counter on every read, which makes each
/// callback appear to cost a fixed amount of time: the dispatcher reads the
/// clock once before and once after the callback.
///
/// # Example
///
/// ```
/// use adaptick::clock::{Clock, MockClock};
///
/// let clock = MockClock::new();
/// clock.advance(1_500);
/// assert_eq!(clock.now_us(), 1_500);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    current_us: Cell<u32>,
    auto_step_us: Cell<u32>,
    yields: Cell<u32>,
}

impl MockClock {
    /// Creates a new `MockClock` starting at time 0.
    pub const fn new() -> Self {
        Self {
            current_us: Cell::new(0),
            auto_step_us: Cell::new(0),
            yields: Cell::new(0),
        }
    }

    /// Creates a new `MockClock` starting at the specified time.
    pub const fn with_initial(us: u32) -> Self {
        Self {
            current_us: Cell::new(us),
            auto_step_us: Cell::new(0),
            yields: Cell::new(0),
        }
    }

    /// Sets the counter to an absolute value.
    pub fn set(&self, us: u32) {
        self.current_us.set(us);
    }

    /// Advances the counter, wrapping like the hardware would.
    pub fn advance(&self, us: u32) {
        self.current_us.set(self.current_us.get().wrapping_add(us));
    }

    /// Advance by `us` after every subsequent read. `0` turns it off.
    pub fn auto_step(&self, us: u32) {
        self.auto_step_us.set(us);
    }

    /// Number of times the dispatcher called [`Clock::yield_now`].
    pub fn yields(&self) -> u32 {
        self.yields.get()
    }
}

impl Clock for MockClock {
    fn now_us(&self) -> u32 {
        let now = self.current_us.get();
        self.advance(self.auto_step_us.get());
        now
    }

    fn yield_now(&self) {
        self.yields.set(self.yields.get().wrapping_add(1));
    }
}
