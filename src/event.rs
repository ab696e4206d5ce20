//! # Event Sink
//!
//! Observer interface the scheduler calls at fixed points: registration,
//! enable/disable, period tuning, guard shedding, and adaptive resets.
//! Delivery is best-effort and synchronous, with no back-pressure; a
//! scheduler without a sink simply skips the call.
//!
//! Each [`Event`] exposes a stable short [`kind`](Event::kind) plus a
//! `Display` rendering of its details, so text-oriented sinks can forward
//! `(kind, details)` pairs unchanged.

use core::fmt;

use crate::controller::Direction;
use crate::task::TaskId;

/// Lifecycle and tuning notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    Registered { id: TaskId, period_ms: u32 },
    Enabled { id: TaskId },
    Disabled { id: TaskId },
    PeriodTuned {
        id: TaskId,
        direction: Direction,
        old_ms: u32,
        new_ms: u32,
    },
    /// Shed by the resource guard; `free` is the signal that tripped it.
    GuardDisabled { id: TaskId, priority: u8, free: usize },
    AdaptiveReset { tasks: usize },
}

impl Event {
    pub const fn kind(&self) -> &'static str {
        match self {
            Event::Registered { .. } => "registered",
            Event::Enabled { .. } => "enabled",
            Event::Disabled { .. } => "disabled",
            Event::PeriodTuned {
                direction: Direction::Up,
                ..
            } => "period_up",
            Event::PeriodTuned {
                direction: Direction::Down,
                ..
            } => "period_down",
            Event::GuardDisabled { .. } => "guard_disabled",
            Event::AdaptiveReset { .. } => "adaptive_reset",
        }
    }

    /// Task the event refers to, if any.
    pub const fn task(&self) -> Option<TaskId> {
        match *self {
            Event::Registered { id, .. }
            | Event::Enabled { id }
            | Event::Disabled { id }
            | Event::PeriodTuned { id, .. }
            | Event::GuardDisabled { id, .. } => Some(id),
            Event::AdaptiveReset { .. } => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Registered { id, period_ms } => write!(f, "task {} period={}ms", id, period_ms),
            Event::Enabled { id } | Event::Disabled { id } => write!(f, "task {}", id),
            Event::PeriodTuned {
                id, old_ms, new_ms, ..
            } => write!(f, "task {} period {}ms -> {}ms", id, old_ms, new_ms),
            Event::GuardDisabled { id, priority, free } => {
                write!(f, "task {} prio={} free={}", id, priority, free)
            }
            Event::AdaptiveReset { tasks } => write!(f, "{} tasks", tasks),
        }
    }
}

/// Receiver of scheduler events.
pub trait EventSink {
    fn notify(&mut self, event: &Event);
}

impl<F: FnMut(&Event)> EventSink for F {
    fn notify(&mut self, event: &Event) {
        self(event)
    }
}

/// Sink that forwards every event to the crate's log macros.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn notify(&mut self, event: &Event) {
        match event {
            Event::GuardDisabled { .. } => crate::log_warn!("{}: {}", event.kind(), event),
            Event::PeriodTuned { .. } => crate::log_debug!("{}: {}", event.kind(), event),
            _ => crate::log_info!("{}: {}", event.kind(), event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_stable() {
        let id = TaskId::new(2);
        assert_eq!(Event::Registered { id, period_ms: 10 }.kind(), "registered");
        assert_eq!(
            Event::PeriodTuned {
                id,
                direction: Direction::Up,
                old_ms: 100,
                new_ms: 120
            }
            .kind(),
            "period_up"
        );
        assert_eq!(
            Event::PeriodTuned {
                id,
                direction: Direction::Down,
                old_ms: 100,
                new_ms: 90
            }
            .kind(),
            "period_down"
        );
        assert_eq!(Event::AdaptiveReset { tasks: 3 }.kind(), "adaptive_reset");
    }

    #[test]
    fn test_details_rendering() {
        let event = Event::PeriodTuned {
            id: TaskId::new(1),
            direction: Direction::Up,
            old_ms: 100,
            new_ms: 120,
        };
        assert_eq!(event.to_string(), "task 1 period 100ms -> 120ms");

        let event = Event::GuardDisabled {
            id: TaskId::new(4),
            priority: 3,
            free: 200,
        };
        assert_eq!(event.to_string(), "task 4 prio=3 free=200");
        assert_eq!(event.task(), Some(TaskId::new(4)));
        assert_eq!(Event::AdaptiveReset { tasks: 1 }.task(), None);
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |e: &Event| seen.push(e.kind());
            sink.notify(&Event::Enabled { id: TaskId::new(0) });
            sink.notify(&Event::Disabled { id: TaskId::new(0) });
        }
        assert_eq!(seen, ["enabled", "disabled"]);
    }

    #[test]
    fn test_log_sink_accepts_everything() {
        let mut sink = LogSink;
        sink.notify(&Event::AdaptiveReset { tasks: 0 });
        sink.notify(&Event::GuardDisabled {
            id: TaskId::new(0),
            priority: 9,
            free: 0,
        });
    }
}
