//! Scheduler error types.
//!
//! Every error is recoverable: a rejected call leaves the task table exactly
//! as it was.

use thiserror::Error;

/// Errors returned by the registry and configuration APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerError {
    /// Every task slot is in use.
    #[error("task table full ({capacity} slots)")]
    CapacityExceeded { capacity: usize },

    /// A task was registered without a callback.
    #[error("task has no callback")]
    InvalidCallback,

    /// The id does not name a registered task.
    #[error("no task with id {id}")]
    NotFound { id: usize },

    /// Controller or guard parameters are inconsistent.
    #[error("invalid scheduler config: {reason}")]
    InvalidConfig { reason: &'static str },
}

pub type Result<T> = core::result::Result<T, SchedulerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SchedulerError::CapacityExceeded { capacity: 8 }.to_string(),
            "task table full (8 slots)"
        );
        assert_eq!(SchedulerError::NotFound { id: 3 }.to_string(), "no task with id 3");
        assert_eq!(
            SchedulerError::InvalidCallback.to_string(),
            "task has no callback"
        );
    }
}
