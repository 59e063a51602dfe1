//! Error types used by the cyclevisor runtime and work units.
//!
//! This module defines two main error enums:
//!
//! - [`SchedulerError`]: errors returned to callers of the [`Scheduler`](crate::Scheduler) API.
//! - [`UnitError`]: errors raised by individual unit executions.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use thiserror::Error;

/// # Errors produced by the scheduler API.
///
/// Registry, pause/resume and speed errors are returned synchronously to the caller;
/// none of them stops the control loop.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Speed modifier is `-1`, `0` or `1`.
    #[error("speed modifier {modifier} rejected: must not be between -1 and 1")]
    InvalidModifier {
        /// The rejected modifier.
        modifier: i64,
    },

    /// Speed change attempted while the current speed is zero.
    #[error("current speed is zero, speed change unprocessable")]
    Unprocessable,

    /// Applying the modifier would overflow the speed value.
    #[error("speed {speed} with modifier {modifier} overflows")]
    SpeedOverflow {
        /// Speed before the change.
        speed: i64,
        /// The modifier that was applied.
        modifier: i64,
    },

    /// `pause()` called while already paused.
    #[error("scheduler already paused")]
    AlreadyPaused,

    /// `play()` called while not paused.
    #[error("scheduler not paused")]
    NotPaused,

    /// Slot index is unknown or already removed.
    #[error("unit slot {slot} not found")]
    NotFound {
        /// The requested slot index.
        slot: usize,
    },

    /// Scheduler has been stopped; it cannot be restarted.
    #[error("scheduler stopped")]
    Stopped,
}

impl SchedulerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use cyclevisor::SchedulerError;
    ///
    /// let err = SchedulerError::InvalidModifier { modifier: 1 };
    /// assert_eq!(err.as_label(), "speed_invalid_modifier");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SchedulerError::InvalidModifier { .. } => "speed_invalid_modifier",
            SchedulerError::Unprocessable => "speed_unprocessable",
            SchedulerError::SpeedOverflow { .. } => "speed_overflow",
            SchedulerError::AlreadyPaused => "scheduler_already_paused",
            SchedulerError::NotPaused => "scheduler_not_paused",
            SchedulerError::NotFound { .. } => "unit_not_found",
            SchedulerError::Stopped => "scheduler_stopped",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SchedulerError::InvalidModifier { modifier } => {
                format!("invalid speed modifier: {modifier}")
            }
            SchedulerError::Unprocessable => "speed is zero".to_string(),
            SchedulerError::SpeedOverflow { speed, modifier } => {
                format!("overflow: speed={speed} modifier={modifier}")
            }
            SchedulerError::AlreadyPaused => "already paused".to_string(),
            SchedulerError::NotPaused => "not paused".to_string(),
            SchedulerError::NotFound { slot } => format!("slot {slot} not found"),
            SchedulerError::Stopped => "stopped".to_string(),
        }
    }
}

/// # Errors produced by unit execution.
///
/// Unit errors never reach scheduler callers: the runner logs them, publishes
/// [`EventKind::UnitFailed`](crate::EventKind::UnitFailed) and moves on.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum UnitError {
    /// Unit processing failed.
    #[error("processing failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Unit panicked while processing; the runner caught the panic.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl UnitError {
    /// Convenience constructor for [`UnitError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        UnitError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use cyclevisor::UnitError;
    ///
    /// assert_eq!(UnitError::fail("boom").as_label(), "unit_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            UnitError::Fail { .. } => "unit_failed",
            UnitError::Panicked { .. } => "unit_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            UnitError::Fail { error } => format!("error: {error}"),
            UnitError::Panicked { info } => format!("panic: {info}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        assert_eq!(SchedulerError::Unprocessable.as_label(), "speed_unprocessable");
        assert_eq!(
            SchedulerError::NotFound { slot: 3 }.as_label(),
            "unit_not_found"
        );
        assert_eq!(SchedulerError::Stopped.as_label(), "scheduler_stopped");
        assert_eq!(
            UnitError::Panicked { info: "x".into() }.as_label(),
            "unit_panicked"
        );
    }

    #[test]
    fn display_includes_details() {
        let err = SchedulerError::SpeedOverflow {
            speed: i64::MAX,
            modifier: 2,
        };
        assert!(err.to_string().contains("overflows"));
        assert_eq!(
            SchedulerError::NotFound { slot: 7 }.as_message(),
            "slot 7 not found"
        );
        assert_eq!(UnitError::fail("io").to_string(), "processing failed: io");
    }
}
