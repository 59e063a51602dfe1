//! # LogWriter: `tracing` bridge for scheduler events
//!
//! Forwards every [`Event`] to `tracing` with structured fields. Install any tracing
//! subscriber (e.g. `tracing-subscriber`'s fmt layer) in the application to see them.
//!
//! ## Levels
//! - `warn`: unit failures, rejected speed changes, subscriber overflow/panic
//! - `info`: registration, speed, pause/resume and stop events
//! - `debug`: per-cycle progress and throttling

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let unit = e.unit.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::CycleStarted => {
                tracing::debug!(seq = e.seq, cycle = ?e.cycle, "cycle started");
            }
            EventKind::CycleFinished => {
                tracing::debug!(seq = e.seq, cycle = ?e.cycle, elapsed_ms = ?e.elapsed_ms, "cycle finished");
            }
            EventKind::ThrottleScheduled => {
                tracing::debug!(seq = e.seq, speed = ?e.speed, delay_ms = ?e.delay_ms, "slow-motion delay");
            }
            EventKind::UnitFailed => {
                tracing::warn!(seq = e.seq, unit, slot = ?e.slot, cycle = ?e.cycle, reason, "unit failed");
            }
            EventKind::UnitAdded => {
                tracing::info!(seq = e.seq, unit, slot = ?e.slot, "unit added");
            }
            EventKind::UnitRemoved => {
                tracing::info!(seq = e.seq, unit, slot = ?e.slot, "unit removed");
            }
            EventKind::SpeedChanged => {
                tracing::info!(seq = e.seq, speed = ?e.speed, capacity = ?e.capacity, "speed changed");
            }
            EventKind::SpeedRejected => {
                tracing::warn!(seq = e.seq, speed = ?e.speed, reason, "speed change rejected");
            }
            EventKind::Paused => tracing::info!(seq = e.seq, "paused"),
            EventKind::Resumed => tracing::info!(seq = e.seq, "resumed"),
            EventKind::SchedulerStopped => tracing::info!(seq = e.seq, "scheduler stopped"),
            EventKind::SubscriberOverflow => {
                tracing::warn!(seq = e.seq, subscriber = unit, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::warn!(seq = e.seq, subscriber = unit, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
