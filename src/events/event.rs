//! # Runtime events emitted by the control loop, registry and unit runners.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Cycle events**: cycle progress and slow-motion throttling
//! - **Unit events**: registration changes and unit failures
//! - **Control events**: speed changes, pause/resume, stop
//! - **Subscriber events**: overflow and panics inside subscriber workers
//!
//! The [`Event`] struct carries additional metadata such as timestamps, slot index,
//! unit name, speed/capacity and durations.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use cyclevisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::UnitFailed)
//!     .with_unit("sync-users")
//!     .with_slot(3)
//!     .with_cycle(12)
//!     .with_reason("connection refused");
//!
//! assert_eq!(ev.kind, EventKind::UnitFailed);
//! assert_eq!(ev.unit.as_deref(), Some("sync-users"));
//! assert_eq!(ev.slot, Some(3));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `unit`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `unit`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Cycle events ===
    /// A cycle began dispatching units.
    ///
    /// Sets:
    /// - `cycle`: cycle number (1-based)
    CycleStarted,

    /// Every unit dispatched in the cycle reported completion.
    ///
    /// Sets:
    /// - `cycle`: cycle number
    /// - `elapsed_ms`: wall time of the cycle
    CycleFinished,

    /// Slow-motion delay scheduled before the next cycle.
    ///
    /// Sets:
    /// - `cycle`: cycle that just finished
    /// - `speed`: current (negative) speed
    /// - `delay_ms`: delay before the next cycle
    ThrottleScheduled,

    // === Unit events ===
    /// Unit processing failed (error or caught panic); the cycle continues.
    ///
    /// Sets:
    /// - `unit`: unit name
    /// - `slot`: slot index
    /// - `cycle`: cycle number
    /// - `reason`: failure message
    UnitFailed,

    /// Unit registered (fresh slot or reused slot).
    ///
    /// Sets:
    /// - `unit`: unit name
    /// - `slot`: slot index
    UnitAdded,

    /// Unit slot tombstoned.
    ///
    /// Sets:
    /// - `unit`: unit name
    /// - `slot`: slot index
    UnitRemoved,

    // === Control events ===
    /// Speed changed.
    ///
    /// Sets:
    /// - `speed`: new speed
    /// - `capacity`: gate capacity after the change
    SpeedChanged,

    /// Speed change rejected.
    ///
    /// Sets:
    /// - `speed`: unchanged speed
    /// - `reason`: error label
    SpeedRejected,

    /// Scheduler paused; no new cycle starts until resumed.
    Paused,

    /// Scheduler resumed.
    Resumed,

    /// Scheduler stopped (terminal).
    SchedulerStopped,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Cycle number, if applicable.
    pub cycle: Option<u64>,
    /// Registry slot index, if applicable.
    pub slot: Option<usize>,
    /// Name of the unit (or subscriber), if applicable.
    pub unit: Option<Arc<str>>,
    /// Speed value, if applicable.
    pub speed: Option<i64>,
    /// Gate capacity, if applicable.
    pub capacity: Option<usize>,
    /// Cycle duration in milliseconds (compact).
    pub elapsed_ms: Option<u32>,
    /// Throttle delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            cycle: None,
            slot: None,
            unit: None,
            speed: None,
            capacity: None,
            elapsed_ms: None,
            delay_ms: None,
            reason: None,
        }
    }

    /// Attaches a cycle number.
    #[inline]
    pub fn with_cycle(mut self, cycle: u64) -> Self {
        self.cycle = Some(cycle);
        self
    }

    /// Attaches a slot index.
    #[inline]
    pub fn with_slot(mut self, slot: usize) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Attaches a unit name.
    #[inline]
    pub fn with_unit(mut self, unit: impl Into<Arc<str>>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Attaches a speed value.
    #[inline]
    pub fn with_speed(mut self, speed: i64) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Attaches a gate capacity.
    #[inline]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Attaches a cycle duration (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        self.elapsed_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a throttle delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_unit(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_unit(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::CycleStarted);
        let b = Event::new(EventKind::CycleFinished);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn durations_are_clamped_to_u32_millis() {
        let ev = Event::new(EventKind::ThrottleScheduled)
            .with_delay(Duration::from_secs(u64::MAX / 2))
            .with_elapsed(Duration::from_millis(1500));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
        assert_eq!(ev.elapsed_ms, Some(1500));
    }

    #[test]
    fn overflow_helper_sets_subscriber_and_reason() {
        let ev = Event::subscriber_overflow("metrics", "full");
        assert!(ev.is_subscriber_overflow());
        assert_eq!(ev.unit.as_deref(), Some("metrics"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber=metrics reason=full"));
    }
}
