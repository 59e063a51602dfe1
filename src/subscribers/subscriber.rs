//! # Event subscriber trait.
//!
//! Provides [`Subscribe`], the extension point for observing scheduler events
//! (cycle progress, unit failures, speed changes, pause/resume).
//!
//! Each subscriber gets a dedicated worker task fed by its own bounded queue, so a
//! slow subscriber never delays the control loop, the runners or other subscribers.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use cyclevisor::{Event, EventKind, Subscribe};
//!
//! struct FailureCounter;
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::UnitFailed) {
//!             // bump a metric, etc.
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "failure-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for runtime observability.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally. Panics are caught and published as
///   `EventKind::SubscriberPanicked`, but the event that caused them is lost.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event, in FIFO order for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in overflow/panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this subscriber (clamped to >= 1).
    ///
    /// When the queue is full the new event is dropped for this subscriber only and
    /// `EventKind::SubscriberOverflow` is published.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
