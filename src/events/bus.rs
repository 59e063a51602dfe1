//! # Event bus.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`] so the control loop, the registry and every
//! slot runner can publish without blocking the scheduling path.
//!
//! ```text
//!   ControlLoop ──┐
//!   Registry    ──┼──► Bus ──► subscriber listener ──► SubscriberSet
//!   Runner 1..N ──┘     └────► Scheduler::subscribe() receivers
//! ```
//!
//! ## Rules
//! - `publish()` never waits; with no receivers the event is simply dropped.
//! - One ring buffer is shared by all receivers; a receiver that falls more than
//!   `capacity` events behind gets `RecvError::Lagged(n)` and skips ahead.

use tokio::sync::broadcast;

use super::event::Event;

/// Cloneable broadcast handle for runtime events.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus whose ring buffer holds `capacity` events (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes `ev` to every live receiver.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Returns a receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn receivers_observe_events_sent_after_subscribe() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::Paused));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::Resumed));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::Resumed);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn lagging_receiver_skips_oldest() {
        let bus = Bus::new(2);
        let mut rx = bus.subscribe();
        for cycle in 1..=4 {
            bus.publish(Event::new(EventKind::CycleStarted).with_cycle(cycle));
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(2))
        ));
        assert_eq!(rx.recv().await.unwrap().cycle, Some(3));
    }
}
