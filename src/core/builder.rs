use std::sync::Arc;

use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio_util::sync::CancellationToken;

use super::{
    config::SchedulerConfig, control::ControlLoop, gate::Gate, registry::Registry,
    scheduler::Scheduler,
};
use crate::{
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Scheduler`] with optional subscribers.
pub struct SchedulerBuilder {
    cfg: SchedulerConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SchedulerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SchedulerConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (cycles, unit failures, speed changes, ...)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the scheduler and starts its control loop; the first cycle begins
    /// immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Scheduler {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let token = CancellationToken::new();

        if !self.subscribers.is_empty() {
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            tracing::debug!(subscribers = set.len(), "subscriber set started");
            subscriber_listener(&bus, set, token.clone());
        }

        let registry = Arc::new(Registry::new(
            bus.clone(),
            token.clone(),
            self.cfg.slot_capacity,
        ));
        let gate = Arc::new(Gate::new(1));
        let (tx, rx) = mpsc::channel(self.cfg.command_capacity_clamped());

        let control = ControlLoop::new(
            Arc::clone(&registry),
            gate,
            bus.clone(),
            rx,
            token.clone(),
        );
        tokio::spawn(control.run());

        Scheduler::new_internal(self.cfg, bus, registry, tx, token)
    }
}

/// Forwards bus events to the subscriber set until the scheduler stops,
/// flushing whatever is already buffered on the way out.
fn subscriber_listener(bus: &Bus, set: SubscriberSet, token: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "subscriber listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = token.cancelled() => {
                    while let Ok(ev) = rx.try_recv() {
                        set.emit(&ev);
                    }
                    break;
                }
            }
        }
    });
}
