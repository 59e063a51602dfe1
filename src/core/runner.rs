//! # Slot runner: long-lived worker bound to one registry slot.
//!
//! Each slot gets exactly one runner, spawned when the slot is first created. The
//! cycle driver hands it work through a depth-1 dispatch channel; the runner executes
//! the unit, reports completion, then gives its gate permit back.
//!
//! ## Flow
//! ```text
//! Runner::run()
//! loop {
//!   select! {
//!     stop token cancelled ──► exit
//!     dispatch received    ──► unit.process()   (panic caught)
//!                               ├─ Err ─► warn! + publish UnitFailed
//!                               ├─► done.send(slot)
//!                               └─► drop(permit)   (gate slot released)
//!   }
//! }
//! ```
//!
//! ## Rules
//! - Unit failures are logged and published, never retried, never fatal.
//! - The stop token is only checked between dispatches; an in-flight unit always
//!   runs to completion.
//! - Completion is signalled **before** the permit is released.

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    core::gate::GatePermit,
    error::UnitError,
    events::{Bus, Event, EventKind},
    subscribers::panic_message,
    units::UnitRef,
};

/// One request to run a unit once.
pub(crate) struct Dispatch {
    /// Unit bound to the slot at dispatch time.
    pub unit: UnitRef,
    /// Cycle the dispatch belongs to.
    pub cycle: u64,
    /// Gate permit held for the whole execution.
    pub permit: GatePermit,
    /// Completion channel of the dispatching cycle.
    pub done: mpsc::UnboundedSender<usize>,
}

/// Sending half of a runner's dispatch channel.
pub(crate) struct RunnerHandle {
    tx: mpsc::Sender<Dispatch>,
}

impl RunnerHandle {
    /// Spawns the worker for `slot`; it exits when `stop` is cancelled.
    pub fn spawn(slot: usize, bus: Bus, stop: CancellationToken) -> Self {
        let (tx, rx) = mpsc::channel(1);
        let runner = Runner {
            slot,
            rx,
            bus,
            stop,
        };
        tokio::spawn(runner.run());
        Self { tx }
    }

    /// Hands `dispatch` to the runner. Gives it back if the runner is gone.
    pub async fn dispatch(&self, dispatch: Dispatch) -> Result<(), Dispatch> {
        self.tx.send(dispatch).await.map_err(|e| e.0)
    }
}

struct Runner {
    slot: usize,
    rx: mpsc::Receiver<Dispatch>,
    bus: Bus,
    stop: CancellationToken,
}

impl Runner {
    async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                _ = self.stop.cancelled() => break,
                msg = self.rx.recv() => match msg {
                    Some(dispatch) => self.execute(dispatch).await,
                    None => break,
                },
            }
        }
        tracing::debug!(slot = self.slot, "runner stopped");
    }

    async fn execute(&self, dispatch: Dispatch) {
        let Dispatch {
            unit,
            cycle,
            permit,
            done,
        } = dispatch;

        let res = match std::panic::AssertUnwindSafe(unit.process())
            .catch_unwind()
            .await
        {
            Ok(res) => res,
            Err(panic) => Err(UnitError::Panicked {
                info: panic_message(panic.as_ref()),
            }),
        };

        if let Err(e) = res {
            tracing::warn!(
                unit = unit.name(),
                slot = self.slot,
                cycle,
                error = %e.as_message(),
                "unit processing failed"
            );
            self.bus.publish(
                Event::new(EventKind::UnitFailed)
                    .with_unit(unit.name())
                    .with_slot(self.slot)
                    .with_cycle(cycle)
                    .with_reason(e.to_string()),
            );
        }

        let _ = done.send(self.slot);
        drop(permit);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::{core::gate::Gate, units::UnitFn};

    async fn dispatch(
        unit: UnitRef,
        gate: &Gate,
        done: &mpsc::UnboundedSender<usize>,
    ) -> Dispatch {
        Dispatch {
            unit,
            cycle: 1,
            permit: gate.acquire().await,
            done: done.clone(),
        }
    }

    #[tokio::test]
    async fn executes_signals_completion_and_releases_permit() {
        let bus = Bus::new(8);
        let runner = RunnerHandle::spawn(4, bus, CancellationToken::new());
        let gate = Gate::new(1);
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let unit: UnitRef = UnitFn::arc("count", move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<(), UnitError>(())
            }
        });

        assert!(runner.dispatch(dispatch(unit, &gate, &done_tx).await).await.is_ok());
        assert_eq!(done_rx.recv().await, Some(4));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // capacity 1: only reachable once the runner released its permit
        let again = tokio::time::timeout(Duration::from_millis(100), gate.acquire()).await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn failure_and_panic_are_published_not_fatal() {
        let bus = Bus::new(8);
        let mut events = bus.subscribe();
        let runner = RunnerHandle::spawn(0, bus, CancellationToken::new());
        let gate = Gate::new(2);
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();

        let failing: UnitRef = UnitFn::arc("failing", || async { Err::<(), _>(UnitError::fail("boom")) });
        let panicking: UnitRef = UnitFn::arc("panicking", || async {
            if true {
                panic!("oops");
            }
            Ok::<(), UnitError>(())
        });

        runner.dispatch(dispatch(failing, &gate, &done_tx).await).await.ok();
        assert_eq!(done_rx.recv().await, Some(0));
        runner.dispatch(dispatch(panicking, &gate, &done_tx).await).await.ok();
        assert_eq!(done_rx.recv().await, Some(0));

        let first = events.recv().await.unwrap();
        assert_eq!(first.kind, EventKind::UnitFailed);
        assert_eq!(first.unit.as_deref(), Some("failing"));
        assert_eq!(first.reason.as_deref(), Some("processing failed: boom"));

        let second = events.recv().await.unwrap();
        assert_eq!(second.unit.as_deref(), Some("panicking"));
        assert_eq!(second.reason.as_deref(), Some("panicked: oops"));
    }

    #[tokio::test]
    async fn stopped_runner_returns_dispatch() {
        let stop = CancellationToken::new();
        let runner = RunnerHandle::spawn(1, Bus::new(8), stop.clone());
        stop.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let gate = Gate::new(1);
        let (done_tx, _done_rx) = mpsc::unbounded_channel();
        let unit: UnitRef = UnitFn::arc("idle", || async { Ok::<(), UnitError>(()) });
        assert!(runner.dispatch(dispatch(unit, &gate, &done_tx).await).await.is_err());
    }
}
