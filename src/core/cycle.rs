//! # Cycle driver: one synchronized pass over the registry.
//!
//! ```text
//! run_cycle(n)
//!   ├─► registry.read()                       (held for the whole cycle)
//!   ├─► for slot in slot-index order, skipping tombstones:
//!   │     ├─► gate.acquire()                  (blocks at capacity)
//!   │     └─► runner.dispatch(unit, permit, done_tx); pending += 1
//!   ├─► wait until `pending` completions arrived on done_rx
//!   └─► return elapsed
//! ```
//!
//! The driver never releases permits itself: each runner drops its permit after
//! reporting completion, so gate occupancy spans "dispatched but not yet finished".

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::core::{gate::Gate, registry::Registry, runner::Dispatch};

/// Runs cycle `cycle` and returns how long it took.
pub(crate) async fn run_cycle(registry: Arc<Registry>, gate: Arc<Gate>, cycle: u64) -> Duration {
    let started = Instant::now();
    let slots = registry.read().await;
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    let mut pending = 0usize;

    for (index, slot) in slots.entries.iter().enumerate() {
        if slot.tombstoned {
            continue;
        }
        let permit = gate.acquire().await;
        let dispatch = Dispatch {
            unit: Arc::clone(&slot.unit),
            cycle,
            permit,
            done: done_tx.clone(),
        };
        match slot.runner.dispatch(dispatch).await {
            Ok(()) => pending += 1,
            Err(_returned) => {
                tracing::debug!(slot = index, cycle, "runner gone; slot skipped");
            }
        }
    }
    drop(done_tx);

    while pending > 0 {
        match done_rx.recv().await {
            Some(_slot) => pending -= 1,
            // every runner holding a sender is gone
            None => break,
        }
    }
    drop(slots);

    started.elapsed()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::{
        core::registry::SlotId,
        error::UnitError,
        events::Bus,
        units::{UnitFn, UnitRef},
    };

    /// Unit that tracks how many copies run at once.
    fn tracked(active: &Arc<AtomicUsize>, peak: &Arc<AtomicUsize>, runs: &Arc<AtomicUsize>) -> UnitRef {
        let (active, peak, runs) = (Arc::clone(active), Arc::clone(peak), Arc::clone(runs));
        UnitFn::arc("tracked", move || {
            let (active, peak, runs) = (Arc::clone(&active), Arc::clone(&peak), Arc::clone(&runs));
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(15)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                runs.fetch_add(1, Ordering::SeqCst);
                Ok::<(), UnitError>(())
            }
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn runs_every_live_slot_once_within_capacity() {
        let registry = Arc::new(Registry::new(Bus::new(64), CancellationToken::new(), 8));
        let gate = Arc::new(Gate::new(2));
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let runs = Arc::new(AtomicUsize::new(0));

        for _ in 0..6 {
            registry.add(tracked(&active, &peak, &runs)).await;
        }
        registry.remove(SlotId::new(2)).await.unwrap();

        run_cycle(Arc::clone(&registry), Arc::clone(&gate), 1).await;

        assert_eq!(runs.load(Ordering::SeqCst), 5);
        assert_eq!(peak.load(Ordering::SeqCst), 2);
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_registry_completes_immediately() {
        let registry = Arc::new(Registry::new(Bus::new(8), CancellationToken::new(), 0));
        let gate = Arc::new(Gate::new(1));
        let elapsed = tokio::time::timeout(Duration::from_secs(1), run_cycle(registry, gate, 1))
            .await
            .unwrap();
        assert!(elapsed < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn stopped_runners_do_not_stall_the_cycle() {
        let token = CancellationToken::new();
        let registry = Arc::new(Registry::new(Bus::new(8), token.clone(), 2));
        registry
            .add(UnitFn::arc("idle", || async { Ok::<(), UnitError>(()) }))
            .await;
        token.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let gate = Arc::new(Gate::new(1));
        tokio::time::timeout(Duration::from_secs(1), run_cycle(registry, gate, 1))
            .await
            .unwrap();
    }
}
