//! # Unit registry: indexed slots with tombstones and LIFO reuse.
//!
//! ```text
//! slots:    [ 0: a ][ 1: b (tombstoned) ][ 2: c ][ 3: d (tombstoned) ]
//! freelist: [ 1, 3 ]   ← add() pops 3 first
//! ```
//!
//! ## Rules
//! - A slot index, once issued, is stable; slots are never deallocated.
//! - `remove` only tombstones the slot and pushes its index onto the freelist.
//! - `add` reuses the most recently freed index by replacing the unit in place; a
//!   slot's runner is spawned once, when the slot is first appended, and never again.
//! - Runners of tombstoned slots stay idle (the cycle driver skips them) and stop with
//!   the scheduler token.
//! - The cycle driver holds the read lock for a whole cycle, so `add`/`remove` wait
//!   for the cycle boundary.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Notify, RwLock, RwLockReadGuard};
use tokio_util::sync::CancellationToken;

use crate::{
    core::runner::RunnerHandle,
    error::SchedulerError,
    events::{Bus, Event, EventKind},
    units::UnitRef,
};

/// Stable handle of a registered unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(usize);

impl SlotId {
    /// Builds a handle from a raw slot index.
    pub const fn new(index: usize) -> Self {
        SlotId(index)
    }

    /// Raw slot index.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "slot#{}", self.0)
    }
}

/// One registry entry.
pub(crate) struct Slot {
    pub unit: UnitRef,
    pub runner: RunnerHandle,
    pub tombstoned: bool,
}

/// Slots plus the freelist, guarded together.
pub(crate) struct Slots {
    pub entries: Vec<Slot>,
    free: Vec<usize>,
}

/// Registry of unit slots.
pub(crate) struct Registry {
    slots: RwLock<Slots>,
    live: AtomicUsize,
    added: Notify,
    bus: Bus,
    token: CancellationToken,
}

impl Registry {
    /// Creates an empty registry; runner stop tokens are children of `token`.
    pub fn new(bus: Bus, token: CancellationToken, slot_capacity: usize) -> Self {
        Self {
            slots: RwLock::new(Slots {
                entries: Vec::with_capacity(slot_capacity),
                free: Vec::new(),
            }),
            live: AtomicUsize::new(0),
            added: Notify::new(),
            bus,
            token,
        }
    }

    /// Registers `unit`, reusing the most recently freed slot if any.
    pub async fn add(&self, unit: UnitRef) -> SlotId {
        let mut slots = self.slots.write().await;

        let index = match slots.free.pop() {
            Some(index) => {
                let slot = &mut slots.entries[index];
                slot.unit = unit;
                slot.tombstoned = false;
                index
            }
            None => {
                let index = slots.entries.len();
                let runner =
                    RunnerHandle::spawn(index, self.bus.clone(), self.token.child_token());
                slots.entries.push(Slot {
                    unit,
                    runner,
                    tombstoned: false,
                });
                index
            }
        };
        self.live.fetch_add(1, Ordering::Relaxed);
        self.added.notify_one();

        let name = slots.entries[index].unit.name().to_owned();
        drop(slots);
        self.bus.publish(
            Event::new(EventKind::UnitAdded)
                .with_unit(name)
                .with_slot(index),
        );
        SlotId(index)
    }

    /// Tombstones `id` and queues its index for reuse.
    ///
    /// Fails with [`SchedulerError::NotFound`] for an index that was never issued or
    /// is already tombstoned.
    pub async fn remove(&self, id: SlotId) -> Result<(), SchedulerError> {
        let mut slots = self.slots.write().await;

        let slot = slots
            .entries
            .get_mut(id.0)
            .filter(|slot| !slot.tombstoned)
            .ok_or(SchedulerError::NotFound { slot: id.0 })?;
        slot.tombstoned = true;
        let name = slot.unit.name().to_owned();
        slots.free.push(id.0);
        self.live.fetch_sub(1, Ordering::Relaxed);

        drop(slots);
        self.bus.publish(
            Event::new(EventKind::UnitRemoved)
                .with_unit(name)
                .with_slot(id.0),
        );
        Ok(())
    }

    /// Number of live (non-tombstoned) units.
    pub fn len(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    /// Resolves once at least one live unit is registered.
    pub async fn wait_for_units(&self) {
        while self.len() == 0 {
            self.added.notified().await;
        }
    }

    /// Shared access for the cycle driver.
    pub async fn read(&self) -> RwLockReadGuard<'_, Slots> {
        self.slots.read().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::UnitError, units::UnitFn};

    fn unit(name: &'static str) -> UnitRef {
        UnitFn::arc(name, || async { Ok::<(), UnitError>(()) })
    }

    fn registry() -> Registry {
        Registry::new(Bus::new(64), CancellationToken::new(), 4)
    }

    #[tokio::test]
    async fn add_appends_in_order() {
        let reg = registry();
        assert_eq!(reg.add(unit("a")).await, SlotId::new(0));
        assert_eq!(reg.add(unit("b")).await, SlotId::new(1));
        assert_eq!(reg.add(unit("c")).await, SlotId::new(2));
        assert_eq!(reg.len(), 3);
    }

    #[tokio::test]
    async fn remove_then_add_reuses_index_lifo() {
        let reg = registry();
        for name in ["a", "b", "c", "d"] {
            reg.add(unit(name)).await;
        }

        reg.remove(SlotId::new(1)).await.unwrap();
        reg.remove(SlotId::new(3)).await.unwrap();
        assert_eq!(reg.len(), 2);

        assert_eq!(reg.add(unit("e")).await, SlotId::new(3));
        assert_eq!(reg.add(unit("f")).await, SlotId::new(1));
        assert_eq!(reg.add(unit("g")).await, SlotId::new(4));

        let slots = reg.read().await;
        assert_eq!(slots.entries.len(), 5);
        assert_eq!(slots.entries[3].unit.name(), "e");
        assert_eq!(slots.entries[1].unit.name(), "f");
        assert!(slots.entries.iter().all(|s| !s.tombstoned));
    }

    #[tokio::test]
    async fn add_remove_add_reuses_same_index() {
        let reg = registry();
        let id = reg.add(unit("a")).await;
        reg.remove(id).await.unwrap();
        assert_eq!(reg.add(unit("b")).await, id);
    }

    #[tokio::test]
    async fn remove_unknown_or_tombstoned_is_not_found() {
        let reg = registry();
        assert_eq!(
            reg.remove(SlotId::new(0)).await,
            Err(SchedulerError::NotFound { slot: 0 })
        );

        let id = reg.add(unit("a")).await;
        assert_eq!(
            reg.remove(SlotId::new(1)).await,
            Err(SchedulerError::NotFound { slot: 1 })
        );
        reg.remove(id).await.unwrap();
        assert_eq!(
            reg.remove(id).await,
            Err(SchedulerError::NotFound { slot: 0 })
        );
        assert_eq!(reg.len(), 0);
    }

    #[tokio::test]
    async fn wait_for_units_resolves_on_add() {
        let reg = std::sync::Arc::new(registry());
        let waiter = {
            let reg = std::sync::Arc::clone(&reg);
            tokio::spawn(async move { reg.wait_for_units().await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        reg.add(unit("a")).await;
        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn publishes_registration_events() {
        let reg = registry();
        let mut rx = reg.bus.subscribe();

        let id = reg.add(unit("a")).await;
        reg.remove(id).await.unwrap();

        let added = rx.recv().await.unwrap();
        assert_eq!(added.kind, EventKind::UnitAdded);
        assert_eq!(added.unit.as_deref(), Some("a"));
        let removed = rx.recv().await.unwrap();
        assert_eq!(removed.kind, EventKind::UnitRemoved);
        assert_eq!(removed.slot, Some(0));
    }
}
