//! # Concurrency gate: a resizable counting semaphore.
//!
//! The cycle driver takes one permit per dispatched unit; the unit's runner gives it
//! back after the unit finished. Capacity therefore bounds how many units execute at
//! the same time.
//!
//! ## Resize
//! ```text
//! grow(n):    pay back debt first, add the rest as fresh permits
//! shrink(n):  forget idle permits; whatever is still held becomes debt
//! release:    debt > 0 ─► permit is forgotten, debt -= 1
//!             debt = 0 ─► permit returns to the semaphore
//! ```
//! - One semaphore lives for the whole scheduler; resizing never closes it.
//! - Units already running when the gate shrinks finish normally. Their permits
//!   settle the debt, so no new unit starts until fewer than `capacity` run.
//! - Invariant: `available + held == capacity + debt`, and `available == 0`
//!   whenever `debt > 0`.
//! - Capacity is clamped to `[1, Semaphore::MAX_PERMITS]`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

struct Ledger {
    capacity: usize,
    /// Permits currently held that must be forgotten instead of returned.
    debt: usize,
}

struct Inner {
    semaphore: Arc<Semaphore>,
    ledger: Mutex<Ledger>,
}

impl Inner {
    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resizable concurrency limiter shared by the control loop and the cycle driver.
pub(crate) struct Gate {
    inner: Arc<Inner>,
}

/// Permit held by one executing unit; returned (or settled against debt) on drop.
pub(crate) struct GatePermit {
    permit: Option<OwnedSemaphorePermit>,
    inner: Arc<Inner>,
}

impl Gate {
    pub fn new(capacity: usize) -> Self {
        let capacity = clamp(capacity);
        Self {
            inner: Arc::new(Inner {
                semaphore: Arc::new(Semaphore::new(capacity)),
                ledger: Mutex::new(Ledger { capacity, debt: 0 }),
            }),
        }
    }

    /// Current capacity.
    pub fn capacity(&self) -> usize {
        self.inner.ledger().capacity
    }

    /// Changes the capacity; holders of existing permits are not disturbed.
    pub fn resize(&self, capacity: usize) {
        let capacity = clamp(capacity);
        let mut ledger = self.inner.ledger();
        let current = ledger.capacity;
        ledger.capacity = capacity;

        if capacity > current {
            let grow = capacity - current;
            let settled = grow.min(ledger.debt);
            ledger.debt -= settled;
            self.inner.semaphore.add_permits(grow - settled);
            return;
        }

        let mut shrink = current - capacity;
        while shrink > 0 {
            match self.inner.semaphore.try_acquire() {
                Ok(idle) => idle.forget(),
                Err(_) => break,
            }
            shrink -= 1;
        }
        ledger.debt += shrink;
    }

    /// Waits for a permit.
    pub async fn acquire(&self) -> GatePermit {
        // the semaphore is never closed
        let permit = Arc::clone(&self.inner.semaphore).acquire_owned().await.ok();
        GatePermit {
            permit,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        let Some(permit) = self.permit.take() else {
            return;
        };
        let mut ledger = self.inner.ledger();
        if ledger.debt > 0 {
            ledger.debt -= 1;
            permit.forget();
        } else {
            drop(permit);
        }
    }
}

fn clamp(capacity: usize) -> usize {
    capacity.clamp(1, Semaphore::MAX_PERMITS)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    async fn blocked(gate: &Gate) -> bool {
        tokio::time::timeout(Duration::from_millis(30), gate.acquire())
            .await
            .is_err()
    }

    #[test]
    fn capacity_is_clamped() {
        let gate = Gate::new(0);
        assert_eq!(gate.capacity(), 1);
        gate.resize(usize::MAX);
        assert_eq!(gate.capacity(), Semaphore::MAX_PERMITS);
    }

    #[tokio::test]
    async fn acquire_blocks_at_capacity() {
        let gate = Gate::new(2);
        let _a = gate.acquire().await;
        let b = gate.acquire().await;
        assert!(blocked(&gate).await);

        drop(b);
        let c = tokio::time::timeout(Duration::from_millis(100), gate.acquire()).await;
        assert!(c.is_ok());
    }

    #[tokio::test]
    async fn grow_adds_permits_next_to_existing_holders() {
        let gate = Gate::new(1);
        let held = gate.acquire().await;

        gate.resize(3);
        assert_eq!(gate.capacity(), 3);
        let p1 = gate.acquire().await;
        let p2 = gate.acquire().await;
        assert!(blocked(&gate).await);

        drop(held);
        let p3 = gate.acquire().await;
        assert!(blocked(&gate).await);
        drop((p1, p2, p3));
        assert_eq!(gate.inner.semaphore.available_permits(), 3);
    }

    #[tokio::test]
    async fn shrink_waits_for_running_holders_to_drain() {
        let gate = Gate::new(4);
        let mut held: Vec<_> = Vec::new();
        for _ in 0..4 {
            held.push(gate.acquire().await);
        }

        gate.resize(1);
        assert_eq!(gate.capacity(), 1);
        assert_eq!(gate.inner.ledger().debt, 3);

        // three of the four holders finish: still one running, nothing free
        for _ in 0..3 {
            drop(held.pop());
            assert!(blocked(&gate).await);
        }
        assert_eq!(gate.inner.ledger().debt, 0);

        drop(held.pop());
        let one = gate.acquire().await;
        assert!(blocked(&gate).await);
        drop(one);
        assert_eq!(gate.inner.semaphore.available_permits(), 1);
    }

    #[tokio::test]
    async fn shrink_forgets_idle_permits_first() {
        let gate = Gate::new(4);
        let held = gate.acquire().await;

        gate.resize(2);
        assert_eq!(gate.inner.ledger().debt, 0);
        let other = gate.acquire().await;
        assert!(blocked(&gate).await);
        drop((held, other));
        assert_eq!(gate.inner.semaphore.available_permits(), 2);
    }

    #[tokio::test]
    async fn grow_settles_debt_before_adding_permits() {
        let gate = Gate::new(3);
        let a = gate.acquire().await;
        let b = gate.acquire().await;
        let c = gate.acquire().await;

        gate.resize(1);
        assert_eq!(gate.inner.ledger().debt, 2);
        gate.resize(2);
        assert_eq!(gate.inner.ledger().debt, 1);
        assert!(blocked(&gate).await);

        drop((a, b, c));
        assert_eq!(gate.inner.semaphore.available_permits(), 2);
    }

    #[tokio::test]
    async fn waiting_acquire_is_released_by_growth() {
        let gate = Arc::new(Gate::new(1));
        let held = gate.acquire().await;

        let waiter = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.acquire().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        gate.resize(2);
        let permit = tokio::time::timeout(Duration::from_millis(200), waiter)
            .await
            .expect("waiter should be released by the resize")
            .unwrap();
        drop(permit);
        drop(held);
    }
}
