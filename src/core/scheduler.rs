//! # Scheduler: public handle over the control loop and the unit registry.
//!
//! ```text
//! Scheduler
//!   ├─ add / remove ─────────────► Registry (write lock, waits for cycle boundary)
//!   ├─ change_speed / faster /
//!   │  slower / pause / play /
//!   │  status ─────► [command queue] ─► ControlLoop ─► oneshot reply
//!   ├─ subscribe ────────────────► Bus receiver
//!   └─ stop ─────► publish SchedulerStopped, cancel token
//!                    ├─► ControlLoop exits
//!                    └─► every Runner exits (child tokens)
//! ```
//!
//! ## Rules
//! - Every operation after [`Scheduler::stop`] returns [`SchedulerError::Stopped`].
//! - Dropping the handle stops the scheduler.
//! - Speed, pause and play requests are answered by the control loop, so errors
//!   (`InvalidModifier`, `AlreadyPaused`, ...) come back to the caller and never stop
//!   scheduling.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use super::{
    builder::SchedulerBuilder,
    config::SchedulerConfig,
    control::{Command, Status},
    registry::{Registry, SlotId},
};
use crate::{
    error::SchedulerError,
    events::{Bus, Event, EventKind},
    units::UnitRef,
};

/// Cyclic scheduler handle.
///
/// Share it behind an `Arc` when several tasks need to control the same schedule.
pub struct Scheduler {
    cfg: SchedulerConfig,
    bus: Bus,
    registry: Arc<Registry>,
    commands: mpsc::Sender<Command>,
    token: CancellationToken,
    stopped: AtomicBool,
}

impl Scheduler {
    /// Creates and starts a scheduler without subscribers.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(cfg: SchedulerConfig) -> Self {
        SchedulerBuilder::new(cfg).build()
    }

    /// Returns a builder for a scheduler with subscribers.
    pub fn builder(cfg: SchedulerConfig) -> SchedulerBuilder {
        SchedulerBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: SchedulerConfig,
        bus: Bus,
        registry: Arc<Registry>,
        commands: mpsc::Sender<Command>,
        token: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            bus,
            registry,
            commands,
            token,
            stopped: AtomicBool::new(false),
        }
    }

    /// Configuration the scheduler was built with.
    pub fn config(&self) -> &SchedulerConfig {
        &self.cfg
    }

    /// Registers a unit and returns its slot handle.
    ///
    /// Reuses the most recently removed slot if there is one. Waits for the cycle in
    /// flight to finish; the unit joins from the next cycle on.
    pub async fn add(&self, unit: UnitRef) -> Result<SlotId, SchedulerError> {
        self.check()?;
        Ok(self.registry.add(unit).await)
    }

    /// Removes the unit in `slot`; its index becomes available for reuse.
    ///
    /// Fails with [`SchedulerError::NotFound`] for an unknown or already removed slot.
    pub async fn remove(&self, slot: SlotId) -> Result<(), SchedulerError> {
        self.check()?;
        self.registry.remove(slot).await
    }

    /// Applies a speed modifier and returns the new speed.
    ///
    /// ### Errors
    /// - [`SchedulerError::InvalidModifier`] for `-1`, `0` and `1`
    /// - [`SchedulerError::Unprocessable`] if the current speed is `0`
    /// - [`SchedulerError::SpeedOverflow`] if the result does not fit
    /// - [`SchedulerError::Stopped`] after stop
    pub async fn change_speed(&self, modifier: i64) -> Result<i64, SchedulerError> {
        self.request(|reply| Command::ChangeSpeed { modifier, reply })
            .await?
    }

    /// Shorthand for `change_speed(2)`.
    pub async fn faster(&self) -> Result<i64, SchedulerError> {
        self.change_speed(2).await
    }

    /// Shorthand for `change_speed(-2)`.
    pub async fn slower(&self) -> Result<i64, SchedulerError> {
        self.change_speed(-2).await
    }

    /// Pauses the schedule. The cycle in flight completes; no new cycle starts.
    pub async fn pause(&self) -> Result<(), SchedulerError> {
        self.request(|reply| Command::Pause { reply }).await?
    }

    /// Resumes a paused schedule.
    pub async fn play(&self) -> Result<(), SchedulerError> {
        self.request(|reply| Command::Play { reply }).await?
    }

    /// Returns a snapshot of speed, gate capacity, pause flag and completed cycles.
    pub async fn status(&self) -> Result<Status, SchedulerError> {
        self.request(|reply| Command::Status { reply }).await
    }

    /// Number of registered (non-removed) units.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Returns `true` when no units are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receiver for runtime events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Stops the scheduler. Idempotent.
    ///
    /// The control loop and all runner loops exit; unit operations already running
    /// are not interrupted.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        self.bus.publish(Event::new(EventKind::SchedulerStopped));
        self.token.cancel();
    }

    /// Returns `true` once [`stop`](Self::stop) was called.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    fn check(&self) -> Result<(), SchedulerError> {
        if self.is_stopped() {
            Err(SchedulerError::Stopped)
        } else {
            Ok(())
        }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, SchedulerError> {
        self.check()?;
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| SchedulerError::Stopped)?;
        rx.await.map_err(|_| SchedulerError::Stopped)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
