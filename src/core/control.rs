//! # Control loop: the single coordinator of a scheduler.
//!
//! Owns the speed state and the pause flag, drives cycles one after another and
//! services control requests in between (and while a cycle is in flight).
//!
//! ## State machine
//! ```text
//!            ┌──────── play ────────┐
//!            ▼                      │
//!   ┌──► Running ───── pause ───► Paused
//!   │     │  │                      │
//!   │     │  └──── stop ──► Stopped ◄── stop
//!   │     ▼
//!   │   Armed ─► Cycling ─► Throttling (speed < 0) ─┐
//!   │     │                                          │
//!   │     └─► Idle (no units) ── unit added ──► Armed│
//!   └────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//! - The first cycle is armed at creation, so scheduling starts immediately.
//! - With no live units the loop parks in `Idle` until one is added.
//! - Cycle N+1 never starts before every dispatch of cycle N completed.
//! - Pause is acknowledged at once; the cycle in flight (and its slow-motion delay)
//!   still finishes, but no new cycle starts until `play`.
//! - A rejected speed change is reported to the caller; the loop keeps running.
//! - Stop (token cancelled) ends the loop at its next await point; the cycle future
//!   is dropped while runners finish the units they already hold.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::{FutureExt, future::BoxFuture};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Sleep, sleep};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{cycle::run_cycle, gate::Gate, registry::Registry, speed::Speed},
    error::SchedulerError,
    events::{Bus, Event, EventKind},
};

/// Snapshot of the scheduling state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Status {
    /// Current speed (`>= 1` concurrency level, `<= -1` slow-motion factor).
    pub speed: i64,
    /// Current gate capacity.
    pub capacity: usize,
    /// Whether the scheduler is paused.
    pub paused: bool,
    /// Number of fully completed cycles.
    pub cycles: u64,
}

/// Requests serviced by the control loop.
pub(crate) enum Command {
    ChangeSpeed {
        modifier: i64,
        reply: oneshot::Sender<Result<i64, SchedulerError>>,
    },
    Pause {
        reply: oneshot::Sender<Result<(), SchedulerError>>,
    },
    Play {
        reply: oneshot::Sender<Result<(), SchedulerError>>,
    },
    Status {
        reply: oneshot::Sender<Status>,
    },
}

/// Where the loop is between two cycles.
enum Phase {
    /// Next cycle may start (held back only by pause).
    Armed,
    /// Registry is empty; waits for the first unit.
    Idle(BoxFuture<'static, ()>),
    Cycling(BoxFuture<'static, Duration>),
    Throttling(Pin<Box<Sleep>>),
}

enum Step {
    Woken,
    Cycled(Duration),
    Throttled,
}

impl Phase {
    /// Resolves when the current phase completes; never resolves while armed.
    async fn advance(&mut self) -> Step {
        match self {
            Phase::Armed => std::future::pending().await,
            Phase::Idle(wait) => {
                wait.await;
                Step::Woken
            }
            Phase::Cycling(cycle) => Step::Cycled(cycle.await),
            Phase::Throttling(delay) => {
                delay.await;
                Step::Throttled
            }
        }
    }
}

pub(crate) struct ControlLoop {
    registry: Arc<Registry>,
    gate: Arc<Gate>,
    bus: Bus,
    commands: mpsc::Receiver<Command>,
    token: CancellationToken,
    speed: Speed,
    paused: bool,
    started: u64,
    completed: u64,
}

impl ControlLoop {
    pub fn new(
        registry: Arc<Registry>,
        gate: Arc<Gate>,
        bus: Bus,
        commands: mpsc::Receiver<Command>,
        token: CancellationToken,
    ) -> Self {
        Self {
            registry,
            gate,
            bus,
            commands,
            token,
            speed: Speed::INITIAL,
            paused: false,
            started: 0,
            completed: 0,
        }
    }

    /// Runs until the token is cancelled or every command sender is gone.
    pub async fn run(mut self) {
        let mut phase = Phase::Armed;

        loop {
            if matches!(phase, Phase::Armed) && !self.paused {
                phase = if self.registry.len() == 0 {
                    let registry = Arc::clone(&self.registry);
                    Phase::Idle(async move { registry.wait_for_units().await }.boxed())
                } else {
                    Phase::Cycling(self.begin_cycle())
                };
            }

            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
                step = phase.advance() => {
                    phase = self.finish(step);
                }
            }
        }
        tracing::debug!(cycles = self.completed, "control loop exited");
    }

    fn begin_cycle(&mut self) -> BoxFuture<'static, Duration> {
        self.started += 1;
        self.bus
            .publish(Event::new(EventKind::CycleStarted).with_cycle(self.started));
        run_cycle(Arc::clone(&self.registry), Arc::clone(&self.gate), self.started).boxed()
    }

    fn finish(&mut self, step: Step) -> Phase {
        let elapsed = match step {
            Step::Woken | Step::Throttled => return Phase::Armed,
            Step::Cycled(elapsed) => elapsed,
        };
        self.completed += 1;
        self.bus.publish(
            Event::new(EventKind::CycleFinished)
                .with_cycle(self.completed)
                .with_elapsed(elapsed),
        );

        match self.speed.throttle(elapsed) {
            Some(delay) => {
                self.bus.publish(
                    Event::new(EventKind::ThrottleScheduled)
                        .with_cycle(self.completed)
                        .with_speed(self.speed.get())
                        .with_delay(delay),
                );
                Phase::Throttling(Box::pin(sleep(delay)))
            }
            None => Phase::Armed,
        }
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::ChangeSpeed { modifier, reply } => {
                let _ = reply.send(self.change_speed(modifier));
            }
            Command::Pause { reply } => {
                let res = if self.paused {
                    Err(SchedulerError::AlreadyPaused)
                } else {
                    self.paused = true;
                    self.bus.publish(Event::new(EventKind::Paused));
                    Ok(())
                };
                let _ = reply.send(res);
            }
            Command::Play { reply } => {
                let res = if self.paused {
                    self.paused = false;
                    self.bus.publish(Event::new(EventKind::Resumed));
                    Ok(())
                } else {
                    Err(SchedulerError::NotPaused)
                };
                let _ = reply.send(res);
            }
            Command::Status { reply } => {
                let _ = reply.send(Status {
                    speed: self.speed.get(),
                    capacity: self.gate.capacity(),
                    paused: self.paused,
                    cycles: self.completed,
                });
            }
        }
    }

    fn change_speed(&mut self, modifier: i64) -> Result<i64, SchedulerError> {
        match self.speed.change(modifier) {
            Ok(change) => {
                self.speed = change.speed;
                if let Some(capacity) = change.resize {
                    self.gate.resize(capacity);
                }
                self.bus.publish(
                    Event::new(EventKind::SpeedChanged)
                        .with_speed(self.speed.get())
                        .with_capacity(self.gate.capacity()),
                );
                Ok(self.speed.get())
            }
            Err(e) => {
                tracing::warn!(
                    speed = self.speed.get(),
                    modifier,
                    reason = %e.as_message(),
                    "speed change rejected"
                );
                self.bus.publish(
                    Event::new(EventKind::SpeedRejected)
                        .with_speed(self.speed.get())
                        .with_reason(e.as_label()),
                );
                Err(e)
            }
        }
    }
}
