//! # cyclevisor
//!
//! **Cyclevisor** is a cyclic scheduler for async units of work.
//!
//! Registered units are processed in synchronized cycles: every live unit runs once
//! per cycle, and cycle N+1 starts only after every unit of cycle N finished. A
//! signed *speed* controls the pace. Positive speeds raise the number of units
//! running at once; negative speeds switch to slow motion, where units run one at a
//! time and each cycle is followed by a pause proportional to its duration.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │     Unit     │   │     Unit     │   │     Unit     │
//!     │   (slot 0)   │   │   (slot 1)   │   │   (slot 2)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Scheduler (public handle)                                        │
//! │  - Registry (indexed slots, tombstones, LIFO reuse)               │
//! │  - command queue ──► ControlLoop (speed, pause, cycle counter)    │
//! │  - Bus (broadcast events)                                         │
//! └──────┬──────────────────────────────────────────────────┬─────────┘
//!        ▼                                                  │
//!  ControlLoop: Armed ─► Cycling ─► Throttling ─► Armed     │
//!        │                                                  │
//!        ▼  run_cycle: acquire Gate permit per live slot    │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐│
//!     │    Runner    │   │    Runner    │   │    Runner    ││
//!     │   (slot 0)   │   │   (slot 1)   │   │   (slot 2)   ││
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘│
//!      │ UnitFailed       │                  │              │
//!      ▼                  ▼                  ▼              ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │             (capacity: SchedulerConfig::bus_capacity)             │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber_listener   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                            (per-sub queues)
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                     sub1.on   sub2.on   subN.on
//!                      _event()  _event()  _event()
//! ```
//!
//! ### Speed
//! ```text
//! speed >= 1    up to `speed` units in parallel, next cycle starts at once
//! speed <= -1   one unit at a time, then sleep(elapsed × |speed|)
//!
//! faster()  = change_speed(2)
//! slower()  = change_speed(-2)
//!
//! 1 ─faster─► 2 ─faster─► 4          1 ─slower─► -1 ─slower─► -2
//! ```
//!
//! ## Features
//! | Area              | Description                                                     | Key types / traits                        |
//! |-------------------|-----------------------------------------------------------------|-------------------------------------------|
//! | **Scheduling**    | Register units, change speed, pause and resume.                 | [`Scheduler`], [`SchedulerBuilder`]       |
//! | **Units**         | Define units as trait impls or closures.                        | [`Unit`], [`UnitFn`], [`UnitRef`]         |
//! | **Subscriber API**| Hook into cycle/unit/speed events (logging, metrics, ...).      | [`Subscribe`], [`Event`], [`EventKind`]   |
//! | **Errors**        | Typed errors for control requests and unit processing.          | [`SchedulerError`], [`UnitError`]         |
//! | **Configuration** | Centralize runtime settings.                                    | [`SchedulerConfig`]                       |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in `LogWriter` that forwards events to `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use cyclevisor::{Scheduler, SchedulerConfig, UnitError, UnitFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), cyclevisor::SchedulerError> {
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn cyclevisor::Subscribe>> = vec![Arc::new(cyclevisor::LogWriter)];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn cyclevisor::Subscribe>> = Vec::new();
//!
//!     let sched = Scheduler::builder(SchedulerConfig::default())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     let slot = sched
//!         .add(UnitFn::arc("poll", || async {
//!             // fetch something...
//!             Ok::<_, UnitError>(())
//!         }))
//!         .await?;
//!
//!     assert_eq!(sched.faster().await?, 2);
//!     sched.pause().await?;
//!     sched.play().await?;
//!
//!     sched.remove(slot).await?;
//!     sched.stop();
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod subscribers;
mod units;

// ---- Public re-exports ----

pub use core::{Scheduler, SchedulerBuilder, SchedulerConfig, SlotId, Status};
pub use error::{SchedulerError, UnitError};
pub use events::{Bus, Event, EventKind};
pub use subscribers::{Subscribe, SubscriberSet};
pub use units::{Unit, UnitFn, UnitRef};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
