//! Runtime core: scheduling and lifecycle.
//!
//! The public API from this module is [`Scheduler`] (built directly or through
//! [`SchedulerBuilder`]), plus the small value types it hands out.
//!
//! Internal modules:
//! - [`control`]: the control loop; owns speed and pause state, drives cycles;
//! - [`cycle`]: one synchronized pass over every live slot;
//! - [`gate`]: resizable concurrency gate;
//! - [`registry`]: indexed slots with tombstones and LIFO reuse;
//! - [`runner`]: long-lived worker per slot;
//! - [`speed`]: speed value and the speed-change mapping.

mod builder;
mod config;
mod control;
mod cycle;
mod gate;
mod registry;
mod runner;
mod scheduler;
mod speed;

pub use builder::SchedulerBuilder;
pub use config::SchedulerConfig;
pub use control::Status;
pub use registry::SlotId;
pub use scheduler::Scheduler;
