//! # Event subscribers.
//!
//! - [`Subscribe`]: trait for plugging custom event handlers into the runtime.
//! - [`SubscriberSet`]: per-subscriber queues and workers with panic isolation.
//! - `LogWriter` (feature `logging`): built-in `tracing` bridge.

#[cfg(feature = "logging")]
mod embedded;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
pub(crate) use subscriber_set::panic_message;
