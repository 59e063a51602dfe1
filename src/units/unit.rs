//! # Work unit abstraction.
//!
//! A unit is the opaque piece of work the scheduler runs once per cycle.
//! The common handle type is [`UnitRef`], an `Arc<dyn Unit>` suitable for sharing
//! between the registry and the slot runners.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::UnitError;

/// Shared handle to a unit.
pub type UnitRef = Arc<dyn Unit>;

/// # Asynchronous, fallible unit of work.
///
/// A `Unit` is processed once per cycle by the runner of the slot it is registered in.
/// Errors are logged and published by the runtime; they never stop the scheduler and
/// are never retried (retries, if needed, are the unit's own business).
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use cyclevisor::{Unit, UnitError};
///
/// struct Poll;
///
/// #[async_trait]
/// impl Unit for Poll {
///     fn name(&self) -> &str { "poll" }
///
///     async fn process(&self) -> Result<(), UnitError> {
///         // do work...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Unit: Send + Sync + 'static {
    /// Returns a human-readable unit name used in logs and events.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Processes the unit once.
    async fn process(&self) -> Result<(), UnitError>;
}
