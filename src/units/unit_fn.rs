//! # Closure-backed unit (`UnitFn`)
//!
//! [`UnitFn`] wraps a closure `F: Fn() -> Fut`, producing a fresh future on every
//! cycle. State shared between cycles must live behind an explicit `Arc<...>` captured
//! by the closure.
//!
//! ## Example
//! ```rust
//! use cyclevisor::{UnitError, UnitFn, UnitRef};
//!
//! let u: UnitRef = UnitFn::arc("sync-users", || async {
//!     // do work...
//!     Ok::<_, UnitError>(())
//! });
//!
//! assert_eq!(u.name(), "sync-users");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::UnitError;
use crate::units::unit::Unit;

/// Closure-backed unit implementation.
#[derive(Debug)]
pub struct UnitFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> UnitFn<F> {
    /// Creates a new closure-backed unit.
    ///
    /// Prefer [`UnitFn::arc`] when you immediately need a [`UnitRef`](crate::UnitRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the unit and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Unit for UnitFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), UnitError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self) -> Result<(), UnitError> {
        (self.f)().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::units::UnitRef;

    #[tokio::test]
    async fn process_creates_fresh_future_per_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let unit: UnitRef = UnitFn::arc("counter", move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<(), UnitError>(())
            }
        });

        unit.process().await.unwrap();
        unit.process().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(unit.name(), "counter");
    }

    #[tokio::test]
    async fn errors_pass_through() {
        let unit: UnitRef = UnitFn::arc("broken", || async { Err::<(), _>(UnitError::fail("nope")) });
        let err = unit.process().await.unwrap_err();
        assert_eq!(err.as_label(), "unit_failed");
    }
}
