//! # Work unit abstractions.
//!
//! This module provides the unit-related types:
//! - [`Unit`] - trait for implementing an async, fallible unit of work
//! - [`UnitFn`] - closure-backed unit implementation
//! - [`UnitRef`] - shared reference to a unit (`Arc<dyn Unit>`)

mod unit;
mod unit_fn;

pub use unit::{Unit, UnitRef};
pub use unit_fn::UnitFn;
