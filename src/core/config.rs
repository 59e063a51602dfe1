//! # Scheduler configuration.
//!
//! Provides [`SchedulerConfig`], the centralized settings consumed by
//! [`SchedulerBuilder`](crate::SchedulerBuilder).
//!
//! The scheduling state itself (speed, pause flag) is not configurable: every
//! scheduler starts running at speed `1` (concurrency 1, no delay).

/// Runtime configuration for a [`Scheduler`](crate::Scheduler).
///
/// ## Field semantics
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `command_capacity`: queue of pending control requests (speed/pause/play/status, min 1)
/// - `slot_capacity`: registry slots pre-allocated up front (growth is automatic)
///
/// ## Notes
/// All fields are public for flexibility. Prefer the clamped accessors over reading
/// the fields directly.
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers lagging more than `bus_capacity` events skip the oldest ones.
    pub bus_capacity: usize,

    /// Capacity of the control-loop request queue.
    ///
    /// Callers of `change_speed`/`pause`/`play`/`status` wait when it is full.
    pub command_capacity: usize,

    /// Number of registry slots allocated when the scheduler is created.
    pub slot_capacity: usize,
}

impl SchedulerConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a command queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn command_capacity_clamped(&self) -> usize {
        self.command_capacity.max(1)
    }
}

impl Default for SchedulerConfig {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `command_capacity = 32`
    /// - `slot_capacity = 64`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            command_capacity: 32,
            slot_capacity: 64,
        }
    }
}
