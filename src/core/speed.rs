//! # Speed state and the speed-change mapping.
//!
//! Speed is a signed, non-zero integer:
//! - `speed >= 1`: up to `speed` units run concurrently, no delay between cycles;
//! - `speed <= -1`: slow motion, one unit at a time, and after each cycle the loop
//!   sleeps `elapsed × |speed|`.
//!
//! [`Speed::change`] maps `(speed, modifier)` to a new speed. Moves that stay inside a
//! regime multiply/divide and keep the gate as is; moves that cross between the fast
//! and slow-motion regimes add the modifier and resize the gate.
//!
//! ```text
//! modifier > 1  (faster)
//!   speed >= 1                  → speed * m           resize(speed)
//!   speed <= -1, speed / m > -1 → m + speed           resize(speed)
//!   speed <= -1, otherwise      → speed / m           (gate untouched)
//! modifier < -1 (slower)
//!   speed <= -1                 → speed * m * -1      (gate untouched)
//!   speed >= 1, speed / m < 1   → m + speed           resize(1)
//!   speed >= 1, otherwise       → speed / m * -1      (gate untouched)
//! ```
//!
//! Division truncates toward zero. `±1` and `0` are rejected as modifiers.

use std::time::Duration;

use crate::error::SchedulerError;

/// Current speed of a scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Speed(i64);

/// Outcome of a successful [`Speed::change`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SpeedChange {
    /// Speed after the change.
    pub speed: Speed,
    /// New gate capacity, when the change resizes the gate.
    pub resize: Option<usize>,
}

impl Speed {
    /// Initial speed: concurrency 1, no delay.
    pub const INITIAL: Speed = Speed(1);

    pub fn new(value: i64) -> Self {
        Speed(value)
    }

    #[inline]
    pub fn get(self) -> i64 {
        self.0
    }

    /// Delay to insert after a cycle that took `elapsed`, if in slow motion.
    pub fn throttle(self, elapsed: Duration) -> Option<Duration> {
        if self.0 >= 0 {
            return None;
        }
        let factor = u32::try_from(self.0.unsigned_abs()).unwrap_or(u32::MAX);
        Some(elapsed.saturating_mul(factor))
    }

    /// Applies `modifier` and returns the new speed plus an optional gate resize.
    ///
    /// ### Errors
    /// - [`SchedulerError::InvalidModifier`] for `modifier ∈ {-1, 0, 1}`
    /// - [`SchedulerError::Unprocessable`] when the current speed is `0`
    /// - [`SchedulerError::SpeedOverflow`] when the result does not fit in `i64`
    pub fn change(self, modifier: i64) -> Result<SpeedChange, SchedulerError> {
        if (-1..=1).contains(&modifier) {
            return Err(SchedulerError::InvalidModifier { modifier });
        }
        let cur = self.0;
        if cur == 0 {
            return Err(SchedulerError::Unprocessable);
        }
        let overflow = || SchedulerError::SpeedOverflow {
            speed: cur,
            modifier,
        };

        // |modifier| >= 2 below, so the divisions cannot overflow.
        let (next, resize) = if modifier > 1 {
            if cur >= 1 {
                let next = cur.checked_mul(modifier).ok_or_else(overflow)?;
                (next, Some(capacity_of(next)))
            } else if cur / modifier > -1 {
                let next = modifier.checked_add(cur).ok_or_else(overflow)?;
                (next, Some(capacity_of(next)))
            } else {
                (cur / modifier, None)
            }
        } else if cur <= -1 {
            let next = cur
                .checked_mul(modifier)
                .and_then(|v| v.checked_mul(-1))
                .ok_or_else(overflow)?;
            (next, None)
        } else if cur / modifier < 1 {
            let next = modifier.checked_add(cur).ok_or_else(overflow)?;
            (next, Some(1))
        } else {
            (cur / modifier * -1, None)
        };

        Ok(SpeedChange {
            speed: Speed(next),
            resize,
        })
    }
}

impl Default for Speed {
    fn default() -> Self {
        Speed::INITIAL
    }
}

/// Gate capacity for a speed value; non-positive values map to 1.
fn capacity_of(speed: i64) -> usize {
    usize::try_from(speed).unwrap_or(1).max(1)
}
