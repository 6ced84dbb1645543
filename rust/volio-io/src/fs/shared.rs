//! Helpers shared by both platform implementations and the retry loop.

use std::{ffi::OsStr, time::Duration};

/// Picks a pseudo-random delay in `[0, max]`.
///
/// Processes contending for the same file must not retry in lockstep.
pub fn jittered_delay(max: Duration) -> Duration {
    if max.is_zero() {
        return Duration::ZERO;
    }
    max.mul_f64(fastrand::f64())
}

/// Returns `true` for the `.` and `..` pseudo-entries.
pub fn is_dot_entry(name: &OsStr) -> bool {
    name == "." || name == ".."
}
