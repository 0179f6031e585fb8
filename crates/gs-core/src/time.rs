//! Simulation time representation.
//!
//! Time is a plain `f64` in seconds. The sentinels below mark "never"
//! and "unset" trigger times; keeping them finite lets ordinary float
//! comparisons order scheduled events without special cases.

/// Simulation time in seconds.
pub type Time = f64;

/// Start-of-simulation time.
pub const TIME_ZERO: Time = 0.0;

/// A trigger time far enough in the future that it never fires.
pub const MAX_TIME: Time = 1e48;

/// Sentinel for an unset/invalid trigger time.
pub const NEG_TIME: Time = -1e48;

/// Default tolerance when comparing event times against the current time.
pub const DEFAULT_TIME_TOLERANCE: Time = 1e-9;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_order() {
        assert!(NEG_TIME < TIME_ZERO);
        assert!(TIME_ZERO < MAX_TIME);
        assert!(MAX_TIME + 1.0 > MAX_TIME * 0.5);
    }
}
