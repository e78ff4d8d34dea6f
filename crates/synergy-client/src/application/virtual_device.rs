//! `VirtualDevice`: the capability interface through which the dispatcher
//! emits kernel input events.
//!
//! This use case sits at the application layer and delegates to a
//! [`VirtualDevice`] trait object for OS-level event injection. The Linux
//! uinput implementation lives in the infrastructure layer; a future
//! compositor-portal backend could be substituted without touching the
//! dispatcher (see the plug-in design note in `SPEC_FULL.md` §9).

use evdev::Key;
use thiserror::Error;

/// Error type for virtual input device operations.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("uinput error: {0}")]
    Uinput(String),
    #[error("operation not supported by this device: {0}")]
    Unsupported(&'static str),
}

/// Capability interface a kernel virtual input device exposes to the
/// dispatcher.
///
/// Implementations own the held-keys set: for every code reported as
/// pressed via [`VirtualDevice::press`], an implementation must track it so
/// that [`VirtualDevice::reset`] (and, on teardown, the `Drop` impl) can
/// release everything that is still held.
pub trait VirtualDevice: Send {
    /// Emits a key/button press. A no-op if `code` is already held.
    fn press(&mut self, code: Key) -> Result<(), DeviceError>;

    /// Emits a key/button release. A no-op if `code` is not held.
    fn release(&mut self, code: Key) -> Result<(), DeviceError>;

    /// Emits a relative pointer move. Zero-valued axes are suppressed.
    fn move_rel(&mut self, dx: i32, dy: i32) -> Result<(), DeviceError>;

    /// Emits an absolute pointer move.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Unsupported`] if the device was not created
    /// with `EV_ABS` capability.
    fn move_abs(&mut self, x: i32, y: i32) -> Result<(), DeviceError>;

    /// Emits a mouse wheel event. `dx`/`dy` are raw Synergy wheel units (120
    /// per detent); implementations convert to ticks internally.
    fn wheel(&mut self, dx: i32, dy: i32) -> Result<(), DeviceError>;

    /// Releases every currently held code, in insertion order, and clears
    /// the held-keys set.
    fn reset(&mut self) -> Result<(), DeviceError>;

    /// The codes currently held, for test assertions and invariant checks.
    fn held_keys(&self) -> Vec<Key>;
}

/// Converts a raw Synergy wheel delta (120 units per detent) to a signed
/// tick count, rounded away from zero: any nonzero remainder still counts
/// as a full tick rather than being dropped, so `241` yields `3` ticks, not
/// `2`.
///
/// `0` produces zero ticks; `120` (or `-120`) produces exactly one tick in
/// the matching sign.
pub fn wheel_ticks(value: i32) -> i32 {
    if value == 0 {
        return 0;
    }
    let ticks = (value.abs() + 119) / 120;
    if value < 0 {
        -ticks
    } else {
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wheel_ticks_zero_is_zero() {
        assert_eq!(wheel_ticks(0), 0);
    }

    #[test]
    fn test_wheel_ticks_partial_detent_rounds_away_from_zero() {
        assert_eq!(wheel_ticks(1), 1);
        assert_eq!(wheel_ticks(119), 1);
        assert_eq!(wheel_ticks(-119), -1);
    }

    #[test]
    fn test_wheel_ticks_one_detent_is_one_tick() {
        assert_eq!(wheel_ticks(120), 1);
        assert_eq!(wheel_ticks(-120), -1);
    }

    #[test]
    fn test_wheel_ticks_multiple_detents() {
        assert_eq!(wheel_ticks(360), 3);
        assert_eq!(wheel_ticks(-241), -3);
    }
}
