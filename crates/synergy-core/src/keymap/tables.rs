//! [`KeyCodeTables`]: the composed Synergy-ID -> HID -> evdev translation
//! pipeline, plus the mouse-button table, behind a single façade type.
//!
//! This mirrors the shape of a platform-agnostic key mapper that hides the
//! individual per-leg tables behind one entry point: callers outside this
//! module never need to know that a key event crosses a VK pivot on its way
//! from the wire to the kernel.

use evdev::Key;

use super::evdev_codes::{all_evdev_keys, hid_to_evdev_key};
use super::synergy_ids::synergy_id_to_hid;

/// Synergy mouse button numbers, per the Deskflow/Synergy wire convention.
///
/// Buttons 1-3 are the familiar left/middle/right. 4 and 5 are the "side"
/// and "extra" thumb buttons found on most gaming and productivity mice.
const BTN_LEFT_ID: u8 = 1;
const BTN_MIDDLE_ID: u8 = 2;
const BTN_RIGHT_ID: u8 = 3;
const BTN_SIDE_ID: u8 = 4;
const BTN_EXTRA_ID: u8 = 5;

/// Stateless façade over the key-code and mouse-button translation tables.
///
/// All methods are pure functions of their arguments; this type carries no
/// fields and exists only to give the translation pipeline a single, stable
/// name to import.
pub struct KeyCodeTables;

impl KeyCodeTables {
    /// Translates a Synergy key ID (plus its modifier mask) directly to the
    /// evdev key the virtual keyboard should emit.
    ///
    /// Returns `None` when the ID has no known mapping; callers should log
    /// and drop the event rather than fail the session over it (an unknown
    /// key must never be fatal — see the failure-classification notes on
    /// [`crate::protocol`]).
    pub fn synergy_to_event(id: u16, mask: u16) -> Option<Key> {
        hid_to_evdev_key(synergy_id_to_hid(id, mask))
    }

    /// Translates a Synergy mouse button number to the evdev button it
    /// should emit.
    pub fn mouse_button_to_event(button: u8) -> Option<Key> {
        Some(match button {
            BTN_LEFT_ID => Key::BTN_LEFT,
            BTN_MIDDLE_ID => Key::BTN_MIDDLE,
            BTN_RIGHT_ID => Key::BTN_RIGHT,
            BTN_SIDE_ID => Key::BTN_SIDE,
            BTN_EXTRA_ID => Key::BTN_EXTRA,
            _ => return None,
        })
    }

    /// Every evdev key code the virtual keyboard device needs to declare as
    /// a capability (`EV_KEY`) at construction time.
    pub fn all_known_key_codes() -> Vec<Key> {
        all_evdev_keys()
    }

    /// Every evdev button code the virtual mouse device needs to declare.
    pub fn all_known_button_codes() -> Vec<Key> {
        vec![
            Key::BTN_LEFT,
            Key::BTN_MIDDLE,
            Key::BTN_RIGHT,
            Key::BTN_SIDE,
            Key::BTN_EXTRA,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synergy_to_event_translates_letter_a() {
        assert_eq!(KeyCodeTables::synergy_to_event(0x0061, 0), Some(Key::KEY_A));
    }

    #[test]
    fn test_synergy_to_event_unknown_id_returns_none() {
        assert_eq!(KeyCodeTables::synergy_to_event(0x1234, 0), None);
    }

    #[test]
    fn test_mouse_button_table_covers_all_five_buttons() {
        assert_eq!(KeyCodeTables::mouse_button_to_event(1), Some(Key::BTN_LEFT));
        assert_eq!(KeyCodeTables::mouse_button_to_event(2), Some(Key::BTN_MIDDLE));
        assert_eq!(KeyCodeTables::mouse_button_to_event(3), Some(Key::BTN_RIGHT));
        assert_eq!(KeyCodeTables::mouse_button_to_event(4), Some(Key::BTN_SIDE));
        assert_eq!(KeyCodeTables::mouse_button_to_event(5), Some(Key::BTN_EXTRA));
    }

    #[test]
    fn test_mouse_button_out_of_range_returns_none() {
        assert_eq!(KeyCodeTables::mouse_button_to_event(0), None);
        assert_eq!(KeyCodeTables::mouse_button_to_event(6), None);
    }

    #[test]
    fn test_all_known_button_codes_has_no_duplicates() {
        let codes = KeyCodeTables::all_known_button_codes();
        let mut sorted = codes.clone();
        sorted.sort_by_key(|k| k.code());
        sorted.dedup();
        assert_eq!(codes.len(), sorted.len());
    }
}
