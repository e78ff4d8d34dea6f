//! Synergy protocol key ID to virtual-key (VK) pivot translation table.
//!
//! Synergy key IDs are, for the vast majority of keys, the same numeric
//! values as X11 keysyms: printable ASCII characters use their Latin-1 code
//! point directly (e.g. `'a' = 0x0061`, matching the worked example in the
//! wire protocol description), while non-printable keys live in the
//! `0xFF00`-`0xFFFF` X11 keysym function-key range (`XK_Return = 0xFF0D`,
//! `XK_Shift_L = 0xFFE1`, and so on).
//!
//! # Why not skip straight to HID?
//!
//! Going through the VK pivot lets this table reuse the existing VK→HID
//! table unchanged: every entry here only has to answer "which logical key
//! is this", not "which HID usage is this" — the latter question is already
//! answered once, in [`super::vk`].

use super::hid::HidKeyCode;
use super::vk::vk_to_hid;

/// Translates a Synergy key ID to a [`HidKeyCode`] by way of the VK pivot.
///
/// `mask` is accepted for contract symmetry with the wire protocol (which
/// carries a modifier mask alongside every key ID) but is currently unused:
/// every Synergy ID this table recognizes has a single, mask-invariant
/// target key. A server that relies on AltGr-level3 shifting to select a
/// different physical key for the same ID would need a mask-sensitive
/// entry added here; none of the standard US/ISO layouts this client has
/// been exercised against require one.
pub fn synergy_id_to_hid(id: u16, _mask: u16) -> HidKeyCode {
    if let Some(hid) = direct_override(id) {
        return hid;
    }
    match synergy_id_to_vk(id) {
        Some(vk) => vk_to_hid(vk),
        None => HidKeyCode::Unknown,
    }
}

/// A handful of Synergy IDs have no honest VK equivalent (the VK namespace
/// collapses them onto a key that already means something else) and are
/// translated directly to their target HID code instead of through the
/// pivot.
fn direct_override(id: u16) -> Option<HidKeyCode> {
    match id {
        // XK_KP_Enter. VK_RETURN is shared between Enter and the numpad
        // Enter key on Windows (distinguished only by the scan-code
        // extended bit, which the VK table has no slot for), so numpad
        // Enter is special-cased straight to its own HID code.
        0xFF8D => Some(HidKeyCode::NumpadEnter),
        _ => None,
    }
}

/// Translates a Synergy key ID to the VK pivot code, where one exists.
fn synergy_id_to_vk(id: u16) -> Option<u8> {
    match id {
        // Printable ASCII letters: Synergy sends the case-sensitive
        // character, but VK (like physical key identity) is case-insensitive.
        0x0061..=0x007A => Some((id - 0x20) as u8), // 'a'..'z' -> 'A'..'Z'
        0x0041..=0x005A => Some(id as u8),          // 'A'..'Z'
        0x0030..=0x0039 => Some(id as u8),          // '0'..'9'
        0x0020 => Some(0x20), // Space

        // Punctuation: ASCII code point differs from the VK OEM code.
        0x002D => Some(0xBD), // '-' Minus
        0x003D => Some(0xBB), // '=' Equal
        0x005B => Some(0xDB), // '[' BracketLeft
        0x005D => Some(0xDD), // ']' BracketRight
        0x005C => Some(0xDC), // '\' Backslash
        0x003B => Some(0xBA), // ';' Semicolon
        0x0027 => Some(0xDE), // '\'' Quote
        0x0060 => Some(0xC0), // '`' Backquote
        0x002C => Some(0xBC), // ',' Comma
        0x002E => Some(0xBE), // '.' Period
        0x002F => Some(0xBF), // '/' Slash

        // X11 keysym function-key range.
        0xFF08 => Some(0x08), // XK_BackSpace
        0xFF09 => Some(0x09), // XK_Tab
        0xFF0D => Some(0x0D), // XK_Return
        0xFF1B => Some(0x1B), // XK_Escape
        0xFFFF => Some(0x2E), // XK_Delete

        0xFF50 => Some(0x24), // XK_Home
        0xFF51 => Some(0x25), // XK_Left
        0xFF52 => Some(0x26), // XK_Up
        0xFF53 => Some(0x27), // XK_Right
        0xFF54 => Some(0x28), // XK_Down
        0xFF55 => Some(0x21), // XK_Prior (Page Up)
        0xFF56 => Some(0x22), // XK_Next (Page Down)
        0xFF57 => Some(0x23), // XK_End
        0xFF63 => Some(0x2D), // XK_Insert

        0xFF13 => Some(0x13), // XK_Pause
        0xFF14 => Some(0x91), // XK_Scroll_Lock
        0xFF61 => Some(0x2C), // XK_Print
        0xFF67 => Some(0x5D), // XK_Menu
        0xFF7F => Some(0x90), // XK_Num_Lock

        0xFFBE => Some(0x70), // XK_F1
        0xFFBF => Some(0x71),
        0xFFC0 => Some(0x72),
        0xFFC1 => Some(0x73),
        0xFFC2 => Some(0x74),
        0xFFC3 => Some(0x75),
        0xFFC4 => Some(0x76),
        0xFFC5 => Some(0x77),
        0xFFC6 => Some(0x78),
        0xFFC7 => Some(0x79),
        0xFFC8 => Some(0x7A),
        0xFFC9 => Some(0x7B), // XK_F12

        0xFFE1 => Some(0xA0), // XK_Shift_L
        0xFFE2 => Some(0xA1), // XK_Shift_R
        0xFFE3 => Some(0xA2), // XK_Control_L
        0xFFE4 => Some(0xA3), // XK_Control_R
        0xFFE5 => Some(0x14), // XK_Caps_Lock
        0xFFE9 => Some(0xA4), // XK_Alt_L
        0xFFEA => Some(0xA5), // XK_Alt_R
        0xFFEB => Some(0x5B), // XK_Super_L
        0xFFEC => Some(0x5C), // XK_Super_R

        0xFFB0 => Some(0x60), // XK_KP_0
        0xFFB1 => Some(0x61),
        0xFFB2 => Some(0x62),
        0xFFB3 => Some(0x63),
        0xFFB4 => Some(0x64),
        0xFFB5 => Some(0x65),
        0xFFB6 => Some(0x66),
        0xFFB7 => Some(0x67),
        0xFFB8 => Some(0x68),
        0xFFB9 => Some(0x69), // XK_KP_9
        0xFFAA => Some(0x6A), // XK_KP_Multiply
        0xFFAB => Some(0x6B), // XK_KP_Add
        0xFFAD => Some(0x6D), // XK_KP_Subtract
        0xFFAE => Some(0x6E), // XK_KP_Decimal
        0xFFAF => Some(0x6F), // XK_KP_Divide

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_letter_a_maps_to_key_a() {
        // id=0x61 is the worked example from the key-press scenario.
        assert_eq!(synergy_id_to_hid(0x0061, 0), HidKeyCode::KeyA);
    }

    #[test]
    fn test_uppercase_letter_maps_to_same_hid_as_lowercase() {
        assert_eq!(
            synergy_id_to_hid(0x0041, 0),
            synergy_id_to_hid(0x0061, 0)
        );
    }

    #[test]
    fn test_digits_round_trip_through_vk() {
        for (id, expected) in [
            (0x0030u16, HidKeyCode::Digit0),
            (0x0039u16, HidKeyCode::Digit9),
        ] {
            assert_eq!(synergy_id_to_hid(id, 0), expected);
        }
    }

    #[test]
    fn test_special_keys_map_correctly() {
        assert_eq!(synergy_id_to_hid(0xFF0D, 0), HidKeyCode::Enter);
        assert_eq!(synergy_id_to_hid(0xFF1B, 0), HidKeyCode::Escape);
        assert_eq!(synergy_id_to_hid(0xFF08, 0), HidKeyCode::Backspace);
        assert_eq!(synergy_id_to_hid(0xFFE1, 0), HidKeyCode::ShiftLeft);
        assert_eq!(synergy_id_to_hid(0xFFE4, 0), HidKeyCode::ControlRight);
        assert_eq!(synergy_id_to_hid(0xFF51, 0), HidKeyCode::ArrowLeft);
    }

    #[test]
    fn test_keypad_enter_uses_direct_override() {
        assert_eq!(synergy_id_to_hid(0xFF8D, 0), HidKeyCode::NumpadEnter);
    }

    #[test]
    fn test_function_keys_cover_f1_through_f12() {
        assert_eq!(synergy_id_to_hid(0xFFBE, 0), HidKeyCode::F1);
        assert_eq!(synergy_id_to_hid(0xFFC9, 0), HidKeyCode::F12);
    }

    #[test]
    fn test_unmapped_id_returns_unknown() {
        assert_eq!(synergy_id_to_hid(0x1234, 0), HidKeyCode::Unknown);
    }

    #[test]
    fn test_mask_does_not_change_result_for_known_ids() {
        assert_eq!(
            synergy_id_to_hid(0x0061, 0x0000),
            synergy_id_to_hid(0x0061, 0xFFFF)
        );
    }
}
