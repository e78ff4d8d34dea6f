//! USB HID Usage ID to Linux kernel `evdev` key-code translation table.
//!
//! Reference: USB HID Usage Tables 1.3 and `linux/input-event-codes.h`.
//!
//! # Why translate HID to evdev instead of X11 keysyms?
//!
//! A uinput virtual device is a kernel object: every event it emits carries
//! a kernel event code (`KEY_A`, `KEY_LEFTSHIFT`, ...), not an X11 keysym.
//! Those codes are stable across X11 *and* Wayland sessions because they
//! live below both display servers, in the kernel input subsystem — which is
//! exactly why this table, not an X11-keysym table, is the right pivot for a
//! client that has to work on Wayland compositors with no X server at all.
//!
//! The `evdev` crate's [`Key`] constants are named after the kernel's
//! `KEY_*` macros one-for-one, so this table reads like a Rosetta stone
//! between the USB HID and Linux kernel key-naming conventions.

use evdev::Key;

use super::hid::HidKeyCode;

/// Translates a [`HidKeyCode`] to the kernel `evdev` [`Key`] that the
/// virtual device should emit for it.
///
/// Returns `None` for HID codes with no standard keyboard evdev equivalent
/// (currently only [`HidKeyCode::Unknown`]).
pub fn hid_to_evdev_key(hid: HidKeyCode) -> Option<Key> {
    use HidKeyCode::*;
    Some(match hid {
        KeyA => Key::KEY_A,
        KeyB => Key::KEY_B,
        KeyC => Key::KEY_C,
        KeyD => Key::KEY_D,
        KeyE => Key::KEY_E,
        KeyF => Key::KEY_F,
        KeyG => Key::KEY_G,
        KeyH => Key::KEY_H,
        KeyI => Key::KEY_I,
        KeyJ => Key::KEY_J,
        KeyK => Key::KEY_K,
        KeyL => Key::KEY_L,
        KeyM => Key::KEY_M,
        KeyN => Key::KEY_N,
        KeyO => Key::KEY_O,
        KeyP => Key::KEY_P,
        KeyQ => Key::KEY_Q,
        KeyR => Key::KEY_R,
        KeyS => Key::KEY_S,
        KeyT => Key::KEY_T,
        KeyU => Key::KEY_U,
        KeyV => Key::KEY_V,
        KeyW => Key::KEY_W,
        KeyX => Key::KEY_X,
        KeyY => Key::KEY_Y,
        KeyZ => Key::KEY_Z,

        Digit1 => Key::KEY_1,
        Digit2 => Key::KEY_2,
        Digit3 => Key::KEY_3,
        Digit4 => Key::KEY_4,
        Digit5 => Key::KEY_5,
        Digit6 => Key::KEY_6,
        Digit7 => Key::KEY_7,
        Digit8 => Key::KEY_8,
        Digit9 => Key::KEY_9,
        Digit0 => Key::KEY_0,

        Enter => Key::KEY_ENTER,
        Escape => Key::KEY_ESC,
        Backspace => Key::KEY_BACKSPACE,
        Tab => Key::KEY_TAB,
        Space => Key::KEY_SPACE,
        Minus => Key::KEY_MINUS,
        Equal => Key::KEY_EQUAL,
        BracketLeft => Key::KEY_LEFTBRACE,
        BracketRight => Key::KEY_RIGHTBRACE,
        Backslash => Key::KEY_BACKSLASH,
        Semicolon => Key::KEY_SEMICOLON,
        Quote => Key::KEY_APOSTROPHE,
        Backquote => Key::KEY_GRAVE,
        Comma => Key::KEY_COMMA,
        Period => Key::KEY_DOT,
        Slash => Key::KEY_SLASH,

        CapsLock => Key::KEY_CAPSLOCK,

        F1 => Key::KEY_F1,
        F2 => Key::KEY_F2,
        F3 => Key::KEY_F3,
        F4 => Key::KEY_F4,
        F5 => Key::KEY_F5,
        F6 => Key::KEY_F6,
        F7 => Key::KEY_F7,
        F8 => Key::KEY_F8,
        F9 => Key::KEY_F9,
        F10 => Key::KEY_F10,
        F11 => Key::KEY_F11,
        F12 => Key::KEY_F12,

        PrintScreen => Key::KEY_SYSRQ,
        ScrollLock => Key::KEY_SCROLLLOCK,
        Pause => Key::KEY_PAUSE,
        Insert => Key::KEY_INSERT,
        Home => Key::KEY_HOME,
        PageUp => Key::KEY_PAGEUP,
        Delete => Key::KEY_DELETE,
        End => Key::KEY_END,
        PageDown => Key::KEY_PAGEDOWN,
        ArrowRight => Key::KEY_RIGHT,
        ArrowLeft => Key::KEY_LEFT,
        ArrowDown => Key::KEY_DOWN,
        ArrowUp => Key::KEY_UP,

        NumLock => Key::KEY_NUMLOCK,
        NumpadDivide => Key::KEY_KPSLASH,
        NumpadMultiply => Key::KEY_KPASTERISK,
        NumpadSubtract => Key::KEY_KPMINUS,
        NumpadAdd => Key::KEY_KPPLUS,
        NumpadEnter => Key::KEY_KPENTER,
        Numpad1 => Key::KEY_KP1,
        Numpad2 => Key::KEY_KP2,
        Numpad3 => Key::KEY_KP3,
        Numpad4 => Key::KEY_KP4,
        Numpad5 => Key::KEY_KP5,
        Numpad6 => Key::KEY_KP6,
        Numpad7 => Key::KEY_KP7,
        Numpad8 => Key::KEY_KP8,
        Numpad9 => Key::KEY_KP9,
        Numpad0 => Key::KEY_KP0,
        NumpadDecimal => Key::KEY_KPDOT,

        ContextMenu => Key::KEY_COMPOSE,

        ControlLeft => Key::KEY_LEFTCTRL,
        ShiftLeft => Key::KEY_LEFTSHIFT,
        AltLeft => Key::KEY_LEFTALT,
        MetaLeft => Key::KEY_LEFTMETA,
        ControlRight => Key::KEY_RIGHTCTRL,
        ShiftRight => Key::KEY_RIGHTSHIFT,
        AltRight => Key::KEY_RIGHTALT,
        MetaRight => Key::KEY_RIGHTMETA,

        Unknown => return None,
    })
}

/// Returns every evdev key this table can produce, for declaring uinput
/// device capabilities (`EV_KEY`).
pub fn all_evdev_keys() -> Vec<Key> {
    // 0x04..=0xE7 covers the full span of assigned HidKeyCode values; gaps
    // (e.g. 0x32, 0x64) are skipped automatically because from_u16 maps
    // them to Unknown, which hid_to_evdev_key rejects.
    (0x04u16..=0xE7)
        .filter_map(|raw| hid_to_evdev_key(HidKeyCode::from_u16(raw)))
        .collect()
}
