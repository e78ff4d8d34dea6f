//! Virtual-key (VK) pivot to USB HID Usage ID translation table.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h) and USB HID Usage Tables 1.3.
//! VK codes range from 0x00 to 0xFF.
//!
//! # Why Windows VK numbering as the neutral "virtual key" pivot?
//!
//! The key-code pipeline needs a platform-neutral logical key namespace
//! between the Synergy wire ID and the HID usage table. Windows VK codes are
//! a convenient choice for that pivot: they are a total, stably published
//! numbering (`VK_RETURN = 0x0D`, `VK_SPACE = 0x20`, ...) of logical keys
//! that already has a well-known HID mapping on both sides, independent of
//! whether this binary ever runs on Windows.
//!
//! # How this table works
//!
//! `VK_TO_HID_TABLE` is a compile-time constant array of 256 [`HidKeyCode`]
//! values, indexed by VK code.  Position 0x41 holds `HidKeyCode::KeyA` because
//! VK_A is 0x41.  Any VK code without a HID equivalent stores
//! `HidKeyCode::Unknown`.
//!
//! Indexing into this array is an O(1) lookup — the fastest possible operation.
//! This is important because every translated key event goes through this table.

use super::hid::HidKeyCode;

/// Translates a Windows Virtual Key code to a HID Usage ID.
///
/// Returns [`HidKeyCode::Unknown`] for VK codes that have no keyboard HID equivalent
/// (e.g., mouse button VKs, browser keys without HID mappings).
///
/// # Panics
///
/// This function never panics; all u8 inputs are handled.
pub fn vk_to_hid(vk: u8) -> HidKeyCode {
    VK_TO_HID_TABLE[vk as usize]
}

/// Translates a HID Usage ID back to a Windows Virtual Key code.
///
/// Returns `None` for HID codes with no VK equivalent.
pub fn hid_to_vk(hid: HidKeyCode) -> Option<u8> {
    // Linear scan is acceptable for the infrequent HID->VK direction.
    // The table is 256 entries, so worst-case is 256 comparisons.
    for (vk, &mapped_hid) in VK_TO_HID_TABLE.iter().enumerate() {
        if mapped_hid == hid && hid != HidKeyCode::Unknown {
            return Some(vk as u8);
        }
    }
    None
}

/// Complete VK → HID mapping table indexed by VK code (0x00–0xFF).
///
/// Entries are `HidKeyCode::Unknown` when no keyboard HID equivalent exists.
/// Reference: https://learn.microsoft.com/windows/win32/inputdev/virtual-key-codes
const VK_TO_HID_TABLE: [HidKeyCode; 256] = {
    use HidKeyCode::*;
    let mut t = [Unknown; 256];

    // ── Alphabet keys (VK_A=0x41 … VK_Z=0x5A) ────────────────────────────────
    t[0x41] = KeyA;
    t[0x42] = KeyB;
    t[0x43] = KeyC;
    t[0x44] = KeyD;
    t[0x45] = KeyE;
    t[0x46] = KeyF;
    t[0x47] = KeyG;
    t[0x48] = KeyH;
    t[0x49] = KeyI;
    t[0x4A] = KeyJ;
    t[0x4B] = KeyK;
    t[0x4C] = KeyL;
    t[0x4D] = KeyM;
    t[0x4E] = KeyN;
    t[0x4F] = KeyO;
    t[0x50] = KeyP;
    t[0x51] = KeyQ;
    t[0x52] = KeyR;
    t[0x53] = KeyS;
    t[0x54] = KeyT;
    t[0x55] = KeyU;
    t[0x56] = KeyV;
    t[0x57] = KeyW;
    t[0x58] = KeyX;
    t[0x59] = KeyY;
    t[0x5A] = KeyZ;

    // ── Digit row (VK_0=0x30 … VK_9=0x39) ───────────────────────────────────
    t[0x30] = Digit0;
    t[0x31] = Digit1;
    t[0x32] = Digit2;
    t[0x33] = Digit3;
    t[0x34] = Digit4;
    t[0x35] = Digit5;
    t[0x36] = Digit6;
    t[0x37] = Digit7;
    t[0x38] = Digit8;
    t[0x39] = Digit9;

    // ── Control keys ─────────────────────────────────────────────────────────
    t[0x0D] = Enter;        // VK_RETURN
    t[0x1B] = Escape;       // VK_ESCAPE
    t[0x08] = Backspace;    // VK_BACK
    t[0x09] = Tab;          // VK_TAB
    t[0x20] = Space;        // VK_SPACE
    t[0x14] = CapsLock;     // VK_CAPITAL
    t[0x91] = ScrollLock;   // VK_SCROLL
    t[0x13] = Pause;        // VK_PAUSE
    t[0x2D] = Insert;       // VK_INSERT
    t[0x24] = Home;         // VK_HOME
    t[0x21] = PageUp;       // VK_PRIOR
    t[0x2E] = Delete;       // VK_DELETE
    t[0x23] = End;          // VK_END
    t[0x22] = PageDown;     // VK_NEXT
    t[0x2C] = PrintScreen;  // VK_SNAPSHOT
    t[0x5D] = ContextMenu;  // VK_APPS

    // ── Arrow keys ────────────────────────────────────────────────────────────
    t[0x25] = ArrowLeft;
    t[0x26] = ArrowUp;
    t[0x27] = ArrowRight;
    t[0x28] = ArrowDown;

    // ── Function keys (VK_F1=0x70 … VK_F12=0x7B) ─────────────────────────────
    t[0x70] = F1;
    t[0x71] = F2;
    t[0x72] = F3;
    t[0x73] = F4;
    t[0x74] = F5;
    t[0x75] = F6;
    t[0x76] = F7;
    t[0x77] = F8;
    t[0x78] = F9;
    t[0x79] = F10;
    t[0x7A] = F11;
    t[0x7B] = F12;

    // ── Numpad (VK_NUMPAD0=0x60 … VK_NUMPAD9=0x69) ───────────────────────────
    t[0x60] = Numpad0;
    t[0x61] = Numpad1;
    t[0x62] = Numpad2;
    t[0x63] = Numpad3;
    t[0x64] = Numpad4;
    t[0x65] = Numpad5;
    t[0x66] = Numpad6;
    t[0x67] = Numpad7;
    t[0x68] = Numpad8;
    t[0x69] = Numpad9;
    t[0x6A] = NumpadMultiply;   // VK_MULTIPLY
    t[0x6B] = NumpadAdd;        // VK_ADD
    t[0x6D] = NumpadSubtract;   // VK_SUBTRACT
    t[0x6E] = NumpadDecimal;    // VK_DECIMAL
    t[0x6F] = NumpadDivide;     // VK_DIVIDE
    t[0x90] = NumLock;          // VK_NUMLOCK

    // ── Punctuation / symbols ─────────────────────────────────────────────────
    t[0xBD] = Minus;        // VK_OEM_MINUS  (- _)
    t[0xBB] = Equal;        // VK_OEM_PLUS   (= +)
    t[0xDB] = BracketLeft;  // VK_OEM_4      ([ {)
    t[0xDD] = BracketRight; // VK_OEM_6      (] })
    t[0xDC] = Backslash;    // VK_OEM_5      (\ |)
    t[0xBA] = Semicolon;    // VK_OEM_1      (; :)
    t[0xDE] = Quote;        // VK_OEM_7      (' ")
    t[0xC0] = Backquote;    // VK_OEM_3      (` ~)
    t[0xBC] = Comma;        // VK_OEM_COMMA  (, <)
    t[0xBE] = Period;       // VK_OEM_PERIOD (. >)
    t[0xBF] = Slash;        // VK_OEM_2      (/ ?)

    // ── Modifier keys ─────────────────────────────────────────────────────────
    t[0xA2] = ControlLeft;  // VK_LCONTROL
    t[0xA3] = ControlRight; // VK_RCONTROL
    t[0xA0] = ShiftLeft;    // VK_LSHIFT
    t[0xA1] = ShiftRight;   // VK_RSHIFT
    t[0xA4] = AltLeft;      // VK_LMENU
    t[0xA5] = AltRight;     // VK_RMENU
    t[0x5B] = MetaLeft;     // VK_LWIN
    t[0x5C] = MetaRight;    // VK_RWIN

    // ── Numpad Enter (extended) ───────────────────────────────────────────────
    // Note: WH_KEYBOARD_LL delivers VK_RETURN with extended flag for numpad Enter.
    // The infrastructure layer must detect this and use NumpadEnter.
    // For the table, VK_RETURN maps to Enter (non-extended path).

    t
};
