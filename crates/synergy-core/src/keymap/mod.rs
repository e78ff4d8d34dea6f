//! Key code translation tables for the Synergy-to-uinput event pipeline.
//!
//! The canonical intermediate representation is USB HID Usage IDs (page
//! 0x07, Keyboard/Keypad). Synergy wire IDs and Linux kernel evdev codes are
//! both translated to/from HID, with a Windows Virtual-Key pivot in between
//! the wire ID and HID (see [`vk`] for why).

pub mod evdev_codes;
pub mod hid;
pub mod synergy_ids;
pub mod tables;
pub mod vk;

pub use hid::HidKeyCode;
pub use tables::KeyCodeTables;
