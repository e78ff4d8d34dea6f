//! # synergy-core
//!
//! Shared library containing the Synergy/Barrier wire protocol codec and the
//! key-code translation tables that turn a decoded protocol event into a
//! kernel evdev code.
//!
//! This crate has zero dependencies on sockets, uinput, or configuration
//! loading — those live in `synergy-client`. It is used by the client binary
//! and is free of any OS-specific input-injection code itself.

pub mod keymap;
pub mod protocol;

pub use keymap::{HidKeyCode, KeyCodeTables};
pub use protocol::codec::{decode_greeting, decode_message, encode_hello_back, encode_message, ProtocolError};
pub use protocol::messages::SynergyMessage;
pub use protocol::stream::StreamParser;
