//! The Synergy/Barrier wire protocol: message shapes, framing, and the
//! length-delimited stream parser.

pub mod codec;
pub mod messages;
pub mod stream;

pub use codec::{decode_greeting, decode_message, encode_hello_back, encode_message, ProtocolError, MAX_MSG};
pub use messages::*;
pub use stream::StreamParser;
