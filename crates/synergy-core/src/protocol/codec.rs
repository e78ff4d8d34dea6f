//! Binary codec for the Synergy/Barrier wire protocol.
//!
//! Wire format for every message after the initial handshake:
//! ```text
//! [length:4][opcode:4][payload:N]
//! ```
//! `length` is big-endian and counts `opcode` + `payload` (not itself). The
//! very first message of a session is special: the server's greeting and the
//! client's reply both replace the 4-byte opcode with the literal 7-byte
//! ASCII string `"Synergy"` (see [`encode_hello_back`] / [`decode_greeting`]).
//! All multi-byte integers are big-endian; strings are `u32` byte count then
//! UTF-8 bytes.

use thiserror::Error;

use crate::protocol::messages::{Opcode, ScreenDescriptor, SynergyMessage};

/// The literal ASCII preamble that opens every greeting frame.
pub const HELLO_PREAMBLE: &[u8; 7] = b"Synergy";

/// Errors that can occur while encoding or decoding a single message.
///
/// Per the failure-classification policy, only [`ProtocolError::FrameTooLarge`],
/// [`ProtocolError::EmptyFrame`], and [`ProtocolError::BadGreeting`] are
/// session-fatal; every other variant here is a recoverable per-message
/// decode error the dispatcher logs and skips.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The payload is shorter than the minimum size for its opcode.
    #[error("malformed payload for {opcode}: {reason}")]
    MalformedPayload { opcode: String, reason: String },

    /// A declared frame length exceeds `MAX_MSG` (128 KiB). Fatal: the
    /// session must close, since the stream can no longer be trusted to be
    /// framed correctly.
    #[error("frame length {len} exceeds maximum message size")]
    FrameTooLarge { len: usize },

    /// A declared frame length of zero: there is no room for even an
    /// opcode, so this can never be a legitimate message. Fatal.
    #[error("frame length of zero has no room for an opcode")]
    EmptyFrame,

    /// The handshake greeting did not start with the `"Synergy"` preamble,
    /// or its payload was too short to hold major/minor. Fatal.
    #[error("malformed handshake greeting: {0}")]
    BadGreeting(String),
}

/// Maximum permitted frame length (opcode + payload), per the stream parser
/// contract.
pub const MAX_MSG: usize = 128 * 1024;

// ── Handshake ─────────────────────────────────────────────────────────────────

/// Decodes the server's opening greeting frame (already stripped of its
/// `u32` length prefix by the stream parser).
///
/// Expects exactly `"Synergy" || major:u16 || minor:u16`.
pub fn decode_greeting(frame: &[u8]) -> Result<(u16, u16), ProtocolError> {
    if frame.len() < HELLO_PREAMBLE.len() + 4 {
        return Err(ProtocolError::BadGreeting(format!(
            "greeting frame too short: {} bytes",
            frame.len()
        )));
    }
    if &frame[..HELLO_PREAMBLE.len()] != HELLO_PREAMBLE {
        return Err(ProtocolError::BadGreeting(
            "missing \"Synergy\" preamble".to_string(),
        ));
    }
    let off = HELLO_PREAMBLE.len();
    let major = u16::from_be_bytes([frame[off], frame[off + 1]]);
    let minor = u16::from_be_bytes([frame[off + 2], frame[off + 3]]);
    Ok((major, minor))
}

/// Encodes the client's `HelloBack` reply, including the `u32` length prefix,
/// ready to write to the socket.
pub fn encode_hello_back(major: u16, minor: u16, client_name: &str) -> Vec<u8> {
    let mut frame = Vec::with_capacity(HELLO_PREAMBLE.len() + 4 + 4 + client_name.len());
    frame.extend_from_slice(HELLO_PREAMBLE);
    frame.extend_from_slice(&major.to_be_bytes());
    frame.extend_from_slice(&minor.to_be_bytes());
    write_length_prefixed_string(&mut frame, client_name);
    with_length_prefix(frame)
}

// ── Post-handshake messages ───────────────────────────────────────────────────

/// Decodes one message from an opcode + payload frame (already stripped of
/// its length prefix by the stream parser).
///
/// Unrecognized opcodes decode as [`SynergyMessage::Opaque`] rather than
/// erroring — the dispatcher is expected to log and ignore them.
pub fn decode_message(frame: &[u8]) -> Result<SynergyMessage, ProtocolError> {
    if frame.len() < 4 {
        return Err(ProtocolError::MalformedPayload {
            opcode: "????".to_string(),
            reason: format!("frame of {} bytes has no room for an opcode", frame.len()),
        });
    }
    let opcode: Opcode = [frame[0], frame[1], frame[2], frame[3]];
    let payload = &frame[4..];
    decode_payload(opcode, payload)
}

/// Encodes a message to full wire bytes, including the `u32` length prefix.
///
/// Not every [`SynergyMessage`] variant has a sender-side encoding — this
/// client only ever transmits `DeviceInfo` (`DINF`) and `KeepAlive` (`CALV`)
/// replies after the handshake; encoding any other variant is a programmer
/// error caught by the exhaustive `match` below.
pub fn encode_message(msg: &SynergyMessage) -> Vec<u8> {
    let mut frame = Vec::new();
    match msg {
        SynergyMessage::DeviceInfo(d) => {
            frame.extend_from_slice(b"DINF");
            encode_screen_descriptor(&mut frame, d);
        }
        SynergyMessage::KeepAlive => frame.extend_from_slice(b"CALV"),
        other => panic!("no sender-side encoding for {other:?}"),
    }
    with_length_prefix(frame)
}

fn decode_payload(opcode: Opcode, p: &[u8]) -> Result<SynergyMessage, ProtocolError> {
    match &opcode {
        b"QINF" => Ok(SynergyMessage::QueryInfo),
        b"DINF" => decode_screen_descriptor(p).map(SynergyMessage::DeviceInfo),
        b"CIAK" => Ok(SynergyMessage::InfoAck),
        b"CALV" => Ok(SynergyMessage::KeepAlive),
        b"CNOP" => Ok(SynergyMessage::NoOp),
        b"CINN" => decode_cursor_enter(p),
        b"COUT" => Ok(SynergyMessage::CursorLeave),
        b"CROP" => Ok(SynergyMessage::ResetOptions),
        b"DMMV" => decode_xy(p, "DMMV").map(|(x, y)| SynergyMessage::MouseMoveAbs { x, y }),
        b"DMRM" => decode_xy(p, "DMRM").map(|(dx, dy)| SynergyMessage::MouseMoveRel { dx, dy }),
        b"DMDN" => decode_button(p, "DMDN").map(|button| SynergyMessage::MouseDown { button }),
        b"DMUP" => decode_button(p, "DMUP").map(|button| SynergyMessage::MouseUp { button }),
        b"DMWM" => decode_xy(p, "DMWM").map(|(x, y)| SynergyMessage::MouseWheel { x, y }),
        b"DKDN" => decode_key_id_mask_button(p, "DKDN")
            .map(|(id, mask, button)| SynergyMessage::KeyDown { id, mask, button }),
        b"DKUP" => decode_key_id_mask_button(p, "DKUP")
            .map(|(id, mask, button)| SynergyMessage::KeyUp { id, mask, button }),
        b"DKRP" => decode_key_repeat(p),
        b"DSOP" => decode_set_options(p),
        b"DCLP" | b"CCLP" => Ok(SynergyMessage::ClipboardData { opcode }),
        b"EBAD" | b"EBSY" | b"EUNK" => Ok(SynergyMessage::ProtocolErrorNotice { opcode }),
        _ => Ok(SynergyMessage::Opaque {
            opcode,
            payload: p.to_vec(),
        }),
    }
}

fn encode_screen_descriptor(buf: &mut Vec<u8>, d: &ScreenDescriptor) {
    buf.extend_from_slice(&d.width.to_be_bytes());
    buf.extend_from_slice(&d.height.to_be_bytes());
    buf.extend_from_slice(&d.warp_size.to_be_bytes());
    buf.extend_from_slice(&d.mouse_x.to_be_bytes());
    buf.extend_from_slice(&d.mouse_y.to_be_bytes());
}

fn decode_screen_descriptor(p: &[u8]) -> Result<ScreenDescriptor, ProtocolError> {
    require_len(p, 10, "DINF")?;
    Ok(ScreenDescriptor {
        width: u16::from_be_bytes([p[0], p[1]]),
        height: u16::from_be_bytes([p[2], p[3]]),
        warp_size: u16::from_be_bytes([p[4], p[5]]),
        mouse_x: i16::from_be_bytes([p[6], p[7]]),
        mouse_y: i16::from_be_bytes([p[8], p[9]]),
    })
}

fn decode_cursor_enter(p: &[u8]) -> Result<SynergyMessage, ProtocolError> {
    require_len(p, 10, "CINN")?;
    let x = i16::from_be_bytes([p[0], p[1]]);
    let y = i16::from_be_bytes([p[2], p[3]]);
    let seq = u32::from_be_bytes([p[4], p[5], p[6], p[7]]);
    let mask = u16::from_be_bytes([p[8], p[9]]);
    Ok(SynergyMessage::CursorEnter { x, y, seq, mask })
}

fn decode_xy(p: &[u8], opcode: &str) -> Result<(i16, i16), ProtocolError> {
    require_len(p, 4, opcode)?;
    Ok((
        i16::from_be_bytes([p[0], p[1]]),
        i16::from_be_bytes([p[2], p[3]]),
    ))
}

fn decode_button(p: &[u8], opcode: &str) -> Result<i8, ProtocolError> {
    require_len(p, 1, opcode)?;
    Ok(p[0] as i8)
}

fn decode_key_id_mask_button(p: &[u8], opcode: &str) -> Result<(u16, u16, u16), ProtocolError> {
    require_len(p, 6, opcode)?;
    Ok((
        u16::from_be_bytes([p[0], p[1]]),
        u16::from_be_bytes([p[2], p[3]]),
        u16::from_be_bytes([p[4], p[5]]),
    ))
}

fn decode_key_repeat(p: &[u8]) -> Result<SynergyMessage, ProtocolError> {
    require_len(p, 8, "DKRP")?;
    let id = u16::from_be_bytes([p[0], p[1]]);
    let mask = u16::from_be_bytes([p[2], p[3]]);
    let count = u16::from_be_bytes([p[4], p[5]]);
    let button = u16::from_be_bytes([p[6], p[7]]);
    Ok(SynergyMessage::KeyRepeat {
        id,
        mask,
        count,
        button,
    })
}

fn decode_set_options(p: &[u8]) -> Result<SynergyMessage, ProtocolError> {
    if p.len() % 4 != 0 {
        return Err(ProtocolError::MalformedPayload {
            opcode: "DSOP".to_string(),
            reason: format!("payload length {} is not a multiple of 4", p.len()),
        });
    }
    let opts = p
        .chunks_exact(4)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    Ok(SynergyMessage::SetOptions { opts })
}

// ── Utility helpers ───────────────────────────────────────────────────────────

fn require_len(buf: &[u8], needed: usize, opcode: &str) -> Result<(), ProtocolError> {
    if buf.len() < needed {
        Err(ProtocolError::MalformedPayload {
            opcode: opcode.to_string(),
            reason: format!("need {needed} bytes, got {}", buf.len()),
        })
    } else {
        Ok(())
    }
}

fn write_length_prefixed_string(buf: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    buf.extend_from_slice(bytes);
}

fn with_length_prefix(body: Vec<u8>) -> Vec<u8> {
    let mut framed = Vec::with_capacity(4 + body.len());
    framed.extend_from_slice(&(body.len() as u32).to_be_bytes());
    framed.extend_from_slice(&body);
    framed
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_greeting_happy_path() {
        let mut frame = Vec::new();
        frame.extend_from_slice(b"Synergy");
        frame.extend_from_slice(&1u16.to_be_bytes());
        frame.extend_from_slice(&6u16.to_be_bytes());
        assert_eq!(decode_greeting(&frame), Ok((1, 6)));
    }

    #[test]
    fn test_decode_greeting_missing_preamble_is_fatal() {
        let frame = b"Nope!!!\x00\x01\x00\x06".to_vec();
        assert!(matches!(
            decode_greeting(&frame),
            Err(ProtocolError::BadGreeting(_))
        ));
    }

    #[test]
    fn test_decode_greeting_truncated_is_fatal() {
        let frame = b"Synerg".to_vec();
        assert!(matches!(
            decode_greeting(&frame),
            Err(ProtocolError::BadGreeting(_))
        ));
    }

    #[test]
    fn test_encode_hello_back_round_trips_through_length_prefix() {
        let framed = encode_hello_back(1, 6, "my-laptop");
        let len = u32::from_be_bytes(framed[0..4].try_into().unwrap()) as usize;
        assert_eq!(len, framed.len() - 4);
        let (major, minor) = decode_greeting(&framed[4..]).unwrap();
        assert_eq!((major, minor), (1, 6));
    }

    #[test]
    fn test_qinf_decodes_with_empty_payload() {
        let frame = b"QINF".to_vec();
        assert_eq!(decode_message(&frame), Ok(SynergyMessage::QueryInfo));
    }

    #[test]
    fn test_dinf_round_trip() {
        let msg = SynergyMessage::DeviceInfo(ScreenDescriptor::new(1920, 1080));
        let framed = encode_message(&msg);
        let len = u32::from_be_bytes(framed[0..4].try_into().unwrap()) as usize;
        assert_eq!(len, framed.len() - 4);
        let decoded = decode_message(&framed[4..]).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_calv_round_trip() {
        let framed = encode_message(&SynergyMessage::KeepAlive);
        let decoded = decode_message(&framed[4..]).unwrap();
        assert_eq!(decoded, SynergyMessage::KeepAlive);
    }

    #[test]
    fn test_dmmv_decodes_coordinates() {
        let mut frame = b"DMMV".to_vec();
        frame.extend_from_slice(&100i16.to_be_bytes());
        frame.extend_from_slice(&(-200i16).to_be_bytes());
        let decoded = decode_message(&frame).unwrap();
        assert_eq!(decoded, SynergyMessage::MouseMoveAbs { x: 100, y: -200 });
    }

    #[test]
    fn test_dkdn_decodes_id_mask_button() {
        let mut frame = b"DKDN".to_vec();
        frame.extend_from_slice(&0x0061u16.to_be_bytes());
        frame.extend_from_slice(&0u16.to_be_bytes());
        frame.extend_from_slice(&0u16.to_be_bytes());
        let decoded = decode_message(&frame).unwrap();
        assert_eq!(
            decoded,
            SynergyMessage::KeyDown {
                id: 0x0061,
                mask: 0,
                button: 0
            }
        );
    }

    #[test]
    fn test_dkrp_decodes_repeat_count() {
        let mut frame = b"DKRP".to_vec();
        frame.extend_from_slice(&0x0061u16.to_be_bytes());
        frame.extend_from_slice(&0u16.to_be_bytes());
        frame.extend_from_slice(&3u16.to_be_bytes());
        frame.extend_from_slice(&0u16.to_be_bytes());
        let decoded = decode_message(&frame).unwrap();
        assert_eq!(
            decoded,
            SynergyMessage::KeyRepeat {
                id: 0x0061,
                mask: 0,
                count: 3,
                button: 0
            }
        );
    }

    #[test]
    fn test_unknown_opcode_decodes_as_opaque_not_error() {
        let mut frame = b"ZZZZ".to_vec();
        frame.extend_from_slice(&[1, 2, 3]);
        let decoded = decode_message(&frame).unwrap();
        assert_eq!(
            decoded,
            SynergyMessage::Opaque {
                opcode: *b"ZZZZ",
                payload: vec![1, 2, 3],
            }
        );
    }

    #[test]
    fn test_clipboard_opcodes_are_accepted_and_ignored() {
        let frame = b"DCLPignored-payload".to_vec();
        let decoded = decode_message(&frame).unwrap();
        assert_eq!(
            decoded,
            SynergyMessage::ClipboardData { opcode: *b"DCLP" }
        );
    }

    #[test]
    fn test_error_opcodes_decode_to_protocol_error_notice() {
        let frame = b"EBAD".to_vec();
        let decoded = decode_message(&frame).unwrap();
        assert_eq!(
            decoded,
            SynergyMessage::ProtocolErrorNotice { opcode: *b"EBAD" }
        );
    }

    #[test]
    fn test_dkdn_truncated_payload_is_malformed_not_panic() {
        let frame = b"DKDN\x00".to_vec();
        assert!(matches!(
            decode_message(&frame),
            Err(ProtocolError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn test_dsop_decodes_option_list() {
        let mut frame = b"DSOP".to_vec();
        frame.extend_from_slice(&42u32.to_be_bytes());
        frame.extend_from_slice(&7u32.to_be_bytes());
        let decoded = decode_message(&frame).unwrap();
        assert_eq!(
            decoded,
            SynergyMessage::SetOptions { opts: vec![42, 7] }
        );
    }

    #[test]
    fn test_cinn_decodes_all_fields() {
        let mut frame = b"CINN".to_vec();
        frame.extend_from_slice(&10i16.to_be_bytes());
        frame.extend_from_slice(&20i16.to_be_bytes());
        frame.extend_from_slice(&99u32.to_be_bytes());
        frame.extend_from_slice(&0x03u16.to_be_bytes());
        let decoded = decode_message(&frame).unwrap();
        assert_eq!(
            decoded,
            SynergyMessage::CursorEnter {
                x: 10,
                y: 20,
                seq: 99,
                mask: 0x03
            }
        );
    }
}
