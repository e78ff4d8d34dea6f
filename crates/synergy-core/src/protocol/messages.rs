//! Synergy/Barrier wire message types.
//!
//! Every message on the wire is `u32 length || opcode:[u8;4] || payload`,
//! except the greeting, which replaces the 4-byte opcode with the literal
//! 7-byte ASCII preamble `"Synergy"`. See [`super::codec`] for the framing
//! and per-opcode pack/unpack logic; this module only defines the shapes.

/// Protocol major/minor version this client advertises in `HelloBack`.
pub const PROTOCOL_MAJOR: u16 = 1;
pub const PROTOCOL_MINOR: u16 = 6;

/// Four-byte ASCII opcode, as it appears on the wire after the length prefix.
pub type Opcode = [u8; 4];

/// Mouse button identifiers, per the Synergy/Deskflow wire numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    Side,
    Extra,
}

impl MouseButton {
    pub fn from_wire(button: i8) -> Option<Self> {
        match button {
            1 => Some(MouseButton::Left),
            2 => Some(MouseButton::Middle),
            3 => Some(MouseButton::Right),
            4 => Some(MouseButton::Side),
            5 => Some(MouseButton::Extra),
            _ => None,
        }
    }
}

/// A screen descriptor, as sent in the `DINF` reply.
///
/// `warp_size`, `mouse_x`, and `mouse_y` are part of the wire shape but this
/// client never uses screen-edge warping, so it always sends zero for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenDescriptor {
    pub width: u16,
    pub height: u16,
    pub warp_size: u16,
    pub mouse_x: i16,
    pub mouse_y: i16,
}

impl ScreenDescriptor {
    pub fn new(width: u16, height: u16) -> Self {
        ScreenDescriptor {
            width,
            height,
            warp_size: 0,
            mouse_x: 0,
            mouse_y: 0,
        }
    }
}

/// A decoded Synergy message, irrespective of direction.
#[derive(Debug, Clone, PartialEq)]
pub enum SynergyMessage {
    /// Server greeting: literal `"Synergy"` preamble + major/minor version.
    Hello { major: u16, minor: u16 },
    /// Client reply to [`SynergyMessage::Hello`].
    HelloBack {
        major: u16,
        minor: u16,
        client_name: String,
    },
    /// `QINF`: server requests the screen descriptor.
    QueryInfo,
    /// `DINF`: client's screen descriptor reply.
    DeviceInfo(ScreenDescriptor),
    /// `CIAK`: server acknowledges `DINF`.
    InfoAck,
    /// `CALV`: heartbeat, both directions.
    KeepAlive,
    /// `CNOP`: no-op.
    NoOp,
    /// `CINN`: cursor entered this screen.
    CursorEnter {
        x: i16,
        y: i16,
        seq: u32,
        mask: u16,
    },
    /// `COUT`: cursor left this screen.
    CursorLeave,
    /// `CROP`: reset options.
    ResetOptions,
    /// `DMMV`: absolute mouse move.
    MouseMoveAbs { x: i16, y: i16 },
    /// `DMRM`: relative mouse move.
    MouseMoveRel { dx: i16, dy: i16 },
    /// `DMDN`: mouse button down.
    MouseDown { button: i8 },
    /// `DMUP`: mouse button up.
    MouseUp { button: i8 },
    /// `DMWM`: mouse wheel.
    MouseWheel { x: i16, y: i16 },
    /// `DKDN`: key down.
    KeyDown { id: u16, mask: u16, button: u16 },
    /// `DKRP`: key repeat.
    KeyRepeat {
        id: u16,
        mask: u16,
        count: u16,
        button: u16,
    },
    /// `DKUP`: key up.
    KeyUp { id: u16, mask: u16, button: u16 },
    /// `DSOP`: set options. Accepted and stored, never interpreted.
    SetOptions { opts: Vec<u32> },
    /// Clipboard / file-transfer opcodes (`DCLP`, `CCLP`, and similar):
    /// accepted, payload discarded.
    ClipboardData { opcode: Opcode },
    /// A protocol-level error opcode (`EBAD`, `EBSY`, `EUNK`): fatal.
    ProtocolErrorNotice { opcode: Opcode },
    /// Any opcode this client does not recognize. Never fatal at decode time.
    Opaque { opcode: Opcode, payload: Vec<u8> },
}
