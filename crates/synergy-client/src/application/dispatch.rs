//! `Dispatcher`: turns decoded [`SynergyMessage`]s into [`VirtualDevice`]
//! calls.
//!
//! This use case sits at the application layer and delegates to a
//! [`VirtualDevice`] trait object for OS-level event injection and to a
//! [`CursorContext`] trait object for cursor-position reconciliation in
//! relative mode — the same "use-case struct holding an injected capability
//! + stateful filter, one `handle_*` per message kind" shape used throughout
//! this workspace's other use cases.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use evdev::Key;
use synergy_core::protocol::messages::ScreenDescriptor;
use synergy_core::protocol::SynergyMessage;
use synergy_core::KeyCodeTables;
use tracing::{debug, trace, warn};

use super::cursor::{CursorContext, CursorPosition};
use super::virtual_device::{DeviceError, VirtualDevice};

/// What, if anything, the dispatcher wants sent back to the server in reply
/// to the message it just processed.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Nothing to send.
    None,
    /// Send this message back on the control channel.
    Reply(SynergyMessage),
}

/// A buffered mouse-move target awaiting the throttle window to open.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PendingMove {
    Abs { x: i32, y: i32 },
    Rel { dx: i32, dy: i32 },
}

/// Stateful use case that maps every Synergy opcode to [`VirtualDevice`]
/// calls. Owns the cursor mode, move throttle, sync counter, and the record
/// of which kernel code each currently-held Synergy key ID actually presses
/// (so a `DKUP` releases what was really pressed, not a fresh re-translation
/// of a possibly-changed mask).
pub struct Dispatcher<D, C> {
    device: D,
    cursor: C,
    screen: ScreenDescriptor,
    screen_reported: bool,
    absolute_mode: bool,
    move_threshold: Duration,
    pos_sync_freq: u32,
    sync_counter: u32,
    last_reported: Option<(i32, i32)>,
    last_move_emit: Instant,
    pending_move: Option<PendingMove>,
    pressed_keys: HashMap<u16, Key>,
    pressed_buttons: HashMap<i8, Key>,
}

impl<D: VirtualDevice, C: CursorContext> Dispatcher<D, C> {
    /// Builds a dispatcher around an already-constructed device and cursor
    /// probe. `screen` is the descriptor this client will reply with on
    /// `QINF`, built once from configuration per the data model.
    pub fn new(
        device: D,
        cursor: C,
        screen: ScreenDescriptor,
        absolute_mode: bool,
        move_threshold: Duration,
        pos_sync_freq: u32,
    ) -> Self {
        Dispatcher {
            device,
            cursor,
            screen,
            screen_reported: false,
            absolute_mode,
            move_threshold,
            pos_sync_freq: pos_sync_freq.max(1),
            sync_counter: 0,
            last_reported: None,
            last_move_emit: Instant::now(),
            pending_move: None,
            pressed_keys: HashMap::new(),
            pressed_buttons: HashMap::new(),
        }
    }

    /// Borrows the underlying device, mainly so callers (and tests) can
    /// inspect recorded calls on a mock.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Flushes any buffered move and releases every held key/button.
    /// Called by the Session on orderly shutdown (`Draining`) so a
    /// disconnect never leaves a stuck key behind.
    pub fn shutdown(&mut self) -> Result<(), DeviceError> {
        self.flush_pending_move()?;
        self.device.reset()
    }

    /// Dispatches one decoded message, returning whatever reply (if any)
    /// the caller should send back on the control channel.
    ///
    /// # Errors
    ///
    /// Propagates [`DeviceError`] from the underlying `VirtualDevice`. Per
    /// the failure-classification policy, uinput write errors are fatal to
    /// the session — the caller must terminate rather than keep
    /// dispatching, since a dropped event could desynchronize the
    /// held-keys set.
    pub fn dispatch(&mut self, msg: SynergyMessage) -> Result<DispatchOutcome, DeviceError> {
        if !matches!(msg, SynergyMessage::MouseMoveAbs { .. } | SynergyMessage::MouseMoveRel { .. }) {
            self.flush_pending_move()?;
        }

        match msg {
            SynergyMessage::Hello { .. } | SynergyMessage::HelloBack { .. } => {
                // Handled by the Session's handshake state machine before a
                // message ever reaches the dispatcher.
                Ok(DispatchOutcome::None)
            }
            SynergyMessage::QueryInfo => {
                self.screen_reported = true;
                Ok(DispatchOutcome::Reply(SynergyMessage::DeviceInfo(self.screen)))
            }
            SynergyMessage::DeviceInfo(_) => Ok(DispatchOutcome::None),
            SynergyMessage::InfoAck => Ok(DispatchOutcome::None),
            SynergyMessage::KeepAlive => Ok(DispatchOutcome::Reply(SynergyMessage::KeepAlive)),
            SynergyMessage::NoOp => Ok(DispatchOutcome::None),
            SynergyMessage::CursorEnter { .. } => Ok(DispatchOutcome::None),
            SynergyMessage::CursorLeave => {
                self.device.reset()?;
                Ok(DispatchOutcome::None)
            }
            SynergyMessage::ResetOptions => Ok(DispatchOutcome::None),
            SynergyMessage::MouseMoveAbs { x, y } => {
                self.handle_mouse_move(x, y)?;
                Ok(DispatchOutcome::None)
            }
            SynergyMessage::MouseMoveRel { dx, dy } => {
                // Bypasses the throttle entirely.
                self.device.move_rel(dx as i32, dy as i32)?;
                Ok(DispatchOutcome::None)
            }
            SynergyMessage::MouseDown { button } => {
                self.handle_mouse_button(button, true)?;
                Ok(DispatchOutcome::None)
            }
            SynergyMessage::MouseUp { button } => {
                self.handle_mouse_button(button, false)?;
                Ok(DispatchOutcome::None)
            }
            SynergyMessage::MouseWheel { x, y } => {
                self.device.wheel(x as i32, y as i32)?;
                Ok(DispatchOutcome::None)
            }
            SynergyMessage::KeyDown { id, mask, .. } => {
                self.handle_key_down(id, mask)?;
                Ok(DispatchOutcome::None)
            }
            SynergyMessage::KeyUp { id, .. } => {
                self.handle_key_up(id)?;
                Ok(DispatchOutcome::None)
            }
            SynergyMessage::KeyRepeat { id, mask, .. } => {
                self.handle_key_repeat(id, mask)?;
                Ok(DispatchOutcome::None)
            }
            SynergyMessage::SetOptions { opts } => {
                debug!(count = opts.len(), "DSOP options accepted and stored");
                Ok(DispatchOutcome::None)
            }
            SynergyMessage::ClipboardData { opcode } => {
                trace!(?opcode, "clipboard/file-transfer opcode ignored");
                Ok(DispatchOutcome::None)
            }
            SynergyMessage::ProtocolErrorNotice { .. } => {
                // Session-fatal; the Session's read loop intercepts these
                // before they reach the dispatcher in normal operation.
                Ok(DispatchOutcome::None)
            }
            SynergyMessage::Opaque { opcode, .. } => {
                trace!(?opcode, "opaque message ignored");
                Ok(DispatchOutcome::None)
            }
        }
    }

    fn handle_mouse_move(&mut self, x: i16, y: i16) -> Result<(), DeviceError> {
        if !self.screen_reported {
            debug!("DMMV dropped: screen descriptor not yet sent");
            return Ok(());
        }
        let (cx, cy) = clamp_to_screen(x, y, self.screen.width, self.screen.height);

        let target = if self.absolute_mode {
            let (ax, ay) = rescale_to_u16_range(cx, cy, self.screen.width, self.screen.height);
            PendingMove::Abs { x: ax as i32, y: ay as i32 }
        } else {
            let anchor = self.relative_anchor(cx, cy);
            self.sync_counter = self.sync_counter.wrapping_add(1);
            self.last_reported = Some((cx, cy));
            PendingMove::Rel {
                dx: cx - anchor.0,
                dy: cy - anchor.1,
            }
        };

        self.buffer_move(target)
    }

    /// Resolves the relative-mode anchor position per the sync-frequency
    /// policy: refresh from the cursor probe every `pos_sync_freq` moves
    /// (and always on the very first move), otherwise reuse the last
    /// reported position.
    fn relative_anchor(&self, cx: i32, cy: i32) -> (i32, i32) {
        let should_refresh = self.sync_counter == 0 || self.sync_counter % self.pos_sync_freq == 0;
        if should_refresh {
            if let CursorPosition::Known { x, y } = self.cursor.current() {
                return (x, y);
            }
        }
        self.last_reported.unwrap_or((cx, cy))
    }

    fn buffer_move(&mut self, target: PendingMove) -> Result<(), DeviceError> {
        let now = Instant::now();
        if now.duration_since(self.last_move_emit) >= self.move_threshold {
            self.emit_move(target)?;
            self.last_move_emit = now;
            self.pending_move = None;
        } else {
            self.pending_move = Some(target);
        }
        Ok(())
    }

    fn flush_pending_move(&mut self) -> Result<(), DeviceError> {
        if let Some(target) = self.pending_move.take() {
            self.emit_move(target)?;
            self.last_move_emit = Instant::now();
        }
        Ok(())
    }

    fn emit_move(&mut self, target: PendingMove) -> Result<(), DeviceError> {
        match target {
            PendingMove::Abs { x, y } => self.device.move_abs(x, y),
            PendingMove::Rel { dx, dy } => self.device.move_rel(dx, dy),
        }
    }

    fn handle_mouse_button(&mut self, button: i8, pressed: bool) -> Result<(), DeviceError> {
        if pressed {
            let Some(code) = KeyCodeTables::mouse_button_to_event(button as u8) else {
                debug!(button, "unmapped mouse button, dropping");
                return Ok(());
            };
            self.device.press(code)?;
            self.pressed_buttons.insert(button, code);
        } else if let Some(code) = self.pressed_buttons.remove(&button) {
            self.device.release(code)?;
        }
        // else: release of an unheld button is tolerated, no-op.
        Ok(())
    }

    fn handle_key_down(&mut self, id: u16, mask: u16) -> Result<(), DeviceError> {
        let Some(code) = KeyCodeTables::synergy_to_event(id, mask) else {
            debug!(id, mask, "unmapped key id, dropping DKDN");
            return Ok(());
        };
        self.device.press(code)?;
        self.pressed_keys.insert(id, code);
        Ok(())
    }

    fn handle_key_up(&mut self, id: u16) -> Result<(), DeviceError> {
        if let Some(code) = self.pressed_keys.remove(&id) {
            self.device.release(code)?;
        }
        // else: release of an unheld (or never-mapped) key is tolerated.
        Ok(())
    }

    fn handle_key_repeat(&mut self, id: u16, mask: u16) -> Result<(), DeviceError> {
        let Some(code) = KeyCodeTables::synergy_to_event(id, mask) else {
            debug!(id, mask, "unmapped key id, dropping DKRP");
            return Ok(());
        };
        if let Some(held) = self.pressed_keys.remove(&id) {
            self.device.release(held)?;
        }
        self.device.press(code)?;
        self.pressed_keys.insert(id, code);
        Ok(())
    }
}

/// Clamps out-of-bounds coordinates to `[0, w-1] x [0, h-1]`.
fn clamp_to_screen(x: i16, y: i16, width: u16, height: u16) -> (i32, i32) {
    let max_x = width.saturating_sub(1) as i32;
    let max_y = height.saturating_sub(1) as i32;
    ((x as i32).clamp(0, max_x), (y as i32).clamp(0, max_y))
}

/// Rescales already-clamped screen-local coordinates into the `0..=65535`
/// absolute pointer range the uinput device declares for `ABS_X`/`ABS_Y`.
fn rescale_to_u16_range(x: i32, y: i32, width: u16, height: u16) -> (u16, u16) {
    let scale = |v: i32, max: u16| -> u16 {
        let denom = (max.saturating_sub(1)).max(1) as u64;
        ((v as u64 * 65535) / denom).min(65535) as u16
    };
    (scale(x, width), scale(y, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[derive(Default)]
    struct MockDevice {
        presses: Vec<Key>,
        releases: Vec<Key>,
        rel_moves: Vec<(i32, i32)>,
        abs_moves: Vec<(i32, i32)>,
        wheels: Vec<(i32, i32)>,
        held: Vec<Key>,
        resets: u32,
        abs_supported: bool,
    }

    impl VirtualDevice for MockDevice {
        fn press(&mut self, code: Key) -> Result<(), DeviceError> {
            if !self.held.contains(&code) {
                self.held.push(code);
            }
            self.presses.push(code);
            Ok(())
        }
        fn release(&mut self, code: Key) -> Result<(), DeviceError> {
            self.held.retain(|c| *c != code);
            self.releases.push(code);
            Ok(())
        }
        fn move_rel(&mut self, dx: i32, dy: i32) -> Result<(), DeviceError> {
            self.rel_moves.push((dx, dy));
            Ok(())
        }
        fn move_abs(&mut self, x: i32, y: i32) -> Result<(), DeviceError> {
            if !self.abs_supported {
                return Err(DeviceError::Unsupported("move_abs"));
            }
            self.abs_moves.push((x, y));
            Ok(())
        }
        fn wheel(&mut self, dx: i32, dy: i32) -> Result<(), DeviceError> {
            self.wheels.push((dx, dy));
            Ok(())
        }
        fn reset(&mut self) -> Result<(), DeviceError> {
            self.resets += 1;
            self.releases.extend(self.held.drain(..));
            Ok(())
        }
        fn held_keys(&self) -> Vec<Key> {
            self.held.clone()
        }
    }

    struct FixedCursor(CursorPosition);
    impl CursorContext for FixedCursor {
        fn current(&self) -> CursorPosition {
            self.0
        }
    }

    fn make_dispatcher(absolute: bool) -> Dispatcher<MockDevice, FixedCursor> {
        let mut device = MockDevice::default();
        device.abs_supported = true;
        Dispatcher::new(
            device,
            FixedCursor(CursorPosition::Unknown),
            ScreenDescriptor::new(1920, 1080),
            absolute,
            Duration::from_millis(8),
            16,
        )
    }

    #[test]
    fn test_qinf_replies_with_configured_screen_descriptor() {
        let mut d = make_dispatcher(false);
        let out = d.dispatch(SynergyMessage::QueryInfo).unwrap();
        assert_eq!(
            out,
            DispatchOutcome::Reply(SynergyMessage::DeviceInfo(ScreenDescriptor::new(1920, 1080)))
        );
    }

    #[test]
    fn test_calv_replies_with_calv() {
        let mut d = make_dispatcher(false);
        let out = d.dispatch(SynergyMessage::KeepAlive).unwrap();
        assert_eq!(out, DispatchOutcome::Reply(SynergyMessage::KeepAlive));
    }

    #[test]
    fn test_dmmv_dropped_before_screen_reported() {
        let mut d = make_dispatcher(false);
        d.dispatch(SynergyMessage::MouseMoveAbs { x: 10, y: 10 }).unwrap();
        assert!(d.device().rel_moves.is_empty());
        assert!(d.device().abs_moves.is_empty());
    }

    #[test]
    fn test_key_press_and_release_round_trip() {
        let mut d = make_dispatcher(false);
        d.dispatch(SynergyMessage::KeyDown { id: 0x0061, mask: 0, button: 0x26 }).unwrap();
        assert_eq!(d.device().presses, vec![Key::KEY_A]);
        d.dispatch(SynergyMessage::KeyUp { id: 0x0061, mask: 0, button: 0x26 }).unwrap();
        assert_eq!(d.device().releases, vec![Key::KEY_A]);
        assert!(d.device().held.is_empty());
    }

    #[test]
    fn test_key_up_on_unheld_code_is_tolerated() {
        let mut d = make_dispatcher(false);
        let out = d.dispatch(SynergyMessage::KeyUp { id: 0x0061, mask: 0, button: 0 });
        assert!(out.is_ok());
        assert!(d.device().releases.is_empty());
    }

    #[test]
    fn test_unmapped_key_down_is_dropped_not_fatal() {
        let mut d = make_dispatcher(false);
        let out = d.dispatch(SynergyMessage::KeyDown { id: 0x1234, mask: 0, button: 0 });
        assert!(out.is_ok());
        assert!(d.device().presses.is_empty());
    }

    #[test]
    fn test_key_repeat_emits_release_then_press() {
        let mut d = make_dispatcher(false);
        d.dispatch(SynergyMessage::KeyDown { id: 0x0061, mask: 0, button: 0 }).unwrap();
        d.dispatch(SynergyMessage::KeyRepeat { id: 0x0061, mask: 0, count: 1, button: 0 }).unwrap();
        assert_eq!(d.device().presses, vec![Key::KEY_A, Key::KEY_A]);
        assert_eq!(d.device().releases, vec![Key::KEY_A]);
        assert_eq!(d.device().held, vec![Key::KEY_A]);
    }

    #[test]
    fn test_key_up_releases_code_actually_pressed_not_retranslation() {
        // DKDN under one mask presses KEY_A; a DKUP for the same id, even if
        // a caller constructed it with a different mask, must release what
        // was actually pressed rather than re-translating with the new mask.
        let mut d = make_dispatcher(false);
        d.dispatch(SynergyMessage::KeyDown { id: 0x0061, mask: 0, button: 0 }).unwrap();
        d.dispatch(SynergyMessage::KeyUp { id: 0x0061, mask: 0x4000, button: 0 }).unwrap();
        assert_eq!(d.device().releases, vec![Key::KEY_A]);
    }

    #[test]
    fn test_cursor_leave_resets_device() {
        let mut d = make_dispatcher(false);
        d.dispatch(SynergyMessage::KeyDown { id: 0x0061, mask: 0, button: 0 }).unwrap();
        d.dispatch(SynergyMessage::CursorLeave).unwrap();
        assert_eq!(d.device().resets, 1);
        assert!(d.device().held.is_empty());
        assert_eq!(d.device().releases, vec![Key::KEY_A]);
    }

    #[test]
    fn test_coalesced_moves_emit_only_final_target() {
        let mut d = make_dispatcher(true);
        d.dispatch(SynergyMessage::QueryInfo).unwrap();
        d.dispatch(SynergyMessage::MouseMoveAbs { x: 100, y: 100 }).unwrap();
        d.dispatch(SynergyMessage::MouseMoveAbs { x: 110, y: 110 }).unwrap();
        d.dispatch(SynergyMessage::MouseMoveAbs { x: 120, y: 120 }).unwrap();
        // All three arrived well inside the 8ms throttle window relative to
        // dispatcher construction, so at most one batch has been emitted so
        // far, and it is not yet flushed.
        assert!(d.device().abs_moves.len() <= 1);

        // A following non-move event flushes the coalesced target.
        d.dispatch(SynergyMessage::NoOp).unwrap();
        let (ax, ay) = rescale_to_u16_range(120, 120, 1920, 1080);
        assert_eq!(d.device().abs_moves.last(), Some(&(ax as i32, ay as i32)));
    }

    #[test]
    fn test_throttle_opens_after_threshold_elapses() {
        let mut d = make_dispatcher(true);
        d.dispatch(SynergyMessage::QueryInfo).unwrap();
        d.dispatch(SynergyMessage::MouseMoveAbs { x: 50, y: 50 }).unwrap();
        sleep(Duration::from_millis(20));
        d.dispatch(SynergyMessage::MouseMoveAbs { x: 60, y: 60 }).unwrap();
        assert!(d.device().abs_moves.len() >= 2);
    }

    #[test]
    fn test_move_rel_bypasses_throttle() {
        let mut d = make_dispatcher(false);
        d.dispatch(SynergyMessage::MouseMoveRel { dx: 5, dy: 5 }).unwrap();
        d.dispatch(SynergyMessage::MouseMoveRel { dx: 5, dy: 5 }).unwrap();
        assert_eq!(d.device().rel_moves, vec![(5, 5), (5, 5)]);
    }

    #[test]
    fn test_mouse_wheel_forwards_raw_values() {
        let mut d = make_dispatcher(false);
        d.dispatch(SynergyMessage::MouseWheel { x: 0, y: 120 }).unwrap();
        assert_eq!(d.device().wheels, vec![(0, 120)]);
    }

    #[test]
    fn test_mouse_button_round_trip() {
        let mut d = make_dispatcher(false);
        d.dispatch(SynergyMessage::MouseDown { button: 1 }).unwrap();
        assert_eq!(d.device().presses, vec![Key::BTN_LEFT]);
        d.dispatch(SynergyMessage::MouseUp { button: 1 }).unwrap();
        assert_eq!(d.device().releases, vec![Key::BTN_LEFT]);
    }

    #[test]
    fn test_coordinates_are_clamped_to_screen_bounds() {
        assert_eq!(clamp_to_screen(-1, -1, 1920, 1080), (0, 0));
        assert_eq!(clamp_to_screen(1920, 1080, 1920, 1080), (1919, 1079));
    }

    #[test]
    fn test_clipboard_and_opaque_opcodes_are_ignored() {
        let mut d = make_dispatcher(false);
        let out = d
            .dispatch(SynergyMessage::ClipboardData { opcode: *b"DCLP" })
            .unwrap();
        assert_eq!(out, DispatchOutcome::None);
        let out = d
            .dispatch(SynergyMessage::Opaque { opcode: *b"ZZZZ", payload: vec![] })
            .unwrap();
        assert_eq!(out, DispatchOutcome::None);
    }
}
