//! uinput-backed [`VirtualDevice`] implementation.
//!
//! Creates a single kernel virtual device exposing both keyboard
//! (`EV_KEY`) and pointer (`EV_REL`, optionally `EV_ABS`) capabilities, the
//! way a physical combo keyboard/mouse would. Every emission batch is
//! terminated with `EV_SYN(SYN_REPORT)` so the kernel applies it
//! atomically.

use evdev::uinput::{VirtualDevice as UinputDevice, VirtualDeviceBuilder};
use evdev::{AbsInfo, AbsoluteAxisType, AttributeSet, BusType, EventType, InputEvent, InputId, Key, RelativeAxisType};
use tracing::{debug, warn};

use synergy_core::KeyCodeTables;

use crate::application::virtual_device::{wheel_ticks, DeviceError, VirtualDevice};

/// Synthetic vendor/product identity advertised for the virtual device.
/// Values chosen from USB-IF's unassigned test range; no real hardware
/// will ever collide with them.
const VENDOR_ID: u16 = 0x1209;
const PRODUCT_ID: u16 = 0x0001;
const DEVICE_NAME: &str = "synergy-uinput-client virtual input";

/// Kernel uinput device that emits translated Synergy input as real input
/// events. Owns the held-keys set so `reset()` and `Drop` always have an
/// accurate record of what to release.
pub struct UinputDeviceHandle {
    device: UinputDevice,
    held: Vec<Key>,
    abs_enabled: bool,
}

impl UinputDeviceHandle {
    /// Creates the uinput node with every known key/button code, relative
    /// wheel and pointer axes, and (when `abs_enabled`) ranged `ABS_X`/
    /// `ABS_Y` axes for absolute-mode pointer injection.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Uinput`] if the kernel refuses device
    /// creation (commonly a permissions issue — the calling user needs
    /// write access to `/dev/uinput`).
    pub fn new(abs_enabled: bool) -> Result<Self, DeviceError> {
        let mut keys = AttributeSet::<Key>::new();
        for code in KeyCodeTables::all_known_key_codes() {
            keys.insert(code);
        }
        for code in KeyCodeTables::all_known_button_codes() {
            keys.insert(code);
        }

        let mut rel_axes = AttributeSet::<RelativeAxisType>::new();
        rel_axes.insert(RelativeAxisType::REL_X);
        rel_axes.insert(RelativeAxisType::REL_Y);
        rel_axes.insert(RelativeAxisType::REL_WHEEL);
        rel_axes.insert(RelativeAxisType::REL_HWHEEL);

        let mut builder = VirtualDeviceBuilder::new()
            .map_err(|e| DeviceError::Uinput(e.to_string()))?
            .name(DEVICE_NAME)
            .input_id(InputId::new(BusType::BUS_VIRTUAL, VENDOR_ID, PRODUCT_ID, 1))
            .with_keys(&keys)
            .map_err(|e| DeviceError::Uinput(e.to_string()))?
            .with_relative_axes(&rel_axes)
            .map_err(|e| DeviceError::Uinput(e.to_string()))?;

        if abs_enabled {
            let abs_info = AbsInfo::new(0, 65535, 0, 0, 0, 0);
            builder = builder
                .with_absolute_axis(&evdev::UinputAbsSetup::new(AbsoluteAxisType::ABS_X, abs_info))
                .map_err(|e| DeviceError::Uinput(e.to_string()))?
                .with_absolute_axis(&evdev::UinputAbsSetup::new(AbsoluteAxisType::ABS_Y, abs_info))
                .map_err(|e| DeviceError::Uinput(e.to_string()))?;
        }

        let device = builder.build().map_err(|e| DeviceError::Uinput(e.to_string()))?;
        debug!(abs_enabled, "uinput virtual device created");

        Ok(UinputDeviceHandle {
            device,
            held: Vec::new(),
            abs_enabled,
        })
    }

    fn emit_synced(&mut self, events: &[InputEvent]) -> Result<(), DeviceError> {
        let mut batch = Vec::with_capacity(events.len() + 1);
        batch.extend_from_slice(events);
        batch.push(InputEvent::new(EventType::SYNCHRONIZATION, 0, 0));
        self.device
            .emit(&batch)
            .map_err(|e| DeviceError::Uinput(e.to_string()))
    }
}

impl VirtualDevice for UinputDeviceHandle {
    fn press(&mut self, code: Key) -> Result<(), DeviceError> {
        if self.held.contains(&code) {
            return Ok(());
        }
        self.emit_synced(&[InputEvent::new(EventType::KEY, code.code(), 1)])?;
        self.held.push(code);
        Ok(())
    }

    fn release(&mut self, code: Key) -> Result<(), DeviceError> {
        if !self.held.contains(&code) {
            return Ok(());
        }
        self.emit_synced(&[InputEvent::new(EventType::KEY, code.code(), 0)])?;
        self.held.retain(|c| *c != code);
        Ok(())
    }

    fn move_rel(&mut self, dx: i32, dy: i32) -> Result<(), DeviceError> {
        let mut events = Vec::with_capacity(2);
        if dx != 0 {
            events.push(InputEvent::new(EventType::RELATIVE, RelativeAxisType::REL_X.0, dx));
        }
        if dy != 0 {
            events.push(InputEvent::new(EventType::RELATIVE, RelativeAxisType::REL_Y.0, dy));
        }
        if events.is_empty() {
            return Ok(());
        }
        self.emit_synced(&events)
    }

    fn move_abs(&mut self, x: i32, y: i32) -> Result<(), DeviceError> {
        if !self.abs_enabled {
            return Err(DeviceError::Unsupported("move_abs: device has no EV_ABS capability"));
        }
        self.emit_synced(&[
            InputEvent::new(EventType::ABSOLUTE, AbsoluteAxisType::ABS_X.0, x),
            InputEvent::new(EventType::ABSOLUTE, AbsoluteAxisType::ABS_Y.0, y),
        ])
    }

    fn wheel(&mut self, dx: i32, dy: i32) -> Result<(), DeviceError> {
        let x_ticks = wheel_ticks(dx);
        let y_ticks = wheel_ticks(dy);
        let mut events = Vec::with_capacity(2);
        if y_ticks != 0 {
            events.push(InputEvent::new(EventType::RELATIVE, RelativeAxisType::REL_WHEEL.0, y_ticks));
        }
        if x_ticks != 0 {
            events.push(InputEvent::new(EventType::RELATIVE, RelativeAxisType::REL_HWHEEL.0, x_ticks));
        }
        if events.is_empty() {
            return Ok(());
        }
        self.emit_synced(&events)
    }

    fn reset(&mut self) -> Result<(), DeviceError> {
        let held = std::mem::take(&mut self.held);
        for code in &held {
            self.emit_synced(&[InputEvent::new(EventType::KEY, code.code(), 0)])?;
        }
        Ok(())
    }

    fn held_keys(&self) -> Vec<Key> {
        self.held.clone()
    }
}

impl Drop for UinputDeviceHandle {
    fn drop(&mut self) {
        if let Err(e) = self.reset() {
            warn!("failed to release held keys on virtual device teardown: {e}");
        }
    }
}
