//! Mock [`VirtualDevice`] for unit and dispatcher tests that must run
//! without a real uinput node (e.g. in CI containers with no `/dev/uinput`
//! access).

use std::sync::Mutex;

use evdev::Key;

use crate::application::virtual_device::{wheel_ticks, DeviceError, VirtualDevice};

/// Records every call it receives rather than performing kernel I/O.
#[derive(Default)]
pub struct MockVirtualDevice {
    pub presses: Mutex<Vec<Key>>,
    pub releases: Mutex<Vec<Key>>,
    pub rel_moves: Mutex<Vec<(i32, i32)>>,
    pub abs_moves: Mutex<Vec<(i32, i32)>>,
    pub wheel_ticks: Mutex<Vec<(i32, i32)>>,
    pub reset_count: Mutex<u32>,
    held: Mutex<Vec<Key>>,
    pub abs_enabled: bool,
    pub fail_next: Mutex<bool>,
}

impl MockVirtualDevice {
    pub fn new(abs_enabled: bool) -> Self {
        MockVirtualDevice {
            abs_enabled,
            ..Default::default()
        }
    }

    fn maybe_fail(&self) -> Result<(), DeviceError> {
        let mut flag = self.fail_next.lock().unwrap();
        if *flag {
            *flag = false;
            return Err(DeviceError::Uinput("injected test failure".to_string()));
        }
        Ok(())
    }
}

impl VirtualDevice for MockVirtualDevice {
    fn press(&mut self, code: Key) -> Result<(), DeviceError> {
        self.maybe_fail()?;
        let mut held = self.held.lock().unwrap();
        if !held.contains(&code) {
            held.push(code);
        }
        self.presses.lock().unwrap().push(code);
        Ok(())
    }

    fn release(&mut self, code: Key) -> Result<(), DeviceError> {
        self.maybe_fail()?;
        self.held.lock().unwrap().retain(|c| *c != code);
        self.releases.lock().unwrap().push(code);
        Ok(())
    }

    fn move_rel(&mut self, dx: i32, dy: i32) -> Result<(), DeviceError> {
        self.maybe_fail()?;
        if dx != 0 || dy != 0 {
            self.rel_moves.lock().unwrap().push((dx, dy));
        }
        Ok(())
    }

    fn move_abs(&mut self, x: i32, y: i32) -> Result<(), DeviceError> {
        self.maybe_fail()?;
        if !self.abs_enabled {
            return Err(DeviceError::Unsupported("move_abs: device has no EV_ABS capability"));
        }
        self.abs_moves.lock().unwrap().push((x, y));
        Ok(())
    }

    fn wheel(&mut self, dx: i32, dy: i32) -> Result<(), DeviceError> {
        self.maybe_fail()?;
        let ticks = (wheel_ticks(dx), wheel_ticks(dy));
        if ticks != (0, 0) {
            self.wheel_ticks.lock().unwrap().push(ticks);
        }
        Ok(())
    }

    fn reset(&mut self) -> Result<(), DeviceError> {
        self.maybe_fail()?;
        let held: Vec<Key> = self.held.lock().unwrap().drain(..).collect();
        self.releases.lock().unwrap().extend(held);
        *self.reset_count.lock().unwrap() += 1;
        Ok(())
    }

    fn held_keys(&self) -> Vec<Key> {
        self.held.lock().unwrap().clone()
    }
}
