//! Windows Raw Input enumeration (keyboards, mice, raw HIDs).
//!
//! This module only lists devices and resolves their interface names. The
//! `WM_INPUT` message loop belongs to the host application; accepted devices
//! are tracked by handle so the host can route packets from them.
//!
//! ## Conventions
//! - Device names are the synthesized `RIDI_DEVICENAME` strings, e.g.
//!   `\\?\HID#VID_046D&PID_C52B&MI_00#7&2a3b&0&0000#{884b96c3-...}`. They are
//!   never displayed; the class record supplies the friendly name.
//! - Handles are `HANDLE` values widened to `u64`.

#![cfg(target_os = "windows")]

use super::setupapi::enumerate_input_classes;
use crate::backend::Enumerator;
use crate::controller::{Backend, Controller, ControllerKind};
use crate::metadata::DeviceMeta;
use crate::record::{DeviceClassRecord, DeviceRecord, Enumeration, RawDeviceType};
use core::ffi::c_void;
use std::collections::HashSet;
use std::io;
use windows_sys::Win32::Foundation::HANDLE;
use windows_sys::Win32::UI::Input::*;

/// RawInput device interface path for a given `hDevice` (RIDI_DEVICENAME).
pub(crate) fn device_name(hdev: HANDLE) -> Option<String> {
    unsafe {
        // Query required size (in WCHARs, including NUL).
        let mut size: u32 = 0;
        let r0 = GetRawInputDeviceInfoW(hdev, RIDI_DEVICENAME, core::ptr::null_mut(), &mut size);
        if r0 == u32::MAX || size == 0 {
            return None;
        }

        let mut wide: Vec<u16> = vec![0u16; size as usize];
        let r1 = GetRawInputDeviceInfoW(
            hdev,
            RIDI_DEVICENAME,
            wide.as_mut_ptr() as *mut c_void,
            &mut size,
        );
        if r1 == u32::MAX {
            return None;
        }

        while wide.last() == Some(&0) {
            wide.pop();
        }
        Some(String::from_utf16_lossy(&wide))
    }
}

/// All Raw Input devices currently attached.
pub(crate) fn list_devices() -> io::Result<Vec<DeviceRecord>> {
    let entry_size = core::mem::size_of::<RAWINPUTDEVICELIST>() as u32;
    unsafe {
        let mut count: u32 = 0;
        if GetRawInputDeviceList(core::ptr::null_mut(), &mut count, entry_size) == u32::MAX {
            return Err(io::Error::last_os_error());
        }

        let mut list: Vec<RAWINPUTDEVICELIST> = vec![core::mem::zeroed(); count as usize];
        let got = GetRawInputDeviceList(list.as_mut_ptr(), &mut count, entry_size);
        if got == u32::MAX {
            // Devices may have arrived between the two calls; the next tick retries.
            return Err(io::Error::last_os_error());
        }
        list.truncate(got as usize);

        let mut out = Vec::with_capacity(list.len());
        for entry in list {
            let device_type = match entry.dwType {
                RIM_TYPEKEYBOARD => RawDeviceType::Keyboard,
                RIM_TYPEMOUSE => RawDeviceType::Mouse,
                _ => RawDeviceType::Hid,
            };
            if let Some(name) = device_name(entry.hDevice) {
                out.push(DeviceRecord::new(entry.hDevice as usize as u64, name, device_type));
            }
        }
        Ok(out)
    }
}

/// Raw backend: Raw Input devices identified through SetupAPI.
#[derive(Debug, Default)]
pub struct RawInputEnumerator {
    active: HashSet<u64>,
}

impl RawInputEnumerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if input from this Raw Input handle belongs to an accepted device.
    pub fn is_active(&self, handle: u64) -> bool {
        self.active.contains(&handle)
    }
}

impl Enumerator for RawInputEnumerator {
    fn backend(&self) -> Backend {
        Backend::Raw
    }

    fn is_supported(&self) -> bool {
        true
    }

    fn enumerate(&mut self) -> io::Result<Enumeration> {
        let devices = list_devices()?;
        let classes = enumerate_input_classes()?;
        Ok(Enumeration { devices, classes })
    }

    fn build_controller(&self, device: &DeviceRecord, class: &DeviceClassRecord) -> Controller {
        let kind = ControllerKind::classify(Backend::Raw, device.device_type, class.class);
        let name = if class.description.is_empty() {
            class.instance_id.clone()
        } else {
            class.description.clone()
        };
        let meta = DeviceMeta {
            product_string: Some(name.clone()),
            path: Some(device.name.clone()),
            ..DeviceMeta::on_bus("rawinput")
        };
        Controller::new(class.instance_id.clone(), name, kind).with_meta(meta)
    }

    fn start_polling(&mut self, devices: &[DeviceRecord]) {
        self.active.extend(devices.iter().map(|d| d.handle));
    }

    fn stop_polling(&mut self) {
        self.active.clear();
    }
}
