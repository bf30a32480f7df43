//! Records produced by backend enumeration.
//!
//! A raw backend reports [`DeviceRecord`]s whose names are synthesized by the OS
//! from an instance id and an interface GUID, e.g.
//! `\\?\HID#VID_046D&PID_C52B&MI_00#7&2a3b&0&0000#{884b96c3-...}`. Those names are
//! only good for matching against [`DeviceClassRecord`]s from a device-class
//! enumeration, which carry the usable instance id and a descriptive name.

use serde::{Deserialize, Serialize};

/// Device type reported by the raw backend alongside each record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawDeviceType {
    Keyboard,
    Mouse,
    Hid,
}

/// Raw device as reported by a backend: opaque handle + synthesized name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceRecord {
    /// Opaque OS handle (e.g. a Raw Input `HANDLE` widened to `u64`).
    pub handle: u64,
    /// Synthesized name. Used only for matching, never displayed.
    pub name: String,
    pub device_type: RawDeviceType,
}

impl DeviceRecord {
    pub fn new(handle: u64, name: impl Into<String>, device_type: RawDeviceType) -> Self {
        Self {
            handle,
            name: name.into(),
            device_type,
        }
    }
}

/// Class of a device-class record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceClass {
    Keyboard,
    Mouse,
    /// Used by generic backends that describe their own joysticks/gamepads.
    GameController,
}

/// Descriptive record from a device-class enumeration (e.g. SetupAPI).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceClassRecord {
    /// Device instance identifier, e.g. `HID\VID_046D&PID_C52B&MI_00\7&2A3B&0&0000`.
    pub instance_id: String,
    /// Friendly description, e.g. `"HID Keyboard Device"`.
    pub description: String,
    pub class: DeviceClass,
}

impl DeviceClassRecord {
    pub fn new(
        instance_id: impl Into<String>,
        description: impl Into<String>,
        class: DeviceClass,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            description: description.into(),
            class,
        }
    }
}

/// One pass of a backend enumeration.
#[derive(Clone, Debug, Default)]
pub struct Enumeration {
    pub devices: Vec<DeviceRecord>,
    pub classes: Vec<DeviceClassRecord>,
}
