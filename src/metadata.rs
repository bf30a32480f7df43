//! Device metadata snapshot.
//!
//! [`DeviceMeta`] is a lightweight, cloneable description of a device suitable
//! for UI display, logging, and persistence. Backends populate what they know;
//! unknown fields remain `None`.
//!
//! # Conventions
//! - `bus` is a short, human-readable bus hint like `"usb"`, `"hid"`, or `"rawinput"`.
//! - `product_string` should be a friendly, user-facing name when available.
//! - `path` is an OS/topology path (opaque string) useful for diagnostics. For raw
//!   input devices this is the synthesized device name, which is never displayed.
//! - HID-specific fields (`usage_page`, `usage`) are filled when provided by the platform.
//!
//! Metadata never takes part in identity: two controllers are the same device
//! iff their instance identifiers are equal.

use serde::{Deserialize, Serialize};

/// Snapshot of metadata describing a single device.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMeta {
    /// High-level bus classification (e.g., `"rawinput"`, `"hid"`, `"virtual"`).
    pub bus: Option<String>,

    /// USB Vendor ID (VID), if known.
    pub vid: Option<u16>,

    /// USB Product ID (PID), if known.
    pub pid: Option<u16>,

    /// Human-readable product name from the driver/firmware or device class.
    pub product_string: Option<String>,

    /// HID Usage Page (e.g., `0x01` for Generic Desktop), if known.
    pub usage_page: Option<u16>,

    /// HID Usage within the page (e.g., `0x06` Keyboard, `0x05` Gamepad), if known.
    pub usage: Option<u16>,

    /// OS/topological path to the device. Treat as opaque.
    pub path: Option<String>,
}

impl DeviceMeta {
    /// Metadata with only the bus hint set.
    pub fn on_bus(bus: &str) -> Self {
        Self {
            bus: Some(bus.to_string()),
            ..Self::default()
        }
    }
}
