//! Generic HID backend over `hidapi`.
//!
//! Every accepted `hidapi` entry is self-describing: the enumerator emits a raw
//! record named after the device path and a class record whose instance id is
//! that path in normalized form. Records are paired by exact id, never by
//! substring: `/dev/hidraw1` is a prefix of `/dev/hidraw10`.
//!
//! Classification rules (usage page / usage):
//! - `0x01/0x06` Generic Desktop Keyboard → keyboard
//! - `0x01/0x02` Generic Desktop Mouse → mouse
//! - `0x01/0x04` Joystick, `0x01/0x05` Gamepad, `0x01/0x08` Multi-axis → game controller
//! - `0x02` Simulation Controls, `0x0F` Physical Interface → game controller
//! - everything else is dropped (consumer control, vendor pages, ...)
//!
//! Keyboards and mice are reported so the combined environment can fall back to
//! them when the raw backend has none.

use crate::backend::Enumerator;
use crate::controller::{Backend, Controller, ControllerKind};
use crate::matcher::{lookup_exact_record, normalize_raw_name};
use crate::metadata::DeviceMeta;
use crate::record::{DeviceClass, DeviceClassRecord, DeviceRecord, Enumeration, RawDeviceType};
use hidapi::{DeviceInfo, HidApi};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io;

/// Decide what an `hidapi` entry is, if it is anything we report.
pub fn classify_usage(usage_page: u16, usage: u16) -> Option<DeviceClass> {
    match (usage_page, usage) {
        (0x01, 0x06) => Some(DeviceClass::Keyboard),
        (0x01, 0x02) => Some(DeviceClass::Mouse),
        (0x01, 0x04 | 0x05 | 0x08) => Some(DeviceClass::GameController),
        (0x02, _) | (0x0F, _) => Some(DeviceClass::GameController),
        _ => None,
    }
}

fn path_handle(path: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    hasher.finish()
}

fn to_io(err: hidapi::HidError) -> io::Error {
    io::Error::other(err.to_string())
}

pub struct HidEnumerator {
    api: Option<HidApi>,
    polled: Vec<String>,
}

impl HidEnumerator {
    /// Initializes `hidapi`. On failure the backend reports itself unsupported.
    pub fn new() -> Self {
        let api = match HidApi::new() {
            Ok(api) => Some(api),
            Err(e) => {
                tracing::warn!("failed to initialize hidapi: {e}");
                None
            }
        };
        Self {
            api,
            polled: Vec::new(),
        }
    }

    /// Paths currently handed to the device queue.
    pub fn polled_paths(&self) -> &[String] {
        &self.polled
    }

    fn describe(info: &DeviceInfo) -> Option<(DeviceRecord, DeviceClassRecord)> {
        let class = classify_usage(info.usage_page(), info.usage())?;
        let path = info.path().to_string_lossy().to_string();
        let description = info
            .product_string()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("HID {:04x}:{:04x}", info.vendor_id(), info.product_id()));
        let device_type = match class {
            DeviceClass::Keyboard => RawDeviceType::Keyboard,
            DeviceClass::Mouse => RawDeviceType::Mouse,
            DeviceClass::GameController => RawDeviceType::Hid,
        };
        Some((
            DeviceRecord::new(path_handle(&path), path.clone(), device_type),
            DeviceClassRecord::new(normalize_raw_name(&path), description, class),
        ))
    }
}

impl Default for HidEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Enumerator for HidEnumerator {
    fn backend(&self) -> Backend {
        Backend::Generic
    }

    fn is_supported(&self) -> bool {
        self.api.is_some()
    }

    fn enumerate(&mut self) -> io::Result<Enumeration> {
        let api = self
            .api
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Unsupported, "hidapi unavailable"))?;
        api.refresh_devices().map_err(to_io)?;

        let mut out = Enumeration::default();
        for info in api.device_list() {
            if let Some((device, class)) = Self::describe(info) {
                out.devices.push(device);
                out.classes.push(class);
            }
        }
        Ok(out)
    }

    fn resolve<'a>(
        &self,
        device: &DeviceRecord,
        classes: &'a [DeviceClassRecord],
    ) -> Option<&'a DeviceClassRecord> {
        lookup_exact_record(&device.name, classes)
    }

    fn build_controller(&self, device: &DeviceRecord, class: &DeviceClassRecord) -> Controller {
        let kind = ControllerKind::classify(Backend::Generic, device.device_type, class.class);
        let meta = DeviceMeta {
            product_string: Some(class.description.clone()),
            path: Some(device.name.clone()),
            ..DeviceMeta::on_bus("hid")
        };
        Controller::new(class.instance_id.clone(), class.description.clone(), kind).with_meta(meta)
    }

    fn start_polling(&mut self, devices: &[DeviceRecord]) {
        for device in devices {
            tracing::debug!(path = %device.name, "hid device queued");
            self.polled.push(device.name.clone());
        }
    }

    fn stop_polling(&mut self) {
        self.polled.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_classification() {
        assert_eq!(classify_usage(0x01, 0x06), Some(DeviceClass::Keyboard));
        assert_eq!(classify_usage(0x01, 0x02), Some(DeviceClass::Mouse));
        assert_eq!(classify_usage(0x01, 0x05), Some(DeviceClass::GameController));
        assert_eq!(classify_usage(0x02, 0xBA), Some(DeviceClass::GameController));
        assert_eq!(classify_usage(0x0C, 0x01), None);
        assert_eq!(classify_usage(0xFF00, 0x01), None);
    }

    #[test]
    fn prefix_paths_pair_with_their_own_class() {
        let classes = vec![
            DeviceClassRecord::new(normalize_raw_name("/dev/hidraw1"), "one", DeviceClass::GameController),
            DeviceClassRecord::new(normalize_raw_name("/dev/hidraw10"), "ten", DeviceClass::GameController),
        ];
        let enumerator = HidEnumerator {
            api: None,
            polled: Vec::new(),
        };
        let ten = DeviceRecord::new(10, "/dev/hidraw10", RawDeviceType::Hid);
        let hit = enumerator.resolve(&ten, &classes);
        assert_eq!(hit.map(|c| c.description.as_str()), Some("ten"));
    }
}
