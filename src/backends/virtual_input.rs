//! Scripted, in-memory backend.
//!
//! [`VirtualEnumerator`] reports whatever its [`VirtualHandle`] was told to
//! report: plug/unplug devices, inject enumeration failures, flip support. It
//! records the device-queue calls it receives so hosts and tests can observe them.

use crate::backend::Enumerator;
use crate::controller::{Backend, Controller, ControllerKind};
use crate::matcher::{lookup_class_record, lookup_exact_record};
use crate::metadata::DeviceMeta;
use crate::record::{DeviceClass, DeviceClassRecord, DeviceRecord, Enumeration, RawDeviceType};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct VirtualState {
    backend: Backend,
    supported: bool,
    devices: Vec<DeviceRecord>,
    classes: Vec<DeviceClassRecord>,
    fail_next: bool,
    failing: bool,
    started: Vec<DeviceRecord>,
    stopped: bool,
}

type Shared = Arc<Mutex<VirtualState>>;

/// Raw backends match escaped names by substring; generic ones describe themselves.
fn resolve_for<'a>(
    backend: Backend,
    device: &DeviceRecord,
    classes: &'a [DeviceClassRecord],
) -> Option<&'a DeviceClassRecord> {
    match backend {
        Backend::Raw => lookup_class_record(&device.name, classes),
        Backend::Generic => lookup_exact_record(&device.name, classes),
    }
}

fn lock(state: &Shared) -> MutexGuard<'_, VirtualState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct VirtualEnumerator {
    backend: Backend,
    state: Shared,
}

/// Control side of a [`VirtualEnumerator`]. Cheap to clone.
#[derive(Clone)]
pub struct VirtualHandle {
    state: Shared,
}

impl VirtualEnumerator {
    pub fn new(backend: Backend) -> (Self, VirtualHandle) {
        let state = Arc::new(Mutex::new(VirtualState {
            backend,
            supported: true,
            devices: Vec::new(),
            classes: Vec::new(),
            fail_next: false,
            failing: false,
            started: Vec::new(),
            stopped: false,
        }));
        (
            Self {
                backend,
                state: state.clone(),
            },
            VirtualHandle { state },
        )
    }

    /// A virtual raw (keyboard/mouse) backend.
    pub fn raw() -> (Self, VirtualHandle) {
        Self::new(Backend::Raw)
    }

    /// A virtual generic (HID/game-controller) backend.
    pub fn generic() -> (Self, VirtualHandle) {
        Self::new(Backend::Generic)
    }
}

impl Enumerator for VirtualEnumerator {
    fn backend(&self) -> Backend {
        self.backend
    }

    fn is_supported(&self) -> bool {
        lock(&self.state).supported
    }

    fn enumerate(&mut self) -> io::Result<Enumeration> {
        let mut state = lock(&self.state);
        if state.failing || std::mem::take(&mut state.fail_next) {
            return Err(io::Error::other("virtual enumeration failure"));
        }
        Ok(Enumeration {
            devices: state.devices.clone(),
            classes: state.classes.clone(),
        })
    }

    fn resolve<'a>(
        &self,
        device: &DeviceRecord,
        classes: &'a [DeviceClassRecord],
    ) -> Option<&'a DeviceClassRecord> {
        resolve_for(self.backend, device, classes)
    }

    fn build_controller(&self, device: &DeviceRecord, class: &DeviceClassRecord) -> Controller {
        let kind = ControllerKind::classify(self.backend, device.device_type, class.class);
        let meta = DeviceMeta {
            product_string: Some(class.description.clone()),
            path: Some(device.name.clone()),
            ..DeviceMeta::on_bus("virtual")
        };
        Controller::new(class.instance_id.clone(), class.description.clone(), kind).with_meta(meta)
    }

    fn start_polling(&mut self, devices: &[DeviceRecord]) {
        lock(&self.state).started.extend_from_slice(devices);
    }

    fn stop_polling(&mut self) {
        lock(&self.state).stopped = true;
    }
}

impl VirtualHandle {
    /// Adds a raw record and the class record that identifies it.
    pub fn plug(&self, device: DeviceRecord, class: DeviceClassRecord) {
        let mut state = lock(&self.state);
        state.devices.push(device);
        state.classes.push(class);
    }

    /// Adds a raw record with no class entry (e.g. a remote-session device).
    pub fn plug_unmatched(&self, device: DeviceRecord) {
        lock(&self.state).devices.push(device);
    }

    /// Adds a self-describing device: its name is its instance id.
    pub fn plug_device(&self, handle: u64, instance_id: &str, description: &str, class: DeviceClass) {
        let device_type = match class {
            DeviceClass::Keyboard => RawDeviceType::Keyboard,
            DeviceClass::Mouse => RawDeviceType::Mouse,
            DeviceClass::GameController => RawDeviceType::Hid,
        };
        self.plug(
            DeviceRecord::new(handle, instance_id, device_type),
            DeviceClassRecord::new(instance_id, description, class),
        );
    }

    /// Removes the record with `handle` and the class record it matched.
    pub fn unplug(&self, handle: u64) {
        let mut state = lock(&self.state);
        let gone: Vec<DeviceRecord> = state
            .devices
            .iter()
            .filter(|d| d.handle == handle)
            .cloned()
            .collect();
        state.devices.retain(|d| d.handle != handle);
        for device in gone {
            let matched = resolve_for(state.backend, &device, &state.classes).cloned();
            if let Some(matched) = matched {
                state.classes.retain(|c| *c != matched);
            }
        }
    }

    pub fn clear(&self) {
        let mut state = lock(&self.state);
        state.devices.clear();
        state.classes.clear();
    }

    /// The next `enumerate` call fails once.
    pub fn fail_next(&self) {
        lock(&self.state).fail_next = true;
    }

    /// Every `enumerate` call fails until reset.
    pub fn set_failing(&self, failing: bool) {
        lock(&self.state).failing = failing;
    }

    pub fn set_supported(&self, supported: bool) {
        lock(&self.state).supported = supported;
    }

    /// Devices handed to `start_polling` so far.
    pub fn polling_started(&self) -> Vec<DeviceRecord> {
        lock(&self.state).started.clone()
    }

    pub fn polling_stopped(&self) -> bool {
        lock(&self.state).stopped
    }
}
