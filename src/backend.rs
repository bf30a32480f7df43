//! The contract a device-enumeration backend fulfils for a [`BackendEngine`](crate::engine::BackendEngine).
//!
//! Native enumeration, descriptor decoding and device-level event queues live
//! behind this trait. The engine only needs:
//! - a fresh list of raw records plus device-class records per tick,
//! - a way to pair each raw record with its class record,
//! - a way to turn a matched pair into a [`Controller`],
//! - fire-and-forget start/stop hooks for the device queue.

use crate::controller::{Backend, Controller};
use crate::matcher::lookup_class_record;
use crate::record::{DeviceClassRecord, DeviceRecord, Enumeration};
use std::io;

pub trait Enumerator: Send {
    /// Which backend this enumerator feeds (used for logging and error context).
    fn backend(&self) -> Backend;

    /// `true` if this backend is usable on the current platform.
    fn is_supported(&self) -> bool;

    /// Enumerate raw devices and the device-class records used to identify them.
    fn enumerate(&mut self) -> io::Result<Enumeration>;

    /// Pair a raw record with its device-class record.
    ///
    /// Defaults to escaped-substring matching; self-describing backends override
    /// it with an exact lookup.
    fn resolve<'a>(
        &self,
        device: &DeviceRecord,
        classes: &'a [DeviceClassRecord],
    ) -> Option<&'a DeviceClassRecord> {
        lookup_class_record(&device.name, classes)
    }

    /// Build a controller for a matched pair. Pure construction.
    fn build_controller(&self, device: &DeviceRecord, class: &DeviceClassRecord) -> Controller;

    /// Begin delivering input for newly accepted devices.
    fn start_polling(&mut self, devices: &[DeviceRecord]);

    /// Stop the device queue.
    fn stop_polling(&mut self);
}

impl<E: Enumerator + ?Sized> Enumerator for Box<E> {
    fn backend(&self) -> Backend {
        (**self).backend()
    }

    fn is_supported(&self) -> bool {
        (**self).is_supported()
    }

    fn enumerate(&mut self) -> io::Result<Enumeration> {
        (**self).enumerate()
    }

    fn resolve<'a>(
        &self,
        device: &DeviceRecord,
        classes: &'a [DeviceClassRecord],
    ) -> Option<&'a DeviceClassRecord> {
        (**self).resolve(device, classes)
    }

    fn build_controller(&self, device: &DeviceRecord, class: &DeviceClassRecord) -> Controller {
        (**self).build_controller(device, class)
    }

    fn start_polling(&mut self, devices: &[DeviceRecord]) {
        (**self).start_polling(devices)
    }

    fn stop_polling(&mut self) {
        (**self).stop_polling()
    }
}
