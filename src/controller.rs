//! Controllers and their variant tags.
//!
//! A [`Controller`] is what the engines track: a stable instance identifier, a
//! [`ControllerKind`] tag and descriptive metadata. Channel data (buttons/axes)
//! belongs to the backends' device queues and is not modelled here.
//!
//! Variant checks go through the pure classification methods on
//! [`ControllerKind`] rather than ad-hoc matches scattered across the engines.

use crate::metadata::DeviceMeta;
use crate::record::{DeviceClass, RawDeviceType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Controllers are shared between registries, listeners and snapshots.
pub type SharedController = Arc<Controller>;

/// Which enumeration backend a controller came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Backend {
    /// Low-level keyboard/mouse backend (Windows Raw Input).
    Raw,
    /// Generic HID / game-controller backend (DirectInput-style, hidapi).
    Generic,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Raw => "raw",
            Backend::Generic => "generic",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Variant tag of a controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerKind {
    RawKeyboard,
    RawMouse,
    /// Generic HID device reached through the raw backend.
    RawHid,
    GenericKeyboard,
    GenericMouse,
    GenericGameController,
}

impl ControllerKind {
    /// Variant for a matched record pair.
    ///
    /// The raw backend trusts its own device type; generic backends describe
    /// their devices through the class record.
    pub fn classify(backend: Backend, device_type: RawDeviceType, class: DeviceClass) -> Self {
        match backend {
            Backend::Raw => match device_type {
                RawDeviceType::Keyboard => ControllerKind::RawKeyboard,
                RawDeviceType::Mouse => ControllerKind::RawMouse,
                RawDeviceType::Hid => ControllerKind::RawHid,
            },
            Backend::Generic => match class {
                DeviceClass::Keyboard => ControllerKind::GenericKeyboard,
                DeviceClass::Mouse => ControllerKind::GenericMouse,
                DeviceClass::GameController => ControllerKind::GenericGameController,
            },
        }
    }

    pub fn backend(self) -> Backend {
        match self {
            ControllerKind::RawKeyboard | ControllerKind::RawMouse | ControllerKind::RawHid => {
                Backend::Raw
            }
            ControllerKind::GenericKeyboard
            | ControllerKind::GenericMouse
            | ControllerKind::GenericGameController => Backend::Generic,
        }
    }

    pub fn is_keyboard(self) -> bool {
        matches!(
            self,
            ControllerKind::RawKeyboard | ControllerKind::GenericKeyboard
        )
    }

    pub fn is_mouse(self) -> bool {
        matches!(self, ControllerKind::RawMouse | ControllerKind::GenericMouse)
    }

    pub fn is_raw_keyboard(self) -> bool {
        self == ControllerKind::RawKeyboard
    }

    pub fn is_raw_mouse(self) -> bool {
        self == ControllerKind::RawMouse
    }

    /// Generic keyboards are candidates for suppression when a raw keyboard exists.
    pub fn is_generic_keyboard(self) -> bool {
        self == ControllerKind::GenericKeyboard
    }

    /// Generic mice are candidates for suppression when a raw mouse exists.
    pub fn is_generic_mouse(self) -> bool {
        self == ControllerKind::GenericMouse
    }
}

/// A merged-set controller.
///
/// Equality and hashing use the instance identifier only; two `Controller`
/// values with the same `id` describe the same physical device.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Controller {
    id: String,
    name: String,
    kind: ControllerKind,
    meta: DeviceMeta,
}

impl Controller {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ControllerKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            meta: DeviceMeta::default(),
        }
    }

    pub fn with_meta(mut self, meta: DeviceMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Stable instance identifier, unique per physical device for the process lifetime.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-friendly name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ControllerKind {
        self.kind
    }

    pub fn backend(&self) -> Backend {
        self.kind.backend()
    }

    pub fn meta(&self) -> &DeviceMeta {
        &self.meta
    }
}

impl PartialEq for Controller {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Controller {}

impl Hash for Controller {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{:?}] ({})", self.name, self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_ignores_name_and_kind() {
        let a = Controller::new("HID\\VID_1", "Keyboard", ControllerKind::RawKeyboard);
        let b = Controller::new("HID\\VID_1", "Other", ControllerKind::GenericKeyboard);
        let c = Controller::new("hid\\vid_1", "Keyboard", ControllerKind::RawKeyboard);
        assert_eq!(a, b);
        assert_ne!(a, c, "identity is case-sensitive at this layer");
    }

    #[test]
    fn classification() {
        assert_eq!(ControllerKind::RawHid.backend(), Backend::Raw);
        assert_eq!(ControllerKind::GenericMouse.backend(), Backend::Generic);
        assert!(ControllerKind::GenericKeyboard.is_keyboard());
        assert!(ControllerKind::GenericKeyboard.is_generic_keyboard());
        assert!(!ControllerKind::RawKeyboard.is_generic_keyboard());
        assert!(ControllerKind::RawMouse.is_raw_mouse());
        assert!(!ControllerKind::GenericGameController.is_keyboard());
        assert!(!ControllerKind::GenericGameController.is_mouse());
    }

    #[test]
    fn classify_by_backend() {
        assert_eq!(
            ControllerKind::classify(Backend::Raw, RawDeviceType::Mouse, DeviceClass::Keyboard),
            ControllerKind::RawMouse
        );
        assert_eq!(
            ControllerKind::classify(Backend::Generic, RawDeviceType::Hid, DeviceClass::Keyboard),
            ControllerKind::GenericKeyboard
        );
        assert_eq!(
            ControllerKind::classify(Backend::Generic, RawDeviceType::Hid, DeviceClass::GameController),
            ControllerKind::GenericGameController
        );
    }
}
