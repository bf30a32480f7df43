//! Identity matching between raw device names and device-class records.
//!
//! Raw Input names escape the instance id's backslashes as `#`
//! (`\\?\HID#VID_1234&PID_5678#7&2a3b#{guid}`), while device-class enumeration
//! reports `HID\VID_1234&PID_5678\7&2A3B`. Matching normalizes the raw name and
//! looks for the instance id as a case-insensitive substring.
//!
//! Multiple containment matches resolve to the first record in enumeration order.
//! That tie-break is arbitrary; it is not a correctness guarantee.
//!
//! Backends whose records describe themselves (name and instance id are the same
//! path) use [`lookup_exact_record`] instead, so `/dev/hidraw1` never claims
//! `/dev/hidraw10`.

use crate::record::DeviceClassRecord;

/// Normalize a raw device name for matching: `#` becomes `\`, then upper-case.
pub fn normalize_raw_name(name: &str) -> String {
    name.replace('#', "\\").to_uppercase()
}

/// Find the device-class record whose instance id is contained in `raw_name`.
///
/// Returns `None` for devices with no class entry, most commonly remote-session
/// synthetic keyboards/mice; callers drop those for the current pass.
pub fn lookup_class_record<'a>(
    raw_name: &str,
    classes: &'a [DeviceClassRecord],
) -> Option<&'a DeviceClassRecord> {
    let normalized = normalize_raw_name(raw_name);
    classes.iter().find(|class| {
        !class.instance_id.is_empty() && normalized.contains(&class.instance_id.to_uppercase())
    })
}

/// Find the device-class record whose instance id equals the normalized `raw_name`.
pub fn lookup_exact_record<'a>(
    raw_name: &str,
    classes: &'a [DeviceClassRecord],
) -> Option<&'a DeviceClassRecord> {
    let normalized = normalize_raw_name(raw_name);
    classes.iter().find(|class| {
        !class.instance_id.is_empty() && class.instance_id.to_uppercase() == normalized
    })
}
