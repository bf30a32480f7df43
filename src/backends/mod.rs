//! Enumeration backends for `padmerge`.
//!
//! Implementations of [`Enumerator`](crate::backend::Enumerator) for concrete
//! device sources.
//!
//! # Feature flags
//! - **`hid`** — generic HID backend over `hidapi` (keyboards, mice, game controls).
//! - **`raw-input`** — Windows Raw Input + SetupAPI backend for keyboards/mice.
//!
//! [`virtual_input`] is always available; it is what hosts use to simulate
//! devices and what the test-suite drives.

#[cfg(feature = "hid")]
#[cfg_attr(docsrs, doc(cfg(feature = "hid")))]
pub mod hid;

pub mod virtual_input;

#[cfg(all(feature = "raw-input", target_os = "windows"))]
#[cfg_attr(docsrs, doc(cfg(all(feature = "raw-input", target_os = "windows"))))]
pub mod windows;

/// The platform's default environment: Raw Input for keyboards/mice, hidapi for the rest.
#[cfg(all(feature = "hid", feature = "raw-input", target_os = "windows"))]
pub fn default_environment(
) -> crate::combined::CombinedEnvironment<windows::RawInputEnumerator, hid::HidEnumerator> {
    crate::combined::CombinedEnvironment::new(
        windows::RawInputEnumerator::new(),
        hid::HidEnumerator::new(),
    )
}
