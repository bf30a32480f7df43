#![cfg(target_os = "windows")]

//! Windows raw keyboard/mouse backend.
//!
//! - **Raw Input** lists every keyboard, mouse and HID the OS knows about, with
//!   synthesized device-interface names.
//! - **SetupAPI** enumerates the keyboard and mouse device classes for instance
//!   ids and friendly descriptions.
//!
//! The two are joined by the identity matcher. Terminal Server devices
//! (`RDP_KBD`, `RDP_MOU`) have no class entry and drop out there.

pub mod raw_input;
pub mod setupapi;

pub use raw_input::RawInputEnumerator;
