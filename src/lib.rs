//! padmerge — one stable controller set out of overlapping input backends.
//!
//! Raw Input sees every keyboard and mouse individually but names them with
//! synthesized strings; the generic HID backend sees game controllers and also
//! duplicates of those keyboards and mice. This crate matches raw devices to
//! device-class records, keeps a registry per backend, merges both into one
//! de-duplicated set and reports hot-plug changes as ordered add/remove
//! notifications.
//!
//! ```no_run
//! use padmerge::backends::virtual_input::VirtualEnumerator;
//! use padmerge::{CombinedEnvironment, ControllerEnvironment, LoggingListener};
//! use std::sync::Arc;
//!
//! let (raw, _raw_ctl) = VirtualEnumerator::raw();
//! let (generic, _generic_ctl) = VirtualEnumerator::generic();
//! let env = CombinedEnvironment::new(raw, generic);
//! env.add_listener(Arc::new(LoggingListener::new()));
//! env.initialize()?;
//! loop {
//!     env.update()?;
//!     for c in env.get_controllers() {
//!         println!("{c}");
//!     }
//!     std::thread::sleep(std::time::Duration::from_millis(500));
//! }
//! # Ok::<(), padmerge::Error>(())
//! ```

pub mod backend;
pub mod backends;
pub mod combined;
pub mod config;
pub mod controller;
pub mod engine;
pub mod environment;
pub mod error;
pub mod eventbus;
pub mod filtered_listener;
pub mod logger;
pub mod matcher;
pub mod metadata;
pub mod record;
pub mod registry;
pub mod snapshot;

pub use backend::Enumerator;
pub use combined::CombinedEnvironment;
pub use config::EnvironmentConfig;
pub use controller::*;
pub use engine::{BackendEngine, Diff};
pub use environment::ControllerEnvironment;
pub use error::{Error, ListenerError, Result};
pub use eventbus::*;
pub use filtered_listener::FilteredListener;
pub use logger::LoggingListener;
pub use metadata::DeviceMeta;
pub use record::*;
pub use registry::ControllerRegistry;
pub use snapshot::Snapshot;
