//! Error type shared by engines, listeners and configuration.
//!
//! Only [`Error::Listener`] ever escapes a refresh or reconcile call: enumeration
//! failures are contained per backend (logged, tick skipped).

use std::io;
use std::path::PathBuf;

/// Error returned by a [`ControllerListener`](crate::eventbus::ControllerListener) callback.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A backend failed to enumerate its devices.
    #[error("{backend} enumeration failed: {source}")]
    Enumeration {
        backend: &'static str,
        #[source]
        source: io::Error,
    },

    /// A listener failed while being notified. State was already committed.
    #[error("controller listener failed: {0}")]
    Listener(#[source] ListenerError),

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
