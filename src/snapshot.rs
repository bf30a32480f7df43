//! Point-in-time snapshot of a controller set.
//!
//! [`Snapshot`] is an **owned**, read-only copy of an environment's controllers,
//! ordered by instance id. It is detached from the live registry: later ticks do
//! not change it.
//!
//! # Examples
//! ```no_run
//! use padmerge::Snapshot;
//!
//! fn print(snap: &Snapshot) {
//!     for c in snap.iter() {
//!         println!("{} {:?} {}", c.id(), c.kind(), c.name());
//!     }
//! }
//! ```

use crate::controller::{Controller, SharedController};
use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    controllers: Vec<Controller>,
}

impl Snapshot {
    pub fn from_controllers(controllers: &[SharedController]) -> Self {
        let mut controllers: Vec<Controller> =
            controllers.iter().map(|c| Controller::clone(c)).collect();
        controllers.sort_by(|a, b| a.id().cmp(b.id()));
        Self { controllers }
    }

    #[inline]
    pub fn get(&self, id: &str) -> Option<&Controller> {
        self.controllers.iter().find(|c| c.id() == id)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Controller> {
        self.controllers.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.controllers.iter().map(|c| c.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Pretty-printed JSON, for diagnostics and device reports.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ControllerKind;
    use std::sync::Arc;

    #[test]
    fn sorted_and_serializable() {
        let snap = Snapshot::from_controllers(&[
            Arc::new(Controller::new("b", "Pad", ControllerKind::GenericGameController)),
            Arc::new(Controller::new("a", "Keys", ControllerKind::RawKeyboard)),
        ]);
        assert_eq!(snap.ids(), vec!["a", "b"]);
        assert_eq!(snap.get("b").map(|c| c.name()), Some("Pad"));

        let json = snap.to_json().unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.get("a").map(|c| c.kind()), Some(ControllerKind::RawKeyboard));
    }
}
