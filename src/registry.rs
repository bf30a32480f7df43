//! Controller registry: `instance id → controller`, guarded by a lock.
//!
//! The registry is owned by exactly one engine and mutated only by it. Readers on
//! other threads never see the live map; they get a copy taken under the read
//! lock ([`ControllerRegistry::controllers`], [`ControllerRegistry::ids`]).
//!
//! Poisoned locks are recovered: every mutation below is a single, complete
//! step, so the map is never observed half-written.

use crate::controller::SharedController;
use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
pub struct ControllerRegistry {
    map: RwLock<HashMap<String, SharedController>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, SharedController>> {
        self.map.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, SharedController>> {
        self.map.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read().contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<SharedController> {
        self.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Copy of the live set, ordered by instance id.
    pub fn controllers(&self) -> Vec<SharedController> {
        let mut out: Vec<SharedController> = self.read().values().cloned().collect();
        out.sort_by(|a, b| a.id().cmp(b.id()));
        out
    }

    /// Copy of the live identifier set.
    pub fn ids(&self) -> BTreeSet<String> {
        self.read().keys().cloned().collect()
    }

    /// Remove then insert, in one write-lock scope.
    pub fn apply(&self, removed: &[SharedController], added: &[SharedController]) {
        let mut map = self.write();
        for controller in removed {
            map.remove(controller.id());
        }
        for controller in added {
            map.insert(controller.id().to_string(), controller.clone());
        }
    }

    /// Replace the whole contents in one write-lock scope.
    pub fn replace<I>(&self, controllers: I)
    where
        I: IntoIterator<Item = SharedController>,
    {
        let fresh: HashMap<String, SharedController> = controllers
            .into_iter()
            .map(|c| (c.id().to_string(), c))
            .collect();
        *self.write() = fresh;
    }
}
