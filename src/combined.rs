//! Cross-backend environment: raw keyboards/mice plus generic HID/game controllers.
//!
//! [`CombinedEnvironment`] owns one [`BackendEngine`] per backend and listens to
//! both. Their notifications are only buffered; each
//! [`reconcile`](CombinedEnvironment::reconcile) then re-derives the exposed set
//! from scratch:
//!
//! 1. remember the currently exposed ids
//! 2. fold buffered removals, then additions, into the unfiltered superset
//! 3. look for raw keyboards / raw mice in the superset (fresh every tick)
//! 4. drop generic keyboards while a raw keyboard exists, and generic mice while
//!    a raw mouse exists; game controllers always pass
//! 5. replace the exposed registry
//! 6. fire the id-set difference, removals first
//!
//! The raw backend is always refreshed before the generic one so raw presence is
//! known before generic duplicates are judged.

use crate::backend::Enumerator;
use crate::config::EnvironmentConfig;
use crate::controller::{ControllerKind, SharedController};
use crate::engine::{BackendEngine, Diff};
use crate::environment::ControllerEnvironment;
use crate::error::{ListenerError, Result};
use crate::eventbus::{ControllerListener, ListenerBus, ListenerId};
use crate::registry::ControllerRegistry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct Pending {
    added: Vec<SharedController>,
    removed: Vec<SharedController>,
}

/// Listener that buffers sub-engine notifications until the next reconcile.
#[derive(Default)]
struct PendingQueues {
    pending: Mutex<Pending>,
}

impl PendingQueues {
    fn drain(&self) -> Pending {
        std::mem::take(&mut *lock(&self.pending))
    }

    fn len(&self) -> usize {
        let pending = lock(&self.pending);
        pending.added.len() + pending.removed.len()
    }
}

impl ControllerListener for PendingQueues {
    fn controller_added(&self, controller: &SharedController) -> Result<(), ListenerError> {
        lock(&self.pending).added.push(controller.clone());
        Ok(())
    }

    fn controller_removed(&self, controller: &SharedController) -> Result<(), ListenerError> {
        lock(&self.pending).removed.push(controller.clone());
        Ok(())
    }
}

pub struct CombinedEnvironment<R: Enumerator, G: Enumerator> {
    raw: BackendEngine<R>,
    generic: BackendEngine<G>,
    config: EnvironmentConfig,
    pending: Arc<PendingQueues>,
    superset: Mutex<HashMap<String, SharedController>>,
    filtered: ControllerRegistry,
    bus: ListenerBus,
    subscriptions: Mutex<Option<(ListenerId, ListenerId)>>,
}

impl<R: Enumerator, G: Enumerator> CombinedEnvironment<R, G> {
    pub fn new(raw: R, generic: G) -> Self {
        Self::with_config(raw, generic, EnvironmentConfig::default())
    }

    pub fn with_config(raw: R, generic: G, config: EnvironmentConfig) -> Self {
        Self {
            raw: BackendEngine::new(raw),
            generic: BackendEngine::new(generic),
            config,
            pending: Arc::new(PendingQueues::default()),
            superset: Mutex::new(HashMap::new()),
            filtered: ControllerRegistry::new(),
            bus: ListenerBus::new(),
            subscriptions: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    pub fn raw_engine(&self) -> &BackendEngine<R> {
        &self.raw
    }

    pub fn generic_engine(&self) -> &BackendEngine<G> {
        &self.generic
    }

    /// Sub-engine notifications buffered since the last reconcile.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Every controller from both backends, suppressed ones included.
    pub fn all_controllers(&self) -> Vec<SharedController> {
        let mut out: Vec<SharedController> = lock(&self.superset).values().cloned().collect();
        out.sort_by(|a, b| a.id().cmp(b.id()));
        out
    }

    fn suppressed(&self, kind: ControllerKind, has_raw_keyboard: bool, has_raw_mouse: bool) -> bool {
        (self.config.prefer_raw_keyboards && has_raw_keyboard && kind.is_generic_keyboard())
            || (self.config.prefer_raw_mice && has_raw_mouse && kind.is_generic_mouse())
    }

    /// Folds buffered notifications into the superset, re-filters and fires the difference.
    pub fn reconcile(&self) -> Result<Diff> {
        let previous = self.filtered.controllers();
        let Pending { added, removed } = self.pending.drain();

        let mut next: Vec<SharedController> = {
            let mut superset = lock(&self.superset);
            for controller in &removed {
                superset.remove(controller.id());
            }
            for controller in added {
                superset.insert(controller.id().to_string(), controller);
            }

            let has_raw_keyboard = superset.values().any(|c| c.kind().is_raw_keyboard());
            let has_raw_mouse = superset.values().any(|c| c.kind().is_raw_mouse());

            superset
                .values()
                .filter(|c| !self.suppressed(c.kind(), has_raw_keyboard, has_raw_mouse))
                .cloned()
                .collect()
        };
        next.sort_by(|a, b| a.id().cmp(b.id()));

        self.filtered.replace(next.iter().cloned());

        let diff = Diff::between(&previous, &next);
        tracing::trace!(
            removed = diff.removed.len(),
            added = diff.added.len(),
            exposed = next.len(),
            "reconciled controller set"
        );
        self.bus.fire_diff(&diff.removed, &diff.added)?;
        Ok(diff)
    }
}

impl<R: Enumerator, G: Enumerator> ControllerEnvironment for CombinedEnvironment<R, G> {
    fn is_supported(&self) -> bool {
        self.raw.is_supported() || self.generic.is_supported()
    }

    fn initialize(&self) -> Result<()> {
        {
            let mut subscriptions = lock(&self.subscriptions);
            if subscriptions.is_none() {
                let listener: Arc<dyn ControllerListener> = self.pending.clone();
                let raw_id = self.raw.add_listener(listener.clone());
                let generic_id = self.generic.add_listener(listener);
                *subscriptions = Some((raw_id, generic_id));
            }
        }
        self.raw.initialize()?;
        self.generic.initialize()?;
        self.reconcile().map(|_| ())
    }

    fn update(&self) -> Result<()> {
        self.raw.refresh()?;
        self.generic.refresh()?;
        self.reconcile().map(|_| ())
    }

    fn get_controllers(&self) -> Vec<SharedController> {
        self.filtered.controllers()
    }

    fn add_listener(&self, listener: Arc<dyn ControllerListener>) -> ListenerId {
        self.bus.add_listener(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.bus.remove_listener(id)
    }

    fn destroy(&self) {
        if let Some((raw_id, generic_id)) = lock(&self.subscriptions).take() {
            self.raw.remove_listener(raw_id);
            self.generic.remove_listener(generic_id);
        }
        self.raw.destroy();
        self.generic.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_input::{VirtualEnumerator, VirtualHandle};
    use crate::record::DeviceClass;

    type Env = CombinedEnvironment<VirtualEnumerator, VirtualEnumerator>;

    fn env() -> (Env, VirtualHandle, VirtualHandle) {
        let (raw, raw_handle) = VirtualEnumerator::raw();
        let (generic, generic_handle) = VirtualEnumerator::generic();
        (CombinedEnvironment::new(raw, generic), raw_handle, generic_handle)
    }

    fn ids(env: &Env) -> Vec<String> {
        env.get_controllers().iter().map(|c| c.id().to_string()).collect()
    }

    #[test]
    fn raw_keyboard_suppresses_generic_keyboard() {
        let (env, raw, generic) = env();
        raw.plug_device(1, "K", "Raw keyboard", DeviceClass::Keyboard);
        generic.plug_device(2, "G", "Generic keyboard", DeviceClass::Keyboard);
        generic.plug_device(3, "P", "Gamepad", DeviceClass::GameController);
        env.initialize().unwrap();

        assert_eq!(ids(&env), vec!["K", "P"]);
        assert_eq!(env.all_controllers().len(), 3);

        raw.unplug(1);
        env.update().unwrap();
        assert_eq!(ids(&env), vec!["G", "P"]);
    }

    #[test]
    fn raw_mouse_only_suppresses_mice() {
        let (env, raw, generic) = env();
        raw.plug_device(1, "M", "Raw mouse", DeviceClass::Mouse);
        generic.plug_device(2, "GM", "Generic mouse", DeviceClass::Mouse);
        generic.plug_device(3, "GK", "Generic keyboard", DeviceClass::Keyboard);
        env.initialize().unwrap();
        assert_eq!(ids(&env), vec!["GK", "M"]);
    }

    #[test]
    fn config_can_disable_suppression() {
        let (raw, raw_handle) = VirtualEnumerator::raw();
        let (generic, generic_handle) = VirtualEnumerator::generic();
        let config = EnvironmentConfig {
            prefer_raw_keyboards: false,
            prefer_raw_mice: true,
        };
        let env = CombinedEnvironment::with_config(raw, generic, config);
        raw_handle.plug_device(1, "K", "Raw keyboard", DeviceClass::Keyboard);
        generic_handle.plug_device(2, "G", "Generic keyboard", DeviceClass::Keyboard);
        env.initialize().unwrap();
        assert_eq!(ids(&env), vec!["G", "K"]);
    }

    #[test]
    fn pending_queues_drain_on_reconcile() {
        let (env, raw, _generic) = env();
        env.initialize().unwrap();
        raw.plug_device(1, "K", "Raw keyboard", DeviceClass::Keyboard);
        env.raw_engine().refresh().unwrap();
        assert_eq!(env.pending_len(), 1);
        assert!(env.get_controllers().is_empty(), "buffered, not applied");

        let diff = env.reconcile().unwrap();
        assert_eq!(env.pending_len(), 0);
        assert_eq!(diff.added_ids().into_iter().collect::<Vec<_>>(), vec!["K"]);
    }

    #[test]
    fn destroy_unsubscribes_and_stops_queues() {
        let (env, raw, generic) = env();
        env.initialize().unwrap();
        env.destroy();
        assert!(raw.polling_stopped());
        assert!(generic.polling_stopped());

        raw.plug_device(1, "K", "Raw keyboard", DeviceClass::Keyboard);
        env.raw_engine().refresh().unwrap();
        assert_eq!(env.pending_len(), 0);
    }

    #[test]
    fn supported_if_either_backend_is() {
        let (env, raw, generic) = env();
        raw.set_supported(false);
        assert!(env.is_supported());
        generic.set_supported(false);
        assert!(!env.is_supported());
    }
}
