//! Single-backend merge engine.
//!
//! [`BackendEngine`] owns one [`ControllerRegistry`] and one [`ListenerBus`].
//! Every [`refresh`](BackendEngine::refresh) enumerates its backend, resolves raw
//! records through the identity matcher, diffs the result against the registry by
//! instance id and fires the difference:
//!
//! 1. enumerate (failure: log, skip the tick, registry untouched)
//! 2. resolve each raw record; unmatched records are dropped for this pass
//! 3. removed = registry ids no candidate carries
//! 4. added = candidates whose id is not yet registered
//! 5. apply removals then additions under the registry's write lock
//! 6. outside the lock: fire all removals, then all additions
//! 7. hand the added devices to the backend's device queue
//!
//! Ticks must not overlap; the engine serializes them internally. Reads through
//! [`get_controllers`](BackendEngine::get_controllers) are safe from any thread,
//! and listeners may call back into the engine: no engine lock is held while
//! they run.

use crate::backend::Enumerator;
use crate::controller::{Backend, SharedController};
use crate::environment::ControllerEnvironment;
use crate::error::{Error, Result};
use crate::eventbus::{ControllerListener, ListenerBus, ListenerId};
use crate::record::DeviceRecord;
use crate::registry::ControllerRegistry;
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

/// What one tick changed, in firing order (removals, then additions).
#[derive(Debug, Clone, Default)]
pub struct Diff {
    pub removed: Vec<SharedController>,
    pub added: Vec<SharedController>,
}

impl Diff {
    /// Identifier-set difference between two controller sets.
    ///
    /// Controllers present in both (by id) produce nothing, even if the
    /// underlying object changed.
    pub fn between(previous: &[SharedController], next: &[SharedController]) -> Self {
        let previous_ids: HashSet<&str> = previous.iter().map(|c| c.id()).collect();
        let next_ids: HashSet<&str> = next.iter().map(|c| c.id()).collect();
        Self {
            removed: previous
                .iter()
                .filter(|c| !next_ids.contains(c.id()))
                .cloned()
                .collect(),
            added: next
                .iter()
                .filter(|c| !previous_ids.contains(c.id()))
                .cloned()
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }

    pub fn removed_ids(&self) -> BTreeSet<String> {
        self.removed.iter().map(|c| c.id().to_string()).collect()
    }

    pub fn added_ids(&self) -> BTreeSet<String> {
        self.added.iter().map(|c| c.id().to_string()).collect()
    }
}

pub struct BackendEngine<E: Enumerator> {
    backend: Backend,
    registry: ControllerRegistry,
    bus: ListenerBus,
    enumerator: Mutex<E>,
    /// Last known support flag, served while a tick holds the enumerator.
    supported: AtomicBool,
    active_devices: Mutex<Vec<DeviceRecord>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<E: Enumerator> BackendEngine<E> {
    pub fn new(enumerator: E) -> Self {
        Self {
            backend: enumerator.backend(),
            supported: AtomicBool::new(enumerator.is_supported()),
            registry: ControllerRegistry::new(),
            bus: ListenerBus::new(),
            enumerator: Mutex::new(enumerator),
            active_devices: Mutex::new(Vec::new()),
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Devices handed to the device queue so far.
    pub fn active_devices(&self) -> Vec<DeviceRecord> {
        lock(&self.active_devices).clone()
    }

    /// Runs one reconciliation tick for this backend.
    ///
    /// Enumeration failures are logged and reported as an empty [`Diff`]. The only
    /// error returned is [`Error::Listener`], after the registry was updated.
    ///
    /// Listeners run with no engine lock held and may call back into the engine.
    pub fn refresh(&self) -> Result<Diff> {
        let (removed, added, added_devices) = {
            let mut enumerator = lock(&self.enumerator);
            let supported = enumerator.is_supported();
            self.supported.store(supported, Ordering::Relaxed);
            if !supported {
                return Ok(Diff::default());
            }

            let enumeration = match enumerator.enumerate() {
                Ok(enumeration) => enumeration,
                Err(source) => {
                    let err = Error::Enumeration {
                        backend: self.backend.as_str(),
                        source,
                    };
                    tracing::warn!("{err}; keeping previous controller set");
                    return Ok(Diff::default());
                }
            };

            let mut candidates: Vec<(&DeviceRecord, SharedController)> = Vec::new();
            for device in &enumeration.devices {
                match enumerator.resolve(device, &enumeration.classes) {
                    Some(class) => {
                        let controller = enumerator.build_controller(device, class);
                        candidates.push((device, Arc::new(controller)));
                    }
                    None => {
                        tracing::debug!(
                            backend = %self.backend,
                            name = %device.name,
                            "no device-class match, skipping (remote session device?)"
                        );
                    }
                }
            }

            let candidate_ids: HashSet<&str> = candidates.iter().map(|(_, c)| c.id()).collect();
            let removed: Vec<SharedController> = self
                .registry
                .controllers()
                .into_iter()
                .filter(|c| !candidate_ids.contains(c.id()))
                .collect();

            let mut seen = HashSet::new();
            let mut added = Vec::new();
            let mut added_devices = Vec::new();
            for (device, controller) in &candidates {
                if self.registry.contains(controller.id()) || !seen.insert(controller.id()) {
                    continue;
                }
                added.push(controller.clone());
                added_devices.push((*device).clone());
            }

            self.registry.apply(&removed, &added);
            (removed, added, added_devices)
        };

        for controller in &removed {
            tracing::debug!(backend = %self.backend, id = controller.id(), "controller gone");
        }
        for controller in &added {
            tracing::debug!(backend = %self.backend, id = controller.id(), "controller found");
        }

        let fired = self.bus.fire_diff(&removed, &added);

        if !added_devices.is_empty() {
            lock(&self.enumerator).start_polling(&added_devices);
            lock(&self.active_devices).extend(added_devices);
        }

        fired?;
        Ok(Diff { removed, added })
    }
}

impl<E: Enumerator> ControllerEnvironment for BackendEngine<E> {
    fn is_supported(&self) -> bool {
        match self.enumerator.try_lock() {
            Ok(enumerator) => {
                let supported = enumerator.is_supported();
                self.supported.store(supported, Ordering::Relaxed);
                supported
            }
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().is_supported(),
            Err(TryLockError::WouldBlock) => self.supported.load(Ordering::Relaxed),
        }
    }

    fn initialize(&self) -> Result<()> {
        self.refresh().map(|_| ())
    }

    fn update(&self) -> Result<()> {
        self.refresh().map(|_| ())
    }

    fn get_controllers(&self) -> Vec<SharedController> {
        self.registry.controllers()
    }

    fn add_listener(&self, listener: Arc<dyn ControllerListener>) -> ListenerId {
        self.bus.add_listener(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.bus.remove_listener(id)
    }

    fn destroy(&self) {
        lock(&self.enumerator).stop_polling();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_input::VirtualEnumerator;
    use crate::controller::ControllerKind;
    use crate::error::ListenerError;
    use crate::record::{DeviceClass, RawDeviceType};
    use std::sync::{mpsc, OnceLock, Weak};
    use std::thread;
    use std::time::Duration;

    fn raw_keyboard(n: u64) -> (DeviceRecord, crate::record::DeviceClassRecord) {
        (
            DeviceRecord::new(
                n,
                format!("\\\\?\\HID#VID_{n:04}&PID_0001#7&1#{{guid}}"),
                RawDeviceType::Keyboard,
            ),
            crate::record::DeviceClassRecord::new(
                format!("hid\\vid_{n:04}&pid_0001\\7&1"),
                format!("Keyboard {n}"),
                DeviceClass::Keyboard,
            ),
        )
    }

    #[test]
    fn refresh_adds_then_removes() {
        let (enumerator, handle) = VirtualEnumerator::raw();
        let engine = BackendEngine::new(enumerator);

        let (dev, class) = raw_keyboard(1);
        handle.plug(dev, class);
        let diff = engine.refresh().unwrap();
        assert_eq!(diff.added.len(), 1);
        assert!(diff.removed.is_empty());
        assert_eq!(engine.get_controllers()[0].kind(), ControllerKind::RawKeyboard);
        assert_eq!(engine.get_controllers()[0].name(), "Keyboard 1");
        assert_eq!(handle.polling_started().len(), 1);

        let diff = engine.refresh().unwrap();
        assert!(diff.is_empty(), "unchanged enumeration fires nothing");

        handle.unplug(1);
        let diff = engine.refresh().unwrap();
        assert_eq!(diff.removed.len(), 1);
        assert!(engine.get_controllers().is_empty());
    }

    #[test]
    fn enumeration_failure_keeps_registry() {
        let (enumerator, handle) = VirtualEnumerator::raw();
        let engine = BackendEngine::new(enumerator);
        let (dev, class) = raw_keyboard(1);
        handle.plug(dev, class);
        engine.refresh().unwrap();

        handle.unplug(1);
        handle.fail_next();
        let diff = engine.refresh().unwrap();
        assert!(diff.is_empty());
        assert_eq!(engine.get_controllers().len(), 1, "stale until a tick succeeds");

        let diff = engine.refresh().unwrap();
        assert_eq!(diff.removed.len(), 1);
    }

    #[test]
    fn unmatched_devices_never_register() {
        let (enumerator, handle) = VirtualEnumerator::raw();
        let engine = BackendEngine::new(enumerator);
        handle.plug_unmatched(DeviceRecord::new(
            9,
            "\\\\?\\Root#RDP_KBD#0000#{guid}",
            RawDeviceType::Keyboard,
        ));
        let diff = engine.refresh().unwrap();
        assert!(diff.is_empty());
        assert!(engine.get_controllers().is_empty());
        assert!(engine.active_devices().is_empty());
    }

    #[test]
    fn duplicate_ids_in_one_pass_register_once() {
        let (enumerator, handle) = VirtualEnumerator::raw();
        let engine = BackendEngine::new(enumerator);
        let (dev, class) = raw_keyboard(1);
        handle.plug(dev.clone(), class);
        handle.plug_unmatched(DeviceRecord::new(2, dev.name.clone(), RawDeviceType::Keyboard));
        let diff = engine.refresh().unwrap();
        assert_eq!(diff.added.len(), 1);
        assert_eq!(engine.get_controllers().len(), 1);
    }

    #[test]
    fn unsupported_backend_is_inert() {
        let (enumerator, handle) = VirtualEnumerator::raw();
        handle.set_supported(false);
        let engine = BackendEngine::new(enumerator);
        let (dev, class) = raw_keyboard(1);
        handle.plug(dev, class);
        assert!(!engine.is_supported());
        assert!(engine.refresh().unwrap().is_empty());
    }

    struct ReentrantListener {
        engine: OnceLock<Weak<BackendEngine<VirtualEnumerator>>>,
        seen: Mutex<Vec<(bool, usize, usize)>>,
    }

    impl ControllerListener for ReentrantListener {
        fn controller_added(&self, _controller: &SharedController) -> Result<(), ListenerError> {
            if let Some(engine) = self.engine.get().and_then(Weak::upgrade) {
                let supported = engine.is_supported();
                let registered = engine.get_controllers().len();
                let queued = engine.active_devices().len();
                self.seen.lock().unwrap().push((supported, registered, queued));
                engine.destroy();
            }
            Ok(())
        }

        fn controller_removed(&self, _controller: &SharedController) -> Result<(), ListenerError> {
            Ok(())
        }
    }

    #[test]
    fn listeners_may_call_back_into_the_engine() {
        let (enumerator, handle) = VirtualEnumerator::raw();
        let engine = Arc::new(BackendEngine::new(enumerator));
        let listener = Arc::new(ReentrantListener {
            engine: OnceLock::new(),
            seen: Mutex::new(Vec::new()),
        });
        let _ = listener.engine.set(Arc::downgrade(&engine));
        engine.add_listener(listener.clone());

        let (dev, class) = raw_keyboard(1);
        handle.plug(dev, class);

        let (tx, rx) = mpsc::channel();
        let worker = engine.clone();
        thread::spawn(move || {
            let _ = tx.send(worker.refresh().map(|diff| diff.added.len()));
        });
        let added = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("refresh deadlocked on a re-entrant listener");
        assert_eq!(added.unwrap(), 1);

        let seen = listener.seen.lock().unwrap().clone();
        assert_eq!(seen, vec![(true, 1, 0)], "registry committed before firing");
        assert!(handle.polling_stopped());
        assert_eq!(engine.active_devices().len(), 1);
    }

    #[test]
    fn destroy_stops_polling() {
        let (enumerator, handle) = VirtualEnumerator::raw();
        let engine = BackendEngine::new(enumerator);
        engine.initialize().unwrap();
        engine.destroy();
        assert!(handle.polling_stopped());
    }
}
