use crate::controller::SharedController;
use crate::error::{Error, ListenerError, Result};
use std::sync::{Arc, Mutex, PoisonError};

/// Trait for reacting to controllers appearing and disappearing.
///
/// Callbacks run synchronously on the thread that drives the refresh. An `Err`
/// stops delivery of that notification and is returned from the refresh call;
/// the registry has already been updated by then.
pub trait ControllerListener: Send + Sync {
    fn controller_added(&self, controller: &SharedController) -> Result<(), ListenerError>;
    fn controller_removed(&self, controller: &SharedController) -> Result<(), ListenerError>;
}

/// Handle returned by [`ListenerBus::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct ListenerEntry {
    id: ListenerId,
    listener: Arc<dyn ControllerListener>,
}

#[derive(Default)]
struct BusState {
    next_id: u64,
    listeners: Vec<ListenerEntry>,
}

/// Broadcasts add/remove notifications to registered listeners, in registration order.
///
/// Each engine owns its own bus.
#[derive(Default)]
pub struct ListenerBus {
    state: Mutex<BusState>,
}

#[derive(Clone, Copy)]
enum Notification {
    Added,
    Removed,
}

impl ListenerBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener.
    pub fn add_listener(&self, listener: Arc<dyn ControllerListener>) -> ListenerId {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let id = ListenerId(state.next_id);
        state.next_id += 1;
        state.listeners.push(ListenerEntry { id, listener });
        id
    }

    /// Unregisters a listener. Returns `false` if the id was unknown.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let before = state.listeners.len();
        state.listeners.retain(|entry| entry.id != id);
        state.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn fire_added(&self, controller: &SharedController) -> Result<()> {
        self.fire(Notification::Added, controller)
    }

    pub fn fire_removed(&self, controller: &SharedController) -> Result<()> {
        self.fire(Notification::Removed, controller)
    }

    /// Emits every removal, then every addition.
    pub fn fire_diff(&self, removed: &[SharedController], added: &[SharedController]) -> Result<()> {
        for controller in removed {
            self.fire_removed(controller)?;
        }
        for controller in added {
            self.fire_added(controller)?;
        }
        Ok(())
    }

    fn fire(&self, notification: Notification, controller: &SharedController) -> Result<()> {
        // Deliver on a copy so listeners may (un)register from inside a callback.
        let listeners: Vec<Arc<dyn ControllerListener>> = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .iter()
            .map(|entry| entry.listener.clone())
            .collect();

        for listener in listeners {
            let outcome = match notification {
                Notification::Added => listener.controller_added(controller),
                Notification::Removed => listener.controller_removed(controller),
            };
            outcome.map_err(Error::Listener)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{Controller, ControllerKind};

    struct Tagged {
        tag: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl ControllerListener for Tagged {
        fn controller_added(&self, c: &SharedController) -> Result<(), ListenerError> {
            self.log.lock().unwrap().push(format!("{}+{}", self.tag, c.id()));
            if self.fail {
                return Err("listener refused".into());
            }
            Ok(())
        }

        fn controller_removed(&self, c: &SharedController) -> Result<(), ListenerError> {
            self.log.lock().unwrap().push(format!("{}-{}", self.tag, c.id()));
            Ok(())
        }
    }

    fn ctl(id: &str) -> SharedController {
        Arc::new(Controller::new(id, id, ControllerKind::RawMouse))
    }

    #[test]
    fn registration_order_and_removal() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let bus = ListenerBus::new();
        let a = bus.add_listener(Arc::new(Tagged { tag: "a", log: log.clone(), fail: false }));
        bus.add_listener(Arc::new(Tagged { tag: "b", log: log.clone(), fail: false }));

        bus.fire_diff(&[ctl("old")], &[ctl("new")]).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["a-old", "b-old", "a+new", "b+new"]);

        assert!(bus.remove_listener(a));
        assert!(!bus.remove_listener(a));
        log.lock().unwrap().clear();
        bus.fire_added(&ctl("x")).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["b+x"]);
    }

    #[test]
    fn listener_error_stops_delivery() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let bus = ListenerBus::new();
        bus.add_listener(Arc::new(Tagged { tag: "a", log: log.clone(), fail: true }));
        bus.add_listener(Arc::new(Tagged { tag: "b", log: log.clone(), fail: false }));

        let err = bus.fire_added(&ctl("x")).unwrap_err();
        assert!(matches!(err, Error::Listener(_)));
        assert_eq!(*log.lock().unwrap(), vec!["a+x"]);
    }
}
