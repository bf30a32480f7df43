//! Consumer-facing contract shared by every engine.

use crate::controller::SharedController;
use crate::error::Result;
use crate::eventbus::{ControllerListener, ListenerId};
use crate::snapshot::Snapshot;
use std::sync::Arc;

/// A source of controllers with hot-plug notifications.
///
/// `initialize` must be called once before the first `update`. Calls to
/// `initialize`/`update` must not overlap; `get_controllers` may be called
/// from any thread at any time.
pub trait ControllerEnvironment: Send + Sync {
    /// `true` if at least one backend is usable on this platform.
    fn is_supported(&self) -> bool;

    /// Sets up subscriptions and runs the first tick.
    fn initialize(&self) -> Result<()>;

    /// Runs one tick: re-enumerate, diff, notify.
    fn update(&self) -> Result<()>;

    /// Copy of the current controller set, ordered by instance id.
    fn get_controllers(&self) -> Vec<SharedController>;

    /// Owned, serializable view of [`get_controllers`](Self::get_controllers).
    fn snapshot(&self) -> Snapshot {
        Snapshot::from_controllers(&self.get_controllers())
    }

    fn add_listener(&self, listener: Arc<dyn ControllerListener>) -> ListenerId;

    fn remove_listener(&self, id: ListenerId) -> bool;

    /// Unsubscribes and stops device queues. Call at most once.
    fn destroy(&self);
}
