use crate::controller::{Controller, SharedController};
use crate::error::ListenerError;
use crate::eventbus::ControllerListener;
use std::sync::Arc;

/// Wraps a listener and forwards only controllers matching a user-supplied predicate.
pub struct FilteredListener {
    predicate: Box<dyn Fn(&Controller) -> bool + Send + Sync>,
    inner: Arc<dyn ControllerListener>,
}

impl FilteredListener {
    pub fn new(
        predicate: impl Fn(&Controller) -> bool + Send + Sync + 'static,
        inner: Arc<dyn ControllerListener>,
    ) -> Self {
        Self {
            predicate: Box::new(predicate),
            inner,
        }
    }
}

impl ControllerListener for FilteredListener {
    fn controller_added(&self, controller: &SharedController) -> Result<(), ListenerError> {
        if (self.predicate)(controller.as_ref()) {
            self.inner.controller_added(controller)?;
        }
        Ok(())
    }

    fn controller_removed(&self, controller: &SharedController) -> Result<(), ListenerError> {
        if (self.predicate)(controller.as_ref()) {
            self.inner.controller_removed(controller)?;
        }
        Ok(())
    }
}
