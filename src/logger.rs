use crate::controller::SharedController;
use crate::error::ListenerError;
use crate::eventbus::ControllerListener;

/// A simple listener that logs every add/remove through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingListener;

impl LoggingListener {
    pub fn new() -> Self {
        LoggingListener
    }
}

impl ControllerListener for LoggingListener {
    fn controller_added(&self, controller: &SharedController) -> Result<(), ListenerError> {
        tracing::info!(id = controller.id(), kind = ?controller.kind(), "controller added: {}", controller.name());
        Ok(())
    }

    fn controller_removed(&self, controller: &SharedController) -> Result<(), ListenerError> {
        tracing::info!(id = controller.id(), kind = ?controller.kind(), "controller removed: {}", controller.name());
        Ok(())
    }
}
