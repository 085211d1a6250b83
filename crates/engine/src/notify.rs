//! Notification surface for operation outcomes (the toast layer).

use std::sync::Arc;

use tracing::{error, info};

/// Where success/error toasts go. The engine emits a success notification
/// after a confirmed operation and an error notification after an automatic
/// revert; it never notifies for states the server did not confirm, except
/// for the deliberate optimistic window.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

impl<N> Notifier for Arc<N>
where
    N: Notifier + ?Sized,
{
    fn success(&self, message: &str) {
        (**self).success(message)
    }

    fn error(&self, message: &str) {
        (**self).error(message)
    }
}

/// Notifier that logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        info!(target: "stockflow::notify", "{message}");
    }

    fn error(&self, message: &str) {
        error!(target: "stockflow::notify", "{message}");
    }
}
