//! Foreground-received and tap listeners over the backend event stream.
//!
//! Registration is a capability-scoped resource: acquired on `start`,
//! released on `stop`, and never left dangling across repeated `start`
//! calls from app-lifecycle hooks.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::platform::{NotificationEvent, PendingNotification, PlatformBackend};

/// Callback invoked with the tapped notification's full record.
pub type TapCallback = Arc<dyn Fn(PendingNotification) + Send + Sync>;

/// At most one active subscription pair. `start` unconditionally tears
/// down any previous registration before re-registering, so repeated
/// calls replace rather than stack listeners.
#[derive(Default)]
pub struct ListenerRegistration {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ListenerRegistration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the foreground-received listener (log only) and the tap
    /// listener (routes to `on_tap`).
    ///
    /// Received events are never rescheduled from here: recomputing the
    /// next occurrence is tied to the user marking the reminder complete,
    /// which the completion workflow owns. Doing it on mere delivery
    /// would double-schedule when the user never acts.
    pub fn start(&self, backend: &Arc<dyn PlatformBackend>, on_tap: Option<TapCallback>) {
        self.stop();

        let mut events = backend.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(NotificationEvent::Received(notification)) => {
                        tracing::info!(
                            id = %notification.id,
                            title = %notification.content.title,
                            scheduled_at = %notification.content.payload.scheduled_at,
                            "notification received in foreground"
                        );
                    }
                    Ok(NotificationEvent::Tapped(notification)) => {
                        tracing::debug!(
                            id = %notification.id,
                            title = %notification.content.title,
                            "notification tapped"
                        );
                        if let Some(callback) = &on_tap {
                            callback(notification);
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "listener lagged behind the event stream");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        *self.task.lock() = Some(handle);
        tracing::debug!("notification listeners installed");
    }

    /// Remove both listeners and drop the tap callback.
    /// Safe to call when not started.
    pub fn stop(&self) {
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
            tracing::debug!("notification listeners removed");
        }
    }

    pub fn is_active(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        self.stop();
    }
}
