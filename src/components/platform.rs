// Platform trigger boundary: the traits the scheduler drives and the
// records the platform hands back.
//
// The platform's pending-notification store is the single source of
// truth for what is currently scheduled. The engine keeps no shadow
// index; callers query fresh before cancelling, which is what keeps the
// cancel-then-register sequence free of stale-state bugs.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::content::NotificationContent;
use super::delivery::DeliveryDecision;
use super::{NotificationId, NotifyResult};

/// Future type returned by backend trait methods.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = NotifyResult<T>> + Send + 'a>>;

/// Outcome of the notification permission gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// A one-shot trigger the platform is currently holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingNotification {
    pub id: NotificationId,
    pub content: NotificationContent,
    /// Instant the trigger fires.
    pub fire_at: DateTime<Utc>,
}

/// Platform callback events routed to the lifecycle listeners.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    /// Delivered while the app was foregrounded.
    Received(PendingNotification),
    /// The user tapped the displayed notification.
    Tapped(PendingNotification),
}

/// Handler the platform consults immediately before displaying a fired
/// notification.
pub type DisplayHandler = Arc<dyn Fn(&PendingNotification) -> DeliveryDecision + Send + Sync>;

/// One-shot trigger registration, cancellation, and the pending store.
///
/// Every method is fallible at the platform boundary; the scheduler
/// catches and logs, so implementations are free to surface real errors.
pub trait PlatformBackend: Send + Sync {
    /// Register a single future-dated trigger. There are no repeating
    /// triggers anywhere in the engine; recurrence is recomputed and
    /// re-registered by the completion workflow.
    fn register_one_shot(
        &self,
        content: NotificationContent,
        fire_at: DateTime<Utc>,
    ) -> BackendFuture<'_, NotificationId>;

    /// Remove a pending trigger. Cancelling an unknown or already-fired
    /// id is a no-op.
    fn cancel(&self, id: NotificationId) -> BackendFuture<'_, ()>;

    fn cancel_all(&self) -> BackendFuture<'_, ()>;

    /// Everything currently scheduled, fresh from the platform store.
    fn pending(&self) -> BackendFuture<'_, Vec<PendingNotification>>;

    fn get_badge_count(&self) -> BackendFuture<'_, u32>;

    fn set_badge_count(&self, count: u32) -> BackendFuture<'_, ()>;

    /// Install the display-time handler. At most one is active; a new
    /// installation replaces the old.
    fn set_display_handler(&self, handler: DisplayHandler);

    /// Subscribe to received/tapped callback events.
    fn subscribe(&self) -> broadcast::Receiver<NotificationEvent>;
}

/// Permission gate the engine routes through before any scheduling.
/// A denied or undetermined status short-circuits scheduling to a no-op.
pub trait PermissionGate: Send + Sync {
    fn status(&self) -> BackendFuture<'_, PermissionStatus>;

    /// Prompt the user if the platform still allows it.
    fn request(&self) -> BackendFuture<'_, PermissionStatus>;
}
