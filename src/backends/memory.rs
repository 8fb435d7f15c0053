//! Deterministic in-process backend.
//!
//! Plays the role of the OS trigger store: holds registered one-shot
//! triggers, consults the installed display handler when one fires,
//! broadcasts received/tapped events to the lifecycle listeners, and
//! keeps the badge counter. Firing is driven explicitly through
//! [`MemoryBackend::fire`], which is what makes scheduling behavior
//! fully observable in tests.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;

use crate::components::content::NotificationContent;
use crate::components::delivery::DeliveryDecision;
use crate::components::platform::{
    BackendFuture, DisplayHandler, NotificationEvent, PendingNotification, PermissionGate,
    PermissionStatus, PlatformBackend,
};
use crate::components::{NotificationId, NotifyError};

const EVENT_CHANNEL_CAPACITY: usize = 64;

pub struct MemoryBackend {
    pending: RwLock<Vec<PendingNotification>>,
    badge: RwLock<u32>,
    handler: Mutex<Option<DisplayHandler>>,
    events: broadcast::Sender<NotificationEvent>,
    fail_next_register: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            pending: RwLock::new(Vec::new()),
            badge: RwLock::new(0),
            handler: Mutex::new(None),
            events,
            fail_next_register: AtomicBool::new(false),
        }
    }

    /// Make the next `register_one_shot` call fail, to exercise the
    /// scheduler's degrade-to-`None` path.
    pub fn induce_register_failure(&self) {
        self.fail_next_register.store(true, Ordering::SeqCst);
    }

    /// Fire a pending trigger: remove it from the store, run the display
    /// handler, bump the badge if the decision asks for it, and emit a
    /// `Received` event. Returns the decision, or `None` for an unknown
    /// id (already fired or cancelled).
    pub fn fire(&self, id: NotificationId) -> Option<DeliveryDecision> {
        let notification = {
            let mut pending = self.pending.write();
            let index = pending.iter().position(|candidate| candidate.id == id)?;
            pending.remove(index)
        };

        let handler = self.handler.lock().clone();
        let decision = match handler {
            Some(handler) => handler(&notification),
            None => DeliveryDecision::shown(notification.content.sound),
        };

        if decision.set_badge {
            *self.badge.write() += 1;
        }

        let _ = self.events.send(NotificationEvent::Received(notification));
        Some(decision)
    }

    /// Simulate the user tapping a delivered notification.
    pub fn tap(&self, notification: PendingNotification) {
        let _ = self.events.send(NotificationEvent::Tapped(notification));
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformBackend for MemoryBackend {
    fn register_one_shot(
        &self,
        content: NotificationContent,
        fire_at: DateTime<Utc>,
    ) -> BackendFuture<'_, NotificationId> {
        Box::pin(async move {
            if self.fail_next_register.swap(false, Ordering::SeqCst) {
                return Err(NotifyError::platform("trigger store rejected the request"));
            }
            let id = NotificationId::generate();
            self.pending.write().push(PendingNotification {
                id,
                content,
                fire_at,
            });
            tracing::debug!(%id, %fire_at, "registered one-shot trigger");
            Ok(id)
        })
    }

    fn cancel(&self, id: NotificationId) -> BackendFuture<'_, ()> {
        Box::pin(async move {
            self.pending.write().retain(|candidate| candidate.id != id);
            Ok(())
        })
    }

    fn cancel_all(&self) -> BackendFuture<'_, ()> {
        Box::pin(async move {
            self.pending.write().clear();
            Ok(())
        })
    }

    fn pending(&self) -> BackendFuture<'_, Vec<PendingNotification>> {
        Box::pin(async move { Ok(self.pending.read().clone()) })
    }

    fn get_badge_count(&self) -> BackendFuture<'_, u32> {
        Box::pin(async move { Ok(*self.badge.read()) })
    }

    fn set_badge_count(&self, count: u32) -> BackendFuture<'_, ()> {
        Box::pin(async move {
            *self.badge.write() = count;
            Ok(())
        })
    }

    fn set_display_handler(&self, handler: DisplayHandler) {
        *self.handler.lock() = Some(handler);
    }

    fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.events.subscribe()
    }
}

/// Permission gate with a fixed starting status. `request` resolves an
/// `Undetermined` status to the configured outcome and is otherwise a
/// no-op, mirroring how the OS only prompts once.
pub struct StaticPermissionGate {
    status: RwLock<PermissionStatus>,
    grant_on_request: bool,
}

impl StaticPermissionGate {
    pub fn granted() -> Self {
        Self {
            status: RwLock::new(PermissionStatus::Granted),
            grant_on_request: true,
        }
    }

    pub fn denied() -> Self {
        Self {
            status: RwLock::new(PermissionStatus::Denied),
            grant_on_request: false,
        }
    }

    pub fn undetermined(grant_on_request: bool) -> Self {
        Self {
            status: RwLock::new(PermissionStatus::Undetermined),
            grant_on_request,
        }
    }
}

impl PermissionGate for StaticPermissionGate {
    fn status(&self) -> BackendFuture<'_, PermissionStatus> {
        Box::pin(async move { Ok(*self.status.read()) })
    }

    fn request(&self) -> BackendFuture<'_, PermissionStatus> {
        Box::pin(async move {
            let mut status = self.status.write();
            if *status == PermissionStatus::Undetermined {
                *status = if self.grant_on_request {
                    PermissionStatus::Granted
                } else {
                    PermissionStatus::Denied
                };
            }
            Ok(*status)
        })
    }
}
