//! Local notification scheduling engine for pet-care reminders.
//!
//! Computes future fire instants for recurring reminders (medication,
//! hygiene, food, vet visits), enforces a single pending notification
//! per reminder, and filters delivery through layered user preferences:
//! a global enable flag, per-type enable and advance-minutes lead, and a
//! do-not-disturb window that mutes alerts without discarding them.
//!
//! All scheduling is expressed as one-shot future-dated triggers
//! registered with a platform backend; nothing in the engine assumes a
//! long-lived process is around to tick a timer, so behavior holds across
//! app-closed and backgrounded states where only the platform's own
//! trigger store persists. Recurrence is recomputed opportunistically:
//! when the user completes a reminder, the completion workflow calls back
//! in to register the next occurrence.

pub mod backends;
pub mod components;
pub mod scheduler;

pub use backends::*;
pub use components::*;
pub use scheduler::{NotificationScheduler, NotificationStats, SCHEDULE_GUARD_MINUTES};

use std::sync::Arc;

/// Builder wiring a [`NotificationScheduler`] to its platform
/// collaborators. Defaults to the in-process backend with a granted
/// permission gate and default preferences, which is the configuration
/// the test suite and headless embedders run.
pub struct SchedulerBuilder {
    backend: Option<Arc<dyn PlatformBackend>>,
    permissions: Option<Arc<dyn PermissionGate>>,
    preferences: Option<PreferenceStore>,
}

impl SchedulerBuilder {
    pub fn new() -> Self {
        Self {
            backend: None,
            permissions: None,
            preferences: None,
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn PlatformBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_permissions(mut self, permissions: Arc<dyn PermissionGate>) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn with_preferences(mut self, preferences: PreferenceStore) -> Self {
        self.preferences = Some(preferences);
        self
    }

    pub fn build(self) -> NotificationScheduler {
        NotificationScheduler::new(
            self.backend
                .unwrap_or_else(|| Arc::new(MemoryBackend::new())),
            self.permissions
                .unwrap_or_else(|| Arc::new(StaticPermissionGate::granted())),
            self.preferences.unwrap_or_default(),
        )
    }
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
