//! Orchestrates reminder scheduling against the platform backend.
//!
//! The scheduler owns the layered gating (permission grant, global
//! enable, per-type enable, imminence guard) and the single invariant
//! that keeps the pending store sane: a saved reminder holds at most one
//! live trigger at a time. Failures at the platform boundary are caught
//! and logged; saving a reminder must succeed even when its notification
//! cannot be registered.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::components::content::{NotificationContent, NotificationPayload, ReminderMetadata};
use crate::components::delivery;
use crate::components::lifecycle::{ListenerRegistration, TapCallback};
use crate::components::platform::{
    PendingNotification, PermissionGate, PermissionStatus, PlatformBackend,
};
use crate::components::preferences::PreferenceStore;
use crate::components::schedule::{self, Frequency};
use crate::components::{NotificationId, ReminderId, ReminderType};

/// Never register a trigger that would fire within this guard of now.
/// Saving or editing a reminder must not surprise the user with an
/// instant notification.
pub const SCHEDULE_GUARD_MINUTES: i64 = 1;

/// Summary of the platform's pending store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationStats {
    pub total: usize,
    pub by_type: HashMap<ReminderType, usize>,
    pub next_fire: Option<DateTime<Utc>>,
}

/// Schedules at most one pending notification per reminder, filtered
/// through the user's preferences. Built via [`SchedulerBuilder`](crate::SchedulerBuilder).
pub struct NotificationScheduler {
    backend: Arc<dyn PlatformBackend>,
    permissions: Arc<dyn PermissionGate>,
    preferences: PreferenceStore,
    listeners: ListenerRegistration,
}

impl NotificationScheduler {
    pub fn new(
        backend: Arc<dyn PlatformBackend>,
        permissions: Arc<dyn PermissionGate>,
        preferences: PreferenceStore,
    ) -> Self {
        Self {
            backend,
            permissions,
            preferences,
            listeners: ListenerRegistration::new(),
        }
    }

    /// Handle to the process-wide preference record, for the settings
    /// screen to mutate.
    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }

    /// Register a single one-shot notification for a reminder due at
    /// `target`. Returns the platform handle, or `None` when preferences,
    /// permissions, or the imminence guard filtered it out, or the
    /// platform call itself failed.
    pub async fn schedule(
        &self,
        title: impl Into<String>,
        body: impl Into<String>,
        target: DateTime<Utc>,
        metadata: ReminderMetadata,
    ) -> Option<NotificationId> {
        self.schedule_with_now(title.into(), body.into(), target, metadata, Utc::now())
            .await
    }

    async fn schedule_with_now(
        &self,
        title: String,
        body: String,
        target: DateTime<Utc>,
        metadata: ReminderMetadata,
        now: DateTime<Utc>,
    ) -> Option<NotificationId> {
        if !self.permission_granted().await {
            tracing::debug!(%title, "notification permission not granted, skipping");
            return None;
        }

        let preferences = self.preferences.snapshot();
        if !preferences.enabled {
            tracing::debug!(%title, "notifications disabled, skipping");
            return None;
        }
        if let Some(reminder_type) = metadata.reminder_type
            && !preferences.is_type_enabled(reminder_type)
        {
            tracing::debug!(%reminder_type, "type disabled, skipping");
            return None;
        }

        let advance_minutes = preferences.advance_minutes_for(metadata.reminder_type);
        let notify_at = target - Duration::minutes(i64::from(advance_minutes));

        if notify_at <= now + Duration::minutes(SCHEDULE_GUARD_MINUTES) {
            tracing::debug!(
                %target,
                %notify_at,
                advance_minutes,
                "notify instant is imminent or past, skipping"
            );
            return None;
        }

        // One live trigger per saved reminder: clear prior entries first.
        if let Some(reminder_id) = metadata.reminder_id.as_ref().filter(|id| !id.is_draft()) {
            self.cancel_all_for_reminder(reminder_id).await;
        }

        let body = if advance_minutes > 0 {
            format!("{body} (in {advance_minutes} min)")
        } else {
            body
        };

        let payload = NotificationPayload {
            metadata,
            scheduled_at: target,
            notify_at,
            advance_minutes,
        };
        let content = NotificationContent::new(title, body, payload)
            .with_sound(preferences.sound)
            .with_badge(1);

        match self.backend.register_one_shot(content, notify_at).await {
            Ok(id) => {
                tracing::info!(%id, %notify_at, "scheduled notification");
                Some(id)
            }
            Err(error) => {
                tracing::warn!(%error, "platform refused the trigger registration");
                None
            }
        }
    }

    /// Compute the next occurrence of `frequency`, anchored at today's
    /// `{hour, minute}`, and register a single notification for it.
    /// Recurrence is never expressed as a repeating platform trigger:
    /// each completion reschedules the next one-shot.
    pub async fn schedule_recurring(
        &self,
        title: impl Into<String>,
        body: impl Into<String>,
        frequency: Frequency,
        hour: u32,
        minute: u32,
        metadata: ReminderMetadata,
    ) -> Option<NotificationId> {
        self.schedule_recurring_with_now(
            title.into(),
            body.into(),
            frequency,
            hour,
            minute,
            metadata,
            Utc::now(),
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn schedule_recurring_with_now(
        &self,
        title: String,
        body: String,
        frequency: Frequency,
        hour: u32,
        minute: u32,
        metadata: ReminderMetadata,
        now: DateTime<Utc>,
    ) -> Option<NotificationId> {
        let Some(base) = now.date_naive().and_hms_opt(hour, minute, 0) else {
            tracing::warn!(hour, minute, "invalid time of day for recurring reminder");
            return None;
        };
        let Some(target) = schedule::next_occurrence(base.and_utc(), frequency, now) else {
            tracing::debug!(%frequency, "no future occurrence to schedule");
            return None;
        };

        self.schedule_with_now(title, body, target, metadata.with_frequency(frequency), now)
            .await
    }

    /// Immediate send. Skips the future guard but still honors the
    /// permission gate and the enabled/type preferences.
    pub async fn notify_now(
        &self,
        title: impl Into<String>,
        body: impl Into<String>,
        metadata: ReminderMetadata,
    ) -> Option<NotificationId> {
        if !self.permission_granted().await {
            return None;
        }

        let preferences = self.preferences.snapshot();
        if !preferences.enabled {
            return None;
        }
        if let Some(reminder_type) = metadata.reminder_type
            && !preferences.is_type_enabled(reminder_type)
        {
            return None;
        }

        let now = Utc::now();
        let payload = NotificationPayload {
            metadata,
            scheduled_at: now,
            notify_at: now,
            advance_minutes: 0,
        };
        let content = NotificationContent::new(title, body, payload)
            .with_sound(preferences.sound);

        match self.backend.register_one_shot(content, now).await {
            Ok(id) => Some(id),
            Err(error) => {
                tracing::warn!(%error, "immediate notification failed");
                None
            }
        }
    }

    pub async fn cancel(&self, id: NotificationId) {
        match self.backend.cancel(id).await {
            Ok(()) => tracing::debug!(%id, "cancelled notification"),
            Err(error) => tracing::warn!(%id, %error, "failed to cancel notification"),
        }
    }

    /// Cancel every pending notification tagged with `reminder_id`.
    /// Queries the platform store fresh rather than trusting any cached
    /// handle the caller may hold.
    pub async fn cancel_all_for_reminder(&self, reminder_id: &ReminderId) {
        let mut cancelled = 0usize;
        for notification in self.pending().await {
            if notification.content.payload.metadata.reminder_id.as_ref() == Some(reminder_id) {
                self.cancel(notification.id).await;
                cancelled += 1;
            }
        }
        if cancelled > 0 {
            tracing::debug!(%reminder_id, cancelled, "cancelled prior notifications for reminder");
        }
    }

    pub async fn cancel_all(&self) {
        match self.backend.cancel_all().await {
            Ok(()) => tracing::debug!("cancelled all notifications"),
            Err(error) => tracing::warn!(%error, "failed to cancel all notifications"),
        }
    }

    /// All currently pending platform records; empty on failure.
    pub async fn pending(&self) -> Vec<PendingNotification> {
        match self.backend.pending().await {
            Ok(pending) => pending,
            Err(error) => {
                tracing::warn!(%error, "failed to query pending notifications");
                Vec::new()
            }
        }
    }

    pub async fn stats(&self) -> NotificationStats {
        let pending = self.pending().await;
        let mut by_type: HashMap<ReminderType, usize> = HashMap::new();
        let mut next_fire: Option<DateTime<Utc>> = None;

        for notification in &pending {
            *by_type
                .entry(notification.content.payload.type_or_other())
                .or_default() += 1;
            if next_fire.is_none_or(|earliest| notification.fire_at < earliest) {
                next_fire = Some(notification.fire_at);
            }
        }

        NotificationStats {
            total: pending.len(),
            by_type,
            next_fire,
        }
    }

    /// Current badge count; 0 when the platform call fails.
    pub async fn badge_count(&self) -> u32 {
        self.backend.get_badge_count().await.unwrap_or_else(|error| {
            tracing::warn!(%error, "failed to read badge count");
            0
        })
    }

    pub async fn set_badge_count(&self, count: u32) {
        if let Err(error) = self.backend.set_badge_count(count).await {
            tracing::warn!(%error, "failed to set badge count");
        }
    }

    pub async fn clear_badge(&self) {
        self.set_badge_count(0).await;
    }

    pub async fn check_permissions(&self) -> PermissionStatus {
        match self.permissions.status().await {
            Ok(status) => status,
            Err(error) => {
                tracing::warn!(%error, "failed to read permission status");
                PermissionStatus::Undetermined
            }
        }
    }

    /// Prompt for the notification permission; `true` when granted.
    pub async fn request_permissions(&self) -> bool {
        match self.permissions.request().await {
            Ok(status) => status.is_granted(),
            Err(error) => {
                tracing::warn!(%error, "permission request failed");
                false
            }
        }
    }

    async fn permission_granted(&self) -> bool {
        self.check_permissions().await.is_granted()
    }

    /// Install the preference-driven delivery filter as the platform's
    /// display handler. Each firing reads a fresh preference snapshot, so
    /// settings changed after scheduling still apply.
    pub fn install_delivery_filter(&self) {
        let preferences = self.preferences.clone();
        self.backend.set_display_handler(Arc::new(move |notification| {
            delivery::decide(
                &preferences.snapshot(),
                notification.content.payload.metadata.reminder_type,
                Utc::now(),
            )
        }));
    }

    /// Install foreground-received and tap listeners; replaces any prior
    /// pair. Received notifications are logged, never rescheduled.
    pub fn start_listeners(&self, on_tap: Option<TapCallback>) {
        self.listeners.start(&self.backend, on_tap);
    }

    pub fn stop_listeners(&self) {
        self.listeners.stop();
    }

    pub fn listeners_active(&self) -> bool {
        self.listeners.is_active()
    }
}
