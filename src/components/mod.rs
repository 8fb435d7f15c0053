// Core types for the reminder notification engine.
// The scheduler, delivery filter, and lifecycle listeners all speak in
// terms of the identifiers and categories defined here.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod content;
pub mod delivery;
pub mod lifecycle;
pub mod platform;
pub mod preferences;
pub mod schedule;

pub use content::{NotificationContent, NotificationPayload, ReminderMetadata};
pub use delivery::DeliveryDecision;
pub use lifecycle::{ListenerRegistration, TapCallback};
pub use platform::{
    BackendFuture, DisplayHandler, NotificationEvent, PendingNotification, PermissionGate,
    PermissionStatus, PlatformBackend,
};
pub use preferences::{
    DoNotDisturbWindow, NotificationPreferences, PreferenceStore, TypePreference,
};
pub use schedule::{Frequency, MIN_FUTURE_MARGIN_MINUTES, UnknownFrequency, next_occurrence};

/// Reminder categories. Per-type preferences (enable flag, advance lead)
/// key off this; `Other` is the catch-all for notifications that carry
/// no category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReminderType {
    Medication,
    Hygiene,
    Food,
    Visit,
    #[default]
    Other,
}

impl ReminderType {
    pub const ALL: [ReminderType; 5] = [
        ReminderType::Medication,
        ReminderType::Hygiene,
        ReminderType::Food,
        ReminderType::Visit,
        ReminderType::Other,
    ];

    /// Wire name, matching the values the app stores on reminder records.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderType::Medication => "MEDICATION",
            ReminderType::Hygiene => "HYGIENE",
            ReminderType::Food => "FOOD",
            ReminderType::Visit => "VISIT",
            ReminderType::Other => "OTHER",
        }
    }
}

impl std::fmt::Display for ReminderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque platform-assigned identifier for a registered one-shot trigger.
/// Held by the caller's reminder record and used to cancel later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(Uuid);

impl NotificationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for NotificationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Identifier of a reminder document owned by the embedding app.
///
/// Reminders that have not been saved yet are tagged with the `"new"`
/// draft marker; draft reminders never cancel prior notifications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReminderId(String);

impl ReminderId {
    /// Marker the app uses for a reminder that has not been saved yet.
    pub const DRAFT: &'static str = "new";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn draft() -> Self {
        Self(Self::DRAFT.to_string())
    }

    pub fn is_draft(&self) -> bool {
        self.0 == Self::DRAFT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReminderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the pet a reminder belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PetId(String);

impl PetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failures at the platform boundary.
///
/// Nothing here ever reaches the caller's save workflow: the scheduler
/// catches, logs, and degrades to "notification not scheduled". Guard
/// outcomes (imminent instant, disabled type, missing permission grant)
/// are normal `None` results, not errors.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("platform scheduling failure: {message}")]
    Platform { message: String },

    #[error("notification permission denied")]
    PermissionDenied,
}

impl NotifyError {
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform {
            message: message.into(),
        }
    }
}

pub type NotifyResult<T> = Result<T, NotifyError>;
