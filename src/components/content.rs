// Notification content and the payload embedded in platform triggers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::schedule::Frequency;
use super::{PetId, ReminderId, ReminderType};

/// Caller-supplied context attached to a scheduling request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderMetadata {
    pub reminder_type: Option<ReminderType>,
    pub reminder_id: Option<ReminderId>,
    pub pet_id: Option<PetId>,
    pub pet_name: Option<String>,
    pub frequency: Option<Frequency>,
}

impl ReminderMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, reminder_type: ReminderType) -> Self {
        self.reminder_type = Some(reminder_type);
        self
    }

    pub fn with_reminder_id(mut self, reminder_id: ReminderId) -> Self {
        self.reminder_id = Some(reminder_id);
        self
    }

    pub fn with_pet(mut self, pet_id: PetId, pet_name: impl Into<String>) -> Self {
        self.pet_id = Some(pet_id);
        self.pet_name = Some(pet_name.into());
        self
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }
}

/// Data the scheduler embeds in every registered trigger, so the
/// delivery filter and tap handler can recover full context later
/// without consulting a second data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    #[serde(flatten)]
    pub metadata: ReminderMetadata,
    /// Wall-clock instant the reminder's event is due.
    pub scheduled_at: DateTime<Utc>,
    /// When the trigger fires: `scheduled_at` minus the advance lead.
    pub notify_at: DateTime<Utc>,
    pub advance_minutes: u32,
}

impl NotificationPayload {
    /// Category used for grouping; untyped payloads fall back to `Other`.
    pub fn type_or_other(&self) -> ReminderType {
        self.metadata.reminder_type.unwrap_or_default()
    }
}

/// What the platform displays when the trigger fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub payload: NotificationPayload,
    pub sound: bool,
    pub badge: Option<u32>,
}

impl NotificationContent {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        payload: NotificationPayload,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            payload,
            sound: true,
            badge: None,
        }
    }

    pub fn with_sound(mut self, sound: bool) -> Self {
        self.sound = sound;
        self
    }

    pub fn with_badge(mut self, badge: u32) -> Self {
        self.badge = Some(badge);
        self
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn metadata_builder_fills_every_field() {
        let scheduled_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let payload = NotificationPayload {
            metadata: ReminderMetadata::new()
                .with_type(ReminderType::Medication)
                .with_reminder_id(ReminderId::new("rem-42"))
                .with_pet(PetId::new("pet-7"), "Luna")
                .with_frequency(Frequency::Daily),
            scheduled_at,
            notify_at: scheduled_at - chrono::Duration::minutes(15),
            advance_minutes: 15,
        };

        assert_eq!(payload.type_or_other(), ReminderType::Medication);
        assert_eq!(payload.metadata.pet_name.as_deref(), Some("Luna"));
        assert_eq!(payload.metadata.frequency, Some(Frequency::Daily));
        assert_eq!(
            payload.scheduled_at - payload.notify_at,
            chrono::Duration::minutes(i64::from(payload.advance_minutes))
        );
    }

    #[test]
    fn untyped_payload_groups_as_other() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let payload = NotificationPayload {
            metadata: ReminderMetadata::new(),
            scheduled_at: at,
            notify_at: at,
            advance_minutes: 0,
        };
        assert_eq!(payload.type_or_other(), ReminderType::Other);
    }
}
