// Display-time filtering of an about-to-show notification.
//
// The platform consults this immediately before presenting a fired
// trigger; the decision is recomputed from a fresh preference snapshot
// every time, so settings changed after scheduling still apply.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ReminderType;
use super::preferences::NotificationPreferences;

/// How the platform should present a notification that is about to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryDecision {
    pub show_alert: bool,
    pub play_sound: bool,
    pub set_badge: bool,
    pub show_in_list: bool,
}

impl DeliveryDecision {
    /// Drop the notification entirely.
    pub fn suppressed() -> Self {
        Self {
            show_alert: false,
            play_sound: false,
            set_badge: false,
            show_in_list: false,
        }
    }

    /// Mute the disruption but keep the notification reviewable: no alert
    /// or sound, badge still set, still listed. Do-not-disturb mutes
    /// existence of noise, not existence of the notification.
    pub fn muted() -> Self {
        Self {
            show_alert: false,
            play_sound: false,
            set_badge: true,
            show_in_list: true,
        }
    }

    pub fn shown(play_sound: bool) -> Self {
        Self {
            show_alert: true,
            play_sound,
            set_badge: true,
            show_in_list: true,
        }
    }
}

/// Decide presentation from the current preferences.
///
/// Order matters: the global kill switch wins over everything, the
/// do-not-disturb window wins over per-type filtering (a muted
/// notification stays reviewable even for a type the user later
/// disabled), and only then does the type filter suppress.
pub fn decide(
    preferences: &NotificationPreferences,
    reminder_type: Option<ReminderType>,
    at: DateTime<Utc>,
) -> DeliveryDecision {
    if !preferences.enabled {
        return DeliveryDecision::suppressed();
    }

    if preferences.is_in_do_not_disturb(at) {
        return DeliveryDecision::muted();
    }

    if let Some(reminder_type) = reminder_type
        && !preferences.is_type_enabled(reminder_type)
    {
        return DeliveryDecision::suppressed();
    }

    DeliveryDecision::shown(preferences.sound)
}
