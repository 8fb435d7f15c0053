//! User notification preferences and the process-wide store.
//!
//! The engine never persists preferences; the embedding app loads and
//! saves them through its own settings storage and pushes updates into
//! the [`PreferenceStore`]. Every scheduling and filtering decision
//! reads a fresh snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::ReminderType;

/// Per-type toggle and lead time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypePreference {
    pub enabled: bool,
    /// Minutes before the fire instant at which the trigger actually fires.
    pub advance_minutes: u32,
}

impl Default for TypePreference {
    fn default() -> Self {
        Self {
            enabled: true,
            advance_minutes: 0,
        }
    }
}

impl TypePreference {
    pub fn new(enabled: bool, advance_minutes: u32) -> Self {
        Self {
            enabled,
            advance_minutes,
        }
    }

    pub fn with_advance(advance_minutes: u32) -> Self {
        Self {
            enabled: true,
            advance_minutes,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            advance_minutes: 0,
        }
    }
}

/// Hour-of-day range during which alerts are muted but not discarded.
/// Wraps past midnight when `end_hour < start_hour`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoNotDisturbWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl DoNotDisturbWindow {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    /// Whether the window is active at the given hour of day.
    /// `[start, end)` same-day, or `hour >= start || hour < end` when the
    /// window wraps midnight.
    pub fn contains_hour(&self, hour: u32) -> bool {
        if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

/// One process-wide record of the user's notification preferences.
///
/// Initialized with defaults at process start and mutated only through
/// explicit [`PreferenceStore`] updates driven by the settings screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPreferences {
    /// Global kill switch. Off means nothing schedules and nothing shows.
    pub enabled: bool,
    pub sound: bool,
    pub do_not_disturb: Option<DoNotDisturbWindow>,
    pub type_preferences: HashMap<ReminderType, TypePreference>,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            enabled: true,
            sound: true,
            do_not_disturb: None,
            type_preferences: ReminderType::ALL
                .into_iter()
                .map(|reminder_type| (reminder_type, TypePreference::default()))
                .collect(),
        }
    }
}

impl NotificationPreferences {
    /// All notifications off; useful as a settings-screen starting point.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_sound(mut self, sound: bool) -> Self {
        self.sound = sound;
        self
    }

    pub fn with_do_not_disturb(mut self, window: DoNotDisturbWindow) -> Self {
        self.do_not_disturb = Some(window);
        self
    }

    pub fn with_type_preference(
        mut self,
        reminder_type: ReminderType,
        preference: TypePreference,
    ) -> Self {
        self.type_preferences.insert(reminder_type, preference);
        self
    }

    /// A type with no stored preference is treated as enabled.
    pub fn is_type_enabled(&self, reminder_type: ReminderType) -> bool {
        self.type_preferences
            .get(&reminder_type)
            .map(|preference| preference.enabled)
            .unwrap_or(true)
    }

    /// Advance lead for a typed notification; untyped or unconfigured
    /// notifications get no lead.
    pub fn advance_minutes_for(&self, reminder_type: Option<ReminderType>) -> u32 {
        reminder_type
            .and_then(|reminder_type| self.type_preferences.get(&reminder_type))
            .map(|preference| preference.advance_minutes)
            .unwrap_or(0)
    }

    pub fn is_in_do_not_disturb(&self, at: DateTime<Utc>) -> bool {
        self.do_not_disturb
            .is_some_and(|window| window.contains_hour(at.hour()))
    }
}

/// Cheap-to-clone handle to the process-wide preference record.
///
/// Reads go through [`snapshot`](Self::snapshot) so concurrent callers
/// always see a consistent record; writers replace or mutate under the
/// lock. There is deliberately no caching on the read side.
#[derive(Debug, Clone, Default)]
pub struct PreferenceStore {
    inner: Arc<RwLock<NotificationPreferences>>,
}

impl PreferenceStore {
    pub fn new(preferences: NotificationPreferences) -> Self {
        Self {
            inner: Arc::new(RwLock::new(preferences)),
        }
    }

    pub fn snapshot(&self) -> NotificationPreferences {
        self.inner.read().clone()
    }

    pub fn replace(&self, preferences: NotificationPreferences) {
        *self.inner.write() = preferences;
    }

    pub fn update(&self, mutate: impl FnOnce(&mut NotificationPreferences)) {
        mutate(&mut self.inner.write());
    }
}
