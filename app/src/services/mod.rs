//! Services module
//!
//! Business logic services that coordinate between the UI layer and storage.

pub mod ledger;
pub mod notifier;
pub mod reminders;
pub mod settings;

pub use ledger::{DailyEntry, LedgerService, Progress};
pub use notifier::{LocalNotifier, NotificationFacility};
pub use reminders::{plan_reminders, ReminderScheduler};
pub use settings::{
    clamp_interval, AccentColor, NotificationSettings, SettingsService, Theme, UserProfile,
};
