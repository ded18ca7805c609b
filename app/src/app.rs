//! Application state and initialization
//!
//! `AppState` is the handle the UI layer holds. It wires the services
//! together and is the one place where service errors are logged and
//! replaced by safe defaults, so no screen ever sees a failure.

use crate::clock::{Clock, SystemClock};
use crate::config::{DATABASE_FILE_NAME, DEFAULT_DAILY_GOAL};
use crate::database::{create_pool, Repository, ScheduledNotification};
use crate::error::Result;
use crate::services::{
    AccentColor, DailyEntry, LedgerService, LocalNotifier, NotificationFacility,
    NotificationSettings, Progress, ReminderScheduler, SettingsService, Theme, UserProfile,
};
use crate::storage::KeyValueStore;
use std::path::Path;
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub ledger: LedgerService,
    pub settings: SettingsService,
    pub reminders: ReminderScheduler,
}

impl AppState {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        facility: Arc<dyn NotificationFacility>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ledger = LedgerService::new(store.clone(), clock.clone());
        let settings = SettingsService::new(store);
        let reminders = ReminderScheduler::new(settings.clone(), facility, clock);

        Self {
            ledger,
            settings,
            reminders,
        }
    }

    /// Startup sequence: ask for permission, then restore the reminder schedule
    pub async fn start(&self) -> Vec<ScheduledNotification> {
        self.reminders.request_permission().await;
        recover("restore reminders", self.reminders.resume().await, Vec::new)
    }

    /// Glasses drunk today; the last known count if storage cannot be read
    pub async fn today_count(&self) -> u32 {
        recover("load today's count", self.ledger.today_count().await, || {
            self.ledger.last_known_count()
        })
    }

    /// Record one glass and return today's count
    pub async fn drink_glass(&self) -> u32 {
        recover("record glass", self.ledger.increment_today().await, || {
            self.ledger.last_known_count()
        })
    }

    pub async fn history(&self) -> Vec<DailyEntry> {
        recover("load history", self.ledger.history().await, Vec::new)
    }

    pub async fn goal(&self) -> u32 {
        recover("load goal", self.ledger.goal().await, || DEFAULT_DAILY_GOAL)
    }

    /// Store a goal (values below 1 become 1) and return the goal now in effect
    pub async fn set_goal(&self, goal: i64) -> u32 {
        match self.ledger.set_goal(goal).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!("Failed to save goal: {}", e);
                self.goal().await
            }
        }
    }

    pub async fn progress(&self) -> Progress {
        Progress {
            count: self.today_count().await,
            goal: self.goal().await,
        }
    }

    pub async fn profile(&self) -> UserProfile {
        recover("load profile", self.settings.profile().await, UserProfile::default)
    }

    /// Returns whether the name was saved
    pub async fn set_user_name(&self, name: &str) -> bool {
        recover(
            "save user name",
            self.settings.set_user_name(name).await.map(|_| true),
            || false,
        )
    }

    pub async fn notification_settings(&self) -> NotificationSettings {
        recover(
            "load settings",
            self.settings.load().await,
            NotificationSettings::default,
        )
    }

    /// Returns whether the theme was saved
    pub async fn set_theme(&self, theme: Theme) -> bool {
        recover(
            "save theme",
            self.settings.set_theme(theme).await.map(|_| true),
            || false,
        )
    }

    /// Returns whether the accent color was saved
    pub async fn set_accent_color(&self, color: AccentColor) -> bool {
        recover(
            "save accent color",
            self.settings.set_accent_color(color).await.map(|_| true),
            || false,
        )
    }

    /// Save reminder settings and return the resulting schedule (empty on failure)
    pub async fn save_reminder_settings(
        &self,
        enabled: bool,
        interval_hours: f64,
    ) -> Vec<ScheduledNotification> {
        recover(
            "configure reminders",
            self.reminders.configure(enabled, interval_hours).await,
            Vec::new,
        )
    }

    pub async fn request_permission(&self) -> bool {
        self.reminders.request_permission().await
    }

    pub async fn scheduled_reminders(&self) -> Vec<ScheduledNotification> {
        recover("list reminders", self.reminders.scheduled().await, Vec::new)
    }

    /// Called after a reminder is delivered; schedules the next day's batch
    /// once the current one is used up and returns what is pending.
    pub async fn reminder_delivered(&self) -> Vec<ScheduledNotification> {
        recover(
            "renew reminders",
            self.reminders.renew_if_exhausted().await,
            Vec::new,
        )
    }
}

fn recover<T>(action: &str, result: Result<T>, fallback: impl FnOnce() -> T) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::error!("Failed to {}: {}", action, e);
            fallback()
        }
    }
}

/// Application setup - called once on startup.
///
/// Opens the database in `app_data_dir` and returns the state together with
/// the notifier whose dispatcher the caller should start.
pub async fn setup(app_data_dir: &Path) -> Result<(AppState, LocalNotifier)> {
    tracing::info!("Initializing application");
    tracing::info!("App data directory: {:?}", app_data_dir);

    std::fs::create_dir_all(app_data_dir)?;

    let pool = create_pool(&app_data_dir.join(DATABASE_FILE_NAME)).await?;
    let repo = Repository::new(pool);
    let notifier = LocalNotifier::new(repo.clone());

    let state = AppState::new(
        Arc::new(repo),
        Arc::new(notifier.clone()),
        Arc::new(SystemClock),
    );

    tracing::info!("Application initialized successfully");

    Ok((state, notifier))
}
