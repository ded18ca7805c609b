//! Reminders service
//!
//! Turns the notification settings into a concrete schedule. Every change
//! cancels all pending reminders and registers a fresh batch covering the
//! next day; there is no persistent repeating timer.

use crate::clock::Clock;
use crate::config::{
    MAX_PENDING_REMINDERS, REMINDER_HORIZON_HOURS, REMINDER_MESSAGES, REMINDER_TITLE,
};
use crate::database::ScheduledNotification;
use crate::error::Result;
use crate::services::notifier::NotificationFacility;
use crate::services::settings::{clamp_interval, NotificationSettings, SettingsService};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Trigger times for one configure call: `now + k * interval`, within the
/// horizon and capped at the platform's pending-notification limit.
pub fn plan_reminders(now: DateTime<Utc>, interval_hours: f64) -> Vec<DateTime<Utc>> {
    let step_ms = (clamp_interval(interval_hours) * 3_600_000.0).round() as i64;
    let step = Duration::milliseconds(step_ms);
    let horizon = now + Duration::hours(REMINDER_HORIZON_HOURS);

    (1..)
        .map(|k: i32| now + step * k)
        .take_while(|trigger| *trigger <= horizon)
        .take(MAX_PENDING_REMINDERS)
        .collect()
}

#[derive(Clone)]
pub struct ReminderScheduler {
    settings: SettingsService,
    facility: Arc<dyn NotificationFacility>,
    clock: Arc<dyn Clock>,
    configure_lock: Arc<Mutex<()>>,
}

impl ReminderScheduler {
    pub fn new(
        settings: SettingsService,
        facility: Arc<dyn NotificationFacility>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            facility,
            clock,
            configure_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Persist the reminder settings and rebuild the schedule from scratch
    pub async fn configure(
        &self,
        enabled: bool,
        interval_hours: f64,
    ) -> Result<Vec<ScheduledNotification>> {
        let _guard = self.configure_lock.lock().await;

        let interval = clamp_interval(interval_hours);
        if interval != interval_hours {
            tracing::warn!(
                "Reminder interval {} out of range, using {:.2}h",
                interval_hours,
                interval
            );
        }

        self.settings.update_notifications(enabled, interval).await?;
        self.facility.cancel_all().await?;

        if !enabled {
            tracing::info!("Reminders disabled");
            return Ok(Vec::new());
        }

        let now = self.clock.now().with_timezone(&Utc);
        let triggers = plan_reminders(now, interval);
        let offset = rand::thread_rng().gen_range(0..REMINDER_MESSAGES.len());

        for (i, trigger) in triggers.iter().enumerate() {
            let body = REMINDER_MESSAGES[(offset + i) % REMINDER_MESSAGES.len()];

            if let Err(e) = self.facility.schedule_one(*trigger, REMINDER_TITLE, body).await {
                tracing::error!("Failed to schedule reminder at {}: {}", trigger, e);
                if let Err(cancel_err) = self.facility.cancel_all().await {
                    tracing::error!("Failed to roll back partial schedule: {}", cancel_err);
                }
                return Err(e);
            }
        }

        tracing::info!(
            "Scheduled {} reminders every {:.2}h",
            triggers.len(),
            interval
        );

        self.facility.list_scheduled().await
    }

    /// Ask the platform for notification permission; never fails
    pub async fn request_permission(&self) -> bool {
        match self.facility.request_permission().await {
            Ok(true) => {
                tracing::info!("Notification permission granted");
                true
            }
            Ok(false) => {
                tracing::warn!("Notification permission not granted");
                false
            }
            Err(e) => {
                tracing::error!("Failed to request notification permission: {}", e);
                false
            }
        }
    }

    /// Pending reminders as reported by the platform
    pub async fn scheduled(&self) -> Result<Vec<ScheduledNotification>> {
        self.facility.list_scheduled().await
    }

    /// Re-apply the stored settings, e.g. after an app restart
    pub async fn resume(&self) -> Result<Vec<ScheduledNotification>> {
        let NotificationSettings {
            enabled, interval, ..
        } = self.settings.load().await?;

        tracing::info!("Restoring reminder schedule");
        self.configure(enabled, interval).await
    }

    /// Start the next batch once every pending reminder has been delivered.
    ///
    /// Returns the pending schedule. A non-empty schedule, or disabled
    /// reminders, leave the facility untouched.
    pub async fn renew_if_exhausted(&self) -> Result<Vec<ScheduledNotification>> {
        let pending = self.facility.list_scheduled().await?;
        if !pending.is_empty() {
            return Ok(pending);
        }

        let NotificationSettings {
            enabled, interval, ..
        } = self.settings.load().await?;
        if !enabled {
            return Ok(pending);
        }

        tracing::info!("Reminder batch used up, scheduling the next one");
        self.configure(enabled, interval).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::AppError;
    use crate::services::settings::Theme;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use chrono::{Local, TimeZone};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// In-memory facility that can be told to fail
    #[derive(Default)]
    struct RecordingFacility {
        scheduled: std::sync::Mutex<Vec<ScheduledNotification>>,
        deny: AtomicBool,
        fail_after: std::sync::Mutex<Option<usize>>,
        cancel_calls: AtomicUsize,
    }

    #[async_trait]
    impl NotificationFacility for RecordingFacility {
        async fn request_permission(&self) -> Result<bool> {
            Ok(!self.deny.load(Ordering::SeqCst))
        }

        async fn schedule_one(
            &self,
            trigger_time: DateTime<Utc>,
            title: &str,
            body: &str,
        ) -> Result<String> {
            if self.deny.load(Ordering::SeqCst) {
                return Err(AppError::PermissionDenied("denied".to_string()));
            }

            let mut scheduled = self.scheduled.lock().unwrap();
            if let Some(limit) = *self.fail_after.lock().unwrap() {
                if scheduled.len() >= limit {
                    return Err(AppError::Scheduling("rejected".to_string()));
                }
            }

            let id = format!("n{}", scheduled.len());
            scheduled.push(ScheduledNotification {
                id: id.clone(),
                trigger_time,
                title: title.to_string(),
                body: body.to_string(),
                delivered: false,
                created_at: Utc::now(),
            });
            Ok(id)
        }

        async fn cancel_all(&self) -> Result<()> {
            self.cancel_calls.fetch_add(1, Ordering::SeqCst);
            self.scheduled.lock().unwrap().clear();
            Ok(())
        }

        async fn list_scheduled(&self) -> Result<Vec<ScheduledNotification>> {
            Ok(self.scheduled.lock().unwrap().clone())
        }
    }

    fn start() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap()
    }

    fn create_test_scheduler() -> (ReminderScheduler, Arc<RecordingFacility>, SettingsService) {
        let store = Arc::new(MemoryStore::new());
        let settings = SettingsService::new(store);
        let facility = Arc::new(RecordingFacility::default());
        let clock = Arc::new(ManualClock::new(start()));
        let scheduler = ReminderScheduler::new(settings.clone(), facility.clone(), clock);
        (scheduler, facility, settings)
    }

    #[test]
    fn test_plan_reminders_spacing() {
        let now = start().with_timezone(&Utc);

        let plan = plan_reminders(now, 2.0);
        assert_eq!(plan.len(), 12);
        assert_eq!(plan[0], now + Duration::hours(2));
        assert_eq!(plan[11], now + Duration::hours(24));

        assert_eq!(plan_reminders(now, 1.0).len(), 24);
        assert_eq!(plan_reminders(now, 4.0).len(), 6);
    }

    #[test]
    fn test_plan_reminders_capped_and_clamped() {
        let now = start().with_timezone(&Utc);

        let plan = plan_reminders(now, 0.01);
        assert_eq!(plan.len(), MAX_PENDING_REMINDERS);
        assert_eq!(plan[0], now + Duration::seconds(36));

        // Out-of-range input behaves like the nearest bound
        assert_eq!(plan_reminders(now, 12.0), plan_reminders(now, 4.0));
        assert_eq!(plan_reminders(now, -1.0), plan);
    }

    #[tokio::test]
    async fn test_configure_disabled_leaves_nothing_scheduled() {
        let (scheduler, facility, settings) = create_test_scheduler();

        scheduler.configure(true, 1.0).await.unwrap();
        assert!(!scheduler.scheduled().await.unwrap().is_empty());

        let schedule = scheduler.configure(false, 1.0).await.unwrap();
        assert!(schedule.is_empty());
        assert!(scheduler.scheduled().await.unwrap().is_empty());
        assert!(facility.cancel_calls.load(Ordering::SeqCst) >= 2);
        assert!(!settings.load().await.unwrap().enabled);
    }

    #[tokio::test]
    async fn test_reconfigure_replaces_previous_schedule() {
        let (scheduler, _facility, _settings) = create_test_scheduler();
        let now = start().with_timezone(&Utc);

        scheduler.configure(true, 2.0).await.unwrap();
        let schedule = scheduler.configure(true, 1.0).await.unwrap();

        let triggers: Vec<_> = schedule.iter().map(|n| n.trigger_time).collect();
        assert_eq!(triggers, plan_reminders(now, 1.0));
        assert!(schedule.iter().all(|n| n.title == REMINDER_TITLE));
    }

    #[tokio::test]
    async fn test_configure_persists_and_keeps_theme() {
        let (scheduler, _facility, settings) = create_test_scheduler();

        settings.set_theme(Theme::Dark).await.unwrap();
        scheduler.configure(true, 2.5).await.unwrap();

        let loaded = settings.load().await.unwrap();
        assert!(loaded.enabled);
        assert_eq!(loaded.interval, 2.5);
        assert_eq!(loaded.theme, Theme::Dark);
    }

    #[tokio::test]
    async fn test_configure_clamps_interval() {
        let (scheduler, _facility, settings) = create_test_scheduler();

        let schedule = scheduler.configure(true, 9.0).await.unwrap();

        assert_eq!(schedule.len(), 6);
        assert_eq!(settings.load().await.unwrap().interval, 4.0);
    }

    #[tokio::test]
    async fn test_scheduling_failure_rolls_back() {
        let (scheduler, facility, _settings) = create_test_scheduler();
        *facility.fail_after.lock().unwrap() = Some(3);

        let result = scheduler.configure(true, 1.0).await;

        assert!(matches!(result, Err(AppError::Scheduling(_))));
        assert!(scheduler.scheduled().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_permission_denied() {
        let (scheduler, facility, _settings) = create_test_scheduler();
        facility.deny.store(true, Ordering::SeqCst);

        assert!(!scheduler.request_permission().await);

        let result = scheduler.configure(true, 1.0).await;
        assert!(matches!(result, Err(AppError::PermissionDenied(_))));
        assert!(scheduler.scheduled().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resume_uses_stored_settings() {
        let (scheduler, _facility, settings) = create_test_scheduler();

        settings.update_notifications(true, 4.0).await.unwrap();
        assert_eq!(scheduler.resume().await.unwrap().len(), 6);

        settings.update_notifications(false, 4.0).await.unwrap();
        assert!(scheduler.resume().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_renew_starts_next_batch_when_all_delivered() {
        let (scheduler, facility, _settings) = create_test_scheduler();

        scheduler.configure(true, 4.0).await.unwrap();
        let cancels = facility.cancel_calls.load(Ordering::SeqCst);

        // Pending reminders are left as they are
        assert_eq!(scheduler.renew_if_exhausted().await.unwrap().len(), 6);
        assert_eq!(facility.cancel_calls.load(Ordering::SeqCst), cancels);

        facility.scheduled.lock().unwrap().clear();

        let renewed = scheduler.renew_if_exhausted().await.unwrap();
        assert_eq!(renewed.len(), 6);
        assert_eq!(scheduler.scheduled().await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_renew_does_nothing_when_disabled() {
        let (scheduler, facility, _settings) = create_test_scheduler();

        scheduler.configure(false, 1.0).await.unwrap();
        let cancels = facility.cancel_calls.load(Ordering::SeqCst);

        assert!(scheduler.renew_if_exhausted().await.unwrap().is_empty());
        assert!(scheduler.scheduled().await.unwrap().is_empty());
        assert_eq!(facility.cancel_calls.load(Ordering::SeqCst), cancels);
    }
}
