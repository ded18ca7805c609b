//! Local notification facility
//!
//! Keeps registered reminders in the database and runs a background
//! dispatcher that delivers due ones every few seconds.

use crate::config::DISPATCH_TICK_SECS;
use crate::database::{Repository, ScheduledNotification};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Host facility for local notifications
#[async_trait]
pub trait NotificationFacility: Send + Sync {
    /// Ask the user for permission; `Ok(false)` means denied
    async fn request_permission(&self) -> Result<bool>;

    /// Register one notification, returning its identifier
    async fn schedule_one(
        &self,
        trigger_time: DateTime<Utc>,
        title: &str,
        body: &str,
    ) -> Result<String>;

    /// Drop every pending notification
    async fn cancel_all(&self) -> Result<()>;

    /// Pending notifications, soonest first
    async fn list_scheduled(&self) -> Result<Vec<ScheduledNotification>>;
}

/// Database-backed notification facility with an in-process dispatcher
#[derive(Clone)]
pub struct LocalNotifier {
    repo: Repository,
    permission_granted: Arc<AtomicBool>,
    delivered_tx: broadcast::Sender<ScheduledNotification>,
}

impl LocalNotifier {
    pub fn new(repo: Repository) -> Self {
        let (delivered_tx, _) = broadcast::channel(64);
        Self {
            repo,
            permission_granted: Arc::new(AtomicBool::new(true)),
            delivered_tx,
        }
    }

    /// Grant or revoke notification permission
    pub fn set_permission(&self, granted: bool) {
        self.permission_granted.store(granted, Ordering::SeqCst);
    }

    /// Receive every notification as it is delivered
    pub fn subscribe(&self) -> broadcast::Receiver<ScheduledNotification> {
        self.delivered_tx.subscribe()
    }

    /// Start the background dispatcher
    pub fn start_dispatcher(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!("Starting notification dispatcher");

            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_secs(DISPATCH_TICK_SECS));

            loop {
                interval.tick().await;

                if let Err(e) = self.deliver_due(Utc::now()).await {
                    tracing::error!("Error delivering notifications: {}", e);
                }
            }
        })
    }

    /// Deliver every pending notification due at `now`
    pub async fn deliver_due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledNotification>> {
        let pending = self.repo.list_pending_notifications().await?;
        let mut delivered = Vec::new();

        for mut notification in pending.into_iter().filter(|n| n.trigger_time <= now) {
            self.repo.mark_notification_delivered(&notification.id).await?;
            notification.delivered = true;

            tracing::info!(
                "Notification {}: {} - {}",
                notification.id,
                notification.title,
                notification.body
            );

            // No subscribers is fine; the log line above is the delivery.
            let _ = self.delivered_tx.send(notification.clone());
            delivered.push(notification);
        }

        Ok(delivered)
    }
}

#[async_trait]
impl NotificationFacility for LocalNotifier {
    async fn request_permission(&self) -> Result<bool> {
        Ok(self.permission_granted.load(Ordering::SeqCst))
    }

    async fn schedule_one(
        &self,
        trigger_time: DateTime<Utc>,
        title: &str,
        body: &str,
    ) -> Result<String> {
        if !self.permission_granted.load(Ordering::SeqCst) {
            return Err(AppError::PermissionDenied(
                "Notifications are not allowed".to_string(),
            ));
        }

        let notification = self
            .repo
            .create_scheduled_notification(trigger_time, title, body)
            .await
            .map_err(|e| AppError::Scheduling(e.to_string()))?;

        Ok(notification.id)
    }

    async fn cancel_all(&self) -> Result<()> {
        let removed = self
            .repo
            .delete_all_notifications()
            .await
            .map_err(|e| AppError::Scheduling(e.to_string()))?;

        tracing::info!("Cancelled {} scheduled notifications", removed);
        Ok(())
    }

    async fn list_scheduled(&self) -> Result<Vec<ScheduledNotification>> {
        self.repo.list_pending_notifications().await
    }
}
