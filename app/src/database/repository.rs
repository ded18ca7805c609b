//! Repository layer for database operations
//!
//! Key-value entries back the ledger and settings services;
//! scheduled notification rows back the local notification facility.

use super::models::*;
use crate::error::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a stored value by key
    pub async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    /// Insert or overwrite a stored value
    pub async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        tracing::debug!("Set value for key: {}", key);
        Ok(())
    }

    /// Remove a stored value
    pub async fn remove_value(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Removed key: {}", key);
        Ok(())
    }

    /// Register a notification to be delivered at `trigger_time`
    pub async fn create_scheduled_notification(
        &self,
        trigger_time: DateTime<Utc>,
        title: &str,
        body: &str,
    ) -> Result<ScheduledNotification> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let notification = sqlx::query_as::<_, ScheduledNotification>(
            r#"
            INSERT INTO scheduled_notifications
                (id, trigger_time, title, body, delivered, created_at)
            VALUES (?, ?, ?, ?, 0, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(trigger_time)
        .bind(title)
        .bind(body)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Scheduled notification {} at {}", id, trigger_time);
        Ok(notification)
    }

    /// List pending (not yet delivered) notifications, soonest first
    pub async fn list_pending_notifications(&self) -> Result<Vec<ScheduledNotification>> {
        let notifications = sqlx::query_as::<_, ScheduledNotification>(
            r#"
            SELECT * FROM scheduled_notifications WHERE delivered = 0 ORDER BY trigger_time ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    /// Drop every notification row, pending and delivered, returning how
    /// many were removed
    pub async fn delete_all_notifications(&self) -> Result<u64> {
        let removed = sqlx::query("DELETE FROM scheduled_notifications")
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!("Deleted {} notifications", removed);
        Ok(removed)
    }

    /// Mark notification as delivered
    pub async fn mark_notification_delivered(&self, id: &str) -> Result<()> {
        sqlx::query("UPDATE scheduled_notifications SET delivered = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Marked notification as delivered: {}", id);
        Ok(())
    }
}
