//! Settings service
//!
//! Persists notification and appearance settings as one JSON object and the
//! user's display name as a plain string.

use crate::config::{
    DEFAULT_INTERVAL_HOURS, INTERVAL_STEP_HOURS, MAX_INTERVAL_HOURS, MIN_INTERVAL_HOURS,
    NOTIFICATION_SETTINGS_KEY, USERNAME_KEY,
};
use crate::error::{AppError, Result};
use crate::storage::KeyValueStore;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

/// Base color scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Accent color applied on top of the theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccentColor {
    #[default]
    Blue,
    Green,
    Purple,
    Orange,
}

/// Reminder and appearance settings, stored together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Hours between reminders
    #[serde(
        default = "default_interval",
        deserialize_with = "deserialize_interval"
    )]
    pub interval: f64,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub color: AccentColor,
}

fn default_enabled() -> bool {
    true
}

fn default_interval() -> f64 {
    DEFAULT_INTERVAL_HOURS
}

/// Older saves wrote the interval as a string; anything unusable falls back to the default.
fn deserialize_interval<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    Ok(parsed
        .filter(|hours| hours.is_finite() && *hours > 0.0)
        .map_or(DEFAULT_INTERVAL_HOURS, clamp_interval))
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval: default_interval(),
            theme: Theme::default(),
            color: AccentColor::default(),
        }
    }
}

/// Clamp an interval to `[0.01, 4.0]` hours on the 0.01 grid.
/// Non-finite input yields the default interval.
pub fn clamp_interval(hours: f64) -> f64 {
    if !hours.is_finite() {
        return DEFAULT_INTERVAL_HOURS;
    }

    let steps_per_hour = (1.0 / INTERVAL_STEP_HOURS).round();
    let snapped = (hours * steps_per_hour).round() / steps_per_hour;
    snapped.clamp(MIN_INTERVAL_HOURS, MAX_INTERVAL_HOURS)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
}

/// Service for managing application settings
#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn KeyValueStore>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load settings or create defaults if none are stored
    pub async fn load(&self) -> Result<NotificationSettings> {
        let Some(raw) = self.store.get(NOTIFICATION_SETTINGS_KEY).await? else {
            tracing::info!("Notification settings not found, creating defaults");
            let default = NotificationSettings::default();
            self.save(&default).await?;
            return Ok(default);
        };

        serde_json::from_str(&raw)
            .map_err(|e| AppError::StorageRead(format!("Failed to parse settings: {}", e)))
    }

    /// Overwrite the stored settings
    pub async fn save(&self, settings: &NotificationSettings) -> Result<()> {
        let raw = serde_json::to_string(settings)?;
        self.store.set(NOTIFICATION_SETTINGS_KEY, &raw).await?;

        tracing::info!(
            "Settings saved (enabled: {}, interval: {:.2}h, theme: {:?}, color: {:?})",
            settings.enabled,
            settings.interval,
            settings.theme,
            settings.color
        );
        Ok(())
    }

    /// Update reminder fields, keeping theme and color
    pub async fn update_notifications(
        &self,
        enabled: bool,
        interval: f64,
    ) -> Result<NotificationSettings> {
        let mut settings = self.load_or_default().await;
        settings.enabled = enabled;
        settings.interval = clamp_interval(interval);
        self.save(&settings).await?;
        Ok(settings)
    }

    /// Switch between light and dark, keeping everything else
    pub async fn set_theme(&self, theme: Theme) -> Result<NotificationSettings> {
        let mut settings = self.load_or_default().await;
        settings.theme = theme;
        self.save(&settings).await?;
        Ok(settings)
    }

    /// Change the accent color, keeping everything else
    pub async fn set_accent_color(&self, color: AccentColor) -> Result<NotificationSettings> {
        let mut settings = self.load_or_default().await;
        settings.color = color;
        self.save(&settings).await?;
        Ok(settings)
    }

    pub async fn profile(&self) -> Result<UserProfile> {
        let name = self.store.get(USERNAME_KEY).await?.unwrap_or_default();
        Ok(UserProfile { name })
    }

    pub async fn set_user_name(&self, name: &str) -> Result<UserProfile> {
        self.store.set(USERNAME_KEY, name).await?;
        tracing::info!("User name updated");
        Ok(UserProfile {
            name: name.to_string(),
        })
    }

    /// Settings to merge into; an unreadable object is replaced rather than blocking the save
    async fn load_or_default(&self) -> NotificationSettings {
        match self.load().await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!("Failed to load settings, starting from defaults: {}", e);
                NotificationSettings::default()
            }
        }
    }
}
