// Hydration reminder - headless host
// Opens the local database, restores the reminder schedule and delivers
// reminders until interrupted.

use anyhow::Context;
use hydration_reminder::{app, config};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hydration_reminder=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting hydration reminder");

    let app_data_dir = std::env::var_os(config::DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_DATA_DIR));

    let (state, notifier) = app::setup(&app_data_dir)
        .await
        .with_context(|| format!("failed to open data directory {:?}", app_data_dir))?;

    let mut deliveries = notifier.subscribe();
    let dispatcher = notifier.start_dispatcher();

    let schedule = state.start().await;
    let progress = state.progress().await;
    tracing::info!(
        "Today: {}/{} glasses, {} reminders pending",
        progress.count,
        progress.goal,
        schedule.len()
    );

    loop {
        tokio::select! {
            delivered = deliveries.recv() => match delivered {
                Ok(notification) => {
                    let progress = state.progress().await;
                    tracing::info!(
                        "Reminder delivered at {} ({}/{} glasses today)",
                        notification.trigger_time,
                        progress.count,
                        progress.goal
                    );

                    state.reminder_delivered().await;
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Missed {} reminder deliveries", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    dispatcher.abort();
    Ok(())
}
