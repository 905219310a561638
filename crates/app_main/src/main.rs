//! PhotoSelect - pick the keepers out of a folder of photos
//!
//! Main entry point.

mod shell;

use anyhow::Result;

fn main() -> Result<()> {
    // Initialize logging and panic hook first
    let _log_guard = app_log::init()?;

    // Clean up old logs (7 days)
    if let Err(e) = app_log::cleanup_old_logs(7) {
        tracing::warn!("Failed to cleanup old logs: {}", e);
    }

    tracing::info!("PhotoSelect starting...");

    // Load configuration
    let config = match app_core::AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Invalid configuration, using defaults: {}", e);
            app_core::AppConfig::default()
        }
    };

    let result = shell::run(&config);
    tracing::info!("PhotoSelect exiting");
    result
}
