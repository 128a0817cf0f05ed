use std::fs;

use anyhow::Context;
use tracing::Level;

use crate::config::Settings;

/// Routes tracing output to `medreport.log`. The terminal is owned by the UI,
/// so nothing is printed to stdout.
pub fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    let Some(dir) = settings.log_directory() else { return Ok(()) };
    fs::create_dir_all(&dir).with_context(|| format!("could not create log directory {}", dir.display()))?;

    let level: Level = settings.log_level.parse().unwrap_or(Level::INFO);
    let file_appender = tracing_appender::rolling::never(&dir, "medreport.log");
    let subscriber = tracing_subscriber::fmt()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_max_level(level)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("could not install the log subscriber")?;
    Ok(())
}
