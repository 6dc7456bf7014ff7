//! Carepulse: patient intake and appointment booking
//!
//! Main entry point for the terminal application.

use anyhow::{anyhow, Result};
use std::io::IsTerminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use carepulse::adapters::sanitize::SanitizingMakeWriter;
use carepulse::config::AppConfig;
use carepulse::tui::App;
use carepulse::Route;

fn main() -> Result<()> {
    let config = AppConfig::from_env();

    // Optional start path, e.g. `carepulse /patients/<id>/new-appointment`.
    let start = std::env::args()
        .nth(1)
        .map(|path| Route::parse(&path).ok_or_else(|| anyhow!("Unknown route: {path}")))
        .transpose()?;

    // Initialize logging.
    //
    // IMPORTANT: writing logs to the terminal will corrupt the TUI (alternate screen).
    // In auto mode an interactive TTY logs to a file, anything else to stdout.
    let interactive = std::io::stdout().is_terminal();

    let (writer, _guard) = if config.log_mode.use_file(interactive) {
        if let Some(parent) = config.log_file.parent() {
            // Best-effort: don't fail startup just because the directory is missing.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    tracing::info!("Starting Carepulse...");

    let mut app = App::new(&config)?;
    if let Some(route) = start {
        app.open(route);
    }
    app.run()?;

    tracing::info!("Carepulse shutdown complete.");
    Ok(())
}
