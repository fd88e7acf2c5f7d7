use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use clap::Parser;
use eventlog_server::{PageLimits, ServerConfig};
use eventlog_settings::EventlogSettings;
use eventlog_store::Database;
use eventlog_telemetry::TelemetryConfig;
use tracing::Level;

/// Event-logging HTTP service backed by SQLite.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Settings file (defaults to $EVENTLOG_SETTINGS or ~/.eventlog/settings.json).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the listen port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the database path.
    #[arg(long)]
    db: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings_path = cli.config.unwrap_or_else(eventlog_settings::settings_path);
    let loaded = eventlog_settings::load_settings_with_report(&settings_path)
        .with_context(|| format!("loading settings from {}", settings_path.display()))?;
    let mut settings = loaded.settings;
    if let Some(port) = cli.port {
        settings.server.port = port;
    }
    if let Some(db) = cli.db {
        settings.database.path = db;
    }

    eventlog_telemetry::init_telemetry(&telemetry_config(&settings))?;
    for rejected in &loaded.rejected {
        rejected.log();
    }

    tracing::info!(settings = %settings_path.display(), "Starting eventlog server");

    let db = Database::open(&settings.database.path)
        .with_context(|| format!("opening database {}", settings.database.path.display()))?;

    let config = ServerConfig {
        host: settings.server.host.clone(),
        port: settings.server.port,
        limits: PageLimits {
            default_limit: settings.server.default_page_limit,
            max_limit: settings.server.max_page_limit,
        },
    };
    let handle = eventlog_server::start(config, db)
        .await
        .context("starting HTTP server")?;

    tracing::info!(addr = %handle.local_addr(), "eventlog server ready");

    tokio::signal::ctrl_c()
        .await
        .context("listening for ctrl-c")?;

    tracing::info!("Shutting down");
    handle.shutdown().await;
    Ok(())
}

/// Map logging settings onto the telemetry config. Unknown level names fall
/// back to `info` with a warning on stderr, since tracing is not up yet.
fn telemetry_config(settings: &EventlogSettings) -> TelemetryConfig {
    let parse = |name: &str| {
        Level::from_str(name).unwrap_or_else(|_| {
            eprintln!("eventlog: unknown log level {name:?}, using info");
            Level::INFO
        })
    };
    TelemetryConfig {
        log_level: parse(&settings.logging.level),
        module_levels: settings
            .logging
            .module_levels
            .iter()
            .map(|(module, level)| (module.clone(), parse(level)))
            .collect(),
        json: settings.logging.json,
    }
}
