//! MakerLab Tools entry point.
//!
//! Initializes logging, loads configuration, and runs either the HTTP
//! service or a one-off manual synchronization.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use makerlab_tools::core::{Config, HttpTransport, MakerlabServer};

#[derive(Debug, Parser)]
#[command(name = "makerlab-tools", version, about = "MakerLab tool catalog and manual chat service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service (default).
    Serve,
    /// Upload the manuals of every tool and rewrite their resource references.
    SyncAll,
    /// Synchronize a single tool record.
    Sync {
        /// AirTable record id (`rec...`).
        record_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from environment
    let config = Config::from_env();

    // Initialize logging
    init_logging(&config.logging.level);

    config.validate()?;

    info!("Starting {} v{}", config.server.name, config.server.version);

    let server = MakerlabServer::new(config.clone())?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let transport = HttpTransport::new(config.http);
            transport.run(server).await?;
            info!("Server shutting down");
        }
        Command::SyncAll => {
            let report = server.sync_job().sync_all().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Sync { record_id } => {
            let outcome = server.sync_job().sync_record(&record_id).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}

/// Initialize the logging subsystem.
///
/// Configures tracing with the specified log level and format.
fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
