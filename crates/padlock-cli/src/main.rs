use anyhow::Result;
use clap::Parser;
use padlock_cli::{EmulatorConfig, emulator, logging};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Padlock firmware emulator.
#[derive(Parser, Debug)]
#[command(name = "padlock-emulator")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the link listen address
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Override the record database path
    #[arg(long)]
    database: Option<String>,

    /// Log filter, e.g. "info" or "padlock_firmware=debug"; RUST_LOG wins when set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = logging::filter(std::env::var(EnvFilter::DEFAULT_ENV).ok(), &args.log_level);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = EmulatorConfig::load(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        config.link.listen_addr = listen;
    }
    if let Some(database) = args.database {
        config.padlock.storage.database_path = database;
    }

    info!("padlock-emulator {}", padlock_core::VERSION);
    emulator::run(config, async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted");
        }
    })
    .await
}
