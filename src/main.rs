use std::path::PathBuf;

use clap::Parser;

use technica::config::{load_config_from_env, load_env_file};
use technica::lifecycle::{self, signals, Shutdown};
use technica::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "technica")]
#[command(about = "HTTP service that signs and submits transactions to an Ethereum contract", long_about = None)]
struct Args {
    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dotenv file to load (defaults to ./.env if present).
    #[arg(short, long)]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        tracing::error!(error = %e, "Fatal error");
        eprintln!("technica: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logging is not configured yet; env file problems surface through the
    // returned error.
    load_env_file(args.env_file.as_deref())?;
    let config = load_config_from_env(args.config.as_deref())?;

    logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "technica starting");
    tracing::info!(
        bind_address = %config.server.bind_address,
        rpc_url = %logging::redact_url(&config.blockchain.rpc_url),
        failovers = config.blockchain.failover_urls.len(),
        "Configuration loaded"
    );

    if let Some(addr) = config.observability.metrics_socket_addr()? {
        metrics::init_metrics(addr)?;
    }

    let app = lifecycle::bootstrap(config).await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    app.serve(&shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
