//! Song Uploadr - audio upload service
//!
//! Stores uploaded songs in S3 and their metadata in MongoDB.

use anyhow::Context;
use clap::Parser;
use song_uploadr::metrics::server::MetricsServer;
use song_uploadr::s3::S3ObjectStore;
use song_uploadr::{config::Config, logging, songs, AppState, Server};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Song Uploadr - accepts audio uploads and records them
#[derive(Parser, Debug)]
#[command(name = "song-uploadr")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Log level or filter directive; overrides `logging.level`
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Configuration errors are fatal and logging is not up yet, so they go
    // to stderr through anyhow.
    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load configuration from {:?}", args.config))?;

    logging::init_subscriber(&config.logging, args.log_level.as_deref())?;

    info!("Starting Song Uploadr v{}", song_uploadr::VERSION);
    info!("Loaded configuration from {:?}", args.config);

    let store = S3ObjectStore::new((&config.storage).into())
        .context("Failed to create S3 client")?;
    info!(
        bucket = store.bucket(),
        region = store.region(),
        "Object store ready"
    );

    let repo = songs::connect(&config.database)
        .await
        .context("Failed to connect to metadata store")?;

    let mut metrics_server = if config.metrics.enabled {
        let mut server = MetricsServer::new(format!("0.0.0.0:{}", config.metrics.port));
        let addr = server.start().await?;
        info!("Metrics available at http://{}/metrics", addr);
        Some(server)
    } else {
        None
    };

    let state = AppState::new(&config, Arc::new(store), repo);
    let server = Server::bind(&config.server.address, state).await?;
    server.run().await?;

    if let Some(metrics_server) = metrics_server.as_mut() {
        metrics_server.shutdown().await;
    }

    info!("Song Uploadr stopped");
    Ok(())
}
