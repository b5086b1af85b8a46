//! Song Uploadr Library
//!
//! HTTP service that accepts audio uploads, stores them in an S3 bucket with
//! public-read visibility and records their metadata in a document store.
//!
//! # Endpoints
//!
//! - `GET /` health check
//! - `GET /songs` list every recorded song
//! - `POST /upload` multipart upload with a `file` part and optional `name`
//!
//! # Example
//!
//! ```no_run
//! use song_uploadr::{config::Config, s3::S3ObjectStore, server::{AppState, Server}, songs};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let store = Arc::new(S3ObjectStore::new((&config.storage).into())?);
//!     let repo = songs::connect(&config.database).await?;
//!     let server = Server::bind(&config.server.address, AppState::new(&config, store, repo)).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod logging;
pub mod metrics;
pub mod router;
pub mod s3;
pub mod server;
pub mod songs;
pub mod upload;

pub use config::Config;
pub use server::{AppState, Server};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
