//! Song metadata records
//!
//! A `Song` describes one uploaded audio file. Records are written once,
//! after the bytes have been stored, and are never updated or deleted.

mod memory;
mod mongo;

pub use memory::InMemorySongRepository;
pub use mongo::MongoSongRepository;

use crate::config::DatabaseConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// URI scheme selecting the process-local repository
pub const MEMORY_URI: &str = "memory://";

/// Metadata store errors
#[derive(Error, Debug)]
pub enum SongStoreError {
    #[error("Failed to connect to metadata store: {0}")]
    ConnectionError(String),

    #[error("Failed to write song record: {0}")]
    WriteError(String),

    #[error("Failed to read song records: {0}")]
    ReadError(String),
}

/// A persisted song record, as returned to API callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub name: String,
    pub url: String,
    pub original_filename: String,
}

/// A song record that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSong {
    pub name: String,
    pub url: String,
    pub original_filename: String,
}

impl NewSong {
    /// Attach the id assigned by the store
    pub fn with_id(self, id: impl Into<String>) -> Song {
        Song {
            id: id.into(),
            name: self.name,
            url: self.url,
            original_filename: self.original_filename,
        }
    }
}

/// Document-store persistence for song records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SongRepository: Send + Sync {
    /// Persist a record and return the id the store assigned to it
    async fn insert(&self, song: NewSong) -> Result<String, SongStoreError>;

    /// All records, in the store's natural order
    async fn list(&self) -> Result<Vec<Song>, SongStoreError>;
}

/// Open the repository named by `config.uri`
///
/// `memory://` selects an in-process store; anything else is treated as a
/// MongoDB connection string and must answer a ping before this returns.
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn SongRepository>, SongStoreError> {
    if config.uri == MEMORY_URI {
        tracing::warn!("Using in-memory song repository; records are lost on restart");
        return Ok(Arc::new(InMemorySongRepository::new()));
    }

    let repo = MongoSongRepository::connect(config).await?;
    Ok(Arc::new(repo))
}
