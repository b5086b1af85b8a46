//! Process-local song repository
//!
//! Keeps records in insertion order behind a `parking_lot` lock. Ids use the
//! same 24-char hex ObjectId format as the MongoDB repository.

use super::{NewSong, Song, SongRepository, SongStoreError};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use parking_lot::RwLock;

/// In-memory `SongRepository`
#[derive(Debug, Default)]
pub struct InMemorySongRepository {
    songs: RwLock<Vec<Song>>,
}

impl InMemorySongRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.songs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.read().is_empty()
    }
}

#[async_trait]
impl SongRepository for InMemorySongRepository {
    async fn insert(&self, song: NewSong) -> Result<String, SongStoreError> {
        let id = ObjectId::new().to_hex();
        self.songs.write().push(song.with_id(id.clone()));
        Ok(id)
    }

    async fn list(&self) -> Result<Vec<Song>, SongStoreError> {
        Ok(self.songs.read().clone())
    }
}
