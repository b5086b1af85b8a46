//! MongoDB-backed song repository

use super::{NewSong, Song, SongRepository, SongStoreError};
use crate::config::DatabaseConfig;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};

/// Stored document layout
///
/// `_id` is left unset on insert so the driver assigns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SongDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    name: String,
    url: String,
    original_filename: String,
}

impl From<NewSong> for SongDocument {
    fn from(song: NewSong) -> Self {
        Self {
            id: None,
            name: song.name,
            url: song.url,
            original_filename: song.original_filename,
        }
    }
}

impl From<SongDocument> for Song {
    fn from(doc: SongDocument) -> Self {
        Song {
            id: doc.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: doc.name,
            url: doc.url,
            original_filename: doc.original_filename,
        }
    }
}

/// Render an inserted `_id` the way API callers see it
fn id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `SongRepository` over a MongoDB collection
pub struct MongoSongRepository {
    collection: Collection<SongDocument>,
}

impl MongoSongRepository {
    /// Connect and verify the server answers a ping
    #[tracing::instrument(name = "mongo.connect", skip(config), fields(db = %config.database, collection = %config.collection), err)]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, SongStoreError> {
        let client = Client::with_uri_str(&config.uri)
            .await
            .map_err(|e| SongStoreError::ConnectionError(e.to_string()))?;

        let database = client.database(&config.database);
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| SongStoreError::ConnectionError(e.to_string()))?;

        tracing::info!("Connected to MongoDB");

        Ok(Self {
            collection: database.collection(&config.collection),
        })
    }
}

#[async_trait]
impl SongRepository for MongoSongRepository {
    #[tracing::instrument(
        name = "mongo.insert_song",
        skip(self, song),
        fields(song.name = %song.name, song.id = tracing::field::Empty),
        err
    )]
    async fn insert(&self, song: NewSong) -> Result<String, SongStoreError> {
        let document = SongDocument::from(song);
        let result = self
            .collection
            .insert_one(&document)
            .await
            .map_err(|e| SongStoreError::WriteError(e.to_string()))?;

        let id = id_to_string(&result.inserted_id);
        tracing::Span::current().record("song.id", id.as_str());

        Ok(id)
    }

    #[tracing::instrument(name = "mongo.list_songs", skip(self), err)]
    async fn list(&self) -> Result<Vec<Song>, SongStoreError> {
        let cursor = self
            .collection
            .find(doc! {})
            .await
            .map_err(|e| SongStoreError::ReadError(e.to_string()))?;

        let documents: Vec<SongDocument> = cursor
            .try_collect()
            .await
            .map_err(|e| SongStoreError::ReadError(e.to_string()))?;

        tracing::debug!(count = documents.len(), "Listed songs");

        Ok(documents.into_iter().map(Song::from).collect())
    }
}
