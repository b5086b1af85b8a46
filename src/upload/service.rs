//! Upload orchestration
//!
//! Runs the pipeline for one request, in strict order:
//!
//! 1. require a file
//! 2. check its extension
//! 3. store the bytes under a fresh key
//! 4. build the song record
//! 5. persist it
//!
//! A failure at any step aborts the rest. If persistence fails after the
//! object was stored, the object is left in place with no record pointing at
//! it; nothing is deleted to compensate.

use super::{
    content_type_for, generate_storage_key, ExtensionValidator, UploadError, UploadReceipt,
    UploadRequest, UPLOAD_SUCCESS_MESSAGE,
};
use crate::metrics;
use crate::s3::ObjectStore;
use crate::songs::{NewSong, SongRepository};
use std::sync::Arc;
use std::time::Instant;

/// Sequences validation, storage and persistence for uploads
#[derive(Clone)]
pub struct UploadService {
    store: Arc<dyn ObjectStore>,
    songs: Arc<dyn SongRepository>,
    validator: ExtensionValidator,
}

impl UploadService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        songs: Arc<dyn SongRepository>,
        validator: ExtensionValidator,
    ) -> Self {
        Self {
            store,
            songs,
            validator,
        }
    }

    /// The extension allow-set in use
    pub fn validator(&self) -> &ExtensionValidator {
        &self.validator
    }

    /// Handle one upload
    #[tracing::instrument(
        name = "upload.handle",
        skip(self, request),
        fields(
            upload.filename = tracing::field::Empty,
            upload.bytes = tracing::field::Empty,
            storage.key = tracing::field::Empty,
            song.id = tracing::field::Empty
        )
    )]
    pub async fn handle(&self, request: UploadRequest) -> Result<UploadReceipt, UploadError> {
        let result = self.run(request).await;
        match &result {
            Ok(_) => {}
            Err(e) if e.is_client_error() => {
                metrics::record_upload_rejected();
                tracing::warn!(error = %e, "Upload rejected");
            }
            Err(e) => {
                metrics::record_upload_failure();
                metrics::record_error(e.kind());
                tracing::error!(error = %e, "Upload failed");
            }
        }
        result
    }

    async fn run(&self, request: UploadRequest) -> Result<UploadReceipt, UploadError> {
        let span = tracing::Span::current();
        let started = Instant::now();

        let file = request.file.ok_or(UploadError::MissingFile)?;
        span.record("upload.filename", file.filename.as_str());
        span.record("upload.bytes", file.bytes.len());

        if !self.validator.is_allowed(&file.filename) {
            return Err(UploadError::DisallowedExtension {
                filename: file.filename,
                allowed: self.validator.allowed().to_vec(),
            });
        }

        let key = generate_storage_key(&file.filename);
        span.record("storage.key", key.as_str());

        let content_type = file
            .content_type
            .clone()
            .unwrap_or_else(|| content_type_for(&file.filename).to_string());
        let bytes = file.bytes.len() as u64;

        let store_started = Instant::now();
        let url = self.store.store(file.bytes, &key, &content_type).await?;
        metrics::record_upload_duration("store", store_started.elapsed().as_secs_f64());

        let record = NewSong {
            name: request.name.unwrap_or_else(|| key.clone()),
            url: url.clone(),
            original_filename: file.filename,
        };

        let persist_started = Instant::now();
        let song_id = match self.songs.insert(record).await {
            Ok(id) => id,
            Err(e) => {
                metrics::record_orphaned_object();
                tracing::warn!(
                    storage.key = %key,
                    url = %url,
                    "Object stored but song record was not written; object is orphaned"
                );
                return Err(e.into());
            }
        };
        metrics::record_upload_duration("persist", persist_started.elapsed().as_secs_f64());
        span.record("song.id", song_id.as_str());

        metrics::record_upload_success(bytes);
        metrics::record_upload_duration("total", started.elapsed().as_secs_f64());

        tracing::info!(
            song_id = %song_id,
            bytes,
            duration_ms = started.elapsed().as_millis() as u64,
            "Upload completed"
        );

        Ok(UploadReceipt {
            song_id,
            message: UPLOAD_SUCCESS_MESSAGE.to_string(),
            key,
            url,
        })
    }
}
