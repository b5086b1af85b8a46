//! Upload module
//!
//! The upload pipeline: extension validation, storage placement under a
//! unique key, then metadata persistence.

use crate::s3::ObjectStoreError;
use crate::songs::SongStoreError;
use bytes::Bytes;
use hyper::StatusCode;
use thiserror::Error;

pub mod key;
pub mod service;
pub mod validate;

pub use key::generate_storage_key;
pub use service::UploadService;
pub use validate::{is_allowed_extension, ExtensionValidator};

/// Message returned with every successful upload
pub const UPLOAD_SUCCESS_MESSAGE: &str = "Song uploaded successfully";

/// Upload errors
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("No file uploaded")]
    MissingFile,

    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    #[error("File type not allowed. Allowed types: {}", .allowed.join(", "))]
    DisallowedExtension { filename: String, allowed: Vec<String> },

    #[error("File too large: limit is {limit} bytes")]
    FileTooLarge { limit: u64 },

    #[error("Name too long: limit is {limit} bytes")]
    NameTooLong { limit: usize },

    #[error("Malformed upload request: {0}")]
    MalformedRequest(String),

    #[error("Failed to store file: {0}")]
    Storage(#[from] ObjectStoreError),

    #[error("Failed to save song record: {0}")]
    Persistence(#[from] SongStoreError),
}

impl UploadError {
    /// HTTP status class for this failure
    pub fn status_code(&self) -> StatusCode {
        match self {
            UploadError::MissingFile
            | UploadError::InvalidFileType(_)
            | UploadError::DisallowedExtension { .. }
            | UploadError::NameTooLong { .. }
            | UploadError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            UploadError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            UploadError::Storage(_) | UploadError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether the caller sent something unacceptable
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            UploadError::MissingFile => "missing_file",
            UploadError::InvalidFileType(_) => "invalid_file_type",
            UploadError::DisallowedExtension { .. } => "disallowed_extension",
            UploadError::FileTooLarge { .. } => "file_too_large",
            UploadError::NameTooLong { .. } => "name_too_long",
            UploadError::MalformedRequest(_) => "malformed_request",
            UploadError::Storage(_) => "storage",
            UploadError::Persistence(_) => "persistence",
        }
    }
}

/// The file part of an upload form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Filename as submitted by the caller
    pub filename: String,
    /// Content type declared on the part, if any
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// A parsed upload request
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub file: Option<UploadedFile>,
    /// Display name; the storage key is used when absent
    pub name: Option<String>,
}

/// Outcome of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub song_id: String,
    pub message: String,
    pub key: String,
    pub url: String,
}

/// Content type to store an object with when the caller declared none
pub fn content_type_for(filename: &str) -> &'static str {
    match validate::extension_of(filename).as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        _ => "application/octet-stream",
    }
}
