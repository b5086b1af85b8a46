//! Multipart upload form parsing
//!
//! Reads the `file` and `name` parts of a `multipart/form-data` body. This is
//! the transport-level filter: it rejects bodies that are not multipart,
//! file parts declaring a non-audio content type, and files over the size
//! limit. Extension checks happen later in the upload pipeline.

use crate::upload::{UploadError, UploadRequest, UploadedFile};
use bytes::{Bytes, BytesMut};
use futures::Stream;

/// Form field carrying the file
pub const FILE_FIELD: &str = "file";
/// Form field carrying the optional display name
pub const NAME_FIELD: &str = "name";

/// Longest accepted `name` value, in bytes
pub const MAX_NAME_BYTES: usize = 1024;

/// Room for boundaries, part headers and the `name` value on top of the file
const FORM_OVERHEAD: u64 = 1024 * 1024;

/// Most bytes read and discarded after a rejection so the client can finish
/// sending before the response goes out
const DRAIN_LIMIT: usize = 1024 * 1024;

/// Size limits applied while reading a form
#[derive(Debug, Clone, Copy)]
pub struct FormLimits {
    pub max_file_size: u64,
}

impl FormLimits {
    /// Ceiling on the whole multipart body
    pub fn max_body_size(&self) -> u64 {
        self.max_file_size.saturating_add(FORM_OVERHEAD)
    }
}

/// Parse an upload form from a request body stream
///
/// Only the first `file` part with a filename is kept; later ones are
/// skipped like unknown parts. When a part is rejected, up to
/// [`DRAIN_LIMIT`] bytes of the remaining body are read and discarded before
/// the error is returned.
pub async fn parse_upload_form<S, O, E>(
    content_type: Option<&str>,
    body: S,
    limits: FormLimits,
) -> Result<UploadRequest, UploadError>
where
    S: Stream<Item = Result<O, E>> + Send + 'static,
    O: Into<Bytes> + 'static,
    E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let content_type = content_type.ok_or_else(|| {
        UploadError::MalformedRequest("expected a multipart/form-data body".into())
    })?;
    let boundary = multer::parse_boundary(content_type).map_err(|_| {
        UploadError::MalformedRequest(format!(
            "expected a multipart/form-data body, got '{}'",
            content_type
        ))
    })?;

    let constraints = multer::Constraints::new()
        .size_limit(multer::SizeLimit::new().whole_stream(limits.max_body_size()));
    let mut multipart = multer::Multipart::with_constraints(body, boundary, constraints);
    let mut request = UploadRequest::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(multipart_error(e, limits)),
        };

        if let Err(e) = read_field(field, &mut request, limits).await {
            drain(&mut multipart).await;
            return Err(e);
        }
    }

    Ok(request)
}

async fn read_field(
    mut field: multer::Field<'_>,
    request: &mut UploadRequest,
    limits: FormLimits,
) -> Result<(), UploadError> {
    let field_name = field.name().map(str::to_string);
    match field_name.as_deref() {
        Some(FILE_FIELD) if request.file.is_none() => {
            // A file input submitted empty arrives without a filename
            let Some(filename) = field
                .file_name()
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
            else {
                return Ok(());
            };

            let declared = field.content_type().map(|m| m.essence_str().to_string());
            check_declared_type(declared.as_deref())?;

            let mut buffer = BytesMut::new();
            while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, limits))? {
                let total = (buffer.len() + chunk.len()) as u64;
                if total > limits.max_file_size {
                    return Err(UploadError::FileTooLarge {
                        limit: limits.max_file_size,
                    });
                }
                buffer.extend_from_slice(&chunk);
            }

            request.file = Some(UploadedFile {
                filename,
                content_type: declared,
                bytes: buffer.freeze(),
            });
        }
        Some(NAME_FIELD) => {
            let mut buffer = BytesMut::new();
            while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, limits))? {
                if buffer.len() + chunk.len() > MAX_NAME_BYTES {
                    return Err(UploadError::NameTooLong {
                        limit: MAX_NAME_BYTES,
                    });
                }
                buffer.extend_from_slice(&chunk);
            }

            let value = String::from_utf8_lossy(&buffer);
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                request.name = Some(trimmed.to_string());
            }
        }
        // Unknown and extra file parts are skipped by the next `next_field` call
        _ => {}
    }

    Ok(())
}

/// Read and discard what is left of the body, up to [`DRAIN_LIMIT`] bytes
async fn drain(multipart: &mut multer::Multipart<'_>) {
    let mut drained = 0usize;
    while let Ok(Some(mut field)) = multipart.next_field().await {
        while let Ok(Some(chunk)) = field.chunk().await {
            drained += chunk.len();
            if drained > DRAIN_LIMIT {
                tracing::debug!(drained, "Stopped draining rejected upload body");
                return;
            }
        }
    }
}

fn multipart_error(e: multer::Error, limits: FormLimits) -> UploadError {
    match e {
        multer::Error::StreamSizeExceeded { .. } => UploadError::FileTooLarge {
            limit: limits.max_file_size,
        },
        e => UploadError::MalformedRequest(format!("failed to parse multipart body: {}", e)),
    }
}

/// Accept audio types and the generic binary type; absent means unknown
fn check_declared_type(content_type: Option<&str>) -> Result<(), UploadError> {
    match content_type {
        None => Ok(()),
        Some(ct) if ct.starts_with("audio/") || ct == "application/octet-stream" => Ok(()),
        Some(ct) => Err(UploadError::InvalidFileType(ct.to_string())),
    }
}
