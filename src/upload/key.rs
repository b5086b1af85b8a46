//! Storage key generation

use rand::RngCore;

/// Random bytes prefixed to every storage key (128 bits)
pub const KEY_RANDOM_BYTES: usize = 16;

/// Build a storage key of the form `<32 hex chars>_<original filename>`
///
/// The prefix comes from the thread-local CSPRNG. Path separators in the
/// filename are replaced so the key stays a single object name.
pub fn generate_storage_key(original_filename: &str) -> String {
    let mut random = [0u8; KEY_RANDOM_BYTES];
    rand::rng().fill_bytes(&mut random);

    format!(
        "{}_{}",
        hex::encode(random),
        sanitize_filename(original_filename)
    )
}

fn sanitize_filename(filename: &str) -> String {
    filename.replace(['/', '\\'], "_")
}
