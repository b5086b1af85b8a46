//! File extension allow-list
//!
//! The check looks at the filename only. It does not inspect file contents or
//! the declared content type, so a renamed binary of any kind passes.

/// Extensions accepted when no allow-list is configured
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg"];

/// Extract the lower-cased substring after the last `.`
///
/// Returns `None` when the filename has no `.` at all.
pub fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Extension validator backed by a fixed allow-set
#[derive(Debug, Clone)]
pub struct ExtensionValidator {
    allowed: Vec<String>,
}

impl Default for ExtensionValidator {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_EXTENSIONS.iter().copied())
    }
}

impl ExtensionValidator {
    /// Create a validator from configured extensions
    ///
    /// Entries are lower-cased and stripped of a leading dot, so `".MP3"` and
    /// `"mp3"` configure the same rule.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut allowed: Vec<String> = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        allowed.sort();
        allowed.dedup();

        Self { allowed }
    }

    /// Whether `filename` carries an allowed extension
    pub fn is_allowed(&self, filename: &str) -> bool {
        match extension_of(filename) {
            Some(ext) if !ext.is_empty() => self.allowed.iter().any(|a| *a == ext),
            _ => false,
        }
    }

    /// The normalised allow-set, sorted
    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }
}

/// Check a filename against the default `{mp3, wav, ogg}` allow-set
pub fn is_allowed_extension(filename: &str) -> bool {
    ExtensionValidator::default().is_allowed(filename)
}
