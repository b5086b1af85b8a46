//! Static credentials for the S3 client
//!
//! Credentials come from configuration only. Environment or instance-profile
//! discovery is not attempted, so a missing key fails at config validation
//! instead of at the first upload.

use aws_credential_types::Credentials;

/// Name reported by the SDK for credentials built here
const PROVIDER_NAME: &str = "song-uploadr-config";

/// Build long-lived credentials from an access/secret key pair
pub fn static_credentials(access_key: &str, secret_key: &str) -> Credentials {
    Credentials::new(access_key, secret_key, None, None, PROVIDER_NAME)
}
