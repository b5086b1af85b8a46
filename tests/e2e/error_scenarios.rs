//! E2E Error Scenario Tests
//!
//! Rejected uploads must not touch storage or the database. Backend failures
//! surface as 500s; a record is only written after the object is stored.

use super::common::{FailingRepository, TestEnv, OBJECT_PATH};
use serde_json::Value;
use std::sync::Arc;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, ResponseTemplate};

/// Fail the test if the fake S3 sees any PutObject
async fn forbid_puts(env: &TestEnv) {
    Mock::given(method("PUT"))
        .and(path_regex(OBJECT_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&env.s3)
        .await;
}

async fn error_message(response: reqwest::Response) -> String {
    let body: Value = response.json().await.expect("error body is JSON");
    body["error"]
        .as_str()
        .expect("error field is a string")
        .to_string()
}

#[tokio::test]
async fn test_missing_file_part() {
    let env = TestEnv::new().await;
    forbid_puts(&env).await;

    let form = reqwest::multipart::Form::new().text("name", "No File");
    let response = env
        .client
        .post(format!("{}/upload", env.base_url()))
        .multipart(form)
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 400);
    assert_eq!(error_message(response).await, "No file uploaded");
    assert!(env.list_songs().await.is_empty());
}

#[tokio::test]
async fn test_disallowed_extension() {
    let env = TestEnv::new().await;
    forbid_puts(&env).await;

    let response = env
        .upload("installer.exe", Some("application/octet-stream"), b"MZ\x90\x00", None)
        .await;

    assert_eq!(response.status(), 400);
    assert_eq!(
        error_message(response).await,
        "File type not allowed. Allowed types: mp3, ogg, wav"
    );
    assert!(env.list_songs().await.is_empty());
}

#[tokio::test]
async fn test_file_without_extension() {
    let env = TestEnv::new().await;
    forbid_puts(&env).await;

    let response = env.upload("README", None, b"hello", None).await;

    assert_eq!(response.status(), 400);
    assert!(error_message(response).await.starts_with("File type not allowed"));
}

#[tokio::test]
async fn test_non_audio_content_type() {
    let env = TestEnv::new().await;
    forbid_puts(&env).await;

    let response = env
        .upload("notes.mp3", Some("text/plain"), b"not really audio", None)
        .await;

    assert_eq!(response.status(), 400);
    assert_eq!(error_message(response).await, "Invalid file type: text/plain");
}

#[tokio::test]
async fn test_file_over_size_limit() {
    let env = TestEnv::with(
        |config| config.upload.max_file_size = 1024,
        Arc::new(song_uploadr::songs::InMemorySongRepository::new()),
    )
    .await;
    forbid_puts(&env).await;

    let response = env
        .upload("long.wav", Some("audio/wav"), &vec![0u8; 4096], None)
        .await;

    assert_eq!(response.status(), 413);
    assert!(error_message(response).await.contains("1024"));
    assert!(env.list_songs().await.is_empty());
}

#[tokio::test]
async fn test_large_body_over_size_limit_still_gets_413() {
    let env = TestEnv::with(
        |config| config.upload.max_file_size = 1024,
        Arc::new(song_uploadr::songs::InMemorySongRepository::new()),
    )
    .await;
    forbid_puts(&env).await;

    let response = env
        .upload("long.wav", Some("audio/wav"), &vec![0u8; 512 * 1024], Some("Long"))
        .await;

    assert_eq!(response.status(), 413);
    assert!(error_message(response).await.contains("1024"));
    assert!(env.list_songs().await.is_empty());
}

#[tokio::test]
async fn test_name_over_length_limit() {
    let env = TestEnv::new().await;
    forbid_puts(&env).await;

    let name = "n".repeat(song_uploadr::server::form::MAX_NAME_BYTES + 1);
    let response = env
        .upload("song.mp3", Some("audio/mpeg"), &TestEnv::mp3_payload(), Some(&name))
        .await;

    assert_eq!(response.status(), 400);
    assert_eq!(error_message(response).await, "Name too long: limit is 1024 bytes");
    assert!(env.list_songs().await.is_empty());
}

#[tokio::test]
async fn test_non_multipart_body() {
    let env = TestEnv::new().await;
    forbid_puts(&env).await;

    let response = env
        .client
        .post(format!("{}/upload", env.base_url()))
        .header("Content-Type", "application/json")
        .body(r#"{"file":"song.mp3"}"#)
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 400);
    assert!(error_message(response).await.contains("multipart/form-data"));
}

#[tokio::test]
async fn test_storage_failure_writes_no_record() {
    let env = TestEnv::new().await;
    env.mock_put_denied().await;

    let response = env
        .upload("song.mp3", Some("audio/mpeg"), &TestEnv::mp3_payload(), None)
        .await;

    assert_eq!(response.status(), 500);
    let message = error_message(response).await;
    assert!(message.starts_with("Failed to store file"), "got: {}", message);

    assert!(env.list_songs().await.is_empty());
    // No retry after the provider refused
    assert_eq!(env.put_requests().await.len(), 1);
}

#[tokio::test]
async fn test_persistence_failure_after_store() {
    let env = TestEnv::with(|_| {}, Arc::new(FailingRepository)).await;
    env.mock_put_success().await;

    let response = env
        .upload("song.mp3", Some("audio/mpeg"), &TestEnv::mp3_payload(), None)
        .await;

    assert_eq!(response.status(), 500);
    let message = error_message(response).await;
    assert!(message.contains("write concern timeout"), "got: {}", message);

    // The object stays in the bucket with nothing pointing at it
    assert_eq!(env.put_requests().await.len(), 1);
}

#[tokio::test]
async fn test_listing_failure() {
    let env = TestEnv::with(|_| {}, Arc::new(FailingRepository)).await;

    let response = env
        .client
        .get(format!("{}/songs", env.base_url()))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 500);
    assert!(error_message(response)
        .await
        .contains("server selection timeout"));
}

#[tokio::test]
async fn test_unknown_path() {
    let env = TestEnv::new().await;

    let response = env
        .client
        .get(format!("{}/albums", env.base_url()))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 404);
    assert_eq!(error_message(response).await, "Not found");
}

#[tokio::test]
async fn test_wrong_method_on_upload() {
    let env = TestEnv::new().await;

    let response = env
        .client
        .get(format!("{}/upload", env.base_url()))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 405);
    assert_eq!(response.headers()["allow"], "POST, OPTIONS");
}

#[tokio::test]
async fn test_delete_songs_not_allowed() {
    let env = TestEnv::new().await;

    let response = env
        .client
        .delete(format!("{}/songs", env.base_url()))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 405);
}
