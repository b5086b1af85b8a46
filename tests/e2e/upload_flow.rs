//! E2E Upload Flow Tests
//!
//! Happy paths through the API: health, upload, listing and CORS.

use super::common::{TestEnv, ALLOWED_ORIGIN, OBJECT_PATH, TEST_BUCKET};
use serde_json::Value;
use wiremock::matchers::{header, method, path_regex};
use wiremock::{Mock, ResponseTemplate};

fn is_storage_key(key: &str, filename: &str) -> bool {
    match key.split_once('_') {
        Some((prefix, rest)) => {
            prefix.len() == 32
                && prefix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
                && rest == filename
        }
        None => false,
    }
}

#[tokio::test]
async fn test_health_check() {
    let env = TestEnv::new().await;

    let response = env
        .client
        .get(format!("{}/", env.base_url()))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_upload_returns_created_with_song_id() {
    let env = TestEnv::new().await;
    env.mock_put_success().await;

    let response = env
        .upload("song.mp3", Some("audio/mpeg"), &TestEnv::mp3_payload(), Some("My Song"))
        .await;

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Song uploaded successfully");

    let song_id = body["song_id"].as_str().expect("song_id is a string");
    assert!(!song_id.is_empty());

    let songs = env.list_songs().await;
    assert_eq!(songs.len(), 1);
    assert_eq!(songs[0].id, song_id);
    assert_eq!(songs[0].name, "My Song");
    assert_eq!(songs[0].original_filename, "song.mp3");
}

#[tokio::test]
async fn test_record_url_points_at_stored_object() {
    let env = TestEnv::new().await;
    env.mock_put_success().await;

    let response = env
        .upload("song.mp3", Some("audio/mpeg"), &TestEnv::mp3_payload(), None)
        .await;
    assert_eq!(response.status(), 201);

    let songs = env.list_songs().await;
    let song = &songs[0];

    let prefix = format!("{}/{}/", env.s3.uri(), TEST_BUCKET);
    let key = song
        .url
        .strip_prefix(&prefix)
        .expect("URL is path-style under the bucket");
    assert!(is_storage_key(key, "song.mp3"), "unexpected key: {}", key);

    let puts = env.put_requests().await;
    assert_eq!(puts.len(), 1);
    assert!(puts[0].url.path().ends_with(key));
}

#[tokio::test]
async fn test_name_defaults_to_storage_key() {
    let env = TestEnv::new().await;
    env.mock_put_success().await;

    let response = env
        .upload("take.wav", Some("audio/wav"), b"RIFF----WAVEfmt ", None)
        .await;
    assert_eq!(response.status(), 201);

    let songs = env.list_songs().await;
    let key = songs[0].url.rsplit('/').next().unwrap();
    assert_eq!(songs[0].name, key);
    assert!(is_storage_key(&songs[0].name, "take.wav"));
}

#[tokio::test]
async fn test_object_is_stored_public_with_declared_type() {
    let env = TestEnv::new().await;

    Mock::given(method("PUT"))
        .and(path_regex(OBJECT_PATH))
        .and(header("x-amz-acl", "public-read"))
        .and(header("content-type", "audio/ogg"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&env.s3)
        .await;

    let response = env
        .upload("loop.ogg", Some("audio/ogg"), b"OggS\x00\x02", None)
        .await;
    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn test_undeclared_type_falls_back_to_extension() {
    let env = TestEnv::new().await;

    Mock::given(method("PUT"))
        .and(path_regex(OBJECT_PATH))
        .and(header("content-type", "audio/mpeg"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&env.s3)
        .await;

    let response = env.upload("track.MP3", None, &TestEnv::mp3_payload(), None).await;
    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn test_concurrent_uploads_of_same_file_get_distinct_keys() {
    let env = TestEnv::new().await;
    env.mock_put_success().await;

    let payload = TestEnv::mp3_payload();
    let (first, second) = tokio::join!(
        env.upload("song.mp3", Some("audio/mpeg"), &payload, None),
        env.upload("song.mp3", Some("audio/mpeg"), &payload, None),
    );
    assert_eq!(first.status(), 201);
    assert_eq!(second.status(), 201);

    let songs = env.list_songs().await;
    assert_eq!(songs.len(), 2);
    assert_ne!(songs[0].id, songs[1].id);
    assert_ne!(songs[0].url, songs[1].url);
}

#[tokio::test]
async fn test_only_first_file_part_is_stored() {
    let env = TestEnv::new().await;
    env.mock_put_success().await;

    let first = reqwest::multipart::Part::bytes(TestEnv::mp3_payload())
        .file_name("first.mp3")
        .mime_str("audio/mpeg")
        .unwrap();
    let second = reqwest::multipart::Part::bytes(b"RIFF".to_vec())
        .file_name("second.wav")
        .mime_str("audio/wav")
        .unwrap();
    let form = reqwest::multipart::Form::new()
        .part("file", first)
        .part("file", second);

    let response = env
        .client
        .post(format!("{}/upload", env.base_url()))
        .multipart(form)
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 201);

    let songs = env.list_songs().await;
    assert_eq!(songs.len(), 1);
    assert_eq!(songs[0].original_filename, "first.mp3");
    assert_eq!(env.put_requests().await.len(), 1);
}

#[tokio::test]
async fn test_list_is_empty_before_any_upload() {
    let env = TestEnv::new().await;

    let response = env
        .client
        .get(format!("{}/songs", env.base_url()))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn test_list_returns_records_in_insertion_order() {
    let env = TestEnv::new().await;
    env.mock_put_success().await;

    for name in ["First", "Second", "Third"] {
        let response = env
            .upload("song.wav", Some("audio/wav"), b"RIFF", Some(name))
            .await;
        assert_eq!(response.status(), 201);
    }

    let names: Vec<String> = env.list_songs().await.into_iter().map(|s| s.name).collect();
    assert_eq!(names, ["First", "Second", "Third"]);
}

#[tokio::test]
async fn test_cors_headers_for_allowed_origin() {
    let env = TestEnv::new().await;

    let response = env
        .client
        .get(format!("{}/songs", env.base_url()))
        .header("Origin", ALLOWED_ORIGIN)
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["access-control-allow-origin"]
            .to_str()
            .unwrap(),
        ALLOWED_ORIGIN
    );
}

#[tokio::test]
async fn test_cors_headers_withheld_for_other_origins() {
    let env = TestEnv::new().await;

    let response = env
        .client
        .get(format!("{}/songs", env.base_url()))
        .header("Origin", "https://elsewhere.example.org")
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 200);
    assert!(response.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_preflight_for_upload() {
    let env = TestEnv::new().await;

    let response = env
        .client
        .request(reqwest::Method::OPTIONS, format!("{}/upload", env.base_url()))
        .header("Origin", ALLOWED_ORIGIN)
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 204);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], ALLOWED_ORIGIN);
    assert_eq!(headers["access-control-allow-methods"], "GET, POST, OPTIONS");
    assert_eq!(
        headers["access-control-allow-headers"],
        "Content-Type, Authorization"
    );
}
