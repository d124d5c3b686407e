//! Integration tests for the metadata client against a mock HTTP endpoint.

use std::time::Duration;

use rlmeta::{Error, MetadataClient, TrackInfo};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn now_playing_json(title: &str, artist: &str) -> serde_json::Value {
    json!({
        "title": title,
        "artist": artist,
        "cover": "https://img.example/covers/abc.jpg",
        "duration": 214
    })
}

async fn client_for(server: &MockServer) -> MetadataClient {
    MetadataClient::builder()
        .endpoint(format!("{}/api/now-playing", server.uri()))
        .timeout(Duration::from_millis(500))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_fetch_now_playing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/now-playing"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(now_playing_json("So What", "Miles Davis")),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let metadata = client.fetch_now_playing().await.unwrap();

    assert_eq!(metadata.track, TrackInfo::new("So What", "Miles Davis"));
    assert_eq!(
        metadata.artwork.as_deref(),
        Some("https://img.example/covers/abc.jpg")
    );
}

#[tokio::test]
async fn test_server_error_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/now-playing"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let err = client.fetch_now_playing().await.unwrap_err();

    assert!(matches!(err, Error::ApiError(_)), "got {err:?}");
}

#[tokio::test]
async fn test_malformed_body_is_http_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/now-playing"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    assert!(client.fetch_now_playing().await.is_err());
}

#[tokio::test]
async fn test_missing_required_field_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/now-playing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"title": "Only"})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    assert!(client.fetch_now_playing().await.is_err());
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/now-playing"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(now_playing_json("T", "A"))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let err = client.fetch_now_playing().await.unwrap_err();

    match err {
        Error::Http(e) => assert!(e.is_timeout(), "expected timeout, got {e:?}"),
        other => panic!("expected HTTP timeout, got {other:?}"),
    }
}
