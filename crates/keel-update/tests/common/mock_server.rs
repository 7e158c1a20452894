//! Mock server helpers for manifest and artifact endpoints

use serde_json::Value;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::builders::gzip;

/// Serve a manifest at `/<channel>/manifest.json`, expecting `hits` requests
pub async fn mock_manifest(server: &MockServer, channel: &str, body: &Value, hits: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/{}/manifest.json", channel)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(hits)
        .mount(server)
        .await;
}

/// Serve a raw manifest body with an arbitrary status
pub async fn mock_manifest_raw(server: &MockServer, channel: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/{}/manifest.json", channel)))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

/// Serve `content` gzip-compressed at `/builds/<name>.gz`
///
/// Returns the artifact URL as it appears in a manifest (without `.gz`).
pub async fn mock_artifact(server: &MockServer, name: &str, content: &[u8], hits: u64) -> String {
    mock_artifact_body(server, name, gzip(content), hits).await
}

/// Serve an arbitrary body at `/builds/<name>.gz`
pub async fn mock_artifact_body(
    server: &MockServer,
    name: &str,
    body: Vec<u8>,
    hits: u64,
) -> String {
    Mock::given(method("GET"))
        .and(path(format!("/builds/{}.gz", name)))
        .and(header("accept-encoding", "gzip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .expect(hits)
        .mount(server)
        .await;
    artifact_url(server, name)
}

/// Serve a gzip artifact after a delay, to hold an install mid-download
pub async fn mock_slow_artifact(
    server: &MockServer,
    name: &str,
    content: &[u8],
    delay: std::time::Duration,
    hits: u64,
) -> String {
    Mock::given(method("GET"))
        .and(path(format!("/builds/{}.gz", name)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(gzip(content))
                .set_delay(delay),
        )
        .expect(hits)
        .mount(server)
        .await;
    artifact_url(server, name)
}

/// Fail artifact downloads with the given status
pub async fn mock_failing_artifact(server: &MockServer, name: &str, status: u16) -> String {
    Mock::given(method("GET"))
        .and(path(format!("/builds/{}.gz", name)))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
    artifact_url(server, name)
}

pub fn artifact_url(server: &MockServer, name: &str) -> String {
    format!("{}/builds/{}", server.uri(), name)
}
