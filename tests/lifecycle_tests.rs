//! End-to-end tests for token file lifecycle against a mock AAA service.

use chrono::{TimeZone, Utc};
use hyperflex_token_integration::{
    hx_token_client, hx_token_config, Credentials, FileTokenStore, HxTokenClient, HxTokenError,
    OverwritePolicy, Projection, ProviderError, TokenRecord, TokenSet, TokenStore,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio_test::assert_ok;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_client(server: &MockServer) -> HxTokenClient {
    let config = hx_token_config()
        .base_url(format!("{}/aaa/v1", server.uri()))
        .origin("lifecycle-tests")
        .build()
        .unwrap();
    hx_token_client(config, Credentials::new("admin", "Cisco123")).unwrap()
}

fn token_file(dir: &TempDir) -> PathBuf {
    dir.path().join("hx_api_token.xml")
}

fn stale_record() -> TokenRecord {
    TokenRecord::issued_at(
        TokenSet::new("stale-access", "stale-refresh", "Bearer"),
        Utc.with_ymd_and_hms(2020, 3, 2, 16, 5, 6).unwrap(),
        "C:\\scripts\\hx_api_token_manager.py",
    )
}

async fn seed(path: &Path) -> Vec<u8> {
    FileTokenStore::new().write(path, &stale_record()).await.unwrap();
    std::fs::read(path).unwrap()
}

async fn mount_obtain(server: &MockServer, access_token: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path("/aaa/v1/auth"))
        .and(query_param("grant_type", "password"))
        .and(body_json(json!({
            "username": "admin",
            "password": "Cisco123",
            "client_id": "HxGuiClient",
            "client_secret": "Sunnyvale",
            "redirect_uri": "http://localhost:8080/aaa/redirect"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "access_token": access_token,
            "refresh_token": format!("{}-refresh", access_token),
            "token_type": "Bearer"
        })))
        .expect(times)
        .mount(server)
        .await;
}

async fn mount_validate(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/aaa/v1/validate"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap_or_default().len()
}

#[tokio::test]
async fn test_creates_token_file_when_absent() {
    let server = MockServer::start().await;
    mount_obtain(&server, "first-access", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let file = token_file(&dir);
    let client = create_client(&server);

    let value = client
        .ensure_token(&file, Projection::Token, OverwritePolicy::Overwrite)
        .await
        .unwrap()
        .unwrap();
    let token = value.as_token().unwrap();
    assert_eq!(token.access_token, "first-access");
    assert_eq!(token.refresh_token, "first-access-refresh");
    assert_eq!(token.token_type, "Bearer");

    let xml = std::fs::read_to_string(&file).unwrap();
    assert!(xml.starts_with("<hx_api_token>"));
    assert!(xml.contains("<source_module>lifecycle-tests</source_module>"));

    let record = FileTokenStore::new().read_record(&file).await.unwrap();
    let unix = record.created_at.instant().unwrap();
    let human = record.created_at.human_readable_instant().unwrap();
    assert!((unix - human).num_seconds().abs() <= 1);
}

#[tokio::test]
async fn test_valid_token_is_returned_unchanged() {
    let server = MockServer::start().await;
    mount_validate(&server, 200).await;
    mount_obtain(&server, "unused", 0).await;

    let dir = tempfile::tempdir().unwrap();
    let file = token_file(&dir);
    let before = seed(&file).await;
    let client = create_client(&server);

    for _ in 0..2 {
        let value = client
            .ensure_token(&file, Projection::AccessToken, OverwritePolicy::Overwrite)
            .await
            .unwrap();
        assert_eq!(value.unwrap().as_str(), Some("stale-access"));
    }

    assert_eq!(std::fs::read(&file).unwrap(), before);
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn test_rejected_token_is_renewed() {
    let server = MockServer::start().await;
    mount_validate(&server, 401).await;
    mount_obtain(&server, "renewed-access", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let file = token_file(&dir);
    seed(&file).await;
    let client = create_client(&server);

    let value = client
        .ensure_token(&file, Projection::AccessToken, OverwritePolicy::Overwrite)
        .await
        .unwrap();
    assert_eq!(value.unwrap().as_str(), Some("renewed-access"));

    let record = FileTokenStore::new().read_record(&file).await.unwrap();
    assert_ne!(record.token.access_token, "stale-access");
    assert!(
        record.created_at.unix_timestamp_time()
            > stale_record().created_at.unix_timestamp_time()
    );
}

#[tokio::test]
async fn test_rejected_token_kept_without_overwrite() {
    let server = MockServer::start().await;
    mount_validate(&server, 401).await;
    mount_obtain(&server, "unused", 0).await;

    let dir = tempfile::tempdir().unwrap();
    let file = token_file(&dir);
    let before = seed(&file).await;
    let client = create_client(&server);

    let value = client
        .manage_token_file(&file, "token", "False")
        .await
        .unwrap();

    assert!(value.is_none());
    assert_eq!(std::fs::read(&file).unwrap(), before);
}

#[tokio::test]
async fn test_metadata_reads_never_reach_the_service() {
    let server = MockServer::start().await;

    let dir = tempfile::tempdir().unwrap();
    let file = token_file(&dir);
    let before = seed(&file).await;
    let client = create_client(&server);

    let origin = client
        .manage_token_file(&file, "source_module", "True")
        .await
        .unwrap();
    assert_eq!(
        origin.unwrap().as_str(),
        Some("C:\\scripts\\hx_api_token_manager.py")
    );

    let created = client
        .manage_token_file(&file, "unix_timestamp_time", "True")
        .await
        .unwrap();
    assert_eq!(created.unwrap().as_str(), Some("1583165106"));

    assert_eq!(request_count(&server).await, 0);
    assert_eq!(std::fs::read(&file).unwrap(), before);
}

#[tokio::test]
async fn test_invalid_arguments_touch_nothing() {
    let server = MockServer::start().await;

    let dir = tempfile::tempdir().unwrap();
    let file = token_file(&dir);
    let client = create_client(&server);

    for (data, overwrite) in [("expires_in", "True"), ("token", "1"), ("TOKEN", "False")] {
        let error = client
            .manage_token_file(&file, data, overwrite)
            .await
            .unwrap_err();
        assert!(error.is_invalid_argument());
    }

    assert_eq!(request_count(&server).await, 0);
    assert!(!file.exists());
}

#[tokio::test]
async fn test_failed_renewal_leaves_file_intact() {
    let server = MockServer::start().await;
    mount_validate(&server, 401).await;
    Mock::given(method("POST"))
        .and(path("/aaa/v1/auth"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({"message": "AAA service unavailable"})),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = token_file(&dir);
    let before = seed(&file).await;
    let client = create_client(&server);

    let error = client
        .ensure_token(&file, Projection::Token, OverwritePolicy::Overwrite)
        .await
        .unwrap_err();

    match error {
        HxTokenError::Provider(ProviderError::ServerError { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "AAA service unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(std::fs::read(&file).unwrap(), before);
}

#[tokio::test]
async fn test_revoke_token_file_removes_it() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/aaa/v1/revoke"))
        .and(body_json(json!({
            "access_token": "stale-access",
            "refresh_token": "stale-refresh",
            "token_type": "Bearer"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = token_file(&dir);
    seed(&file).await;
    let client = create_client(&server);

    assert!(assert_ok!(client.revoke_token_file(&file, true).await));
    assert!(!file.exists());
}

#[tokio::test]
async fn test_create_token_file_respects_existing_file() {
    let server = MockServer::start().await;
    mount_obtain(&server, "replacement", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let file = token_file(&dir);
    seed(&file).await;
    let client = create_client(&server);

    let kept = client
        .create_token_file(&file, OverwritePolicy::Preserve)
        .await
        .unwrap();
    assert!(kept.is_none());

    let replaced = client
        .create_token_file(&file, OverwritePolicy::Overwrite)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(replaced.token.access_token, "replacement");
    assert_eq!(request_count(&server).await, 1);
}
