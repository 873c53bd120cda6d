use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::AuthService;
use shared_database::{MemoryTokenStore, TokenStore};
use shared_models::error::AuthError;
use shared_utils::test_utils::{JwtTestUtils, MockAuthResponses, TestConfig, TestUser};

async fn create_test_service() -> (MockServer, AuthService, Arc<MemoryTokenStore>) {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_base_url(&mock_server.uri()).to_app_config();
    let store = Arc::new(MemoryTokenStore::new());
    let auth = AuthService::new(&config, store.clone());
    (mock_server, auth, store)
}

#[tokio::test]
async fn test_login_success_stores_token_and_role() {
    let (mock_server, auth, store) = create_test_service().await;
    let user = TestUser::admin("admin@example.com");
    let token = JwtTestUtils::create_test_token(&user, Some(8));

    Mock::given(method("POST"))
        .and(path("/api/Auth/login"))
        .and(body_json(json!({ "email": "admin@example.com", "password": "s3cret!" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockAuthResponses::login_success(&token)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = auth.login("admin@example.com", "s3cret!").await;

    let response = response.unwrap();
    assert_eq!(response.token.as_deref(), Some(token.as_str()));
    assert_eq!(response.extra["message"], "Login successful");
    assert_eq!(store.load().as_deref(), Some(token.as_str()));
    assert_eq!(store.load_role().as_deref(), Some("admin"));
    assert!(auth.is_authenticated());
    assert_eq!(auth.get_user_role().as_deref(), Some("admin"));
}

#[tokio::test]
async fn test_login_with_legacy_role_claim() {
    let (mock_server, auth, store) = create_test_service().await;
    let token = JwtTestUtils::create_legacy_token(&TestUser::employe("emp@example.com"));

    Mock::given(method("POST"))
        .and(path("/api/Auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockAuthResponses::login_success(&token)))
        .mount(&mock_server)
        .await;

    assert!(auth.login("emp@example.com", "pw").await.is_some());
    assert_eq!(store.load_role().as_deref(), Some("employe"));
}

#[tokio::test]
async fn test_login_with_undecodable_token_stores_without_role() {
    let (mock_server, auth, store) = create_test_service().await;

    Mock::given(method("POST"))
        .and(path("/api/Auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "opaque-token" })))
        .mount(&mock_server)
        .await;

    assert!(auth.login("a@example.com", "pw").await.is_some());
    assert_eq!(store.load().as_deref(), Some("opaque-token"));
    assert_eq!(store.load_role(), None);
    assert!(!auth.is_authenticated());
}

#[tokio::test]
async fn test_login_response_without_token_leaves_store_untouched() {
    let (mock_server, auth, store) = create_test_service().await;

    Mock::given(method("POST"))
        .and(path("/api/Auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockAuthResponses::login_without_token()))
        .mount(&mock_server)
        .await;

    assert!(auth.login("a@example.com", "pw").await.is_none());
    assert_eq!(store.load_credential(), None);
    assert!(!auth.is_authenticated());
}

#[tokio::test]
async fn test_failed_login_keeps_previous_session() {
    let (mock_server, auth, store) = create_test_service().await;
    let existing = JwtTestUtils::create_test_token(&TestUser::manager("m@example.com"), None);
    store.save(&existing, Some("manager"));

    Mock::given(method("POST"))
        .and(path("/api/Auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": null })))
        .mount(&mock_server)
        .await;

    assert!(auth.login("other@example.com", "pw").await.is_none());
    assert_eq!(store.load().as_deref(), Some(existing.as_str()));
}

#[tokio::test]
async fn test_try_login_reports_missing_token() {
    let (mock_server, auth, _store) = create_test_service().await;

    Mock::given(method("POST"))
        .and(path("/api/Auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "" })))
        .mount(&mock_server)
        .await;

    let result = auth.try_login("a@example.com", "pw").await;
    assert_matches!(result, Err(AuthError::AuthenticationFailure(_)));
}

#[tokio::test]
async fn test_login_rejected_credentials() {
    let (mock_server, auth, store) = create_test_service().await;

    Mock::given(method("POST"))
        .and(path("/api/Auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(MockAuthResponses::error_response("Invalid credentials")))
        .mount(&mock_server)
        .await;

    assert!(auth.login("a@example.com", "wrong").await.is_none());
    assert_matches!(
        auth.try_login("a@example.com", "wrong").await,
        Err(AuthError::AuthenticationFailure(_))
    );
    assert_eq!(store.load(), None);
}

#[tokio::test]
async fn test_login_server_error_is_swallowed() {
    let (mock_server, auth, store) = create_test_service().await;

    Mock::given(method("POST"))
        .and(path("/api/Auth/login"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    assert!(auth.login("a@example.com", "pw").await.is_none());
    assert_matches!(
        auth.try_login("a@example.com", "pw").await,
        Err(AuthError::Api { status: 500, .. })
    );
    assert_eq!(store.load(), None);
}

#[tokio::test]
async fn test_login_transport_error_is_swallowed() {
    let config = TestConfig::with_base_url("http://127.0.0.1:9").to_app_config();
    let store = Arc::new(MemoryTokenStore::new());
    let auth = AuthService::new(&config, store.clone());

    assert!(auth.login("a@example.com", "pw").await.is_none());
    assert_eq!(store.load(), None);
}

#[tokio::test]
async fn test_second_login_overwrites_first() {
    let (mock_server, auth, store) = create_test_service().await;
    let admin_token = JwtTestUtils::create_test_token(&TestUser::admin("a@example.com"), None);
    let manager_token = JwtTestUtils::create_test_token(&TestUser::manager("m@example.com"), None);

    Mock::given(method("POST"))
        .and(body_json(json!({ "email": "a@example.com", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockAuthResponses::login_success(&admin_token)))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(body_json(json!({ "email": "m@example.com", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockAuthResponses::login_success(&manager_token)))
        .mount(&mock_server)
        .await;

    auth.login("a@example.com", "pw").await.unwrap();
    auth.login("m@example.com", "pw").await.unwrap();

    assert_eq!(store.load().as_deref(), Some(manager_token.as_str()));
    assert_eq!(auth.get_user_role().as_deref(), Some("manager"));
}

#[tokio::test]
async fn test_forgot_password() {
    let (mock_server, auth, _store) = create_test_service().await;

    Mock::given(method("POST"))
        .and(path("/api/Auth/forgot-password"))
        .and(body_json(json!({ "email": "a@example.com", "redirectPath": "/auth/reset-password" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sent": true })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = auth
        .forgot_password("a@example.com", "/auth/reset-password")
        .await
        .unwrap();
    assert_eq!(response["sent"], true);
}

#[tokio::test]
async fn test_reset_password() {
    let (mock_server, auth, _store) = create_test_service().await;

    Mock::given(method("POST"))
        .and(path("/api/Auth/reset-password"))
        .and(body_json(json!({ "email": "a@example.com" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    assert!(auth.reset_password("a@example.com").await.is_ok());
}

#[tokio::test]
async fn test_change_password_carries_bearer() {
    let (mock_server, auth, store) = create_test_service().await;
    let token = JwtTestUtils::create_test_token(&TestUser::employe("e@example.com"), None);
    store.save(&token, Some("employe"));

    Mock::given(method("POST"))
        .and(path("/api/Auth/change-password"))
        .and(header("Authorization", format!("Bearer {}", token)))
        .and(body_json(json!({ "oldPassword": "old", "newPassword": "new" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "changed": true })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = auth.change_password("old", "new").await.unwrap();
    assert_eq!(response["changed"], true);
}

#[tokio::test]
async fn test_change_password_error_is_surfaced() {
    let (mock_server, auth, _store) = create_test_service().await;

    Mock::given(method("POST"))
        .and(path("/api/Auth/change-password"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Password too weak"))
        .mount(&mock_server)
        .await;

    assert_matches!(
        auth.change_password("old", "new").await,
        Err(AuthError::Api { status: 400, .. })
    );
}
