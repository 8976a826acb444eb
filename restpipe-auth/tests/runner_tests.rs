use pretty_assertions::assert_eq;
use restpipe_auth::{AuthError, AuthSessionRunner, AuthenticationConfig};
use restpipe_http::mock::MockTransportProvider;
use restpipe_http::{HeaderAndBody, HttpError, HttpMethod, HttpTransportProvider, Url};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn runner(base: &str, provider: &MockTransportProvider) -> AuthSessionRunner {
    AuthSessionRunner::new(
        Url::parse(base).unwrap(),
        &AuthenticationConfig::default(),
        Arc::new(provider.clone()),
    )
    .unwrap()
}

// ── Configuration ───────────────────────────────────────────────

#[test]
fn default_config_paths() {
    let config = AuthenticationConfig::default();
    assert_eq!(config.login_endpoint, "auth/login");
    assert_eq!(config.logout_endpoint, "auth/logout");
    assert_eq!(config.enroll_endpoint, "auth/enroll");
    assert_eq!(config.timeout(), Duration::from_secs(60));
}

#[test]
fn config_deserializes_partial_json() {
    let config: AuthenticationConfig =
        serde_json::from_value(json!({"login_endpoint": "session", "timeout_ms": 500})).unwrap();
    assert_eq!(config.login_endpoint, "session");
    assert_eq!(config.logout_endpoint, "auth/logout");
    assert_eq!(config.timeout_ms, 500);
}

// ── Construction ────────────────────────────────────────────────

#[test]
fn resolves_endpoints_against_base() {
    let runner = runner("http://example.org/", &MockTransportProvider::new());
    assert_eq!(runner.login_url().as_str(), "http://example.org/auth/login");
    assert_eq!(runner.logout_url().as_str(), "http://example.org/auth/logout");
    assert_eq!(runner.enroll_url().as_str(), "http://example.org/auth/enroll");
    assert_eq!(runner.base_url().as_str(), "http://example.org/");
}

#[test]
fn base_without_trailing_slash_keeps_its_path() {
    let runner = runner("http://example.org/api", &MockTransportProvider::new());
    assert_eq!(runner.login_url().as_str(), "http://example.org/api/auth/login");
}

#[test]
fn custom_endpoints_and_timeout() {
    let config = AuthenticationConfig::default()
        .with_login_endpoint("/v2/session")
        .with_logout_endpoint("v2/session/end")
        .with_enroll_endpoint("users")
        .with_timeout(Duration::from_millis(250));
    let runner = AuthSessionRunner::new(
        Url::parse("https://example.org/").unwrap(),
        &config,
        Arc::new(MockTransportProvider::new()),
    )
    .unwrap();
    assert_eq!(runner.login_url().as_str(), "https://example.org/v2/session");
    assert_eq!(runner.logout_url().as_str(), "https://example.org/v2/session/end");
    assert_eq!(runner.enroll_url().as_str(), "https://example.org/users");
    assert_eq!(runner.timeout(), Duration::from_millis(250));
}

#[test]
fn base_with_query_is_configuration_error() {
    let result = AuthSessionRunner::new(
        Url::parse("http://example.org/?tenant=a").unwrap(),
        &AuthenticationConfig::default(),
        Arc::new(MockTransportProvider::new()),
    );
    assert!(matches!(result, Err(AuthError::Config(_))));
}

#[test]
fn base_with_fragment_is_configuration_error() {
    let result = AuthSessionRunner::new(
        Url::parse("http://example.org/#top").unwrap(),
        &AuthenticationConfig::default(),
        Arc::new(MockTransportProvider::new()),
    );
    assert!(matches!(result, Err(AuthError::Config(_))));
}

#[test]
fn non_hierarchical_base_is_configuration_error() {
    let result = AuthSessionRunner::new(
        Url::parse("mailto:admin@example.org").unwrap(),
        &AuthenticationConfig::default(),
        Arc::new(MockTransportProvider::new()),
    );
    assert!(matches!(result, Err(AuthError::Config(_))));
}

// ── Requests (recording provider) ───────────────────────────────

#[tokio::test]
async fn login_posts_credentials() {
    let provider = MockTransportProvider::new();
    let runner = runner("http://example.org/", &provider);

    runner.login("bob", "pw").await.unwrap();

    let request = provider.last_request().unwrap();
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.url.as_str(), "http://example.org/auth/login");
    assert_eq!(request.timeout, Duration::from_secs(60));
    assert_eq!(
        request.json::<Value>().unwrap(),
        json!({"username": "bob", "password": "pw"})
    );
}

#[tokio::test]
async fn logout_posts_empty_body() {
    let provider = MockTransportProvider::new();
    let runner = runner("http://example.org/", &provider);

    runner.logout().await.unwrap();

    let request = provider.last_request().unwrap();
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.url.as_str(), "http://example.org/auth/logout");
    assert!(request.body.is_empty());
}

#[tokio::test]
async fn enroll_posts_user_data() {
    let provider = MockTransportProvider::new();
    let runner = runner("http://example.org/", &provider);
    let user_data = BTreeMap::from([
        ("username".to_string(), "alice".to_string()),
        ("email".to_string(), "alice@example.org".to_string()),
    ]);

    runner.enroll(&user_data).await.unwrap();

    let request = provider.last_request().unwrap();
    assert_eq!(request.url.as_str(), "http://example.org/auth/enroll");
    assert_eq!(
        request.json::<Value>().unwrap(),
        json!({"username": "alice", "email": "alice@example.org"})
    );
}

#[tokio::test]
async fn response_is_returned_unchanged() {
    let provider = MockTransportProvider::new();
    provider.push_response(
        HeaderAndBody::new(200, r#"{"token":"t0k"}"#).with_header("Auth-Token", "t0k"),
    );
    let runner = runner("http://example.org/", &provider);

    let response = runner.login("bob", "pw").await.unwrap();
    assert_eq!(response.header("auth-token"), Some("t0k"));
    assert_eq!(response.json::<Value>().unwrap(), json!({"token": "t0k"}));
}

#[tokio::test]
async fn rejected_login_is_transport_error_without_retry() {
    let provider = MockTransportProvider::new();
    provider.push_response(HeaderAndBody::new(401, "bad credentials"));
    let runner = runner("http://example.org/", &provider);

    let error = runner.login("bob", "wrong").await.unwrap_err();
    match error {
        AuthError::Transport(HttpError::Status { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "bad credentials");
        }
        other => panic!("Expected Status error, got {other:?}"),
    }
    assert_eq!(provider.requests().len(), 1);
}

// ── Requests (wiremock) ─────────────────────────────────────────

#[tokio::test]
async fn login_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"username": "bob", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).insert_header("auth-token", "abc"))
        .expect(1)
        .mount(&server)
        .await;

    let runner = AuthSessionRunner::new(
        Url::parse(&server.uri()).unwrap(),
        &AuthenticationConfig::default(),
        Arc::new(HttpTransportProvider::new().unwrap()),
    )
    .unwrap();

    let response = runner.login("bob", "pw").await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.header("Auth-Token"), Some("abc"));
}

#[tokio::test]
async fn logout_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(body_string(""))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let runner = AuthSessionRunner::new(
        Url::parse(&server.uri()).unwrap(),
        &AuthenticationConfig::default(),
        Arc::new(HttpTransportProvider::new().unwrap()),
    )
    .unwrap();

    assert_eq!(runner.logout().await.unwrap().status, 204);
}
