use restpipe_auth::{AuthSessionRunner, AuthenticationConfig, AuthenticationModule};
use restpipe_http::mock::MockTransportProvider;
use restpipe_http::{HeaderAndBody, Url};
use restpipe_pipeline::{ErrorKind, Outcome, callback_fn};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn module(provider: &MockTransportProvider) -> AuthenticationModule {
    let runner = AuthSessionRunner::new(
        Url::parse("http://example.org/").unwrap(),
        &AuthenticationConfig::default(),
        Arc::new(provider.clone()),
    )
    .unwrap();
    AuthenticationModule::new(runner)
}

fn channel() -> (
    Arc<dyn restpipe_pipeline::Callback<HeaderAndBody>>,
    mpsc::UnboundedReceiver<Outcome<HeaderAndBody>>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let tx_err = tx.clone();
    let callback = callback_fn(
        move |response| {
            let _ = tx.send(Ok(response));
        },
        move |error| {
            let _ = tx_err.send(Err(error));
        },
    );
    (callback, rx)
}

async fn next(rx: &mut mpsc::UnboundedReceiver<Outcome<HeaderAndBody>>) -> Outcome<HeaderAndBody> {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for outcome")
        .expect("channel closed")
}

#[tokio::test]
async fn login_then_logout_toggles_session() {
    let provider = MockTransportProvider::new();
    let auth = module(&provider);
    assert!(!auth.is_logged_in());

    let (cb, mut rx) = channel();
    auth.login("bob", "pw", cb);
    next(&mut rx).await.unwrap();
    assert!(auth.is_logged_in());

    let (cb, mut rx) = channel();
    auth.logout(cb);
    next(&mut rx).await.unwrap();
    assert!(!auth.is_logged_in());
    assert_eq!(provider.requests().len(), 2);
}

#[tokio::test]
async fn enroll_logs_in() {
    let provider = MockTransportProvider::new();
    let auth = module(&provider);

    let (cb, mut rx) = channel();
    let user_data = BTreeMap::from([("username".to_string(), "carol".to_string())]);
    auth.enroll(user_data, cb);
    next(&mut rx).await.unwrap();

    assert!(auth.is_logged_in());
    assert_eq!(
        provider.last_request().unwrap().url.as_str(),
        "http://example.org/auth/enroll"
    );
}

#[tokio::test]
async fn failed_login_reports_failure_and_stays_logged_out() {
    let provider = MockTransportProvider::new();
    provider.push_response(HeaderAndBody::new(403, "denied"));
    let auth = module(&provider);

    let (cb, mut rx) = channel();
    auth.login("bob", "wrong", cb);
    let error = next(&mut rx).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Transport);
    assert_eq!(error.status(), Some(403));
    assert!(!auth.is_logged_in());
}

#[tokio::test]
async fn failed_logout_keeps_session() {
    let provider = MockTransportProvider::new();
    let auth = module(&provider);

    let (cb, mut rx) = channel();
    auth.login("bob", "pw", cb);
    next(&mut rx).await.unwrap();

    provider.push_response(HeaderAndBody::new(500, "oops"));
    let (cb, mut rx) = channel();
    auth.logout(cb);
    assert!(next(&mut rx).await.is_err());
    assert!(auth.is_logged_in());
}

#[test]
fn without_runtime_failure_is_delivered_inline() {
    let provider = MockTransportProvider::new();
    let auth = module(&provider);

    let (cb, mut rx) = channel();
    auth.login("bob", "pw", cb);

    let outcome = rx.try_recv().unwrap();
    assert!(outcome.is_err());
    assert!(provider.requests().is_empty());
    assert_eq!(auth.runner().login_url().as_str(), "http://example.org/auth/login");
}
