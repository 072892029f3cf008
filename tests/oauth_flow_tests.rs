mod auth_support;

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::LOCATION;
use reqwest::StatusCode;
use serde_json::json;
use smartthings::auth::{AuthError, AuthService, AuthSession, PendingAuthorization};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_support::{browser, provider_config, token, InMemoryTokenStore};

async fn mount_token_endpoint(server: &MockServer, response: ResponseTemplate, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(response)
        .expect(expected)
        .mount(server)
        .await;
}

fn token_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": "fresh-access",
        "token_type": "bearer",
        "refresh_token": "fresh-refresh",
        "expires_in": 3600
    }))
}

async fn start(server: &MockServer) -> (String, PendingAuthorization) {
    let session = AuthSession::new(0, provider_config(server)).expect("session");
    let state = session.state().to_string();
    let pending = session.listen().await.expect("listen");
    (state, pending)
}

fn base_url(pending: &PendingAuthorization) -> String {
    format!("http://{}", pending.local_addr())
}

async fn send_callback(base: &str, params: &[(&str, &str)]) -> reqwest::Response {
    browser()
        .get(format!("{base}/OAuthCallback"))
        .query(params)
        .send()
        .await
        .expect("callback request")
}

#[tokio::test]
async fn matching_state_exchanges_code_and_redirects_to_done_page() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code"))
        .and(body_string_contains("client_id=client-id"))
        .and(body_string_contains("client_secret=client-secret"))
        .respond_with(token_response())
        .expect(1)
        .mount(&provider)
        .await;

    let (state, pending) = start(&provider).await;
    let base = base_url(&pending);

    let resp = send_callback(&base, &[("state", state.as_str()), ("code", "auth-code")]).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(resp.headers()[LOCATION], "/OauthDone");

    let token = pending.wait().await.expect("token");
    assert_eq!(token.access_token, "fresh-access");
    assert_eq!(token.refresh_token, "fresh-refresh");
    assert!(token.is_valid());

    let done = browser()
        .get(format!("{base}/OauthDone"))
        .send()
        .await
        .expect("done page");
    assert_eq!(done.status(), StatusCode::OK);
    assert!(done.text().await.unwrap().contains("Authentication Completed"));
}

#[tokio::test]
async fn state_mismatch_fails_without_code_exchange() {
    let provider = MockServer::start().await;
    mount_token_endpoint(&provider, token_response(), 0).await;

    let (state, pending) = start(&provider).await;
    let base = base_url(&pending);

    let resp = send_callback(&base, &[("state", "forged"), ("code", "auth-code")]).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    match pending.wait().await {
        Err(AuthError::StateMismatch { expected, received }) => {
            assert_eq!(expected, state);
            assert_eq!(received, "forged");
        }
        other => panic!("expected StateMismatch, got {other:?}"),
    }
}

#[tokio::test]
async fn only_the_first_callback_is_processed() {
    let provider = MockServer::start().await;
    mount_token_endpoint(&provider, token_response(), 0).await;

    let (state, pending) = start(&provider).await;
    let base = base_url(&pending);

    let first = send_callback(&base, &[("state", "forged"), ("code", "x")]).await;
    assert_eq!(first.status(), StatusCode::BAD_REQUEST);
    let second = send_callback(&base, &[("state", state.as_str()), ("code", "x")]).await;
    assert_eq!(second.status(), StatusCode::GONE);

    assert!(matches!(
        pending.wait().await,
        Err(AuthError::StateMismatch { .. })
    ));
}

#[tokio::test]
async fn rejected_exchange_is_exchange_error() {
    let provider = MockServer::start().await;
    mount_token_endpoint(
        &provider,
        ResponseTemplate::new(401).set_body_string("invalid_client"),
        1,
    )
    .await;

    let (state, pending) = start(&provider).await;
    let resp = send_callback(
        &base_url(&pending),
        &[("state", state.as_str()), ("code", "auth-code")],
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    match pending.wait().await {
        Err(AuthError::Exchange(msg)) => assert!(msg.contains("invalid_client")),
        other => panic!("expected Exchange, got {other:?}"),
    }
}

#[tokio::test]
async fn token_is_delivered_after_browser_disconnects_mid_exchange() {
    let provider = MockServer::start().await;
    mount_token_endpoint(
        &provider,
        token_response().set_delay(Duration::from_millis(800)),
        1,
    )
    .await;

    let (state, pending) = start(&provider).await;
    let impatient = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let resp = impatient
        .get(format!("{}/OAuthCallback", base_url(&pending)))
        .query(&[("state", state.as_str()), ("code", "auth-code")])
        .send()
        .await;
    assert!(resp.is_err());

    let token = pending
        .wait_timeout(Duration::from_secs(3))
        .await
        .expect("token despite disconnect");
    assert_eq!(token.access_token, "fresh-access");
}

#[tokio::test]
async fn provider_error_is_access_denied() {
    let provider = MockServer::start().await;
    mount_token_endpoint(&provider, token_response(), 0).await;

    let (state, pending) = start(&provider).await;
    send_callback(
        &base_url(&pending),
        &[("state", state.as_str()), ("error", "access_denied")],
    )
    .await;

    match pending.wait().await {
        Err(AuthError::AccessDenied(error)) => assert_eq!(error, "access_denied"),
        other => panic!("expected AccessDenied, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_code_is_exchange_error() {
    let provider = MockServer::start().await;
    mount_token_endpoint(&provider, token_response(), 0).await;

    let (state, pending) = start(&provider).await;
    send_callback(&base_url(&pending), &[("state", state.as_str())]).await;

    assert!(matches!(pending.wait().await, Err(AuthError::Exchange(_))));
}

#[tokio::test]
async fn root_redirects_to_provider_with_state() {
    let provider = MockServer::start().await;
    let (state, pending) = start(&provider).await;

    let resp = browser()
        .get(format!("{}/", base_url(&pending)))
        .send()
        .await
        .expect("root");
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);

    let location = url::Url::parse(resp.headers()[LOCATION].to_str().unwrap()).unwrap();
    assert_eq!(location.path(), "/oauth/authorize");
    let sent_state = location
        .query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned());
    assert_eq!(sent_state.as_deref(), Some(state.as_str()));

    let cancel = CancellationToken::new();
    cancel.cancel();
    assert!(matches!(
        pending.wait_with_cancel(cancel).await,
        Err(AuthError::Cancelled)
    ));
}

#[tokio::test]
async fn wait_timeout_expires_without_callback() {
    let provider = MockServer::start().await;
    let (_state, pending) = start(&provider).await;
    assert!(matches!(
        pending.wait_timeout(Duration::from_millis(50)).await,
        Err(AuthError::Timeout(50))
    ));
}

#[tokio::test]
async fn concurrent_sessions_do_not_share_routes() {
    let provider = MockServer::start().await;
    let (_first_state, first) = start(&provider).await;
    let (second_state, second) = start(&provider).await;
    assert_ne!(first.local_addr(), second.local_addr());

    // The second session's state is unknown to the first server.
    send_callback(
        &base_url(&first),
        &[("state", second_state.as_str()), ("code", "x")],
    )
    .await;
    assert!(matches!(
        first.wait().await,
        Err(AuthError::StateMismatch { .. })
    ));
}

#[tokio::test]
async fn service_runs_flow_and_persists_token() {
    let provider = MockServer::start().await;
    mount_token_endpoint(&provider, token_response(), 1).await;

    let store = Arc::new(InMemoryTokenStore::new());
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let service = AuthService::new(store.clone())
        .with_port(0)
        .with_login_prompt(move |url| {
            let _ = tx.send(url.to_string());
        });
    let config = provider_config(&provider);
    let task = tokio::spawn(async move { service.get_token(&config).await });

    let login = rx
        .recv()
        .await
        .expect("login url")
        .replace("localhost", "127.0.0.1");
    let resp = browser().get(&login).send().await.expect("login page");
    let location = url::Url::parse(resp.headers()[LOCATION].to_str().unwrap()).unwrap();
    let state = location
        .query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .expect("state");

    let base = login.trim_end_matches('/').to_string();
    send_callback(&base, &[("state", state.as_str()), ("code", "auth-code")]).await;

    let token = task.await.expect("join").expect("token");
    assert_eq!(token.access_token, "fresh-access");
    assert_eq!(store.get().map(|t| t.access_token).as_deref(), Some("fresh-access"));
    assert_eq!(store.save_count(), 1);
}

#[tokio::test]
async fn service_prefers_valid_stored_token() {
    let store = Arc::new(InMemoryTokenStore::new());
    store.seed(token("stored"));
    let provider = MockServer::start().await;
    mount_token_endpoint(&provider, token_response(), 0).await;

    let service = AuthService::new(store.clone()).with_port(0);
    let token = service
        .get_token(&provider_config(&provider))
        .await
        .expect("stored token");
    assert_eq!(token.access_token, "stored");
    assert_eq!(store.save_count(), 0);
}
