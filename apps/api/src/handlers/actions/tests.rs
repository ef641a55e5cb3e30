use axum::body::to_bytes;
use axum::extract::{Extension, Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use opsgate_domain::{AuditHistoryQuery, AuditMode, ExecutionMode};
use serde_json::Value;

use super::dispatch_action_handler;
use crate::handlers::test_support::{TestApp, test_app};

fn path(resource: &str, provider: &str, action: &str) -> Path<(String, String, String)> {
    Path((resource.to_owned(), provider.to_owned(), action.to_owned()))
}

async fn dispatch(
    app: &TestApp,
    mode: ExecutionMode,
    route: (&str, &str, &str),
    headers: HeaderMap,
) -> Response {
    let response = dispatch_action_handler(
        State(app.state.clone()),
        Extension(mode),
        path(route.0, route.1, route.2),
        headers,
    )
    .await;
    assert!(response.is_ok());
    response.unwrap_or_else(|_| unreachable!())
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_else(|_| unreachable!());
    serde_json::from_slice(&bytes).unwrap_or_else(|_| unreachable!())
}

async fn recorded_modes(app: &TestApp) -> Vec<AuditMode> {
    app.state
        .audit_log_service
        .read_history(&AuditHistoryQuery::default())
        .await
        .unwrap_or_else(|_| unreachable!())
        .into_iter()
        .map(|entry| entry.mode)
        .collect()
}

#[tokio::test]
async fn mock_dispatch_describes_command_without_running_it() {
    let app = test_app().await;

    let response = dispatch(
        &app,
        ExecutionMode::Mock,
        ("web", "systemd", "restart"),
        HeaderMap::new(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["mode"], "mock");
    assert_eq!(body["command"], "systemctl restart nginx");
    assert_eq!(body["category"], "admin");
    assert_eq!(body["destructive"], true);
    assert!(body["output"].is_null());
    assert!(body["dispatch_id"].as_str().is_some_and(|id| !id.is_empty()));
    assert!(app.runner.calls().is_empty());
    assert_eq!(recorded_modes(&app).await, vec![AuditMode::Mock]);
}

#[tokio::test]
async fn unknown_action_is_not_found() {
    let app = test_app().await;

    let response = dispatch_action_handler(
        State(app.state.clone()),
        Extension(ExecutionMode::Live),
        path("web", "http", "missing"),
        HeaderMap::new(),
    )
    .await;

    assert!(response.is_err_and(|error| error.status() == StatusCode::NOT_FOUND));
    assert!(recorded_modes(&app).await.is_empty());
}

#[tokio::test]
async fn blank_route_segment_is_not_found() {
    let app = test_app().await;

    let response = dispatch_action_handler(
        State(app.state.clone()),
        Extension(ExecutionMode::Live),
        path(" ", "http", "status"),
        HeaderMap::new(),
    )
    .await;

    assert!(response.is_err_and(|error| error.status() == StatusCode::NOT_FOUND));
    assert!(recorded_modes(&app).await.is_empty());
    assert!(app.runner.calls().is_empty());
}

#[tokio::test]
async fn destructive_live_dispatch_requires_confirmation_header() {
    let app = test_app().await;

    let response = dispatch(
        &app,
        ExecutionMode::Live,
        ("web", "systemd", "restart"),
        HeaderMap::new(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["mode"], "blocked");
    assert!(app.runner.calls().is_empty());

    let mut headers = HeaderMap::new();
    headers.insert("x-confirm-destructive", HeaderValue::from_static("YES"));
    let response = dispatch(
        &app,
        ExecutionMode::Live,
        ("web", "systemd", "restart"),
        headers,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["mode"], "live");
    assert_eq!(body["returncode"], 0);
    assert_eq!(body["output"], "ran systemctl restart nginx");

    assert_eq!(app.runner.calls(), vec!["systemctl restart nginx".to_owned()]);
    assert_eq!(
        recorded_modes(&app).await,
        vec![AuditMode::Live, AuditMode::Blocked]
    );
}

#[tokio::test]
async fn lock_held_by_other_operator_returns_locked() {
    let app = test_app().await;
    let acquired = app
        .state
        .deploy_lock_service
        .acquire("alice", std::time::Duration::from_secs(600))
        .await;
    assert!(acquired.is_ok_and(|attempt| attempt.granted));

    let mut headers = HeaderMap::new();
    headers.insert("x-operator", HeaderValue::from_static("bob"));
    let response = dispatch(&app, ExecutionMode::Live, ("web", "app", "deploy"), headers).await;
    assert_eq!(response.status(), StatusCode::LOCKED);
    let body = body_json(response).await;
    assert_eq!(body["output"], "Deploy lock held by alice");
    assert!(app.runner.calls().is_empty());
    assert!(recorded_modes(&app).await.is_empty());

    let mut headers = HeaderMap::new();
    headers.insert("x-operator", HeaderValue::from_static("alice"));
    let response = dispatch(&app, ExecutionMode::Live, ("web", "app", "deploy"), headers).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn connect_ping_runs_probe_and_ssh_without_gateway_explains() {
    let app = test_app().await;

    let response = dispatch(
        &app,
        ExecutionMode::Live,
        ("web", "net", "ping"),
        HeaderMap::new(),
    )
    .await;
    let body = body_json(response).await;
    assert_eq!(body["mode"], "live");
    assert_eq!(body["protocol"], "ping");
    assert_eq!(body["returncode"], 0);

    let response = dispatch(
        &app,
        ExecutionMode::Live,
        ("web", "shell", "ssh"),
        HeaderMap::new(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["mode"], "mock");
    assert_eq!(body["protocol"], "ssh");
    assert_eq!(body["output"], "Remote desktop gateway not configured");
    assert!(body["client_url"].is_null());

    assert_eq!(app.runner.calls(), vec!["ping -c 1 198.51.100.10".to_owned()]);
}
