use axum::Json;
use axum::body::to_bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use super::{
    acquire_lock_handler, clear_history_handler, drift_check_handler, gate_check_handler,
    history_handler, lock_status_handler, release_lock_handler,
};
use crate::dto::{AcquireLockRequest, HistoryQuery, ReleaseLockRequest, ResourcesRequest};
use crate::handlers::test_support::{empty_test_app, test_app};

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_else(|_| unreachable!());
    serde_json::from_slice(&bytes).unwrap_or_else(|_| unreachable!())
}

fn acquire_request(operator: &str) -> Json<AcquireLockRequest> {
    Json(AcquireLockRequest {
        operator: operator.to_owned(),
        ttl_seconds: 600,
    })
}

fn release_request(operator: Option<&str>) -> Option<Json<ReleaseLockRequest>> {
    Some(Json(ReleaseLockRequest {
        operator: operator.map(str::to_owned),
    }))
}

fn resources(names: &[&str]) -> Json<ResourcesRequest> {
    Json(ResourcesRequest {
        resources: names.iter().map(|name| (*name).to_owned()).collect(),
    })
}

#[tokio::test]
async fn second_operator_cannot_acquire_held_lock() {
    let app = test_app().await;

    let first = acquire_lock_handler(State(app.state.clone()), acquire_request("alice")).await;
    assert!(first.is_ok());
    let response = first.unwrap_or_else(|_| unreachable!()).into_response();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["acquired"], true);
    assert_eq!(body["operator"], "alice");
    assert_eq!(body["locked"], true);
    assert!(body.get("message").is_none());

    let second = acquire_lock_handler(State(app.state.clone()), acquire_request("bob")).await;
    assert!(second.is_ok());
    let response = second.unwrap_or_else(|_| unreachable!()).into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["acquired"], false);
    assert_eq!(body["message"], "Lock held by alice");
    assert_eq!(body["operator"], "alice");
}

#[tokio::test]
async fn release_by_other_operator_is_forbidden_but_force_release_succeeds() {
    let app = test_app().await;
    let _ = acquire_lock_handler(State(app.state.clone()), acquire_request("alice")).await;

    let denied =
        release_lock_handler(State(app.state.clone()), release_request(Some("bob"))).await;
    assert!(denied.is_ok());
    let response = denied.unwrap_or_else(|_| unreachable!()).into_response();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["released"], false);
    assert_eq!(body["message"], "Lock held by alice, not bob");

    let forced = release_lock_handler(State(app.state.clone()), None).await;
    assert!(forced.is_ok());
    let response = forced.unwrap_or_else(|_| unreachable!()).into_response();
    assert_eq!(response.status(), StatusCode::OK);

    let status = lock_status_handler(State(app.state.clone())).await;
    assert!(status.is_ok_and(|Json(state)| !state.locked && state.operator.is_none()));
}

#[tokio::test]
async fn blank_release_operator_is_a_force_release() {
    let app = test_app().await;

    for operator in ["", "   "] {
        let _ = acquire_lock_handler(State(app.state.clone()), acquire_request("alice")).await;
        let released =
            release_lock_handler(State(app.state.clone()), release_request(Some(operator))).await;
        assert!(released.is_ok());
        let response = released.unwrap_or_else(|_| unreachable!()).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["released"], true);

        let status = lock_status_handler(State(app.state.clone())).await;
        assert!(status.is_ok_and(|Json(state)| !state.locked));
    }
}

#[tokio::test]
async fn acquire_rejects_blank_operator() {
    let app = test_app().await;

    let result = acquire_lock_handler(State(app.state.clone()), acquire_request("  ")).await;

    assert!(result.is_err_and(|error| error.status() == StatusCode::BAD_REQUEST));
}

#[tokio::test]
async fn gate_check_records_monitor_runs_and_history_lists_them() {
    let app = test_app().await;

    let Json(report) = gate_check_handler(State(app.state.clone()), resources(&["web", "db"])).await;
    assert!(report.gate_pass);
    assert_eq!(report.resources_checked, 1);
    assert_eq!(report.resources_skipped, 1);
    assert!(report.results.get("web").is_some_and(|gate| gate.healthy == Some(true)
        && gate.check_count == 1
        && gate.checks.contains_key("http/status")));
    assert!(
        report
            .results
            .get("db")
            .is_some_and(|gate| gate.healthy.is_none())
    );

    let history = history_handler(
        State(app.state.clone()),
        Query(HistoryQuery {
            limit: Some(10),
            resource: Some("web".to_owned()),
            since: None,
        }),
    )
    .await;
    assert!(history.is_ok_and(|Json(history)| history.count == 1
        && history.entries[0].mode == "live"
        && history.entries[0].category.as_deref() == Some("monitor")));
}

#[tokio::test]
async fn drift_check_uses_gate_run_as_baseline() {
    let app = test_app().await;
    let drift_status = |report: &crate::dto::DriftReportResponse| {
        report
            .results
            .get("web")
            .and_then(|drift| drift.checks.get("http/status"))
            .map(|check| check.drift.clone())
    };

    let Json(before) = drift_check_handler(State(app.state.clone()), resources(&["web"])).await;
    assert_eq!(drift_status(&before).as_deref(), Some("no_baseline"));
    assert!(!before.has_drift);

    let _ = gate_check_handler(State(app.state.clone()), resources(&["web"])).await;

    let Json(after) = drift_check_handler(State(app.state.clone()), resources(&["web"])).await;
    assert_eq!(drift_status(&after).as_deref(), Some("ok"));
    assert_eq!(after.resources_checked, 1);
}

#[tokio::test]
async fn history_rejects_non_finite_since() {
    let app = test_app().await;

    let history = history_handler(
        State(app.state.clone()),
        Query(HistoryQuery {
            limit: None,
            resource: None,
            since: Some(f64::NAN),
        }),
    )
    .await;

    assert!(history.is_err_and(|error| error.status() == StatusCode::BAD_REQUEST));
}

#[tokio::test]
async fn clear_history_empties_the_log() {
    let app = test_app().await;
    let _ = gate_check_handler(State(app.state.clone()), resources(&["web"])).await;

    let cleared = clear_history_handler(State(app.state.clone())).await;
    assert!(cleared.is_ok_and(|status| status == StatusCode::NO_CONTENT));

    let history = history_handler(
        State(app.state.clone()),
        Query(HistoryQuery {
            limit: None,
            resource: None,
            since: None,
        }),
    )
    .await;
    assert!(history.is_ok_and(|Json(history)| history.count == 0));
}

#[tokio::test]
async fn gate_check_over_empty_catalog_passes_vacuously() {
    let app = empty_test_app().await;

    let Json(report) = gate_check_handler(State(app.state.clone()), resources(&["web"])).await;

    assert!(report.gate_pass);
    assert_eq!(report.resources_checked, 0);
    assert_eq!(report.resources_skipped, 1);
}
