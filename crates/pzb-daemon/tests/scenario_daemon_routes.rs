//! In-process scenario tests for pzb-daemon HTTP endpoints.
//!
//! These tests spin up the Axum router **without** binding a TCP socket.
//! Each test calls `routes::build_router` and drives it via
//! `tower::ServiceExt::oneshot`; no network I/O required.

use std::sync::Arc;

use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use pzb_daemon::{routes, state};
use pzb_engine::{Allocator, FairnessPolicy, Vocabulary};
use tower::ServiceExt; // oneshot

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn fresh_state(policy: FairnessPolicy) -> Arc<state::AppState> {
    Arc::new(state::AppState::new(
        Allocator::new(policy, 8),
        Vocabulary::default(),
        "test-hash".to_string(),
    ))
}

/// Drive the router with a single request and return (status, body_bytes).
async fn call(router: axum::Router, req: Request<axum::body::Body>) -> (StatusCode, bytes::Bytes) {
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    (status, body)
}

fn parse_json(b: bytes::Bytes) -> serde_json::Value {
    serde_json::from_slice(&b).expect("body is not valid JSON")
}

fn get(uri: &str) -> Request<axum::body::Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap()
}

async fn command(
    st: &Arc<state::AppState>,
    requester: &str,
    arg: &str,
) -> (StatusCode, serde_json::Value) {
    let body = serde_json::json!({ "requester": requester, "arg": arg }).to_string();
    let req = Request::builder()
        .method("POST")
        .uri("/v1/command")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body))
        .unwrap();
    let (status, bytes) = call(routes::build_router(Arc::clone(st)), req).await;
    (status, parse_json(bytes))
}

// ---------------------------------------------------------------------------
// GET /v1/health, /v1/status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_returns_200_ok_true() {
    let st = fresh_state(FairnessPolicy::ProportionalScaling);
    let (status, body) = call(routes::build_router(st), get("/v1/health")).await;
    assert_eq!(status, StatusCode::OK);

    let json = parse_json(body);
    assert_eq!(json["ok"], true);
    assert_eq!(json["service"], "pzb-daemon");
}

#[tokio::test]
async fn status_reports_policy_and_empty_ledger() {
    let st = fresh_state(FairnessPolicy::EvenSplitOfExtras);
    let (status, body) = call(routes::build_router(st), get("/v1/status")).await;
    assert_eq!(status, StatusCode::OK);

    let json = parse_json(body);
    assert_eq!(json["fairness_policy"], "even_split_of_extras");
    assert_eq!(json["package_size"], 8);
    assert_eq!(json["config_hash"], "test-hash");
    assert_eq!(json["requester_count"], 0);
    assert_eq!(json["total_requested"], 0);
}

// ---------------------------------------------------------------------------
// POST /v1/command
// ---------------------------------------------------------------------------

#[tokio::test]
async fn request_is_recorded_and_visible_in_ledger() {
    let st = fresh_state(FairnessPolicy::ProportionalScaling);

    let (status, json) = command(&st, "Alice", "3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["reply"], "Alice requested 3 slices.");
    assert_eq!(json["outcome"]["kind"], "request_recorded");

    let (status, body) = call(routes::build_router(Arc::clone(&st)), get("/v1/ledger")).await;
    assert_eq!(status, StatusCode::OK);
    let ledger = parse_json(body);
    assert_eq!(ledger["requests"]["Alice"], 3);
    assert_eq!(ledger["total_requested"], 3);
    assert_eq!(ledger["cycle"], 1);
}

#[tokio::test]
async fn total_on_empty_ledger_is_422_empty_ledger() {
    let st = fresh_state(FairnessPolicy::ProportionalScaling);
    let (status, json) = command(&st, "Alice", "total").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["ok"], false);
    assert_eq!(json["code"], "empty_ledger");
    assert_eq!(json["reply"], "Error: No slices have been requested yet.");
}

#[tokio::test]
async fn price_returns_breakdown() {
    let st = fresh_state(FairnessPolicy::ProportionalScaling);
    command(&st, "Alice", "3").await;
    command(&st, "Bob", "1").await;

    let (status, json) = command(&st, "Bob", "$10").await;
    assert_eq!(status, StatusCode::OK);
    let outcome = &json["outcome"];
    assert_eq!(outcome["kind"], "breakdown");
    assert_eq!(outcome["required_packages"], 1);
    assert_eq!(outcome["leftover_units"], 0);
    assert_eq!(outcome["shares"]["Alice"]["assigned"], 6);
    assert_eq!(outcome["shares"]["Bob"]["assigned"], 2);
    assert_eq!(outcome["shares"]["Alice"]["owed"], 7.5);

    let reply = json["reply"].as_str().unwrap();
    assert!(reply.contains("- **Alice** gets 6 slices for **$7.50** (requested 3)"));
    assert!(reply.ends_with("There will be 0 extra slices."));
}

#[tokio::test]
async fn negative_cost_and_bad_withdrawal_are_refused() {
    let st = fresh_state(FairnessPolicy::ProportionalScaling);
    command(&st, "Alice", "2").await;

    let (status, json) = command(&st, "Alice", "$-4").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "invalid_cost");

    let (status, json) = command(&st, "Carol", "0").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "invalid_request");

    let (status, json) = command(&st, "Alice", "-1").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "invalid_request");
}

#[tokio::test]
async fn reset_rotates_cycle_id_and_clears_ledger() {
    let st = fresh_state(FairnessPolicy::ProportionalScaling);
    command(&st, "Alice", "5").await;
    let (before_id, _) = st.snapshot().await;

    let (status, json) = command(&st, "Alice", "RESET").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["reply"], "Values have been reset.");
    assert_eq!(json["outcome"]["cycle"], 2);

    let (after_id, snap) = st.snapshot().await;
    assert_ne!(before_id, after_id);
    assert!(snap.is_empty());
}

#[tokio::test]
async fn unknown_argument_returns_help() {
    let st = fresh_state(FairnessPolicy::ProportionalScaling);
    let (status, json) = command(&st, "Alice", "anchovies").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["outcome"]["kind"], "help");
    assert!(json["reply"]
        .as_str()
        .unwrap()
        .starts_with("Welcome to the pizza ordering bot!"));
}

#[tokio::test]
async fn mutation_is_broadcast_on_bus() {
    let st = fresh_state(FairnessPolicy::ProportionalScaling);
    let mut rx = st.bus.subscribe();

    command(&st, "Alice", "4").await;

    match rx.recv().await.expect("bus message") {
        state::BusMsg::LedgerChanged { snapshot, .. } => {
            assert_eq!(snapshot.units_for("Alice"), 4);
        }
        other => panic!("expected LedgerChanged, got {other:?}"),
    }
}

#[tokio::test]
async fn concurrent_requests_all_land() {
    let st = fresh_state(FairnessPolicy::ProportionalScaling);

    let mut handles = Vec::new();
    for i in 0..32 {
        let st = Arc::clone(&st);
        handles.push(tokio::spawn(async move {
            let who = format!("p{i}");
            let cmd = pzb_engine::Command::Request { units: 1 };
            st.execute(&who, &cmd).await
        }));
    }
    for h in handles {
        h.await.expect("task").expect("request accepted");
    }

    let (_, snap) = st.snapshot().await;
    assert_eq!(snap.requester_count(), 32);
    assert_eq!(snap.total_requested(), 32);
}
