//! Axum router and all HTTP handlers for pzb-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. The scenario tests in `tests/` compose the bare router.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use pzb_engine::{render_error, render_outcome, Command};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

use crate::{
    api_types::{
        CommandErrorResponse, CommandRequest, CommandResponse, HealthResponse, LedgerResponse,
        StatusResponse,
    },
    state::{uptime_secs, AppState, BusMsg},
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/status", get(status_handler))
        .route("/v1/ledger", get(ledger_handler))
        .route("/v1/command", post(command_handler))
        .route("/v1/stream", get(stream))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/status
// ---------------------------------------------------------------------------

pub(crate) async fn status_handler(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let (cycle_id, snap) = st.snapshot().await;

    (
        StatusCode::OK,
        Json(StatusResponse {
            daemon_uptime_secs: uptime_secs(),
            fairness_policy: st.allocator.policy(),
            package_size: st.allocator.package_size(),
            config_hash: st.config_hash.clone(),
            cycle_id,
            requester_count: snap.requester_count(),
            total_requested: snap.total_requested(),
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/ledger
// ---------------------------------------------------------------------------

pub(crate) async fn ledger_handler(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let (cycle_id, snap) = st.snapshot().await;
    let total_requested = snap.total_requested();

    (
        StatusCode::OK,
        Json(LedgerResponse {
            cycle_id,
            cycle: snap.cycle,
            requests: snap.requests,
            total_requested,
        }),
    )
}

// ---------------------------------------------------------------------------
// POST /v1/command
// ---------------------------------------------------------------------------

/// Chat-style entry point: one requester, one free-text argument.
///
/// Engine errors are user-facing, not server faults: they come back as 422
/// with the rendered reply so the transport can post it unchanged.
pub(crate) async fn command_handler(
    State(st): State<Arc<AppState>>,
    Json(req): Json<CommandRequest>,
) -> Response {
    let command = Command::parse_with_marker(&req.arg, &st.vocabulary.currency_marker);

    match st.execute(&req.requester, &command).await {
        Ok(outcome) => {
            info!(requester = %req.requester, arg = %req.arg, "command");
            let reply = render_outcome(&outcome, &st.vocabulary);
            (
                StatusCode::OK,
                Json(CommandResponse {
                    ok: true,
                    reply,
                    outcome,
                }),
            )
                .into_response()
        }
        Err(err) => {
            warn!(requester = %req.requester, arg = %req.arg, code = err.code(), "command refused: {err}");
            let _ = st.bus.send(BusMsg::LogLine {
                level: "WARN".to_string(),
                msg: format!("{}: {err}", req.requester),
            });
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(CommandErrorResponse {
                    ok: false,
                    error: err.to_string(),
                    code: err.code().to_string(),
                    reply: render_error(&err, &st.vocabulary),
                }),
            )
                .into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// GET /v1/stream  (SSE)
// ---------------------------------------------------------------------------

pub(crate) async fn stream(State(st): State<Arc<AppState>>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));

    let rx = st.bus.subscribe();
    let events = broadcast_to_sse(rx);

    (headers, Sse::new(events).keep_alive(KeepAlive::new())).into_response()
}

fn broadcast_to_sse(
    rx: broadcast::Receiver<BusMsg>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(m) => {
                let event_name = match &m {
                    BusMsg::Heartbeat { .. } => "heartbeat",
                    BusMsg::LedgerChanged { .. } => "ledger",
                    BusMsg::LogLine { .. } => "log",
                };
                let data = serde_json::to_string(&m).ok()?;
                Some(Ok(Event::default().event(event_name).data(data)))
            }
            Err(_) => None, // lagged / closed
        }
    })
}
