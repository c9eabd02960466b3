//! Axum-based relay server the host application polls.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use rusty_sprite_core::error::BridgeError;
use rusty_sprite_core::protocol::{RELAY_PROTOCOL_VERSION, ResultAck, ScriptResult};

use crate::proxy::ExecutionProxy;
use crate::session::{Delivery, IDLE_SESSION_RETENTION};

#[derive(Debug, Default, Deserialize)]
struct PollQuery {
    /// Long-poll window in ms; 0 answers immediately.
    #[serde(default)]
    wait_ms: u64,
}

/// Routes for the relay. `/poll` and `/result` address the default session.
pub fn relay_router(proxy: Arc<ExecutionProxy>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/poll", get(default_poll_handler))
        .route("/result", post(default_result_handler))
        .route("/hosts/{session}/poll", get(poll_handler))
        .route("/hosts/{session}/result", post(result_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(proxy)
}

/// Serve the relay on an already bound listener until `shutdown` resolves.
pub async fn serve_relay(
    listener: TcpListener,
    proxy: Arc<ExecutionProxy>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    axum::serve(listener, relay_router(proxy))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn health_handler(State(proxy): State<Arc<ExecutionProxy>>) -> impl IntoResponse {
    proxy.sessions().prune_idle(IDLE_SESSION_RETENTION);
    let sessions = proxy.sessions().statuses(proxy.settings().stale_after);
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": RELAY_PROTOCOL_VERSION,
        "default_session": proxy.settings().default_session,
        "sessions": sessions,
    }))
}

async fn poll_handler(
    State(proxy): State<Arc<ExecutionProxy>>,
    Path(session): Path<String>,
    Query(query): Query<PollQuery>,
) -> Response {
    poll_session(&proxy, &session, &query).await
}

async fn default_poll_handler(
    State(proxy): State<Arc<ExecutionProxy>>,
    Query(query): Query<PollQuery>,
) -> Response {
    let session = proxy.settings().default_session.clone();
    poll_session(&proxy, &session, &query).await
}

async fn result_handler(
    State(proxy): State<Arc<ExecutionProxy>>,
    Path(session): Path<String>,
    body: Bytes,
) -> Response {
    accept_result(&proxy, &session, &body)
}

async fn default_result_handler(State(proxy): State<Arc<ExecutionProxy>>, body: Bytes) -> Response {
    let session = proxy.settings().default_session.clone();
    accept_result(&proxy, &session, &body)
}

async fn poll_session(proxy: &ExecutionProxy, session: &str, query: &PollQuery) -> Response {
    let slot = proxy.sessions().slot(session);
    match slot.poll(Duration::from_millis(query.wait_ms)).await {
        Some(script) => {
            debug!(session = %session, request_id = %script.id, "Script handed to host");
            Json(script).into_response()
        }
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

fn accept_result(proxy: &ExecutionProxy, session: &str, body: &[u8]) -> Response {
    // Results never register a session; only polls do
    let slot = proxy.sessions().get(session);

    let result: ScriptResult = match serde_json::from_slice(body) {
        Ok(result) => result,
        Err(e) => {
            let message = format!("malformed result payload: {e}");
            let failed = slot
                .as_ref()
                .and_then(|slot| slot.fail_in_flight(BridgeError::Transport(message.clone())));
            warn!(session = %session, failed_request = ?failed, "{message}");
            return ack(StatusCode::BAD_REQUEST, "error", Some(message));
        }
    };

    let id = result.id.clone();
    let delivery = match &slot {
        Some(slot) => slot.deliver(result),
        None => Delivery::Unexpected { id: result.id },
    };
    match delivery {
        Delivery::Accepted => {
            debug!(session = %session, request_id = %id, "Result accepted");
            ack(StatusCode::OK, "ok", None)
        }
        Delivery::Unexpected { id } => {
            warn!(session = %session, request_id = %id, "Result for a script nobody is waiting on");
            ack(
                StatusCode::CONFLICT,
                "error",
                Some(format!("no script with id '{id}' is awaiting a result")),
            )
        }
    }
}

fn ack(status: StatusCode, label: &str, message: Option<String>) -> Response {
    let body = ResultAck {
        status: label.to_string(),
        message,
    };
    (status, Json(body)).into_response()
}
