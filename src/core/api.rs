//! HTTP + WebSocket API for ritual sessions
//!
//! Endpoints:
//! - GET /health - Health check
//! - POST /session/new - Create new session
//! - GET /session/{id} - Get session status
//! - POST /session/{id}/event - Feed a raw interaction event
//! - POST /session/{id}/boot - Apply a boot command
//! - GET /session/{id}/evidence - Export evidence snapshot
//! - PUT /session/{id}/evidence - Restore evidence snapshot
//! - POST /session/{id}/evidence/export - Write evidence snapshot to disk
//! - POST /replay - Replay a trace
//! - WS /ws/{id} - Live status updates

use axum::{
    extract::{Path, State, WebSocketUpgrade, ws::{Message, WebSocket}},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

use crate::core::config::AppConfig;
use crate::core::replay::replay_trace;
use crate::core::session::{BootCommand, RitualSession, SessionStatus};
use crate::core::snapshot::{parse_snapshot, save_snapshot};
use crate::core::thresholds::resolve_thresholds;
use crate::types::{
    DomainEvent, EvidenceSnapshot, RawInteractionEvent, ReplayOptions, ReplayResult,
    RitualContext, ThresholdOverrides,
};

/// Session plus its live update channel
#[derive(Debug)]
pub struct SessionEntry {
    pub session: RitualSession,
    pub update_tx: broadcast::Sender<SessionStatus>,
}

impl SessionEntry {
    fn publish(&self) -> SessionStatus {
        let status = self.session.status();
        // No subscribers is fine
        let _ = self.update_tx.send(status.clone());
        status
    }
}

/// App state
pub struct AppState {
    pub sessions: RwLock<HashMap<String, SessionEntry>>,
    pub config: AppConfig,
    next_id: AtomicU64,
}

/// Create new session request
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionRequest {
    pub ritual: Option<String>,
    pub thresholds: Option<ThresholdOverrides>,
}

/// Create new session response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionResponse {
    pub session_id: String,
    pub websocket_url: String,
}

/// Feed event response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub events: Vec<DomainEvent>,
    pub status: SessionStatus,
}

/// Boot command request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootRequest {
    pub command: BootCommand,
    #[serde(default)]
    pub timestamp_ms: u64,
}

/// Replay request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayRequest {
    pub trace: Vec<RawInteractionEvent>,
    #[serde(default)]
    pub options: Option<ReplayOptions>,
}

/// Evidence export response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub path: String,
    pub event_count: u64,
}

/// Health response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions_active: usize,
}

/// Create the API router
pub fn create_router(config: AppConfig) -> Router {
    let state = Arc::new(AppState {
        sessions: RwLock::new(HashMap::new()),
        config,
        next_id: AtomicU64::new(1),
    });

    Router::new()
        .route("/health", get(health))
        .route("/session/new", post(create_session))
        .route("/session/:id", get(get_session))
        .route("/session/:id/event", post(feed_event))
        .route("/session/:id/boot", post(boot_command))
        .route("/session/:id/evidence", get(get_evidence).put(put_evidence))
        .route("/session/:id/evidence/export", post(export_evidence))
        .route("/replay", post(replay))
        .route("/ws/:id", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sessions = state.sessions.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        sessions_active: sessions.len(),
    })
}

/// Create new session
async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewSessionRequest>,
) -> Json<NewSessionResponse> {
    let n = state.next_id.fetch_add(1, Ordering::Relaxed);
    let session_id = format!("session-{:06}", n);

    let ritual = req.ritual.unwrap_or_else(|| state.config.ritual.clone());
    let overrides = req.thresholds.unwrap_or(state.config.thresholds);
    let session = RitualSession::new(
        RitualContext::new(ritual.clone()),
        resolve_thresholds(Some(&overrides)),
        state.config.features,
    );
    let (tx, _) = broadcast::channel(100);

    let mut sessions = state.sessions.write().await;
    sessions.insert(
        session_id.clone(),
        SessionEntry {
            session,
            update_tx: tx,
        },
    );
    info!(session = %session_id, ritual = %ritual, "session created");

    Json(NewSessionResponse {
        websocket_url: format!("/ws/{}", session_id),
        session_id,
    })
}

/// Get session status
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionStatus>, StatusCode> {
    let sessions = state.sessions.read().await;
    let entry = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(entry.session.status()))
}

/// Feed one raw interaction event
async fn feed_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(raw): Json<RawInteractionEvent>,
) -> Result<Json<EventResponse>, StatusCode> {
    let mut sessions = state.sessions.write().await;
    let entry = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;

    let step = entry.session.feed(&raw);
    let status = entry.publish();
    Ok(Json(EventResponse {
        events: step.events,
        status,
    }))
}

/// Apply a boot lifecycle command
async fn boot_command(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<BootRequest>,
) -> Result<Json<SessionStatus>, StatusCode> {
    let mut sessions = state.sessions.write().await;
    let entry = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;

    entry.session.dispatch_boot(req.command, req.timestamp_ms);
    Ok(Json(entry.publish()))
}

/// Export the session's evidence store
async fn get_evidence(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<EvidenceSnapshot>, StatusCode> {
    let sessions = state.sessions.read().await;
    let entry = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(entry.session.export_evidence(now_ms())))
}

/// Restore the session's evidence store from a snapshot
async fn put_evidence(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(raw): Json<serde_json::Value>,
) -> Result<StatusCode, StatusCode> {
    let mut sessions = state.sessions.write().await;
    let entry = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;

    let snapshot = parse_snapshot(&raw).ok_or(StatusCode::BAD_REQUEST)?;
    entry.session.restore_evidence(&snapshot);
    entry.publish();
    Ok(StatusCode::NO_CONTENT)
}

/// Write the session's evidence snapshot to the configured directory
async fn export_evidence(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ExportResponse>, StatusCode> {
    let sessions = state.sessions.read().await;
    let entry = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;

    let snapshot = entry.session.export_evidence(now_ms());
    let path = save_snapshot(&snapshot, &state.config.server.evidence_dir).map_err(|e| {
        warn!(session = %id, error = %e, "evidence export failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(ExportResponse {
        path: path.display().to_string(),
        event_count: snapshot.event_count,
    }))
}

/// Replay a trace statelessly
async fn replay(Json(req): Json<ReplayRequest>) -> Json<ReplayResult> {
    let options = req.options.unwrap_or_default();
    Json(replay_trace(&req.trace, &options))
}

/// WebSocket handler for live updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, StatusCode> {
    let sessions = state.sessions.read().await;
    let entry = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let rx = entry.update_tx.subscribe();
    drop(sessions);

    Ok(ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, rx).await;
    }))
}

/// Handle WebSocket connection
async fn handle_websocket(mut socket: WebSocket, mut rx: broadcast::Receiver<SessionStatus>) {
    while let Ok(status) = rx.recv().await {
        let json = serde_json::to_string(&status).unwrap_or_default();
        if socket.send(Message::Text(json)).await.is_err() {
            break;
        }
    }
}

/// Wall clock in epoch milliseconds
fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// Run the API server
pub async fn run_server(addr: &str, config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router(config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "ritual API listening");
    axum::serve(listener, router).await?;
    Ok(())
}
