//! Control-plane HTTP API and static asset server.
//!
//! | Method | Path                   | Handler            |
//! |--------|------------------------|--------------------|
//! | GET    | `/api/status`          | [`status`]         |
//! | GET    | `/api/servers`         | [`servers`]        |
//! | POST   | `/api/start`           | [`start`]          |
//! | POST   | `/api/stop`            | [`stop`]           |
//! | POST   | `/api/refresh-servers` | [`refresh_servers`]|
//! | GET    | `/`                    | `index.html`       |
//! | GET    | `/static/*`            | static assets      |
//!
//! Every API route answers `200` with a JSON body; failures are reported in
//! the body's `success`/`error` fields, which is what the web UI reads.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::application::{build_relay_config, describe_status};
use crate::domain::{
    BridgeConfig, GameServerDescriptor, RefreshResponse, StartRequest, StartResponse,
    StatusResponse, StopResponse,
};
use crate::infrastructure::directory::ServerDirectory;
use crate::infrastructure::error::RelayError;
use crate::infrastructure::relay_manager::RelayManager;

/// State shared by every handler.
pub struct ControlState {
    pub config: BridgeConfig,
    pub manager: RelayManager,
    pub directory: ServerDirectory,
}

pub type SharedControlState = Arc<ControlState>;

impl ControlState {
    pub fn new(config: BridgeConfig, directory: ServerDirectory) -> SharedControlState {
        Arc::new(ControlState {
            config,
            manager: RelayManager::new(),
            directory,
        })
    }
}

/// Builds the router once at process start.
pub fn create_router(state: SharedControlState) -> Router {
    let static_dir = state.config.static_dir.clone();
    let index = ServeFile::new(static_dir.join("index.html"));

    Router::new()
        .route("/api/status", get(status))
        .route("/api/servers", get(servers))
        .route("/api/start", post(start))
        .route("/api/stop", post(stop))
        .route("/api/refresh-servers", post(refresh_servers))
        .route_service("/", index)
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// GET /api/status
pub async fn status(State(state): State<SharedControlState>) -> Json<StatusResponse> {
    Json(describe_status(&state.manager.status()))
}

/// GET /api/servers
pub async fn servers(State(state): State<SharedControlState>) -> Json<Vec<GameServerDescriptor>> {
    Json(state.directory.servers().await)
}

/// POST /api/start
///
/// The body is parsed by hand so malformed JSON gets the same
/// `{"success":false,...}` shape as every other failure instead of axum's
/// plain-text rejection.
pub async fn start(State(state): State<SharedControlState>, body: Bytes) -> Json<StartResponse> {
    let req: StartRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            warn!("rejecting start request: {e}");
            return Json(StartResponse::failed("Invalid request"));
        }
    };

    let relay_config = match build_relay_config(&req, &state.config) {
        Ok(cfg) => cfg,
        Err(e) => return Json(StartResponse::failed(e.to_string())),
    };

    match state.manager.start(relay_config).await {
        Ok(addr) => {
            info!("bridge started on port {} for {}", addr.port(), req.server.trim());
            Json(StartResponse::ok())
        }
        Err(RelayError::AlreadyRunning) => Json(StartResponse::failed("Bridge already running")),
        Err(e) => {
            warn!("bridge start failed: {e}");
            Json(StartResponse::failed(e.to_string()))
        }
    }
}

/// POST /api/stop
pub async fn stop(State(state): State<SharedControlState>) -> Json<StopResponse> {
    if let Some(backend) = state.manager.backend_address() {
        info!("stopping bridge to {backend}");
    }
    state.manager.stop().await;
    Json(StopResponse { success: true })
}

/// POST /api/refresh-servers
pub async fn refresh_servers(State(state): State<SharedControlState>) -> Json<RefreshResponse> {
    match state.directory.refresh().await {
        Ok(_) => Json(RefreshResponse {
            success: true,
            error: None,
        }),
        Err(e) => Json(RefreshResponse {
            success: false,
            error: Some(e.to_string()),
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
