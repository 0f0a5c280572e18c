use crate::address::AddressRecord;
use crate::error::{AppError, AppResult};
use crate::keys::decode_wif;
use crate::web::websocket::{ws_handler, AppState};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store_connected: bool,
    pub connections: usize,
}

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store_connected: state.store().is_available().await,
        connections: state.connection_count(),
    })
}

/// Re-derive the addresses controlled by a WIF key
pub async fn derive_from_wif(
    Path(wif): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<AddressRecord>>> {
    let decoded = decode_wif(&wif)?;
    let deriver = &state.scan.deriver;
    if decoded.network != deriver.network() {
        return Err(AppError::invalid_wif(format!(
            "key is for {:?}, server derives {:?} addresses",
            decoded.network,
            deriver.network()
        )));
    }
    Ok(Json(deriver.derive(&decoded.key)?))
}

/// Create the router; `static_dir` is served as a fallback when set
pub fn create_router(state: AppState, static_dir: Option<&str>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        .route("/health", get(health))
        .route("/ws", get(ws_handler))
        .route("/api/derive/{wif}", get(derive_from_wif))
        .with_state(state);

    let router = match static_dir {
        Some(dir) => {
            info!("Serving static files from {}", dir);
            router.fallback_service(ServeDir::new(dir))
        }
        None => router,
    };

    router.layer(cors).layer(TraceLayer::new_for_http())
}
