use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    routing::{get, options},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

use crate::pipeline::{Pipeline, PipelineReport, PipelineRequest};
use crate::store::{ResultStore, StoredResult};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub store: Arc<dyn ResultStore>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health).post(run_pipeline).options(preflight))
        .route("/{*path}", options(preflight))
        .route("/debug/recent", get(debug_recent))
        .layer(cors_layer())
        .with_state(state)
}

/// All origins, no credentials, methods fixed to GET/POST/OPTIONS, any
/// headers.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// The pipeline endpoint. The body is parsed leniently: anything that is
/// not a valid request object (including an empty body) degrades to the
/// defaults instead of a 4xx.
async fn run_pipeline(State(state): State<AppState>, body: Bytes) -> Json<PipelineReport> {
    let request: PipelineRequest = serde_json::from_slice(&body).unwrap_or_default();
    let report = state.pipeline.run(&request).await;
    Json(report)
}

async fn debug_recent(State(state): State<AppState>) -> Json<Vec<StoredResult>> {
    let rows = state.store.recent(10).unwrap_or_default();
    Json(rows)
}
