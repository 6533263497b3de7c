use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::pipeline::{TranslationOutcome, TranslatorPipeline};
use crate::store::EntityStore;

pub const MAX_SEARCH_LIMIT: usize = 100;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<TranslatorPipeline>,
    pub store: Arc<dyn EntityStore>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/translate", post(translate))
        .route("/entities/search", get(search_entities))
        .route("/entities/add", post(add_entity))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

type ApiError = (StatusCode, Json<Value>);

fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn store_unavailable() -> ApiError {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": "entity store unavailable" })),
    )
}

fn internal(err: anyhow::Error) -> ApiError {
    error!("request failed: {err:#}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal error" })),
    )
}

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

fn default_search_limit() -> usize {
    10
}

#[derive(Debug, Deserialize)]
pub struct AddEntityRequest {
    pub japanese: String,
    pub english: String,
}

async fn service_info() -> Json<Value> {
    Json(json!({
        "service": "annai-translator",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "translate": "POST /translate",
            "search": "GET /entities/search?q=&limit=",
            "add": "POST /entities/add",
            "health": "GET /health",
        },
    }))
}

async fn translate(
    State(state): State<AppState>,
    Json(req): Json<TranslateRequest>,
) -> Result<Json<TranslationOutcome>, ApiError> {
    let text = req.text.trim();
    if text.is_empty() {
        return Err(bad_request("text must not be empty"));
    }
    Ok(Json(state.pipeline.translate(text).await))
}

async fn search_entities(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, ApiError> {
    if !state.store.is_ready() {
        return Err(store_unavailable());
    }
    // An empty query lists entries; the limit only caps from above.
    let limit = params.limit.min(MAX_SEARCH_LIMIT);
    let results = state.store.search(&params.q, limit).await.map_err(internal)?;
    Ok(Json(json!({
        "query": params.q,
        "count": results.len(),
        "results": results,
    })))
}

async fn add_entity(
    State(state): State<AppState>,
    Json(req): Json<AddEntityRequest>,
) -> Result<Json<Value>, ApiError> {
    let japanese = req.japanese.trim();
    let english = req.english.trim();
    if japanese.is_empty() || english.is_empty() {
        return Err(bad_request("japanese and english must not be empty"));
    }
    if !state.store.is_ready() {
        return Err(store_unavailable());
    }
    state.store.set(japanese, english).await.map_err(internal)?;
    Ok(Json(json!({
        "japanese": japanese,
        "english": english,
        "status": "added",
    })))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let services = state.pipeline.health();
    let status = if services.all_ready() {
        "healthy"
    } else {
        "degraded"
    };
    Json(json!({
        "status": status,
        "services": services,
        "entity_count": state.store.count().await,
    }))
}
