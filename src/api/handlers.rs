//! API Handlers
//!
//! HTTP request handlers for each pNode API endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    Json,
};
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    CacheEvictResponse, CacheStatsResponse, ErrorResponse, HealthResponse, ListQuery,
    NodeResponse, NodesResponse, StatsResponse,
};
use crate::service::NodeService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Orchestrator owning the cache, upstream client and store
    pub service: Arc<NodeService>,
    pub service_name: String,
    pub environment: String,
    /// CORS origins; `*` allows any
    pub allowed_origins: Vec<String>,
}

impl AppState {
    pub fn new(service: Arc<NodeService>, config: &Config) -> Self {
        Self {
            service,
            service_name: config.service_name.clone(),
            environment: config.environment.clone(),
            allowed_origins: config.allowed_origins.clone(),
        }
    }
}

/// Handler for GET /pnodes
pub async fn list_nodes_handler(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<NodesResponse>> {
    let served = state.service.list_nodes(query.force_refresh()).await?;
    Ok(Json(NodesResponse::from(served)))
}

/// Handler for GET /pnodes/stats
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let (source, stats) = state.service.statistics().await?;
    Ok(Json(StatsResponse::new(source, stats)))
}

/// Handler for GET /pnodes/:id
pub async fn get_node_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NodeResponse>> {
    let served = state.service.get_node(&id).await?;
    NodeResponse::from_served(served)
        .map(Json)
        .ok_or_else(|| AppError::Internal(format!("empty snapshot for pNode {id}")))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::ok(&state.service_name, &state.environment))
}

/// Handler for GET /cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    let stats = state.service.cache().read().await.stats();
    debug!(size = stats.size, hit_rate = stats.hit_rate(), "cache stats requested");
    Json(CacheStatsResponse::new(stats))
}

/// Handler for DELETE /cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<CacheEvictResponse> {
    let removed = state.service.cache().write().await.clear();
    debug!(removed, "cache cleared");
    Json(CacheEvictResponse::cleared(removed))
}

/// Handler for DELETE /cache/:key
///
/// Deleting an absent key still succeeds with `deleted: 0`.
pub async fn delete_cache_key_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<CacheEvictResponse> {
    let deleted = state.service.cache().write().await.delete(&key);
    Json(CacheEvictResponse::key(key, deleted))
}

/// Fallback for unknown routes.
pub async fn not_found_handler(uri: Uri) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("Route not found").with_path(uri.path())),
    )
}
