//! API Routes
//!
//! Configures the Axum router with all pNode API endpoints.

use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use super::handlers::{
    cache_stats_handler, clear_cache_handler, delete_cache_key_handler, get_node_handler,
    health_handler, list_nodes_handler, not_found_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// Served at the root and again under `/api`:
/// - `GET /pnodes` - All nodes (`?refresh=true` bypasses the cache read)
/// - `GET /pnodes/stats` - Aggregate statistics
/// - `GET /pnodes/:id` - One node
/// - `GET /health` - Health check endpoint
/// - `GET /cache/stats`, `DELETE /cache`, `DELETE /cache/:key` - Cache admin
///
/// Anything else answers 404 with the requested path.
///
/// # Middleware
/// - CORS: origins from `ALLOWED_ORIGINS`
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.allowed_origins);

    let routes = Router::new()
        .route("/pnodes", get(list_nodes_handler))
        .route("/pnodes/stats", get(stats_handler))
        .route("/pnodes/:id", get(get_node_handler))
        .route("/health", get(health_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .route("/cache", delete(clear_cache_handler))
        .route("/cache/:key", delete(delete_cache_key_handler));

    Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .fallback(not_found_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins = if allowed_origins.iter().any(|origin| origin == "*") {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("ignoring invalid CORS origin {:?}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
