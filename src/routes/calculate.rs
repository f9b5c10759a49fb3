use crate::cache;
use crate::error::{Result, RouteError};
use crate::models::route::{
    MultiModalRequest, MultiModalResponse, RouteRequest, RouteResponse,
};
use crate::AppState;
use axum::{extract::State, Json};
use std::sync::Arc;

/// POST /routes/calculate
pub async fn calculate_route(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RouteRequest>,
) -> Result<Json<RouteResponse>> {
    request.validate().map_err(RouteError::InvalidRequest)?;

    tracing::info!(
        start_lat = request.start.lat,
        start_lon = request.start.lon,
        end_lat = request.end.lat,
        end_lon = request.end.lon,
        activity = %request.activity,
        objective = %request.preferences.objective,
        "Route request: ({:.4}, {:.4}) -> ({:.4}, {:.4})",
        request.start.lat,
        request.start.lon,
        request.end.lat,
        request.end.lon,
    );

    let cache_key = cache::route_cache_key(&request);
    if let Some(cached) = state.route_cache.get(&cache_key).await {
        tracing::info!(route_id = %cached.id, "Cache hit for route");
        return Ok(Json(RouteResponse { route: cached }));
    }

    let route = state.engine.calculate_route(&request).await?;

    // Degraded results go uncached so a recovered provider refreshes them.
    if !route.quality.is_degraded() {
        state.route_cache.insert(&cache_key, &route).await;
    }

    Ok(Json(RouteResponse { route }))
}

/// POST /routes/multimodal
pub async fn multi_modal_route(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MultiModalRequest>,
) -> Result<Json<MultiModalResponse>> {
    tracing::info!(
        start_lat = request.start.lat,
        start_lon = request.start.lon,
        end_lat = request.end.lat,
        end_lon = request.end.lon,
        "Multi-modal request"
    );

    let segments = state.engine.optimize_multi_modal(&request).await?;
    Ok(Json(MultiModalResponse { segments }))
}
