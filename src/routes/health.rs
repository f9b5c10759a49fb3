use crate::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// GET /health - liveness plus circuit and cache visibility
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let circuits = state.engine.providers().circuit_snapshots();
    let any_open = circuits
        .iter()
        .any(|c| c.state != crate::resilience::CircuitState::Closed);

    Json(json!({
        "status": if any_open { "degraded" } else { "ok" },
        "network_nodes": state.engine.network().nodes().len(),
        "circuits": circuits,
        "route_cache": state.route_cache.stats(),
    }))
}
