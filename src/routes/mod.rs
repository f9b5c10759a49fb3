pub mod calculate;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/routes/calculate", post(calculate::calculate_route))
        .route("/routes/multimodal", post(calculate::multi_modal_route))
        .route("/health", get(health::health_check))
        .with_state(state)
}
