// Library exports for testing and reusability

pub mod cache;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod models;
pub mod network;
pub mod providers;
pub mod resilience;
pub mod routes;

// Re-export commonly used types
pub use error::{Result, RouteError};

use cache::RouteCacheService;
use engine::RouteEngine;
use std::sync::Arc;

// App state for sharing across the application
pub struct AppState {
    pub engine: Arc<RouteEngine>,
    pub route_cache: RouteCacheService,
}
