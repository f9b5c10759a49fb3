#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wayfinder::config::{EngineConfig, ResilienceConfig};
use wayfinder::engine::RouteEngine;
use wayfinder::error::{ProviderError, ProviderResult};
use wayfinder::models::Coordinate;
use wayfinder::models::TerrainSample;
use wayfinder::network::demo;
use wayfinder::providers::synthetic::{SyntheticTerrain, SyntheticTraffic, SyntheticWeather};
use wayfinder::providers::{ProviderHub, TerrainProvider};

pub fn coord(lat: f64, lon: f64) -> Coordinate {
    Coordinate::new(lat, lon).unwrap()
}

/// Engine over the demo network with synthetic providers.
pub fn demo_engine() -> RouteEngine {
    let providers = ProviderHub::new(
        Arc::new(SyntheticTerrain),
        Arc::new(SyntheticWeather),
        Arc::new(SyntheticTraffic),
        ResilienceConfig::default(),
    );
    RouteEngine::new(
        Arc::new(demo::network()),
        Arc::new(demo::transit_catalog()),
        Arc::new(providers),
        EngineConfig::default(),
    )
}

/// Engine over the demo network with a custom terrain provider and
/// resilience settings.
pub fn demo_engine_with_terrain(
    terrain: Arc<dyn TerrainProvider>,
    resilience: ResilienceConfig,
) -> RouteEngine {
    let providers = ProviderHub::new(
        terrain,
        Arc::new(SyntheticWeather),
        Arc::new(SyntheticTraffic),
        resilience,
    );
    RouteEngine::new(
        Arc::new(demo::network()),
        Arc::new(demo::transit_catalog()),
        Arc::new(providers),
        EngineConfig::default(),
    )
}

/// Terrain provider that always fails, counting upstream attempts.
#[derive(Default)]
pub struct FailingTerrain {
    pub calls: AtomicUsize,
}

#[async_trait]
impl TerrainProvider for FailingTerrain {
    async fn get_conditions(&self, _point: &Coordinate) -> ProviderResult<TerrainSample> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ProviderError::Unavailable("terrain api down".to_string()))
    }
}
