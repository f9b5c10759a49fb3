//! External provider capabilities and their resilience-guarded entry points.
//! The engine never calls a provider directly; everything goes through
//! [`ProviderHub`], which wraps each dependency in a [`Guarded`] stack.

pub mod http;
pub mod synthetic;

use crate::config::ResilienceConfig;
use crate::error::{ProviderResult, Result};
use crate::models::coordinates::Coordinate;
use crate::models::terrain::{TerrainSample, TrafficSnapshot, WeatherSnapshot};
use crate::resilience::{CircuitSnapshot, Fetched, Guarded};
use async_trait::async_trait;
use std::sync::Arc;
use time::OffsetDateTime;

#[async_trait]
pub trait TerrainProvider: Send + Sync {
    async fn get_conditions(&self, point: &Coordinate) -> ProviderResult<TerrainSample>;
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn get_current_conditions(&self, point: &Coordinate) -> ProviderResult<WeatherSnapshot>;
}

#[async_trait]
pub trait TrafficProvider: Send + Sync {
    async fn get_conditions(&self, path: &[Coordinate]) -> ProviderResult<TrafficSnapshot>;
}

/// Cache key for point-keyed providers: 3-decimal coordinate bucket (~100 m),
/// so nearby requests coalesce onto one upstream call.
fn point_key(prefix: &str, point: &Coordinate) -> String {
    let bucketed = point.round(3);
    format!("{}:{:.3}:{:.3}", prefix, bucketed.lat, bucketed.lon)
}

/// Cache key for a path: endpoints bucketed plus point count. Full-geometry
/// hashing buys little since corridors sharing endpoints share congestion.
fn path_key(prefix: &str, path: &[Coordinate]) -> String {
    match (path.first(), path.last()) {
        (Some(a), Some(b)) => {
            let a = a.round(3);
            let b = b.round(3);
            format!(
                "{}:{:.3}:{:.3}:{:.3}:{:.3}:{}",
                prefix,
                a.lat,
                a.lon,
                b.lat,
                b.lon,
                path.len()
            )
        }
        _ => format!("{}:empty", prefix),
    }
}

/// Flat, mid-roughness sample used only when every failover tier above the
/// degraded default has failed.
fn degraded_terrain() -> TerrainSample {
    TerrainSample {
        elevation_m: 0.0,
        slope_deg: 0.0,
        surface: crate::models::activity::Surface::Trail,
        roughness: 0.5,
        hazards: Vec::new(),
        sampled_at: OffsetDateTime::now_utc(),
    }
}

/// All external dependencies, each behind its own circuit breaker and
/// coalescing cache. Constructed once at process start and injected into
/// the engine by shared reference.
pub struct ProviderHub {
    terrain: Arc<dyn TerrainProvider>,
    terrain_alternate: Option<Arc<dyn TerrainProvider>>,
    weather: Arc<dyn WeatherProvider>,
    traffic: Arc<dyn TrafficProvider>,
    terrain_guard: Guarded<TerrainSample>,
    weather_guard: Guarded<WeatherSnapshot>,
    traffic_guard: Guarded<TrafficSnapshot>,
}

impl ProviderHub {
    pub fn new(
        terrain: Arc<dyn TerrainProvider>,
        weather: Arc<dyn WeatherProvider>,
        traffic: Arc<dyn TrafficProvider>,
        config: ResilienceConfig,
    ) -> Self {
        ProviderHub {
            terrain,
            terrain_alternate: None,
            weather,
            traffic,
            terrain_guard: Guarded::new("terrain", config.clone()),
            weather_guard: Guarded::new("weather", config.clone()),
            traffic_guard: Guarded::new("traffic", config),
        }
    }

    /// Secondary terrain source tried after the stale cache during failover.
    pub fn with_terrain_alternate(mut self, alternate: Arc<dyn TerrainProvider>) -> Self {
        self.terrain_alternate = Some(alternate);
        self
    }

    pub async fn terrain(&self, point: &Coordinate) -> Result<Fetched<TerrainSample>> {
        let key = point_key("terrain", point);
        let point = *point;
        let provider = Arc::clone(&self.terrain);
        let fetch = move || {
            let provider = Arc::clone(&provider);
            async move { provider.get_conditions(&point).await }
        };

        match &self.terrain_alternate {
            Some(alt) => {
                let alt = Arc::clone(alt);
                let alternate = move || {
                    let alt = Arc::clone(&alt);
                    async move { alt.get_conditions(&point).await }
                };
                self.terrain_guard
                    .call_with_alternate(key, fetch, alternate, Some(degraded_terrain()))
                    .await
            }
            None => {
                self.terrain_guard
                    .call(key, fetch, Some(degraded_terrain()))
                    .await
            }
        }
    }

    pub async fn weather(&self, point: &Coordinate) -> Result<Fetched<WeatherSnapshot>> {
        let key = point_key("weather", point);
        let point = *point;
        let provider = Arc::clone(&self.weather);
        self.weather_guard
            .call(
                key,
                move || {
                    let provider = Arc::clone(&provider);
                    async move { provider.get_current_conditions(&point).await }
                },
                Some(WeatherSnapshot::benign()),
            )
            .await
    }

    pub async fn traffic(&self, path: &[Coordinate]) -> Result<Fetched<TrafficSnapshot>> {
        let key = path_key("traffic", path);
        let path: Arc<Vec<Coordinate>> = Arc::new(path.to_vec());
        let provider = Arc::clone(&self.traffic);
        self.traffic_guard
            .call(
                key,
                move || {
                    let provider = Arc::clone(&provider);
                    let path = Arc::clone(&path);
                    async move { provider.get_conditions(&path).await }
                },
                Some(TrafficSnapshot::free_flow()),
            )
            .await
    }

    /// Circuit states of every dependency, for health reporting.
    pub fn circuit_snapshots(&self) -> Vec<CircuitSnapshot> {
        vec![
            self.terrain_guard.circuit_snapshot(),
            self.weather_guard.circuit_snapshot(),
            self.traffic_guard.circuit_snapshot(),
        ]
    }
}
