//! Deterministic offline providers. Used as the alternate data source in the
//! failover chain, as the primary source in dev mode, and by tests.

use crate::error::ProviderResult;
use crate::models::activity::Surface;
use crate::models::coordinates::Coordinate;
use crate::models::terrain::{TerrainSample, TrafficSnapshot, WeatherSnapshot};
use crate::providers::{TerrainProvider, TrafficProvider, WeatherProvider};
use async_trait::async_trait;
use time::OffsetDateTime;

/// Terrain model derived purely from coordinates: smooth sinusoidal relief
/// over a base elevation. Deterministic for a given point.
#[derive(Debug, Clone, Default)]
pub struct SyntheticTerrain;

impl SyntheticTerrain {
    pub fn sample(&self, point: &Coordinate) -> TerrainSample {
        let relief = ((point.lat * 600.0).sin() + (point.lon * 600.0).cos()) * 40.0;
        let elevation_m = 1_700.0 + relief;
        let slope_deg = ((point.lat * 900.0).cos() * 8.0).abs();
        TerrainSample {
            elevation_m,
            slope_deg,
            surface: Surface::Trail,
            roughness: 0.3,
            hazards: Vec::new(),
            sampled_at: OffsetDateTime::now_utc(),
        }
    }
}

#[async_trait]
impl TerrainProvider for SyntheticTerrain {
    async fn get_conditions(&self, point: &Coordinate) -> ProviderResult<TerrainSample> {
        Ok(self.sample(point))
    }
}

/// Always-benign weather.
#[derive(Debug, Clone, Default)]
pub struct SyntheticWeather;

#[async_trait]
impl WeatherProvider for SyntheticWeather {
    async fn get_current_conditions(&self, _point: &Coordinate) -> ProviderResult<WeatherSnapshot> {
        Ok(WeatherSnapshot::benign())
    }
}

/// Always free-flowing traffic.
#[derive(Debug, Clone, Default)]
pub struct SyntheticTraffic;

#[async_trait]
impl TrafficProvider for SyntheticTraffic {
    async fn get_conditions(&self, _path: &[Coordinate]) -> ProviderResult<TrafficSnapshot> {
        Ok(TrafficSnapshot::free_flow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn synthetic_terrain_is_deterministic() {
        let terrain = SyntheticTerrain;
        let p = Coordinate::new(40.0219, -105.3046).unwrap();
        let a = terrain.get_conditions(&p).await.unwrap();
        let b = terrain.get_conditions(&p).await.unwrap();
        assert_eq!(a.elevation_m, b.elevation_m);
        assert_eq!(a.slope_deg, b.slope_deg);
    }

    #[tokio::test]
    async fn synthetic_weather_within_all_activity_limits() {
        use crate::models::activity::Activity;
        let w = SyntheticWeather
            .get_current_conditions(&Coordinate::new(40.0, -105.3).unwrap())
            .await
            .unwrap();
        let limits = Activity::Walk.constraints().weather_limits;
        assert!(w.wind_kmh <= limits.max_wind_kmh);
        assert!(w.temp_c >= limits.min_temp_c && w.temp_c <= limits.max_temp_c);
    }
}
