//! HTTP clients for the external terrain/weather/traffic APIs.

use crate::error::{ProviderError, ProviderResult};
use crate::models::activity::Surface;
use crate::models::coordinates::Coordinate;
use crate::models::terrain::{Hazard, TerrainSample, TrafficSnapshot, WeatherSnapshot};
use crate::providers::{TerrainProvider, TrafficProvider, WeatherProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use time::OffsetDateTime;

fn map_http_error(e: reqwest::Error) -> ProviderError {
    ProviderError::Unavailable(format!("Request failed: {}", e))
}

fn check_status(status: reqwest::StatusCode) -> ProviderResult<()> {
    if status.as_u16() == 429 {
        return Err(ProviderError::RateLimited);
    }
    if !status.is_success() {
        return Err(ProviderError::Unavailable(format!("HTTP {}", status)));
    }
    Ok(())
}

/// Client for the terrain conditions API.
#[derive(Clone)]
pub struct TerrainApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct TerrainApiResponse {
    elevation_m: f64,
    slope_deg: f64,
    surface: Surface,
    roughness: f64,
    #[serde(default)]
    hazards: Vec<Hazard>,
}

impl TerrainApiClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        TerrainApiClient {
            client: Client::new(),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl TerrainProvider for TerrainApiClient {
    async fn get_conditions(&self, point: &Coordinate) -> ProviderResult<TerrainSample> {
        let url = format!("{}/conditions", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", point.lat.to_string()),
                ("lon", point.lon.to_string()),
            ])
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(map_http_error)?;

        check_status(response.status())?;

        let body: TerrainApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        Ok(TerrainSample {
            elevation_m: body.elevation_m,
            slope_deg: body.slope_deg,
            surface: body.surface,
            roughness: body.roughness.clamp(0.0, 1.0),
            hazards: body.hazards,
            sampled_at: OffsetDateTime::now_utc(),
        })
    }
}

/// Client for the weather API.
#[derive(Clone)]
pub struct WeatherApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct WeatherApiResponse {
    temp_c: f64,
    wind_kmh: f64,
    precip_mm: f64,
    visibility_km: f64,
}

impl WeatherApiClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        WeatherApiClient {
            client: Client::new(),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiClient {
    async fn get_current_conditions(&self, point: &Coordinate) -> ProviderResult<WeatherSnapshot> {
        let url = format!("{}/current", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", point.lat.to_string()),
                ("lon", point.lon.to_string()),
            ])
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(map_http_error)?;

        check_status(response.status())?;

        let body: WeatherApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        Ok(WeatherSnapshot {
            temp_c: body.temp_c,
            wind_kmh: body.wind_kmh,
            precip_mm: body.precip_mm,
            visibility_km: body.visibility_km,
            sampled_at: OffsetDateTime::now_utc(),
        })
    }
}

/// Client for the traffic API. Posts the path geometry, receives aggregate
/// congestion for the corridor.
#[derive(Clone)]
pub struct TrafficApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct TrafficApiResponse {
    congestion: f64,
    incident_delay_min: f64,
}

impl TrafficApiClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        TrafficApiClient {
            client: Client::new(),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl TrafficProvider for TrafficApiClient {
    async fn get_conditions(&self, path: &[Coordinate]) -> ProviderResult<TrafficSnapshot> {
        let url = format!("{}/corridor", self.base_url);
        let coords: Vec<[f64; 2]> = path.iter().map(|c| [c.lat, c.lon]).collect();

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "path": coords }))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(map_http_error)?;

        check_status(response.status())?;

        let body: TrafficApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        Ok(TrafficSnapshot {
            congestion: body.congestion.clamp(0.0, 1.0),
            incident_delay_min: body.incident_delay_min.max(0.0),
            sampled_at: OffsetDateTime::now_utc(),
        })
    }
}
