use crate::models::activity::Surface;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Hazard {
    Rockfall,
    Avalanche,
    Flooding,
    Ice,
    Closure,
}

/// Point conditions from the terrain provider; cached with a TTL by the
/// resilience layer, never fetched directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TerrainSample {
    pub elevation_m: f64,
    pub slope_deg: f64,
    pub surface: Surface,
    /// 0 (smooth) .. 1 (very rough).
    pub roughness: f64,
    #[serde(default)]
    pub hazards: Vec<Hazard>,
    #[serde(with = "time::serde::rfc3339")]
    pub sampled_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherSnapshot {
    pub temp_c: f64,
    pub wind_kmh: f64,
    pub precip_mm: f64,
    pub visibility_km: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub sampled_at: OffsetDateTime,
}

impl WeatherSnapshot {
    /// Neutral conditions, used as the degraded-default failover value.
    pub fn benign() -> Self {
        WeatherSnapshot {
            temp_c: 15.0,
            wind_kmh: 5.0,
            precip_mm: 0.0,
            visibility_km: 20.0,
            sampled_at: OffsetDateTime::now_utc(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrafficSnapshot {
    /// 0 (free flow) .. 1 (gridlock).
    pub congestion: f64,
    pub incident_delay_min: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub sampled_at: OffsetDateTime,
}

impl TrafficSnapshot {
    /// Free-flow default, used as the degraded failover value.
    pub fn free_flow() -> Self {
        TrafficSnapshot {
            congestion: 0.0,
            incident_delay_min: 0.0,
            sampled_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Conditions attached to a finalized segment: what the engine knew about
/// weather and traffic when the route was assembled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConditionsSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic: Option<TrafficSnapshot>,
    /// True when any contributing provider value came from a failover tier.
    pub degraded: bool,
}
