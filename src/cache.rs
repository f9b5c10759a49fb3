//! In-memory route cache backed by moka with TTL and bounded capacity.
//! All methods are `&self`; no locking needed.

use crate::models::route::{RouteMetrics, RouteRequest};
use moka::future::Cache;
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub struct RouteCacheService {
    routes: Cache<String, Arc<RouteMetrics>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

impl RouteCacheService {
    pub fn new(ttl_seconds: u64, max_capacity: u64) -> Self {
        let routes = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_seconds))
            .max_capacity(max_capacity)
            .build();

        RouteCacheService {
            routes,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub async fn get(&self, key: &str) -> Option<RouteMetrics> {
        match self.routes.get(key).await {
            Some(metrics) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Route cache hit: {}", key);
                Some((*metrics).clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Route cache miss: {}", key);
                None
            }
        }
    }

    pub async fn insert(&self, key: &str, metrics: &RouteMetrics) {
        self.routes
            .insert(key.to_string(), Arc::new(metrics.clone()))
            .await;
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let hit_rate = if hits + misses > 0 {
            hits as f64 / (hits + misses) as f64 * 100.0
        } else {
            0.0
        };
        CacheStats {
            hits,
            misses,
            hit_rate,
        }
    }
}

/// Cache key for a route request: endpoints and waypoints at 3-decimal
/// precision (~100 m), plus activity and every preference that changes the
/// result.
pub fn route_cache_key(request: &RouteRequest) -> String {
    let mut hasher = DefaultHasher::new();

    hash_point(&mut hasher, request.start.lat, request.start.lon);
    hash_point(&mut hasher, request.end.lat, request.end.lon);
    for waypoint in &request.waypoints {
        hash_point(&mut hasher, waypoint.lat, waypoint.lon);
    }

    request.activity.to_string().hash(&mut hasher);
    request.preferences.objective.to_string().hash(&mut hasher);
    request.preferences.accessible_only.hash(&mut hasher);
    if let Some(gain) = request.preferences.preferred_gain_m {
        // 10 m buckets
        ((gain / 10.0).round() as i64).hash(&mut hasher);
    }
    if let Some(modes) = &request.preferences.allowed_modes {
        let mut names: Vec<String> = modes.iter().map(|m| m.to_string()).collect();
        names.sort();
        names.hash(&mut hasher);
    }

    format!("route:{:x}", hasher.finish())
}

fn hash_point(hasher: &mut DefaultHasher, lat: f64, lon: f64) {
    ((lat * 1000.0).round() as i64).hash(hasher);
    ((lon * 1000.0).round() as i64).hash(hasher);
}
