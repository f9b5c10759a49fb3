use crate::constants::*;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub terrain_api_url: Option<String>,
    pub weather_api_url: Option<String>,
    pub traffic_api_url: Option<String>,
    pub provider_api_key: Option<String>,
    pub network_path: Option<String>,
    pub route_cache_ttl: u64,
    pub engine: EngineConfig,
    pub resilience: ResilienceConfig,
}

/// Tuning knobs for route computation. Everything here has a sane default
/// and an env-var override so quality experiments don't need a rebuild.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Arrival epsilon (meters) for "close enough to the goal" checks.
    pub arrival_epsilon_m: f64,

    /// Hard wall-clock deadline per request.
    pub request_deadline: Duration,

    /// Bound on the time objective's "locally faster alternative" pass:
    /// substitutes are only considered within this radius of the raw path.
    pub time_substitution_radius_m: f64,

    /// Elevation objective: maximum extra distance (as a fraction of path
    /// length) the gradient-following adjustment may trade for less climb.
    pub elevation_detour_budget: f64,

    /// Scenic objective: minimum viewpoints a route should touch.
    pub scenic_min_viewpoints: usize,

    /// Scenic objective: maximum total detour distance (meters).
    pub scenic_max_detour_m: f64,

    /// Radius (meters) within which a viewpoint counts as "touched".
    pub scenic_viewpoint_radius_m: f64,

    /// Bail-out points are reported within this radius of a segment.
    pub bailout_radius_m: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            arrival_epsilon_m: ARRIVAL_EPSILON_M,
            request_deadline: Duration::from_secs(20),
            time_substitution_radius_m: 500.0,
            elevation_detour_budget: 0.25,
            scenic_min_viewpoints: 2,
            scenic_max_detour_m: 2_000.0,
            scenic_viewpoint_radius_m: 300.0,
            bailout_radius_m: 500.0,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        Ok(Self {
            arrival_epsilon_m: parse_env("ENGINE_ARRIVAL_EPSILON_M", defaults.arrival_epsilon_m)?,
            request_deadline: Duration::from_secs(parse_env(
                "ENGINE_REQUEST_DEADLINE_SECONDS",
                defaults.request_deadline.as_secs(),
            )?),
            time_substitution_radius_m: parse_env(
                "ENGINE_TIME_SUBSTITUTION_RADIUS_M",
                defaults.time_substitution_radius_m,
            )?,
            elevation_detour_budget: parse_env(
                "ENGINE_ELEVATION_DETOUR_BUDGET",
                defaults.elevation_detour_budget,
            )?,
            scenic_min_viewpoints: parse_env(
                "ENGINE_SCENIC_MIN_VIEWPOINTS",
                defaults.scenic_min_viewpoints,
            )?,
            scenic_max_detour_m: parse_env(
                "ENGINE_SCENIC_MAX_DETOUR_M",
                defaults.scenic_max_detour_m,
            )?,
            scenic_viewpoint_radius_m: parse_env(
                "ENGINE_SCENIC_VIEWPOINT_RADIUS_M",
                defaults.scenic_viewpoint_radius_m,
            )?,
            bailout_radius_m: parse_env("ENGINE_BAILOUT_RADIUS_M", defaults.bailout_radius_m)?,
        })
    }
}

/// Circuit breaker, retry, and cache settings shared by all provider guards.
#[derive(Debug, Clone)]
pub struct ResilienceConfig {
    pub failure_threshold: u32,
    pub reset_timeout: Duration,
    pub half_open_probes: u32,
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub fresh_ttl: Duration,
    pub stale_ttl: Duration,
    pub cache_max_entries: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            reset_timeout: Duration::from_secs(DEFAULT_RESET_TIMEOUT_SECONDS),
            half_open_probes: DEFAULT_HALF_OPEN_PROBES,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: Duration::from_millis(DEFAULT_BACKOFF_BASE_MS),
            fresh_ttl: Duration::from_secs(DEFAULT_PROVIDER_CACHE_TTL_SECONDS),
            stale_ttl: Duration::from_secs(DEFAULT_STALE_CACHE_TTL_SECONDS),
            cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
        }
    }
}

impl ResilienceConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        Ok(Self {
            failure_threshold: parse_env("CB_FAILURE_THRESHOLD", defaults.failure_threshold)?,
            reset_timeout: Duration::from_secs(parse_env(
                "CB_RESET_TIMEOUT_SECONDS",
                defaults.reset_timeout.as_secs(),
            )?),
            half_open_probes: parse_env("CB_HALF_OPEN_PROBES", defaults.half_open_probes)?,
            max_retries: parse_env("RETRY_MAX_RETRIES", defaults.max_retries)?,
            backoff_base: Duration::from_millis(parse_env(
                "RETRY_BACKOFF_BASE_MS",
                defaults.backoff_base.as_millis() as u64,
            )?),
            fresh_ttl: Duration::from_secs(parse_env(
                "PROVIDER_CACHE_TTL",
                defaults.fresh_ttl.as_secs(),
            )?),
            stale_ttl: Duration::from_secs(parse_env(
                "STALE_CACHE_TTL",
                defaults.stale_ttl.as_secs(),
            )?),
            cache_max_entries: parse_env("CACHE_MAX_ENTRIES", defaults.cache_max_entries)?,
        })
    }
}

fn parse_env<T: std::str::FromStr + ToString>(key: &str, default: T) -> Result<T, String> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| format!("Invalid {}", key))
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| "Invalid PORT")?,
            terrain_api_url: env::var("TERRAIN_API_URL").ok(),
            weather_api_url: env::var("WEATHER_API_URL").ok(),
            traffic_api_url: env::var("TRAFFIC_API_URL").ok(),
            provider_api_key: env::var("PROVIDER_API_KEY").ok(),
            network_path: env::var("NETWORK_PATH").ok(),
            route_cache_ttl: parse_env("ROUTE_CACHE_TTL", DEFAULT_ROUTE_CACHE_TTL_SECONDS)?,
            engine: EngineConfig::from_env()?,
            resilience: ResilienceConfig::from_env()?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_defaults_are_sane() {
        let cfg = EngineConfig::default();
        assert!(cfg.arrival_epsilon_m > 0.0);
        assert!(cfg.elevation_detour_budget < 1.0);
        assert!(cfg.scenic_max_detour_m > cfg.scenic_viewpoint_radius_m);
    }

    #[test]
    fn resilience_defaults_are_sane() {
        let cfg = ResilienceConfig::default();
        assert!(cfg.failure_threshold >= 1);
        assert!(cfg.stale_ttl > cfg.fresh_ttl);
    }
}
