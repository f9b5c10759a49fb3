//! Stable application-wide constants.
//!
//! Values here are structural invariants, algorithm coefficients, and default
//! fallbacks for env-var-based configuration. They should rarely change.
//! For tuning knobs that benefit from runtime experimentation, see
//! [`EngineConfig`](crate::config::EngineConfig) instead.

// --- Server defaults (used when HOST / PORT env vars are absent) ---

/// Default bind address for the HTTP server.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default port for the HTTP server.
pub const DEFAULT_PORT: &str = "3000";

// --- Geometry ---

/// Two coordinates closer than this are considered the same point for
/// arrival checks and segment-chain contiguity.
pub const ARRIVAL_EPSILON_M: f64 = 25.0;

/// Mean Earth radius used by the Haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// --- Cache TTL defaults (seconds, used when env vars are absent) ---

/// Default route response cache TTL: 15 minutes. Overridden by `ROUTE_CACHE_TTL`.
pub const DEFAULT_ROUTE_CACHE_TTL_SECONDS: u64 = 900;
/// Default fresh provider cache TTL: 5 minutes. Overridden by `PROVIDER_CACHE_TTL`.
pub const DEFAULT_PROVIDER_CACHE_TTL_SECONDS: u64 = 300;
/// Last-known-good cache TTL: 6 hours. Serves the first failover tier.
pub const DEFAULT_STALE_CACHE_TTL_SECONDS: u64 = 21_600;
/// Maximum entries per in-memory cache (LRU eviction).
pub const DEFAULT_CACHE_MAX_ENTRIES: u64 = 10_000;

// --- Circuit breaker defaults ---

/// Consecutive failures before a breaker opens. Overridden by `CB_FAILURE_THRESHOLD`.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
/// Seconds an open breaker waits before allowing half-open probes.
pub const DEFAULT_RESET_TIMEOUT_SECONDS: u64 = 30;
/// Probes allowed per window while half-open.
pub const DEFAULT_HALF_OPEN_PROBES: u32 = 2;

// --- Retry policy defaults ---

/// Maximum retries per provider call before failover.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Base delay for exponential backoff (milliseconds); delay = base * 2^attempt.
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 100;

// --- Cost model coefficients ---

/// Weight of the quadratic grade penalty in edge cost.
/// cost = distance * (1 + GRADE_PENALTY_WEIGHT * (grade / max_grade)^2) * ...
pub const GRADE_PENALTY_WEIGHT: f64 = 4.0;

/// Cost multiplier applied to unpaved surfaces when precipitation exceeds
/// [`WET_SURFACE_PRECIP_THRESHOLD_MM`].
pub const WET_UNPAVED_MULTIPLIER: f64 = 1.5;
/// Precipitation (mm) above which unpaved surfaces are considered wet.
pub const WET_SURFACE_PRECIP_THRESHOLD_MM: f64 = 0.5;

// --- Multi-modal stitching ---

/// Fixed friction score added for every mode change, discouraging
/// excessive switching.
pub const MODE_TRANSITION_PENALTY: f64 = 600.0;

/// Upper bound on stitching iterations; a greedy frontier that has not
/// arrived after this many segments is a dead-end.
pub const MAX_MULTIMODAL_SEGMENTS: usize = 32;

// --- Optimization ---

/// Perpendicular-distance tolerance (meters) for the distance objective's
/// curve-simplification pass.
pub const SIMPLIFY_TOLERANCE_M: f64 = 15.0;

/// Elevation enrichment samples the path at most every this many meters.
pub const ELEVATION_SAMPLE_SPACING_M: f64 = 200.0;

/// Maximum waypoints accepted in a single request (start and end excluded).
pub const MAX_WAYPOINTS: usize = 10;
