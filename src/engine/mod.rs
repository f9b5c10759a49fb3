//! Route computation pipeline: plan, search, refine, enrich, assemble.
//! The engine owns no mutable state; the network and transit catalog are
//! shared read-only, and all provider access goes through the guarded hub.

pub mod cost;
pub mod multimodal;
pub mod optimize;
pub mod pathfinder;

use crate::config::EngineConfig;
use crate::constants::ELEVATION_SAMPLE_SPACING_M;
use crate::engine::cost::TerrainCostModel;
use crate::engine::multimodal::{ModalLeg, TransportationOptimizer};
use crate::engine::optimize::{optimize, OptimizeContext};
use crate::engine::pathfinder::{find_path, haversine_heuristic, PathCandidate};
use crate::error::{Result, RouteError};
use crate::models::activity::{Activity, ActivityConstraints, Surface};
use crate::models::coordinates::Coordinate;
use crate::models::route::{
    Difficulty, MultiModalRequest, ResultQuality, RouteMetrics, RoutePreferences, RouteRequest,
    RouteSegment,
};
use crate::models::terrain::{ConditionsSnapshot, TerrainSample, TrafficSnapshot, WeatherSnapshot};
use crate::models::transit::TransitCatalog;
use crate::network::RouteNetwork;
use crate::providers::ProviderHub;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use time::OffsetDateTime;
use tracing::{debug, info};

pub struct RouteEngine {
    network: Arc<RouteNetwork>,
    transit: Arc<TransitCatalog>,
    providers: Arc<ProviderHub>,
    config: EngineConfig,
}

impl RouteEngine {
    pub fn new(
        network: Arc<RouteNetwork>,
        transit: Arc<TransitCatalog>,
        providers: Arc<ProviderHub>,
        config: EngineConfig,
    ) -> Self {
        RouteEngine {
            network,
            transit,
            providers,
            config,
        }
    }

    pub fn network(&self) -> &RouteNetwork {
        &self.network
    }

    pub fn providers(&self) -> &ProviderHub {
        &self.providers
    }

    /// Compute a single-activity route through the requested waypoints.
    pub async fn calculate_route(&self, request: &RouteRequest) -> Result<RouteMetrics> {
        let started = Instant::now();
        request
            .validate()
            .map_err(RouteError::InvalidRequest)?;
        info!(
            activity = %request.activity,
            objective = %request.preferences.objective,
            waypoints = request.waypoints.len(),
            "calculating route"
        );

        let constraints = request.activity.constraints();
        let mut quality = ResultQuality::Fresh;

        let weather = self.providers.weather(&request.start).await?;
        quality = quality.worst(weather.quality);
        TerrainCostModel::weather_within_limits(&constraints, &weather.value)
            .map_err(RouteError::ConstraintViolation)?;
        self.check_deadline(started, "planning")?;

        // Legs run start -> each waypoint -> end, whatever the activity.
        let mut stops = Vec::with_capacity(request.waypoints.len() + 2);
        stops.push(request.start);
        stops.extend(request.waypoints.iter().copied());
        stops.push(request.end);

        let mut exposure = TerrainExposure::default();

        // Transit requests are inherently multi-segment; hand each hop of
        // the stop chain to the stitcher and assemble from its legs.
        if request.activity == Activity::Transit {
            let mut segments = Vec::new();
            for pair in stops.windows(2) {
                let (leg_segments, modal_quality) = self
                    .modal_segments(
                        started,
                        &pair[0],
                        &pair[1],
                        &request.preferences,
                        &weather.value,
                        &mut exposure,
                    )
                    .await?;
                quality = quality.worst(modal_quality);
                segments.extend(leg_segments);
            }
            return self.assemble(started, segments, 0.8, quality, &exposure);
        }

        let mut legs: Vec<PathCandidate> = Vec::with_capacity(stops.len() - 1);
        for pair in stops.windows(2) {
            self.check_deadline(started, "pathfinding")?;
            let leg = find_path(
                &pair[0],
                &pair[1],
                &self.network,
                |edge, _| TerrainCostModel::edge_cost(edge, &constraints, Some(&weather.value)),
                haversine_heuristic,
                self.config.arrival_epsilon_m,
            )?;
            legs.push(leg);
        }

        // Traffic only changes driving durations; skip the fetch otherwise.
        let traffic = if request.activity == Activity::Drive {
            let corridor: Vec<Coordinate> =
                legs.iter().flat_map(|l| l.coords.iter().copied()).collect();
            let fetched = self.providers.traffic(&corridor).await?;
            quality = quality.worst(fetched.quality);
            Some(fetched.value)
        } else {
            None
        };

        let ctx = OptimizeContext {
            network: &self.network,
            activity: request.activity,
            constraints: &constraints,
            weather: Some(&weather.value),
            traffic: traffic.as_ref(),
            preferences: &request.preferences,
            config: &self.config,
            now: OffsetDateTime::now_utc(),
        };

        let mut confidence: f64 = 1.0;
        let mut refined: Vec<PathCandidate> = Vec::with_capacity(legs.len());
        for leg in legs {
            self.check_deadline(started, "optimization")?;
            let result = optimize(leg, request.preferences.objective, &ctx)?;
            confidence = confidence.min(result.confidence);
            refined.push(result.path);
        }

        for leg in &mut refined {
            self.check_deadline(started, "enrichment")?;
            self.enrich_elevations(&mut leg.coords, &mut quality, &mut exposure)
                .await?;
        }

        let conditions = ConditionsSnapshot {
            weather: Some(weather.value.clone()),
            traffic: traffic.clone(),
            degraded: quality.is_degraded(),
        };
        let mut segments = Vec::with_capacity(refined.len());
        for leg in &refined {
            self.check_deadline(started, "assembly")?;
            segments.push(self.build_segment(
                leg,
                request.activity,
                traffic.as_ref(),
                Some(conditions.clone()),
            )?);
        }

        self.assemble(started, segments, confidence, quality, &exposure)
    }

    /// Stitch a multi-modal journey; the caller gets the leg chain as-is.
    pub async fn optimize_multi_modal(
        &self,
        request: &MultiModalRequest,
    ) -> Result<Vec<RouteSegment>> {
        let started = Instant::now();
        if request.start.distance_m(&request.end) < 1.0 {
            return Err(RouteError::InvalidRequest(
                "start and end are the same point".to_string(),
            ));
        }
        info!("stitching multi-modal journey");

        let weather = self.providers.weather(&request.start).await?;
        self.check_deadline(started, "planning")?;

        let mut exposure = TerrainExposure::default();
        let (segments, _) = self
            .modal_segments(
                started,
                &request.start,
                &request.end,
                &request.preferences,
                &weather.value,
                &mut exposure,
            )
            .await?;
        Ok(segments)
    }

    async fn modal_segments(
        &self,
        started: Instant,
        start: &Coordinate,
        end: &Coordinate,
        preferences: &RoutePreferences,
        weather: &WeatherSnapshot,
        exposure: &mut TerrainExposure,
    ) -> Result<(Vec<RouteSegment>, ResultQuality)> {
        let optimizer = TransportationOptimizer::new(&self.network, &self.transit, &self.config);
        let legs = optimizer.stitch(
            start,
            end,
            preferences,
            Some(weather),
            OffsetDateTime::now_utc(),
        )?;
        self.check_deadline(started, "pathfinding")?;
        debug!(legs = legs.len(), "stitched leg chain");

        let mut quality = ResultQuality::Fresh;
        let mut segments = Vec::with_capacity(legs.len());
        for mut leg in legs {
            self.check_deadline(started, "enrichment")?;
            if leg.connection.is_none() {
                self.enrich_elevations(&mut leg.path.coords, &mut quality, exposure)
                    .await?;
            }
            self.check_deadline(started, "assembly")?;
            segments.push(self.modal_leg_segment(&leg, weather, quality.is_degraded())?);
        }
        Ok((segments, quality))
    }

    fn modal_leg_segment(
        &self,
        leg: &ModalLeg,
        weather: &WeatherSnapshot,
        degraded: bool,
    ) -> Result<RouteSegment> {
        let conditions = Some(ConditionsSnapshot {
            weather: Some(weather.clone()),
            traffic: None,
            degraded,
        });
        match &leg.connection {
            Some(conn) => {
                let distance_m = conn.distance_m();
                Ok(RouteSegment {
                    start: conn.from,
                    end: conn.to,
                    activity: leg.activity,
                    distance_m,
                    duration_s: conn.expected_duration_s(),
                    ascent_m: 0.0,
                    descent_m: 0.0,
                    path: vec![conn.from, conn.to],
                    surfaces: vec![(Surface::Paved, distance_m)],
                    conditions,
                    bailouts: Vec::new(),
                })
            }
            None => self.build_segment(&leg.path, leg.activity, None, conditions),
        }
    }

    /// One finalized segment from a network path: durations, climb, surface
    /// mix, and nearby bail-out points all come from the edges walked.
    fn build_segment(
        &self,
        path: &PathCandidate,
        activity: Activity,
        traffic: Option<&TrafficSnapshot>,
        conditions: Option<ConditionsSnapshot>,
    ) -> Result<RouteSegment> {
        let (start, end) = match (path.coords.first(), path.coords.last()) {
            (Some(s), Some(e)) => (*s, *e),
            _ => return Err(RouteError::Internal("segment path is empty".into())),
        };

        let mut duration_s = 0.0;
        let mut ascent_m = 0.0;
        let mut descent_m = 0.0;
        let mut surfaces: BTreeMap<Surface, f64> = BTreeMap::new();
        for pair in path.nodes.windows(2) {
            let edge = self
                .network
                .edge_between(pair[0], pair[1])
                .ok_or_else(|| RouteError::Internal("segment uses a missing edge".into()))?;
            duration_s += TerrainCostModel::edge_duration_s(edge, activity, traffic);
            let rise = edge.grade * edge.distance_m;
            if rise >= 0.0 {
                ascent_m += rise;
            } else {
                descent_m -= rise;
            }
            *surfaces.entry(edge.surface).or_insert(0.0) += edge.distance_m;
        }

        Ok(RouteSegment {
            start,
            end,
            activity,
            distance_m: path.distance_m(),
            duration_s,
            ascent_m,
            descent_m,
            path: path.coords.clone(),
            surfaces: surfaces.into_iter().collect(),
            conditions,
            bailouts: self.bailouts_near(&path.coords),
        })
    }

    fn assemble(
        &self,
        started: Instant,
        segments: Vec<RouteSegment>,
        confidence: f64,
        quality: ResultQuality,
        exposure: &TerrainExposure,
    ) -> Result<RouteMetrics> {
        self.check_deadline(started, "assembly")?;
        let difficulty = rate_difficulty(&segments, exposure);
        let metrics = RouteMetrics::from_segments(
            segments,
            difficulty,
            confidence,
            quality,
            self.config.arrival_epsilon_m,
        )
        .map_err(RouteError::Internal)?;
        info!(
            route_id = %metrics.id,
            distance_m = metrics.total_distance_m,
            duration_s = metrics.total_duration_s,
            quality = ?metrics.quality,
            "route assembled"
        );
        Ok(metrics)
    }

    /// Sample terrain elevation along the geometry, one provider call per
    /// spacing interval, and carry the last sample forward between samples.
    async fn enrich_elevations(
        &self,
        coords: &mut [Coordinate],
        quality: &mut ResultQuality,
        exposure: &mut TerrainExposure,
    ) -> Result<()> {
        let mut since_sample_m = 0.0;
        let mut last_elevation = None;
        let count = coords.len();
        for i in 0..count {
            if i > 0 {
                since_sample_m += coords[i - 1].distance_m(&coords[i]);
            }
            if i == 0 || i + 1 == count || since_sample_m >= ELEVATION_SAMPLE_SPACING_M {
                let fetched = self.providers.terrain(&coords[i]).await?;
                *quality = quality.worst(fetched.quality);
                exposure.observe(&fetched.value);
                last_elevation = Some(fetched.value.elevation_m);
                since_sample_m = 0.0;
            }
            coords[i].elevation_m = last_elevation;
        }
        Ok(())
    }

    /// Network nodes near the geometry that touch paved ground; reported so
    /// a party can cut the outing short.
    fn bailouts_near(&self, coords: &[Coordinate]) -> Vec<Coordinate> {
        let mut seen: HashSet<crate::network::NodeId> = HashSet::new();
        let mut out = Vec::new();
        for c in coords {
            for node in self.network.nodes_within(c, self.config.bailout_radius_m) {
                if node.edges.iter().any(|e| e.surface == Surface::Paved)
                    && seen.insert(node.id)
                {
                    out.push(node.coord);
                }
            }
        }
        out
    }

    fn check_deadline(&self, started: Instant, stage: &'static str) -> Result<()> {
        if started.elapsed() >= self.config.request_deadline {
            return Err(RouteError::Timeout { stage });
        }
        Ok(())
    }
}

/// Worst terrain seen while enriching a route; folded into the difficulty
/// rating alongside the per-segment aggregates.
#[derive(Debug, Default)]
struct TerrainExposure {
    max_roughness: f64,
    hazard_reported: bool,
}

impl TerrainExposure {
    fn observe(&mut self, sample: &TerrainSample) {
        self.max_roughness = self.max_roughness.max(sample.roughness);
        self.hazard_reported |= !sample.hazards.is_empty();
    }
}

/// Coarse difficulty rating from distance, climb, sustained grade, surface,
/// and the terrain exposure observed during enrichment.
fn rate_difficulty(segments: &[RouteSegment], exposure: &TerrainExposure) -> Difficulty {
    let total_m: f64 = segments.iter().map(|s| s.distance_m).sum();
    let distance_km = total_m / 1000.0;
    let ascent_m: f64 = segments.iter().map(|s| s.ascent_m).sum();
    let technical = segments.iter().any(|s| {
        s.surfaces
            .iter()
            .any(|(surface, _)| matches!(surface, Surface::Rock | Surface::Snow))
    });

    let mut score = distance_km + ascent_m / 100.0;
    if total_m > 0.0 && ascent_m / total_m > 0.12 {
        // Sustained steep climbing, not just total gain.
        score += 2.0;
    }
    score += 2.0 * exposure.max_roughness;
    if exposure.hazard_reported {
        score += 2.0;
    }
    if technical {
        score += 3.0;
    }
    match score {
        s if s < 5.0 => Difficulty::Easy,
        s if s < 12.0 => Difficulty::Moderate,
        s if s < 25.0 => Difficulty::Hard,
        _ => Difficulty::Expert,
    }
}
