//! Multi-modal stitching: advance a frontier from start toward end, at each
//! step choosing between finishing with a single ground mode or boarding a
//! nearby transit connection that makes real progress. Mode changes carry a
//! fixed time penalty so the stitcher does not flip-flop between modes.

use crate::config::EngineConfig;
use crate::constants::{MAX_MULTIMODAL_SEGMENTS, MODE_TRANSITION_PENALTY};
use crate::engine::cost::TerrainCostModel;
use crate::engine::pathfinder::{find_path, PathCandidate};
use crate::error::{Result, RouteError};
use crate::models::activity::Activity;
use crate::models::coordinates::Coordinate;
use crate::models::route::RoutePreferences;
use crate::models::terrain::WeatherSnapshot;
use crate::models::transit::{TransitCatalog, TransitConnection};
use crate::network::RouteNetwork;
use time::OffsetDateTime;

/// How far the stitcher will walk to board a connection.
const WALK_ACCESS_RADIUS_M: f64 = 500.0;

/// One stitched leg. Transit legs carry the connection they ride; ground
/// legs carry the network path they follow.
#[derive(Debug, Clone)]
pub struct ModalLeg {
    pub activity: Activity,
    pub path: PathCandidate,
    pub connection: Option<TransitConnection>,
}

impl ModalLeg {
    fn ground(activity: Activity, path: PathCandidate) -> Self {
        ModalLeg {
            activity,
            path,
            connection: None,
        }
    }

    fn ride(connection: TransitConnection) -> Self {
        let path = PathCandidate {
            nodes: Vec::new(),
            coords: vec![connection.from, connection.to],
            cost: connection.distance_m(),
        };
        ModalLeg {
            activity: connection.mode,
            path,
            connection: Some(connection),
        }
    }

    pub fn start(&self) -> Option<Coordinate> {
        self.path.coords.first().copied()
    }

    pub fn end(&self) -> Option<Coordinate> {
        self.path.coords.last().copied()
    }

    /// Expected duration in seconds: schedule-based for rides, terrain-based
    /// for ground legs.
    pub fn duration_s(&self, network: &RouteNetwork) -> f64 {
        match &self.connection {
            Some(conn) => conn.expected_duration_s(),
            None => self
                .path
                .nodes
                .windows(2)
                .filter_map(|pair| network.edge_between(pair[0], pair[1]))
                .map(|e| TerrainCostModel::edge_duration_s(e, self.activity, None))
                .sum(),
        }
    }
}

/// A candidate continuation: the legs it would append, where it leaves the
/// frontier, and the mode it ends in.
struct Continuation {
    legs: Vec<ModalLeg>,
    frontier: Coordinate,
    mode: Activity,
    score: f64,
}

pub struct TransportationOptimizer<'a> {
    network: &'a RouteNetwork,
    catalog: &'a TransitCatalog,
    config: &'a EngineConfig,
}

impl<'a> TransportationOptimizer<'a> {
    pub fn new(
        network: &'a RouteNetwork,
        catalog: &'a TransitCatalog,
        config: &'a EngineConfig,
    ) -> Self {
        TransportationOptimizer {
            network,
            catalog,
            config,
        }
    }

    /// Stitch a contiguous leg chain from `start` to `end`.
    pub fn stitch(
        &self,
        start: &Coordinate,
        end: &Coordinate,
        preferences: &RoutePreferences,
        weather: Option<&WeatherSnapshot>,
        now: OffsetDateTime,
    ) -> Result<Vec<ModalLeg>> {
        let modes = allowed_modes(preferences);
        let mut legs: Vec<ModalLeg> = Vec::new();
        let mut frontier = *start;
        let mut current_mode: Option<Activity> = None;

        while !frontier.is_near(end, self.config.arrival_epsilon_m) || legs.is_empty() {
            if legs.len() >= MAX_MULTIMODAL_SEGMENTS {
                return Err(RouteError::NoViableContinuation(format!(
                    "gave up after {} segments, {:.0} m short of the destination",
                    legs.len(),
                    frontier.distance_m(end)
                )));
            }

            let mut candidates: Vec<Continuation> = Vec::new();
            for mode in &modes {
                match mode {
                    Activity::Transit => {
                        candidates.extend(self.board_candidates(
                            &frontier,
                            end,
                            preferences,
                            weather,
                            current_mode,
                            now,
                        ));
                    }
                    ground => {
                        if let Some(c) =
                            self.direct_candidate(&frontier, end, *ground, weather, current_mode)
                        {
                            candidates.push(c);
                        }
                    }
                }
            }

            let Some(best) = candidates
                .into_iter()
                .min_by(|a, b| a.score.total_cmp(&b.score))
            else {
                return Err(RouteError::NoViableContinuation(format!(
                    "no mode connects ({:.5}, {:.5}) toward the destination",
                    frontier.lat, frontier.lon
                )));
            };

            frontier = best.frontier;
            current_mode = Some(best.mode);
            legs.extend(best.legs);
        }

        smooth_transitions(&mut legs);
        Ok(legs)
    }

    /// A single ground-mode leg that finishes the journey outright.
    fn direct_candidate(
        &self,
        frontier: &Coordinate,
        end: &Coordinate,
        mode: Activity,
        weather: Option<&WeatherSnapshot>,
        current_mode: Option<Activity>,
    ) -> Option<Continuation> {
        let constraints = mode.constraints();
        let path = find_path(
            frontier,
            end,
            self.network,
            |edge, _| TerrainCostModel::edge_cost(edge, &constraints, weather),
            |a, b| a.distance_m(b),
            self.config.arrival_epsilon_m,
        )
        .ok()?;

        let leg = ModalLeg::ground(mode, path);
        let mut score = leg.duration_s(self.network);
        score += transition_penalty(current_mode, mode);
        let frontier = leg.end()?;
        Some(Continuation {
            legs: vec![leg],
            frontier,
            mode,
            score,
        })
    }

    /// Walk to a boardable connection that moves the frontier strictly
    /// closer to the destination, then ride it.
    fn board_candidates(
        &self,
        frontier: &Coordinate,
        end: &Coordinate,
        preferences: &RoutePreferences,
        weather: Option<&WeatherSnapshot>,
        current_mode: Option<Activity>,
        now: OffsetDateTime,
    ) -> Vec<Continuation> {
        let remaining = frontier.distance_m(end);
        let walk_speed_ms = Activity::Walk.base_speed_kmh() / 3.6;
        let walk_constraints = Activity::Walk.constraints();

        self.catalog
            .reachable_from(frontier, WALK_ACCESS_RADIUS_M)
            .filter(|conn| conn.operates_at(now.time()))
            .filter(|conn| !preferences.accessible_only || conn.wheelchair_accessible)
            .filter(|conn| conn.to.distance_m(end) < remaining - 1.0)
            .filter_map(|conn| {
                let mut legs = Vec::with_capacity(2);
                let mut score = 0.0;

                if !frontier.is_near(&conn.from, self.config.arrival_epsilon_m) {
                    let access = find_path(
                        frontier,
                        &conn.from,
                        self.network,
                        |edge, _| TerrainCostModel::edge_cost(edge, &walk_constraints, weather),
                        |a, b| a.distance_m(b),
                        self.config.arrival_epsilon_m,
                    )
                    .ok()?;
                    let walk = ModalLeg::ground(Activity::Walk, access);
                    score += walk.duration_s(self.network);
                    score += transition_penalty(current_mode, Activity::Walk);
                    legs.push(walk);
                }

                let ride = ModalLeg::ride(conn.clone());
                score += ride.duration_s(self.network);
                score += MODE_TRANSITION_PENALTY;
                // Crow-fly walk estimate for whatever remains after the ride.
                score += conn.to.distance_m(end) / walk_speed_ms;
                let frontier = conn.to;
                legs.push(ride);

                Some(Continuation {
                    legs,
                    frontier,
                    mode: conn.mode,
                    score,
                })
            })
            .collect()
    }
}

fn allowed_modes(preferences: &RoutePreferences) -> Vec<Activity> {
    preferences
        .allowed_modes
        .clone()
        .unwrap_or_else(|| vec![Activity::Walk, Activity::Transit])
}

fn transition_penalty(current: Option<Activity>, next: Activity) -> f64 {
    match current {
        Some(mode) if mode != next => MODE_TRANSITION_PENALTY,
        _ => 0.0,
    }
}

/// Close the small gaps left by node snapping: a ground leg that hands off
/// to a ride ends exactly at the stop, and a leg after a ride starts exactly
/// at the alighting point.
fn smooth_transitions(legs: &mut [ModalLeg]) {
    for i in 0..legs.len().saturating_sub(1) {
        if let Some(conn) = legs[i + 1].connection.clone() {
            if legs[i].connection.is_none() {
                if let Some(last) = legs[i].path.coords.last_mut() {
                    *last = conn.from;
                }
            }
        }
        if let Some(conn) = legs[i].connection.clone() {
            if legs[i + 1].connection.is_none() {
                if let Some(first) = legs[i + 1].path.coords.first_mut() {
                    *first = conn.to;
                }
            }
        }
    }
}
