//! Post-search refinement, one numerically distinct strategy per objective.
//! Every strategy re-validates hard constraints on its output: a refinement
//! never trades away an `ActivityConstraints` guarantee.

mod distance;
mod elevation;
mod scenic;
mod time_weighted;

use crate::config::EngineConfig;
use crate::engine::cost::TerrainCostModel;
use crate::engine::pathfinder::{find_path, EdgeContext, PathCandidate};
use crate::error::{Result, RouteError};
use crate::models::activity::{Activity, ActivityConstraints};
use crate::models::coordinates::Coordinate;
use crate::models::route::{Objective, RoutePreferences};
use crate::models::terrain::{TrafficSnapshot, WeatherSnapshot};
use crate::network::{GraphEdge, RouteNetwork};
use time::OffsetDateTime;

/// Contextual data a refinement may draw on. All borrowed; strategies are
/// pure functions of path + context.
pub struct OptimizeContext<'a> {
    pub network: &'a RouteNetwork,
    pub activity: Activity,
    pub constraints: &'a ActivityConstraints,
    pub weather: Option<&'a WeatherSnapshot>,
    pub traffic: Option<&'a TrafficSnapshot>,
    pub preferences: &'a RoutePreferences,
    pub config: &'a EngineConfig,
    pub now: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct OptimizedPath {
    pub path: PathCandidate,
    /// 0..1: how much contextual data backed the refinement.
    pub confidence: f64,
}

/// Dispatch to the objective's strategy, then re-check hard constraints.
pub fn optimize(
    path: PathCandidate,
    objective: Objective,
    ctx: &OptimizeContext,
) -> Result<OptimizedPath> {
    let refined = match objective {
        Objective::Distance => distance::optimize(path, ctx)?,
        Objective::Time => time_weighted::optimize(path, ctx)?,
        Objective::Elevation => elevation::optimize(path, ctx)?,
        Objective::Scenic => scenic::optimize(path, ctx)?,
    };
    validate_constraints(&refined.path, ctx)?;
    Ok(refined)
}

/// Every edge of the path must still satisfy the activity's hard limits.
fn validate_constraints(path: &PathCandidate, ctx: &OptimizeContext) -> Result<()> {
    for pair in path.nodes.windows(2) {
        let edge = ctx
            .network
            .edge_between(pair[0], pair[1])
            .ok_or_else(|| RouteError::Internal("optimized path uses a missing edge".into()))?;
        if !ctx.constraints.allows_surface(edge.surface) {
            return Err(RouteError::ConstraintViolation(format!(
                "surface '{}' not allowed for {}",
                edge.surface, ctx.activity
            )));
        }
        if !ctx.constraints.allows_grade(edge.grade) {
            return Err(RouteError::ConstraintViolation(format!(
                "grade {:.0}% exceeds max {:.0}% for {}",
                edge.grade * 100.0,
                ctx.constraints.max_grade * 100.0,
                ctx.activity
            )));
        }
    }
    Ok(())
}

/// The base constrained cost used whenever a strategy re-searches.
pub(crate) fn base_cost<'a>(
    ctx: &'a OptimizeContext<'a>,
) -> impl Fn(&GraphEdge, &EdgeContext) -> f64 + 'a {
    move |edge, _| TerrainCostModel::edge_cost(edge, ctx.constraints, ctx.weather)
}

/// Constrained shortest-path between two coordinates under the base cost.
pub(crate) fn search_between(
    ctx: &OptimizeContext,
    from: &Coordinate,
    to: &Coordinate,
) -> Result<PathCandidate> {
    find_path(
        from,
        to,
        ctx.network,
        base_cost(ctx),
        |a, b| a.distance_m(b),
        ctx.config.arrival_epsilon_m,
    )
}

/// First and last coordinate of a path.
pub(crate) fn endpoints(path: &PathCandidate) -> Result<(Coordinate, Coordinate)> {
    match (path.coords.first(), path.coords.last()) {
        (Some(start), Some(end)) => Ok((*start, *end)),
        _ => Err(RouteError::Internal("path has no coordinates".into())),
    }
}

/// Append `tail` to `head`, dropping the duplicated junction node.
pub(crate) fn splice(head: &mut PathCandidate, tail: PathCandidate) {
    let skip = usize::from(head.nodes.last() == tail.nodes.first());
    head.nodes.extend(tail.nodes.into_iter().skip(skip));
    head.coords.extend(tail.coords.into_iter().skip(skip));
    head.cost += tail.cost;
}

/// Total climb along a path, from edge grades.
pub(crate) fn path_ascent_m(path: &PathCandidate, network: &RouteNetwork) -> f64 {
    path.nodes
        .windows(2)
        .filter_map(|pair| network.edge_between(pair[0], pair[1]))
        .map(|e| (e.grade.max(0.0)) * e.distance_m)
        .sum()
}
