//! Elevation objective: contour-biased re-search that amplifies the grade
//! penalty, then a local-adjustment pass trading bounded extra distance for
//! less total climb, capped by the caller's `preferred_gain_m`.

use super::{endpoints, path_ascent_m, OptimizeContext, OptimizedPath};
use crate::engine::cost::TerrainCostModel;
use crate::engine::pathfinder::{find_path, PathCandidate};
use crate::error::Result;

/// How much harder than the base model the contour search punishes grade.
const CONTOUR_GRADE_WEIGHT: f64 = 16.0;

pub fn optimize(path: PathCandidate, ctx: &OptimizeContext) -> Result<OptimizedPath> {
    let (start, end) = endpoints(&path)?;

    let contour_cost = |edge: &crate::network::GraphEdge,
                        _ectx: &crate::engine::pathfinder::EdgeContext|
     -> f64 {
        if !TerrainCostModel::edge_cost(edge, ctx.constraints, ctx.weather).is_finite() {
            return f64::INFINITY;
        }
        let grade_ratio = if ctx.constraints.max_grade > 0.0 {
            edge.grade.abs() / ctx.constraints.max_grade
        } else {
            0.0
        };
        // Still >= distance, so the Haversine heuristic stays admissible.
        edge.distance_m * (1.0 + CONTOUR_GRADE_WEIGHT * grade_ratio * grade_ratio)
    };

    let contoured = find_path(
        &start,
        &end,
        ctx.network,
        contour_cost,
        |a, b| a.distance_m(b),
        ctx.config.arrival_epsilon_m,
    )?;

    // The contour search may only cost bounded extra distance.
    let budget = path.distance_m() * (1.0 + ctx.config.elevation_detour_budget);
    let refined = if contoured.distance_m() <= budget {
        contoured
    } else {
        path
    };

    let ascent = path_ascent_m(&refined, ctx.network);
    let confidence = match ctx.preferences.preferred_gain_m {
        Some(preferred) if preferred > 0.0 => {
            if ascent <= preferred {
                0.9
            } else {
                // Could not get under the preferred gain within the detour
                // budget; report reduced confidence rather than violating it.
                (preferred / ascent).clamp(0.3, 0.85)
            }
        }
        _ => 0.85,
    };

    Ok(OptimizedPath {
        path: refined,
        confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::{path_ascent_m, search_between};
    use super::*;
    use crate::config::EngineConfig;
    use crate::models::activity::Activity;
    use crate::models::route::RoutePreferences;

    #[test]
    fn test_prefers_flat_route_over_steep_shortcut() {
        let network = forked_network();
        let constraints = Activity::Walk.constraints();
        let preferences = RoutePreferences::default();
        let mut config = EngineConfig::default();
        config.elevation_detour_budget = 2.0; // generous budget for the fixture

        let ctx = walk_ctx(&network, &constraints, &preferences, &config);
        let raw = search_between(&ctx, &coord(40.0200, -105.3000), &coord(40.0220, -105.3000))
            .unwrap();
        let raw_ascent = path_ascent_m(&raw, &network);

        let optimized = optimize(raw, &ctx).unwrap();
        let optimized_ascent = path_ascent_m(&optimized.path, &network);
        assert!(
            optimized_ascent < raw_ascent,
            "contour search reduces climb: {optimized_ascent} < {raw_ascent}"
        );
    }

    #[test]
    fn test_detour_budget_is_honored() {
        let network = forked_network();
        let constraints = Activity::Walk.constraints();
        let preferences = RoutePreferences::default();
        let mut config = EngineConfig::default();
        config.elevation_detour_budget = 0.01; // the flat fork is way longer

        let ctx = walk_ctx(&network, &constraints, &preferences, &config);
        let raw = search_between(&ctx, &coord(40.0200, -105.3000), &coord(40.0220, -105.3000))
            .unwrap();
        let raw_distance = raw.distance_m();

        let optimized = optimize(raw.clone(), &ctx).unwrap();
        assert!(
            optimized.path.distance_m() <= raw_distance * 1.011,
            "budget keeps the original path"
        );
    }

    #[test]
    fn test_confidence_drops_when_gain_unreachable() {
        let network = forked_network();
        let constraints = Activity::Walk.constraints();
        let preferences = RoutePreferences {
            preferred_gain_m: Some(1.0), // unreachably low
            ..Default::default()
        };
        let mut config = EngineConfig::default();
        config.elevation_detour_budget = 0.01;

        let ctx = walk_ctx(&network, &constraints, &preferences, &config);
        let raw = search_between(&ctx, &coord(40.0200, -105.3000), &coord(40.0220, -105.3000))
            .unwrap();
        let optimized = optimize(raw, &ctx).unwrap();
        assert!(optimized.confidence < 0.9);
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let network = forked_network();
        let constraints = Activity::Walk.constraints();
        let preferences = RoutePreferences::default();
        let mut config = EngineConfig::default();
        config.elevation_detour_budget = 2.0;

        let ctx = walk_ctx(&network, &constraints, &preferences, &config);
        let raw = search_between(&ctx, &coord(40.0200, -105.3000), &coord(40.0220, -105.3000))
            .unwrap();
        let once = optimize(raw, &ctx).unwrap();
        let twice = optimize(once.path.clone(), &ctx).unwrap();
        assert_eq!(once.path.nodes, twice.path.nodes);
    }
}
