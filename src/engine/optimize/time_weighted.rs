//! Time objective: re-search with a duration-weighted cost that folds in
//! current traffic and time of day, then a bounded local-substitution pass
//! that swaps in faster nearby nodes.

use super::{endpoints, OptimizeContext, OptimizedPath};
use crate::engine::cost::TerrainCostModel;
use crate::engine::pathfinder::{find_path, PathCandidate};
use crate::error::Result;

pub fn optimize(path: PathCandidate, ctx: &OptimizeContext) -> Result<OptimizedPath> {
    let (start, end) = endpoints(&path)?;

    let rush = rush_hour_factor(ctx);
    let base_speed_ms = ctx.activity.base_speed_kmh() / 3.6;

    let time_cost = |edge: &crate::network::GraphEdge,
                     _ctx: &crate::engine::pathfinder::EdgeContext|
     -> f64 {
        // Hard constraints prune exactly as in the base cost.
        if !TerrainCostModel::edge_cost(edge, ctx.constraints, ctx.weather).is_finite() {
            return f64::INFINITY;
        }
        TerrainCostModel::edge_duration_s(edge, ctx.activity, ctx.traffic) * rush
    };

    // Admissible: no edge is ever traversed faster than base speed, and
    // every slowdown factor (grade, traffic, rush hour) is >= 1.
    let time_heuristic =
        |from: &crate::models::Coordinate, goal: &crate::models::Coordinate| -> f64 {
            from.distance_m(goal) / base_speed_ms
        };

    let mut refined = find_path(
        &start,
        &end,
        ctx.network,
        time_cost,
        time_heuristic,
        ctx.config.arrival_epsilon_m,
    )?;

    // Local substitution within the configured detour radius, iterated to a
    // fixed point so re-optimizing the output changes nothing.
    loop {
        if !substitute_once(&mut refined, ctx, &time_cost) {
            break;
        }
    }

    let confidence = if ctx.traffic.is_some() { 0.9 } else { 0.6 };
    Ok(OptimizedPath {
        path: refined,
        confidence,
    })
}

/// Driving near commute peaks is uniformly slower.
fn rush_hour_factor(ctx: &OptimizeContext) -> f64 {
    if ctx.activity != crate::models::Activity::Drive {
        return 1.0;
    }
    match ctx.now.hour() {
        7..=9 | 16..=18 => 1.3,
        _ => 1.0,
    }
}

/// One pass of "substitute locally faster alternatives": try replacing each
/// interior node with a nearby node that connects to both neighbors more
/// cheaply. Returns true if anything improved.
fn substitute_once<C>(path: &mut PathCandidate, ctx: &OptimizeContext, cost: &C) -> bool
where
    C: Fn(&crate::network::GraphEdge, &crate::engine::pathfinder::EdgeContext) -> f64,
{
    let radius = ctx.config.time_substitution_radius_m;
    for i in 1..path.nodes.len().saturating_sub(1) {
        let prev = path.nodes[i - 1];
        let here = path.nodes[i];
        let next = path.nodes[i + 1];

        let current_cost = match leg_cost(ctx, cost, prev, here)
            .zip(leg_cost(ctx, cost, here, next))
        {
            Some((a, b)) => a + b,
            None => continue,
        };

        let here_coord = ctx.network.node(here).map(|n| n.coord);
        let Some(here_coord) = here_coord else { continue };

        let mut best: Option<(usize, f64)> = None;
        for candidate in ctx.network.nodes_within(&here_coord, radius) {
            if candidate.id == here || candidate.id == prev || candidate.id == next {
                continue;
            }
            let Some(in_cost) = leg_cost(ctx, cost, prev, candidate.id) else {
                continue;
            };
            let Some(out_cost) = leg_cost(ctx, cost, candidate.id, next) else {
                continue;
            };
            let total = in_cost + out_cost;
            if total < current_cost - 1e-9
                && best.map_or(true, |(_, b)| total < b)
            {
                best = Some((candidate.id, total));
            }
        }

        if let Some((replacement, total)) = best {
            if let Some(node) = ctx.network.node(replacement) {
                path.nodes[i] = replacement;
                path.coords[i] = node.coord;
                path.cost += total - current_cost;
                return true;
            }
        }
    }
    false
}

fn leg_cost<C>(ctx: &OptimizeContext, cost: &C, from: usize, to: usize) -> Option<f64>
where
    C: Fn(&crate::network::GraphEdge, &crate::engine::pathfinder::EdgeContext) -> f64,
{
    let edge = ctx.network.edge_between(from, to)?;
    let from_node = ctx.network.node(from)?;
    let to_node = ctx.network.node(to)?;
    let c = cost(
        edge,
        &crate::engine::pathfinder::EdgeContext {
            from: from_node,
            to: to_node,
        },
    );
    c.is_finite().then_some(c)
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
    fn test_time_optimization_avoids_steep_climbs() {
        // Climb slows walking harder than the base distance cost penalizes
        // it, so the time search trades the direct climb for the flat road.
        let network = forked_network();
        let constraints = Activity::Walk.constraints();
        let preferences = RoutePreferences::default();
        let config = EngineConfig::default();
        let ctx = walk_ctx(&network, &constraints, &preferences, &config);

        let raw = search_between(&ctx, &coord(40.0200, -105.3000), &coord(40.0220, -105.3000))
            .unwrap();
        let optimized = optimize(raw, &ctx).unwrap();
        let ascent = path_ascent_m(&optimized.path, &network);
        assert!(ascent < 20.0, "time-optimal walk takes the flat road");
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let network = forked_network();
        let constraints = Activity::Walk.constraints();
        let preferences = RoutePreferences::default();
        let config = EngineConfig::default();
        let ctx = walk_ctx(&network, &constraints, &preferences, &config);

        let raw = search_between(&ctx, &coord(40.0200, -105.3000), &coord(40.0220, -105.3000))
            .unwrap();
        let once = optimize(raw, &ctx).unwrap();
        let twice = optimize(once.path.clone(), &ctx).unwrap();
        assert_eq!(once.path.nodes, twice.path.nodes);
    }

    #[test]
    fn test_substitution_keeps_cost_truthful() {
        use crate::models::activity::Surface;
        use crate::network::NetworkBuilder;

        // Hand-built suboptimal path: the parallel node is faster both ways.
        let mut b = NetworkBuilder::new();
        let a = b.add_node(coord(40.0200, -105.3000));
        let slow = b.add_node(coord(40.0210, -105.3001));
        let fast = b.add_node(coord(40.0210, -105.2999));
        let d = b.add_node(coord(40.0220, -105.3000));
        b.connect(a, slow, Surface::Trail, 0.20);
        b.connect(slow, d, Surface::Trail, 0.20);
        b.connect(a, fast, Surface::Trail, 0.0);
        b.connect(fast, d, Surface::Trail, 0.0);
        let network = b.build();

        let constraints = Activity::Walk.constraints();
        let preferences = RoutePreferences::default();
        let config = EngineConfig::default();
        let ctx = walk_ctx(&network, &constraints, &preferences, &config);

        let cost = |edge: &crate::network::GraphEdge,
                    _: &crate::engine::pathfinder::EdgeContext| {
            TerrainCostModel::edge_duration_s(edge, Activity::Walk, None)
        };
        let leg = |from, to| {
            let edge = network.edge_between(from, to).unwrap();
            TerrainCostModel::edge_duration_s(edge, Activity::Walk, None)
        };

        let mut path = PathCandidate {
            nodes: vec![a, slow, d],
            coords: vec![
                coord(40.0200, -105.3000),
                coord(40.0210, -105.3001),
                coord(40.0220, -105.3000),
            ],
            cost: leg(a, slow) + leg(slow, d),
        };
        assert!(substitute_once(&mut path, &ctx, &cost));
        assert_eq!(path.nodes[1], fast);
        assert!((path.cost - (leg(a, fast) + leg(fast, d))).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_reflects_traffic_availability() {
        let network = forked_network();
        let constraints = Activity::Walk.constraints();
        let preferences = RoutePreferences::default();
        let config = EngineConfig::default();
        let ctx = walk_ctx(&network, &constraints, &preferences, &config);

        let raw = search_between(&ctx, &coord(40.0200, -105.3000), &coord(40.0220, -105.3000))
            .unwrap();
        let optimized = optimize(raw, &ctx).unwrap();
        assert!(optimized.confidence < 0.9, "no traffic data, lower confidence");
    }
}
