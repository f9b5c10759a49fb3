//! Scenic objective: bias the search toward nodes near viewpoints, then
//! insert bounded out-and-back detours until the route touches the minimum
//! viewpoint count or the detour budget runs out.

use super::{base_cost, endpoints, search_between, OptimizeContext, OptimizedPath};
use crate::engine::pathfinder::{find_path, PathCandidate};
use crate::error::Result;
use crate::models::coordinates::Coordinate;
use crate::network::Viewpoint;

/// Strongest discount a perfectly scenic node can earn. Keeping this well
/// above zero preserves heuristic admissibility (see below).
const MAX_SCENIC_DISCOUNT: f64 = 0.3;

pub fn optimize(path: PathCandidate, ctx: &OptimizeContext) -> Result<OptimizedPath> {
    let min_viewpoints = ctx.config.scenic_min_viewpoints;
    let touched_already = touched_viewpoints(&path.coords, ctx).len();
    if touched_already >= min_viewpoints {
        // Already scenic enough; nothing to refine.
        return Ok(OptimizedPath {
            path,
            confidence: 0.9,
        });
    }

    let (start, end) = endpoints(&path)?;

    let base = base_cost(ctx);
    let scenic_cost = |edge: &crate::network::GraphEdge,
                       ectx: &crate::engine::pathfinder::EdgeContext|
     -> f64 {
        let raw = base(edge, ectx);
        if !raw.is_finite() {
            return f64::INFINITY;
        }
        raw * (1.0 - MAX_SCENIC_DISCOUNT * scenic_weight(&ectx.to.coord, ctx))
    };

    // Discounted cost >= (1 - MAX_SCENIC_DISCOUNT) * distance, so a scaled
    // Haversine heuristic never overestimates.
    let scenic_heuristic = |from: &Coordinate, goal: &Coordinate| -> f64 {
        from.distance_m(goal) * (1.0 - MAX_SCENIC_DISCOUNT)
    };

    let mut refined = find_path(
        &start,
        &end,
        ctx.network,
        scenic_cost,
        scenic_heuristic,
        ctx.config.arrival_epsilon_m,
    )?;

    insert_detours(&mut refined, ctx)?;

    let touched = touched_viewpoints(&refined.coords, ctx).len();
    let confidence = if touched >= min_viewpoints {
        0.9
    } else if min_viewpoints > 0 {
        (touched as f64 / min_viewpoints as f64).clamp(0.3, 0.85)
    } else {
        0.9
    };

    Ok(OptimizedPath {
        path: refined,
        confidence,
    })
}

/// 0..1 attractiveness of a coordinate from viewpoint proximity.
fn scenic_weight(coord: &Coordinate, ctx: &OptimizeContext) -> f64 {
    let radius = ctx.config.scenic_viewpoint_radius_m;
    ctx.network
        .viewpoints()
        .iter()
        .map(|vp| {
            let d = vp.coord.distance_m(coord);
            if d >= radius {
                0.0
            } else {
                vp.score * (1.0 - d / radius)
            }
        })
        .fold(0.0, f64::max)
}

fn touched_viewpoints<'a>(coords: &[Coordinate], ctx: &OptimizeContext<'a>) -> Vec<&'a Viewpoint> {
    let radius = ctx.config.scenic_viewpoint_radius_m;
    ctx.network
        .viewpoints()
        .iter()
        .filter(|vp| {
            coords
                .iter()
                .any(|c| c.distance_m(&vp.coord) <= radius)
        })
        .collect()
}

/// Greedy out-and-back spur insertion, best-scored viewpoints first, until
/// the minimum is met or the total detour budget is spent.
fn insert_detours(path: &mut PathCandidate, ctx: &OptimizeContext) -> Result<()> {
    let radius = ctx.config.scenic_viewpoint_radius_m;
    let mut detour_spent = 0.0;

    let mut untouched: Vec<&Viewpoint> = ctx
        .network
        .viewpoints()
        .iter()
        .filter(|vp| {
            !path
                .coords
                .iter()
                .any(|c| c.distance_m(&vp.coord) <= radius)
        })
        .collect();
    untouched.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.name.cmp(&b.name)));

    for vp in untouched {
        if touched_viewpoints(&path.coords, ctx).len() >= ctx.config.scenic_min_viewpoints {
            break;
        }

        // Anchor at the path node closest to the viewpoint.
        let Some((anchor_idx, anchor)) = path
            .coords
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.distance_m(&vp.coord).total_cmp(&b.distance_m(&vp.coord))
            })
            .map(|(i, c)| (i, *c))
        else {
            continue;
        };

        let Ok(spur) = search_between(ctx, &anchor, &vp.coord) else {
            continue;
        };
        if spur.nodes.len() < 2 {
            continue; // viewpoint already at the anchor node
        }
        let spur_len = spur.distance_m();
        if detour_spent + 2.0 * spur_len > ctx.config.scenic_max_detour_m {
            continue;
        }
        // Make sure the spur actually reaches the viewpoint.
        if spur
            .coords
            .last()
            .map(|c| c.distance_m(&vp.coord) > radius)
            .unwrap_or(true)
        {
            continue;
        }

        splice_out_and_back(path, anchor_idx, &spur);
        detour_spent += 2.0 * spur_len;
    }
    Ok(())
}

/// Insert `anchor -> spur tip -> anchor` into the path at `anchor_idx`.
fn splice_out_and_back(path: &mut PathCandidate, anchor_idx: usize, spur: &PathCandidate) {
    let out_nodes = &spur.nodes[1..];
    let back_nodes: Vec<_> = spur.nodes[..spur.nodes.len() - 1]
        .iter()
        .rev()
        .copied()
        .collect();
    let out_coords = &spur.coords[1..];
    let back_coords: Vec<_> = spur.coords[..spur.coords.len() - 1]
        .iter()
        .rev()
        .copied()
        .collect();

    let insert_at = anchor_idx + 1;
    let mut new_nodes = Vec::with_capacity(path.nodes.len() + 2 * out_nodes.len());
    new_nodes.extend_from_slice(&path.nodes[..insert_at]);
    new_nodes.extend_from_slice(out_nodes);
    new_nodes.extend_from_slice(&back_nodes);
    new_nodes.extend_from_slice(&path.nodes[insert_at..]);

    let mut new_coords = Vec::with_capacity(path.coords.len() + 2 * out_coords.len());
    new_coords.extend_from_slice(&path.coords[..insert_at]);
    new_coords.extend_from_slice(out_coords);
    new_coords.extend_from_slice(&back_coords);
    new_coords.extend_from_slice(&path.coords[insert_at..]);

    path.nodes = new_nodes;
    path.coords = new_coords;
    path.cost += 2.0 * spur.cost;
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::{search_between, validate_constraints};
    use super::*;
    use crate::config::EngineConfig;
    use crate::models::activity::Activity;
    use crate::models::route::RoutePreferences;

    fn scenic_config() -> EngineConfig {
        EngineConfig {
            scenic_min_viewpoints: 1,
            scenic_max_detour_m: 1_000.0,
            scenic_viewpoint_radius_m: 50.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_detour_reaches_viewpoint() {
        let network = forked_network();
        let constraints = Activity::Walk.constraints();
        let preferences = RoutePreferences::default();
        let config = scenic_config();
        let ctx = walk_ctx(&network, &constraints, &preferences, &config);

        let raw = search_between(&ctx, &coord(40.0200, -105.3000), &coord(40.0220, -105.3000))
            .unwrap();
        assert!(touched_viewpoints(&raw.coords, &ctx).is_empty());

        let optimized = optimize(raw, &ctx).unwrap();
        assert_eq!(touched_viewpoints(&optimized.path.coords, &ctx).len(), 1);
        assert!(optimized.confidence >= 0.9);
        validate_constraints(&optimized.path, &ctx).unwrap();
    }

    #[test]
    fn test_detour_budget_respected() {
        let network = forked_network();
        let constraints = Activity::Walk.constraints();
        let preferences = RoutePreferences::default();
        let mut config = scenic_config();
        config.scenic_max_detour_m = 10.0; // too small to reach the spur

        let ctx = walk_ctx(&network, &constraints, &preferences, &config);
        let raw = search_between(&ctx, &coord(40.0200, -105.3000), &coord(40.0220, -105.3000))
            .unwrap();
        let raw_len = raw.distance_m();

        let optimized = optimize(raw, &ctx).unwrap();
        assert!(optimized.path.distance_m() <= raw_len + 10.0 + 1.0);
        assert!(optimized.confidence < 0.9, "minimum not met, reduced confidence");
    }

    #[test]
    fn test_idempotent_once_minimum_met() {
        let network = forked_network();
        let constraints = Activity::Walk.constraints();
        let preferences = RoutePreferences::default();
        let config = scenic_config();
        let ctx = walk_ctx(&network, &constraints, &preferences, &config);

        let raw = search_between(&ctx, &coord(40.0200, -105.3000), &coord(40.0220, -105.3000))
            .unwrap();
        let once = optimize(raw, &ctx).unwrap();
        let twice = optimize(once.path.clone(), &ctx).unwrap();
        assert_eq!(once.path.nodes, twice.path.nodes);
    }
}
