//! Distance objective: curve simplification followed by shortest-path
//! re-stitching over the surviving waypoints, so simplification never
//! re-introduces detours the network would avoid.

use super::{search_between, splice, OptimizeContext, OptimizedPath};
use crate::constants::SIMPLIFY_TOLERANCE_M;
use crate::engine::pathfinder::PathCandidate;
use crate::error::Result;
use crate::models::coordinates::Coordinate;

pub fn optimize(path: PathCandidate, ctx: &OptimizeContext) -> Result<OptimizedPath> {
    if path.coords.len() <= 2 {
        return Ok(OptimizedPath {
            path,
            confidence: 0.95,
        });
    }

    let kept = rdp_keep_indices(&path.coords, SIMPLIFY_TOLERANCE_M);

    // Re-solve shortest-path between consecutive surviving waypoints.
    let mut stitched: Option<PathCandidate> = None;
    for pair in kept.windows(2) {
        let leg = search_between(ctx, &path.coords[pair[0]], &path.coords[pair[1]])?;
        match stitched.as_mut() {
            Some(head) => splice(head, leg),
            None => stitched = Some(leg),
        }
    }
    let refined = stitched.unwrap_or(path.clone());

    // Re-stitching is only allowed to help; keep the original otherwise.
    let refined = if refined.distance_m() <= path.distance_m() + 1e-6 {
        refined
    } else {
        path
    };

    Ok(OptimizedPath {
        path: refined,
        confidence: 0.95,
    })
}

/// Ramer-Douglas-Peucker on a coordinate polyline. Returns the sorted kept
/// indices; endpoints always survive.
fn rdp_keep_indices(coords: &[Coordinate], tolerance_m: f64) -> Vec<usize> {
    let mut kept = vec![0, coords.len() - 1];
    rdp_recurse(coords, 0, coords.len() - 1, tolerance_m, &mut kept);
    kept.sort_unstable();
    kept.dedup();
    kept
}

fn rdp_recurse(
    coords: &[Coordinate],
    first: usize,
    last: usize,
    tolerance_m: f64,
    kept: &mut Vec<usize>,
) {
    if last <= first + 1 {
        return;
    }
    let mut max_dist = 0.0;
    let mut max_idx = first;
    for i in (first + 1)..last {
        let (dist, _) = coords[i].distance_to_segment(&coords[first], &coords[last]);
        if dist > max_dist {
            max_dist = dist;
            max_idx = i;
        }
    }
    if max_dist > tolerance_m {
        kept.push(max_idx);
        rdp_recurse(coords, first, max_idx, tolerance_m, kept);
        rdp_recurse(coords, max_idx, last, tolerance_m, kept);
    }
}
