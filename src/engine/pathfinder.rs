//! Generic best-first (A*) search over the routable network. Knows nothing
//! about activities or providers; behavior comes entirely from the injected
//! cost and heuristic functions.

use crate::error::{Result, RouteError};
use crate::models::coordinates::Coordinate;
use crate::network::{GraphEdge, GraphNode, NodeId, RouteNetwork};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Ordered node sequence produced by the search. Frozen once returned.
#[derive(Debug, Clone, PartialEq)]
pub struct PathCandidate {
    pub nodes: Vec<NodeId>,
    pub coords: Vec<Coordinate>,
    pub cost: f64,
}

impl PathCandidate {
    pub fn distance_m(&self) -> f64 {
        crate::models::coordinates::path_length_m(&self.coords)
    }
}

/// Everything a cost function may inspect about the edge being relaxed.
pub struct EdgeContext<'a> {
    pub from: &'a GraphNode,
    pub to: &'a GraphNode,
}

#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    f: f64,
    h: f64,
    node: NodeId,
}

// Min-heap ordering on f; among equal f, prefer lower h (closer to goal),
// then lower node id for a stable, deterministic expansion order.
impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.h.total_cmp(&self.h))
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

/// Best-first search from `start` to `end`.
///
/// `cost_fn` must return a non-negative edge cost; `f64::INFINITY` prunes
/// the edge. `heuristic_fn(coord, goal)` must be admissible for the result
/// to be cost-optimal. Endpoints outside the network's bounding region, or
/// an exhausted open set, yield `NotFound` rather than a partial path.
pub fn find_path<C, H>(
    start: &Coordinate,
    end: &Coordinate,
    network: &RouteNetwork,
    cost_fn: C,
    heuristic_fn: H,
    arrival_epsilon_m: f64,
) -> Result<PathCandidate>
where
    C: Fn(&GraphEdge, &EdgeContext) -> f64,
    H: Fn(&Coordinate, &Coordinate) -> f64,
{
    if !network.contains(start) || !network.contains(end) {
        return Err(RouteError::NotFound);
    }

    let start_node = network.nearest_node(start).ok_or(RouteError::NotFound)?;
    let goal_node = network.nearest_node(end).ok_or(RouteError::NotFound)?;

    let mut open = BinaryHeap::new();
    let mut g_score: HashMap<NodeId, f64> = HashMap::new();
    let mut parent: HashMap<NodeId, NodeId> = HashMap::new();
    let mut closed: HashSet<NodeId> = HashSet::new();

    let h0 = heuristic_fn(&start_node.coord, end);
    g_score.insert(start_node.id, 0.0);
    open.push(OpenEntry {
        f: h0,
        h: h0,
        node: start_node.id,
    });

    while let Some(OpenEntry { node, .. }) = open.pop() {
        if !closed.insert(node) {
            continue; // already expanded via a cheaper entry
        }

        let current = network.node(node).ok_or(RouteError::NotFound)?;
        if node == goal_node.id || current.coord.is_near(end, arrival_epsilon_m) {
            return Ok(reconstruct(network, &parent, &g_score, node));
        }

        let g_current = g_score[&node];
        for edge in &current.edges {
            if closed.contains(&edge.to) {
                continue;
            }
            let Some(neighbor) = network.node(edge.to) else {
                continue;
            };
            let edge_cost = cost_fn(
                edge,
                &EdgeContext {
                    from: current,
                    to: neighbor,
                },
            );
            if !edge_cost.is_finite() {
                continue; // pruned by constraints
            }
            debug_assert!(edge_cost >= 0.0, "cost function returned negative cost");

            let tentative = g_current + edge_cost;
            let better = g_score
                .get(&edge.to)
                .map_or(true, |&existing| tentative < existing);
            if better {
                g_score.insert(edge.to, tentative);
                parent.insert(edge.to, node);
                let h = heuristic_fn(&neighbor.coord, end);
                open.push(OpenEntry {
                    f: tentative + h,
                    h,
                    node: edge.to,
                });
            }
        }
    }

    Err(RouteError::NotFound)
}

fn reconstruct(
    network: &RouteNetwork,
    parent: &HashMap<NodeId, NodeId>,
    g_score: &HashMap<NodeId, f64>,
    goal: NodeId,
) -> PathCandidate {
    let mut nodes = vec![goal];
    let mut current = goal;
    while let Some(&prev) = parent.get(&current) {
        nodes.push(prev);
        current = prev;
    }
    nodes.reverse();

    let coords = nodes
        .iter()
        .filter_map(|&id| network.node(id).map(|n| n.coord))
        .collect();

    PathCandidate {
        coords,
        cost: g_score[&goal],
        nodes,
    }
}

/// The default admissible heuristic for distance-based costs: straight-line
/// Haversine distance never overestimates network travel distance.
pub fn haversine_heuristic(from: &Coordinate, goal: &Coordinate) -> f64 {
    from.distance_m(goal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::activity::Surface;
    use crate::network::NetworkBuilder;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn distance_cost(edge: &GraphEdge, _ctx: &EdgeContext) -> f64 {
        edge.distance_m
    }

    /// Grid with a cheap perimeter and an expensive middle row.
    fn grid() -> (RouteNetwork, Coordinate, Coordinate) {
        let mut b = NetworkBuilder::new();
        let mut ids = Vec::new();
        for row in 0..3 {
            for col in 0..3 {
                ids.push(b.add_node(coord(
                    40.0200 + row as f64 * 0.0010,
                    -105.3000 + col as f64 * 0.0010,
                )));
            }
        }
        for row in 0..3 {
            for col in 0..3 {
                let id = ids[row * 3 + col];
                if col + 1 < 3 {
                    b.connect(id, ids[row * 3 + col + 1], Surface::Trail, 0.0);
                }
                if row + 1 < 3 {
                    b.connect(id, ids[(row + 1) * 3 + col], Surface::Trail, 0.0);
                }
            }
        }
        let net = b.build();
        let start = coord(40.0200, -105.3000);
        let end = coord(40.0220, -105.2980);
        (net, start, end)
    }

    #[test]
    fn test_finds_shortest_path_on_grid() {
        let (net, start, end) = grid();
        let path = find_path(&start, &end, &net, distance_cost, haversine_heuristic, 25.0)
            .unwrap();

        // Any monotone corner-to-corner path over the grid has the same
        // length: 4 hops of ~111 m / ~85 m.
        assert_eq!(path.nodes.len(), 5);
        let brute = brute_force_shortest(&net, path.nodes[0], *path.nodes.last().unwrap());
        assert!((path.cost - brute).abs() < 1e-6, "A* matches exhaustive search");
    }

    /// Bellman-Ford style relaxation as an exhaustive reference.
    fn brute_force_shortest(net: &RouteNetwork, start: NodeId, goal: NodeId) -> f64 {
        let n = net.nodes().len();
        let mut dist = vec![f64::INFINITY; n];
        dist[start] = 0.0;
        for _ in 0..n {
            for node in net.nodes() {
                if !dist[node.id].is_finite() {
                    continue;
                }
                for edge in &node.edges {
                    let alt = dist[node.id] + edge.distance_m;
                    if alt < dist[edge.to] {
                        dist[edge.to] = alt;
                    }
                }
            }
        }
        dist[goal]
    }

    #[test]
    fn test_cost_function_prunes_edges() {
        let (net, start, end) = grid();
        // Prune everything: no path can exist.
        let result = find_path(
            &start,
            &end,
            &net,
            |_, _| f64::INFINITY,
            haversine_heuristic,
            25.0,
        );
        assert!(matches!(result, Err(RouteError::NotFound)));
    }

    #[test]
    fn test_not_found_outside_region() {
        let (net, start, _) = grid();
        let far = coord(50.0, -100.0);
        assert!(matches!(
            find_path(&start, &far, &net, distance_cost, haversine_heuristic, 25.0),
            Err(RouteError::NotFound)
        ));
    }

    #[test]
    fn test_not_found_on_disconnected_graph() {
        let mut b = NetworkBuilder::new();
        let a = b.add_node(coord(40.0200, -105.3000));
        let c = b.add_node(coord(40.0210, -105.3000));
        b.connect(a, c, Surface::Trail, 0.0);
        // Island with no edges
        b.add_node(coord(40.0290, -105.3000));
        let net = b.build();

        let result = find_path(
            &coord(40.0200, -105.3000),
            &coord(40.0290, -105.3000),
            &net,
            distance_cost,
            haversine_heuristic,
            25.0,
        );
        assert!(matches!(result, Err(RouteError::NotFound)));
    }

    #[test]
    fn test_deterministic_across_runs() {
        let (net, start, end) = grid();
        let first = find_path(&start, &end, &net, distance_cost, haversine_heuristic, 25.0)
            .unwrap();
        for _ in 0..10 {
            let again =
                find_path(&start, &end, &net, distance_cost, haversine_heuristic, 25.0).unwrap();
            assert_eq!(first.nodes, again.nodes, "stable tie-break, identical path");
        }
    }

    #[test]
    fn test_path_endpoints_snap_to_nearest_nodes() {
        let (net, start, end) = grid();
        let path = find_path(&start, &end, &net, distance_cost, haversine_heuristic, 25.0)
            .unwrap();
        assert!(path.coords.first().unwrap().is_near(&start, 25.0));
        assert!(path.coords.last().unwrap().is_near(&end, 25.0));
    }
}
