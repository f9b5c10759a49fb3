//! The routable network: a read-only graph loaded once per process and
//! shared by reference across all concurrent searches.

pub mod demo;

use crate::models::activity::Surface;
use crate::models::coordinates::Coordinate;
use serde::{Deserialize, Serialize};

pub type NodeId = usize;

/// An outgoing connection from a node. `grade` is signed rise/run in the
/// direction of travel (-1..1 in practice).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GraphEdge {
    pub to: NodeId,
    pub distance_m: f64,
    pub surface: Surface,
    pub grade: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphNode {
    pub id: NodeId,
    pub coord: Coordinate,
    pub edges: Vec<GraphEdge>,
}

/// Axis-aligned region covered by the network; endpoints outside it are
/// rejected before any search runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingRegion {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingRegion {
    pub fn contains(&self, c: &Coordinate) -> bool {
        c.lat >= self.min_lat
            && c.lat <= self.max_lat
            && c.lon >= self.min_lon
            && c.lon <= self.max_lon
    }
}

/// A point of interest used by the scenic objective. Loaded with the
/// network as reference data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Viewpoint {
    pub name: String,
    pub coord: Coordinate,
    /// Relative attractiveness, 0..1.
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteNetwork {
    nodes: Vec<GraphNode>,
    bounds: BoundingRegion,
    #[serde(default)]
    viewpoints: Vec<Viewpoint>,
}

impl RouteNetwork {
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn bounds(&self) -> &BoundingRegion {
        &self.bounds
    }

    pub fn viewpoints(&self) -> &[Viewpoint] {
        &self.viewpoints
    }

    pub fn contains(&self, c: &Coordinate) -> bool {
        self.bounds.contains(c)
    }

    /// Closest node to a coordinate. Linear scan; the networks this serves
    /// are loaded regions, not planets.
    pub fn nearest_node(&self, c: &Coordinate) -> Option<&GraphNode> {
        self.nodes
            .iter()
            .min_by(|a, b| a.coord.distance_m(c).total_cmp(&b.coord.distance_m(c)))
    }

    /// Nodes within `radius_m` of a coordinate.
    pub fn nodes_within<'a>(
        &'a self,
        c: &'a Coordinate,
        radius_m: f64,
    ) -> impl Iterator<Item = &'a GraphNode> {
        self.nodes
            .iter()
            .filter(move |n| n.coord.distance_m(c) <= radius_m)
    }

    /// The edge from `from` to `to`, if one exists.
    pub fn edge_between(&self, from: NodeId, to: NodeId) -> Option<&GraphEdge> {
        self.node(from)
            .and_then(|n| n.edges.iter().find(|e| e.to == to))
    }

    /// Load a serialized network from a JSON file.
    pub fn from_json_file(path: &str) -> Result<Self, String> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read network file '{}': {}", path, e))?;
        serde_json::from_str(&data)
            .map_err(|e| format!("Failed to parse network file '{}': {}", path, e))
    }
}

/// Incremental construction of a [`RouteNetwork`]. Edges added through
/// `connect` are bidirectional with mirrored grade.
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    nodes: Vec<GraphNode>,
    viewpoints: Vec<Viewpoint>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, coord: Coordinate) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(GraphNode {
            id,
            coord,
            edges: Vec::new(),
        });
        id
    }

    /// One-way edge with an explicit distance.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, surface: Surface, grade: f64) {
        let distance_m = self.nodes[from].coord.distance_m(&self.nodes[to].coord);
        self.nodes[from].edges.push(GraphEdge {
            to,
            distance_m,
            surface,
            grade,
        });
    }

    /// Two-way edge; the reverse direction gets the negated grade.
    pub fn connect(&mut self, a: NodeId, b: NodeId, surface: Surface, grade: f64) {
        self.add_edge(a, b, surface, grade);
        self.add_edge(b, a, surface, -grade);
    }

    pub fn add_viewpoint(&mut self, name: &str, coord: Coordinate, score: f64) {
        self.viewpoints.push(Viewpoint {
            name: name.to_string(),
            coord,
            score,
        });
    }

    pub fn build(self) -> RouteNetwork {
        let mut bounds = BoundingRegion {
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
            min_lon: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
        };
        for node in &self.nodes {
            bounds.min_lat = bounds.min_lat.min(node.coord.lat);
            bounds.max_lat = bounds.max_lat.max(node.coord.lat);
            bounds.min_lon = bounds.min_lon.min(node.coord.lon);
            bounds.max_lon = bounds.max_lon.max(node.coord.lon);
        }
        // Pad so endpoints snapped to edge nodes still count as in-region.
        let pad = 0.002;
        bounds.min_lat -= pad;
        bounds.max_lat += pad;
        bounds.min_lon -= pad;
        bounds.max_lon += pad;

        RouteNetwork {
            nodes: self.nodes,
            bounds,
            viewpoints: self.viewpoints,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_builder_connect_is_bidirectional() {
        let mut b = NetworkBuilder::new();
        let a = b.add_node(coord(40.0200, -105.3000));
        let c = b.add_node(coord(40.0220, -105.3000));
        b.connect(a, c, Surface::Trail, 0.05);
        let net = b.build();

        let forward = net.edge_between(a, c).unwrap();
        let backward = net.edge_between(c, a).unwrap();
        assert_eq!(forward.grade, 0.05);
        assert_eq!(backward.grade, -0.05);
        assert!((forward.distance_m - backward.distance_m).abs() < 1e-9);
    }

    #[test]
    fn test_bounds_and_nearest() {
        let mut b = NetworkBuilder::new();
        let a = b.add_node(coord(40.0200, -105.3000));
        b.add_node(coord(40.0240, -105.3050));
        let net = b.build();

        assert!(net.contains(&coord(40.0220, -105.3025)));
        assert!(!net.contains(&coord(41.0, -105.3)));

        let nearest = net.nearest_node(&coord(40.0201, -105.3001)).unwrap();
        assert_eq!(nearest.id, a);
    }

    #[test]
    fn test_nodes_within_radius() {
        let mut b = NetworkBuilder::new();
        b.add_node(coord(40.0200, -105.3000));
        b.add_node(coord(40.0300, -105.3000)); // ~1.1 km away
        let net = b.build();

        let origin = coord(40.0200, -105.3000);
        assert_eq!(net.nodes_within(&origin, 500.0).count(), 1);
        assert_eq!(net.nodes_within(&origin, 2_000.0).count(), 2);
    }
}
