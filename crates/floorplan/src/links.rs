//! Pedestrian network: node ordinals, vertical placement and link segments.

use crate::floor::FloorIndex;
use crate::geojson::{FeatureCollection, LinkProperties, NodeProperties};
use glam::{DVec2, Vec3};
use std::collections::HashMap;

/// Travel direction of a link, as encoded in the `direction` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum LinkDirection {
    /// Walkable both ways.
    #[default]
    Both = 0,
    /// From `start_id` towards `end_id`.
    Forward = 1,
    /// From `end_id` towards `start_id`.
    Backward = 2,
}

impl LinkDirection {
    pub fn from_raw(raw: i64) -> Option<Self> {
        match raw {
            0 => Some(Self::Both),
            1 => Some(Self::Forward),
            2 => Some(Self::Backward),
            _ => None,
        }
    }

    /// Value handed to the line shader.
    #[inline]
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// Node id -> ordinal (floor index).
#[derive(Debug, Clone, Default)]
pub struct NodeIndex {
    ordinals: HashMap<String, FloorIndex>,
}

impl NodeIndex {
    pub fn from_collection(collection: &FeatureCollection<NodeProperties>) -> Self {
        let ordinals = collection
            .features
            .iter()
            .filter_map(|f| f.properties.as_ref())
            .filter_map(|p| match (&p.node_id, p.ordinal) {
                (Some(id), Some(ordinal)) => Some((id.0.clone(), ordinal)),
                _ => {
                    log::debug!("node {:?}: no id or ordinal; skipped", p.node_id);
                    None
                }
            })
            .collect();
        Self { ordinals }
    }

    pub fn insert(&mut self, node_id: impl Into<String>, ordinal: FloorIndex) {
        self.ordinals.insert(node_id.into(), ordinal);
    }

    #[inline]
    pub fn ordinal(&self, node_id: &str) -> Option<FloorIndex> {
        self.ordinals.get(node_id).copied()
    }

    pub fn len(&self) -> usize {
        self.ordinals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordinals.is_empty()
    }
}

/// One link feature: endpoints, direction and its planar polyline. A missing
/// endpoint id is unresolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Edge {
    pub start_id: Option<String>,
    pub end_id: Option<String>,
    pub direction: LinkDirection,
    pub points: Vec<DVec2>,
    /// Indices `i` where `points[i - 1]` and `points[i]` belong to different
    /// lines of a `MultiLineString` and are not joined by a segment.
    pub breaks: Vec<usize>,
}

impl Edge {
    /// Whether `points[i - 1] -> points[i]` is drawn.
    #[inline]
    pub fn joins(&self, i: usize) -> bool {
        !self.breaks.contains(&i)
    }
}

/// Extracts edges from a links collection. The lines of a `MultiLineString`
/// form one edge, placed from start to end across all of its points;
/// features without line geometry are dropped.
pub fn edges_from_collection(collection: &FeatureCollection<LinkProperties>) -> Vec<Edge> {
    let mut edges = Vec::with_capacity(collection.features.len());

    for feature in &collection.features {
        let (Some(geometry), Some(props)) = (&feature.geometry, &feature.properties) else {
            continue;
        };

        let direction = match props.direction {
            None => LinkDirection::Both,
            Some(raw) => LinkDirection::from_raw(raw).unwrap_or_else(|| {
                log::warn!(
                    "link {:?}->{:?}: unknown direction {}, drawing as two-way",
                    props.start_id,
                    props.end_id,
                    raw
                );
                LinkDirection::Both
            }),
        };

        let mut edge = Edge {
            start_id: props.start_id.as_ref().map(|id| id.0.clone()),
            end_id: props.end_id.as_ref().map(|id| id.0.clone()),
            direction,
            ..Edge::default()
        };
        for line in geometry.lines() {
            if !edge.points.is_empty() {
                edge.breaks.push(edge.points.len());
            }
            edge.points.extend(line.iter().map(|p| p.to_dvec2()));
        }
        if !edge.points.is_empty() {
            edges.push(edge);
        }
    }

    edges
}

/// Rounded midpoint of two floors, halves rounding toward +inf
/// (`(1, 2)` -> 2, `(-1, -2)` -> -1).
#[inline]
pub fn rounded_midpoint(a: FloorIndex, b: FloorIndex) -> FloorIndex {
    // Widened so extreme ordinals cannot overflow; the result lies between
    // `a` and `b` and always fits.
    ((a as i64 + b as i64 + 1).div_euclid(2)) as FloorIndex
}

/// Floor level for each of `count` polyline points given the resolved
/// ordinals of the edge's endpoints.
pub fn placement_levels(
    start: Option<FloorIndex>,
    end: Option<FloorIndex>,
    count: usize,
) -> Vec<FloorIndex> {
    match (start, end) {
        (None, None) => vec![0; count],
        (Some(s), None) => vec![s; count],
        (None, Some(e)) => vec![e; count],
        (Some(s), Some(e)) if s == e => vec![s; count],
        (Some(s), Some(e)) => {
            let mid = rounded_midpoint(s, e);
            (0..count)
                .map(|i| match i {
                    0 => s,
                    i if i + 1 == count => e,
                    _ => mid,
                })
                .collect()
        }
    }
}

/// One straight piece of a link polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkSegment {
    pub start: Vec3,
    pub end: Vec3,
    /// Euclidean length; scales the dash pattern along the segment.
    pub distance: f32,
    pub direction: LinkDirection,
}

/// Every segment of every edge, drawn as one object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkNetwork {
    pub segments: Vec<LinkSegment>,
    pub edges: usize,
    /// Endpoint ids that did not resolve to a node.
    pub unresolved_endpoints: usize,
}

impl LinkNetwork {
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        self.segments
            .iter()
            .map(|s| (s.start.min(s.end), s.start.max(s.end)))
            .reduce(|(alo, ahi), (blo, bhi)| (alo.min(blo), ahi.max(bhi)))
    }
}

/// Turns edges into placed 3D segments.
#[derive(Debug, Clone, Copy)]
pub struct LinkBuilder {
    origin: DVec2,
    vertical_offset: f32,
}

impl LinkBuilder {
    pub fn new(origin: DVec2, vertical_offset: f32) -> Self {
        Self {
            origin,
            vertical_offset,
        }
    }

    /// World position of every polyline point of `edge`.
    pub fn edge_points(&self, nodes: &NodeIndex, edge: &Edge) -> Vec<Vec3> {
        let start = edge.start_id.as_deref().and_then(|id| nodes.ordinal(id));
        let end = edge.end_id.as_deref().and_then(|id| nodes.ordinal(id));
        let levels = placement_levels(start, end, edge.points.len());

        edge.points
            .iter()
            .zip(levels)
            .map(|(p, level)| {
                let local = *p - self.origin;
                Vec3::new(
                    local.x as f32,
                    level as f32 * self.vertical_offset,
                    -local.y as f32,
                )
            })
            .collect()
    }

    pub fn build(&self, nodes: &NodeIndex, edges: &[Edge]) -> LinkNetwork {
        let mut network = LinkNetwork::default();

        for edge in edges {
            network.unresolved_endpoints += [&edge.start_id, &edge.end_id]
                .iter()
                .filter(|id| id.as_deref().and_then(|id| nodes.ordinal(id)).is_none())
                .count();

            let points = self.edge_points(nodes, edge);
            if points.len() < 2 {
                continue;
            }
            network.edges += 1;

            for (i, pair) in points.windows(2).enumerate() {
                if !edge.joins(i + 1) {
                    continue;
                }
                let distance = pair[0].distance(pair[1]);
                // Repeated vertices would divide the dash pattern by zero.
                if !(distance > f32::EPSILON) {
                    continue;
                }
                network.segments.push(LinkSegment {
                    start: pair[0],
                    end: pair[1],
                    distance,
                    direction: edge.direction,
                });
            }
        }

        network
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geojson::parse_collection;
    use approx::assert_relative_eq;

    fn edge(start: &str, end: &str, n: usize) -> Edge {
        Edge {
            start_id: Some(start.to_string()),
            end_id: Some(end.to_string()),
            direction: LinkDirection::Forward,
            points: (0..n).map(|i| DVec2::new(i as f64 * 10.0, 0.0)).collect(),
            breaks: Vec::new(),
        }
    }

    #[test]
    fn test_levels_between_floors() {
        assert_eq!(placement_levels(Some(1), Some(3), 4), vec![1, 2, 2, 3]);
        assert_eq!(placement_levels(Some(1), Some(3), 2), vec![1, 3]);
    }

    #[test]
    fn test_levels_with_unresolved_endpoint() {
        assert_eq!(placement_levels(Some(-2), None, 3), vec![-2, -2, -2]);
        assert_eq!(placement_levels(None, Some(4), 3), vec![4, 4, 4]);
        assert_eq!(placement_levels(None, None, 3), vec![0, 0, 0]);
        assert_eq!(placement_levels(Some(2), Some(2), 3), vec![2, 2, 2]);
    }

    #[test]
    fn test_midpoint_ties_round_up() {
        assert_eq!(rounded_midpoint(1, 2), 2);
        assert_eq!(rounded_midpoint(-1, -2), -1);
        assert_eq!(rounded_midpoint(-1, 0), 0);
        assert_eq!(rounded_midpoint(-3, 1), -1);
        assert_eq!(rounded_midpoint(0, 3), 2);
        assert_eq!(rounded_midpoint(i32::MAX, i32::MAX), i32::MAX);
        assert_eq!(rounded_midpoint(i32::MIN, i32::MIN), i32::MIN);
        assert_eq!(rounded_midpoint(i32::MIN, i32::MAX), 0);
    }

    #[test]
    fn test_build_segments() {
        let mut nodes = NodeIndex::default();
        nodes.insert("a", 1);
        nodes.insert("b", 3);

        let network = LinkBuilder::new(DVec2::ZERO, 30.0).build(&nodes, &[edge("a", "b", 4)]);
        assert_eq!(network.edges, 1);
        assert_eq!(network.segments.len(), 3);
        assert_eq!(network.unresolved_endpoints, 0);

        let heights: Vec<f32> = network
            .segments
            .iter()
            .map(|s| s.start.y)
            .chain(network.segments.last().map(|s| s.end.y))
            .collect();
        assert_eq!(heights, vec![30.0, 60.0, 60.0, 90.0]);

        for s in &network.segments {
            assert_relative_eq!(s.distance, s.start.distance(s.end));
            assert_eq!(s.direction, LinkDirection::Forward);
        }
        // Flat middle segment is exactly its planar length
        assert_relative_eq!(network.segments[1].distance, 10.0);
    }

    #[test]
    fn test_unresolved_end_takes_start_floor() {
        let mut nodes = NodeIndex::default();
        nodes.insert("a", -1);
        let network = LinkBuilder::new(DVec2::ZERO, 30.0).build(&nodes, &[edge("a", "zz", 3)]);
        assert_eq!(network.unresolved_endpoints, 1);
        assert!(network
            .segments
            .iter()
            .all(|s| s.start.y == -30.0 && s.end.y == -30.0));
    }

    #[test]
    fn test_short_edges_and_duplicate_points() {
        let nodes = NodeIndex::default();
        let mut dup = edge("x", "y", 3);
        dup.points[1] = dup.points[0];
        let network =
            LinkBuilder::new(DVec2::ZERO, 30.0).build(&nodes, &[edge("x", "y", 1), dup]);
        assert_eq!(network.edges, 1);
        assert_eq!(network.segments.len(), 1);
        assert_eq!(network.unresolved_endpoints, 4);
    }

    #[test]
    fn test_edges_from_collection() {
        let json = r#"{ "features": [
            { "geometry": { "type": "LineString", "coordinates": [[0,0],[5,0]] },
              "properties": { "start_id": 1, "end_id": "2", "direction": 2 } },
            { "geometry": { "type": "LineString", "coordinates": [[0,0],[0,5]] },
              "properties": { "start_id": 3, "end_id": 4, "direction": 9 } },
            { "geometry": { "type": "MultiLineString", "coordinates": [[[0,0],[1,1]], [[1,1],[2,2]]] },
              "properties": { "start_id": 5, "end_id": 6 } },
            { "geometry": null, "properties": { "start_id": 7, "end_id": 8, "direction": 1 } }
        ] }"#;
        let fc: FeatureCollection<LinkProperties> = parse_collection(json).unwrap();
        let edges = edges_from_collection(&fc);
        assert_eq!(edges.len(), 3);
        assert_eq!(edges[0].direction, LinkDirection::Backward);
        assert_eq!(edges[0].start_id.as_deref(), Some("1"));
        assert_eq!(edges[1].direction, LinkDirection::Both);
        assert_eq!(edges[2].points.len(), 4);
        assert_eq!(edges[2].breaks, vec![2]);
    }

    #[test]
    fn test_multiline_parts_share_one_placement() {
        let mut nodes = NodeIndex::default();
        nodes.insert("a", 0);
        nodes.insert("b", 2);
        // Two parts with a gap between (10,0) and (20,0)
        let edge = Edge {
            start_id: Some("a".into()),
            end_id: Some("b".into()),
            direction: LinkDirection::Both,
            points: vec![
                DVec2::new(0.0, 0.0),
                DVec2::new(10.0, 0.0),
                DVec2::new(20.0, 0.0),
                DVec2::new(30.0, 0.0),
            ],
            breaks: vec![2],
        };

        let network = LinkBuilder::new(DVec2::ZERO, 30.0).build(&nodes, &[edge]);
        assert_eq!(network.edges, 1);
        assert_eq!(network.segments.len(), 2);
        // Only the last point of the whole edge sits on the end floor
        assert_eq!(network.segments[0].start.y, 0.0);
        assert_eq!(network.segments[0].end.y, 30.0);
        assert_eq!(network.segments[1].start.y, 30.0);
        assert_eq!(network.segments[1].end.y, 60.0);
    }

    #[test]
    fn test_bad_node_and_link_do_not_drop_the_network() {
        let nodes = r#"{ "features": [
            { "geometry": null, "properties": { "node_id": "a", "ordinal": 1 } },
            { "geometry": null, "properties": { "node_id": "b", "ordinal": null } },
            { "geometry": null, "properties": { "ordinal": 3 } }
        ] }"#;
        let links = r#"{ "features": [
            { "geometry": { "type": "LineString", "coordinates": [[0,0],[10,0]] },
              "properties": { "start_id": "a", "end_id": "b", "direction": 1 } },
            { "geometry": { "type": "LineString", "coordinates": [[0,10],[10,10]] },
              "properties": { "start_id": "a" } }
        ] }"#;
        let nodes = NodeIndex::from_collection(&parse_collection(nodes).unwrap());
        let links: FeatureCollection<LinkProperties> = parse_collection(links).unwrap();
        assert_eq!(nodes.len(), 1);

        let network = LinkBuilder::new(DVec2::ZERO, 30.0).build(&nodes, &edges_from_collection(&links));
        assert_eq!(network.edges, 2);
        assert_eq!(network.segments.len(), 2);
        assert_eq!(network.unresolved_endpoints, 2);
        // Both fall back to the resolved start node's floor
        assert!(network.segments.iter().all(|s| s.start.y == 30.0 && s.end.y == 30.0));
    }
}
