//! Minimal GeoJSON model: only what the floor-plan and network files use.

use crate::error::{Error, Result};
use glam::DVec2;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Feature collection with typed `properties`.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "P: Deserialize<'de>"))]
pub struct FeatureCollection<P> {
    pub features: Vec<Feature<P>>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "P: Deserialize<'de>"))]
pub struct Feature<P> {
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<P>,
}

/// Floor-plan features carry properties we never read.
pub type PlanCollection = FeatureCollection<serde::de::IgnoredAny>;

/// A coordinate; extra components (elevation) are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "Vec<f64>")]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl From<Vec<f64>> for Position {
    fn from(v: Vec<f64>) -> Self {
        Self {
            x: v.first().copied().unwrap_or(f64::NAN),
            y: v.get(1).copied().unwrap_or(f64::NAN),
        }
    }
}

impl Position {
    #[inline]
    pub fn to_dvec2(self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
    #[serde(other)]
    Unsupported,
}

impl Geometry {
    /// Outer ring of each polygon; holes are not used.
    pub fn outer_rings(&self) -> Vec<&[Position]> {
        match self {
            Geometry::Polygon(rings) => rings.first().map(Vec::as_slice).into_iter().collect(),
            Geometry::MultiPolygon(polys) => polys
                .iter()
                .filter_map(|rings| rings.first().map(Vec::as_slice))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Line parts of `LineString` / `MultiLineString` geometries.
    pub fn lines(&self) -> Vec<&[Position]> {
        match self {
            Geometry::LineString(line) => vec![line.as_slice()],
            Geometry::MultiLineString(lines) => lines.iter().map(Vec::as_slice).collect(),
            _ => Vec::new(),
        }
    }
}

/// Node or link identifier; source files mix strings and integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "RawId")]
pub struct FeatureId(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Int(i64),
    Float(f64),
}

impl From<RawId> for FeatureId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => FeatureId(s),
            RawId::Int(i) => FeatureId(i.to_string()),
            RawId::Float(f) if f.fract() == 0.0 => FeatureId(format!("{}", f as i64)),
            RawId::Float(f) => FeatureId(f.to_string()),
        }
    }
}

/// A property that is `None` when missing, `null` or of the wrong type, so
/// one malformed feature cannot fail its whole collection.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeProperties {
    #[serde(default, deserialize_with = "lenient")]
    pub node_id: Option<FeatureId>,
    #[serde(default, deserialize_with = "lenient")]
    pub ordinal: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkProperties {
    #[serde(default, deserialize_with = "lenient")]
    pub start_id: Option<FeatureId>,
    #[serde(default, deserialize_with = "lenient")]
    pub end_id: Option<FeatureId>,
    #[serde(default, deserialize_with = "lenient")]
    pub direction: Option<i64>,
}

/// Reads and deserializes a feature collection from disk.
pub fn read_collection<P: DeserializeOwned>(path: &Path) -> Result<FeatureCollection<P>> {
    let file = File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Deserializes a feature collection from an in-memory string.
pub fn parse_collection<P: DeserializeOwned>(json: &str) -> serde_json::Result<FeatureCollection<P>> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_unknown_geometry_and_nulls() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "geometry": null, "properties": null },
                { "type": "Feature",
                  "geometry": { "type": "GeometryCollection", "geometries": [] },
                  "properties": {} },
                { "type": "Feature",
                  "geometry": { "type": "Polygon",
                                "coordinates": [[[0,0],[0,1,7.5],[1,1],[0,0]], [[0.2,0.2],[0.3,0.2],[0.2,0.3],[0.2,0.2]]] },
                  "properties": { "name": "hall" } }
            ]
        }"#;
        let fc: PlanCollection = parse_collection(json).unwrap();
        assert_eq!(fc.features.len(), 3);
        assert!(fc.features[0].geometry.is_none());
        assert!(matches!(fc.features[1].geometry, Some(Geometry::Unsupported)));

        let rings = fc.features[2].geometry.as_ref().unwrap().outer_rings();
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].len(), 4);
        assert_eq!(rings[0][1], Position { x: 0.0, y: 1.0 });
    }

    #[test]
    fn test_mixed_id_types() {
        let json = r#"{
            "features": [
                { "geometry": { "type": "Point", "coordinates": [0, 0] },
                  "properties": { "node_id": 17, "ordinal": -1 } },
                { "geometry": { "type": "Point", "coordinates": [1, 0] },
                  "properties": { "node_id": "n-18", "ordinal": 2 } }
            ]
        }"#;
        let fc: FeatureCollection<NodeProperties> = parse_collection(json).unwrap();
        let ids: Vec<_> = fc
            .features
            .iter()
            .map(|f| f.properties.as_ref().unwrap().node_id.clone().unwrap().0)
            .collect();
        assert_eq!(ids, ["17", "n-18"]);
    }

    #[test]
    fn test_multipolygon_first_rings() {
        let json = r#"{ "type": "MultiPolygon", "coordinates": [
            [[[0,0],[1,0],[1,1],[0,0]]],
            [[[5,5],[6,5],[6,6],[5,5]], [[5.1,5.1],[5.2,5.1],[5.1,5.2],[5.1,5.1]]]
        ] }"#;
        let g: Geometry = serde_json::from_str(json).unwrap();
        let rings = g.outer_rings();
        assert_eq!(rings.len(), 2);
        assert_eq!(rings[1][0], Position { x: 5.0, y: 5.0 });
    }

    #[test]
    fn test_malformed_properties_stay_local() {
        let json = r#"{
            "features": [
                { "geometry": null, "properties": { "node_id": 1, "ordinal": null } },
                { "geometry": null, "properties": { "node_id": 2, "ordinal": "second" } },
                { "geometry": null, "properties": { "node_id": 3, "ordinal": 1 } }
            ]
        }"#;
        let fc: FeatureCollection<NodeProperties> = parse_collection(json).unwrap();
        let ordinals: Vec<_> = fc
            .features
            .iter()
            .map(|f| f.properties.as_ref().unwrap().ordinal)
            .collect();
        assert_eq!(ordinals, [None, None, Some(1)]);

        let json = r#"{
            "features": [
                { "geometry": null, "properties": { "start_id": 1, "direction": 1 } },
                { "geometry": null, "properties": { "start_id": 2, "end_id": 3, "direction": "up" } }
            ]
        }"#;
        let fc: FeatureCollection<LinkProperties> = parse_collection(json).unwrap();
        let first = fc.features[0].properties.as_ref().unwrap();
        assert_eq!(first.end_id, None);
        assert_eq!(first.direction, Some(1));
        let second = fc.features[1].properties.as_ref().unwrap();
        assert_eq!(second.end_id, Some(FeatureId("3".into())));
        assert_eq!(second.direction, None);
    }
}
