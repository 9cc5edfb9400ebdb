//! `summary.json`: what each conversion run produced.

use floorplan::floor::floor_label;
use floorplan::{FloorIndex, FloorLayer, LinkNetwork};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FloorSummary {
    pub floor: FloorIndex,
    pub label: String,
    pub features: usize,
    pub triangles: usize,
    /// Features without usable geometry.
    pub skipped: usize,
}

impl FloorSummary {
    pub fn from_layers(floor: FloorIndex, layers: &[FloorLayer]) -> Self {
        Self {
            floor,
            label: floor_label(floor),
            features: layers.iter().map(|l| l.features.len()).sum(),
            triangles: layers.iter().map(FloorLayer::triangle_count).sum(),
            skipped: layers.iter().map(|l| l.skipped).sum(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetworkSummary {
    pub edges: usize,
    pub segments: usize,
    pub unresolved_endpoints: usize,
}

impl From<&LinkNetwork> for NetworkSummary {
    fn from(network: &LinkNetwork) -> Self {
        Self {
            edges: network.edges,
            segments: network.segments.len(),
            unresolved_endpoints: network.unresolved_endpoints,
        }
    }
}

/// A job that produced nothing, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub job: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Top floor first.
    pub floors: Vec<FloorSummary>,
    pub network: Option<NetworkSummary>,
    pub skipped: Vec<SkippedFile>,
    /// `.geojson` files with no recognisable floor token.
    pub rejected: Vec<PathBuf>,
}

impl Summary {
    pub fn total_features(&self) -> usize {
        self.floors.iter().map(|f| f.features).sum()
    }
}
