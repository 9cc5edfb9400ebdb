//! Floor-plan pipeline for a multi-level train terminal.
//!
//! - Classifies GeoJSON files by the floor token embedded in their name
//!   (`B3`, `0`, `4out`, ...) into signed floor indices.
//! - Extrudes polygon rings into upright solids and layers them per floor
//!   at `floor * vertical_offset - 1`.
//! - Builds the pedestrian network as independent 3D segments, each carrying
//!   its length and travel direction for the animated line shader.
//! - Enumerates the dataset and tracks load completion explicitly.
//!
//! World frame: Y is up. A projected ring point `(x, y)` lands at
//! `(x - origin.x, height, -(y - origin.y))`.

pub mod context_lines;
pub mod dataset;
pub mod error;
pub mod extrude;
pub mod floor;
pub mod geojson;
pub mod layers;
pub mod links;
pub mod mesh;

pub use context_lines::ContextLines;
pub use dataset::{DatasetConfig, LoadJob, LoadOutput, LoadTracker, Manifest};
pub use error::{Error, Result};
pub use extrude::extrude_ring;
pub use floor::{FeatureKind, FloorClassifier, FloorIndex, FloorToken, FLOORS};
pub use layers::{FloorGroup, FloorLayer, FloorRegistry, LayerAssembler, PlacedFeature};
pub use links::{LinkBuilder, LinkDirection, LinkNetwork, LinkSegment, NodeIndex};
pub use mesh::Mesh;
