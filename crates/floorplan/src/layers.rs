//! Floor layer assembly and the floor group registry.

use crate::extrude::extrude_ring;
use crate::floor::{floor_label, FeatureKind, FloorIndex, FLOORS};
use crate::geojson::PlanCollection;
use crate::mesh::{Mesh, EDGE_THRESHOLD_DEG};
use crate::error::Result;
use glam::{DVec2, Mat4, Vec3};
use std::collections::BTreeMap;
use std::f32::consts::FRAC_PI_2;

/// Height of a floor's geometry base: one `vertical_offset` per floor, lowered
/// by one unit so slabs sit just below anything drawn at the floor level.
#[inline]
pub fn floor_base_height(floor: FloorIndex, vertical_offset: f32) -> f32 {
    floor as f32 * vertical_offset - 1.0
}

/// Turns an extruded solid (ring in XY, extruded along +Z) upright and lifts
/// it to its floor: local (x, y, z) maps to world (x, z + base, -y).
pub fn upright_transform(floor: FloorIndex, vertical_offset: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, floor_base_height(floor, vertical_offset), 0.0))
        * Mat4::from_rotation_x(-FRAC_PI_2)
}

/// One extruded footprint and its outline.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedFeature {
    pub solid: Mesh,
    pub edges: Vec<[Vec3; 2]>,
}

/// All features of one dataset (one kind on one floor), already placed.
#[derive(Debug, Clone, PartialEq)]
pub struct FloorLayer {
    pub floor: FloorIndex,
    pub kind: FeatureKind,
    pub features: Vec<PlacedFeature>,
    /// Features dropped for missing or degenerate geometry.
    pub skipped: usize,
}

impl FloorLayer {
    pub fn triangle_count(&self) -> usize {
        self.features.iter().map(|f| f.solid.triangle_count()).sum()
    }

    pub fn edge_count(&self) -> usize {
        self.features.iter().map(|f| f.edges.len()).sum()
    }

    /// World-space bounds of every solid in the layer.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        self.features
            .iter()
            .filter_map(|f| f.solid.bounds())
            .reduce(|(alo, ahi), (blo, bhi)| (alo.min(blo), ahi.max(bhi)))
    }
}

/// Builds floor layers from floor-plan feature collections.
#[derive(Debug, Clone, Copy)]
pub struct LayerAssembler {
    origin: DVec2,
    vertical_offset: f32,
}

impl LayerAssembler {
    pub fn new(origin: DVec2, vertical_offset: f32) -> Self {
        Self {
            origin,
            vertical_offset,
        }
    }

    /// Extrudes one ring and places it on `floor`.
    pub fn place(&self, floor: FloorIndex, ring: &[DVec2], depth: f64) -> Result<PlacedFeature> {
        let mut solid = extrude_ring(ring, self.origin, depth)?;
        solid.transform(&upright_transform(floor, self.vertical_offset));
        let edges = solid.feature_edges(EDGE_THRESHOLD_DEG);
        Ok(PlacedFeature { solid, edges })
    }

    /// Places every polygon of `collection` on `floor`. Features without
    /// usable geometry are counted in `skipped`.
    pub fn assemble(
        &self,
        floor: FloorIndex,
        kind: FeatureKind,
        depth: f64,
        collection: &PlanCollection,
    ) -> FloorLayer {
        let mut features = Vec::with_capacity(collection.features.len());
        let mut skipped = 0;

        for (i, feature) in collection.features.iter().enumerate() {
            let Some(geometry) = &feature.geometry else {
                skipped += 1;
                continue;
            };

            let rings = geometry.outer_rings();
            if rings.is_empty() {
                skipped += 1;
                continue;
            }

            for ring in rings {
                let ring: Vec<DVec2> = ring.iter().map(|p| p.to_dvec2()).collect();
                match self.place(floor, &ring, depth) {
                    Ok(placed) => features.push(placed),
                    Err(e) => {
                        log::debug!("{} {} feature #{}: skipped ({})", floor_label(floor), kind, i, e);
                        skipped += 1;
                    }
                }
            }
        }

        FloorLayer {
            floor,
            kind,
            features,
            skipped,
        }
    }
}

/// All geometry of one floor, toggled as a unit.
#[derive(Debug, Clone)]
pub struct FloorGroup<L> {
    floor: FloorIndex,
    visible: bool,
    layers: Vec<L>,
}

impl<L> FloorGroup<L> {
    fn new(floor: FloorIndex) -> Self {
        Self {
            floor,
            visible: true,
            layers: Vec::new(),
        }
    }

    #[inline]
    pub fn floor(&self) -> FloorIndex {
        self.floor
    }

    pub fn label(&self) -> String {
        floor_label(self.floor)
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn layers(&self) -> &[L] {
        &self.layers
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Owns one group per floor index. `L` is whatever a layer becomes in the
/// consumer (CPU meshes in the converter, GPU buffers in the viewer).
#[derive(Debug, Clone)]
pub struct FloorRegistry<L> {
    groups: BTreeMap<FloorIndex, FloorGroup<L>>,
}

impl<L> Default for FloorRegistry<L> {
    fn default() -> Self {
        Self::new(&FLOORS)
    }
}

impl<L> FloorRegistry<L> {
    pub fn new(floors: &[FloorIndex]) -> Self {
        Self {
            groups: floors.iter().map(|&f| (f, FloorGroup::new(f))).collect(),
        }
    }

    pub fn contains(&self, floor: FloorIndex) -> bool {
        self.groups.contains_key(&floor)
    }

    /// Adds a layer to its floor's group. Returns the layer back when the
    /// floor has no group.
    pub fn insert(&mut self, floor: FloorIndex, layer: L) -> std::result::Result<(), L> {
        match self.groups.get_mut(&floor) {
            Some(group) => {
                group.layers.push(layer);
                Ok(())
            }
            None => Err(layer),
        }
    }

    pub fn get(&self, floor: FloorIndex) -> Option<&FloorGroup<L>> {
        self.groups.get(&floor)
    }

    /// Returns `false` when the floor has no group.
    pub fn set_visible(&mut self, floor: FloorIndex, visible: bool) -> bool {
        match self.groups.get_mut(&floor) {
            Some(group) => {
                group.visible = visible;
                true
            }
            None => false,
        }
    }

    /// Groups from the top floor down.
    pub fn iter(&self) -> impl Iterator<Item = &FloorGroup<L>> {
        self.groups.values().rev()
    }

    pub fn visible(&self) -> impl Iterator<Item = &FloorGroup<L>> {
        self.iter().filter(|g| g.visible)
    }

    pub fn floors(&self) -> Vec<FloorIndex> {
        self.iter().map(FloorGroup::floor).collect()
    }

    /// Number of groups holding at least one layer.
    pub fn populated(&self) -> usize {
        self.groups.values().filter(|g| !g.is_empty()).count()
    }
}
