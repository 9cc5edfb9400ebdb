//! Citywide line features (rail lines, streets) drawn flat around the terminal.

use crate::geojson::PlanCollection;
use glam::{DVec2, Vec3};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextLines {
    pub polylines: Vec<Vec<Vec3>>,
}

impl ContextLines {
    /// Flattens every line of `collection` to `height`, recentered on `origin`.
    pub fn from_collection(collection: &PlanCollection, origin: DVec2, height: f32) -> Self {
        let polylines = collection
            .features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .flat_map(|g| g.lines())
            .filter_map(|line| {
                let points: Vec<Vec3> = line
                    .iter()
                    .map(|p| p.to_dvec2())
                    .filter(|p| p.is_finite())
                    .map(|p| {
                        let local = p - origin;
                        Vec3::new(local.x as f32, height, -local.y as f32)
                    })
                    .collect();
                (points.len() >= 2).then_some(points)
            })
            .collect();

        Self { polylines }
    }

    /// Consecutive point pairs of every polyline.
    pub fn segments(&self) -> impl Iterator<Item = [Vec3; 2]> + '_ {
        self.polylines
            .iter()
            .flat_map(|line| line.windows(2).map(|w| [w[0], w[1]]))
    }

    pub fn segment_count(&self) -> usize {
        self.polylines.iter().map(|l| l.len() - 1).sum()
    }
}
