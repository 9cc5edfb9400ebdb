//! Floor indices, feature kinds and the file-name floor classifier.

use crate::error::Result;
use regex::Regex;
use std::path::Path;

/// Signed floor index: `B3` is -3, `0` is the concourse level, `4` the top.
pub type FloorIndex = i32;

/// Floors that own a layer group, top floor first.
pub const FLOORS: [FloorIndex; 8] = [4, 3, 2, 1, 0, -1, -2, -3];

/// The three floor-plan datasets published per floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureKind {
    /// Rooms, concourses, platforms.
    Space,
    /// Floor slab outline.
    Floor,
    /// Stairs, escalators, gates and other fixtures.
    Fixture,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 3] = [FeatureKind::Space, FeatureKind::Floor, FeatureKind::Fixture];

    /// Type tag as it appears in file names.
    pub fn tag(self) -> &'static str {
        match self {
            FeatureKind::Space => "Space",
            FeatureKind::Floor => "Floor",
            FeatureKind::Fixture => "Fixture",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }

    /// Extrusion thickness used when the dataset config does not override it.
    pub fn default_depth(self) -> f64 {
        match self {
            FeatureKind::Space => 5.0,
            FeatureKind::Floor => 0.5,
            FeatureKind::Fixture => 5.0,
        }
    }

    /// Linear RGBA fill for solids of this kind.
    pub fn fill_color(self) -> [f32; 4] {
        match self {
            FeatureKind::Space => [0.30, 0.55, 0.85, 0.35],
            FeatureKind::Floor => [0.55, 0.57, 0.60, 0.60],
            FeatureKind::Fixture => [0.90, 0.55, 0.25, 0.70],
        }
    }

    /// Linear RGBA for the edge wireframe of this kind.
    pub fn edge_color(self) -> [f32; 4] {
        match self {
            FeatureKind::Space => [0.70, 0.85, 1.00, 0.80],
            FeatureKind::Floor => [0.80, 0.80, 0.80, 0.50],
            FeatureKind::Fixture => [1.00, 0.80, 0.60, 0.90],
        }
    }
}

impl std::fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A parsed floor token such as `B3`, `0` or `4out`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FloorToken {
    index: FloorIndex,
    outdoor: bool,
}

impl FloorToken {
    /// Parses a bare token. `B` marks a basement (negative index); an `out`
    /// suffix marks the outdoor annex of the same floor.
    pub fn parse(token: &str) -> Option<Self> {
        let (body, outdoor) = match token.strip_suffix("out") {
            Some(body) => (body, true),
            None => (token, false),
        };
        let (digits, basement) = match body.strip_prefix('B') {
            Some(digits) => (digits, true),
            None => (body, false),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let level: FloorIndex = digits.parse().ok()?;
        Some(Self {
            index: if basement { -level } else { level },
            outdoor,
        })
    }

    #[inline]
    pub fn index(self) -> FloorIndex {
        self.index
    }

    /// Outdoor annexes share their floor's index and group.
    #[inline]
    pub fn is_outdoor(self) -> bool {
        self.outdoor
    }

    pub fn label(self) -> String {
        floor_label(self.index)
    }
}

/// Human-readable floor label: `B2`, `0F`, `3F`.
pub fn floor_label(index: FloorIndex) -> String {
    if index < 0 {
        format!("B{}", -index)
    } else {
        format!("{index}F")
    }
}

/// Matches `{prefix}_{token}_{Kind}.geojson` file names.
#[derive(Debug, Clone)]
pub struct FloorClassifier {
    pattern: Regex,
}

impl FloorClassifier {
    pub fn new(prefix: &str) -> Result<Self> {
        let pattern = Regex::new(&format!(
            r"^{}_(?P<token>[^_]+)_(?P<kind>Space|Floor|Fixture)\.geojson$",
            regex::escape(prefix)
        ))?;
        Ok(Self { pattern })
    }

    /// Token and kind of a floor-plan file, or `None` if the name does not fit.
    pub fn match_file(&self, path: &Path) -> Option<(FloorToken, FeatureKind)> {
        let name = path.file_name()?.to_str()?;
        let caps = self.pattern.captures(name)?;
        let token = FloorToken::parse(caps.name("token")?.as_str())?;
        let kind = FeatureKind::from_tag(caps.name("kind")?.as_str())?;
        Some((token, kind))
    }

    /// Floor index of `path` when it is a `kind` file; `None` otherwise.
    pub fn classify(&self, path: &Path, kind: FeatureKind) -> Option<FloorIndex> {
        match self.match_file(path) {
            Some((token, k)) if k == kind => Some(token.index()),
            _ => None,
        }
    }
}
