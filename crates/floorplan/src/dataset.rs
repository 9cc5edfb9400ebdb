//! Dataset layout, load jobs and load completion tracking.

use crate::context_lines::ContextLines;
use crate::error::Result;
use crate::floor::{floor_label, FeatureKind, FloorClassifier, FloorIndex};
use crate::geojson::{read_collection, FeatureCollection, LinkProperties, NodeProperties, PlanCollection};
use crate::layers::{floor_base_height, FloorLayer, LayerAssembler};
use crate::links::{edges_from_collection, LinkBuilder, LinkNetwork, NodeIndex};
use glam::DVec2;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Floor tokens published for the terminal, top floor first.
pub const DEFAULT_FLOOR_TOKENS: [&str; 11] =
    ["4out", "4", "3out", "3", "2out", "2", "1", "0", "B1", "B2", "B3"];

pub const DEFAULT_PREFIX: &str = "ShinjukuTerminal";

/// Projected coordinates of the scene origin (plane rectangular system).
pub const DEFAULT_ORIGIN: [f64; 2] = [-12035.29, -34261.85];

pub const DEFAULT_VERTICAL_OFFSET: f32 = 30.0;

/// Where the dataset lives and how it is placed in the scene.
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub data_dir: PathBuf,
    /// File name prefix before the floor token, e.g. `ShinjukuTerminal`.
    pub prefix: String,
    pub floor_tokens: Vec<String>,
    pub nodes_file: String,
    pub links_file: String,
    /// Citywide line features; `None` skips the context layer.
    pub context_file: Option<String>,
    pub origin: DVec2,
    /// Height between two consecutive floors.
    pub vertical_offset: f32,
    pub space_depth: f64,
    pub floor_depth: f64,
    pub fixture_depth: f64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            prefix: DEFAULT_PREFIX.to_string(),
            floor_tokens: DEFAULT_FLOOR_TOKENS.iter().map(|s| s.to_string()).collect(),
            nodes_file: "nodes.geojson".to_string(),
            links_file: "links.geojson".to_string(),
            context_file: Some("city_lines.geojson".to_string()),
            origin: DVec2::from(DEFAULT_ORIGIN),
            vertical_offset: DEFAULT_VERTICAL_OFFSET,
            space_depth: FeatureKind::Space.default_depth(),
            floor_depth: FeatureKind::Floor.default_depth(),
            fixture_depth: FeatureKind::Fixture.default_depth(),
        }
    }
}

impl DatasetConfig {
    pub fn depth(&self, kind: FeatureKind) -> f64 {
        match kind {
            FeatureKind::Space => self.space_depth,
            FeatureKind::Floor => self.floor_depth,
            FeatureKind::Fixture => self.fixture_depth,
        }
    }

    /// Path of the `kind` file for `token`.
    pub fn floor_file(&self, token: &str, kind: FeatureKind) -> PathBuf {
        self.data_dir
            .join(format!("{}_{}_{}.geojson", self.prefix, token, kind.tag()))
    }
}

/// One independently loadable unit of the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadJob {
    Floor {
        path: PathBuf,
        floor: FloorIndex,
        kind: FeatureKind,
    },
    /// Nodes and links load together; segments need both.
    Network { nodes: PathBuf, links: PathBuf },
    Context { path: PathBuf },
}

impl LoadJob {
    /// Short name for logs and the loading indicator.
    pub fn label(&self) -> String {
        fn name(path: &Path) -> String {
            path.file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        }

        match self {
            LoadJob::Floor { path, .. } | LoadJob::Context { path } => name(path),
            LoadJob::Network { links, .. } => format!("pedestrian network ({})", name(links)),
        }
    }
}

/// Output of a finished job, ready to be placed in the scene.
#[derive(Debug, Clone)]
pub enum LoadOutput {
    Floor(FloorLayer),
    Network(LinkNetwork),
    Context(ContextLines),
}

/// The set of jobs making up a dataset.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub jobs: Vec<LoadJob>,
    /// Candidate files the floor classifier did not accept.
    pub rejected: Vec<PathBuf>,
}

impl Manifest {
    /// The fixed file set: every token x kind, the network pair and the
    /// context file. Floor indices come from the classifier, so a token it
    /// rejects never produces a job.
    pub fn standard(config: &DatasetConfig) -> Result<Self> {
        let classifier = FloorClassifier::new(&config.prefix)?;
        let mut manifest = Manifest::default();

        for token in &config.floor_tokens {
            for kind in FeatureKind::ALL {
                let path = config.floor_file(token, kind);
                match classifier.classify(&path, kind) {
                    Some(floor) => manifest.jobs.push(LoadJob::Floor { path, floor, kind }),
                    None => {
                        log::debug!("Floor token '{}' not recognised; skipping {}", token, path.display());
                        manifest.rejected.push(path);
                    }
                }
            }
        }

        manifest.jobs.push(LoadJob::Network {
            nodes: config.data_dir.join(&config.nodes_file),
            links: config.data_dir.join(&config.links_file),
        });

        if let Some(context) = &config.context_file {
            manifest.jobs.push(LoadJob::Context {
                path: config.data_dir.join(context),
            });
        }

        Ok(manifest)
    }

    /// Walks `config.data_dir` and keeps what is actually there. The network
    /// job needs both its files present.
    pub fn discover(config: &DatasetConfig) -> Result<Self> {
        let classifier = FloorClassifier::new(&config.prefix)?;
        let mut manifest = Manifest::default();
        let mut nodes = None;
        let mut links = None;
        let mut context = None;

        let mut paths: Vec<PathBuf> = WalkDir::new(&config.data_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("geojson"))
            .collect();
        paths.sort();

        for path in paths {
            let name = path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_owned();

            if name == config.nodes_file {
                nodes = Some(path);
            } else if name == config.links_file {
                links = Some(path);
            } else if config.context_file.as_deref() == Some(name.as_str()) {
                context = Some(path);
            } else if let Some((token, kind)) = classifier.match_file(&path) {
                manifest.jobs.push(LoadJob::Floor {
                    path,
                    floor: token.index(),
                    kind,
                });
            } else {
                log::debug!("No floor token in '{}'; ignoring", path.display());
                manifest.rejected.push(path);
            }
        }

        match (nodes, links) {
            (Some(nodes), Some(links)) => manifest.jobs.push(LoadJob::Network { nodes, links }),
            (None, None) => {}
            (n, l) => log::warn!(
                "Pedestrian network incomplete in '{}' (nodes: {}, links: {}); skipping",
                config.data_dir.display(),
                n.is_some(),
                l.is_some()
            ),
        }

        if let Some(path) = context {
            manifest.jobs.push(LoadJob::Context { path });
        }

        Ok(manifest)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Reads and builds one job. Pure apart from file reads; safe to run on any
/// thread.
pub fn run_job(job: &LoadJob, config: &DatasetConfig) -> Result<LoadOutput> {
    match job {
        LoadJob::Floor { path, floor, kind } => {
            let collection: PlanCollection = read_collection(path)?;
            let layer = LayerAssembler::new(config.origin, config.vertical_offset).assemble(
                *floor,
                *kind,
                config.depth(*kind),
                &collection,
            );
            log::info!(
                "Loaded {} {} from {}: {} features, {} triangles, {} skipped",
                floor_label(*floor),
                kind,
                job.label(),
                layer.features.len(),
                layer.triangle_count(),
                layer.skipped
            );
            Ok(LoadOutput::Floor(layer))
        }
        LoadJob::Network { nodes, links } => {
            let nodes: FeatureCollection<NodeProperties> = read_collection(nodes)?;
            let links: FeatureCollection<LinkProperties> = read_collection(links)?;
            let index = NodeIndex::from_collection(&nodes);
            let edges = edges_from_collection(&links);
            let network = LinkBuilder::new(config.origin, config.vertical_offset).build(&index, &edges);
            log::info!(
                "Loaded pedestrian network: {} nodes, {} edges, {} segments, {} unresolved endpoints",
                index.len(),
                network.edges,
                network.segments.len(),
                network.unresolved_endpoints
            );
            Ok(LoadOutput::Network(network))
        }
        LoadJob::Context { path } => {
            let collection: PlanCollection = read_collection(path)?;
            let lines = ContextLines::from_collection(
                &collection,
                config.origin,
                floor_base_height(0, config.vertical_offset),
            );
            log::info!(
                "Loaded context lines from {}: {} polylines",
                job.label(),
                lines.polylines.len()
            );
            Ok(LoadOutput::Context(lines))
        }
    }
}

/// Counts outstanding loads so "everything has arrived" is an explicit event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadTracker {
    total: usize,
    succeeded: usize,
    failed: usize,
    announced: bool,
}

impl LoadTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Records one resolved load, successful or not.
    pub fn record(&mut self, ok: bool) {
        if self.pending() == 0 {
            log::warn!("Load completion recorded with nothing pending");
            return;
        }
        if ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    #[inline]
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed
    }

    #[inline]
    pub fn failed(&self) -> usize {
        self.failed
    }

    #[inline]
    pub fn pending(&self) -> usize {
        self.total - self.completed()
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.pending() == 0
    }

    /// `true` exactly once: the first call after the last load resolved.
    pub fn take_finished(&mut self) -> bool {
        if self.is_finished() && !self.announced {
            self.announced = true;
            true
        } else {
            false
        }
    }

    /// Fraction of resolved loads in [0, 1].
    pub fn progress(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.completed() as f32 / self.total as f32
        }
    }
}
