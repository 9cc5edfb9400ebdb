use anyhow::{Context, Result};
use clap::Parser;
use floorplan::dataset::{run_job, DatasetConfig, DEFAULT_PREFIX, DEFAULT_VERTICAL_OFFSET};
use floorplan::floor::floor_label;
use floorplan::{FloorIndex, FloorLayer, LinkNetwork, LoadOutput, Manifest};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    time::Instant,
};

mod obj;
mod summary;

use summary::{FloorSummary, NetworkSummary, SkippedFile, Summary};

#[derive(Parser, Debug, Clone)]
#[command(name = "geojson2obj", version, about = "Export terminal floor plans as OBJ")]
struct Args {
    #[arg(long, env = "TERMINAL_DATA_DIR", default_value = "data")]
    input_dir: PathBuf,

    #[arg(long, default_value = "obj")]
    output_dir: PathBuf,

    /// Dataset name in front of every floor file.
    #[arg(long, env = "TERMINAL_PREFIX", default_value = DEFAULT_PREFIX)]
    prefix: String,

    /// Convert whatever floor files are in the input directory instead of
    /// the published floor list.
    #[arg(long, default_value_t = false)]
    discover: bool,

    #[arg(long, default_value_t = DEFAULT_VERTICAL_OFFSET)]
    vertical_offset: f32,

    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl Args {
    fn dataset_config(&self) -> DatasetConfig {
        DatasetConfig {
            data_dir: self.input_dir.clone(),
            prefix: self.prefix.clone(),
            vertical_offset: self.vertical_offset,
            ..DatasetConfig::default()
        }
    }
}

/// Creates `path` and hands a buffered writer to `write`, unless the file
/// exists and `overwrite` is off. Returns whether the file was written.
fn write_output<F>(path: &Path, overwrite: bool, write: F) -> Result<bool>
where
    F: FnOnce(BufWriter<File>) -> std::io::Result<BufWriter<File>>,
{
    if path.exists() && !overwrite {
        debug!("Skipping existing file: {}", path.display());
        return Ok(false);
    }

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = write(BufWriter::new(file)).with_context(|| format!("writing {}", path.display()))?;
    out.flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(true)
}

fn convert(args: &Args) -> Result<Summary> {
    let started = Instant::now();
    let config = args.dataset_config();
    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;

    let manifest = if args.discover {
        Manifest::discover(&config)
    } else {
        Manifest::standard(&config)
    }
    .context("building the dataset manifest")?;

    info!("Processing {} jobs...", manifest.len());

    let results: Vec<_> = manifest
        .jobs
        .par_iter()
        .map(|job| (job.label(), run_job(job, &config)))
        .collect();

    let mut floors: BTreeMap<FloorIndex, Vec<FloorLayer>> = BTreeMap::new();
    let mut network: Option<LinkNetwork> = None;
    let mut summary = Summary {
        rejected: manifest.rejected.clone(),
        ..Summary::default()
    };

    for (label, result) in results {
        match result {
            Ok(LoadOutput::Floor(layer)) => floors.entry(layer.floor).or_default().push(layer),
            Ok(LoadOutput::Network(n)) => network = Some(n),
            Ok(LoadOutput::Context(_)) => debug!("Context lines are not exported"),
            Err(err) => {
                warn!("Error processing {}: {}", label, err);
                summary.skipped.push(SkippedFile {
                    job: label,
                    reason: err.to_string(),
                });
            }
        }
    }

    for (floor, layers) in floors.iter().rev() {
        let floor_summary = FloorSummary::from_layers(*floor, layers);
        if floor_summary.features > 0 {
            let path = args.output_dir.join(format!("floor_{}.obj", floor_label(*floor)));
            if write_output(&path, args.overwrite, |w| obj::write_floor(w, &floor_summary.label, layers))? {
                info!(
                    "Wrote {} ({} features, {} triangles)",
                    path.display(),
                    floor_summary.features,
                    floor_summary.triangles
                );
            }
        }
        summary.floors.push(floor_summary);
    }

    if let Some(network) = &network {
        let path = args.output_dir.join("pedestrian_network.obj");
        if write_output(&path, args.overwrite, |w| obj::write_network(w, network))? {
            info!("Wrote {} ({} segments)", path.display(), network.segments.len());
        }
        summary.network = Some(NetworkSummary::from(network));
    }

    let path = args.output_dir.join("summary.json");
    write_output(&path, args.overwrite, |mut w| {
        serde_json::to_writer_pretty(&mut w, &summary)?;
        writeln!(w)?;
        Ok(w)
    })?;

    info!(
        "Done in {:.2?}: {} floors, {} features, {} jobs skipped",
        started.elapsed(),
        summary.floors.len(),
        summary.total_features(),
        summary.skipped.len()
    );

    Ok(summary)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    convert(&args)?;
    Ok(())
}
