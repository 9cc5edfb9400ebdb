use clap::Parser;
use floorplan::DatasetConfig;
use std::path::PathBuf;

/// `terminal_viewer` - interactive 3D view of a multi-level train terminal.
///
/// Floor plans are extruded and stacked per floor; the pedestrian network is
/// drawn on top as animated dashed lines.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct ViewerArgs {
    /// Directory holding the GeoJSON dataset.
    #[arg(long, env = "TERMINAL_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// File name prefix in front of the floor token.
    #[arg(long, env = "TERMINAL_PREFIX", default_value = floorplan::dataset::DEFAULT_PREFIX)]
    pub prefix: String,

    /// Walk the data directory instead of loading the fixed file set.
    #[arg(long, default_value_t = false)]
    pub discover: bool,

    /// Height between two consecutive floors, in scene units.
    #[arg(long, default_value_t = floorplan::dataset::DEFAULT_VERTICAL_OFFSET)]
    pub vertical_offset: f32,

    /// Width of pedestrian network lines, in logical pixels.
    #[arg(long, default_value_t = 6.0)]
    pub line_width: f32,
}

impl ViewerArgs {
    pub fn dataset_config(&self) -> DatasetConfig {
        DatasetConfig {
            data_dir: self.data_dir.clone(),
            prefix: self.prefix.clone(),
            vertical_offset: self.vertical_offset,
            ..DatasetConfig::default()
        }
    }
}
