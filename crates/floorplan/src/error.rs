use std::path::PathBuf;
use thiserror::Error;

/// Result type for floor-plan operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or building floor-plan geometry
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid GeoJSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid file pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("degenerate ring: {0}")]
    DegenerateRing(String),

    #[error("triangulation failed: {0}")]
    Triangulation(String),

    #[error("extrusion depth must be positive and finite, got {0}")]
    InvalidDepth(f64),
}
