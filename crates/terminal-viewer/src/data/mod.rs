//! Data handling for the terminal viewer.
//!
//! - GPU layouts of vertices, link instances and the scene uniform.
//! - Conversion of loaded floor layers and networks into GPU buffers.
//! - The scene the renderer draws, with its visibility flags.

pub mod scene;
pub mod types;

pub use self::scene::Scene;
pub use self::types::{LayerGpu, LineVertex, LinesGpu, LinkGpu, MeshVertex, SceneUniformStd140, SegmentInstance};
