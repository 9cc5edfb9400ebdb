//! Interactive 3D viewer for the terminal floor plans.
//!
//! Floors, the pedestrian network and the context lines load in the
//! background; the scene fills in as each load resolves.

pub mod app;
pub mod camera;
pub mod config;
pub mod data;
pub mod loader;
pub mod renderer;
pub mod ui;
