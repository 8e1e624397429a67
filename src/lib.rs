//! hover-view
//!
//! A small desktop viewer for glTF models. The model is shown as a point
//! cloud that slowly spins, and the part under the mouse cursor is found by
//! ray casting, highlighted and named in a popup next to the cursor.
//!
//! High-level modules
//! - `camera`: orbit camera, projection, controller and uniforms
//! - `config`: runtime configuration of the viewer
//! - `context`: GPU and window context that owns device/queue/pipelines
//! - `data_structures`: scene graph, geometry, transforms and GPU models
//! - `flow`: the application shell and its run loop
//! - `pick`: ray casting against the collectible nodes
//! - `pipelines`: point cloud, mesh and overlay render pipelines
//! - `resources`: loading glTF files into a scene graph
//! - `render`: GPU mirror of the scene and pipeline batching
//! - `viewer`: the per-frame hover logic, free of any GPU code
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod pick;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod viewer;

// Re-exports commonly used types for convenience in downstream code.
pub use config::ViewerConfig;
pub use flow::{RunFlag, run, run_until};
