//! Viewer data structures: scene graph, geometry, transforms and GPU models.
//!
//! - `geometry` holds CPU side vertex data and bounding spheres
//! - `instance` is the position/rotation/scale transform of a node
//! - `model` contains the GPU buffers and draw helpers for drawable nodes
//! - `scene_graph` is the arena of nodes making up the loaded model
//! - `texture` wraps the depth texture used by the render pass

pub mod geometry;
pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
