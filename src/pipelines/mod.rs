//! Render pipelines of the viewer.
//!
//! - `basic` holds the shared pipeline construction
//! - `points` draws point clouds as camera facing quads
//! - `mesh` draws Lambert shaded triangle meshes
//! - `light` owns the directional light uniform
//! - `overlay` draws the hover popup in screen space

pub mod basic;
pub mod light;
pub mod mesh;
pub mod overlay;
pub mod points;

/// The scene pipelines, created once per surface format.
#[derive(Debug)]
pub struct Pipelines {
    pub points: wgpu::RenderPipeline,
    pub mesh: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        layouts: &basic::SceneLayouts,
    ) -> Self {
        Self {
            points: points::mk_points_pipeline(device, config, layouts),
            mesh: mesh::mk_mesh_pipeline(device, config, layouts),
        }
    }
}
