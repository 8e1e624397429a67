use crate::{
    data_structures::{
        model::{PointVertex, Vertex},
        texture::Texture,
    },
    pipelines::basic::{SceneLayouts, mk_render_pipeline, mk_scene_pipeline_layout},
};

/**
 * Draws point clouds as camera facing quads, one instance per point.
 *
 * Quads are never back facing so culling stays off.
 */
pub fn mk_points_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    layouts: &SceneLayouts,
) -> wgpu::RenderPipeline {
    let layout = mk_scene_pipeline_layout(device, "Points Pipeline Layout", layouts);
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Points Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("points.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &layout,
        config.format,
        Some(wgpu::BlendState::REPLACE),
        Some(Texture::DEPTH_FORMAT),
        None,
        &[PointVertex::desc()],
        shader,
    )
}
