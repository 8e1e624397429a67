use crate::{
    data_structures::{
        model::{MeshVertex, Vertex},
        texture::Texture,
    },
    pipelines::basic::{SceneLayouts, mk_render_pipeline, mk_scene_pipeline_layout},
};

/**
 * Lambert shaded triangle meshes, used when point clouds are turned off.
 *
 * glTF parts are often single sided sheets so both faces are drawn.
 */
pub fn mk_mesh_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    layouts: &SceneLayouts,
) -> wgpu::RenderPipeline {
    let layout = mk_scene_pipeline_layout(device, "Mesh Pipeline Layout", layouts);
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Mesh Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("mesh.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &layout,
        config.format,
        Some(wgpu::BlendState::REPLACE),
        Some(Texture::DEPTH_FORMAT),
        None,
        &[MeshVertex::desc()],
        shader,
    )
}
