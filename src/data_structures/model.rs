//! GPU-side representation of drawable scene nodes.
//!
//! Each mesh or point-cloud node gets its own vertex data and a small uniform
//! buffer carrying its world matrix, colour and highlight state. The uniform is
//! rewritten every frame because the model spins and the highlight moves.

use cgmath::SquareMatrix;
use wgpu::util::DeviceExt;

use crate::data_structures::geometry::Geometry;

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// Vertex of a triangle mesh.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex for MeshVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// One point of a point cloud.
///
/// Points are drawn as camera facing quads: the quad corners come from the
/// vertex index in the shader while this struct advances once per instance.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointVertex {
    pub position: [f32; 3],
}

impl Vertex for PointVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PointVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        }
    }
}

/// Per node data as seen by the shaders.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NodeUniform {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub emissive_color: [f32; 4],
    // x: emissive intensity, y: point size in world units
    pub params: [f32; 4],
}

impl NodeUniform {
    pub fn new(
        model: cgmath::Matrix4<f32>,
        color: [f32; 4],
        emissive_color: [f32; 4],
        emissive: f32,
        point_size: f32,
    ) -> Self {
        Self {
            model: model.into(),
            color,
            emissive_color,
            params: [emissive, point_size, 0.0, 0.0],
        }
    }
}

pub fn node_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("node_bind_group_layout"),
    })
}

pub enum Shape {
    Points {
        vertex_buffer: wgpu::Buffer,
        num_points: u32,
    },
    Mesh {
        vertex_buffer: wgpu::Buffer,
        index_buffer: wgpu::Buffer,
        num_elements: u32,
    },
}

/// GPU resources of one drawable node.
pub struct GpuNode {
    pub shape: Shape,
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl GpuNode {
    pub fn points(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        name: &str,
        geometry: &Geometry,
    ) -> Self {
        let points: Vec<PointVertex> = geometry
            .positions
            .iter()
            .map(|&position| PointVertex { position })
            .collect();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Point Buffer", name)),
            contents: bytemuck::cast_slice(&points),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let shape = Shape::Points {
            vertex_buffer,
            num_points: points.len() as u32,
        };
        Self::with_shape(device, layout, name, shape)
    }

    pub fn mesh(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        name: &str,
        geometry: &Geometry,
    ) -> Self {
        let vertices: Vec<MeshVertex> = geometry
            .positions
            .iter()
            .zip(geometry.normals.iter())
            .map(|(&position, &normal)| MeshVertex { position, normal })
            .collect();
        let indices = geometry.triangle_indices();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", name)),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let shape = Shape::Mesh {
            vertex_buffer,
            index_buffer,
            num_elements: indices.len() as u32,
        };
        Self::with_shape(device, layout, name, shape)
    }

    fn with_shape(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        name: &str,
        shape: Shape,
    ) -> Self {
        let uniform = NodeUniform::new(
            cgmath::Matrix4::identity(),
            [1.0; 4],
            [0.0; 4],
            0.0,
            0.0,
        );
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Node Buffer", name)),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("node_bind_group"),
        });
        Self {
            shape,
            uniform_buffer,
            bind_group,
        }
    }

    pub fn write_uniform(&self, queue: &wgpu::Queue, uniform: NodeUniform) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }
}

pub trait DrawNode<'a> {
    fn draw_node(
        &mut self,
        node: &'a GpuNode,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    );
}

impl<'a> DrawNode<'a> for wgpu::RenderPass<'a> {
    fn draw_node(
        &mut self,
        node: &'a GpuNode,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    ) {
        let empty = match &node.shape {
            Shape::Points { num_points, .. } => *num_points == 0,
            Shape::Mesh { num_elements, .. } => *num_elements == 0,
        };
        if empty {
            return;
        }
        self.set_bind_group(0, camera_bind_group, &[]);
        self.set_bind_group(1, light_bind_group, &[]);
        self.set_bind_group(2, &node.bind_group, &[]);
        match &node.shape {
            Shape::Points {
                vertex_buffer,
                num_points,
            } => {
                self.set_vertex_buffer(0, vertex_buffer.slice(..));
                // Two triangles per point
                self.draw(0..6, 0..*num_points);
            }
            Shape::Mesh {
                vertex_buffer,
                index_buffer,
                num_elements,
            } => {
                self.set_vertex_buffer(0, vertex_buffer.slice(..));
                self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                self.draw_indexed(0..*num_elements, 0, 0..1);
            }
        }
    }
}
