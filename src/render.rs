//! Render composition and pipeline batching.
//!
//! The scene graph stays on the CPU. [`GpuScene`] mirrors its drawable nodes
//! as [`GpuNode`]s and, every frame, turns the attached scene into a
//! [`Render`] tree that is sorted into one batch per pipeline before drawing.
//!
//! # Key types
//!
//! - [`Render<'a>`] describes what to draw and with which pipeline
//! - [`GpuScene`] owns the GPU resources of the scene graph's drawable nodes
//! - [`NodeStyle`] holds the colours and sizes shared by all nodes

use std::collections::HashMap;

use wgpu::RenderPass;

use crate::{
    config::ViewerConfig,
    context::Context,
    data_structures::{
        model::{DrawNode, GpuNode, NodeUniform},
        scene_graph::{NodeId, NodeKind, SceneGraph},
    },
};

/// Specifies how a scene node should be rendered.
///
/// # Variants
///
/// - `None` renders nothing
/// - `Points` renders a point cloud with the points pipeline
/// - `Mesh` renders a triangle mesh with the mesh pipeline
/// - `Composed(Vec<Render>)` recursively renders a composition of renders
pub enum Render<'a> {
    None,
    Points(&'a GpuNode),
    Mesh(&'a GpuNode),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    pub(crate) fn set_pipelines(self, points: &mut Vec<&'a GpuNode>, meshes: &mut Vec<&'a GpuNode>) {
        match self {
            Render::Points(node) => points.push(node),
            Render::Mesh(node) => meshes.push(node),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pipelines(points, meshes)),
            Render::None => (),
        }
    }
}

/// Draws a render tree into an open scene pass, one pipeline at a time.
pub fn draw_scene<'a>(ctx: &'a Context, render_pass: &mut RenderPass<'a>, render: Render<'a>) {
    let mut points: Vec<&GpuNode> = Vec::new();
    let mut meshes: Vec<&GpuNode> = Vec::new();
    render.set_pipelines(&mut points, &mut meshes);

    if !meshes.is_empty() {
        render_pass.set_pipeline(&ctx.pipelines.mesh);
        for node in meshes {
            render_pass.draw_node(node, &ctx.camera.bind_group, &ctx.light.bind_group);
        }
    }
    if !points.is_empty() {
        render_pass.set_pipeline(&ctx.pipelines.points);
        for node in points {
            render_pass.draw_node(node, &ctx.camera.bind_group, &ctx.light.bind_group);
        }
    }
}

/// Colours and sizes applied to every drawable node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStyle {
    pub point_colour: [f32; 4],
    pub emissive_colour: [f32; 4],
    pub point_size: f32,
}

impl From<&ViewerConfig> for NodeStyle {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            point_colour: config.point_colour,
            emissive_colour: config.emissive_colour,
            point_size: config.point_size,
        }
    }
}

impl NodeStyle {
    /// Uniform of `id` for this frame, or `None` if the node draws nothing.
    pub fn uniform(&self, graph: &SceneGraph, id: NodeId) -> Option<NodeUniform> {
        let node = graph.get(id)?;
        let color = match &node.kind {
            NodeKind::Points(_) => self.point_colour,
            NodeKind::Mesh(geometry) => geometry.color,
            _ => return None,
        };
        Some(NodeUniform::new(
            graph.world_transform(id).to_matrix(),
            color,
            self.emissive_colour,
            node.emissive,
            self.point_size,
        ))
    }
}

/// GPU mirror of the drawable nodes in the attached scene.
#[derive(Default)]
pub struct GpuScene {
    nodes: HashMap<NodeId, GpuNode>,
}

impl GpuScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Creates buffers for new drawable nodes and drops those that left the scene.
    pub fn sync(&mut self, device: &wgpu::Device, layout: &wgpu::BindGroupLayout, graph: &SceneGraph) {
        let drawable = drawable_nodes(graph);
        self.nodes.retain(|id, _| drawable.contains(id));
        for id in drawable {
            if self.nodes.contains_key(&id) {
                continue;
            }
            let Some(node) = graph.get(id) else {
                continue;
            };
            let gpu_node = match &node.kind {
                NodeKind::Points(geometry) => GpuNode::points(device, layout, &node.name, geometry),
                NodeKind::Mesh(geometry) => GpuNode::mesh(device, layout, &node.name, geometry),
                _ => continue,
            };
            log::debug!("Uploaded '{}' to the GPU", node.name);
            self.nodes.insert(id, gpu_node);
        }
    }

    pub fn write_uniforms(&self, queue: &wgpu::Queue, graph: &SceneGraph, style: &NodeStyle) {
        for (id, gpu_node) in &self.nodes {
            if let Some(uniform) = style.uniform(graph, *id) {
                gpu_node.write_uniform(queue, uniform);
            }
        }
    }

    /// The attached scene in traversal order.
    pub fn render<'a>(&'a self, graph: &SceneGraph) -> Render<'a> {
        let Some(root) = graph.root() else {
            return Render::None;
        };
        let renders = graph
            .traverse(root)
            .into_iter()
            .filter_map(|id| {
                let gpu_node = self.nodes.get(&id)?;
                match graph.get(id)?.kind {
                    NodeKind::Points(_) => Some(Render::Points(gpu_node)),
                    NodeKind::Mesh(_) => Some(Render::Mesh(gpu_node)),
                    _ => None,
                }
            })
            .collect();
        Render::Composed(renders)
    }
}

/// Points and mesh nodes reachable from the attached root.
pub fn drawable_nodes(graph: &SceneGraph) -> Vec<NodeId> {
    let Some(root) = graph.root() else {
        return Vec::new();
    };
    graph
        .traverse(root)
        .into_iter()
        .filter(|id| {
            graph
                .get(*id)
                .is_some_and(|node| node.kind.is_points() || node.kind.is_mesh())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::data_structures::{geometry::Geometry, instance::Instance};

    #[test]
    fn style_colours_points_and_meshes_differently() {
        let mut graph = SceneGraph::new();
        let root = graph.insert("Scene", NodeKind::Group, Instance::new());
        let geometry = Arc::new(Geometry::new(
            "tri",
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            Vec::new(),
            None,
            [0.2, 0.3, 0.4, 1.0],
        ));
        let mesh = graph.insert("mesh", NodeKind::Mesh(geometry.clone()), Instance::new());
        let points = graph.insert("points", NodeKind::Points(geometry), Instance::new());
        graph.add_child(root, mesh).unwrap();
        graph.add_child(root, points).unwrap();
        graph.attach_root(root).unwrap();
        graph.get_mut(points).unwrap().emissive = 1.0;

        let style = NodeStyle::from(&ViewerConfig::default());
        assert!(style.uniform(&graph, root).is_none());
        assert_eq!(style.uniform(&graph, mesh).unwrap().color, [0.2, 0.3, 0.4, 1.0]);
        let uniform = style.uniform(&graph, points).unwrap();
        assert_eq!(uniform.color, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(uniform.params[0], 1.0);
        assert_eq!(uniform.params[1], 0.05);

        assert_eq!(drawable_nodes(&graph), vec![mesh, points]);
        graph.detach(mesh);
        assert_eq!(drawable_nodes(&graph), vec![points]);
    }
}
