//! Conversion of glTF nodes into scene graph nodes.

use std::sync::Arc;

use anyhow::Context;

use crate::data_structures::{
    geometry::Geometry,
    instance::Instance,
    scene_graph::{NodeId, NodeKind, SceneGraph},
};

/// Inserts `node` and its subtree into `graph` and returns the id of `node`.
///
/// A mesh with a single primitive becomes one `Mesh` node. A mesh with several
/// primitives becomes a `Group` named after the glTF node holding one `Mesh`
/// child per primitive.
pub fn to_scene_node(
    graph: &mut SceneGraph,
    node: gltf::scene::Node,
    buf: &[Vec<u8>],
) -> anyhow::Result<NodeId> {
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));
    let (translation, rotation, scale) = node.transform().decomposed();
    let local = Instance::from_decomposed(translation, rotation, scale);

    let id = match node.mesh() {
        Some(mesh) => {
            let mesh_name = mesh.name().unwrap_or(&name).to_string();
            let mut geometries: Vec<Geometry> = mesh
                .primitives()
                .filter_map(|primitive| read_primitive(&mesh_name, &primitive, buf))
                .collect();
            match geometries.len() {
                0 => {
                    log::warn!("Mesh '{}' has no usable primitives", mesh_name);
                    graph.insert(name, NodeKind::Group, local)
                }
                1 => {
                    let geometry = Arc::new(geometries.remove(0));
                    graph.insert(name, NodeKind::Mesh(geometry), local)
                }
                _ => {
                    let group = graph.insert(name, NodeKind::Group, local);
                    for (idx, geometry) in geometries.into_iter().enumerate() {
                        let child = graph.insert(
                            format!("{}_{}", mesh_name, idx),
                            NodeKind::Mesh(Arc::new(geometry)),
                            Instance::new(),
                        );
                        graph.add_child(group, child)?;
                    }
                    group
                }
            }
        }
        None if node.camera().is_some() => graph.insert(name, NodeKind::Camera, local),
        None => graph.insert(name, NodeKind::Group, local),
    };

    for child in node.children() {
        let child_index = child.index();
        let child = to_scene_node(graph, child, buf)?;
        graph
            .add_child(id, child)
            .with_context(|| format!("Could not attach glTF node {}", child_index))?;
    }
    Ok(id)
}

fn read_primitive(
    mesh_name: &str,
    primitive: &gltf::Primitive,
    buf: &[Vec<u8>],
) -> Option<Geometry> {
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        log::warn!(
            "Skipping {:?} primitive {} of mesh '{}'",
            primitive.mode(),
            primitive.index(),
            mesh_name
        );
        return None;
    }
    let reader = primitive.reader(|buffer| buf.get(buffer.index()).map(Vec::as_slice));
    let Some(positions) = reader.read_positions() else {
        log::warn!(
            "Primitive {} of mesh '{}' has no positions",
            primitive.index(),
            mesh_name
        );
        return None;
    };
    let positions: Vec<[f32; 3]> = positions.collect();
    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .map(|normals| normals.collect())
        .unwrap_or_default();
    let indices = reader
        .read_indices()
        .map(|indices| indices.into_u32().collect::<Vec<u32>>());
    let color = primitive
        .material()
        .pbr_metallic_roughness()
        .base_color_factor();

    Some(Geometry::new(mesh_name, positions, normals, indices, color))
}
