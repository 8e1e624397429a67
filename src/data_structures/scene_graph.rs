//! Scene graph and hierarchical scene organization.
//!
//! Nodes live in an arena owned by [`SceneGraph`] and refer to each other by
//! [`NodeId`]. A child knows its parent and a parent lists its children, but
//! neither owns the other, so there are no reference cycles to manage. Only the
//! subtree below the attached root is part of the active scene; detached nodes
//! stay in the arena until they are removed.

use std::sync::Arc;

use anyhow::{Result, bail};
use log::{debug, warn};

use crate::data_structures::{geometry::Geometry, instance::Instance};

/// Stable index of a node inside a [`SceneGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    Group,
    Mesh(Arc<Geometry>),
    Points(Arc<Geometry>),
    Light,
    Camera,
}

impl NodeKind {
    pub fn is_mesh(&self) -> bool {
        matches!(self, NodeKind::Mesh(_))
    }

    pub fn is_points(&self) -> bool {
        matches!(self, NodeKind::Points(_))
    }

    pub fn geometry(&self) -> Option<&Arc<Geometry>> {
        match self {
            NodeKind::Mesh(geometry) | NodeKind::Points(geometry) => Some(geometry),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub local: Instance,
    /// Self-illumination used as the hover highlight. 0 is off, 1 is fully highlighted.
    pub emissive: f32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<Option<Node>>,
    root: Option<NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a detached node to the arena.
    pub fn insert(&mut self, name: impl Into<String>, kind: NodeKind, local: Instance) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node {
            name: name.into(),
            kind,
            local,
            emissive: 0.0,
            parent: None,
            children: Vec::new(),
        }));
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of nodes in the arena, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |node| node.children.as_slice())
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Makes `id` the single root of the active scene, replacing any previous root.
    pub fn attach_root(&mut self, id: NodeId) -> Result<()> {
        let Some(node) = self.get(id) else {
            bail!("cannot attach unknown node {:?} as root", id);
        };
        if node.parent.is_some() {
            bail!("node '{}' still has a parent and cannot become the root", node.name);
        }
        if let Some(previous) = self.root.replace(id) {
            if previous != id {
                debug!("Replacing scene root {:?} with {:?}", previous, id);
            }
        }
        Ok(())
    }

    pub fn detach_root(&mut self) -> Option<NodeId> {
        self.root.take()
    }

    /// Appends `child` to `parent`, detaching it from its previous parent first.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_child(parent, child, None)
    }

    fn insert_child(&mut self, parent: NodeId, child: NodeId, at: Option<usize>) -> Result<()> {
        if !self.contains(parent) || !self.contains(child) {
            bail!("cannot link unknown nodes {:?} -> {:?}", parent, child);
        }
        if self.ancestors(parent).any(|ancestor| ancestor == child) || parent == child {
            bail!("linking {:?} under {:?} would create a cycle", child, parent);
        }
        if self.root == Some(child) {
            self.root = None;
        }
        self.detach(child);
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.get_mut(parent) {
            match at {
                Some(index) if index <= node.children.len() => node.children.insert(index, child),
                _ => node.children.push(child),
            }
        }
        Ok(())
    }

    /// Unlinks `id` from its parent. The node and its subtree stay in the arena.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(node) = self.get_mut(parent) {
            node.children.retain(|&child| child != id);
        }
        if let Some(node) = self.get_mut(id) {
            node.parent = None;
        }
    }

    /// Removes a single node from the arena. Its children become parentless.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        self.detach(id);
        if self.root == Some(id) {
            self.root = None;
        }
        let node = self.nodes.get_mut(id.0)?.take()?;
        for child in &node.children {
            if let Some(child) = self.get_mut(*child) {
                child.parent = None;
            }
        }
        Some(node)
    }

    /// Walks from the parent of `id` up to the top of its tree.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&current| self.parent(current))
    }

    /// Depth-first, pre-order list of `start` and everything below it.
    pub fn traverse(&self, start: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            order.push(id);
            stack.extend(node.children.iter().rev());
        }
        order
    }

    /// Whether `id` is the attached root or one of its descendants.
    pub fn is_in_scene(&self, id: NodeId) -> bool {
        let Some(root) = self.root else {
            return false;
        };
        self.contains(id) && (id == root || self.ancestors(id).any(|ancestor| ancestor == root))
    }

    /// Composes local transforms from the top of the node's tree down to the node.
    pub fn world_transform(&self, id: NodeId) -> Instance {
        let mut chain: Vec<NodeId> = self.ancestors(id).collect();
        chain.reverse();
        chain.push(id);
        chain
            .into_iter()
            .filter_map(|node| self.get(node))
            .fold(Instance::new(), |world, node| &world * &node.local)
    }

    pub fn set_emissive_subtree(&mut self, start: NodeId, intensity: f32) {
        for id in self.traverse(start) {
            if let Some(node) = self.get_mut(id) {
                node.emissive = intensity;
            }
        }
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .find_map(|(idx, node)| match node {
                Some(node) if node.name == name => Some(NodeId(idx)),
                _ => None,
            })
    }

    /// Swaps every mesh below `start` for a point cloud of the same geometry.
    ///
    /// The replacement is named `<mesh>_points`, keeps the mesh's local transform
    /// and takes over its slot in the parent and its children. A mesh without a
    /// parent cannot be swapped; it is reported and left untouched.
    ///
    /// Returns the ids of the created point-cloud nodes in traversal order.
    pub fn convert_meshes_to_points(&mut self, start: NodeId) -> Vec<NodeId> {
        let mut created = Vec::new();
        self.convert_node(start, &mut created);
        created
    }

    fn convert_node(&mut self, id: NodeId, created: &mut Vec<NodeId>) {
        let Some(node) = self.get(id) else {
            return;
        };
        let NodeKind::Mesh(geometry) = &node.kind else {
            for child in node.children.clone() {
                self.convert_node(child, created);
            }
            return;
        };
        let Some(parent) = node.parent else {
            warn!("Mesh parent not found for: {}", node.name);
            return;
        };

        let name = format!("{}_points", node.name);
        let geometry = geometry.clone();
        let local = node.local.clone();
        let children = node.children.clone();
        let slot = self
            .children(parent)
            .iter()
            .position(|&child| child == id);

        debug!(
            "Replacing mesh '{}' ({} vertices) with '{}'",
            node.name,
            geometry.positions.len(),
            name
        );
        let points = self.insert(name, NodeKind::Points(geometry), local);
        self.remove(id);
        if let Err(e) = self.insert_child(parent, points, slot) {
            warn!("Could not attach point cloud: {}", e);
        }
        for child in &children {
            if let Err(e) = self.add_child(points, *child) {
                warn!("Could not move child {:?} to the point cloud: {}", child, e);
            }
        }
        created.push(points);

        for child in children {
            self.convert_node(child, created);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Arc<Geometry> {
        Arc::new(Geometry::new(
            "tri",
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            Vec::new(),
            None,
            [1.0; 4],
        ))
    }

    #[test]
    fn add_child_moves_node_between_parents() {
        let mut graph = SceneGraph::new();
        let a = graph.insert("a", NodeKind::Group, Instance::new());
        let b = graph.insert("b", NodeKind::Group, Instance::new());
        let c = graph.insert("c", NodeKind::Group, Instance::new());
        graph.add_child(a, c).unwrap();
        graph.add_child(b, c).unwrap();
        assert!(graph.children(a).is_empty());
        assert_eq!(graph.children(b), &[c]);
        assert_eq!(graph.parent(c), Some(b));
    }

    #[test]
    fn cycles_are_rejected() {
        let mut graph = SceneGraph::new();
        let a = graph.insert("a", NodeKind::Group, Instance::new());
        let b = graph.insert("b", NodeKind::Group, Instance::new());
        graph.add_child(a, b).unwrap();
        assert!(graph.add_child(b, a).is_err());
        assert!(graph.add_child(a, a).is_err());
    }

    #[test]
    fn traversal_is_depth_first_pre_order() {
        let mut graph = SceneGraph::new();
        let root = graph.insert("root", NodeKind::Group, Instance::new());
        let left = graph.insert("left", NodeKind::Group, Instance::new());
        let leaf = graph.insert("leaf", NodeKind::Group, Instance::new());
        let right = graph.insert("right", NodeKind::Group, Instance::new());
        graph.add_child(root, left).unwrap();
        graph.add_child(left, leaf).unwrap();
        graph.add_child(root, right).unwrap();
        assert_eq!(graph.traverse(root), vec![root, left, leaf, right]);
    }

    #[test]
    fn conversion_keeps_sibling_position() {
        let mut graph = SceneGraph::new();
        let root = graph.insert("root", NodeKind::Group, Instance::new());
        let first = graph.insert("first", NodeKind::Group, Instance::new());
        let mesh = graph.insert("mesh", NodeKind::Mesh(triangle()), Instance::new());
        let last = graph.insert("last", NodeKind::Group, Instance::new());
        for child in [first, mesh, last] {
            graph.add_child(root, child).unwrap();
        }

        let created = graph.convert_meshes_to_points(root);

        assert_eq!(created.len(), 1);
        assert_eq!(graph.children(root), &[first, created[0], last]);
        assert!(!graph.contains(mesh));
        assert_eq!(graph.get(created[0]).unwrap().name, "mesh_points");
    }

    #[test]
    fn parentless_mesh_is_left_alone() {
        let mut graph = SceneGraph::new();
        let mesh = graph.insert("lonely", NodeKind::Mesh(triangle()), Instance::new());
        let created = graph.convert_meshes_to_points(mesh);
        assert!(created.is_empty());
        assert!(graph.get(mesh).unwrap().kind.is_mesh());
        assert_eq!(graph.len(), 1);
    }
}
