//! Per-frame hover logic of the viewer.
//!
//! [`Viewer`] owns the scene graph and everything derived from it: the
//! collectible nodes, the cursor, the current selection and the model's spin.
//! It knows nothing about the GPU, so every frame can be driven from tests.
//!
//! A frame is split in two halves around rendering:
//!
//! 1. [`Viewer::begin_frame`] points the light at the camera, casts the cursor
//!    ray and updates the highlight
//! 2. the caller renders the scene
//! 3. [`Viewer::end_frame`] spins the model if nothing was hit
//!
//! The per-frame state machine is `Idle -> (hit) -> Highlighted -> (miss) -> Idle`.

pub mod cursor;
pub mod popup;

use cgmath::{Point3, Rad};
use log::{debug, error, info};
use winit::dpi::PhysicalPosition;

use crate::{
    camera::{Camera, Projection},
    config::ViewerConfig,
    data_structures::scene_graph::{NodeId, SceneGraph},
    pick::{Hit, PickParams, Ray, pick},
    resources::LoadedModel,
};

use self::{
    cursor::{Cursor, SurfaceRect, to_ndc},
    popup::Popup,
};

/// White light shining from its position towards the origin.
#[derive(Clone, Debug, PartialEq)]
pub struct DirectionalLight {
    pub position: Point3<f32>,
    pub color: [f32; 3],
    pub intensity: f32,
}

/// What happened during [`Viewer::begin_frame`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameOutcome {
    /// No model has been installed yet.
    NoModel,
    Hit(Hit),
    Miss,
}

#[derive(Debug)]
pub struct Viewer {
    graph: SceneGraph,
    model: Option<NodeId>,
    collectibles: Vec<NodeId>,
    cursor: Option<Cursor>,
    selected: Option<NodeId>,
    popup_visible: bool,
    model_angle: f32,
    light: DirectionalLight,
    pick_params: PickParams,
    rotation_step: f32,
    point_cloud: bool,
    model_offset: cgmath::Vector3<f32>,
}

impl Viewer {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            graph: SceneGraph::new(),
            model: None,
            collectibles: Vec::new(),
            cursor: None,
            selected: None,
            popup_visible: false,
            model_angle: 0.0,
            light: DirectionalLight {
                position: config.camera_eye,
                color: config.light_colour,
                intensity: config.light_intensity,
            },
            pick_params: PickParams {
                points_threshold: config.points_threshold,
            },
            rotation_step: config.rotation_step,
            point_cloud: config.point_cloud,
            model_offset: config.model_offset,
        }
    }

    /// Applies the result of the asynchronous model load.
    ///
    /// A failed load is logged and the viewer keeps running without a model.
    pub fn on_model_loaded(&mut self, result: anyhow::Result<LoadedModel>) {
        match result {
            Ok(model) => {
                if let Err(e) = self.install_model(model) {
                    error!("Could not install the model: {:#}", e);
                }
            }
            Err(e) => error!("Failed to load model: {:#}", e),
        }
    }

    /// Takes over a loaded model, swaps its meshes for point clouds and attaches it.
    ///
    /// The collectible set is fixed here: the created point clouds, or every
    /// mesh below the root when point clouds are disabled.
    pub fn install_model(&mut self, model: LoadedModel) -> anyhow::Result<()> {
        let LoadedModel { mut graph, root } = model;
        let collectibles = if self.point_cloud {
            graph.convert_meshes_to_points(root)
        } else {
            graph
                .traverse(root)
                .into_iter()
                .filter(|id| graph.get(*id).is_some_and(|node| node.kind.is_mesh()))
                .collect()
        };

        if let Some(node) = graph.get_mut(root) {
            node.local.position = self.model_offset;
        }
        graph.attach_root(root)?;
        info!(
            "Model ready: {} nodes, {} collectible",
            graph.traverse(root).len(),
            collectibles.len()
        );

        self.graph = graph;
        self.model = Some(root);
        self.collectibles = collectibles;
        self.selected = None;
        self.popup_visible = false;
        self.model_angle = 0.0;
        Ok(())
    }

    /// Records the cursor position. Nothing changes for a surface without area.
    pub fn on_cursor_moved(&mut self, pixel: PhysicalPosition<f64>, rect: &SurfaceRect) {
        if let Some(ndc) = to_ndc(pixel, rect) {
            self.cursor = Some(Cursor { ndc, pixel });
        }
    }

    /// First half of a frame: light, picking and highlight.
    pub fn begin_frame(&mut self, camera: &Camera, projection: &Projection) -> FrameOutcome {
        self.light.position = camera.eye();

        let Some(root) = self.model else {
            return FrameOutcome::NoModel;
        };
        self.graph.set_emissive_subtree(root, 0.0);

        let hit = self
            .cursor
            .and_then(|cursor| Ray::from_camera(cursor.ndc, camera, projection))
            .and_then(|ray| pick(&self.graph, &self.collectibles, &ray, &self.pick_params));

        match hit {
            Some(hit) => {
                self.graph.set_emissive_subtree(hit.node, 1.0);
                if self.selected != Some(hit.node) {
                    debug!("Hovering {:?} at distance {:.3}", hit.node, hit.distance);
                }
                self.selected = Some(hit.node);
                self.popup_visible = true;
                FrameOutcome::Hit(hit)
            }
            None => {
                self.selected = None;
                self.popup_visible = false;
                FrameOutcome::Miss
            }
        }
    }

    /// Second half of a frame: spin the model unless something is hovered.
    pub fn end_frame(&mut self, outcome: FrameOutcome) {
        if outcome != FrameOutcome::Miss {
            return;
        }
        let Some(root) = self.model else {
            return;
        };
        if let Some(node) = self.graph.get_mut(root) {
            node.local.rotate_y(Rad(self.rotation_step));
            self.model_angle += self.rotation_step;
        }
    }

    /// Runs both halves of a frame without rendering in between.
    pub fn frame(&mut self, camera: &Camera, projection: &Projection) -> FrameOutcome {
        let outcome = self.begin_frame(camera, projection);
        self.end_frame(outcome);
        outcome
    }

    pub fn popup(&self) -> Option<Popup> {
        if !self.popup_visible {
            return None;
        }
        let node = self.graph.get(self.selected?)?;
        let cursor = self.cursor?;
        Some(Popup::at_cursor(cursor.pixel, &node.name))
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn model(&self) -> Option<NodeId> {
        self.model
    }

    pub fn collectibles(&self) -> &[NodeId] {
        &self.collectibles
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.cursor
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Accumulated Y rotation of the model in radians.
    pub fn model_angle(&self) -> f32 {
        self.model_angle
    }

    pub fn light(&self) -> &DirectionalLight {
        &self.light
    }
}
