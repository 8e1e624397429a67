//! Hover picking by ray casting on the CPU.
//!
//! A ray is shot from the camera eye through the cursor and tested against the
//! collectible nodes of the scene graph:
//!
//! 1. Build a [`Ray`] from the cursor's normalized device coordinates
//! 2. Reject nodes whose world space bounding sphere the ray misses
//! 3. Test the node's geometry: points within a threshold of the ray, or triangles
//! 4. Keep the nearest [`Hit`]; on equal distances the earlier collectible wins
//!
//! Everything runs in world space so scaled and rotated parents are handled by
//! transforming the geometry instead of the ray.

use cgmath::{EuclideanSpace, InnerSpace, MetricSpace, Point3, SquareMatrix, Transform, Vector3, Vector4};

use crate::{
    camera::{Camera, Projection},
    data_structures::{
        geometry::{BoundingSphere, Geometry},
        scene_graph::{NodeId, NodeKind, SceneGraph},
    },
};

const EPSILON: f32 = 1e-7;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    /// Always normalized.
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Ray from the camera eye through the point at `ndc` on the screen.
    ///
    /// Returns `None` when the view projection cannot be inverted.
    pub fn from_camera(ndc: (f32, f32), camera: &Camera, projection: &Projection) -> Option<Self> {
        let view_proj = projection.calc_gl_matrix() * camera.calc_matrix();
        let inverse = view_proj.invert()?;
        let clip = inverse * Vector4::new(ndc.0, ndc.1, 0.5, 1.0);
        if clip.w.abs() <= f32::EPSILON {
            return None;
        }
        let target = Point3::from_vec(clip.truncate() / clip.w);
        let eye = camera.eye();
        let direction = target - eye;
        if direction.magnitude2() <= f32::EPSILON {
            return None;
        }
        Some(Self::new(eye, direction))
    }

    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }

    /// Parameter of the point on the ray closest to `point`. Negative values lie behind the origin.
    pub fn closest_t(&self, point: Point3<f32>) -> f32 {
        (point - self.origin).dot(self.direction)
    }

    /// Squared distance between `point` and the ray, which starts at its origin.
    pub fn distance2_to_point(&self, point: Point3<f32>) -> f32 {
        let t = self.closest_t(point);
        if t < 0.0 {
            return self.origin.distance2(point);
        }
        self.at(t).distance2(point)
    }

    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.distance2_to_point(sphere.center) <= sphere.radius * sphere.radius
    }

    /// Möller-Trumbore intersection. Both faces of the triangle count.
    pub fn intersect_triangle(&self, a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) -> Option<f32> {
        let edge1 = b - a;
        let edge2 = c - a;
        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);
        if det.abs() < EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = edge2.dot(q) * inv_det;
        (t >= 0.0).then_some(t)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub node: NodeId,
    /// Distance from the ray origin to `point`.
    pub distance: f32,
    pub point: Point3<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickParams {
    pub points_threshold: f32,
}

impl Default for PickParams {
    fn default() -> Self {
        Self {
            points_threshold: 1.0,
        }
    }
}

/// Finds the nearest collectible hit by `ray`.
///
/// Collectibles that are no longer part of the attached scene, and nodes
/// without geometry, are skipped.
pub fn pick(
    graph: &SceneGraph,
    collectibles: &[NodeId],
    ray: &Ray,
    params: &PickParams,
) -> Option<Hit> {
    let mut nearest: Option<Hit> = None;
    for &id in collectibles {
        if !graph.is_in_scene(id) {
            continue;
        }
        let Some(node) = graph.get(id) else {
            continue;
        };
        let hit = match &node.kind {
            NodeKind::Points(geometry) => intersect_points(graph, id, geometry, ray, params),
            NodeKind::Mesh(geometry) => intersect_mesh(graph, id, geometry, ray),
            _ => None,
        };
        let Some((distance, point)) = hit else {
            continue;
        };
        if nearest.is_none_or(|best| distance < best.distance) {
            nearest = Some(Hit {
                node: id,
                distance,
                point,
            });
        }
    }
    nearest
}

fn world_bounds(graph: &SceneGraph, id: NodeId, geometry: &Geometry) -> (cgmath::Matrix4<f32>, BoundingSphere) {
    let world = graph.world_transform(id);
    let matrix = world.to_matrix();
    let sphere = BoundingSphere {
        center: matrix.transform_point(geometry.bounds.center),
        radius: geometry.bounds.radius * world.max_scale(),
    };
    (matrix, sphere)
}

fn intersect_points(
    graph: &SceneGraph,
    id: NodeId,
    geometry: &Geometry,
    ray: &Ray,
    params: &PickParams,
) -> Option<(f32, Point3<f32>)> {
    let (matrix, mut sphere) = world_bounds(graph, id, geometry);
    sphere.radius += params.points_threshold;
    if !ray.intersects_sphere(&sphere) {
        return None;
    }
    let threshold2 = params.points_threshold * params.points_threshold;
    let mut nearest: Option<(f32, Point3<f32>)> = None;
    for position in &geometry.positions {
        let point = matrix.transform_point(Point3::from(*position));
        let t = ray.closest_t(point);
        if t < 0.0 || ray.at(t).distance2(point) >= threshold2 {
            continue;
        }
        if nearest.is_none_or(|(best, _)| t < best) {
            nearest = Some((t, ray.at(t)));
        }
    }
    nearest
}

fn intersect_mesh(
    graph: &SceneGraph,
    id: NodeId,
    geometry: &Geometry,
    ray: &Ray,
) -> Option<(f32, Point3<f32>)> {
    let (matrix, sphere) = world_bounds(graph, id, geometry);
    if !ray.intersects_sphere(&sphere) {
        return None;
    }
    geometry
        .triangles()
        .filter_map(|[a, b, c]| {
            ray.intersect_triangle(
                matrix.transform_point(Point3::from(a)),
                matrix.transform_point(Point3::from(b)),
                matrix.transform_point(Point3::from(c)),
            )
        })
        .min_by(|a, b| a.total_cmp(b))
        .map(|t| (t, ray.at(t)))
}
