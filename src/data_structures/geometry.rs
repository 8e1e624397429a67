//! CPU-side geometry shared between mesh nodes and their point-cloud replacements.

use cgmath::{EuclideanSpace, InnerSpace, MetricSpace, Point3};

/// Sphere enclosing every vertex of a [`Geometry`], in the geometry's local space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingSphere {
    pub center: Point3<f32>,
    pub radius: f32,
}

impl BoundingSphere {
    /// Centre of the axis aligned bounds and the largest distance to it.
    pub fn from_points(points: &[[f32; 3]]) -> Self {
        if points.is_empty() {
            return Self {
                center: Point3::origin(),
                radius: 0.0,
            };
        }
        let mut min = Point3::from(points[0]);
        let mut max = min;
        for p in points {
            min.x = min.x.min(p[0]);
            min.y = min.y.min(p[1]);
            min.z = min.z.min(p[2]);
            max.x = max.x.max(p[0]);
            max.y = max.y.max(p[1]);
            max.z = max.z.max(p[2]);
        }
        let center = min.midpoint(max);
        let radius = points
            .iter()
            .map(|p| center.distance2(Point3::from(*p)))
            .fold(0.0f32, f32::max)
            .sqrt();
        Self { center, radius }
    }
}

/// Vertex data of one glTF primitive.
#[derive(Clone, Debug)]
pub struct Geometry {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// Triangle list indices. `None` means every three positions form a triangle.
    pub indices: Option<Vec<u32>>,
    /// Linear RGBA base colour taken from the primitive's material.
    pub color: [f32; 4],
    pub bounds: BoundingSphere,
}

impl Geometry {
    pub fn new(
        name: impl Into<String>,
        positions: Vec<[f32; 3]>,
        normals: Vec<[f32; 3]>,
        indices: Option<Vec<u32>>,
        color: [f32; 4],
    ) -> Self {
        let bounds = BoundingSphere::from_points(&positions);
        let normals = if normals.len() == positions.len() {
            normals
        } else {
            flat_normals(&positions, indices.as_deref())
        };
        Self {
            name: name.into(),
            positions,
            normals,
            indices,
            color,
            bounds,
        }
    }

    /// Iterates over the triangles as position triples, skipping out of range indices.
    pub fn triangles(&self) -> impl Iterator<Item = [[f32; 3]; 3]> + '_ {
        let count = match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.positions.len() / 3,
        };
        (0..count).filter_map(move |t| {
            let idx = |corner: usize| match &self.indices {
                Some(indices) => indices[t * 3 + corner] as usize,
                None => t * 3 + corner,
            };
            Some([
                *self.positions.get(idx(0))?,
                *self.positions.get(idx(1))?,
                *self.positions.get(idx(2))?,
            ])
        })
    }

    /// Index list suitable for an index buffer, synthesised when the primitive had none.
    pub fn triangle_indices(&self) -> Vec<u32> {
        match &self.indices {
            Some(indices) => indices.clone(),
            None => (0..self.positions.len() as u32).collect(),
        }
    }
}

/// Per vertex normals averaged from the faces touching each vertex.
fn flat_normals(positions: &[[f32; 3]], indices: Option<&[u32]>) -> Vec<[f32; 3]> {
    let mut normals = vec![cgmath::Vector3::new(0.0f32, 0.0, 0.0); positions.len()];
    let triangle_count = indices.map_or(positions.len() / 3, |i| i.len() / 3);
    for t in 0..triangle_count {
        let corners = match indices {
            Some(i) => [i[t * 3] as usize, i[t * 3 + 1] as usize, i[t * 3 + 2] as usize],
            None => [t * 3, t * 3 + 1, t * 3 + 2],
        };
        if corners.iter().any(|&c| c >= positions.len()) {
            continue;
        }
        let [a, b, c] = corners.map(|c| cgmath::Vector3::from(positions[c]));
        let face = (b - a).cross(c - a);
        for corner in corners {
            normals[corner] += face;
        }
    }
    normals
        .into_iter()
        .map(|n| {
            if n.magnitude2() > 0.0 {
                n.normalize().into()
            } else {
                [0.0, 1.0, 0.0]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_sphere_encloses_all_points() {
        let points = [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
        let sphere = BoundingSphere::from_points(&points);
        assert_eq!(sphere.center, Point3::new(1.0, 1.0, 0.0));
        for p in points {
            assert!(sphere.center.distance(Point3::from(p)) <= sphere.radius + 1e-6);
        }
    }

    #[test]
    fn missing_normals_are_derived_from_faces() {
        let geometry = Geometry::new(
            "tri",
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            Vec::new(),
            None,
            [1.0; 4],
        );
        assert_eq!(geometry.normals, vec![[0.0, 0.0, 1.0]; 3]);
        assert_eq!(geometry.triangles().count(), 1);
        assert_eq!(geometry.triangle_indices(), vec![0, 1, 2]);
    }
}
