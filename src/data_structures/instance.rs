//! Local transformation data for scene nodes.
//!
//! Every node in the scene graph carries an [`Instance`] describing its
//! position, rotation and scale relative to its parent. World transforms are
//! obtained by composing instances from the root downwards with `*`.

use std::ops::Mul;

use cgmath::{One, Rotation3};

/// Per-node transformation: position, rotation (as quaternion), and scale.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Create a new instance with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Build an instance from a glTF style decomposition.
    ///
    /// glTF stores rotations as `[x, y, z, w]` while cgmath expects the scalar first.
    pub fn from_decomposed(translation: [f32; 3], rotation: [f32; 4], scale: [f32; 3]) -> Self {
        Self {
            position: translation.into(),
            rotation: cgmath::Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
            scale: scale.into(),
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Rotate around the local Y axis, like `Object3D.rotateY` would.
    pub fn rotate_y(&mut self, angle: cgmath::Rad<f32>) {
        self.rotation = self.rotation * cgmath::Quaternion::from_angle_y(angle);
    }

    /// Largest scale factor on any axis. Used to grow bounding volumes.
    pub fn max_scale(&self) -> f32 {
        self.scale.x.abs().max(self.scale.y.abs()).max(self.scale.z.abs())
    }

    /// Compares two instances after rounding every component to `decimals` places.
    ///
    /// Quaternions `q` and `-q` describe the same rotation and are treated as equal.
    pub fn approx_eq(&self, other: &Instance, decimals: i32) -> bool {
        let factor = 10f32.powi(decimals);
        let round = |v: f32| (v * factor).round() / factor;
        let vec_eq = |a: cgmath::Vector3<f32>, b: cgmath::Vector3<f32>| {
            round(a.x) == round(b.x) && round(a.y) == round(b.y) && round(a.z) == round(b.z)
        };
        let quat_eq = |a: cgmath::Quaternion<f32>, b: cgmath::Quaternion<f32>| {
            round(a.s) == round(b.s)
                && round(a.v.x) == round(b.v.x)
                && round(a.v.y) == round(b.v.y)
                && round(a.v.z) == round(b.v.z)
        };
        vec_eq(self.position, other.position)
            && vec_eq(self.scale, other.scale)
            && (quat_eq(self.rotation, other.rotation) || quat_eq(self.rotation, -other.rotation))
    }
}

impl Mul<Instance> for Instance {
    type Output = Self;

    fn mul(self, rhs: Instance) -> Self::Output {
        &self * &rhs
    }
}

impl<'a, 'b> Mul<&'b Instance> for &'a Instance {
    type Output = Instance;

    fn mul(self, rhs: &'b Instance) -> Self::Output {
        let new_rotation = self.rotation * rhs.rotation;

        let new_scale = cgmath::Vector3::new(
            self.scale.x * rhs.scale.x,
            self.scale.y * rhs.scale.y,
            self.scale.z * rhs.scale.z,
        );
        let scaled_rhs_pos = cgmath::Vector3::new(
            self.scale.x * rhs.position.x,
            self.scale.y * rhs.position.y,
            self.scale.z * rhs.position.z,
        );
        let new_position = self.position + (self.rotation * scaled_rhs_pos);

        Instance {
            position: new_position,
            rotation: new_rotation,
            scale: new_scale,
        }
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Deg, InnerSpace, Vector3};

    use super::*;

    #[test]
    fn composition_applies_parent_scale_and_rotation_to_child_offset() {
        let parent = Instance {
            position: Vector3::new(1.0, 0.0, 0.0),
            rotation: cgmath::Quaternion::from_angle_y(Deg(90.0)),
            scale: Vector3::new(2.0, 2.0, 2.0),
        };
        let child: Instance = Vector3::new(1.0, 0.0, 0.0).into();

        let world = &parent * &child;

        // (1,0,0) scaled to (2,0,0), rotated 90° around Y to (0,0,-2), then moved by the parent
        assert!((world.position - Vector3::new(1.0, 0.0, -2.0)).magnitude() < 1e-5);
        assert_eq!(world.scale, Vector3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn decomposed_rotation_keeps_scalar_last_convention() {
        let half = std::f32::consts::FRAC_1_SQRT_2;
        let instance = Instance::from_decomposed([0.0; 3], [0.0, half, 0.0, half], [1.0; 3]);
        let expected = cgmath::Quaternion::from_angle_y(Deg(90.0));
        assert!(instance.approx_eq(
            &Instance {
                rotation: expected,
                ..Instance::new()
            },
            3
        ));
    }

    #[test]
    fn rotate_y_accumulates() {
        let mut instance = Instance::new();
        instance.rotate_y(cgmath::Rad(0.25));
        instance.rotate_y(cgmath::Rad(0.25));
        let expected = Instance {
            rotation: cgmath::Quaternion::from_angle_y(cgmath::Rad(0.5)),
            ..Instance::new()
        };
        assert!(instance.approx_eq(&expected, 4));
    }
}
