//! Runtime configuration of the viewer.
//!
//! There are no config files or command line flags. [`ViewerConfig::default`]
//! describes the shipped viewer and tests tweak individual fields.

use std::path::{Path, PathBuf};

use cgmath::{Deg, Point3, Vector3};

#[derive(Clone, Debug)]
pub struct ViewerConfig {
    /// Path of the packaged model, relative to the working directory.
    pub asset: PathBuf,
    pub title: String,
    /// Logical window size at creation.
    pub window_size: (u32, u32),
    pub clear_colour: wgpu::Color,

    pub camera_eye: Point3<f32>,
    pub camera_target: Point3<f32>,
    pub fovy: Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub rotate_speed: f32,
    /// Distance factor applied per wheel line.
    pub zoom_speed: f32,
    pub pan_speed: f32,

    pub light_colour: [f32; 3],
    pub light_intensity: f32,

    /// Replace meshes with point clouds after loading.
    pub point_cloud: bool,
    pub point_size: f32,
    pub point_colour: [f32; 4],
    pub emissive_colour: [f32; 4],

    /// Y rotation applied to the model on every frame without a hit, in radians.
    pub rotation_step: f32,
    /// Maximum distance between a point and the ray for the point to count as hit.
    pub points_threshold: f32,
    pub model_offset: Vector3<f32>,

    /// Popup box size in physical pixels.
    pub popup_size: (f32, f32),
    pub popup_colour: [f32; 4],
}

impl ViewerConfig {
    /// The model path to load.
    ///
    /// A relative `asset` that does not exist below the working directory is
    /// looked up in the copy of `assets/` made at build time.
    pub fn asset_path(&self) -> PathBuf {
        if self.asset.is_absolute() || self.asset.exists() {
            return self.asset.clone();
        }
        let packaged = Path::new(env!("HOVER_VIEW_ASSET_DIR"));
        match self.asset.strip_prefix("assets") {
            Ok(rest) => packaged.join(rest),
            Err(_) => packaged.join(&self.asset),
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            asset: PathBuf::from("assets").join("tractor.glb"),
            title: "hover-view".to_string(),
            window_size: (800, 600),
            // gainsboro
            clear_colour: wgpu::Color {
                r: 0.716,
                g: 0.716,
                b: 0.716,
                a: 1.0,
            },
            camera_eye: Point3::new(0.0, 0.0, 4.0),
            camera_target: Point3::new(0.0, 0.0, 0.0),
            fovy: Deg(75.0),
            znear: 0.1,
            zfar: 1000.0,
            rotate_speed: 0.005,
            zoom_speed: 0.95,
            pan_speed: 0.001,
            light_colour: [1.0, 1.0, 1.0],
            light_intensity: 1.0,
            point_cloud: true,
            point_size: 0.05,
            point_colour: [0.0, 1.0, 0.0, 1.0],
            // crimson in linear space
            emissive_colour: [0.716, 0.0, 0.047, 1.0],
            rotation_step: 0.01,
            points_threshold: 1.0,
            model_offset: Vector3::new(0.0, 0.0, -1.0),
            popup_size: (180.0, 28.0),
            popup_colour: [1.0, 1.0, 1.0, 0.9],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_relative_assets_fall_back_to_the_packaged_copy() {
        let config = ViewerConfig {
            asset: PathBuf::from("assets").join("does-not-exist.glb"),
            ..Default::default()
        };
        let resolved = config.asset_path();
        assert!(resolved.starts_with(env!("HOVER_VIEW_ASSET_DIR")));
        assert!(resolved.ends_with("does-not-exist.glb"));
    }
}
