#![allow(dead_code)]

use hover_view::{
    camera::{Camera, Projection},
    viewer::cursor::SurfaceRect,
};

/// Builds small binary glTF files in memory.
#[derive(Default)]
pub struct GlbBuilder {
    bin: Vec<u8>,
    views: Vec<String>,
    accessors: Vec<String>,
    meshes: Vec<String>,
    nodes: Vec<String>,
    scene: Vec<usize>,
}

impl GlbBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_positions(&mut self, positions: &[[f32; 3]]) -> usize {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        let offset = self.bin.len();
        for p in positions {
            for c in p {
                self.bin.extend_from_slice(&c.to_le_bytes());
            }
        }
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for p in positions {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }
        self.views.push(format!(
            r#"{{"buffer":0,"byteOffset":{},"byteLength":{}}}"#,
            offset,
            positions.len() * 12
        ));
        self.accessors.push(format!(
            r#"{{"bufferView":{},"componentType":5126,"count":{},"type":"VEC3","min":{:?},"max":{:?}}}"#,
            self.views.len() - 1,
            positions.len(),
            min,
            max
        ));
        self.accessors.len() - 1
    }

    /// Adds a mesh with one non-indexed triangle list primitive per entry.
    pub fn mesh(&mut self, name: &str, primitives: &[&[[f32; 3]]]) -> usize {
        let primitives: Vec<String> = primitives
            .iter()
            .map(|positions| {
                let accessor = self.push_positions(positions);
                format!(r#"{{"attributes":{{"POSITION":{}}}}}"#, accessor)
            })
            .collect();
        self.meshes.push(format!(
            r#"{{"name":"{}","primitives":[{}]}}"#,
            name,
            primitives.join(",")
        ));
        self.meshes.len() - 1
    }

    pub fn node(
        &mut self,
        name: Option<&str>,
        mesh: Option<usize>,
        translation: [f32; 3],
        children: &[usize],
    ) -> usize {
        let mut fields = vec![format!(r#""translation":{:?}"#, translation)];
        if let Some(name) = name {
            fields.push(format!(r#""name":"{}""#, name));
        }
        if let Some(mesh) = mesh {
            fields.push(format!(r#""mesh":{}"#, mesh));
        }
        if !children.is_empty() {
            fields.push(format!(r#""children":{:?}"#, children));
        }
        self.nodes.push(format!("{{{}}}", fields.join(",")));
        self.nodes.len() - 1
    }

    pub fn scene_roots(&mut self, roots: &[usize]) -> &mut Self {
        self.scene = roots.to_vec();
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut bin = self.bin.clone();
        while bin.len() % 4 != 0 {
            bin.push(0);
        }
        let mut json = format!(
            r#"{{"asset":{{"version":"2.0"}},"scene":0,"scenes":[{{"nodes":{:?}}}],"nodes":[{}],"meshes":[{}],"accessors":[{}],"bufferViews":[{}],"buffers":[{{"byteLength":{}}}]}}"#,
            self.scene,
            self.nodes.join(","),
            self.meshes.join(","),
            self.accessors.join(","),
            self.views.join(","),
            bin.len()
        )
        .into_bytes();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }

        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(b"JSON");
        out.extend_from_slice(&json);
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(b"BIN\0");
        out.extend_from_slice(&bin);
        out
    }
}

/// A unit triangle centred on the origin in the XY plane.
pub const TRIANGLE: [[f32; 3]; 3] = [[-0.5, -0.5, 0.0], [0.5, -0.5, 0.0], [0.0, 0.5, 0.0]];

/// The default view: eye at (0, 0, 4) looking at the origin through an 800x600 surface.
pub fn default_view() -> (Camera, Projection, SurfaceRect) {
    (
        Camera::looking_at((0.0, 0.0, 4.0), (0.0, 0.0, 0.0)),
        Projection::new(800, 600, cgmath::Deg(75.0), 0.1, 1000.0),
        SurfaceRect::from_size(800, 600),
    )
}
