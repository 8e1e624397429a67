use std::{
    fmt,
    path::{Path, PathBuf},
};

use anyhow::{Context, bail};
use tokio::io::AsyncReadExt;

use crate::data_structures::scene_graph::{NodeId, NodeKind, SceneGraph};
use crate::data_structures::instance::Instance;

/**
 * This module contains all logic for loading the packaged model from disk.
 */
pub mod scene;

const CHUNK_SIZE: usize = 64 * 1024;

/// How much of a file has been read so far.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: u64,
    /// `None` when the size could not be determined up front.
    pub total: Option<u64>,
}

impl LoadProgress {
    pub fn percent(&self) -> Option<f64> {
        match self.total {
            Some(0) => Some(100.0),
            Some(total) => Some(self.loaded as f64 / total as f64 * 100.0),
            None => None,
        }
    }
}

impl fmt::Display for LoadProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.percent() {
            Some(percent) => write!(f, "Progress: {:.2}%", percent),
            None => write!(f, "Progress: {} bytes loaded", self.loaded),
        }
    }
}

/// A parsed model: its own arena and the synthetic group holding the scene's top level nodes.
#[derive(Clone, Debug)]
pub struct LoadedModel {
    pub graph: SceneGraph,
    pub root: NodeId,
}

/// Reads a whole file in chunks, reporting progress after each chunk.
pub async fn load_binary<P>(path: &Path, mut progress: P) -> anyhow::Result<Vec<u8>>
where
    P: FnMut(LoadProgress),
{
    let mut file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Could not open {}", path.display()))?;
    let total = file.metadata().await.ok().map(|meta| meta.len());
    let mut data = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        let read = file
            .read(&mut chunk)
            .await
            .with_context(|| format!("Could not read {}", path.display()))?;
        if read == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..read]);
        progress(LoadProgress {
            loaded: data.len() as u64,
            total,
        });
    }
    Ok(data)
}

/// Loads a glTF file (binary or JSON) from disk into a fresh scene graph.
pub async fn load_model<P>(path: &Path, progress: P) -> anyhow::Result<LoadedModel>
where
    P: FnMut(LoadProgress),
{
    let bytes = load_binary(path, progress).await?;
    load_model_from_bytes(&bytes, path.parent())
        .with_context(|| format!("Could not load model {}", path.display()))
}

/// Parses glTF data already in memory.
///
/// External buffers are resolved relative to `base_dir`. Only the default
/// scene (or the first one) is loaded.
pub fn load_model_from_bytes(bytes: &[u8], base_dir: Option<&Path>) -> anyhow::Result<LoadedModel> {
    let gltf = gltf::Gltf::from_slice(bytes).context("Invalid glTF data")?;

    // Load buffers
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => match gltf.blob.as_deref() {
                Some(blob) => buffer_data.push(blob.to_vec()),
                None => bail!("Buffer {} refers to a missing BIN chunk", buffer.index()),
            },
            gltf::buffer::Source::Uri(uri) => {
                if uri.starts_with("data:") {
                    bail!("Embedded data URIs are not supported (buffer {})", buffer.index());
                }
                let path = base_dir.map_or_else(|| PathBuf::from(uri), |dir| dir.join(uri));
                let bin = std::fs::read(&path)
                    .with_context(|| format!("Could not read buffer {}", path.display()))?;
                buffer_data.push(bin);
            }
        }
    }

    let Some(scene) = gltf.default_scene().or_else(|| gltf.scenes().next()) else {
        bail!("The glTF file contains no scene");
    };

    let mut graph = SceneGraph::new();
    let root = graph.insert("Scene", NodeKind::Group, Instance::new());
    for node in scene.nodes() {
        let child = scene::to_scene_node(&mut graph, node, &buffer_data)?;
        graph.add_child(root, child)?;
    }
    log::debug!("Loaded scene with {} nodes", graph.len());

    Ok(LoadedModel { graph, root })
}
