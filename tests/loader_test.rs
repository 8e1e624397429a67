use std::path::Path;

use hover_view::{
    data_structures::scene_graph::NodeKind,
    resources::{LoadProgress, load_model, load_model_from_bytes},
};

use crate::common::test_utils::{GlbBuilder, TRIANGLE};

mod common;

#[test]
fn loads_nodes_under_a_synthetic_scene_root() {
    let mut glb = GlbBuilder::new();
    let body = glb.mesh("body", &[&TRIANGLE]);
    let wheels = glb.mesh("wheels", &[&TRIANGLE, &TRIANGLE]);
    let wheel_node = glb.node(Some("wheel_set"), Some(wheels), [0.0, -1.0, 0.0], &[]);
    let body_node = glb.node(Some("body"), Some(body), [0.0, 0.0, 1.0], &[wheel_node]);
    let empty = glb.node(None, None, [2.0, 0.0, 0.0], &[]);
    glb.scene_roots(&[body_node, empty]);

    let model = load_model_from_bytes(&glb.build(), None).unwrap();
    let graph = &model.graph;
    let root = graph.get(model.root).unwrap();
    assert_eq!(root.name, "Scene");
    assert!(matches!(root.kind, NodeKind::Group));
    assert_eq!(root.children().len(), 2);

    let body = graph.find_by_name("body").unwrap();
    assert!(graph.get(body).unwrap().kind.is_mesh());
    assert_eq!(graph.parent(body), Some(model.root));

    // several primitives turn into a group with one mesh per primitive
    let wheel_set = graph.find_by_name("wheel_set").unwrap();
    assert!(matches!(graph.get(wheel_set).unwrap().kind, NodeKind::Group));
    assert_eq!(graph.parent(wheel_set), Some(body));
    let parts: Vec<_> = graph
        .children(wheel_set)
        .iter()
        .map(|id| graph.get(*id).unwrap().name.clone())
        .collect();
    assert_eq!(parts, vec!["wheels_0", "wheels_1"]);

    assert!(graph.find_by_name("node_2").is_some());
    // nothing is attached until the viewer installs the model
    assert_eq!(graph.root(), None);
}

#[test]
fn world_transforms_follow_the_node_hierarchy() {
    let mut glb = GlbBuilder::new();
    let mesh = glb.mesh("part", &[&TRIANGLE]);
    let child = glb.node(Some("child"), Some(mesh), [1.0, 0.0, 0.0], &[]);
    let parent = glb.node(Some("parent"), None, [0.0, 2.0, 0.0], &[child]);
    glb.scene_roots(&[parent]);

    let model = load_model_from_bytes(&glb.build(), None).unwrap();
    let child = model.graph.find_by_name("child").unwrap();
    let world = model.graph.world_transform(child);
    assert_eq!(world.position, cgmath::Vector3::new(1.0, 2.0, 0.0));
}

#[tokio::test]
async fn load_model_reports_progress_until_complete() {
    let mut glb = GlbBuilder::new();
    let mesh = glb.mesh("body", &[&TRIANGLE]);
    let node = glb.node(Some("body"), Some(mesh), [0.0; 3], &[]);
    glb.scene_roots(&[node]);
    let bytes = glb.build();

    let path = std::env::temp_dir().join(format!("hover-view-{}.glb", std::process::id()));
    tokio::fs::write(&path, &bytes).await.unwrap();

    let mut reports: Vec<LoadProgress> = Vec::new();
    let model = load_model(&path, |progress| reports.push(progress)).await;
    tokio::fs::remove_file(&path).await.unwrap();

    let model = model.unwrap();
    assert!(model.graph.find_by_name("body").is_some());
    let last = reports.last().unwrap();
    assert_eq!(last.loaded, bytes.len() as u64);
    assert_eq!(last.percent(), Some(100.0));
    assert!(reports.windows(2).all(|w| w[0].loaded < w[1].loaded));
}

#[tokio::test]
async fn missing_files_fail_to_load() {
    let result = load_model(Path::new("does/not/exist.glb"), |_| {}).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn packaged_tractor_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets").join("tractor.glb");
    let model = load_model(&path, |_| {}).await.unwrap();
    for name in ["Tractor", "body", "cabin", "exhaust", "wheel_rear_left", "wheel_front_right"] {
        assert!(model.graph.find_by_name(name).is_some(), "{} is missing", name);
    }
    let cabin = model.graph.find_by_name("cabin").unwrap();
    let body = model.graph.find_by_name("body").unwrap();
    assert_eq!(model.graph.parent(cabin), Some(body));
}
