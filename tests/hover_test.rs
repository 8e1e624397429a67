use hover_view::{
    ViewerConfig,
    resources::{LoadedModel, load_model_from_bytes},
    viewer::{FrameOutcome, Viewer},
};
use winit::dpi::PhysicalPosition;

use crate::common::test_utils::{GlbBuilder, TRIANGLE, default_view};

mod common;

const CENTRE: PhysicalPosition<f64> = PhysicalPosition::new(400.0, 300.0);
const CORNER: PhysicalPosition<f64> = PhysicalPosition::new(0.0, 0.0);

/// `front` sits one unit in front of `back` on the view axis once the model is
/// moved back by the default offset. `front` has a child off to the side and
/// `side` is a sibling off to the other side.
fn stacked_model() -> LoadedModel {
    let mut glb = GlbBuilder::new();
    let mesh = glb.mesh("tri", &[&TRIANGLE]);
    let trim = glb.node(Some("trim"), Some(mesh), [3.0, 0.0, 0.0], &[]);
    let front = glb.node(Some("front"), Some(mesh), [0.0, 0.0, 1.0], &[trim]);
    let back = glb.node(Some("back"), Some(mesh), [0.0, 0.0, -2.0], &[]);
    let side = glb.node(Some("side"), Some(mesh), [-3.0, 0.0, 1.0], &[]);
    glb.scene_roots(&[back, front, side]);
    load_model_from_bytes(&glb.build(), None).unwrap()
}

fn viewer_with(model: LoadedModel) -> Viewer {
    let mut viewer = Viewer::new(&ViewerConfig::default());
    viewer.install_model(model).unwrap();
    viewer
}

fn emissive(viewer: &Viewer, name: &str) -> f32 {
    let graph = viewer.graph();
    graph.get(graph.find_by_name(name).unwrap()).unwrap().emissive
}

#[test]
fn meshes_are_replaced_by_point_clouds_with_the_same_transform() {
    let model = stacked_model();
    let before: Vec<_> = ["front", "back", "trim", "side"]
        .iter()
        .map(|name| model.graph.world_transform(model.graph.find_by_name(name).unwrap()))
        .collect();

    let viewer = viewer_with(model);
    let graph = viewer.graph();
    let root = viewer.model().unwrap();
    assert!(
        graph
            .traverse(root)
            .iter()
            .all(|id| !graph.get(*id).unwrap().kind.is_mesh())
    );
    assert_eq!(viewer.collectibles().len(), 4);

    for (name, expected) in ["front", "back", "trim", "side"].iter().zip(before) {
        let id = graph.find_by_name(&format!("{}_points", name)).unwrap();
        assert!(graph.get(id).unwrap().kind.is_points());
        // the model offset moves everything back by one unit
        let mut shifted = expected;
        shifted.position.z -= 1.0;
        assert!(graph.world_transform(id).approx_eq(&shifted, 3), "{} moved", name);
    }
    let trim = graph.find_by_name("trim_points").unwrap();
    assert_eq!(graph.parent(trim), graph.find_by_name("front_points"));
}

#[test]
fn nearest_object_wins() {
    let mut viewer = viewer_with(stacked_model());
    let (camera, projection, rect) = default_view();
    viewer.on_cursor_moved(CENTRE, &rect);

    let FrameOutcome::Hit(hit) = viewer.frame(&camera, &projection) else {
        panic!("expected a hit");
    };
    let graph = viewer.graph();
    assert_eq!(Some(hit.node), graph.find_by_name("front_points"));
    assert!((hit.distance - 4.0).abs() < 0.01, "distance {}", hit.distance);
}

#[test]
fn only_the_hovered_subtree_glows() {
    let mut viewer = viewer_with(stacked_model());
    let (camera, projection, rect) = default_view();
    viewer.on_cursor_moved(CENTRE, &rect);
    viewer.frame(&camera, &projection);

    assert_eq!(emissive(&viewer, "front_points"), 1.0);
    assert_eq!(emissive(&viewer, "trim_points"), 1.0);
    assert_eq!(emissive(&viewer, "back_points"), 0.0);
    assert_eq!(emissive(&viewer, "side_points"), 0.0);
    assert_eq!(emissive(&viewer, "Scene"), 0.0);
}

#[test]
fn hover_cycle_stops_and_resumes_the_spin() {
    let mut viewer = viewer_with(stacked_model());
    let (camera, projection, rect) = default_view();

    // nothing under the cursor yet
    assert_eq!(viewer.frame(&camera, &projection), FrameOutcome::Miss);
    assert_eq!(viewer.frame(&camera, &projection), FrameOutcome::Miss);
    assert!((viewer.model_angle() - 0.02).abs() < 1e-6);

    viewer.on_cursor_moved(CENTRE, &rect);
    for _ in 0..3 {
        assert!(matches!(viewer.frame(&camera, &projection), FrameOutcome::Hit(_)));
    }
    assert!((viewer.model_angle() - 0.02).abs() < 1e-6);
    let popup = viewer.popup().unwrap();
    assert_eq!(popup.label, "Name: front_points");
    assert_eq!((popup.left, popup.top), (401.0, 301.0));

    viewer.on_cursor_moved(CORNER, &rect);
    assert_eq!(viewer.frame(&camera, &projection), FrameOutcome::Miss);
    assert!((viewer.model_angle() - 0.03).abs() < 1e-6);
    assert!(viewer.popup().is_none());
    assert_eq!(viewer.selected(), None);
    for name in ["front_points", "trim_points", "back_points", "side_points"] {
        assert_eq!(emissive(&viewer, name), 0.0, "{} still glows", name);
    }
}

#[test]
fn the_light_follows_the_camera() {
    let mut viewer = viewer_with(stacked_model());
    let (mut camera, projection, _) = default_view();
    camera.yaw = cgmath::Rad(1.0);
    viewer.frame(&camera, &projection);
    assert_eq!(viewer.light().position, camera.eye());
}

#[test]
fn meshes_stay_pickable_without_point_clouds() {
    let config = ViewerConfig {
        point_cloud: false,
        ..Default::default()
    };
    let mut viewer = Viewer::new(&config);
    viewer.install_model(stacked_model()).unwrap();
    let (camera, projection, rect) = default_view();
    viewer.on_cursor_moved(CENTRE, &rect);

    let FrameOutcome::Hit(hit) = viewer.frame(&camera, &projection) else {
        panic!("expected a hit");
    };
    assert_eq!(Some(hit.node), viewer.graph().find_by_name("front"));
    assert_eq!(viewer.popup().unwrap().label, "Name: front");
}

#[tokio::test]
async fn hovering_the_packaged_tractor() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("assets")
        .join("tractor.glb");
    let model = hover_view::resources::load_model(&path, |_| {}).await.unwrap();
    let mut viewer = viewer_with(model);
    assert_eq!(viewer.collectibles().len(), 7);

    let (camera, projection, rect) = default_view();
    viewer.on_cursor_moved(CENTRE, &rect);
    assert!(matches!(viewer.frame(&camera, &projection), FrameOutcome::Hit(_)));
    let popup = viewer.popup().unwrap();
    assert!(popup.label.starts_with("Name: "));
    assert!(popup.label.ends_with("_points"));
}
