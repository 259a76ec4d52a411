#![allow(dead_code, clippy::unwrap_used)]

use floorkit::math::Point2;
use floorkit::{NodeId, Scene, WallId};

pub fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .try_init();
}

pub fn p(x: f64, y: f64) -> Point2 {
    Point2::new(x, y)
}

/// Closed loop of walls through `corners` in the given order.
pub fn closed_loop(
    scene: &mut Scene,
    corners: &[(f64, f64)],
    thickness: f64,
) -> (Vec<NodeId>, Vec<WallId>) {
    let nodes: Vec<NodeId> = corners
        .iter()
        .map(|&(x, y)| scene.add_node(p(x, y)))
        .collect();
    let walls = (0..nodes.len())
        .map(|i| {
            scene
                .connect(nodes[i], nodes[(i + 1) % nodes.len()], thickness)
                .unwrap()
        })
        .collect();
    (nodes, walls)
}

/// `w` x `l` rectangle of walls with its lower-left corner at the origin.
pub fn rectangle(w: f64, l: f64, thickness: f64) -> (Scene, Vec<NodeId>, Vec<WallId>) {
    let mut scene = Scene::new();
    let (nodes, walls) = closed_loop(
        &mut scene,
        &[(0.0, 0.0), (w, 0.0), (w, l), (0.0, l)],
        thickness,
    );
    (scene, nodes, walls)
}
