#![allow(clippy::unwrap_used)]

mod common;

use approx::assert_abs_diff_eq;
use common::{init_tracing, p, rectangle};
use floorkit::math::polygon_2d::{is_simple_polygon_2d, signed_area_2d};
use floorkit::operations::miter::{
    build_wall_polygon, build_wall_polygons, solve_junction, Apex, MiterConfig, Side,
};
use floorkit::operations::split::split_walls_at_intersections;
use floorkit::Scene;

const T: f64 = 200.0;

/// Two rooms split by a wall at x = 2000, plus a diagonal wall leaving the
/// lower T junction at about 56°.
fn junction_plan() -> Scene {
    let mut scene = Scene::new();
    let ids: Vec<_> = [
        (0.0, 0.0),
        (2000.0, 0.0),
        (4000.0, 0.0),
        (4000.0, 3000.0),
        (2000.0, 3000.0),
        (0.0, 3000.0),
    ]
    .iter()
    .map(|&(x, y)| scene.add_node(p(x, y)))
    .collect();
    for i in 0..6 {
        scene.connect(ids[i], ids[(i + 1) % 6], T).unwrap();
    }
    scene.connect(ids[1], ids[4], T).unwrap();
    let tip = scene.add_node(p(3000.0, 1500.0));
    scene.connect(ids[1], tip, T).unwrap();
    scene
}

#[test]
fn outlines_are_closed_and_simple() {
    init_tracing();
    let mut plans = vec![junction_plan()];

    let (mut grid, _, _) = rectangle(4000.0, 4000.0, T);
    let l = grid.add_node(p(0.0, 2000.0));
    let r = grid.add_node(p(4000.0, 2000.0));
    let b = grid.add_node(p(2000.0, 0.0));
    let t = grid.add_node(p(2000.0, 4000.0));
    grid.connect(l, r, T).unwrap();
    grid.connect(b, t, T).unwrap();
    plans.push(split_walls_at_intersections(&grid));

    for scene in &plans {
        for (id, outline) in build_wall_polygons(scene).unwrap() {
            assert!(outline.len() >= 4, "{id:?} has {} points", outline.len());
            assert!(is_simple_polygon_2d(&outline), "{id:?}: {outline:?}");
        }
    }
}

/// Every set of 2 to 4 directions on a 15° lattice whose cyclic gaps are
/// all at least 30°, as lattice steps.
fn star_layouts() -> Vec<Vec<u32>> {
    const STEPS: u32 = 24;

    fn extend(from: u32, current: &mut Vec<u32>, layouts: &mut Vec<Vec<u32>>) {
        if current.len() >= 2 {
            let wrap = current[0] + STEPS - current[current.len() - 1];
            if wrap >= 2 {
                layouts.push(current.clone());
            }
        }
        if current.len() == 4 {
            return;
        }
        for step in from..STEPS {
            if current.last().is_some_and(|&last| step < last + 2) {
                continue;
            }
            current.push(step);
            extend(step + 1, current, layouts);
            current.pop();
        }
    }

    let mut layouts = Vec::new();
    extend(0, &mut Vec::new(), &mut layouts);
    layouts
}

#[test]
fn mixed_thickness_stars_close() {
    let thicknesses = [100.0, 200.0, 300.0];
    let layouts = star_layouts();
    assert!(layouts.len() > 1000);

    for (n, layout) in layouts.iter().enumerate() {
        for shift in 0..thicknesses.len() {
            let mut scene = Scene::new();
            let centre = scene.add_node(p(0.0, 0.0));
            for (k, &step) in layout.iter().enumerate() {
                let angle = f64::from(step * 15).to_radians();
                let far = scene.add_node(p(3000.0 * angle.cos(), 3000.0 * angle.sin()));
                let thickness = thicknesses[(n + k + shift) % thicknesses.len()];
                scene.connect(centre, far, thickness).unwrap();
            }

            for (id, outline) in build_wall_polygons(&scene).unwrap() {
                assert!(
                    is_simple_polygon_2d(&outline),
                    "{layout:?} shift {shift}, {id:?}: {outline:?}"
                );
                assert!(
                    signed_area_2d(&outline) > 0.0,
                    "{layout:?} shift {shift}, {id:?}: {outline:?}"
                );
            }
        }
    }
}

#[test]
fn outlines_are_deterministic() {
    let scene = junction_plan();
    assert_eq!(
        build_wall_polygons(&scene).unwrap(),
        build_wall_polygons(&scene).unwrap()
    );
    let (id, _) = scene.walls().last().unwrap();
    assert_eq!(
        build_wall_polygon(id, &scene).unwrap(),
        build_wall_polygon(id, &scene).unwrap()
    );
}

#[test]
fn shallow_corner_is_clamped() {
    let mut scene = Scene::new();
    let node = scene.add_node(p(0.0, 0.0));
    let flat = scene.add_node(p(4000.0, 0.0));
    let angle = 3_f64.to_radians();
    let tilted = scene.add_node(p(4000.0 * angle.cos(), 4000.0 * angle.sin()));
    let w1 = scene.connect(node, flat, T).unwrap();
    let w2 = scene.connect(node, tilted, T).unwrap();

    let config = MiterConfig::default();
    let junction = solve_junction(&scene, node, &config).unwrap();
    let limit = config.max_miter_factor * T;
    for wall in [w1, w2] {
        for side in Side::BOTH {
            let corner = junction.corner(wall, side).unwrap();
            assert!(corner.coords.norm() <= limit, "{corner:?} beyond {limit}");
        }
    }
}

#[test]
fn straight_run_has_flush_apexes() {
    let mut scene = Scene::new();
    let ids: Vec<_> = [0.0, 1000.0, 2500.0, 4000.0]
        .iter()
        .map(|&x| scene.add_node(p(x, 0.0)))
        .collect();
    let walls: Vec<_> = (0..3)
        .map(|i| scene.connect(ids[i], ids[i + 1], T).unwrap())
        .collect();

    for &node in &ids[1..3] {
        let junction = solve_junction(&scene, node, &MiterConfig::default()).unwrap();
        let x = scene.node_position(node).unwrap().x;
        for arm in junction.arms() {
            let Some(Apex::Collinear(apex)) = junction.apex_state(arm.wall) else {
                panic!("expected a collinear apex at x = {x}");
            };
            assert_abs_diff_eq!(apex.x, x, epsilon = 1e-9);
            assert_abs_diff_eq!(apex.y.abs(), T / 2.0, epsilon = 1e-9);
        }
    }

    // The middle wall's outline never leaves the two offset lines.
    let outline = build_wall_polygon(walls[1], &scene).unwrap();
    for q in &outline {
        assert_abs_diff_eq!(q.y.abs(), T / 2.0, epsilon = 1e-9);
    }
}
