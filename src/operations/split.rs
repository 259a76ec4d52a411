use tracing::debug;

use crate::math::intersect_2d::segment_segment_intersect_2d;
use crate::math::{points_coincide, Point2, POINT_TOLERANCE, TOLERANCE};
use crate::scene::{Node, NodeId, Scene, Wall, WallId};

/// Tolerances used when cutting walls at centerline crossings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitConfig {
    /// Crossing points closer than this are the same point; existing nodes
    /// this close to a cut are reused.
    pub point_tolerance: f64,
    /// Crossings this close to a wall's endpoint do not cut that wall.
    pub endpoint_tolerance: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            point_tolerance: POINT_TOLERANCE,
            endpoint_tolerance: POINT_TOLERANCE,
        }
    }
}

/// Cuts walls at every centerline crossing that is not already a shared node.
///
/// Returns a new scene; the input is untouched. The result keeps the
/// input's revision, since it is fully determined by it. Sub-walls carry
/// `origin = Some(original wall)` and cut points without a nearby node
/// become `synthetic` nodes. Walls with missing nodes or zero length pass
/// through unchanged.
#[must_use]
pub fn split_walls_at_intersections(scene: &Scene) -> Scene {
    split_walls_at_intersections_with(scene, &SplitConfig::default())
}

/// [`split_walls_at_intersections`] with explicit tolerances.
#[must_use]
pub fn split_walls_at_intersections_with(scene: &Scene, config: &SplitConfig) -> Scene {
    let segments: Vec<Segment> = scene
        .walls()
        .filter_map(|(id, wall)| {
            let (a, b) = scene.wall_endpoints(id).ok()?;
            let length = (b - a).norm();
            (length > TOLERANCE).then(|| Segment {
                id,
                wall: wall.clone(),
                a,
                b,
                length,
            })
        })
        .collect();

    // Step 1: crossing points per wall.
    let mut crossings: Vec<Vec<Point2>> = vec![Vec::new(); segments.len()];
    for i in 0..segments.len() {
        for j in (i + 1)..segments.len() {
            let (si, sj) = (&segments[i], &segments[j]);
            if si.wall.shares_node_with(&sj.wall) {
                continue;
            }
            let Some((pt, t, u)) = segment_segment_intersect_2d(&si.a, &si.b, &sj.a, &sj.b)
            else {
                continue;
            };
            if si.is_interior(t, config.endpoint_tolerance) {
                add_unique_point(&mut crossings[i], pt, config.point_tolerance);
            }
            if sj.is_interior(u, config.endpoint_tolerance) {
                add_unique_point(&mut crossings[j], pt, config.point_tolerance);
            }
        }
    }

    // Step 2: cut each crossed wall into consecutive sub-walls.
    let mut result = scene.clone();
    let mut split_count = 0_usize;
    for (seg, points) in segments.iter().zip(&crossings) {
        let mut params: Vec<f64> = points
            .iter()
            .map(|p| seg.parameter_of(p))
            .filter(|&t| t > TOLERANCE && t < 1.0 - TOLERANCE)
            .collect();
        if params.is_empty() {
            continue;
        }
        params.sort_by(f64::total_cmp);
        params.dedup_by(|a, b| (*a - *b).abs() * seg.length < config.point_tolerance);

        if result.remove_wall_untracked(seg.id).is_err() {
            continue;
        }
        split_count += 1;

        let origin = Some(seg.wall.source_id(seg.id));
        let mut prev = seg.wall.node_a;
        for t in params {
            let at = seg.a + (seg.b - seg.a) * t;
            let node = ensure_node(&mut result, at, config.point_tolerance);
            push_piece(&mut result, &seg.wall, prev, node, origin);
            prev = node;
        }
        push_piece(&mut result, &seg.wall, prev, seg.wall.node_b, origin);
    }

    if split_count > 0 {
        debug!(
            walls = split_count,
            nodes_before = scene.node_count(),
            nodes_after = result.node_count(),
            "walls split at intersections"
        );
    }
    result
}

/// Maps a wall id of a split scene back to the user's wall id.
#[must_use]
pub fn source_wall_id(split: &Scene, id: WallId) -> WallId {
    split.wall(id).map_or(id, |w| w.source_id(id))
}

#[derive(Debug)]
struct Segment {
    id: WallId,
    wall: Wall,
    a: Point2,
    b: Point2,
    length: f64,
}

impl Segment {
    fn is_interior(&self, t: f64, endpoint_tolerance: f64) -> bool {
        t * self.length > endpoint_tolerance && (1.0 - t) * self.length > endpoint_tolerance
    }

    fn parameter_of(&self, p: &Point2) -> f64 {
        let d = self.b - self.a;
        (p - self.a).dot(&d) / (self.length * self.length)
    }
}

fn push_piece(scene: &mut Scene, template: &Wall, a: NodeId, b: NodeId, origin: Option<WallId>) {
    if a == b {
        return;
    }
    let piece = Wall {
        node_a: a,
        node_b: b,
        origin,
        ..template.clone()
    };
    // Both nodes exist and differ, and the thickness came from a valid wall.
    if let Err(err) = scene.insert_wall_untracked(piece) {
        debug!(%err, "dropped split piece");
    }
}

/// Adds a point to the list if not already present (within tolerance).
fn add_unique_point(points: &mut Vec<Point2>, p: Point2, tolerance: f64) {
    if !points.iter().any(|q| points_coincide(q, &p, tolerance)) {
        points.push(p);
    }
}

/// Finds a node within tolerance of `p`, or inserts a synthetic one.
fn ensure_node(scene: &mut Scene, p: Point2, tolerance: f64) -> NodeId {
    let existing = scene
        .nodes()
        .filter(|(_, n)| points_coincide(&n.position, &p, tolerance))
        .min_by(|(_, x), (_, y)| {
            (x.position - p)
                .norm_squared()
                .total_cmp(&(y.position - p).norm_squared())
        })
        .map(|(id, _)| id);
    existing.unwrap_or_else(|| scene.insert_node_untracked(Node::synthetic(p)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn cross_scene() -> (Scene, WallId, WallId) {
        let mut scene = Scene::new();
        let a = scene.add_node(p(-2000.0, 0.0));
        let b = scene.add_node(p(2000.0, 0.0));
        let c = scene.add_node(p(0.0, -2000.0));
        let d = scene.add_node(p(0.0, 2000.0));
        let h = scene.connect(a, b, 100.0).unwrap();
        let v = scene.connect(c, d, 100.0).unwrap();
        (scene, h, v)
    }

    #[test]
    fn crossing_walls_split_at_one_new_node() {
        let (scene, h, v) = cross_scene();
        let split = split_walls_at_intersections(&scene);

        assert_eq!(split.node_count(), scene.node_count() + 1);
        assert_eq!(split.wall_count(), 4);

        let (centre, node) = split.nodes().find(|(_, n)| n.synthetic).unwrap();
        assert!(points_coincide(&node.position, &p(0.0, 0.0), 1e-9));
        assert!(split.walls().all(|(_, w)| w.touches(centre)));

        let from_h = split
            .walls()
            .filter(|(id, _)| source_wall_id(&split, *id) == h)
            .count();
        let from_v = split
            .walls()
            .filter(|(id, _)| source_wall_id(&split, *id) == v)
            .count();
        assert_eq!((from_h, from_v), (2, 2));
    }

    #[test]
    fn split_is_idempotent() {
        let (scene, _, _) = cross_scene();
        let once = split_walls_at_intersections(&scene);
        let twice = split_walls_at_intersections(&once);
        assert_eq!(once.node_count(), twice.node_count());
        assert_eq!(once.wall_count(), twice.wall_count());
        assert_eq!(once.revision(), twice.revision());
    }

    #[test]
    fn input_scene_is_untouched() {
        let (scene, h, v) = cross_scene();
        let revision = scene.revision();
        let _ = split_walls_at_intersections(&scene);
        assert_eq!(scene.revision(), revision);
        assert!(scene.wall(h).is_ok() && scene.wall(v).is_ok());
    }

    #[test]
    fn repeated_splits_of_one_scene_are_equal() {
        let (scene, _, _) = cross_scene();
        let first = split_walls_at_intersections(&scene);
        let second = split_walls_at_intersections(&scene);

        assert_eq!(first.revision(), scene.revision());
        assert_eq!(second.revision(), first.revision());
        assert_eq!(first.node_count(), second.node_count());
        assert_eq!(first.wall_count(), second.wall_count());

        let endpoints = |split: &Scene| -> Vec<(WallId, Point2, Point2)> {
            split
                .walls()
                .map(|(id, _)| {
                    let (a, b) = split.wall_endpoints(id).unwrap();
                    (id, a, b)
                })
                .collect()
        };
        assert_eq!(endpoints(&first), endpoints(&second));
    }

    #[test]
    fn t_junction_reuses_stem_endpoint() {
        let mut scene = Scene::new();
        let a = scene.add_node(p(0.0, 0.0));
        let b = scene.add_node(p(4000.0, 0.0));
        let stem_top = scene.add_node(p(2000.0, 0.0));
        let stem_bottom = scene.add_node(p(2000.0, -3000.0));
        scene.connect(a, b, 100.0).unwrap();
        scene.connect(stem_top, stem_bottom, 100.0).unwrap();

        let split = split_walls_at_intersections(&scene);
        assert_eq!(split.node_count(), 4, "no synthetic node expected");
        assert_eq!(split.wall_count(), 3);
        assert_eq!(split.incident_walls(stem_top).len(), 3);
    }

    #[test]
    fn near_endpoint_touch_is_not_a_crossing() {
        let mut scene = Scene::new();
        let a = scene.add_node(p(0.0, 0.0));
        let b = scene.add_node(p(4000.0, 0.0));
        let c = scene.add_node(p(3999.5, 0.0));
        let d = scene.add_node(p(3999.5, 3000.0));
        scene.connect(a, b, 100.0).unwrap();
        scene.connect(c, d, 100.0).unwrap();
        let split = split_walls_at_intersections(&scene);
        assert_eq!(split.wall_count(), 2);
        assert_eq!(split.node_count(), 4);
    }

    #[test]
    fn wall_crossed_twice_becomes_three_pieces() {
        let mut scene = Scene::new();
        let ids: Vec<NodeId> = [
            (0.0, 0.0),
            (6000.0, 0.0),
            (2000.0, -1000.0),
            (2000.0, 1000.0),
            (4000.0, -1000.0),
            (4000.0, 1000.0),
        ]
        .iter()
        .map(|&(x, y)| scene.add_node(p(x, y)))
        .collect();
        let long = scene.connect(ids[0], ids[1], 100.0).unwrap();
        scene.connect(ids[2], ids[3], 100.0).unwrap();
        scene.connect(ids[4], ids[5], 100.0).unwrap();

        let split = split_walls_at_intersections(&scene);
        let pieces = split
            .walls()
            .filter(|(id, _)| source_wall_id(&split, *id) == long)
            .count();
        assert_eq!(pieces, 3);
        assert_eq!(split.wall_count(), 7);
        assert_eq!(split.node_count(), 8);
    }
}
