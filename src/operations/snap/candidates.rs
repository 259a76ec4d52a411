use tracing::trace;

use crate::error::Result;
use crate::math::distance_2d::{project_on_segment, point_to_line_dist};
use crate::math::{points_coincide, Point2, Vector2, TOLERANCE};
use crate::scene::Scene;

use super::{
    AngleConstraint, GuideAxis, Guideline, SnapCandidate, SnapKind, SnapOptions, SnapResult,
    SnapTier, ANGLE_RAY_TOLERANCE, DISPLAY_MERGE_TOLERANCE, EDGE_END_MARGIN,
};

/// Every snap candidate for `cursor`, best first.
///
/// # Errors
///
/// Returns `SceneError::NodeNotFound` if a wall references a missing node.
pub fn collect_snap_candidates(
    cursor: &Point2,
    scene: &Scene,
    options: &SnapOptions,
) -> Result<Vec<SnapCandidate>> {
    let guides = guidelines(scene, options);
    let ray = options
        .angle
        .and_then(|c| c.ray_direction(cursor).map(|dir| (c, dir)));

    let mut candidates = match ray {
        Some((constraint, dir)) => {
            angle_candidates(cursor, scene, options, &guides, &constraint, &dir)?
        }
        None => free_candidates(cursor, scene, options, &guides)?,
    };
    candidates.sort_by(SnapCandidate::rank);
    Ok(candidates)
}

/// Picks the best snap for `cursor`.
///
/// Without a qualifying candidate the point is the cursor, or its angle-ray
/// projection when an angle constraint is active, and `snapped` is false.
///
/// # Errors
///
/// Returns `SceneError::NodeNotFound` if a wall references a missing node.
pub fn find_snap_candidate(
    cursor: &Point2,
    scene: &Scene,
    options: &SnapOptions,
) -> Result<SnapResult> {
    let best = collect_snap_candidates(cursor, scene, options)?
        .into_iter()
        .next();

    let result = match best {
        Some(c) if c.kind == SnapKind::AngleRay => SnapResult {
            snapped: false,
            point: c.point,
            candidate: None,
        },
        Some(c) => SnapResult {
            snapped: true,
            point: c.point,
            candidate: Some(c),
        },
        None => SnapResult {
            snapped: false,
            point: *cursor,
            candidate: None,
        },
    };
    trace!(
        snapped = result.snapped,
        kind = ?result.candidate.as_ref().map(|c| c.kind),
        "snap resolved"
    );
    Ok(result)
}

/// Reduces candidates to what should be drawn.
///
/// Candidates at the same point collapse to the highest priority one. The
/// guidelines of a kept guide intersection are marked visual-only, and
/// alignment guides it already draws are dropped.
#[must_use]
pub fn display_candidates(candidates: &[SnapCandidate]) -> Vec<SnapCandidate> {
    let mut ranked = candidates.to_vec();
    ranked.sort_by(SnapCandidate::rank);

    let mut kept: Vec<SnapCandidate> = Vec::with_capacity(ranked.len());
    for candidate in ranked {
        if kept
            .iter()
            .any(|k| points_coincide(&k.point, &candidate.point, DISPLAY_MERGE_TOLERANCE))
        {
            continue;
        }
        kept.push(candidate);
    }

    let owned: Vec<Guideline> = kept
        .iter()
        .filter(|c| c.kind == SnapKind::GuideIntersection)
        .flat_map(|c| c.guidelines.iter().copied())
        .collect();
    kept.retain(|c| {
        c.kind != SnapKind::AlignmentGuide
            || !c
                .guidelines
                .iter()
                .all(|g| owned.iter().any(|o| o.same_line(g)))
    });
    for c in &mut kept {
        if c.kind == SnapKind::GuideIntersection {
            for g in &mut c.guidelines {
                g.visual_only = true;
            }
        }
    }
    kept
}

/// Horizontal and vertical guidelines through every snappable node, one per
/// distinct line.
fn guidelines(scene: &Scene, options: &SnapOptions) -> Vec<Guideline> {
    let mut guides: Vec<Guideline> = Vec::new();
    for (id, node) in scene.nodes() {
        if options.excludes(id) {
            continue;
        }
        for axis in [GuideAxis::Horizontal, GuideAxis::Vertical] {
            let guide = Guideline::new(axis, node.position, id);
            if !guides.iter().any(|g| g.same_line(&guide)) {
                guides.push(guide);
            }
        }
    }
    guides
}

fn free_candidates(
    at: &Point2,
    scene: &Scene,
    options: &SnapOptions,
    guides: &[Guideline],
) -> Result<Vec<SnapCandidate>> {
    let tol = options.tolerance_units();
    let mask = options.mask;
    let mut out = Vec::new();

    if mask.is_enabled(SnapKind::Node) {
        for (id, node) in scene.nodes() {
            let d = (node.position - at).norm();
            if !options.excludes(id) && d <= tol {
                let mut c = SnapCandidate::new(SnapKind::Node, node.position, options.to_px(d));
                c.node = Some(id);
                out.push(c);
            }
        }
    }

    for (id, wall) in scene.walls() {
        if options.excludes(wall.node_a) || options.excludes(wall.node_b) {
            continue;
        }
        let (a, b) = scene.wall_endpoints(id)?;

        if mask.is_enabled(SnapKind::Midpoint) {
            let mid = nalgebra::center(&a, &b);
            let d = (mid - at).norm();
            if d <= tol {
                let mut c = SnapCandidate::new(SnapKind::Midpoint, mid, options.to_px(d));
                c.wall = Some(id);
                out.push(c);
            }
        }

        if mask.is_enabled(SnapKind::Edge) {
            let (t, foot) = project_on_segment(at, &a, &b);
            let d = (foot - at).norm();
            if (EDGE_END_MARGIN..=1.0 - EDGE_END_MARGIN).contains(&t) && d <= tol {
                let mut c = SnapCandidate::new(SnapKind::Edge, foot, options.to_px(d));
                c.wall = Some(id);
                out.push(c);
            }
        }
    }

    if let (Some(spacing), true) = (options.grid, mask.is_enabled(SnapKind::Grid)) {
        let lattice = Point2::new(
            (at.x / spacing).round() * spacing,
            (at.y / spacing).round() * spacing,
        );
        let d = (lattice - at).norm();
        if d <= tol {
            out.push(SnapCandidate::new(SnapKind::Grid, lattice, options.to_px(d)));
        }
    }

    let near: Vec<&Guideline> = guides
        .iter()
        .filter(|g| (g.project(at) - at).norm() <= tol)
        .collect();

    if mask.is_enabled(SnapKind::AlignmentGuide) {
        for g in &near {
            let p = g.project(at);
            let mut c =
                SnapCandidate::new(SnapKind::AlignmentGuide, p, options.to_px((p - at).norm()));
            c.guidelines.push(**g);
            out.push(c);
        }
    }

    if mask.is_enabled(SnapKind::GuideIntersection) {
        let horizontal = near.iter().filter(|g| g.axis == GuideAxis::Horizontal);
        for h in horizontal {
            for v in near.iter().filter(|g| g.axis == GuideAxis::Vertical) {
                // Both lines through one node cross at the node itself.
                if h.node == v.node {
                    continue;
                }
                let p = Point2::new(v.through.x, h.through.y);
                let d = (p - at).norm();
                if d <= tol {
                    let mut c =
                        SnapCandidate::new(SnapKind::GuideIntersection, p, options.to_px(d));
                    c.guidelines.extend([**h, **v]);
                    out.push(c);
                }
            }
        }
    }

    Ok(out)
}

fn angle_candidates(
    cursor: &Point2,
    scene: &Scene,
    options: &SnapOptions,
    guides: &[Guideline],
    constraint: &AngleConstraint,
    dir: &Vector2,
) -> Result<Vec<SnapCandidate>> {
    let origin = constraint.origin;
    let ray_point = origin + dir * (cursor - origin).dot(dir).max(0.0);
    let tol = options.tolerance_units();

    // Guidelines crossing the ray near the cursor win outright.
    if options.mask.is_enabled(SnapKind::GuideIntersection) {
        let crossings: Vec<SnapCandidate> = guides
            .iter()
            .filter_map(|g| {
                let s = ray_guide_crossing(&origin, dir, g)?;
                let p = origin + dir * s;
                let d = (p - ray_point).norm();
                (d <= tol).then(|| {
                    let mut c =
                        SnapCandidate::new(SnapKind::GuideIntersection, p, options.to_px(d));
                    c.tier = SnapTier::AngleConstrained;
                    c.guidelines.push(*g);
                    c
                })
            })
            .collect();
        if !crossings.is_empty() {
            return Ok(crossings);
        }
    }

    let mut out: Vec<SnapCandidate> = free_candidates(&ray_point, scene, options, &[])?
        .into_iter()
        .filter(|c| {
            point_to_line_dist(&c.point, &origin, dir) <= ANGLE_RAY_TOLERANCE
                && (c.point - origin).dot(dir) >= -ANGLE_RAY_TOLERANCE
        })
        .map(|mut c| {
            c.tier = SnapTier::AngleConstrained;
            c
        })
        .collect();

    let mut ray = SnapCandidate::new(
        SnapKind::AngleRay,
        ray_point,
        options.to_px((ray_point - cursor).norm()),
    );
    ray.tier = SnapTier::AngleConstrained;
    out.push(ray);
    Ok(out)
}

/// Ray parameter where the ray from `origin` along `dir` meets `guide`, if
/// ahead of the origin.
fn ray_guide_crossing(origin: &Point2, dir: &Vector2, guide: &Guideline) -> Option<f64> {
    let (o, d, target) = match guide.axis {
        GuideAxis::Horizontal => (origin.y, dir.y, guide.through.y),
        GuideAxis::Vertical => (origin.x, dir.x, guide.through.x),
    };
    if d.abs() <= TOLERANCE {
        return None;
    }
    let s = (target - o) / d;
    (s > TOLERANCE).then_some(s)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::snap::SnapMask;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn no_grid() -> SnapOptions {
        SnapOptions {
            grid: None,
            ..SnapOptions::default()
        }
    }

    #[test]
    fn node_beats_nearer_grid_point() {
        let mut scene = Scene::new();
        let n = scene.add_node(p(1010.0, 1000.0));
        let result = find_snap_candidate(&p(1004.0, 1000.0), &scene, &SnapOptions::default())
            .unwrap();
        assert!(result.snapped);
        let c = result.candidate.unwrap();
        assert_eq!(c.kind, SnapKind::Node);
        assert_eq!(c.node, Some(n));
        assert_eq!(result.point, p(1010.0, 1000.0));
    }

    #[test]
    fn nothing_in_range_is_not_snapped() {
        let scene = Scene::new();
        let cursor = p(1234.0, 5678.0);
        let result = find_snap_candidate(&cursor, &scene, &no_grid()).unwrap();
        assert!(!result.snapped);
        assert_eq!(result.point, cursor);
        assert!(result.candidate.is_none());
    }

    #[test]
    fn midpoint_beats_edge_and_edge_skips_wall_ends() {
        let mut scene = Scene::new();
        let a = scene.add_node(p(0.0, 0.0));
        let b = scene.add_node(p(4000.0, 0.0));
        let w = scene.connect(a, b, 100.0).unwrap();
        let options = SnapOptions {
            mask: SnapMask::ALL
                .with(SnapKind::AlignmentGuide, false)
                .with(SnapKind::GuideIntersection, false),
            ..no_grid()
        };

        let mid = find_snap_candidate(&p(2030.0, 20.0), &scene, &options).unwrap();
        assert_eq!(mid.candidate.as_ref().unwrap().kind, SnapKind::Midpoint);
        assert_eq!(mid.point, p(2000.0, 0.0));

        let edge = find_snap_candidate(&p(1000.0, 30.0), &scene, &options).unwrap();
        let c = edge.candidate.unwrap();
        assert_eq!((c.kind, c.wall), (SnapKind::Edge, Some(w)));
        assert!((edge.point - p(1000.0, 0.0)).norm() < 1e-9);

        // 2.5% along the wall: inside the end margin, and too far from node A.
        let end = collect_snap_candidates(&p(100.0, 10.0), &scene, &options).unwrap();
        assert!(end.iter().all(|c| c.kind != SnapKind::Edge));
    }

    #[test]
    fn excluded_nodes_and_their_walls_are_ignored() {
        let mut scene = Scene::new();
        let a = scene.add_node(p(0.0, 0.0));
        let b = scene.add_node(p(2000.0, 0.0));
        scene.connect(a, b, 100.0).unwrap();
        let options = SnapOptions {
            excluded_nodes: vec![a],
            ..no_grid()
        };
        let found = collect_snap_candidates(&p(5.0, 5.0), &scene, &options).unwrap();
        assert!(found.iter().all(|c| c.node != Some(a) && c.wall.is_none()));
    }

    #[test]
    fn guide_intersection_and_alignment_guide() {
        let mut scene = Scene::new();
        scene.add_node(p(0.0, 2000.0));
        scene.add_node(p(3000.0, 0.0));

        let corner = find_snap_candidate(&p(3010.0, 1990.0), &scene, &no_grid()).unwrap();
        let c = corner.candidate.unwrap();
        assert_eq!(c.kind, SnapKind::GuideIntersection);
        assert_eq!(c.guidelines.len(), 2);
        assert_eq!(corner.point, p(3000.0, 2000.0));

        let along = find_snap_candidate(&p(6000.0, 2030.0), &scene, &no_grid()).unwrap();
        assert_eq!(along.candidate.unwrap().kind, SnapKind::AlignmentGuide);
        assert_eq!(along.point, p(6000.0, 2000.0));
    }

    #[test]
    fn angle_mode_guide_crossing_wins_outright() {
        let mut scene = Scene::new();
        scene.add_node(p(2000.0, 0.5));
        let options = SnapOptions {
            angle: Some(AngleConstraint::new(p(0.0, 0.0))),
            ..no_grid()
        };
        let result = find_snap_candidate(&p(1990.0, 40.0), &scene, &options).unwrap();
        let c = result.candidate.unwrap();
        assert_eq!(c.kind, SnapKind::GuideIntersection);
        assert_eq!(c.tier, SnapTier::AngleConstrained);
        assert!((result.point - p(2000.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn angle_mode_keeps_only_on_ray_candidates() {
        let mut scene = Scene::new();
        let on_ray = scene.add_node(p(2000.0, 0.5));
        scene.add_node(p(1950.0, 60.0));
        let options = SnapOptions {
            angle: Some(AngleConstraint::new(p(0.0, 0.0))),
            mask: SnapMask::ALL.with(SnapKind::GuideIntersection, false),
            ..no_grid()
        };
        let found = collect_snap_candidates(&p(1960.0, 40.0), &scene, &options).unwrap();
        assert!(found.iter().all(|c| c.tier == SnapTier::AngleConstrained));
        assert_eq!(found[0].kind, SnapKind::Node);
        assert_eq!(found[0].node, Some(on_ray));
        assert_eq!(found.last().unwrap().kind, SnapKind::AngleRay);
    }

    #[test]
    fn angle_mode_falls_back_to_ray_point() {
        let scene = Scene::new();
        let options = SnapOptions {
            angle: Some(AngleConstraint::new(p(0.0, 0.0))),
            ..no_grid()
        };
        let result = find_snap_candidate(&p(3000.0, 100.0), &scene, &options).unwrap();
        assert!(!result.snapped);
        assert!((result.point - p(3000.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn display_collapses_coincident_candidates() {
        let mut scene = Scene::new();
        scene.add_node(p(0.0, 2000.0));
        scene.add_node(p(3000.0, 0.0));
        // A grid point at the guide intersection.
        let options = SnapOptions::default().with_grid(1000.0).unwrap();
        let all = collect_snap_candidates(&p(3010.0, 1990.0), &scene, &options).unwrap();
        assert!(all.iter().any(|c| c.kind == SnapKind::Grid));

        let shown = display_candidates(&all);
        assert_eq!(shown[0].kind, SnapKind::GuideIntersection);
        assert!(shown[0].guidelines.iter().all(|g| g.visual_only));
        assert!(shown
            .iter()
            .all(|c| c.kind != SnapKind::Grid && c.kind != SnapKind::AlignmentGuide));
    }

    #[test]
    fn repeated_queries_agree() {
        let mut scene = Scene::new();
        let a = scene.add_node(p(0.0, 0.0));
        let b = scene.add_node(p(3000.0, 0.0));
        scene.connect(a, b, 100.0).unwrap();
        let cursor = p(1480.0, 35.0);
        let first = collect_snap_candidates(&cursor, &scene, &SnapOptions::default()).unwrap();
        let second = collect_snap_candidates(&cursor, &scene, &SnapOptions::default()).unwrap();
        assert_eq!(first, second);
    }
}
