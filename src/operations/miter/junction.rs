use tracing::trace;

use crate::error::{OperationError, Result};
use crate::math::intersect_2d::{line_line_point_2d, segment_segment_intersect_2d};
use crate::math::{is_anti_parallel, Point2, COLLINEAR_ANGLE_TOLERANCE, TOLERANCE};
use crate::scene::{NodeId, Scene, WallId};

use super::corner::{Apex, EdgeCorner};
use super::offset_edges::{build_arms, Arm, Side};

/// Tunables for corner resolution at junctions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MiterConfig {
    /// Walls whose outward directions are anti-parallel within this angle
    /// (radians) form a straight-through pair.
    pub collinear_tolerance: f64,
    /// Corners farther than this many average thicknesses from the node are
    /// rejected.
    pub max_miter_factor: f64,
}

impl Default for MiterConfig {
    fn default() -> Self {
        Self {
            collinear_tolerance: COLLINEAR_ANGLE_TOLERANCE,
            max_miter_factor: 10.0,
        }
    }
}

impl MiterConfig {
    /// Creates a config with custom tolerances.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` if either value is not positive.
    pub fn new(collinear_tolerance: f64, max_miter_factor: f64) -> Result<Self> {
        if collinear_tolerance <= 0.0 || max_miter_factor <= 0.0 {
            return Err(OperationError::InvalidInput(
                "miter tolerances must be positive".to_owned(),
            )
            .into());
        }
        Ok(Self {
            collinear_tolerance,
            max_miter_factor,
        })
    }
}

/// Resolved corner geometry for every wall meeting at one node.
#[derive(Debug, Clone)]
pub struct Junction {
    pub node: NodeId,
    pub position: Point2,
    arms: Vec<Arm>,
    corners: Vec<[EdgeCorner; 2]>,
    apexes: Vec<Option<Apex>>,
}

impl Junction {
    /// Incident walls as seen from the node.
    #[must_use]
    pub fn arms(&self) -> &[Arm] {
        &self.arms
    }

    fn arm_index(&self, wall: WallId) -> Option<usize> {
        self.arms.iter().position(|a| a.wall == wall)
    }

    /// Resolution state of a wall's corner on `side` (relative to the wall's
    /// outward direction at this node).
    #[must_use]
    pub fn corner_state(&self, wall: WallId, side: Side) -> Option<EdgeCorner> {
        self.arm_index(wall).map(|i| self.corners[i][side.index()])
    }

    /// Corner point of a wall on `side`, falling back to the butt-joint
    /// offset point when no miter was found.
    #[must_use]
    pub fn corner(&self, wall: WallId, side: Side) -> Option<Point2> {
        let i = self.arm_index(wall)?;
        let fallback = self.arms[i].edge(side).start;
        Some(self.corners[i][side.index()].point_or(fallback))
    }

    /// Apex state of a wall at this node, if any.
    #[must_use]
    pub fn apex_state(&self, wall: WallId) -> Option<Apex> {
        self.arm_index(wall).and_then(|i| self.apexes[i])
    }

    /// Apex point of a wall at this node, if any.
    #[must_use]
    pub fn apex(&self, wall: WallId) -> Option<Point2> {
        self.apex_state(wall).map(|a| a.point())
    }
}

/// Computes corner points for every wall incident to `node`.
///
/// # Errors
///
/// Returns a not-found error if the node or one of its walls' far nodes is
/// missing from the scene.
pub fn solve_junction(scene: &Scene, node: NodeId, config: &MiterConfig) -> Result<Junction> {
    let position = scene.node_position(node)?;
    let arms = build_arms(scene, node)?;
    let solver = Solver::new(&arms, position, config);
    let corners = solver.resolve_corners();
    let apexes = solver.resolve_apexes(&corners);

    trace!(
        ?node,
        arms = arms.len(),
        unresolved = corners
            .iter()
            .flatten()
            .filter(|c| !c.is_resolved())
            .count(),
        "junction solved"
    );

    Ok(Junction {
        node,
        position,
        arms,
        corners,
        apexes,
    })
}

struct Solver<'a> {
    arms: &'a [Arm],
    position: Point2,
    collinear_tolerance: f64,
    /// Maximum accepted corner distance from the node.
    limit: f64,
}

impl<'a> Solver<'a> {
    fn new(arms: &'a [Arm], position: Point2, config: &MiterConfig) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let average = if arms.is_empty() {
            0.0
        } else {
            arms.iter().map(|a| a.thickness).sum::<f64>() / arms.len() as f64
        };
        Self {
            arms,
            position,
            collinear_tolerance: config.collinear_tolerance,
            limit: config.max_miter_factor * average,
        }
    }

    fn active(&self, i: usize) -> bool {
        self.arms[i].has_length
    }

    fn collinear(&self, i: usize, j: usize) -> bool {
        is_anti_parallel(&self.arms[i].dir, &self.arms[j].dir, self.collinear_tolerance)
    }

    fn within_limit(&self, p: &Point2) -> Option<f64> {
        let dist = (p - self.position).norm();
        (dist <= self.limit).then_some(dist)
    }

    /// Active arms sorted counter-clockwise by outward direction.
    fn angular_order(&self) -> Vec<usize> {
        let angle = |i: usize| self.arms[i].dir.y.atan2(self.arms[i].dir.x);
        let mut order: Vec<usize> = (0..self.arms.len()).filter(|&i| self.active(i)).collect();
        order.sort_by(|&a, &b| angle(a).total_cmp(&angle(b)).then(a.cmp(&b)));
        order
    }

    /// Edge facing `side` of arm `i`: the right edge of the next arm
    /// counter-clockwise for a left edge, the left edge of the previous arm
    /// for a right edge. `None` when that arm is the straight-through
    /// partner of `i`.
    fn facing(&self, order: &[usize], i: usize, side: Side) -> Option<(usize, Side)> {
        let m = order.len();
        if m < 2 {
            return None;
        }
        let k = order.iter().position(|&a| a == i)?;
        let j = match side {
            Side::Left => order[(k + 1) % m],
            Side::Right => order[(k + m - 1) % m],
        };
        (!self.collinear(i, j)).then_some((j, side.opposite()))
    }

    fn resolve_corners(&self) -> Vec<[EdgeCorner; 2]> {
        let n = self.arms.len();
        let mut corners = vec![[EdgeCorner::Unresolved; 2]; n];
        if n < 2 {
            return corners;
        }

        // Each edge meets only the edge across the gap on that side; the
        // pairing is symmetric, so both edges settle on the same point.
        let order = self.angular_order();
        for &i in &order {
            for side in Side::BOTH {
                if let Some((j, other_side)) = self.facing(&order, i, side) {
                    corners[i][side.index()] = self.pair_corner(i, side, j, other_side);
                }
            }
        }

        corners
    }

    /// Corner between two facing edges: their finite crossing if the offset
    /// segments meet within the limit, else the crossing of their lines.
    fn pair_corner(&self, i: usize, side: Side, j: usize, other_side: Side) -> EdgeCorner {
        let edge = self.arms[i].edge(side);
        let other = self.arms[j].edge(other_side);

        let finite = segment_segment_intersect_2d(&edge.start, &edge.end, &other.start, &other.end)
            .map(|(p, _, _)| p)
            .filter(|p| self.within_limit(p).is_some());
        if let Some(p) = finite {
            return EdgeCorner::Segment(p);
        }

        line_line_point_2d(&edge.start, &self.arms[i].dir, &other.start, &self.arms[j].dir)
            .filter(|p| self.within_limit(p).is_some())
            .map_or(EdgeCorner::Unresolved, EdgeCorner::Extension)
    }

    fn resolve_apexes(&self, corners: &[[EdgeCorner; 2]]) -> Vec<Option<Apex>> {
        let n = self.arms.len();
        let mut apexes = vec![None; n];
        if n < 2 {
            return apexes;
        }

        for i in (0..n).filter(|&i| self.active(i)) {
            let both_segment = corners[i].iter().all(EdgeCorner::is_segment);
            if n >= 3 && both_segment {
                apexes[i] = Some(Apex::Junction(self.junction_apex(i, corners)));
                continue;
            }

            let partner = (0..n)
                .filter(|&j| j != i && self.active(j) && self.collinear(i, j))
                .min_by(|&a, &b| {
                    let da = self.arms[i].dir.dot(&self.arms[a].dir);
                    let db = self.arms[i].dir.dot(&self.arms[b].dir);
                    da.total_cmp(&db)
                });
            if let Some(j) = partner {
                apexes[i] = self.collinear_apex(i, j, corners).map(Apex::Collinear);
            }
        }

        apexes
    }

    /// Apex of a straight-through pair: where the pair's edges on the
    /// resolved side meet, or that side's offset origin when they are
    /// parallel. `None` when the corner on that side already lies behind
    /// the apex, since the outline would fold back over itself.
    fn collinear_apex(&self, i: usize, j: usize, corners: &[[EdgeCorner; 2]]) -> Option<Point2> {
        let left_only = corners[i][Side::Left.index()].is_resolved()
            && !corners[i][Side::Right.index()].is_resolved();
        let side = if left_only { Side::Left } else { Side::Right };

        // Left of one arm lines up with right of its anti-parallel partner.
        let edge = self.arms[i].edge(side);
        let partner_edge = self.arms[j].edge(side.opposite());
        let apex = line_line_point_2d(
            &edge.start,
            &self.arms[i].dir,
            &partner_edge.start,
            &self.arms[j].dir,
        )
        .filter(|p| self.within_limit(p).is_some())
        .unwrap_or(edge.start);

        let corner = corners[i][side.index()].point_or(edge.start);
        ((corner - apex).dot(&self.arms[i].dir) >= -TOLERANCE).then_some(apex)
    }

    /// Apex of a wall whose corners both crossed finitely at a junction of
    /// three or more walls: the nearest meeting point of the other walls'
    /// still-unresolved edges, or the node itself.
    fn junction_apex(&self, i: usize, corners: &[[EdgeCorner; 2]]) -> Point2 {
        let open: Vec<(usize, Side)> = (0..self.arms.len())
            .filter(|&j| j != i && self.active(j))
            .flat_map(|j| Side::BOTH.into_iter().map(move |s| (j, s)))
            .filter(|&(j, s)| !corners[j][s.index()].is_resolved())
            .collect();

        let mut best: Option<(f64, Point2)> = None;
        for (a, &(j, sj)) in open.iter().enumerate() {
            for &(k, sk) in &open[a + 1..] {
                if j == k || sj == sk || self.collinear(j, k) {
                    continue;
                }
                let ej = self.arms[j].edge(sj);
                let ek = self.arms[k].edge(sk);
                let Some(p) =
                    line_line_point_2d(&ej.start, &self.arms[j].dir, &ek.start, &self.arms[k].dir)
                else {
                    continue;
                };
                let Some(dist) = self.within_limit(&p) else {
                    continue;
                };
                if best.is_none_or(|(d, _)| dist < d) {
                    best = Some((dist, p));
                }
            }
        }
        best.map_or(self.position, |(_, p)| p)
    }
}
