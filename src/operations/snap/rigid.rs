use tracing::{debug, trace};

use crate::error::{OperationError, Result, SceneError};
use crate::math::{Point2, Vector2};
use crate::scene::{NodeId, Scene};

use super::{collect_snap_candidates, SnapCandidate, SnapKind, SnapOptions};

/// Tolerances for multi-node drags.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RigidBodyConfig {
    /// Allowed change of any pairwise distance between dragged nodes.
    pub distance_tolerance: f64,
    /// A translated node this close to one of its targets lands on it.
    pub landing_tolerance: f64,
}

impl Default for RigidBodyConfig {
    fn default() -> Self {
        Self {
            distance_tolerance: 0.5,
            landing_tolerance: 1.0,
        }
    }
}

impl RigidBodyConfig {
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` if either tolerance is
    /// negative.
    pub fn new(distance_tolerance: f64, landing_tolerance: f64) -> Result<Self> {
        if distance_tolerance < 0.0 || landing_tolerance < 0.0 {
            return Err(OperationError::InvalidInput(format!(
                "rigid-body tolerances must be non-negative, got \
                 {distance_tolerance} and {landing_tolerance}"
            ))
            .into());
        }
        Ok(Self {
            distance_tolerance,
            landing_tolerance,
        })
    }
}

/// Snap targets of one dragged node, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSnapTargets {
    pub node: NodeId,
    pub candidates: Vec<SnapCandidate>,
}

/// An accepted shared translation.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBodySnap {
    pub delta: Vector2,
    /// Node whose target produced `delta`.
    pub anchor: NodeId,
    /// Dragged nodes that land on a snap target under `delta`, anchor
    /// included.
    pub snapped_nodes: Vec<NodeId>,
}

/// Snap targets for every node in `dragged` after moving by `proposed_delta`.
///
/// Dragged nodes and their walls are never targets. Angle constraints and
/// alignment guides do not apply to rigid drags.
///
/// # Errors
///
/// Returns `SceneError::NodeNotFound` if a dragged node is missing or a wall
/// references a missing node, and `SceneError::NodeLocked` if a dragged
/// node is locked.
pub fn rigid_body_snap_targets(
    scene: &Scene,
    dragged: &[NodeId],
    proposed_delta: &Vector2,
    options: &SnapOptions,
) -> Result<Vec<NodeSnapTargets>> {
    let mut options = options.clone();
    options.angle = None;
    for &node in dragged {
        if !options.excluded_nodes.contains(&node) {
            options.excluded_nodes.push(node);
        }
    }

    dragged
        .iter()
        .map(|&node| -> Result<NodeSnapTargets> {
            let current = scene.node(node)?;
            if current.locked {
                return Err(SceneError::NodeLocked(node).into());
            }
            let moved = current.position + proposed_delta;
            let mut candidates = collect_snap_candidates(&moved, scene, &options)?;
            candidates.retain(|c| c.kind != SnapKind::AlignmentGuide);
            Ok(NodeSnapTargets { node, candidates })
        })
        .collect()
}

/// Finds one translation that snaps at least one dragged node without
/// distorting the group.
///
/// Each node's best target proposes a delta. Proposals are tried in
/// priority order (then closeness to `proposed_delta`). Under a proposal,
/// every node that comes within the landing tolerance of one of its own
/// targets lands on it; the proposal is accepted if the landed positions
/// keep every pairwise distance of `original`. Returns `None` when no
/// proposal survives, in which case the caller moves by `proposed_delta`.
#[must_use]
pub fn find_rigid_body_snap_delta(
    original: &[(NodeId, Point2)],
    proposed_delta: &Vector2,
    targets: &[NodeSnapTargets],
    config: &RigidBodyConfig,
) -> Option<RigidBodySnap> {
    let position_of = |node: NodeId| {
        original
            .iter()
            .find(|(n, _)| *n == node)
            .map(|(_, p)| *p)
    };

    let mut proposals: Vec<(NodeId, &SnapCandidate, Vector2)> = targets
        .iter()
        .filter_map(|t| {
            let best = t.candidates.iter().min_by(|a, b| SnapCandidate::rank(a, b))?;
            let from = position_of(t.node)?;
            Some((t.node, best, best.point - from))
        })
        .collect();
    proposals.sort_by(|a, b| {
        SnapCandidate::rank(a.1, b.1).then_with(|| {
            (a.2 - proposed_delta)
                .norm()
                .total_cmp(&(b.2 - proposed_delta).norm())
        })
    });

    for (anchor, candidate, delta) in proposals {
        let landed = land(original, &delta, targets, config.landing_tolerance);
        if keeps_shape(original, &landed, config.distance_tolerance) {
            let snapped_nodes: Vec<NodeId> = landed
                .iter()
                .filter(|l| l.snapped)
                .map(|l| l.node)
                .collect();
            debug!(
                ?anchor,
                kind = ?candidate.kind,
                snapped = snapped_nodes.len(),
                "rigid-body snap accepted"
            );
            return Some(RigidBodySnap {
                delta,
                anchor,
                snapped_nodes,
            });
        }
        trace!(?anchor, kind = ?candidate.kind, "rigid-body snap rejected");
    }
    None
}

/// The accepted snap delta, or `proposed_delta` when nothing validates.
#[must_use]
pub fn resolve_rigid_body_delta(
    original: &[(NodeId, Point2)],
    proposed_delta: &Vector2,
    targets: &[NodeSnapTargets],
    config: &RigidBodyConfig,
) -> Vector2 {
    find_rigid_body_snap_delta(original, proposed_delta, targets, config)
        .map_or(*proposed_delta, |snap| snap.delta)
}

struct Landing {
    node: NodeId,
    position: Point2,
    snapped: bool,
}

fn land(
    original: &[(NodeId, Point2)],
    delta: &Vector2,
    targets: &[NodeSnapTargets],
    tolerance: f64,
) -> Vec<Landing> {
    original
        .iter()
        .map(|&(node, from)| {
            let moved = from + delta;
            let hit = targets
                .iter()
                .filter(|t| t.node == node)
                .flat_map(|t| &t.candidates)
                .map(|c| (c.point, (c.point - moved).norm()))
                .filter(|(_, d)| *d <= tolerance)
                .min_by(|a, b| a.1.total_cmp(&b.1));
            match hit {
                Some((point, _)) => Landing {
                    node,
                    position: point,
                    snapped: true,
                },
                None => Landing {
                    node,
                    position: moved,
                    snapped: false,
                },
            }
        })
        .collect()
}

fn keeps_shape(original: &[(NodeId, Point2)], landed: &[Landing], tolerance: f64) -> bool {
    for i in 0..original.len() {
        for j in (i + 1)..original.len() {
            let before = (original[i].1 - original[j].1).norm();
            let after = (landed[i].position - landed[j].position).norm();
            if (before - after).abs() > tolerance {
                return false;
            }
        }
    }
    true
}
