//! Snapping for interactive edits.
//!
//! A cursor position is matched against the scene's nodes, wall midpoints,
//! wall centerlines, a grid, and axis-aligned guidelines through every node.
//! Every qualifying candidate carries a [`Priority`]; the highest priority
//! wins and ties go to the candidate nearest the cursor on screen.
//!
//! With an [`AngleConstraint`] active the cursor is first projected onto the
//! nearest angle ray. Candidates off that ray are dropped and the rest move
//! to the [`SnapTier::AngleConstrained`] tier, above the bare ray point.

mod candidates;
mod rigid;

pub use candidates::{collect_snap_candidates, display_candidates, find_snap_candidate};
pub use rigid::{
    find_rigid_body_snap_delta, resolve_rigid_body_delta, rigid_body_snap_targets,
    NodeSnapTargets, RigidBodyConfig, RigidBodySnap,
};

use crate::error::{OperationError, Result};
use crate::math::{Point2, Vector2, TOLERANCE};
use crate::scene::{NodeId, WallId};

/// Maximum distance from the angle ray for a candidate to count as on it.
pub const ANGLE_RAY_TOLERANCE: f64 = 1.0;

/// Candidates whose points are this close are drawn as one marker.
pub const DISPLAY_MERGE_TOLERANCE: f64 = 1.0;

/// Fraction of a wall's length at each end where edge snapping is off.
pub const EDGE_END_MARGIN: f64 = 0.05;

/// What a snap candidate locks onto, lowest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SnapKind {
    /// The cursor projected onto the active angle ray.
    AngleRay,
    /// A horizontal or vertical line through another node.
    AlignmentGuide,
    /// A grid lattice point.
    Grid,
    /// Perpendicular foot on a wall centerline.
    Edge,
    /// Midpoint of a wall centerline.
    Midpoint,
    /// Crossing of a horizontal and a vertical guideline.
    GuideIntersection,
    /// An existing node.
    Node,
}

impl SnapKind {
    /// Every kind, lowest priority first.
    pub const ALL: [SnapKind; 7] = [
        SnapKind::AngleRay,
        SnapKind::AlignmentGuide,
        SnapKind::Grid,
        SnapKind::Edge,
        SnapKind::Midpoint,
        SnapKind::GuideIntersection,
        SnapKind::Node,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Priority tier, orthogonal to [`SnapKind`]. Any angle-constrained
/// candidate outranks every free one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SnapTier {
    Free,
    AngleConstrained,
}

/// Total snap priority, compared tier first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority {
    pub tier: SnapTier,
    pub kind: SnapKind,
}

/// Set of enabled snap kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SnapMask {
    bits: u8,
}

impl SnapMask {
    pub const NONE: SnapMask = SnapMask { bits: 0 };
    pub const ALL: SnapMask = SnapMask { bits: 0x7F };

    #[must_use]
    pub fn is_enabled(self, kind: SnapKind) -> bool {
        self.bits & kind.bit() != 0
    }

    pub fn set(&mut self, kind: SnapKind, enabled: bool) {
        if enabled {
            self.bits |= kind.bit();
        } else {
            self.bits &= !kind.bit();
        }
    }

    /// Returns the mask with `kind` switched on or off.
    #[must_use]
    pub fn with(mut self, kind: SnapKind, enabled: bool) -> Self {
        self.set(kind, enabled);
        self
    }
}

impl Default for SnapMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Orientation of a guideline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GuideAxis {
    /// `y = through.y`
    Horizontal,
    /// `x = through.x`
    Vertical,
}

/// An axis-aligned line through a node.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Guideline {
    pub axis: GuideAxis,
    pub through: Point2,
    pub node: NodeId,
    /// Drawn without its own label because a guide intersection owns it.
    pub visual_only: bool,
}

impl Guideline {
    pub(crate) fn new(axis: GuideAxis, through: Point2, node: NodeId) -> Self {
        Self {
            axis,
            through,
            node,
            visual_only: false,
        }
    }

    /// Coordinate that is constant along the line.
    #[must_use]
    pub fn offset(&self) -> f64 {
        match self.axis {
            GuideAxis::Horizontal => self.through.y,
            GuideAxis::Vertical => self.through.x,
        }
    }

    /// Orthogonal projection of `p` onto the line.
    #[must_use]
    pub fn project(&self, p: &Point2) -> Point2 {
        match self.axis {
            GuideAxis::Horizontal => Point2::new(p.x, self.through.y),
            GuideAxis::Vertical => Point2::new(self.through.x, p.y),
        }
    }

    /// Whether `other` is the same line.
    #[must_use]
    pub fn same_line(&self, other: &Guideline) -> bool {
        self.axis == other.axis && (self.offset() - other.offset()).abs() <= TOLERANCE
    }
}

/// A proposed position for a dragged point.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SnapCandidate {
    pub kind: SnapKind,
    pub tier: SnapTier,
    pub point: Point2,
    /// Screen distance in pixels from the cursor (or from the angle-ray point).
    pub distance: f64,
    pub node: Option<NodeId>,
    pub wall: Option<WallId>,
    /// Guidelines this candidate lies on.
    pub guidelines: Vec<Guideline>,
}

impl SnapCandidate {
    pub(crate) fn new(kind: SnapKind, point: Point2, distance: f64) -> Self {
        Self {
            kind,
            tier: SnapTier::Free,
            point,
            distance,
            node: None,
            wall: None,
            guidelines: Vec::new(),
        }
    }

    #[must_use]
    pub fn priority(&self) -> Priority {
        Priority {
            tier: self.tier,
            kind: self.kind,
        }
    }

    /// Ordering that puts the winning candidate first.
    pub(crate) fn rank(a: &SnapCandidate, b: &SnapCandidate) -> std::cmp::Ordering {
        b.priority()
            .cmp(&a.priority())
            .then_with(|| a.distance.total_cmp(&b.distance))
    }
}

/// Constrains the cursor to rays from `origin` at multiples of `step`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AngleConstraint {
    pub origin: Point2,
    /// Angle increment in radians.
    pub step: f64,
}

impl AngleConstraint {
    /// 15° increments around `origin`.
    #[must_use]
    pub fn new(origin: Point2) -> Self {
        Self {
            origin,
            step: 15_f64.to_radians(),
        }
    }

    /// Increments of `step` radians around `origin`.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` if `step` is not positive.
    pub fn with_step(origin: Point2, step: f64) -> Result<Self> {
        if step <= 0.0 || !step.is_finite() {
            return Err(OperationError::InvalidInput(format!(
                "angle step must be positive, got {step}"
            ))
            .into());
        }
        Ok(Self { origin, step })
    }

    /// Unit direction of the ray nearest to `p`, or `None` if `p` sits on
    /// the origin.
    #[must_use]
    pub fn ray_direction(&self, p: &Point2) -> Option<Vector2> {
        let v = p - self.origin;
        if v.norm() <= TOLERANCE {
            return None;
        }
        let angle = (v.y.atan2(v.x) / self.step).round() * self.step;
        Some(Vector2::new(angle.cos(), angle.sin()))
    }

    /// Projection of `p` onto its nearest ray.
    #[must_use]
    pub fn constrain(&self, p: &Point2) -> Option<Point2> {
        let dir = self.ray_direction(p)?;
        Some(self.origin + dir * (p - self.origin).dot(&dir).max(0.0))
    }
}

/// Inputs to snapping besides the scene and cursor.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SnapOptions {
    /// Snap radius in screen pixels.
    pub tolerance_px: f64,
    /// Current view scale.
    pub pixels_per_unit: f64,
    /// Grid spacing in scene units, `None` for no grid.
    pub grid: Option<f64>,
    /// Nodes being dragged; they and their walls are not snap targets.
    pub excluded_nodes: Vec<NodeId>,
    pub mask: SnapMask,
    pub angle: Option<AngleConstraint>,
}

impl Default for SnapOptions {
    fn default() -> Self {
        Self {
            tolerance_px: 10.0,
            pixels_per_unit: 0.1,
            grid: Some(100.0),
            excluded_nodes: Vec::new(),
            mask: SnapMask::default(),
            angle: None,
        }
    }
}

impl SnapOptions {
    /// Options with the given screen tolerance and view scale.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` if either value is not
    /// positive.
    pub fn new(tolerance_px: f64, pixels_per_unit: f64) -> Result<Self> {
        for (name, value) in [("tolerance", tolerance_px), ("scale", pixels_per_unit)] {
            if value <= 0.0 || !value.is_finite() {
                return Err(
                    OperationError::InvalidInput(format!("{name} must be positive, got {value}"))
                        .into(),
                );
            }
        }
        Ok(Self {
            tolerance_px,
            pixels_per_unit,
            ..Self::default()
        })
    }

    /// Sets the grid spacing.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` if `spacing` is not positive.
    pub fn with_grid(mut self, spacing: f64) -> Result<Self> {
        if spacing <= 0.0 || !spacing.is_finite() {
            return Err(OperationError::InvalidInput(format!(
                "grid spacing must be positive, got {spacing}"
            ))
            .into());
        }
        self.grid = Some(spacing);
        Ok(self)
    }

    /// Snap radius in scene units.
    #[must_use]
    pub fn tolerance_units(&self) -> f64 {
        self.tolerance_px / self.pixels_per_unit
    }

    fn to_px(&self, distance: f64) -> f64 {
        distance * self.pixels_per_unit
    }

    fn excludes(&self, node: NodeId) -> bool {
        self.excluded_nodes.contains(&node)
    }
}

/// Outcome of [`find_snap_candidate`].
#[derive(Debug, Clone, PartialEq)]
pub struct SnapResult {
    /// Whether `point` came from a snap target.
    pub snapped: bool,
    /// Where the dragged point goes: the winner, the angle-ray point, or the
    /// cursor itself.
    pub point: Point2,
    pub candidate: Option<SnapCandidate>,
}
