use crate::error::Result;
use crate::math::{left_normal, Point2, Vector2, TOLERANCE};
use crate::scene::{NodeId, Scene, WallId};

/// Side of an offset edge, relative to a wall's outward direction at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

/// A finite offset edge running from next to the junction node out to the
/// wall's far end.
#[derive(Debug, Clone, Copy)]
pub struct OffsetEdge {
    pub start: Point2,
    pub end: Point2,
}

/// One wall as seen from a junction node.
#[derive(Debug, Clone)]
pub struct Arm {
    pub wall: WallId,
    /// Unit direction from the node towards the wall's far end.
    pub dir: Vector2,
    pub thickness: f64,
    /// `false` for zero-length walls; such arms never take part in
    /// intersection tests.
    pub has_length: bool,
    pub left: OffsetEdge,
    pub right: OffsetEdge,
}

impl Arm {
    #[must_use]
    pub fn edge(&self, side: Side) -> &OffsetEdge {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

/// Builds the arm of `wall` at `node`.
///
/// Offset edges are shifted by half the wall thickness along the left normal
/// of the outward direction. Zero-length walls fall back to the +X direction
/// so that their butt points are still defined.
///
/// # Errors
///
/// Returns a not-found error if the wall or its nodes are missing.
pub fn build_arm(scene: &Scene, node: NodeId, wall_id: WallId) -> Result<Arm> {
    let wall = scene.wall(wall_id)?;
    let origin = scene.node_position(node)?;
    let far_id = wall
        .other_end(node)
        .ok_or(crate::error::SceneError::NodeNotFound(node))?;
    let far = scene.node_position(far_id)?;

    let d = far - origin;
    let len = d.norm();
    let (dir, has_length) = if len > TOLERANCE {
        (d / len, true)
    } else {
        (Vector2::new(1.0, 0.0), false)
    };

    let half = wall.half_thickness();
    let ln = left_normal(&dir);

    Ok(Arm {
        wall: wall_id,
        dir,
        thickness: wall.thickness,
        has_length,
        left: OffsetEdge {
            start: origin + ln * half,
            end: far + ln * half,
        },
        right: OffsetEdge {
            start: origin - ln * half,
            end: far - ln * half,
        },
    })
}

/// Builds one arm per wall incident to `node`, in slot order.
///
/// # Errors
///
/// Returns a not-found error if the node or an incident wall's far node is
/// missing.
pub fn build_arms(scene: &Scene, node: NodeId) -> Result<Vec<Arm>> {
    scene.node(node)?;
    scene
        .incident_walls(node)
        .into_iter()
        .map(|w| build_arm(scene, node, w))
        .collect()
}
