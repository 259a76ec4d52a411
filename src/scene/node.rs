use crate::math::Point2;

slotmap::new_key_type! {
    /// Unique identifier for a node in a scene.
    pub struct NodeId;
}

/// A shared endpoint of one or more walls.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    /// Planar position of the node.
    pub position: Point2,
    /// Locked nodes cannot be dragged; rigid-body snapping rejects them.
    pub locked: bool,
    /// Set on nodes inserted by wall splitting; never present in user scenes.
    pub synthetic: bool,
}

impl Node {
    /// Creates an unlocked node at the given position.
    #[must_use]
    pub fn new(position: Point2) -> Self {
        Self {
            position,
            locked: false,
            synthetic: false,
        }
    }

    /// Creates a node marked as inserted by wall splitting.
    #[must_use]
    pub fn synthetic(position: Point2) -> Self {
        Self {
            position,
            locked: false,
            synthetic: true,
        }
    }
}
