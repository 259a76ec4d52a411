use super::node::NodeId;

slotmap::new_key_type! {
    /// Unique identifier for a wall in a scene.
    pub struct WallId;
}

/// A thick straight wall between two nodes.
///
/// The centerline runs from `node_a` to `node_b`; the order matters because
/// it fixes which side is "left" when offsetting by half the thickness.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Wall {
    pub node_a: NodeId,
    pub node_b: NodeId,
    pub thickness: f64,
    pub height: f64,
    /// Elevation of the wall base above the floor.
    pub floor_raise: f64,
    /// For sub-walls produced by splitting: the user wall this piece came from.
    pub origin: Option<WallId>,
}

impl Wall {
    /// Default wall height in scene units.
    pub const DEFAULT_HEIGHT: f64 = 2500.0;

    /// Creates a wall with default height and no floor raise.
    #[must_use]
    pub fn new(node_a: NodeId, node_b: NodeId, thickness: f64) -> Self {
        Self {
            node_a,
            node_b,
            thickness,
            height: Self::DEFAULT_HEIGHT,
            floor_raise: 0.0,
            origin: None,
        }
    }

    /// Returns half the wall thickness.
    #[must_use]
    pub fn half_thickness(&self) -> f64 {
        self.thickness * 0.5
    }

    /// Returns `true` if the wall has `node` as one of its endpoints.
    #[must_use]
    pub fn touches(&self, node: NodeId) -> bool {
        self.node_a == node || self.node_b == node
    }

    /// Returns the endpoint opposite to `node`, if `node` is an endpoint.
    #[must_use]
    pub fn other_end(&self, node: NodeId) -> Option<NodeId> {
        if self.node_a == node {
            Some(self.node_b)
        } else if self.node_b == node {
            Some(self.node_a)
        } else {
            None
        }
    }

    /// Returns `true` if both walls share at least one endpoint.
    #[must_use]
    pub fn shares_node_with(&self, other: &Wall) -> bool {
        self.touches(other.node_a) || self.touches(other.node_b)
    }

    /// The user-facing wall id: the originating wall for split pieces,
    /// `id` itself otherwise.
    #[must_use]
    pub fn source_id(&self, id: WallId) -> WallId {
        self.origin.unwrap_or(id)
    }
}

/// Traversal direction of a wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// From `node_a` to `node_b`.
    Forward,
    /// From `node_b` to `node_a`.
    Backward,
}

impl Direction {
    /// The opposite direction.
    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

/// Identifier of one directed traversal of a wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HalfEdgeId {
    pub wall: WallId,
    pub direction: Direction,
}

impl HalfEdgeId {
    #[must_use]
    pub fn new(wall: WallId, direction: Direction) -> Self {
        Self { wall, direction }
    }

    /// The half-edge of the same wall running the other way.
    #[must_use]
    pub fn twin(self) -> Self {
        Self {
            wall: self.wall,
            direction: self.direction.reversed(),
        }
    }
}
