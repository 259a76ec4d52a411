use crate::math::Point2;

use super::wall::{HalfEdgeId, WallId};

slotmap::new_key_type! {
    /// Unique identifier for a room in a scene.
    pub struct RoomId;
}

/// An enclosed room derived from the wall graph.
///
/// Everything except `label_position` is recomputed by room detection.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Room {
    /// Display number, stable across recomputations that keep the topology.
    pub number: u32,
    /// Boundary walls in cycle order, each listed once.
    pub walls: Vec<WallId>,
    /// Directed cycle around the room in terms of the user's walls.
    pub half_edges: Vec<HalfEdgeId>,
    /// Inner (thickness-aware) boundary polygon, counter-clockwise.
    pub polygon: Vec<Point2>,
    /// Area of the inner polygon.
    pub area: f64,
    /// Perimeter of the inner polygon.
    pub perimeter: f64,
    /// Centroid of the inner polygon.
    pub centroid: Point2,
    /// User-placed label position overriding the centroid.
    pub label_position: Option<Point2>,
    pub elevation: f64,
}

impl Room {
    /// Sorted boundary wall ids; rooms with equal signatures are the same room.
    #[must_use]
    pub fn signature(&self) -> Vec<WallId> {
        wall_signature(&self.walls)
    }

    /// Where the room label is drawn.
    #[must_use]
    pub fn label_anchor(&self) -> Point2 {
        self.label_position.unwrap_or(self.centroid)
    }
}

/// Builds the order-independent identity signature of a wall set.
#[must_use]
pub fn wall_signature(walls: &[WallId]) -> Vec<WallId> {
    let mut sig = walls.to_vec();
    sig.sort_unstable();
    sig.dedup();
    sig
}
