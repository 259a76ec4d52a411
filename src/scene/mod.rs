pub mod node;
pub mod room;
pub mod wall;

pub use node::{Node, NodeId};
pub use room::{wall_signature, Room, RoomId};
pub use wall::{Direction, HalfEdgeId, Wall, WallId};

use std::sync::atomic::{AtomicU64, Ordering};

use slotmap::SlotMap;

use crate::error::SceneError;
use crate::math::{Point2, Vector2, TOLERANCE};

/// Source of revision stamps. Shared by every scene so that two scenes with
/// the same stamp are copies of the same edit state.
static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

fn fresh_revision() -> u64 {
    NEXT_REVISION.fetch_add(1, Ordering::Relaxed)
}

/// Central arena that owns every node, wall and room of a floor plan.
///
/// Entities reference each other via typed IDs (generational indices).
/// Engine entry points only ever borrow a `Scene`; the owning application
/// clones it to snapshot undo states.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scene {
    nodes: SlotMap<NodeId, Node>,
    walls: SlotMap<WallId, Wall>,
    rooms: SlotMap<RoomId, Room>,
    /// Re-stamped whenever node or wall state changes. Stamps are only
    /// meaningful inside one process, so a loaded scene gets a new one.
    #[cfg_attr(feature = "serde", serde(skip, default = "fresh_revision"))]
    revision: u64,
    /// Display numbers handed out so far.
    room_numbers_issued: u32,
}

impl Scene {
    /// Creates a new, empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Topology revision: re-stamped on every node/wall edit, never on room
    /// label edits. Stamps are unique across scenes, so this is a sound
    /// memoization key even across undo snapshots.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = fresh_revision();
    }

    // --- Node operations ---

    /// Inserts a node at `position` and returns its ID.
    pub fn add_node(&mut self, position: Point2) -> NodeId {
        self.touch();
        self.nodes.insert(Node::new(position))
    }

    /// Inserts a node without re-stamping the revision. Only for derived
    /// scenes whose geometry is a pure function of the stamped one.
    pub(crate) fn insert_node_untracked(&mut self, node: Node) -> NodeId {
        self.nodes.insert(node)
    }

    /// Returns a reference to the node, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::NodeNotFound` if the id is stale.
    pub fn node(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.nodes.get(id).ok_or(SceneError::NodeNotFound(id))
    }

    /// Returns the position of a node.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::NodeNotFound` if the id is stale.
    pub fn node_position(&self, id: NodeId) -> Result<Point2, SceneError> {
        self.node(id).map(|n| n.position)
    }

    /// Iterates over all nodes in slot order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Moves a node to a new position.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::NodeNotFound` if the id is stale.
    pub fn move_node(&mut self, id: NodeId, position: Point2) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(id).ok_or(SceneError::NodeNotFound(id))?;
        node.position = position;
        self.touch();
        Ok(())
    }

    /// Sets or clears the lock flag of a node.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::NodeNotFound` if the id is stale.
    pub fn set_node_locked(&mut self, id: NodeId, locked: bool) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(id).ok_or(SceneError::NodeNotFound(id))?;
        node.locked = locked;
        Ok(())
    }

    /// Removes a node together with every wall attached to it.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::NodeNotFound` if the id is stale.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, SceneError> {
        let node = self.nodes.remove(id).ok_or(SceneError::NodeNotFound(id))?;
        self.walls.retain(|_, w| !w.touches(id));
        self.touch();
        Ok(node)
    }

    /// Merges `from` into `into`: walls attached to `from` are rewired to
    /// `into`, walls that collapse to a single node or duplicate an existing
    /// wall between the same pair of nodes are deleted, and `from` is removed.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::NodeNotFound` if either id is stale.
    pub fn merge_nodes(&mut self, from: NodeId, into: NodeId) -> Result<(), SceneError> {
        self.node(from)?;
        self.node(into)?;
        if from == into {
            return Ok(());
        }

        for wall in self.walls.values_mut() {
            if wall.node_a == from {
                wall.node_a = into;
            }
            if wall.node_b == from {
                wall.node_b = into;
            }
        }

        let mut seen: Vec<(NodeId, NodeId)> = Vec::new();
        self.walls.retain(|_, w| {
            if w.node_a == w.node_b {
                return false;
            }
            let key = if w.node_a < w.node_b {
                (w.node_a, w.node_b)
            } else {
                (w.node_b, w.node_a)
            };
            if seen.contains(&key) {
                return false;
            }
            seen.push(key);
            true
        });

        self.nodes.remove(from);
        self.touch();
        Ok(())
    }

    /// Removes every node that no wall references. Returns the removed ids.
    pub fn remove_orphan_nodes(&mut self) -> Vec<NodeId> {
        let orphans: Vec<NodeId> = self
            .nodes
            .keys()
            .filter(|&id| !self.walls.values().any(|w| w.touches(id)))
            .collect();
        for &id in &orphans {
            self.nodes.remove(id);
        }
        if !orphans.is_empty() {
            self.touch();
        }
        orphans
    }

    // --- Wall operations ---

    /// Inserts a wall between two existing nodes and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if either node is missing, both ends are the same
    /// node, or the thickness is not positive.
    pub fn add_wall(&mut self, wall: Wall) -> Result<WallId, SceneError> {
        let id = self.insert_wall_untracked(wall)?;
        self.touch();
        Ok(id)
    }

    /// [`Scene::add_wall`] without re-stamping the revision.
    pub(crate) fn insert_wall_untracked(&mut self, wall: Wall) -> Result<WallId, SceneError> {
        self.node(wall.node_a)?;
        self.node(wall.node_b)?;
        if wall.node_a == wall.node_b {
            return Err(SceneError::DegenerateWall(wall.node_a));
        }
        if wall.thickness <= 0.0 || !wall.thickness.is_finite() {
            return Err(SceneError::InvalidThickness(wall.thickness));
        }
        Ok(self.walls.insert(wall))
    }

    /// Convenience: inserts a wall of the given thickness between two nodes.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Scene::add_wall`].
    pub fn connect(
        &mut self,
        node_a: NodeId,
        node_b: NodeId,
        thickness: f64,
    ) -> Result<WallId, SceneError> {
        self.add_wall(Wall::new(node_a, node_b, thickness))
    }

    /// Returns a reference to the wall, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::WallNotFound` if the id is stale.
    pub fn wall(&self, id: WallId) -> Result<&Wall, SceneError> {
        self.walls.get(id).ok_or(SceneError::WallNotFound(id))
    }

    /// Iterates over all walls in slot order.
    pub fn walls(&self) -> impl Iterator<Item = (WallId, &Wall)> {
        self.walls.iter()
    }

    /// Number of walls.
    #[must_use]
    pub fn wall_count(&self) -> usize {
        self.walls.len()
    }

    /// Removes a wall. Its nodes are kept; see [`Scene::remove_orphan_nodes`].
    ///
    /// # Errors
    ///
    /// Returns `SceneError::WallNotFound` if the id is stale.
    pub fn remove_wall(&mut self, id: WallId) -> Result<Wall, SceneError> {
        let wall = self.remove_wall_untracked(id)?;
        self.touch();
        Ok(wall)
    }

    pub(crate) fn remove_wall_untracked(&mut self, id: WallId) -> Result<Wall, SceneError> {
        self.walls.remove(id).ok_or(SceneError::WallNotFound(id))
    }

    /// Returns the centerline endpoints `(a, b)` of a wall.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the wall or one of its nodes is missing.
    pub fn wall_endpoints(&self, id: WallId) -> Result<(Point2, Point2), SceneError> {
        let wall = self.wall(id)?;
        Ok((
            self.node_position(wall.node_a)?,
            self.node_position(wall.node_b)?,
        ))
    }

    /// Centerline length of a wall.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the wall or one of its nodes is missing.
    pub fn wall_length(&self, id: WallId) -> Result<f64, SceneError> {
        let (a, b) = self.wall_endpoints(id)?;
        Ok((b - a).norm())
    }

    /// Unit direction of a wall as seen leaving `node`, or `None` for
    /// zero-length walls.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the wall or its nodes are missing, or if
    /// `node` is not an endpoint of the wall.
    pub fn wall_direction_from(
        &self,
        id: WallId,
        node: NodeId,
    ) -> Result<Option<Vector2>, SceneError> {
        let wall = self.wall(id)?;
        let far = wall.other_end(node).ok_or(SceneError::NodeNotFound(node))?;
        let d = self.node_position(far)? - self.node_position(node)?;
        let len = d.norm();
        Ok((len > TOLERANCE).then(|| d / len))
    }

    /// Walls that have `node` as an endpoint, in slot order.
    #[must_use]
    pub fn incident_walls(&self, node: NodeId) -> Vec<WallId> {
        self.walls
            .iter()
            .filter(|(_, w)| w.touches(node))
            .map(|(id, _)| id)
            .collect()
    }

    // --- Room operations ---

    /// Returns a reference to the room, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::RoomNotFound` if the id is stale.
    pub fn room(&self, id: RoomId) -> Result<&Room, SceneError> {
        self.rooms.get(id).ok_or(SceneError::RoomNotFound(id))
    }

    /// Iterates over all rooms in slot order.
    pub fn rooms(&self) -> impl Iterator<Item = (RoomId, &Room)> {
        self.rooms.iter()
    }

    /// Number of rooms.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Overrides (or with `None`, resets) where a room's label is drawn.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::RoomNotFound` if the id is stale.
    pub fn set_room_label_position(
        &mut self,
        id: RoomId,
        position: Option<Point2>,
    ) -> Result<(), SceneError> {
        let room = self.rooms.get_mut(id).ok_or(SceneError::RoomNotFound(id))?;
        room.label_position = position;
        Ok(())
    }

    pub(crate) fn room_table(&self) -> &SlotMap<RoomId, Room> {
        &self.rooms
    }

    pub(crate) fn room_numbers_issued(&self) -> u32 {
        self.room_numbers_issued
    }

    pub(crate) fn replace_rooms(&mut self, rooms: SlotMap<RoomId, Room>, numbers_issued: u32) {
        self.rooms = rooms;
        self.room_numbers_issued = numbers_issued;
    }
}
