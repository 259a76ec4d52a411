use std::collections::HashMap;

use tracing::debug;

use crate::error::Result;
use crate::scene::{Room, RoomId, Scene, WallId};

use super::{detect_rooms_with, DetectedRoom, RoomDetectionConfig};

impl Scene {
    /// Returns a copy of the scene whose rooms are `detected`.
    ///
    /// A detected room whose wall signature matches an existing room takes
    /// over that room's id, display number and custom label position. New
    /// rooms get the next display numbers in the order given (ascending
    /// area when coming from [`detect_rooms`](super::detect_rooms)). Old
    /// rooms without a match are dropped. Node and wall state, and so the
    /// revision, are unchanged.
    #[must_use]
    pub fn with_detected_rooms(&self, detected: &[DetectedRoom]) -> Scene {
        let mut by_signature: HashMap<Vec<WallId>, RoomId> = self
            .rooms()
            .map(|(id, room)| (room.signature(), id))
            .collect();

        let mut table = self.room_table().clone();
        let mut issued = self.room_numbers_issued();
        let mut kept: Vec<RoomId> = Vec::with_capacity(detected.len());
        let mut fresh: Vec<Room> = Vec::new();

        for found in detected {
            match by_signature.remove(&found.signature()) {
                Some(id) => {
                    if let Some(room) = table.get_mut(id) {
                        let number = room.number;
                        let label_position = room.label_position;
                        *room = to_room(found, number);
                        room.label_position = label_position;
                    }
                    kept.push(id);
                }
                None => {
                    issued += 1;
                    fresh.push(to_room(found, issued));
                }
            }
        }

        let before = table.len();
        table.retain(|id, _| kept.contains(&id));
        let dropped = before - table.len();
        let added = fresh.len();
        for room in fresh {
            table.insert(room);
        }

        debug!(
            kept = kept.len(),
            added, dropped, "room identities reconciled"
        );

        let mut scene = self.clone();
        scene.replace_rooms(table, issued);
        scene
    }
}

/// Re-runs room detection and reconciles the result into a copy of `scene`.
///
/// # Errors
///
/// Returns `SceneError::NodeNotFound` if a wall references a missing node.
pub fn refresh_rooms(scene: &Scene) -> Result<Scene> {
    refresh_rooms_with(scene, &RoomDetectionConfig::default())
}

/// [`refresh_rooms`] with explicit tolerances.
///
/// # Errors
///
/// Same conditions as [`refresh_rooms`].
pub fn refresh_rooms_with(scene: &Scene, config: &RoomDetectionConfig) -> Result<Scene> {
    let detected = detect_rooms_with(scene, config)?;
    Ok(scene.with_detected_rooms(&detected))
}

fn to_room(found: &DetectedRoom, number: u32) -> Room {
    Room {
        number,
        walls: found.walls.clone(),
        half_edges: found.half_edges.clone(),
        polygon: found.polygon.clone(),
        area: found.area,
        perimeter: found.perimeter,
        centroid: found.centroid,
        label_position: None,
        elevation: found.elevation,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;
    use crate::scene::NodeId;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    /// Two rooms side by side: 2000 and 4000 wide, sharing the wall at x = 2000.
    fn two_rooms() -> (Scene, Vec<NodeId>, Vec<WallId>) {
        let mut scene = Scene::new();
        let nodes: Vec<NodeId> = [
            (0.0, 0.0),
            (2000.0, 0.0),
            (6000.0, 0.0),
            (6000.0, 3000.0),
            (2000.0, 3000.0),
            (0.0, 3000.0),
        ]
        .iter()
        .map(|&(x, y)| scene.add_node(p(x, y)))
        .collect();
        let mut walls = Vec::new();
        for i in 0..6 {
            walls.push(scene.connect(nodes[i], nodes[(i + 1) % 6], 200.0).unwrap());
        }
        walls.push(scene.connect(nodes[1], nodes[4], 200.0).unwrap());
        (scene, nodes, walls)
    }

    #[test]
    fn numbers_follow_ascending_area() {
        let (scene, _, _) = two_rooms();
        let scene = refresh_rooms(&scene).unwrap();
        let mut rooms: Vec<&Room> = scene.rooms().map(|(_, r)| r).collect();
        rooms.sort_by_key(|r| r.number);
        assert_eq!(rooms.len(), 2);
        assert_eq!((rooms[0].number, rooms[1].number), (1, 2));
        assert!(rooms[0].area < rooms[1].area);
    }

    #[test]
    fn moving_a_node_keeps_ids_numbers_and_labels() {
        let (scene, nodes, _) = two_rooms();
        let mut scene = refresh_rooms(&scene).unwrap();
        let (id, _) = scene.rooms().find(|(_, r)| r.number == 2).unwrap();
        scene
            .set_room_label_position(id, Some(p(4000.0, 1000.0)))
            .unwrap();

        scene.move_node(nodes[3], p(6500.0, 3000.0)).unwrap();
        let scene = refresh_rooms(&scene).unwrap();

        let room = scene.room(id).unwrap();
        assert_eq!(room.number, 2);
        assert_eq!(room.label_position, Some(p(4000.0, 1000.0)));
        assert!(room.area > 3800.0 * 2800.0);
    }

    #[test]
    fn removing_the_divider_drops_both_and_issues_a_new_number() {
        let (scene, _, walls) = two_rooms();
        let mut scene = refresh_rooms(&scene).unwrap();
        scene.remove_wall(walls[6]).unwrap();
        let scene = refresh_rooms(&scene).unwrap();

        assert_eq!(scene.room_count(), 1);
        let (_, room) = scene.rooms().next().unwrap();
        assert_eq!(room.number, 3);
        assert_eq!(room.walls.len(), 6);
    }

    #[test]
    fn reconciliation_keeps_revision() {
        let (scene, _, _) = two_rooms();
        let refreshed = refresh_rooms(&scene).unwrap();
        assert_eq!(refreshed.revision(), scene.revision());
        assert_eq!(scene.room_count(), 0);
    }
}
