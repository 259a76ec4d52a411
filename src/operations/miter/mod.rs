mod corner;
mod junction;
mod offset_edges;

pub use corner::{Apex, EdgeCorner};
pub use junction::{solve_junction, Junction, MiterConfig};
pub use offset_edges::{Arm, OffsetEdge, Side};

use slotmap::SecondaryMap;
use tracing::debug;

use crate::error::{Result, SceneError};
use crate::math::Point2;
use crate::scene::{NodeId, Scene, WallId};

/// Builds the mitered outline of one wall.
///
/// The outline is `[A_left, A_apex?, A_right, B_right, B_apex?, B_left]`,
/// with left/right taken in the wall's own A→B frame, so the ring is
/// counter-clockwise. Corners that cannot be mitered fall back to the butt
/// joint.
///
/// # Errors
///
/// Returns a not-found error if the wall or one of the nodes it (or a
/// neighbouring wall) references is missing.
pub fn build_wall_polygon(wall: WallId, scene: &Scene) -> Result<Vec<Point2>> {
    build_wall_polygon_with(wall, scene, &MiterConfig::default())
}

/// [`build_wall_polygon`] with explicit tolerances.
///
/// # Errors
///
/// Same conditions as [`build_wall_polygon`].
pub fn build_wall_polygon_with(
    wall_id: WallId,
    scene: &Scene,
    config: &MiterConfig,
) -> Result<Vec<Point2>> {
    let wall = scene.wall(wall_id)?;
    let at_a = solve_junction(scene, wall.node_a, config)?;
    let at_b = solve_junction(scene, wall.node_b, config)?;
    Ok(assemble(wall_id, &at_a, &at_b))
}

/// Builds outlines for every wall in slot order, solving each junction once.
///
/// # Errors
///
/// Returns a not-found error if any wall references a missing node.
pub fn build_wall_polygons(scene: &Scene) -> Result<Vec<(WallId, Vec<Point2>)>> {
    build_wall_polygons_with(scene, &MiterConfig::default())
}

/// [`build_wall_polygons`] with explicit tolerances.
///
/// # Errors
///
/// Same conditions as [`build_wall_polygons`].
pub fn build_wall_polygons_with(
    scene: &Scene,
    config: &MiterConfig,
) -> Result<Vec<(WallId, Vec<Point2>)>> {
    let junctions = JunctionTable::solve(scene, config)?;
    scene
        .walls()
        .map(|(id, wall)| {
            let at_a = junctions.get(wall.node_a)?;
            let at_b = junctions.get(wall.node_b)?;
            Ok((id, assemble(id, at_a, at_b)))
        })
        .collect()
}

/// Junction solutions for every node of a scene.
#[derive(Debug, Clone)]
pub struct JunctionTable {
    junctions: SecondaryMap<NodeId, Junction>,
}

impl JunctionTable {
    /// Solves every node of the scene.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if any wall references a missing node.
    pub fn solve(scene: &Scene, config: &MiterConfig) -> Result<Self> {
        let mut junctions = SecondaryMap::new();
        for (id, _) in scene.nodes() {
            junctions.insert(id, solve_junction(scene, id, config)?);
        }
        Ok(Self { junctions })
    }

    /// Junction at `node`.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::NodeNotFound` if the node was not in the scene.
    pub fn get(&self, node: NodeId) -> Result<&Junction> {
        self.junctions
            .get(node)
            .ok_or_else(|| SceneError::NodeNotFound(node).into())
    }
}

fn assemble(wall: WallId, at_a: &Junction, at_b: &Junction) -> Vec<Point2> {
    // At B the outward direction is reversed, so the wall's right side is
    // the junction's left side.
    let corners = [
        at_a.corner(wall, Side::Left),
        at_a.corner(wall, Side::Right),
        at_b.corner(wall, Side::Left),
        at_b.corner(wall, Side::Right),
    ];
    let [Some(a_left), Some(a_right), Some(b_right), Some(b_left)] = corners else {
        // Both junctions were built from the wall's own endpoints.
        debug!(?wall, "wall missing from its own junctions");
        return Vec::new();
    };

    let mut polygon = Vec::with_capacity(6);
    polygon.push(a_left);
    polygon.extend(at_a.apex(wall));
    polygon.push(a_right);
    polygon.push(b_right);
    polygon.extend(at_b.apex(wall));
    polygon.push(b_left);
    polygon
}
