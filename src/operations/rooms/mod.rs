mod cache;
mod half_edge;
mod identity;

pub use cache::RoomCache;
pub use half_edge::{Face, HalfEdge, HalfEdgeGraph};
pub use identity::{refresh_rooms, refresh_rooms_with};

use tracing::debug;

use crate::error::{OperationError, Result};
use crate::math::polygon_2d::{centroid_2d, perimeter_2d, signed_area_2d};
use crate::math::{points_coincide, Point2, TOLERANCE};
use crate::operations::miter::{JunctionTable, MiterConfig, Side};
use crate::operations::split::{split_walls_at_intersections_with, SplitConfig};
use crate::scene::{wall_signature, HalfEdgeId, Scene, WallId};

/// Tunables for room detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomDetectionConfig {
    /// Faces whose inner polygon is smaller than this are noise.
    pub min_area: f64,
    pub miter: MiterConfig,
    pub split: SplitConfig,
}

impl Default for RoomDetectionConfig {
    fn default() -> Self {
        Self {
            min_area: 10_000.0,
            miter: MiterConfig::default(),
            split: SplitConfig::default(),
        }
    }
}

impl RoomDetectionConfig {
    /// Creates a config with the given minimum room area.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` if `min_area` is negative.
    pub fn with_min_area(min_area: f64) -> Result<Self> {
        if min_area < 0.0 || !min_area.is_finite() {
            return Err(OperationError::InvalidInput(format!(
                "minimum room area must be non-negative, got {min_area}"
            ))
            .into());
        }
        Ok(Self {
            min_area,
            ..Self::default()
        })
    }
}

/// A room found by [`detect_rooms`], described in terms of the user's walls.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedRoom {
    /// Boundary walls in cycle order, each listed once.
    pub walls: Vec<WallId>,
    /// Directed boundary cycle; consecutive pieces of a split wall collapse
    /// into one entry.
    pub half_edges: Vec<HalfEdgeId>,
    /// Inner boundary polygon, counter-clockwise.
    pub polygon: Vec<Point2>,
    pub area: f64,
    pub perimeter: f64,
    pub centroid: Point2,
    /// Lowest floor raise among the boundary walls.
    pub elevation: f64,
}

impl DetectedRoom {
    /// Sorted boundary wall ids.
    #[must_use]
    pub fn signature(&self) -> Vec<WallId> {
        wall_signature(&self.walls)
    }
}

/// Finds every enclosed room of a scene, sorted by ascending area.
///
/// # Errors
///
/// Returns `SceneError::NodeNotFound` if a wall references a missing node.
pub fn detect_rooms(scene: &Scene) -> Result<Vec<DetectedRoom>> {
    detect_rooms_with(scene, &RoomDetectionConfig::default())
}

/// [`detect_rooms`] with explicit tolerances.
///
/// # Errors
///
/// Same conditions as [`detect_rooms`].
pub fn detect_rooms_with(scene: &Scene, config: &RoomDetectionConfig) -> Result<Vec<DetectedRoom>> {
    for (id, _) in scene.walls() {
        scene.wall_endpoints(id)?;
    }
    if scene.wall_count() < 3 {
        return Ok(Vec::new());
    }

    let split = split_walls_at_intersections_with(scene, &config.split);
    let graph = HalfEdgeGraph::build(&split)?;
    let junctions = JunctionTable::solve(&split, &config.miter)?;

    let faces = graph.interior_faces();
    let mut rooms = Vec::with_capacity(faces.len());
    let mut discarded = 0_usize;
    for face in &faces {
        let polygon = inner_polygon(&graph, face, &junctions)?;
        let area = signed_area_2d(&polygon);
        if area < config.min_area || area <= TOLERANCE {
            discarded += 1;
            continue;
        }
        rooms.push(describe(&split, &graph, face, polygon, area)?);
    }

    rooms.sort_by(|a, b| {
        a.area
            .total_cmp(&b.area)
            .then_with(|| a.signature().cmp(&b.signature()))
    });

    debug!(
        faces = faces.len(),
        rooms = rooms.len(),
        discarded,
        "room detection finished"
    );
    Ok(rooms)
}

/// Inner boundary of a face: at each vertex, the corner on the room-facing
/// side of the arriving wall, then of the leaving wall when the two differ.
fn inner_polygon(
    graph: &HalfEdgeGraph,
    face: &Face,
    junctions: &JunctionTable,
) -> Result<Vec<Point2>> {
    let edges = graph.edges();
    let cycle = &face.half_edges;
    let n = cycle.len();
    let mut polygon: Vec<Point2> = Vec::with_capacity(n);

    for k in 0..n {
        let incoming = &edges[cycle[(k + n - 1) % n]];
        let outgoing = &edges[cycle[k]];
        let junction = junctions.get(outgoing.origin)?;

        // The face lies left of every half-edge. Leaving the node that is
        // the outward left side; arriving, it is the outward right side.
        let arriving = junction.corner(incoming.id.wall, Side::Right);
        let leaving = junction.corner(outgoing.id.wall, Side::Left);

        match (arriving, leaving) {
            (Some(a), Some(l)) if !points_coincide(&a, &l, TOLERANCE.sqrt()) => {
                polygon.push(a);
                polygon.push(l);
            }
            (_, Some(p)) | (Some(p), None) => polygon.push(p),
            (None, None) => polygon.push(graph.origin_position(cycle[k])),
        }
    }

    Ok(polygon)
}

fn describe(
    split: &Scene,
    graph: &HalfEdgeGraph,
    face: &Face,
    polygon: Vec<Point2>,
    area: f64,
) -> Result<DetectedRoom> {
    let mut walls: Vec<WallId> = Vec::new();
    let mut half_edges: Vec<HalfEdgeId> = Vec::new();
    let mut elevation = f64::INFINITY;

    for &i in &face.half_edges {
        let id = graph.edges()[i].id;
        let wall = split.wall(id.wall)?;
        let source = wall.source_id(id.wall);
        elevation = elevation.min(wall.floor_raise);

        if !walls.contains(&source) {
            walls.push(source);
        }
        let mapped = HalfEdgeId::new(source, id.direction);
        if half_edges.last() != Some(&mapped) {
            half_edges.push(mapped);
        }
    }
    if half_edges.len() > 1 && half_edges.first() == half_edges.last() {
        half_edges.pop();
    }

    let perimeter = perimeter_2d(&polygon);
    let centroid = centroid_2d(&polygon).unwrap_or_else(Point2::origin);
    Ok(DetectedRoom {
        walls,
        half_edges,
        polygon,
        area,
        perimeter,
        centroid,
        elevation: if elevation.is_finite() { elevation } else { 0.0 },
    })
}
