use slotmap::SecondaryMap;

use crate::error::Result;
use crate::math::polygon_2d::signed_area_2d;
use crate::math::{Point2, TOLERANCE};
use crate::scene::{Direction, HalfEdgeId, NodeId, Scene};

/// One directed traversal of a wall.
#[derive(Debug, Clone)]
pub struct HalfEdge {
    pub id: HalfEdgeId,
    pub origin: NodeId,
    pub target: NodeId,
    /// Index of the opposite-direction half-edge of the same wall.
    pub twin: usize,
    /// Index of the following half-edge on the same face.
    pub next: usize,
    /// Index of the preceding half-edge on the same face.
    pub prev: usize,
}

/// A closed cycle of half-edges. Interior faces run counter-clockwise.
#[derive(Debug, Clone)]
pub struct Face {
    /// Half-edge indices in walk order.
    pub half_edges: Vec<usize>,
    /// Shoelace area of the centerline cycle.
    pub signed_area: f64,
}

/// Directed half-edge structure over a wall graph.
///
/// The face to the left of every half-edge is the one it bounds.
#[derive(Debug, Clone)]
pub struct HalfEdgeGraph {
    edges: Vec<HalfEdge>,
    positions: SecondaryMap<NodeId, Point2>,
}

impl HalfEdgeGraph {
    /// Builds the half-edge structure of a scene.
    ///
    /// Zero-length walls are skipped.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::NodeNotFound` if a wall references a missing node.
    pub fn build(scene: &Scene) -> Result<Self> {
        let mut positions = SecondaryMap::new();
        for (id, node) in scene.nodes() {
            positions.insert(id, node.position);
        }

        let mut edges: Vec<HalfEdge> = Vec::new();
        for (id, wall) in scene.walls() {
            let (a, b) = scene.wall_endpoints(id)?;
            if (b - a).norm() <= TOLERANCE {
                continue;
            }
            let forward = edges.len();
            edges.push(HalfEdge {
                id: HalfEdgeId::new(id, Direction::Forward),
                origin: wall.node_a,
                target: wall.node_b,
                twin: forward + 1,
                next: forward,
                prev: forward,
            });
            edges.push(HalfEdge {
                id: HalfEdgeId::new(id, Direction::Backward),
                origin: wall.node_b,
                target: wall.node_a,
                twin: forward,
                next: forward + 1,
                prev: forward + 1,
            });
        }

        let mut graph = Self { edges, positions };
        graph.link();
        Ok(graph)
    }

    /// Links `next`/`prev`: at each node outgoing half-edges are sorted
    /// counter-clockwise, and a half-edge arriving at a node continues along
    /// the outgoing half-edge just clockwise of its twin.
    fn link(&mut self) {
        let mut outgoing: SecondaryMap<NodeId, Vec<(f64, usize)>> = SecondaryMap::new();
        for (i, e) in self.edges.iter().enumerate() {
            let angle = self.angle_of(e);
            match outgoing.get_mut(e.origin) {
                Some(list) => list.push((angle, i)),
                None => {
                    outgoing.insert(e.origin, vec![(angle, i)]);
                }
            }
        }

        for list in outgoing.values_mut() {
            list.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            let n = list.len();
            for k in 0..n {
                let out = list[k].1;
                let incoming = self.edges[out].twin;
                let next = list[(k + n - 1) % n].1;
                self.edges[incoming].next = next;
                self.edges[next].prev = incoming;
            }
        }
    }

    fn angle_of(&self, e: &HalfEdge) -> f64 {
        let a = self.positions.get(e.origin).copied().unwrap_or_else(Point2::origin);
        let b = self.positions.get(e.target).copied().unwrap_or_else(Point2::origin);
        (b.y - a.y).atan2(b.x - a.x)
    }

    /// All half-edges, forward/backward pairs in wall slot order.
    #[must_use]
    pub fn edges(&self) -> &[HalfEdge] {
        &self.edges
    }

    /// Position of a half-edge's origin node.
    #[must_use]
    pub fn origin_position(&self, edge: usize) -> Point2 {
        self.positions
            .get(self.edges[edge].origin)
            .copied()
            .unwrap_or_else(Point2::origin)
    }

    /// Walks every cycle of the structure. Each half-edge belongs to exactly
    /// one face.
    #[must_use]
    pub fn faces(&self) -> Vec<Face> {
        let mut visited = vec![false; self.edges.len()];
        let mut faces = Vec::new();

        for start in 0..self.edges.len() {
            if visited[start] {
                continue;
            }
            let mut cycle = Vec::new();
            let mut e = start;
            loop {
                visited[e] = true;
                cycle.push(e);
                e = self.edges[e].next;
                if e == start || visited[e] {
                    break;
                }
            }
            let points: Vec<Point2> = cycle.iter().map(|&i| self.origin_position(i)).collect();
            faces.push(Face {
                signed_area: signed_area_2d(&points),
                half_edges: cycle,
            });
        }

        faces
    }

    /// Faces that can enclose a room: at least three half-edges, positive
    /// area, and not the unbounded face (the most negative signed area).
    #[must_use]
    pub fn interior_faces(&self) -> Vec<Face> {
        let faces = self.faces();
        let outer = faces
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.signed_area.total_cmp(&b.1.signed_area))
            .map(|(i, _)| i);

        faces
            .into_iter()
            .enumerate()
            .filter(|(i, f)| {
                Some(*i) != outer && f.half_edges.len() >= 3 && f.signed_area > TOLERANCE
            })
            .map(|(_, f)| f)
            .collect()
    }
}
