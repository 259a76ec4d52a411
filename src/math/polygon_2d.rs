use super::intersect_2d::segment_segment_intersect_2d;
use super::{Point2, TOLERANCE};

/// Computes the signed area of a polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Perimeter of a closed polygon.
#[must_use]
pub fn perimeter_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    (0..n).map(|i| (points[(i + 1) % n] - points[i]).norm()).sum()
}

/// Area-weighted centroid of a closed polygon.
///
/// Falls back to the vertex average for degenerate (zero-area) input.
#[must_use]
pub fn centroid_2d(points: &[Point2]) -> Option<Point2> {
    if points.is_empty() {
        return None;
    }
    let area = signed_area_2d(points);
    if area.abs() < TOLERANCE {
        #[allow(clippy::cast_precision_loss)]
        let inv = 1.0 / points.len() as f64;
        let sum = points
            .iter()
            .fold(nalgebra::Vector2::zeros(), |acc, p| acc + p.coords);
        return Some(Point2::from(sum * inv));
    }
    let n = points.len();
    let (mut cx, mut cy) = (0.0, 0.0);
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        let f = p.x * q.y - q.x * p.y;
        cx += (p.x + q.x) * f;
        cy += (p.y + q.y) * f;
    }
    let k = 1.0 / (6.0 * area);
    Some(Point2::new(cx * k, cy * k))
}

/// Even-odd point-in-polygon test. Points on the boundary may go either way.
#[must_use]
pub fn point_in_polygon_2d(point: &Point2, polygon: &[Point2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[j];
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Returns `true` if no two non-adjacent edges of the closed polygon cross.
///
/// Zero-length edges (repeated vertices) are ignored, so a polygon with a
/// duplicated apex point still counts as simple.
#[must_use]
pub fn is_simple_polygon_2d(points: &[Point2]) -> bool {
    let mut ring: Vec<Point2> = Vec::with_capacity(points.len());
    for p in points {
        if ring.last().is_none_or(|q| (p - q).norm() > 1e-9) {
            ring.push(*p);
        }
    }
    while ring.len() > 1 && (ring[0] - ring[ring.len() - 1]).norm() <= 1e-9 {
        ring.pop();
    }
    let n = ring.len();
    if n < 3 {
        return false;
    }
    for i in 0..n {
        let a0 = ring[i];
        let a1 = ring[(i + 1) % n];
        for j in (i + 1)..n {
            // Adjacent edges share a vertex by construction.
            if j == i + 1 || (i == 0 && j == n - 1) {
                continue;
            }
            let b0 = ring[j];
            let b1 = ring[(j + 1) % n];
            if segment_segment_intersect_2d(&a0, &a1, &b0, &b1).is_some() {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn signed_area_ccw_square() {
        let area = signed_area_2d(&unit_square());
        assert!((area - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_cw_square() {
        let mut pts = unit_square();
        pts.reverse();
        let area = signed_area_2d(&pts);
        assert!((area + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_degenerate() {
        assert!((signed_area_2d(&[Point2::new(0.0, 0.0)])).abs() < TOLERANCE);
        assert!((signed_area_2d(&[])).abs() < TOLERANCE);
    }

    #[test]
    fn perimeter_of_square() {
        assert!((perimeter_2d(&unit_square()) - 4.0).abs() < TOLERANCE);
    }

    #[test]
    fn centroid_of_square() {
        let c = centroid_2d(&unit_square()).unwrap();
        assert!((c.x - 0.5).abs() < TOLERANCE);
        assert!((c.y - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn point_inside_and_outside() {
        let sq = unit_square();
        assert!(point_in_polygon_2d(&Point2::new(0.5, 0.5), &sq));
        assert!(!point_in_polygon_2d(&Point2::new(1.5, 0.5), &sq));
    }

    #[test]
    fn bowtie_is_not_simple() {
        let bowtie = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ];
        assert!(!is_simple_polygon_2d(&bowtie));
        assert!(is_simple_polygon_2d(&unit_square()));
    }

    #[test]
    fn repeated_vertex_is_still_simple() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        assert!(is_simple_polygon_2d(&pts));
    }
}
