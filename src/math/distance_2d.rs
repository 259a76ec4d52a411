use super::{Point2, Vector2, TOLERANCE};

/// Projects `p` onto the segment `a`→`b`.
///
/// Returns the unclamped parameter `t` along the segment and the foot point
/// on the infinite line. Degenerate segments project to `(0, a)`.
#[must_use]
pub fn project_on_segment(p: &Point2, a: &Point2, b: &Point2) -> (f64, Point2) {
    let d = b - a;
    let len_sq = d.norm_squared();
    if len_sq < TOLERANCE * TOLERANCE {
        return (0.0, *a);
    }
    let t = (p - a).dot(&d) / len_sq;
    (t, a + d * t)
}

/// Perpendicular distance from `p` to the infinite line through `origin`
/// with unit direction `dir`.
#[must_use]
pub fn point_to_line_dist(p: &Point2, origin: &Point2, dir: &Vector2) -> f64 {
    super::cross(dir, &(p - origin)).abs()
}
