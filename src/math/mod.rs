pub mod distance_2d;
pub mod intersect_2d;
pub mod polygon_2d;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Distance below which two scene points are considered the same location
/// (node merging, intersection deduplication).
pub const POINT_TOLERANCE: f64 = 1.0;

/// Angle below which two directions are classified as collinear (about 1°).
pub const COLLINEAR_ANGLE_TOLERANCE: f64 = 0.0175;

/// Returns the left-pointing normal of a direction vector.
#[must_use]
pub fn left_normal(dir: &Vector2) -> Vector2 {
    Vector2::new(-dir.y, dir.x)
}

/// Returns the unit direction from `a` to `b`, or `None` for a zero-length segment.
#[must_use]
pub fn direction(a: &Point2, b: &Point2) -> Option<Vector2> {
    let d = b - a;
    let len = d.norm();
    if len < TOLERANCE {
        None
    } else {
        Some(d / len)
    }
}

/// 2D cross product (z component of the 3D cross product).
#[must_use]
pub fn cross(a: &Vector2, b: &Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Returns `true` if two unit directions point in opposite directions within
/// `angle_tolerance` radians.
#[must_use]
pub fn is_anti_parallel(a: &Vector2, b: &Vector2, angle_tolerance: f64) -> bool {
    a.dot(b) <= -angle_tolerance.cos()
}

/// Returns `true` if two points are within `tolerance` of each other.
#[must_use]
pub fn points_coincide(a: &Point2, b: &Point2, tolerance: f64) -> bool {
    (b - a).norm_squared() <= tolerance * tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_normal_of_x_axis_is_y_axis() {
        let n = left_normal(&Vector2::new(1.0, 0.0));
        assert!(n.x.abs() < TOLERANCE);
        assert!((n.y - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn direction_of_zero_length_segment_is_none() {
        let p = Point2::new(3.0, 4.0);
        assert!(direction(&p, &p).is_none());
    }

    #[test]
    fn anti_parallel_within_one_degree() {
        let a = Vector2::new(1.0, 0.0);
        let half_degree = 0.5_f64.to_radians();
        let b = Vector2::new(-half_degree.cos(), half_degree.sin());
        assert!(is_anti_parallel(&a, &b, COLLINEAR_ANGLE_TOLERANCE));

        let five_degrees = 5.0_f64.to_radians();
        let c = Vector2::new(-five_degrees.cos(), five_degrees.sin());
        assert!(!is_anti_parallel(&a, &c, COLLINEAR_ANGLE_TOLERANCE));
    }
}
