use super::{Point2d, Vector2d};
use cgmath::prelude::*;

/// Projects a point onto a local coordinate system.
///
/// # Parameters
/// * `point` - The point to project
/// * `origin` - The origin of the coordinate system
/// * `x_axis` - The basis vector pointing in the positive x-axis.
/// * `y_axis` - The basis vector pointing in the positive y-axis.
pub fn project_local(
    point: Point2d,
    origin: Point2d,
    x_axis: Vector2d,
    y_axis: Vector2d,
) -> Point2d {
    let point = point - origin;
    Point2d::new(point.dot(x_axis), point.dot(y_axis))
}

/// Rotates a vector 90 degrees anti-clockwise.
pub fn rot90(vec: Vector2d) -> Vector2d {
    Vector2d::new(-vec.y, vec.x)
}

/// Rotates a vector anti-clockwise by `angle` radians.
pub fn rotate(vec: Vector2d, angle: f64) -> Vector2d {
    let (s, c) = angle.sin_cos();
    Vector2d::new(c * vec.x - s * vec.y, s * vec.x + c * vec.y)
}

/// The signed angle in radians which rotates `from` onto `to`, in `[-pi, pi]`.
pub fn signed_angle(from: Vector2d, to: Vector2d) -> f64 {
    from.perp_dot(to).atan2(from.dot(to))
}

/// Turns the unit vector `dir` towards `target` by at most `max_angle` radians.
pub fn rotate_towards(dir: Vector2d, target: Vector2d, max_angle: f64) -> Vector2d {
    let angle = signed_angle(dir, target);
    rotate(dir, angle.clamp(-max_angle, max_angle))
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn local_projection() {
        let p = project_local(
            Point2d::new(3.0, 4.0),
            Point2d::new(1.0, 1.0),
            Vector2d::new(0.0, 1.0),
            Vector2d::new(-1.0, 0.0),
        );
        assert_approx_eq!(p.x, 3.0);
        assert_approx_eq!(p.y, -2.0);
    }

    #[test]
    fn turn_is_limited() {
        let east = Vector2d::new(1.0, 0.0);
        let north = Vector2d::new(0.0, 1.0);
        assert_approx_eq!(signed_angle(east, north), FRAC_PI_2);
        assert_approx_eq!(signed_angle(north, east), -FRAC_PI_2);

        let turned = rotate_towards(east, north, 0.1);
        assert_approx_eq!(signed_angle(east, turned), 0.1);
        assert_approx_eq!(turned.magnitude(), 1.0);

        let turned = rotate_towards(east, north, 10.0);
        assert_approx_eq!(turned.x, 0.0);
        assert_approx_eq!(turned.y, 1.0);
        assert_approx_eq!(rot90(east).y, 1.0);
    }
}
