use super::curve::ParametricCurve2d;
use super::{Point2d, Vector2d};
use crate::util::Interval;
use cgmath::prelude::*;

/// Tolerance used by the orientation tests, in m^2.
const COLLINEAR_EPSILON: f64 = 1e-9;

/// A straight line segment, parameterised over `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LineSegment2d {
    pub start: Point2d,
    pub end: Point2d,
}

impl LineSegment2d {
    /// Creates a line segment between two points.
    pub const fn from_ends(start: Point2d, end: Point2d) -> Self {
        Self { start, end }
    }

    /// The length of the segment.
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Returns true if the two segments share at least one point.
    /// Touching end points and collinear overlaps both count.
    pub fn intersects(&self, other: &Self) -> bool {
        let d1 = orientation(other.start, other.end, self.start);
        let d2 = orientation(other.start, other.end, self.end);
        let d3 = orientation(self.start, self.end, other.start);
        let d4 = orientation(self.start, self.end, other.end);

        if d1 * d2 < 0.0 && d3 * d4 < 0.0 {
            return true;
        }

        (d1 == 0.0 && other.covers(self.start))
            || (d2 == 0.0 && other.covers(self.end))
            || (d3 == 0.0 && self.covers(other.start))
            || (d4 == 0.0 && self.covers(other.end))
    }

    /// Whether a point known to be collinear with the segment lies within its bounding box.
    fn covers(&self, point: Point2d) -> bool {
        let xs = Interval::new(self.start.x.min(self.end.x), self.start.x.max(self.end.x));
        let ys = Interval::new(self.start.y.min(self.end.y), self.start.y.max(self.end.y));
        xs.expand(COLLINEAR_EPSILON).contains(point.x)
            && ys.expand(COLLINEAR_EPSILON).contains(point.y)
    }
}

/// The sign of the turn `a -> b -> c`, snapped to zero when nearly collinear.
fn orientation(a: Point2d, b: Point2d, c: Point2d) -> f64 {
    let cross = (b - a).perp_dot(c - a);
    if cross.abs() <= COLLINEAR_EPSILON {
        0.0
    } else {
        cross.signum()
    }
}

impl ParametricCurve2d for LineSegment2d {
    fn sample(&self, t: f64) -> Point2d {
        self.start + (self.end - self.start) * t
    }

    fn bounds(&self) -> Interval<f64> {
        Interval::new(0.0, 1.0)
    }

    fn sample_dt(&self, _t: f64) -> Vector2d {
        self.end - self.start
    }

    fn sample_dt2(&self, _t: f64) -> Vector2d {
        Vector2d::zero()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn seg(x1: f64, y1: f64, x2: f64, y2: f64) -> LineSegment2d {
        LineSegment2d::from_ends(Point2d::new(x1, y1), Point2d::new(x2, y2))
    }

    #[test]
    fn crossing_segments() {
        assert!(seg(0.0, 0.0, 2.0, 2.0).intersects(&seg(0.0, 2.0, 2.0, 0.0)));
        assert!(!seg(0.0, 0.0, 1.0, 1.0).intersects(&seg(0.0, 2.0, 0.9, 1.1)));
    }

    #[test]
    fn touching_segments() {
        // Shared end point
        assert!(seg(0.0, 0.0, 1.0, 0.0).intersects(&seg(1.0, 0.0, 1.0, 5.0)));
        // T-junction
        assert!(seg(0.0, 0.0, 2.0, 0.0).intersects(&seg(1.0, 0.0, 1.0, 5.0)));
        // Collinear overlap
        assert!(seg(0.0, 0.0, 2.0, 0.0).intersects(&seg(1.0, 0.0, 3.0, 0.0)));
        // Collinear but disjoint
        assert!(!seg(0.0, 0.0, 1.0, 0.0).intersects(&seg(2.0, 0.0, 3.0, 0.0)));
    }
}
