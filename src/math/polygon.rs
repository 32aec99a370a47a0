use super::{rot90, LineSegment2d, Point2d, Vector2d};
use crate::util::Interval;
use crate::{Error, Result};
use cgmath::prelude::*;
use itertools::Itertools;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// An axis-aligned rectangle.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    pub x: Interval<f64>,
    pub y: Interval<f64>,
}

impl Rect {
    pub const fn new(x: Interval<f64>, y: Interval<f64>) -> Self {
        Self { x, y }
    }

    /// The smallest rectangle containing every point, or `None` if there are none.
    pub fn enclosing(points: &[Point2d]) -> Option<Self> {
        Some(Self {
            x: Interval::enclosing(points.iter().map(|p| p.x))?,
            y: Interval::enclosing(points.iter().map(|p| p.y))?,
        })
    }

    pub fn width(&self) -> f64 {
        self.x.length()
    }

    pub fn height(&self) -> f64 {
        self.y.length()
    }

    /// Returns true if the rectangles overlap or share a boundary.
    pub fn touches(&self, other: &Rect) -> bool {
        self.x.touches(&other.x) && self.y.touches(&other.y)
    }

    /// The four corners, anti-clockwise from the minimum corner.
    pub fn corners(&self) -> [Point2d; 4] {
        [
            Point2d::new(self.x.min, self.y.min),
            Point2d::new(self.x.max, self.y.min),
            Point2d::new(self.x.max, self.y.max),
            Point2d::new(self.x.min, self.y.max),
        ]
    }
}

/// A simple polygon.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "Vec<Point2d>", into = "Vec<Point2d>")
)]
pub struct Polygon {
    points: SmallVec<[Point2d; 4]>,
    bounds: Rect,
}

impl Polygon {
    /// Creates a polygon from its vertices, in either winding order.
    ///
    /// Fails if there are fewer than three vertices, any coordinate is not
    /// finite, or the enclosed area is zero.
    pub fn new(points: impl IntoIterator<Item = Point2d>) -> Result<Self> {
        let points: SmallVec<[Point2d; 4]> = points.into_iter().collect();
        if points.len() < 3 {
            return Err(Error::DegenerateGeometry(format!(
                "polygon needs at least 3 points, got {}",
                points.len()
            )));
        }
        if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(Error::DegenerateGeometry(
                "polygon has a non-finite vertex".into(),
            ));
        }
        let polygon = Self::from_points_unchecked(points);
        if polygon.signed_area().abs() <= f64::EPSILON {
            return Err(Error::DegenerateGeometry("polygon has zero area".into()));
        }
        Ok(polygon)
    }

    fn from_points_unchecked(points: SmallVec<[Point2d; 4]>) -> Self {
        let bounds = Rect::enclosing(&points).unwrap_or(Rect::new(
            Interval::new(0.0, 0.0),
            Interval::new(0.0, 0.0),
        ));
        Self { points, bounds }
    }

    /// An axis-aligned rectangle as a polygon.
    pub fn from_rect(rect: Rect) -> Self {
        Self::from_points_unchecked(SmallVec::from_buf(rect.corners()))
    }

    /// A rectangle centred on `centre` whose local x-axis points along `dir`.
    ///
    /// `dir` must be a unit vector.
    pub fn oriented_rect(centre: Point2d, dir: Vector2d, half_length: f64, half_width: f64) -> Self {
        let along = dir * half_length;
        let across = rot90(dir) * half_width;
        Self::from_points_unchecked(SmallVec::from_buf([
            centre - along - across,
            centre + along - across,
            centre + along + across,
            centre - along + across,
        ]))
    }

    pub fn points(&self) -> &[Point2d] {
        &self.points
    }

    /// The axis-aligned bounding box.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// The signed area, positive when the vertices wind anti-clockwise.
    pub fn signed_area(&self) -> f64 {
        0.5 * self
            .points
            .iter()
            .circular_tuple_windows()
            .map(|(a, b)| a.to_vec().perp_dot(b.to_vec()))
            .sum::<f64>()
    }

    pub fn edges(&self) -> impl Iterator<Item = LineSegment2d> + '_ {
        self.points
            .iter()
            .circular_tuple_windows()
            .map(|(a, b)| LineSegment2d::from_ends(*a, *b))
    }

    /// Returns true if the point is inside the polygon or on its boundary.
    pub fn contains(&self, point: Point2d) -> bool {
        let bounds = self.bounds();
        if !bounds.x.contains(point.x) || !bounds.y.contains(point.y) {
            return false;
        }
        let degenerate = LineSegment2d::from_ends(point, point);
        if self.edges().any(|edge| edge.intersects(&degenerate)) {
            return true;
        }
        self.winds_around(point)
    }

    /// Ray casting towards positive x.
    fn winds_around(&self, point: Point2d) -> bool {
        let mut inside = false;
        for (a, b) in self.points.iter().circular_tuple_windows() {
            if (a.y > point.y) != (b.y > point.y) {
                let x = a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if point.x < x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Returns true if the polygons share any point, including when they
    /// merely touch.
    pub fn intersects(&self, other: &Polygon) -> bool {
        if !self.bounds().touches(&other.bounds()) {
            return false;
        }
        let crossing = self
            .edges()
            .cartesian_product(other.edges().collect_vec())
            .any(|(a, b)| a.intersects(&b));
        crossing || self.contains(other.points[0]) || other.contains(self.points[0])
    }

    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        self.intersects(&Polygon::from_rect(*rect))
    }

    /// Returns true if the rectangle lies strictly inside the polygon.
    /// A rectangle touching the boundary is not contained.
    pub fn contains_rect(&self, rect: &Rect) -> bool {
        let rect = Polygon::from_rect(*rect);
        let boundary_hit = self
            .edges()
            .cartesian_product(rect.edges().collect_vec())
            .any(|(a, b)| a.intersects(&b));
        !boundary_hit && self.winds_around(rect.points[0])
    }
}

impl TryFrom<Vec<Point2d>> for Polygon {
    type Error = Error;

    fn try_from(points: Vec<Point2d>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<Polygon> for Vec<Point2d> {
    fn from(polygon: Polygon) -> Self {
        polygon.points.into_vec()
    }
}
