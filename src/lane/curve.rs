use crate::math::{
    equidistant_points_along_curve, project_point_onto_curve, ParametricCurve2d, Point2d,
    Vector2d,
};
use crate::util::Interval;
use cgmath::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The spacing of the points approximating a lane, in m.
const LANE_SEGMENT_LEN: f64 = 0.5;

/// The centre line of a lane, parameterised by arc length.
///
/// Positions before the start or past the end are extrapolated along the
/// end tangents, so a vehicle can be followed until it is well clear.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LaneCurve {
    step: f64,
    length: f64,
    points: Vec<Point2d>,
}

impl LaneCurve {
    /// Creates a new [LaneCurve] from the given parametric curve,
    /// with the default step size.
    pub fn new(curve: &impl ParametricCurve2d) -> Self {
        Self::with_step(curve, LANE_SEGMENT_LEN)
    }

    /// Creates a new [LaneCurve] from the given parametric curve,
    /// with the given step size.
    pub fn with_step(curve: &impl ParametricCurve2d, step: f64) -> Self {
        let (points, length) = equidistant_points_along_curve(curve, step);
        Self {
            step,
            length,
            points,
        }
    }

    /// The length of the curve in m.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// The point at `pos` metres along the curve.
    pub fn point_at(&self, pos: f64) -> Point2d {
        let (idx, frac) = self.locate(pos);
        let (a, b) = (self.points[idx], self.points[idx + 1]);
        a + (b - a) * frac
    }

    /// The unit tangent at `pos` metres along the curve.
    pub fn tangent_at(&self, pos: f64) -> Vector2d {
        let (idx, _) = self.locate(pos);
        let dir = self.points[idx + 1] - self.points[idx];
        if dir.magnitude2() > 0.0 {
            dir.normalize()
        } else {
            Vector2d::unit_x()
        }
    }

    /// The position along the curve closest to `point`.
    pub fn project(&self, point: Point2d) -> f64 {
        project_point_onto_curve(self, point, 1e-4, None).unwrap_or_else(|| {
            // Newton can cycle around a corner of the polyline
            (0..self.points.len() - 1)
                .map(|idx| {
                    let a = self.points[idx];
                    let seg = self.points[idx + 1] - a;
                    let len = self.segment_len(idx);
                    let frac = if seg.magnitude2() > 0.0 {
                        ((point - a).dot(seg) / seg.magnitude2()).clamp(0.0, 1.0)
                    } else {
                        0.0
                    };
                    let pos = idx as f64 * self.step + frac * len;
                    (pos, (a + seg * frac).distance2(point))
                })
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map_or(0.0, |(pos, _)| pos)
        })
    }

    /// The index of the segment containing `pos` and the fraction along it.
    /// The fraction falls outside `[0, 1]` when extrapolating.
    fn locate(&self, pos: f64) -> (usize, f64) {
        let last = self.points.len() - 2;
        if pos <= 0.0 {
            return (0, pos / self.segment_len(0));
        }
        let idx = ((pos / self.step) as usize).min(last);
        let local = pos - idx as f64 * self.step;
        (idx, local / self.segment_len(idx))
    }

    fn segment_len(&self, idx: usize) -> f64 {
        let len = if idx + 2 == self.points.len() {
            self.length - idx as f64 * self.step
        } else {
            self.step
        };
        len.max(f64::EPSILON)
    }
}

impl ParametricCurve2d for LaneCurve {
    fn sample(&self, t: f64) -> Point2d {
        self.point_at(t)
    }

    fn bounds(&self) -> Interval<f64> {
        Interval::new(0.0, self.length)
    }

    fn sample_dt(&self, t: f64) -> Vector2d {
        self.tangent_at(t)
    }

    fn sample_dt2(&self, _t: f64) -> Vector2d {
        Vector2d::zero()
    }
}
