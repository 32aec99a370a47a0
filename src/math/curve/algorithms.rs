use super::ParametricCurve2d;
use crate::{math::Point2d, util::Interval};
use cgmath::prelude::*;
use itertools::Itertools;

/// Number of coarse samples used to seed the projection.
const PROJECTION_SEEDS: usize = 16;

/// Projects a point onto a parametric curve, returning the t-value of the
/// closest point within the curve's bounds.
///
/// Newton's method is run on the squared distance, starting from `t0` or from
/// the best of a coarse set of samples. Returns `None` if the iteration fails
/// to settle within `max_error` (in t units).
pub fn project_point_onto_curve(
    curve: &impl ParametricCurve2d,
    point: Point2d,
    max_error: f64,
    t0: Option<f64>,
) -> Option<f64> {
    let bounds = curve.bounds();
    let dist2 = |t: f64| curve.sample(t).distance2(point);

    let mut t = match t0 {
        Some(t) => t.clamp(bounds.min, bounds.max),
        None => (0..=PROJECTION_SEEDS)
            .map(|i| bounds.lerp(i as f64 / PROJECTION_SEEDS as f64))
            .min_by(|a, b| dist2(*a).total_cmp(&dist2(*b)))?,
    };

    for _ in 0..32 {
        let offset = curve.sample(t) - point;
        let dt = curve.sample_dt(t);
        let slope = dt.dot(offset);
        let curvature = dt.magnitude2() + curve.sample_dt2(t).dot(offset);
        if curvature <= 0.0 {
            // Not a minimum along this direction; fall back to a gradient step.
            let step = if slope > 0.0 { -max_error } else { max_error };
            t = (t + step).clamp(bounds.min, bounds.max);
            continue;
        }
        let next = (t - slope / curvature).clamp(bounds.min, bounds.max);
        if !next.is_finite() {
            return None;
        }
        let moved = (next - t).abs();
        t = next;
        if moved < max_error {
            return Some(t);
        }
    }

    None
}

/// Resamples a curve into points spaced `dist` apart along its arc length.
///
/// The first and last points are the ends of the curve, so the final spacing
/// may be shorter than `dist`. Also returns the arc length of the curve.
pub fn equidistant_points_along_curve(
    curve: &impl ParametricCurve2d,
    dist: f64,
) -> (Vec<Point2d>, f64) {
    let bounds = curve.bounds();
    let first = curve.sample(bounds.min);
    if !(dist > 0.0) {
        let last = curve.sample(bounds.max);
        return (vec![first, last], first.distance(last));
    }

    // Fine polyline approximation to walk along
    let chord = first.distance(curve.sample(bounds.max));
    let rough_len = (0..=8)
        .map(|i| curve.sample(bounds.lerp(i as f64 / 8.0)))
        .tuple_windows()
        .map(|(a, b)| a.distance(b))
        .sum::<f64>()
        .max(chord);
    let fine = ((rough_len / (0.05 * dist)).ceil() as usize).clamp(8, 1 << 16);

    let mut points = vec![first];
    let mut length = 0.0;
    let mut since_last = 0.0;
    let mut prev = first;
    for i in 1..=fine {
        let next = curve.sample(bounds.lerp(i as f64 / fine as f64));
        let mut seg = Interval::new(0.0, prev.distance(next));
        while since_last + seg.length() >= dist {
            let along = dist - since_last;
            seg.min += along;
            points.push(prev + (next - prev) * (seg.min / seg.max));
            since_last = 0.0;
        }
        since_last += seg.length();
        length += seg.max;
        prev = next;
    }

    if since_last > 1e-3 * dist || points.len() == 1 {
        points.push(prev);
    } else if let Some(last) = points.last_mut() {
        *last = prev;
    }

    (points, length)
}
