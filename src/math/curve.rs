use super::{Point2d, Vector2d};
use crate::util::Interval;
pub use algorithms::{equidistant_points_along_curve, project_point_onto_curve};

mod algorithms;

/// A parametric curve in 2D space.
pub trait ParametricCurve2d {
    /// Samples the parametric curve.
    fn sample(&self, t: f64) -> Point2d;

    /// Returns the minimum and maximum t-values that define the bounds of the curve.
    fn bounds(&self) -> Interval<f64>;

    /// Samples the derivative of the parametric curve.
    ///
    /// The default implementation uses a central difference.
    fn sample_dt(&self, t: f64) -> Vector2d {
        let h = self.bounds().length() * 1e-5;
        (self.sample(t + h) - self.sample(t - h)) / (2.0 * h)
    }

    /// Samples the second derivative of the parametric curve.
    fn sample_dt2(&self, t: f64) -> Vector2d {
        let h = self.bounds().length() * 1e-5;
        (self.sample_dt(t + h) - self.sample_dt(t - h)) / (2.0 * h)
    }
}

impl<T: ParametricCurve2d + ?Sized> ParametricCurve2d for &T {
    fn sample(&self, t: f64) -> Point2d {
        (**self).sample(t)
    }

    fn bounds(&self) -> Interval<f64> {
        (**self).bounds()
    }

    fn sample_dt(&self, t: f64) -> Vector2d {
        (**self).sample_dt(t)
    }

    fn sample_dt2(&self, t: f64) -> Vector2d {
        (**self).sample_dt2(t)
    }
}
