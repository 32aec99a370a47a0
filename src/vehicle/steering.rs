use crate::lane::LanePath;
use crate::math::{Point2d, Vector2d};
use cgmath::prelude::*;

/// Decides which way a trial vehicle should point.
pub trait Steering {
    /// Returns the heading the vehicle would like to have, as a unit vector.
    ///
    /// # Parameters
    /// * `path` - The centre line the vehicle is following
    /// * `pos` - The path position of the front of the vehicle
    /// * `front` - The world position of the front of the vehicle
    /// * `heading` - The vehicle's current heading
    fn desired_heading(&self, path: &LanePath, pos: f64, front: Point2d, heading: Vector2d)
        -> Vector2d;
}

/// Steers towards a point on the centre line a fixed distance ahead.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaneFollowing {
    /// Distance ahead of the front of the vehicle to aim for, in m.
    pub look_ahead: f64,
}

impl Default for LaneFollowing {
    fn default() -> Self {
        Self { look_ahead: 3.0 }
    }
}

impl Steering for LaneFollowing {
    fn desired_heading(&self, path: &LanePath, pos: f64, front: Point2d, heading: Vector2d) -> Vector2d {
        let aim = path.point_at(pos + self.look_ahead) - front;
        if aim.magnitude2() > 1e-12 {
            aim.normalize()
        } else {
            heading
        }
    }
}
