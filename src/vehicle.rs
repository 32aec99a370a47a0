pub use acceleration::{AccelerationModel, AccelerationPhase, AccelerationProfile, Traversal};
pub use steering::{LaneFollowing, Steering};
use crate::lane::LanePath;
use crate::math::{rotate_towards, Point2d, Polygon, Vector2d};
use crate::{Error, Result};
use cgmath::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod acceleration;
mod steering;

/// The physical envelope of a vehicle.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VehicleSpec {
    /// The vehicle length in m.
    pub length: f64,
    /// The vehicle width in m.
    pub width: f64,
    /// Distance between the axles in m.
    pub wheel_base: f64,
    /// The maximum acceleration in m/s<sup>2</sup>.
    pub max_acceleration: f64,
    /// The maximum deceleration, a positive number in m/s<sup>2</sup>.
    pub max_deceleration: f64,
    /// The maximum steering angle in radians.
    pub max_steering_angle: f64,
    /// The maximum rate of change of heading in radians per second.
    pub max_turn_per_second: f64,
}

impl Default for VehicleSpec {
    fn default() -> Self {
        Self {
            length: 4.0,
            width: 1.8,
            wheel_base: 2.5,
            max_acceleration: 4.5,
            max_deceleration: 6.0,
            max_steering_angle: 0.6,
            max_turn_per_second: std::f64::consts::FRAC_PI_2,
        }
    }
}

impl VehicleSpec {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("length", self.length),
            ("width", self.width),
            ("wheel_base", self.wheel_base),
            ("max_acceleration", self.max_acceleration),
            ("max_deceleration", self.max_deceleration),
            ("max_steering_angle", self.max_steering_angle),
            ("max_turn_per_second", self.max_turn_per_second),
        ];
        match fields.iter().find(|(_, v)| !(v.is_finite() && *v > 0.0)) {
            Some((name, value)) => Err(Error::InvalidQuery(format!(
                "vehicle {name} must be positive and finite, got {value}"
            ))),
            None => Ok(()),
        }
    }

    /// The fastest the vehicle can turn at velocity `vel`, in radians per second.
    pub fn turn_rate_limit(&self, vel: f64) -> f64 {
        let kinematic = vel.abs() * self.max_steering_angle.tan() / self.wheel_base;
        kinematic.min(self.max_turn_per_second)
    }
}

/// A disposable vehicle driven through a connection to predict the space it
/// occupies over time.
#[derive(Clone, Debug)]
pub struct TrialVehicle {
    spec: VehicleSpec,
    acc: AccelerationModel,
    /// World position of the centre of the front bumper.
    front: Point2d,
    /// Unit vector of the vehicle's heading.
    dir: Vector2d,
    /// The velocity in m/s.
    vel: f64,
    /// The path position of the front of the vehicle.
    pos: f64,
}

impl TrialVehicle {
    /// Places a vehicle with its front at `front`, which lies at path position `pos`.
    pub fn new(spec: VehicleSpec, front: Point2d, dir: Vector2d, pos: f64, vel: f64) -> Self {
        Self {
            spec,
            acc: AccelerationModel::new(spec.max_acceleration),
            front,
            dir,
            vel,
            pos,
        }
    }

    pub fn spec(&self) -> &VehicleSpec {
        &self.spec
    }

    pub fn front(&self) -> Point2d {
        self.front
    }

    pub fn dir(&self) -> Vector2d {
        self.dir
    }

    pub fn vel(&self) -> f64 {
        self.vel
    }

    /// The path position of the front of the vehicle.
    pub fn pos(&self) -> f64 {
        self.pos
    }

    /// Hold the current velocity on subsequent steps.
    pub fn coast(&mut self) {
        self.acc.coast();
    }

    /// Accelerate at the maximum rate on subsequent steps, up to `ceiling`.
    pub fn accelerate_to_ceiling(&mut self, ceiling: f64) {
        self.acc.accelerate_to(ceiling);
    }

    /// Moves the vehicle forward by `dt` seconds along `path`.
    pub fn advance(&mut self, path: &LanePath, steering: &impl Steering, dt: f64) {
        if !(dt > 0.0) {
            return;
        }
        let (vel, dist) = self.acc.integrate(self.vel, dt);
        let desired = steering.desired_heading(path, self.pos, self.front, self.dir);
        let max_turn = self.spec.turn_rate_limit(dist / dt) * dt;
        self.dir = rotate_towards(self.dir, desired, max_turn).normalize();
        self.front += self.dir * dist;
        self.pos += dist * self.dir.dot(path.tangent_at(self.pos));
        self.vel = vel;
    }

    /// The space the vehicle occupies, grown by `buffer` on every side.
    pub fn footprint(&self, buffer: f64) -> Polygon {
        let half_len = 0.5 * self.spec.length;
        Polygon::oriented_rect(
            self.front - self.dir * half_len,
            self.dir,
            half_len + buffer,
            0.5 * self.spec.width + buffer,
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::connection::Connection;
    use crate::lane::LaneAttributes;
    use crate::math::{LineSegment2d, QuadraticBezier2d, Rect};
    use crate::util::Interval;
    use assert_approx_eq::assert_approx_eq;

    fn connection_with(curve: &dyn crate::math::ParametricCurve2d) -> (Connection, crate::LaneId) {
        let mut conn = Connection::new(Polygon::from_rect(Rect::new(
            Interval::new(0.0, 30.0),
            Interval::new(0.0, 30.0),
        )));
        let lane = conn.add_lane(&LaneAttributes {
            curve,
            width: 3.0,
            speed_limit: 20.0,
        });
        (conn, lane)
    }

    #[test]
    fn coasts_along_straight_lane() {
        let line = LineSegment2d::from_ends(Point2d::new(-10.0, 2.0), Point2d::new(40.0, 2.0));
        let (conn, lane) = connection_with(&line);
        let path = conn.path(lane, lane).unwrap();
        let mut veh = TrialVehicle::new(
            VehicleSpec::default(),
            Point2d::new(0.0, 2.0),
            Vector2d::unit_x(),
            10.0,
            5.0,
        );
        veh.coast();
        for _ in 0..10 {
            veh.advance(&path, &LaneFollowing::default(), 0.1);
        }
        assert_approx_eq!(veh.front().x, 5.0);
        assert_approx_eq!(veh.front().y, 2.0);
        assert_approx_eq!(veh.pos(), 15.0);
        assert_approx_eq!(veh.vel(), 5.0);

        let bounds = veh.footprint(0.5).bounds();
        assert_approx_eq!(bounds.x.min, 0.5);
        assert_approx_eq!(bounds.x.max, 5.5);
        assert_approx_eq!(bounds.height(), 2.8);
    }

    #[test]
    fn accelerates_to_ceiling() {
        let line = LineSegment2d::from_ends(Point2d::new(0.0, 0.0), Point2d::new(100.0, 0.0));
        let (conn, lane) = connection_with(&line);
        let path = conn.path(lane, lane).unwrap();
        let spec = VehicleSpec {
            max_acceleration: 2.0,
            ..Default::default()
        };
        let mut veh = TrialVehicle::new(spec, Point2d::new(0.0, 0.0), Vector2d::unit_x(), 0.0, 5.0);
        veh.accelerate_to_ceiling(10.0);
        for _ in 0..40 {
            veh.advance(&path, &LaneFollowing::default(), 0.1);
        }
        assert_approx_eq!(veh.vel(), 10.0);
        // 2.5 s ramping covers 18.75 m, then 1.5 s at 10 m/s
        assert_approx_eq!(veh.front().x, 33.75, 1e-6);
    }

    #[test]
    fn follows_curved_lane() {
        let curve = QuadraticBezier2d::new(&[
            Point2d::new(0.0, 5.0),
            Point2d::new(20.0, 5.0),
            Point2d::new(20.0, 25.0),
        ]);
        let (conn, lane) = connection_with(&curve);
        let path = conn.path(lane, lane).unwrap();
        let mut veh = TrialVehicle::new(
            VehicleSpec::default(),
            path.point_at(0.0),
            path.tangent_at(0.0),
            0.0,
            5.0,
        );
        veh.coast();
        while veh.pos() < path.length() - 1.0 {
            veh.advance(&path, &LaneFollowing::default(), 0.05);
            let on_lane = path.point_at(veh.pos());
            assert!(on_lane.distance(veh.front()) < 1.5);
        }
        assert!(veh.dir().y > 0.9);
    }
}
