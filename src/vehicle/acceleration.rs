use crate::{Error, Result};
use arrayvec::ArrayVec;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a vehicle controls its speed while crossing a connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Traversal {
    /// Hold the arrival velocity.
    Coast,
    /// Accelerate at the maximum rate until reaching the velocity ceiling.
    #[default]
    Accelerate,
}

/// The longitudinal model of a trial vehicle.
#[derive(Clone, Copy, Debug)]
pub struct AccelerationModel {
    /// The vehicle's maximum acceleration in m/s<sup>2</sup>.
    max_acc: f64,
    /// The velocity to accelerate towards, if accelerating.
    ceiling: Option<f64>,
}

impl AccelerationModel {
    /// Creates a model which starts out coasting.
    pub fn new(max_acc: f64) -> Self {
        Self {
            max_acc,
            ceiling: None,
        }
    }

    /// Hold the current velocity.
    pub fn coast(&mut self) {
        self.ceiling = None;
    }

    /// Accelerate at the maximum rate until reaching `ceiling`.
    pub fn accelerate_to(&mut self, ceiling: f64) {
        self.ceiling = Some(ceiling);
    }

    /// The acceleration applied at velocity `vel`.
    pub fn acc(&self, vel: f64) -> f64 {
        match self.ceiling {
            Some(ceiling) if vel < ceiling => self.max_acc,
            _ => 0.0,
        }
    }

    /// Integrates the motion over `dt` seconds from velocity `vel`.
    /// Returns the new velocity and the distance travelled.
    pub fn integrate(&self, vel: f64, dt: f64) -> (f64, f64) {
        let acc = self.acc(vel);
        let Some(ceiling) = self.ceiling.filter(|_| acc > 0.0) else {
            return (vel, vel * dt);
        };
        let t_cap = (ceiling - vel) / acc;
        if t_cap >= dt {
            (vel + acc * dt, vel * dt + 0.5 * acc * dt * dt)
        } else {
            let ramp = vel * t_cap + 0.5 * acc * t_cap * t_cap;
            (ceiling, ramp + ceiling * (dt - t_cap))
        }
    }
}

/// A period of constant acceleration.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AccelerationPhase {
    /// Acceleration in m/s<sup>2</sup>.
    pub acceleration: f64,
    /// Duration in s.
    pub duration: f64,
}

/// The accelerations a vehicle should follow to reproduce a reserved traversal.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AccelerationProfile {
    phases: ArrayVec<AccelerationPhase, 2>,
}

impl AccelerationProfile {
    /// Computes the profile of a traversal lasting `traversal_time` seconds.
    pub fn new(
        traversal: Traversal,
        arrival_velocity: f64,
        max_velocity: f64,
        max_acceleration: f64,
        traversal_time: f64,
    ) -> Result<Self> {
        if !(traversal_time > 0.0) {
            log::error!("traversal time {traversal_time} is not positive");
            return Err(Error::NonPositiveTraversal(traversal_time));
        }

        let mut phases = ArrayVec::new();
        let mut remaining = traversal_time;
        if traversal == Traversal::Accelerate && max_velocity > arrival_velocity {
            let duration = remaining.min((max_velocity - arrival_velocity) / max_acceleration);
            phases.push(AccelerationPhase {
                acceleration: max_acceleration,
                duration,
            });
            remaining -= duration;
        }
        if remaining > 0.0 {
            phases.push(AccelerationPhase {
                acceleration: 0.0,
                duration: remaining,
            });
        }
        Ok(Self { phases })
    }

    pub fn phases(&self) -> &[AccelerationPhase] {
        &self.phases
    }

    /// The total duration of all phases.
    pub fn total_duration(&self) -> f64 {
        self.phases.iter().map(|p| p.duration).sum()
    }
}
