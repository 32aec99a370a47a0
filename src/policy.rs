//! Deciding which of a vehicle's proposals to grant.

use crate::manager::{Plan, Query, ReservationManager};
use crate::vehicle::{AccelerationProfile, Traversal, VehicleSpec};
use crate::{LaneId, Result, VehicleId};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The furthest ahead a vehicle may ask to arrive, in s.
pub const MAX_FUTURE_RESERVATION_TIME: f64 = 10.0;

/// One way a vehicle could cross a connection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Proposal {
    pub arrival_time: f64,
    pub arrival_velocity: f64,
    pub arrival_lane: LaneId,
    pub departure_lane: LaneId,
    /// The velocity not to exceed while crossing, in m/s.
    pub max_turn_velocity: f64,
}

/// A vehicle's request for a reservation, listing its proposals in order of
/// preference.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub vehicle: VehicleId,
    pub spec: VehicleSpec,
    pub proposals: Vec<Proposal>,
}

/// Why a request was turned down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RejectReason {
    /// Every remaining proposal conflicts with existing reservations.
    NoClearPath,
    /// The vehicle already holds a reservation.
    ConfirmedAnotherRequest,
    /// Every proposal arrives before the current time.
    ArrivalTimeTooLate,
    /// Every proposal arrives too far in the future.
    ArrivalTimeTooLarge,
}

/// A granted request.
#[derive(Clone, Debug, PartialEq)]
pub struct Confirmation {
    pub reservation: VehicleId,
    /// The index of the granted proposal within the request.
    pub proposal: usize,
    pub arrival_time: f64,
    pub exit_time: f64,
    pub exit_velocity: f64,
    pub profile: AccelerationProfile,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    Confirm(Confirmation),
    Reject(RejectReason),
}

/// Grants each request the first of its proposals that fits, in the order
/// requests arrive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FcfsPolicy {
    /// The furthest ahead of the current time a proposal may arrive, in s.
    pub max_future_time: f64,
    /// How trial vehicles cross the connection.
    pub traversal: Traversal,
}

impl Default for FcfsPolicy {
    fn default() -> Self {
        Self {
            max_future_time: MAX_FUTURE_RESERVATION_TIME,
            traversal: Traversal::Accelerate,
        }
    }
}

impl FcfsPolicy {
    /// Handles a request, reserving space for the vehicle if possible.
    pub fn process<M>(&self, manager: &mut M, request: &Request) -> Result<Response>
    where
        M: ReservationManager<Query = Query, Plan = Plan, ReservationId = VehicleId>,
    {
        if manager.has_reservation(request.vehicle) {
            log::debug!("{:?} already holds a reservation", request.vehicle);
            return Ok(Response::Reject(RejectReason::ConfirmedAnotherRequest));
        }

        let proposals = match self.filter(manager.current_time(), &request.proposals) {
            Ok(proposals) => proposals,
            Err(reason) => {
                log::debug!("rejecting {:?}: {:?}", request.vehicle, reason);
                return Ok(Response::Reject(reason));
            }
        };

        for (idx, proposal) in proposals {
            let query = Query {
                vehicle: request.vehicle,
                arrival_time: proposal.arrival_time,
                arrival_velocity: proposal.arrival_velocity,
                arrival_lane: proposal.arrival_lane,
                departure_lane: proposal.departure_lane,
                spec: request.spec,
                max_velocity: proposal.max_turn_velocity,
                traversal: self.traversal,
            };
            if let Some(plan) = manager.query(&query)? {
                let reservation = manager.accept(&plan);
                return Ok(Response::Confirm(Confirmation {
                    reservation,
                    proposal: idx,
                    arrival_time: plan.arrival_time(),
                    exit_time: plan.exit_time(),
                    exit_velocity: plan.exit_velocity(),
                    profile: plan.profile().clone(),
                }));
            }
        }

        Ok(Response::Reject(RejectReason::NoClearPath))
    }

    /// Drops proposals arriving in the past, then those arriving too far in
    /// the future, keeping their indices.
    fn filter<'a>(
        &self,
        now: f64,
        proposals: &'a [Proposal],
    ) -> std::result::Result<Vec<(usize, &'a Proposal)>, RejectReason> {
        let timely: Vec<_> = proposals
            .iter()
            .enumerate()
            .filter(|(_, p)| p.arrival_time >= now)
            .collect();
        if timely.is_empty() {
            return Err(RejectReason::ArrivalTimeTooLate);
        }
        let near: Vec<_> = timely
            .into_iter()
            .filter(|(_, p)| p.arrival_time - now <= self.max_future_time)
            .collect();
        if near.is_empty() {
            return Err(RejectReason::ArrivalTimeTooLarge);
        }
        Ok(near)
    }
}
