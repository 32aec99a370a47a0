//! Space-time tile reservations for vehicles crossing a merge or intersection.
//!
//! A [ReservationGridManager] divides a [Connection]'s area into tiles and
//! keeps a ledger of which vehicle may occupy each tile during each slot of
//! time. Vehicles ask for a reservation with a [Query]; the manager drives a
//! [TrialVehicle] across the area to find the time tiles it would occupy and
//! returns a [Plan] if none of them are taken.

pub use cgmath;
pub use config::{Config, MAX_TIME_BUFFER_STEPS};
pub use connection::{Connection, EntryPoint};
pub use error::{Error, Result};
pub use grid::{ReservationGrid, TimeTile, MAX_DISCRETE_TIME};
pub use lane::{Lane, LaneAttributes, LaneCurve, LanePath};
pub use manager::{Plan, Query, ReservationGridManager, ReservationManager, MAX_TRIAL_STEPS};
pub use policy::{
    Confirmation, FcfsPolicy, Proposal, RejectReason, Request, Response,
    MAX_FUTURE_RESERVATION_TIME,
};
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
pub use tiled_area::{Tile, TileId, TiledArea};
pub use util::Interval;
pub use vehicle::{
    AccelerationModel, AccelerationPhase, AccelerationProfile, LaneFollowing, Steering,
    Traversal, TrialVehicle, VehicleSpec,
};

mod config;
mod connection;
mod debug;
mod error;
mod grid;
mod lane;
mod manager;
pub mod math;
mod policy;
mod tiled_area;
mod util;
mod vehicle;

new_key_type! {
    /// Unique ID of a [Lane].
    pub struct LaneId;
    /// Unique ID of a vehicle, which doubles as the ID of its reservation.
    pub struct VehicleId;
}

type LaneSet = SlotMap<LaneId, Lane>;
