use crate::config::Config;
use crate::connection::Connection;
use crate::debug::{debug_polygon, debug_tiles};
use crate::grid::{ReservationGrid, TimeTile};
use crate::tiled_area::TiledArea;
use crate::vehicle::{
    AccelerationProfile, LaneFollowing, Steering, Traversal, TrialVehicle, VehicleSpec,
};
use crate::{Error, LaneId, Result, VehicleId};
use std::sync::Arc;

/// The most grid steps a trial may take to clear the area.
///
/// The horizon in seconds is this times the grid time step, so 200 s with
/// the default config. Slower trials fail with [Error::TrialDidNotExit].
pub const MAX_TRIAL_STEPS: usize = 10_000;

/// Something which admits vehicles into a shared resource by reservation.
pub trait ReservationManager {
    type Query;
    type Plan;
    type ReservationId: Copy;

    /// Checks whether a reservation could be made, without making it.
    /// `Ok(None)` means the request conflicts with existing reservations.
    fn query(&self, query: &Self::Query) -> Result<Option<Self::Plan>>;

    /// Commits a plan returned by [ReservationManager::query].
    fn accept(&mut self, plan: &Self::Plan) -> Self::ReservationId;

    /// Releases a reservation. Does nothing if it no longer exists.
    fn cancel(&mut self, id: Self::ReservationId);

    fn has_reservation(&self, id: Self::ReservationId) -> bool;

    /// The time up to which the manager has been advanced.
    fn current_time(&self) -> f64;
}

/// A request to cross a connection.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    /// The vehicle asking, which also identifies the reservation.
    pub vehicle: VehicleId,
    /// When the front of the vehicle reaches the area, in s.
    pub arrival_time: f64,
    /// The velocity on arrival in m/s.
    pub arrival_velocity: f64,
    pub arrival_lane: LaneId,
    pub departure_lane: LaneId,
    pub spec: VehicleSpec,
    /// The velocity not to exceed while crossing, in m/s.
    pub max_velocity: f64,
    pub traversal: Traversal,
}

impl Query {
    fn validate(&self) -> Result<()> {
        self.spec.validate()?;
        for (name, value) in [
            ("arrival time", self.arrival_time),
            ("arrival velocity", self.arrival_velocity),
            ("maximum velocity", self.max_velocity),
        ] {
            if !value.is_finite() {
                return Err(Error::InvalidQuery(format!("{name} is not finite")));
            }
        }
        if self.arrival_velocity < 0.0 || self.max_velocity < 0.0 {
            return Err(Error::InvalidQuery("velocities must not be negative".into()));
        }
        let can_move = self.arrival_velocity > 0.0
            || (self.traversal == Traversal::Accelerate && self.max_velocity > 0.0);
        if !can_move {
            return Err(Error::InvalidQuery(format!(
                "a vehicle arriving at {} m/s with {:?} traversal never moves",
                self.arrival_velocity, self.traversal
            )));
        }
        Ok(())
    }
}

/// The outcome of a successful query: the time tiles to reserve and how the
/// vehicle must drive to stay within them.
#[derive(Clone, Debug, PartialEq)]
pub struct Plan {
    vehicle: VehicleId,
    arrival_time: f64,
    exit_time: f64,
    exit_velocity: f64,
    time_tiles: Vec<TimeTile>,
    profile: AccelerationProfile,
}

impl Plan {
    pub fn vehicle(&self) -> VehicleId {
        self.vehicle
    }

    pub fn arrival_time(&self) -> f64 {
        self.arrival_time
    }

    /// When the vehicle has fully left the area, in s.
    pub fn exit_time(&self) -> f64 {
        self.exit_time
    }

    pub fn exit_velocity(&self) -> f64 {
        self.exit_velocity
    }

    /// The time tiles to reserve, in the order the trial visited them.
    /// May contain duplicates.
    pub fn time_tiles(&self) -> &[TimeTile] {
        &self.time_tiles
    }

    pub fn profile(&self) -> &AccelerationProfile {
        &self.profile
    }
}

/// Grants vehicles exclusive use of tiles of a connection's area over time.
///
/// Queries only read the ledger; `accept`, `cancel` and `act` need exclusive
/// access, so one manager cannot be mutated between a query and its accept
/// by anyone other than the holder of `&mut self`.
#[derive(Debug)]
pub struct ReservationGridManager<S: Steering = LaneFollowing> {
    config: Config,
    connection: Arc<Connection>,
    tiled_area: TiledArea,
    grid: ReservationGrid,
    steering: S,
}

impl ReservationGridManager {
    /// Creates a manager for `connection` which steers trial vehicles by lane following.
    pub fn new(config: Config, connection: Arc<Connection>) -> Result<Self> {
        Self::with_steering(config, connection, LaneFollowing::default())
    }
}

impl<S: Steering> ReservationGridManager<S> {
    pub fn with_steering(config: Config, connection: Arc<Connection>, steering: S) -> Result<Self> {
        config.validate()?;
        let tiled_area = TiledArea::new(connection.area(), config.granularity)?;
        let grid = ReservationGrid::new(config.grid_time_step);
        Ok(Self {
            config,
            connection,
            tiled_area,
            grid,
            steering,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    pub fn tiled_area(&self) -> &TiledArea {
        &self.tiled_area
    }

    pub fn grid(&self) -> &ReservationGrid {
        &self.grid
    }

    /// Drives a trial vehicle across the connection and collects the time
    /// tiles it needs.
    ///
    /// Returns `Ok(None)` if any of them is already reserved. Errors are
    /// reserved for queries which can never be satisfied and for broken
    /// invariants (see [Error::is_fatal]).
    pub fn query(&self, query: &Query) -> Result<Option<Plan>> {
        query.validate()?;
        let path = self.connection.path(query.arrival_lane, query.departure_lane)?;
        let entry = self.connection.entry_point(query.arrival_lane)?;
        let area = self.tiled_area.area();

        let mut vehicle = TrialVehicle::new(
            query.spec,
            entry.point,
            entry.heading,
            entry.pos,
            query.arrival_velocity,
        );
        match query.traversal {
            Traversal::Coast => vehicle.coast(),
            Traversal::Accelerate => vehicle.accelerate_to_ceiling(query.max_velocity),
        }

        let mut time = self.grid.try_quantize(query.arrival_time).ok_or_else(|| {
            Error::InvalidQuery(format!(
                "arrival time {} is outside the reservation grid",
                query.arrival_time
            ))
        })?;
        let mut dt = self.grid.remaining_in_step(query.arrival_time);
        let mut time_tiles = Vec::new();
        let mut steps = 0;

        while vehicle.footprint(0.0).intersects(area) {
            if steps == MAX_TRIAL_STEPS {
                log::warn!(
                    "trial for {:?} still inside the area after {} steps",
                    query.vehicle,
                    steps
                );
                return Err(Error::TrialDidNotExit { steps });
            }
            vehicle.advance(&path, &self.steering, dt);
            time = time.saturating_add(1);
            steps += 1;

            let footprint = vehicle.footprint(self.config.static_buffer);
            let tiles = self.tiled_area.find_occupied_tiles(&footprint);
            debug_polygon("footprint", &footprint);
            debug_tiles(time, tiles.iter().map(|t| t.id()));
            log::trace!("trial step {} at t={} occupies {} tiles", steps, time, tiles.len());

            for tile in tiles {
                let buffer = self.config.buffer_steps(tile.is_edge());
                for t in time.saturating_sub(buffer)..=time.saturating_add(buffer) {
                    if let Some(owner) = self.grid.owner(t, tile.id()) {
                        log::debug!(
                            "query from {:?} blocked at ({}, {:?}) by {:?}",
                            query.vehicle,
                            t,
                            tile.id(),
                            owner
                        );
                        return Ok(None);
                    }
                    time_tiles.push(TimeTile::new(t, tile.id()));
                }
            }

            dt = self.grid.grid_time_step();
        }

        let exit_time = self.grid.dequantize(time);
        let profile = AccelerationProfile::new(
            query.traversal,
            query.arrival_velocity,
            query.max_velocity,
            query.spec.max_acceleration,
            exit_time - query.arrival_time,
        )?;

        log::debug!(
            "query from {:?} clear: {} time tiles, exit at {:.3}s",
            query.vehicle,
            time_tiles.len(),
            exit_time
        );

        Ok(Some(Plan {
            vehicle: query.vehicle,
            arrival_time: query.arrival_time,
            exit_time,
            exit_velocity: vehicle.vel(),
            time_tiles,
            profile,
        }))
    }

    /// Commits a plan and returns the reservation ID.
    ///
    /// # Panics
    /// If any of the plan's time tiles has been reserved by another vehicle
    /// since the plan was made.
    pub fn accept(&mut self, plan: &Plan) -> VehicleId {
        match self.try_accept(plan) {
            Ok(id) => id,
            Err(err) => {
                log::error!("failed to accept a plan that passed its trial: {err}");
                panic!("reservation ledger invariant broken: {err}");
            }
        }
    }

    /// Commits a plan, failing without changes if any of its time tiles
    /// has been reserved by another vehicle since the plan was made.
    pub fn try_accept(&mut self, plan: &Plan) -> Result<VehicleId> {
        self.grid.reserve(plan.vehicle, &plan.time_tiles)?;
        log::debug!(
            "accepted plan for {:?} exiting at {:.3}s",
            plan.vehicle,
            plan.exit_time
        );
        Ok(plan.vehicle)
    }

    /// Releases every time tile held by a reservation.
    pub fn cancel(&mut self, id: VehicleId) {
        self.grid.cancel(id);
    }

    /// Advances time by `time_step` and discards reservations now in the past.
    pub fn act(&mut self, time_step: f64) {
        self.grid.advance_to(self.grid.current_time() + time_step);
        self.grid.cleanup();
    }

    /// Advances time by the configured simulation time step.
    pub fn step(&mut self) {
        self.act(self.config.time_step);
    }

    pub fn has_reservation(&self, id: VehicleId) -> bool {
        self.grid.has_reservation(id)
    }

    pub fn current_time(&self) -> f64 {
        self.grid.current_time()
    }

    /// Drains the debug shapes recorded by trials on this thread.
    #[cfg(feature = "debug")]
    pub fn take_debug_frame(&self) -> serde_json::Value {
        crate::debug::take_debug_frame()
    }
}

impl<S: Steering> ReservationManager for ReservationGridManager<S> {
    type Query = Query;
    type Plan = Plan;
    type ReservationId = VehicleId;

    fn query(&self, query: &Query) -> Result<Option<Plan>> {
        ReservationGridManager::query(self, query)
    }

    fn accept(&mut self, plan: &Plan) -> VehicleId {
        ReservationGridManager::accept(self, plan)
    }

    fn cancel(&mut self, id: VehicleId) {
        ReservationGridManager::cancel(self, id)
    }

    fn has_reservation(&self, id: VehicleId) -> bool {
        ReservationGridManager::has_reservation(self, id)
    }

    fn current_time(&self) -> f64 {
        ReservationGridManager::current_time(self)
    }
}
