use crate::{LaneId, TileId, VehicleId};
use thiserror::Error;

/// Errors raised by the reservation engine.
///
/// A rejected query is not an error; see [`crate::ReservationGridManager::query`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("lane {0:?} does not exist")]
    UnknownLane(LaneId),

    #[error("lane {0:?} never enters the connection area")]
    LaneOutsideArea(LaneId),

    #[error("no route from lane {from:?} to lane {to:?}")]
    NoRoute { from: LaneId, to: LaneId },

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("time tile ({time}, {tile:?}) is already reserved by {owner:?}")]
    SlotTaken {
        time: i64,
        tile: TileId,
        owner: VehicleId,
    },

    #[error("{0:?} cannot hold reservations")]
    InvalidOwner(VehicleId),

    #[error("trial vehicle still inside the area after {steps} steps")]
    TrialDidNotExit { steps: usize },

    #[error("traversal time must be positive, got {0}")]
    NonPositiveTraversal(f64),

    #[cfg(feature = "serde")]
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error indicates a broken invariant rather than bad input.
    ///
    /// [Error::TrialDidNotExit] is not fatal: a vehicle too slow to clear the
    /// area within the trial horizon is a query that cannot be satisfied.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::SlotTaken { .. } | Error::InvalidOwner(_) | Error::NonPositiveTraversal(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
