use crate::{Error, Result, TileId, VehicleId};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use slotmap::{Key, SecondaryMap};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Slack applied when quantizing so times computed by summing steps land in
/// the intended slot.
const QUANTIZE_EPSILON: f64 = 1e-9;

/// The largest magnitude of a discrete time the grid works with.
pub const MAX_DISCRETE_TIME: i64 = 1 << 52;

/// A tile during one slot of the reservation grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeTile {
    /// The discrete time, in grid steps.
    pub time: i64,
    pub tile: TileId,
}

impl TimeTile {
    pub const fn new(time: i64, tile: TileId) -> Self {
        Self { time, tile }
    }
}

/// The ledger of reserved time tiles.
///
/// Each time tile belongs to at most one vehicle. Slots earlier than the
/// current time are discarded by [ReservationGrid::cleanup].
#[derive(Clone, Debug)]
pub struct ReservationGrid {
    grid_time_step: f64,
    current_time: f64,
    /// Owners of each reserved slot, by discrete time.
    slots: BTreeMap<i64, HashMap<TileId, VehicleId>>,
    /// The slots held by each vehicle.
    owners: SecondaryMap<VehicleId, HashSet<TimeTile>>,
}

impl ReservationGrid {
    /// Creates an empty grid starting at time zero.
    pub fn new(grid_time_step: f64) -> Self {
        Self {
            grid_time_step,
            current_time: 0.0,
            slots: BTreeMap::new(),
            owners: SecondaryMap::new(),
        }
    }

    pub fn grid_time_step(&self) -> f64 {
        self.grid_time_step
    }

    /// The time the grid has been advanced to.
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// The discrete time of the slot containing `time`.
    pub fn quantize(&self, time: f64) -> i64 {
        (time / self.grid_time_step + QUANTIZE_EPSILON).floor() as i64
    }

    /// Like [ReservationGrid::quantize], but `None` if the slot lies beyond
    /// [MAX_DISCRETE_TIME] in either direction.
    pub fn try_quantize(&self, time: f64) -> Option<i64> {
        let slot = (time / self.grid_time_step + QUANTIZE_EPSILON).floor();
        (slot.abs() <= MAX_DISCRETE_TIME as f64).then_some(slot as i64)
    }

    /// The start of the slot `time`.
    pub fn dequantize(&self, time: i64) -> f64 {
        time as f64 * self.grid_time_step
    }

    /// The time from `time` to the start of the next slot, in `(0, grid_time_step]`.
    pub fn remaining_in_step(&self, time: f64) -> f64 {
        let remaining = self.dequantize(self.quantize(time).saturating_add(1)) - time;
        remaining.clamp(f64::MIN_POSITIVE, self.grid_time_step)
    }

    /// The owner of a time tile, if it is reserved.
    pub fn owner(&self, time: i64, tile: TileId) -> Option<VehicleId> {
        self.slots.get(&time)?.get(&tile).copied()
    }

    pub fn is_reserved(&self, time: i64, tile: TileId) -> bool {
        self.owner(time, tile).is_some()
    }

    /// Reserves every time tile for `owner`, or none of them.
    ///
    /// Time tiles already held by `owner` are left as they are. Fails with
    /// [Error::SlotTaken] if another vehicle holds any of them, and with
    /// [Error::InvalidOwner] if `owner` is the null key.
    pub fn reserve(&mut self, owner: VehicleId, time_tiles: &[TimeTile]) -> Result<()> {
        if owner.is_null() {
            return Err(Error::InvalidOwner(owner));
        }
        if let Some((tt, other)) = time_tiles
            .iter()
            .find_map(|tt| self.owner(tt.time, tt.tile).filter(|o| *o != owner).map(|o| (tt, o)))
        {
            return Err(Error::SlotTaken {
                time: tt.time,
                tile: tt.tile,
                owner: other,
            });
        }

        if time_tiles.is_empty() {
            return Ok(());
        }
        let held = match self.owners.entry(owner) {
            Some(entry) => entry.or_default(),
            None => return Err(Error::InvalidOwner(owner)),
        };
        for tt in time_tiles {
            self.slots.entry(tt.time).or_default().insert(tt.tile, owner);
            held.insert(*tt);
        }
        Ok(())
    }

    /// Releases every time tile held by `owner`.
    pub fn cancel(&mut self, owner: VehicleId) {
        let Some(held) = self.owners.remove(owner) else {
            return;
        };
        for tt in &held {
            if let Some(tiles) = self.slots.get_mut(&tt.time) {
                tiles.remove(&tt.tile);
                if tiles.is_empty() {
                    self.slots.remove(&tt.time);
                }
            }
        }
        log::debug!("released {} time tiles held by {:?}", held.len(), owner);
    }

    /// Moves the current time forward to `time`. Time never moves backwards.
    pub fn advance_to(&mut self, time: f64) {
        self.current_time = self.current_time.max(time);
    }

    /// Discards every slot before the current time.
    pub fn cleanup(&mut self) {
        let now = self.quantize(self.current_time);
        let current = self.slots.split_off(&now);
        let expired = std::mem::replace(&mut self.slots, current);
        if expired.is_empty() {
            return;
        }

        let mut evicted = 0;
        for (time, tiles) in expired {
            for (tile, owner) in tiles {
                if let Some(held) = self.owners.get_mut(owner) {
                    held.remove(&TimeTile::new(time, tile));
                }
                evicted += 1;
            }
        }
        self.owners.retain(|_, held| !held.is_empty());
        log::trace!("evicted {evicted} expired time tiles");
    }

    /// Whether `owner` holds any time tiles.
    pub fn has_reservation(&self, owner: VehicleId) -> bool {
        self.owners.contains_key(owner)
    }

    /// The time tiles held by `owner`, in time order.
    pub fn reserved_by(&self, owner: VehicleId) -> Vec<TimeTile> {
        let mut tiles: Vec<_> = self
            .owners
            .get(owner)
            .map(|held| held.iter().copied().collect())
            .unwrap_or_default();
        tiles.sort_unstable();
        tiles
    }

    /// The number of reserved time tiles.
    pub fn len(&self) -> usize {
        self.slots.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
