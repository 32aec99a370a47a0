use crate::{Error, Result};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Slack used when converting durations into whole grid steps.
const STEP_EPSILON: f64 = 1e-9;

/// The longest time buffer allowed, in grid steps.
pub const MAX_TIME_BUFFER_STEPS: i64 = 1 << 16;

/// Tuning parameters of a reservation grid manager.
///
/// Distances are in metres and times in seconds.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct Config {
    /// The simulation time step, used by [`crate::ReservationGridManager::step`].
    pub time_step: f64,
    /// The duration of one slot of the reservation grid.
    pub grid_time_step: f64,
    /// Added to each side of the vehicle footprint.
    pub static_buffer: f64,
    /// Time buffer around slots on internal tiles.
    pub internal_tile_time_buffer: f64,
    /// Time buffer around slots on edge tiles.
    pub edge_tile_time_buffer: f64,
    /// Whether edge tiles use `edge_tile_time_buffer`.
    pub is_edge_tile_time_buffer_enabled: bool,
    /// Side length of a tile.
    pub granularity: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_step: 0.02,
            grid_time_step: 0.02,
            static_buffer: 0.25,
            internal_tile_time_buffer: 0.1,
            edge_tile_time_buffer: 0.25,
            is_edge_tile_time_buffer_enabled: true,
            granularity: 1.0,
        }
    }
}

impl Config {
    /// Parses a config from JSON, filling missing fields with defaults.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("time_step", self.time_step),
            ("grid_time_step", self.grid_time_step),
            ("static_buffer", self.static_buffer),
            ("internal_tile_time_buffer", self.internal_tile_time_buffer),
            ("edge_tile_time_buffer", self.edge_tile_time_buffer),
            ("granularity", self.granularity),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, value)| !value.is_finite()) {
            return Err(Error::InvalidConfig(format!("{name} is not finite ({value})")));
        }
        for (name, value) in [
            ("time_step", self.time_step),
            ("grid_time_step", self.grid_time_step),
            ("granularity", self.granularity),
        ] {
            if value <= 0.0 {
                return Err(Error::InvalidConfig(format!("{name} must be positive, got {value}")));
            }
        }
        for (name, value) in [
            ("static_buffer", self.static_buffer),
            ("internal_tile_time_buffer", self.internal_tile_time_buffer),
            ("edge_tile_time_buffer", self.edge_tile_time_buffer),
        ] {
            if value < 0.0 {
                return Err(Error::InvalidConfig(format!("{name} must not be negative, got {value}")));
            }
        }
        for (name, value) in [
            ("internal_tile_time_buffer", self.internal_tile_time_buffer),
            ("edge_tile_time_buffer", self.edge_tile_time_buffer),
        ] {
            if value / self.grid_time_step > MAX_TIME_BUFFER_STEPS as f64 {
                return Err(Error::InvalidConfig(format!(
                    "{name} {value} exceeds {MAX_TIME_BUFFER_STEPS} grid steps"
                )));
            }
        }

        let ratio = self.time_step / self.grid_time_step;
        if (ratio - ratio.round()).abs() > 1e-6 {
            log::warn!(
                "time step {} is not a multiple of the grid time step {}",
                self.time_step,
                self.grid_time_step
            );
        }
        for (name, buffer, steps) in [
            ("internal", self.internal_tile_time_buffer, self.internal_buffer_steps()),
            ("edge", self.edge_tile_time_buffer, self.edge_buffer_steps()),
        ] {
            if buffer > 0.0 && steps == 0 {
                log::warn!(
                    "{name} tile time buffer {buffer} is shorter than one grid step and has no effect"
                );
            }
        }

        Ok(())
    }

    /// The internal tile time buffer in whole grid steps.
    pub fn internal_buffer_steps(&self) -> i64 {
        self.to_steps(self.internal_tile_time_buffer)
    }

    /// The edge tile time buffer in whole grid steps.
    pub fn edge_buffer_steps(&self) -> i64 {
        self.to_steps(self.edge_tile_time_buffer)
    }

    /// The time buffer, in grid steps, for a tile.
    pub fn buffer_steps(&self, is_edge: bool) -> i64 {
        if is_edge && self.is_edge_tile_time_buffer_enabled {
            self.edge_buffer_steps()
        } else {
            self.internal_buffer_steps()
        }
    }

    fn to_steps(&self, buffer: f64) -> i64 {
        (buffer / self.grid_time_step + STEP_EPSILON).floor() as i64
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.internal_buffer_steps(), 5);
        assert_eq!(config.edge_buffer_steps(), 12);
        assert_eq!(config.buffer_steps(true), 12);
        assert_eq!(config.buffer_steps(false), 5);
    }

    #[test]
    fn edge_buffer_can_be_disabled() {
        let config = Config {
            is_edge_tile_time_buffer_enabled: false,
            ..Default::default()
        };
        assert_eq!(config.buffer_steps(true), config.internal_buffer_steps());
    }

    #[test]
    fn rejects_bad_values() {
        let bad = [
            Config { grid_time_step: 0.0, ..Default::default() },
            Config { time_step: -0.1, ..Default::default() },
            Config { granularity: f64::NAN, ..Default::default() },
            Config { static_buffer: -1.0, ..Default::default() },
            Config { edge_tile_time_buffer: f64::INFINITY, ..Default::default() },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        }
    }

    #[test]
    fn time_buffers_are_bounded() {
        let long = Config {
            edge_tile_time_buffer: 1e300,
            ..Default::default()
        };
        assert!(matches!(long.validate(), Err(Error::InvalidConfig(_))));

        let longest = Config {
            grid_time_step: 0.5,
            internal_tile_time_buffer: MAX_TIME_BUFFER_STEPS as f64 * 0.5,
            edge_tile_time_buffer: MAX_TIME_BUFFER_STEPS as f64 * 0.5 + 1.0,
            ..Default::default()
        };
        assert!(matches!(longest.validate(), Err(Error::InvalidConfig(_))));
        let longest = Config {
            edge_tile_time_buffer: 0.0,
            ..longest
        };
        assert!(longest.validate().is_ok());
        assert_eq!(longest.internal_buffer_steps(), MAX_TIME_BUFFER_STEPS);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn parses_partial_json() {
        let config = Config::from_json(r#"{ "grid_time_step": 0.1, "granularity": 10.0 }"#).unwrap();
        assert_eq!(config.grid_time_step, 0.1);
        assert_eq!(config.granularity, 10.0);
        assert_eq!(config.static_buffer, 0.25);

        assert!(matches!(
            Config::from_json(r#"{ "granularity": -1.0 }"#),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(Config::from_json("{"), Err(Error::ConfigParse(_))));
    }
}
