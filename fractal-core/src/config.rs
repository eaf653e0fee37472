use rand::Rng;
use thiserror::Error;

use crate::types::{MAX_DEPTH, MIN_DEPTH};

/// Closed interval a per-node parameter is drawn from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
}

impl ParamRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Draws a uniform sample from `[min, max]`.
    pub fn sample(&self, rng: &mut impl Rng) -> f32 {
        if self.min == self.max {
            self.min
        } else {
            rng.random_range(self.min..=self.max)
        }
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// Which world-rotation policy the per-level update applies.
///
/// The composition orders differ on purpose; see
/// [`crate::update::update_level`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// Children offset along the parent-rotated slot direction.
    Rigid,
    /// Children anchored along local up, with a droop rotation tilting
    /// sideways branches toward horizontal.
    #[default]
    Sagging,
}

#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Number of levels, including the root. Valid range is
    /// `MIN_DEPTH..=MAX_DEPTH`.
    pub depth: usize,
    pub mode: UpdateMode,
    /// Per-node spin speed in radians per second.
    pub spin_velocity: ParamRange,
    /// Probability of flipping a node's spin direction at construction.
    pub reverse_spin_chance: f64,
    /// Per-node maximum droop angle in radians (`Sagging` mode only).
    pub max_sag_angle: ParamRange,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            depth: 6,
            mode: UpdateMode::default(),
            spin_velocity: ParamRange::new(0.1, 0.6),
            reverse_spin_chance: 0.25,
            max_sag_angle: ParamRange::new(15f32.to_radians(), 45f32.to_radians()),
        }
    }
}

impl Config {
    /// Checks the configuration before any arrays are allocated.
    ///
    /// ### Returns
    /// `Ok(())` if a tree may be built from this configuration, or the
    /// first violated constraint otherwise.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_DEPTH..=MAX_DEPTH).contains(&self.depth) {
            return Err(ConfigError::DepthOutOfRange(self.depth));
        }
        if !self.spin_velocity.is_valid() {
            return Err(ConfigError::InvalidRange {
                name: "spin_velocity",
                min: self.spin_velocity.min,
                max: self.spin_velocity.max,
            });
        }
        if !self.max_sag_angle.is_valid() {
            return Err(ConfigError::InvalidRange {
                name: "max_sag_angle",
                min: self.max_sag_angle.min,
                max: self.max_sag_angle.max,
            });
        }
        if !(0.0..=1.0).contains(&self.reverse_spin_chance) {
            return Err(ConfigError::ChanceOutOfRange(self.reverse_spin_chance));
        }
        Ok(())
    }
}

/// Rejected configuration; reported before the previous tree (if any)
/// is touched.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("depth {0} outside supported range {min}..={max}", min = MIN_DEPTH, max = MAX_DEPTH)]
    DepthOutOfRange(usize),
    #[error("{name} range invalid: min {min} must be finite and <= max {max}")]
    InvalidRange {
        name: &'static str,
        min: f32,
        max: f32,
    },
    #[error("reverse spin chance {0} outside [0, 1]")]
    ChanceOutOfRange(f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn depth_outside_bounds_is_rejected() {
        let mut cfg = Config::default();
        cfg.depth = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::DepthOutOfRange(0)));

        cfg.depth = MAX_DEPTH + 1;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::DepthOutOfRange(MAX_DEPTH + 1))
        );
    }

    #[test]
    fn inverted_range_is_rejected() {
        let mut cfg = Config::default();
        cfg.spin_velocity = ParamRange::new(1.0, 0.5);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidRange {
                name: "spin_velocity",
                ..
            })
        ));

        let mut cfg = Config::default();
        cfg.max_sag_angle = ParamRange::new(0.2, f32::NAN);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidRange {
                name: "max_sag_angle",
                ..
            })
        ));
    }

    #[test]
    fn chance_outside_unit_interval_is_rejected() {
        let mut cfg = Config::default();
        cfg.reverse_spin_chance = 1.5;
        assert_eq!(cfg.validate(), Err(ConfigError::ChanceOutOfRange(1.5)));
    }

    #[test]
    fn sample_stays_inside_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = ParamRange::new(0.25, 0.75);
        for _ in 0..100 {
            let v = range.sample(&mut rng);
            assert!((0.25..=0.75).contains(&v));
        }
    }

    #[test]
    fn degenerate_range_samples_its_single_value() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = ParamRange::new(0.5, 0.5);
        assert_eq!(range.sample(&mut rng), 0.5);
    }
}
