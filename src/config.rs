//! Configuration surface for an optimization run.
//!
//! [`SwarmConfig`] carries the swarm hyperparameters, [`GroupConfig`] the
//! per-parameter-group physical bounds and addressing mode, and
//! [`ObjectiveConfig`] the per-objective sampling settings. Everything is
//! validated before the control loop starts; configuration problems are
//! fatal and abort the run.

use std::time::Duration;

use crate::{Error, Result};

/// Physical bounds and addressing mode for one parameter group.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupConfig {
    /// Lower physical bound, applied to every quantity in the group.
    pub lower_bound: f64,
    /// Upper physical bound, applied to every quantity in the group.
    pub upper_bound: f64,
    /// Whether the group's coordinate is an offset from the initial value.
    pub relative: bool,
    /// Number of physical quantities the group drives.
    pub size: usize,
}

impl GroupConfig {
    /// Validates bounds and size.
    ///
    /// # Errors
    ///
    /// Returns the configuration-class error describing the first problem.
    pub fn validate(&self, index: usize) -> Result<()> {
        if self.size == 0 {
            return Err(Error::EmptyGroup { index });
        }
        for (name, value) in [
            ("lower_bound", self.lower_bound),
            ("upper_bound", self.upper_bound),
        ] {
            if !value.is_finite() {
                return Err(Error::NonFiniteSetting { name, value });
            }
        }
        if self.lower_bound > self.upper_bound {
            return Err(Error::InvalidBounds {
                lower: self.lower_bound,
                upper: self.upper_bound,
            });
        }
        Ok(())
    }
}

/// Sampling settings for one objective channel.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectiveConfig {
    /// Minimum number of samples per measurement (at least 1).
    pub min_sample_count: usize,
    /// Delay between consecutive samples, to decorrelate noise.
    pub sample_delay: Duration,
}

impl ObjectiveConfig {
    /// Validates the sample count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroCount`] if `min_sample_count` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.min_sample_count == 0 {
            return Err(Error::ZeroCount {
                name: "min_sample_count",
            });
        }
        Ok(())
    }
}

/// Swarm hyperparameters for one optimization run.
///
/// Defaults follow the operational recommendations of the original control
/// room tool: swarm size 50, 5 iterations, inertia 0.5, social weight 1.5,
/// cognitive weight 2.0.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwarmConfig {
    /// Number of particles in the swarm.
    pub swarm_size: usize,
    /// Number of iterations to run.
    pub max_iterations: usize,
    /// Inertia weight on the previous velocity.
    pub inertia: f64,
    /// Attraction toward the assigned leader.
    pub social_weight: f64,
    /// Attraction toward the personal best.
    pub cognitive_weight: f64,
    /// Whether to overwrite one particle with the machine's current state.
    pub seed_with_current_state: bool,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            swarm_size: 50,
            max_iterations: 5,
            inertia: 0.5,
            social_weight: 1.5,
            cognitive_weight: 2.0,
            seed_with_current_state: true,
        }
    }
}

impl SwarmConfig {
    /// Creates a builder pre-loaded with the default settings.
    #[must_use]
    pub fn builder() -> SwarmConfigBuilder {
        SwarmConfigBuilder::default()
    }

    /// Validates all settings.
    ///
    /// # Errors
    ///
    /// Returns the configuration-class error describing the first problem:
    /// zero counts or non-finite weights.
    pub fn validate(&self) -> Result<()> {
        if self.swarm_size == 0 {
            return Err(Error::ZeroCount { name: "swarm_size" });
        }
        if self.max_iterations == 0 {
            return Err(Error::ZeroCount {
                name: "max_iterations",
            });
        }
        for (name, value) in [
            ("inertia", self.inertia),
            ("social_weight", self.social_weight),
            ("cognitive_weight", self.cognitive_weight),
        ] {
            if !value.is_finite() {
                return Err(Error::NonFiniteSetting { name, value });
            }
        }
        Ok(())
    }
}

/// Builder for [`SwarmConfig`].
#[derive(Clone, Debug, Default)]
pub struct SwarmConfigBuilder {
    swarm_size: Option<usize>,
    max_iterations: Option<usize>,
    inertia: Option<f64>,
    social_weight: Option<f64>,
    cognitive_weight: Option<f64>,
    seed_with_current_state: Option<bool>,
}

impl SwarmConfigBuilder {
    /// Sets the number of particles. Default: 50.
    #[must_use]
    pub fn swarm_size(mut self, size: usize) -> Self {
        self.swarm_size = Some(size);
        self
    }

    /// Sets the number of iterations. Default: 5.
    #[must_use]
    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    /// Sets the inertia weight. Default: 0.5.
    #[must_use]
    pub fn inertia(mut self, inertia: f64) -> Self {
        self.inertia = Some(inertia);
        self
    }

    /// Sets the social (leader-attraction) weight. Default: 1.5.
    #[must_use]
    pub fn social_weight(mut self, weight: f64) -> Self {
        self.social_weight = Some(weight);
        self
    }

    /// Sets the cognitive (personal-best-attraction) weight. Default: 2.0.
    #[must_use]
    pub fn cognitive_weight(mut self, weight: f64) -> Self {
        self.cognitive_weight = Some(weight);
        self
    }

    /// Sets whether one particle is seeded with the machine's current state.
    /// Default: true.
    #[must_use]
    pub fn seed_with_current_state(mut self, seed: bool) -> Self {
        self.seed_with_current_state = Some(seed);
        self
    }

    /// Builds the configured [`SwarmConfig`].
    #[must_use]
    pub fn build(self) -> SwarmConfig {
        let defaults = SwarmConfig::default();
        SwarmConfig {
            swarm_size: self.swarm_size.unwrap_or(defaults.swarm_size),
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
            inertia: self.inertia.unwrap_or(defaults.inertia),
            social_weight: self.social_weight.unwrap_or(defaults.social_weight),
            cognitive_weight: self.cognitive_weight.unwrap_or(defaults.cognitive_weight),
            seed_with_current_state: self
                .seed_with_current_state
                .unwrap_or(defaults.seed_with_current_state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SwarmConfig::default().validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let config = SwarmConfig::builder()
            .swarm_size(8)
            .max_iterations(3)
            .inertia(0.7)
            .build();
        assert_eq!(config.swarm_size, 8);
        assert_eq!(config.max_iterations, 3);
        assert!((config.inertia - 0.7).abs() < 1e-12);
        // Unset fields keep their defaults.
        assert!((config.social_weight - 1.5).abs() < 1e-12);
        assert!(config.seed_with_current_state);
    }

    #[test]
    fn test_zero_swarm_rejected() {
        let config = SwarmConfig::builder().swarm_size(0).build();
        assert!(matches!(
            config.validate().unwrap_err(),
            Error::ZeroCount { name: "swarm_size" }
        ));
    }

    #[test]
    fn test_non_finite_weight_rejected() {
        let config = SwarmConfig::builder().inertia(f64::NAN).build();
        assert!(matches!(
            config.validate().unwrap_err(),
            Error::NonFiniteSetting { name: "inertia", .. }
        ));
    }

    #[test]
    fn test_group_config_validation() {
        let good = GroupConfig {
            lower_bound: -1.0,
            upper_bound: 1.0,
            relative: true,
            size: 2,
        };
        assert!(good.validate(0).is_ok());

        let swapped = GroupConfig {
            lower_bound: 1.0,
            upper_bound: -1.0,
            ..good.clone()
        };
        assert!(matches!(
            swapped.validate(0).unwrap_err(),
            Error::InvalidBounds { .. }
        ));

        let empty = GroupConfig { size: 0, ..good };
        assert!(matches!(
            empty.validate(3).unwrap_err(),
            Error::EmptyGroup { index: 3 }
        ));
    }

    #[test]
    fn test_objective_config_validation() {
        let cfg = ObjectiveConfig {
            min_sample_count: 0,
            sample_delay: Duration::ZERO,
        };
        assert!(cfg.validate().is_err());
    }
}
