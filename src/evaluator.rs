//! The machine-facing evaluation contract.
//!
//! The control loop talks to the outside world only through [`Evaluator`]:
//! apply a set of abstract coordinates, take one noisy measurement per
//! objective, and (for current-state seeding) read the machine's present
//! position. Device-layer failures surface as
//! [`Error::Actuation`](crate::Error::Actuation) and
//! [`Error::Measurement`](crate::Error::Measurement); the core does not
//! retry — retry policy belongs to the implementation.
//!
//! [`ChannelEvaluator`] is a simulation-grade implementation backed by
//! closures over the physical settings, suitable for tests, dry runs, and
//! offline models of the machine.

use crate::mapping::ParameterMap;
use crate::stats::{self, Measurement};
use crate::{Error, ObjectiveConfig, Result};

/// Collaborator that applies settings and performs measurements.
pub trait Evaluator {
    /// Number of objectives a call to [`measure`](Self::measure) reports.
    fn objective_count(&self) -> usize;

    /// Applies the given abstract coordinates to the machine.
    ///
    /// May block for a hardware settle delay.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Actuation`](crate::Error::Actuation) if any physical
    /// write fails.
    fn set_parameters(&mut self, abstract_coords: &[f64]) -> Result<()>;

    /// Takes one [`Measurement`] per configured objective at the current
    /// settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Measurement`](crate::Error::Measurement) on device
    /// or communication failure.
    fn measure(&mut self) -> Result<Vec<Measurement>>;

    /// Reads the machine's current position in abstract coordinates.
    ///
    /// Only used when seeding the swarm with the current state.
    ///
    /// # Errors
    ///
    /// Returns a device-layer error if the read fails.
    fn current_position(&mut self) -> Result<Vec<f64>>;
}

/// One simulated objective channel: its sampling settings and a reading
/// function over the physical settings.
struct Channel {
    config: ObjectiveConfig,
    sample: Box<dyn FnMut(&[f64]) -> f64 + Send>,
}

/// A closure-backed [`Evaluator`] for simulations and tests.
///
/// Abstract coordinates pass through a [`ParameterMap`] into physical
/// settings; each objective channel reads a scalar from those settings and
/// is condensed by [`stats::measure`] with its configured sample count and
/// delay. Noise models live inside the channel closures.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use mopso::evaluator::{ChannelEvaluator, Evaluator};
/// use mopso::mapping::{ParameterGroup, ParameterMap};
/// use mopso::ObjectiveConfig;
///
/// let map = ParameterMap::new(vec![ParameterGroup::absolute(1)]).unwrap();
/// let mut evaluator = ChannelEvaluator::new(map, vec![0.0]);
/// evaluator.add_channel(
///     ObjectiveConfig { min_sample_count: 1, sample_delay: Duration::ZERO },
///     |mp| -mp[0].abs(),
/// );
///
/// evaluator.set_parameters(&[0.5]).unwrap();
/// let measurements = evaluator.measure().unwrap();
/// assert!((measurements[0].mean + 0.5).abs() < 1e-12);
/// ```
pub struct ChannelEvaluator {
    map: ParameterMap,
    settings: Vec<f64>,
    channels: Vec<Channel>,
}

impl ChannelEvaluator {
    /// Creates an evaluator with the given map and initial physical settings.
    #[must_use]
    pub fn new(map: ParameterMap, initial_settings: Vec<f64>) -> Self {
        Self {
            map,
            settings: initial_settings,
            channels: Vec::new(),
        }
    }

    /// Adds one objective channel.
    pub fn add_channel(
        &mut self,
        config: ObjectiveConfig,
        sample: impl FnMut(&[f64]) -> f64 + Send + 'static,
    ) {
        self.channels.push(Channel {
            config,
            sample: Box::new(sample),
        });
    }

    /// The parameter map, exposing the abstract→physical audit table.
    #[must_use]
    pub fn map(&self) -> &ParameterMap {
        &self.map
    }

    /// The current physical settings.
    #[must_use]
    pub fn settings(&self) -> &[f64] {
        &self.settings
    }
}

impl Evaluator for ChannelEvaluator {
    fn objective_count(&self) -> usize {
        self.channels.len()
    }

    fn set_parameters(&mut self, abstract_coords: &[f64]) -> Result<()> {
        self.settings = self.map.to_physical(abstract_coords)?;
        Ok(())
    }

    fn measure(&mut self) -> Result<Vec<Measurement>> {
        if self.channels.is_empty() {
            return Err(Error::Measurement("no objective channels configured".into()));
        }

        let settings = &self.settings;
        let mut measurements = Vec::with_capacity(self.channels.len());
        for channel in &mut self.channels {
            let sample = &mut channel.sample;
            let measurement = stats::measure(
                channel.config.min_sample_count,
                channel.config.sample_delay,
                || Ok(sample(settings)),
            )?;
            measurements.push(measurement);
        }
        Ok(measurements)
    }

    fn current_position(&mut self) -> Result<Vec<f64>> {
        self.map.to_abstract(&self.settings)
    }
}
