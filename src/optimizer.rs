//! The optimization control loop.
//!
//! [`Optimizer`] owns the swarm, the random generator, and the elitist
//! archive, and drives the iteration cycle: assign leaders, update
//! velocities and positions, evaluate every particle on the [`Evaluator`],
//! recompute the non-dominated archive from the evaluated swarm together
//! with the previous archive, and persist one snapshot per iteration.
//!
//! A run is steered from outside through a [`RunToken`]: pausing blocks the
//! loop between particle evaluations and cancelling ends the run
//! cooperatively at the next evaluation boundary, archiving whatever the
//! interrupted sweep already measured. Progress is reported after every
//! particle evaluation through a [`ProgressObserver`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::evaluator::Evaluator;
use crate::leader;
use crate::pareto::{self, FrontEntry};
use crate::particle::Particle;
use crate::storage::FrontStore;
use crate::types::RunPhase;
use crate::{Error, Result, SwarmConfig};

/// Polling interval while a run is paused.
const PAUSE_POLL: Duration = Duration::from_millis(10);

// ---------------------------------------------------------------------------
// Run control
// ---------------------------------------------------------------------------

/// Shared handle for pausing and cancelling a run from another thread.
///
/// Cloning is cheap; every clone controls the same run. Both flags are
/// observed between particle evaluations, never mid-measurement, so an
/// in-flight measurement always finishes.
#[derive(Clone, Debug, Default)]
pub struct RunToken {
    inner: Arc<TokenState>,
}

#[derive(Debug, Default)]
struct TokenState {
    pause: AtomicBool,
    cancel: AtomicBool,
}

impl RunToken {
    /// Creates a token with neither flag set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that the run block before its next evaluation.
    pub fn pause(&self) {
        self.inner.pause.store(true, Ordering::SeqCst);
    }

    /// Clears the pause flag, letting a blocked run continue.
    pub fn resume(&self) {
        self.inner.pause.store(false, Ordering::SeqCst);
    }

    /// Requests cooperative cancellation. A paused run is woken as well.
    pub fn cancel(&self) {
        self.inner.cancel.store(true, Ordering::SeqCst);
    }

    /// Returns `true` if a pause has been requested.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.inner.pause.load(Ordering::SeqCst)
    }

    /// Returns `true` if cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.load(Ordering::SeqCst)
    }
}

/// Receives progress updates as the run advances.
///
/// Called after every particle evaluation and while the run is paused, from
/// the thread driving [`Optimizer::run`].
pub trait ProgressObserver: Send + Sync {
    /// `fraction` advances from 0.0 to 1.0 in steps of one per particle
    /// evaluation; `iteration` is the sweep currently being evaluated.
    fn on_progress(&self, fraction: f64, iteration: usize) {
        let _ = (fraction, iteration);
    }
}

/// A [`ProgressObserver`] that discards every update.
#[derive(Clone, Copy, Debug, Default)]
pub struct NopProgress;

impl ProgressObserver for NopProgress {}

// ---------------------------------------------------------------------------
// Optimizer
// ---------------------------------------------------------------------------

/// Outcome of a finished (or cancelled) run.
#[derive(Clone, Debug)]
pub struct RunReport {
    /// The final non-dominated archive.
    pub archive: Vec<FrontEntry>,
    /// Number of iterations whose archive step completed.
    pub iterations: usize,
    /// [`RunPhase::Completed`] or [`RunPhase::Cancelled`].
    pub phase: RunPhase,
}

/// Drives a multi-objective particle swarm against an [`Evaluator`].
///
/// See the [crate-level documentation](crate) for a complete example.
pub struct Optimizer<E: Evaluator> {
    config: SwarmConfig,
    lower: Vec<f64>,
    upper: Vec<f64>,
    evaluator: E,
    rng: fastrand::Rng,
    phase: RunPhase,
    observer: Arc<dyn ProgressObserver>,
    token: RunToken,
}

impl<E: Evaluator> std::fmt::Debug for Optimizer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Optimizer")
            .field("config", &self.config)
            .field("lower", &self.lower)
            .field("upper", &self.upper)
            .field("phase", &self.phase)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

impl<E: Evaluator> Optimizer<E> {
    /// Creates an optimizer with an entropy-seeded random generator.
    ///
    /// `lower` and `upper` are the abstract-coordinate bounds, one pair per
    /// dimension.
    ///
    /// # Errors
    ///
    /// Returns a configuration-class error if the configuration or the
    /// bounds are invalid.
    pub fn new(
        config: SwarmConfig,
        lower: Vec<f64>,
        upper: Vec<f64>,
        evaluator: E,
    ) -> Result<Self> {
        Self::with_rng(config, lower, upper, evaluator, fastrand::Rng::new())
    }

    /// Creates an optimizer with a fixed seed, for reproducible runs.
    ///
    /// # Errors
    ///
    /// Returns a configuration-class error if the configuration or the
    /// bounds are invalid.
    pub fn with_seed(
        config: SwarmConfig,
        lower: Vec<f64>,
        upper: Vec<f64>,
        evaluator: E,
        seed: u64,
    ) -> Result<Self> {
        Self::with_rng(config, lower, upper, evaluator, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(
        config: SwarmConfig,
        lower: Vec<f64>,
        upper: Vec<f64>,
        evaluator: E,
        rng: fastrand::Rng,
    ) -> Result<Self> {
        config.validate()?;
        validate_bounds(&lower, &upper)?;

        Ok(Self {
            config,
            lower,
            upper,
            evaluator,
            rng,
            phase: RunPhase::Idle,
            observer: Arc::new(NopProgress),
            token: RunToken::new(),
        })
    }

    /// The control token for this optimizer. Clone it and hand it to the
    /// thread that needs pause or cancel control.
    #[must_use]
    pub fn token(&self) -> RunToken {
        self.token.clone()
    }

    /// Installs a progress observer, replacing the previous one.
    pub fn set_observer(&mut self, observer: Arc<dyn ProgressObserver>) {
        self.observer = observer;
    }

    /// The current run phase.
    #[must_use]
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// The configuration this optimizer runs with.
    #[must_use]
    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    /// Access to the wrapped evaluator.
    #[must_use]
    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// A human-readable run summary, recorded into the store at run start.
    #[must_use]
    pub fn details(&self) -> String {
        let mut out = String::from("Multi-objective particle swarm optimization\n\n");
        out.push_str(&format!("Swarm size: {}\n", self.config.swarm_size));
        out.push_str(&format!("Iterations: {}\n", self.config.max_iterations));
        out.push_str(&format!("Inertia: {}\n", self.config.inertia));
        out.push_str(&format!("Social weight: {}\n", self.config.social_weight));
        out.push_str(&format!(
            "Cognitive weight: {}\n",
            self.config.cognitive_weight
        ));
        out.push_str(&format!(
            "Seed with current state: {}\n",
            self.config.seed_with_current_state
        ));
        out.push_str(&format!("Objectives: {}\n", self.evaluator.objective_count()));
        out.push_str("Bounds:\n");
        for (i, (lo, hi)) in self.lower.iter().zip(&self.upper).enumerate() {
            out.push_str(&format!("  [{i}] {lo} .. {hi}\n"));
        }
        out
    }

    /// Runs the optimization to completion or cancellation.
    ///
    /// The swarm is created fresh, evaluated once (iteration 0), and then
    /// iterated: leaders are drawn from the archive with a density-biased
    /// roulette wheel, velocities and positions updated, every particle
    /// re-evaluated, and the archive recomputed from the evaluated swarm
    /// together with the previous archive. One snapshot is dumped per
    /// iteration, including a partial one when the run is cancelled
    /// mid-sweep.
    ///
    /// # Errors
    ///
    /// Propagates evaluator and store errors; the run is abandoned on the
    /// first failure.
    pub fn run(&mut self, store: &dyn FrontStore) -> Result<RunReport> {
        store.record_details(&self.details())?;
        trace_info!(
            swarm_size = self.config.swarm_size,
            max_iterations = self.config.max_iterations,
            "starting optimization run"
        );

        self.phase = RunPhase::Initializing;
        let mut swarm: Vec<Particle> = (0..self.config.swarm_size)
            .map(|_| Particle::new(&mut self.rng, self.lower.clone(), self.upper.clone()))
            .collect();

        if self.config.seed_with_current_state {
            let current = self.evaluator.current_position()?;
            if current.len() != self.lower.len() {
                return Err(Error::DimensionMismatch {
                    expected: self.lower.len(),
                    got: current.len(),
                });
            }
            swarm[0].seed_position(current);
        }

        #[allow(clippy::cast_precision_loss)]
        let step = 1.0 / (self.config.max_iterations * self.config.swarm_size) as f64;
        let mut progress = 0.0;
        let mut archive: Vec<FrontEntry> = Vec::new();
        let mut completed = 0;
        let mut cancelled = false;

        for iteration in 0..self.config.max_iterations {
            if iteration > 0 {
                self.phase = RunPhase::Selecting;
                let wheel = leader::build_distribution(&archive);
                for particle in &mut swarm {
                    particle.select_leader(&mut self.rng, &archive, &wheel);
                }

                self.phase = RunPhase::Updating;
                for particle in &mut swarm {
                    particle.update_velocity(
                        &mut self.rng,
                        self.config.inertia,
                        self.config.social_weight,
                        self.config.cognitive_weight,
                    );
                    particle.update_position();
                }
            }

            self.phase = RunPhase::Evaluating;
            let mut entries = Vec::with_capacity(swarm.len());
            for particle in &mut swarm {
                if self.hold_while_paused(progress, iteration) {
                    cancelled = true;
                    break;
                }

                self.evaluator.set_parameters(particle.position())?;
                let measurements = self.evaluator.measure()?;
                if measurements.len() != self.evaluator.objective_count() {
                    return Err(Error::DimensionMismatch {
                        expected: self.evaluator.objective_count(),
                        got: measurements.len(),
                    });
                }

                let objectives: Vec<f64> = measurements.iter().map(|m| m.mean).collect();
                let error: Vec<f64> = measurements.iter().map(|m| m.std_err).collect();
                let std_dev: Vec<f64> = measurements.iter().map(|m| m.std_dev).collect();

                particle.record_fit(
                    objectives.clone(),
                    error.clone(),
                    std_dev.clone(),
                    iteration == 0,
                );
                entries.push(FrontEntry {
                    position: particle.position().to_vec(),
                    objectives,
                    error,
                    std_dev,
                });

                progress += step;
                self.observer.on_progress(progress, iteration);
                trace_debug!(iteration, progress, "particle evaluated");
            }

            // The archive survives across iterations: the new front is the
            // non-dominated subset of the evaluated sweep plus the previous
            // archive. On cancellation the sweep may be partial.
            self.phase = RunPhase::Archiving;
            entries.append(&mut archive);
            archive = pareto::compute_front(entries);
            store.dump(iteration, &archive)?;
            completed = iteration + 1;
            trace_info!(iteration, front_size = archive.len(), "archive persisted");

            if cancelled {
                break;
            }
        }

        self.phase = if cancelled {
            RunPhase::Cancelled
        } else {
            RunPhase::Completed
        };
        trace_info!(phase = ?self.phase, iterations = completed, "run finished");

        Ok(RunReport {
            archive,
            iterations: completed,
            phase: self.phase,
        })
    }

    /// Blocks while the pause flag is set, reporting progress so observers
    /// see a live run. Returns `true` if the run was cancelled.
    fn hold_while_paused(&self, progress: f64, iteration: usize) -> bool {
        while self.token.is_paused() && !self.token.is_cancelled() {
            self.observer.on_progress(progress, iteration);
            std::thread::sleep(PAUSE_POLL);
        }
        self.token.is_cancelled()
    }
}

fn validate_bounds(lower: &[f64], upper: &[f64]) -> Result<()> {
    if lower.len() != upper.len() {
        return Err(Error::DimensionMismatch {
            expected: lower.len(),
            got: upper.len(),
        });
    }
    if lower.is_empty() {
        return Err(Error::ZeroCount { name: "dimensions" });
    }
    for (&lo, &hi) in lower.iter().zip(upper) {
        if !lo.is_finite() {
            return Err(Error::NonFiniteSetting {
                name: "lower bound",
                value: lo,
            });
        }
        if !hi.is_finite() {
            return Err(Error::NonFiniteSetting {
                name: "upper bound",
                value: hi,
            });
        }
        if lo > hi {
            return Err(Error::InvalidBounds {
                lower: lo,
                upper: hi,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::Measurement;

    /// Deterministic evaluator: two objectives of the applied coordinate,
    /// no noise, no mapping.
    struct Quadratic {
        position: Vec<f64>,
        evaluations: usize,
    }

    impl Quadratic {
        fn new() -> Self {
            Self {
                position: vec![0.0],
                evaluations: 0,
            }
        }
    }

    impl Evaluator for Quadratic {
        fn objective_count(&self) -> usize {
            2
        }

        fn set_parameters(&mut self, abstract_coords: &[f64]) -> Result<()> {
            self.position = abstract_coords.to_vec();
            Ok(())
        }

        fn measure(&mut self) -> Result<Vec<Measurement>> {
            self.evaluations += 1;
            let x = self.position[0];
            let exact = |mean: f64| Measurement {
                mean,
                std_dev: 0.0,
                std_err: 0.0,
                accepted: 1,
            };
            Ok(vec![exact(-(x * x)), exact(-((x - 1.0) * (x - 1.0)))])
        }

        fn current_position(&mut self) -> Result<Vec<f64>> {
            Ok(self.position.clone())
        }
    }

    fn small_config() -> SwarmConfig {
        SwarmConfig::builder()
            .swarm_size(4)
            .max_iterations(3)
            .seed_with_current_state(false)
            .build()
    }

    #[test]
    fn test_rejects_mismatched_bounds() {
        let result = Optimizer::with_seed(
            small_config(),
            vec![0.0, 0.0],
            vec![1.0],
            Quadratic::new(),
            1,
        );
        assert!(matches!(result.unwrap_err(), Error::DimensionMismatch { .. }));
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let result =
            Optimizer::with_seed(small_config(), vec![2.0], vec![-2.0], Quadratic::new(), 1);
        assert!(matches!(result.unwrap_err(), Error::InvalidBounds { .. }));
    }

    #[test]
    fn test_evaluation_count_and_phase() {
        let mut optimizer =
            Optimizer::with_seed(small_config(), vec![-2.0], vec![2.0], Quadratic::new(), 9)
                .unwrap();
        let store = crate::storage::MemoryFrontStore::new();
        let report = optimizer.run(&store).unwrap();

        assert_eq!(report.phase, RunPhase::Completed);
        assert_eq!(report.iterations, 3);
        // Every particle is measured once per iteration.
        assert_eq!(optimizer.evaluator().evaluations, 4 * 3);
        assert_eq!(store.snapshots().len(), 3);
    }

    #[test]
    fn test_token_flags() {
        let token = RunToken::new();
        assert!(!token.is_paused());
        assert!(!token.is_cancelled());

        token.pause();
        assert!(token.is_paused());
        token.resume();
        assert!(!token.is_paused());

        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_details_mentions_settings() {
        let optimizer =
            Optimizer::with_seed(small_config(), vec![-2.0], vec![2.0], Quadratic::new(), 1)
                .unwrap();
        let details = optimizer.details();
        assert!(details.contains("Swarm size: 4"));
        assert!(details.contains("Iterations: 3"));
        assert!(details.contains("[0] -2 .. 2"));
    }
}
