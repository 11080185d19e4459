//! One candidate solution in the swarm.
//!
//! A particle owns a position and velocity in abstract-coordinate space,
//! its personal-best record, and the leader it currently steers toward.
//! The position invariant — every coordinate inside its bounds — holds
//! after every update because out-of-bounds moves are clamped to the
//! boundary with the velocity component reflected.

use crate::pareto::{self, FrontEntry};
use crate::rng_util;

/// A swarm member: position, velocity, personal best, and assigned leader.
#[derive(Clone, Debug)]
pub struct Particle {
    position: Vec<f64>,
    velocity: Vec<f64>,
    best_position: Vec<f64>,
    best_objectives: Vec<f64>,
    objectives: Vec<f64>,
    error: Vec<f64>,
    std_dev: Vec<f64>,
    leader: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Particle {
    /// Creates a particle with uniformly random position and velocity inside
    /// the given bounds.
    #[must_use]
    pub fn new(rng: &mut fastrand::Rng, lower: Vec<f64>, upper: Vec<f64>) -> Self {
        debug_assert_eq!(lower.len(), upper.len());
        let position: Vec<f64> = lower
            .iter()
            .zip(&upper)
            .map(|(&lo, &hi)| rng_util::f64_range(rng, lo, hi))
            .collect();
        let velocity: Vec<f64> = lower
            .iter()
            .zip(&upper)
            .map(|(&lo, &hi)| rng_util::f64_range(rng, lo, hi))
            .collect();

        Self {
            best_position: position.clone(),
            leader: position.clone(),
            position,
            velocity,
            best_objectives: Vec::new(),
            objectives: Vec::new(),
            error: Vec::new(),
            std_dev: Vec::new(),
            lower,
            upper,
        }
    }

    /// Overwrites the position, used to seed one particle with the machine's
    /// current state.
    pub fn seed_position(&mut self, position: Vec<f64>) {
        debug_assert_eq!(position.len(), self.lower.len());
        self.position = position;
    }

    /// Records a measured fit and updates the personal best.
    ///
    /// On the initial sweep (`initial = true`) the fit becomes the personal
    /// best unconditionally. Afterwards the best is replaced only when it
    /// does not strictly dominate the new objectives.
    pub fn record_fit(
        &mut self,
        objectives: Vec<f64>,
        error: Vec<f64>,
        std_dev: Vec<f64>,
        initial: bool,
    ) {
        self.objectives = objectives;
        self.error = error;
        self.std_dev = std_dev;

        if initial || !pareto::dominates(&self.best_objectives, &self.objectives) {
            self.best_position = self.position.clone();
            self.best_objectives = self.objectives.clone();
        }
    }

    /// Applies the particle-swarm velocity equation dimension by dimension.
    ///
    /// `new_v = inertia*v + cognitive*r1*(best - pos) + social*r2*(leader - pos)`
    /// with independent uniform draws `r1, r2` per dimension. No velocity
    /// clamping is applied; the reflecting boundary in
    /// [`update_position`](Self::update_position) keeps positions legal.
    pub fn update_velocity(
        &mut self,
        rng: &mut fastrand::Rng,
        inertia: f64,
        social_weight: f64,
        cognitive_weight: f64,
    ) {
        for i in 0..self.velocity.len() {
            let r1 = rng.f64();
            let r2 = rng.f64();
            let cognitive = cognitive_weight * r1 * (self.best_position[i] - self.position[i]);
            let social = social_weight * r2 * (self.leader[i] - self.position[i]);
            self.velocity[i] = inertia * self.velocity[i] + cognitive + social;
        }
    }

    /// Moves the particle by its velocity, reflecting at the bounds.
    ///
    /// A coordinate that would leave its interval is clamped to the boundary
    /// and the corresponding velocity component negated, so the position
    /// invariant holds after every call.
    pub fn update_position(&mut self) {
        for i in 0..self.position.len() {
            self.position[i] += self.velocity[i];

            if self.position[i] > self.upper[i] {
                self.position[i] = self.upper[i];
                self.velocity[i] = -self.velocity[i];
            }
            if self.position[i] < self.lower[i] {
                self.position[i] = self.lower[i];
                self.velocity[i] = -self.velocity[i];
            }
        }
    }

    /// Draws a leader from the archive using the cumulative `wheel`.
    ///
    /// With fewer archive entries than `objectives + 1` there are too few
    /// points for a meaningful density estimate, so a uniformly random entry
    /// is taken instead. Otherwise one uniform draw walks the cumulative
    /// distribution and the first index whose cumulative probability reaches
    /// the draw wins. Exactly one leader is assigned per call.
    pub fn select_leader(
        &mut self,
        rng: &mut fastrand::Rng,
        archive: &[FrontEntry],
        wheel: &[f64],
    ) {
        if archive.is_empty() {
            return;
        }

        if archive.len() < archive[0].objectives.len() + 1 || wheel.is_empty() {
            let pick = rng.usize(..archive.len());
            self.leader = archive[pick].position.clone();
            return;
        }

        let r = rng.f64();
        let index = wheel
            .iter()
            .position(|&c| c >= r)
            .unwrap_or(wheel.len() - 1);
        self.leader = archive[index].position.clone();
    }

    /// Current position in abstract-coordinate space.
    #[must_use]
    pub fn position(&self) -> &[f64] {
        &self.position
    }

    /// Current velocity.
    #[must_use]
    pub fn velocity(&self) -> &[f64] {
        &self.velocity
    }

    /// Most recently measured objective means.
    #[must_use]
    pub fn objectives(&self) -> &[f64] {
        &self.objectives
    }

    /// Standard errors of the most recent measurement.
    #[must_use]
    pub fn error(&self) -> &[f64] {
        &self.error
    }

    /// Standard deviations of the most recent measurement.
    #[must_use]
    pub fn std_dev(&self) -> &[f64] {
        &self.std_dev
    }

    /// Personal-best position.
    #[must_use]
    pub fn best_position(&self) -> &[f64] {
        &self.best_position
    }

    /// Personal-best objectives.
    #[must_use]
    pub fn best_objectives(&self) -> &[f64] {
        &self.best_objectives
    }

    /// The archive position this particle currently steers toward.
    #[must_use]
    pub fn leader(&self) -> &[f64] {
        &self.leader
    }

    /// Returns `true` if every coordinate is inside its bounds.
    #[must_use]
    pub fn in_bounds(&self) -> bool {
        self.position
            .iter()
            .zip(self.lower.iter().zip(&self.upper))
            .all(|(&p, (&lo, &hi))| p >= lo && p <= hi)
    }
}
