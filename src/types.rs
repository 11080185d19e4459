//! Core types shared across the crate.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The phase of an optimization run.
///
/// A run moves `Idle → Initializing → Evaluating → Archiving`, then loops
/// `Selecting → Updating → Evaluating → Archiving` until the configured
/// iteration count is reached (`Completed`) or cancellation is observed
/// (`Cancelled`). Pausing is not a phase: a paused run blocks in place and
/// resumes into the phase it was interrupted in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RunPhase {
    /// No run has started yet.
    Idle,
    /// The swarm is being created.
    Initializing,
    /// Particles are being measured on the evaluator.
    Evaluating,
    /// The non-dominated archive is being recomputed and persisted.
    Archiving,
    /// Leaders are being assigned from the archive.
    Selecting,
    /// Particle velocities and positions are being updated.
    Updating,
    /// The run finished all iterations; the archive is the solution set.
    Completed,
    /// The run was cancelled cooperatively; the archive reflects the last
    /// completed archive step.
    Cancelled,
}
