#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]

//! Multi-objective particle swarm optimization (MOPSO) for noisy, expensive
//! objectives — the kind measured on a live machine or a slow simulator
//! rather than computed from a closed-form function.
//!
//! The crate drives a swarm of candidate settings toward the Pareto front of
//! several conflicting objectives. Each candidate evaluation is a repeated,
//! noisy measurement with outlier rejection; the non-dominated archive is
//! maintained across iterations and persisted per iteration for inspection.
//!
//! # Core concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`Optimizer`] | Drive the optimization loop: evaluate the swarm, update the archive, persist snapshots. |
//! | [`Particle`](particle::Particle) | One candidate: position, velocity, personal best, assigned leader. |
//! | [`Evaluator`] | Bridge to the machine/simulator: apply settings, take measurements. |
//! | [`ParameterMap`](mapping::ParameterMap) | Translate abstract search coordinates into physical settings. |
//! | [`FrontStore`](storage::FrontStore) | Persist one archive snapshot per iteration. |
//! | [`RunToken`] | Pause or cancel a running optimization from another thread. |
//!
//! # Getting started
//!
//! Optimize a two-objective toy machine in a few lines:
//!
//! ```
//! use std::time::Duration;
//!
//! use mopso::evaluator::ChannelEvaluator;
//! use mopso::mapping::{ParameterGroup, ParameterMap};
//! use mopso::storage::MemoryFrontStore;
//! use mopso::{ObjectiveConfig, Optimizer, SwarmConfig};
//!
//! let map = ParameterMap::new(vec![ParameterGroup::absolute(1)]).unwrap();
//! let channel_cfg = ObjectiveConfig {
//!     min_sample_count: 1,
//!     sample_delay: Duration::ZERO,
//! };
//!
//! let mut evaluator = ChannelEvaluator::new(map, vec![0.0]);
//! evaluator.add_channel(channel_cfg.clone(), |mp| -(mp[0] * mp[0]));
//! evaluator.add_channel(channel_cfg, |mp| -((mp[0] - 1.0) * (mp[0] - 1.0)));
//!
//! let config = SwarmConfig::builder()
//!     .swarm_size(5)
//!     .max_iterations(3)
//!     .seed_with_current_state(false)
//!     .build();
//!
//! let store = MemoryFrontStore::new();
//! let mut optimizer =
//!     Optimizer::with_seed(config, vec![-2.0], vec![2.0], evaluator, 42).unwrap();
//! let report = optimizer.run(&store).unwrap();
//!
//! assert!(!report.archive.is_empty());
//! ```
//!
//! # Feature flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `serde` | `Serialize`/`Deserialize` on configuration and archive types, `config.json` sidecars | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) at iteration and evaluation boundaries | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

mod config;
mod error;
pub mod evaluator;
pub mod leader;
pub mod mapping;
mod optimizer;
pub mod pareto;
pub mod particle;
mod rng_util;
pub mod stats;
pub mod storage;
mod types;

pub use config::{GroupConfig, ObjectiveConfig, SwarmConfig, SwarmConfigBuilder};
pub use error::{Error, Result};
pub use evaluator::Evaluator;
pub use optimizer::{NopProgress, Optimizer, ProgressObserver, RunReport, RunToken};
pub use pareto::FrontEntry;
pub use stats::Measurement;
pub use types::RunPhase;

/// Convenient wildcard import for the most common types.
///
/// ```
/// use mopso::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{GroupConfig, ObjectiveConfig, SwarmConfig, SwarmConfigBuilder};
    pub use crate::error::{Error, Result};
    pub use crate::evaluator::{ChannelEvaluator, Evaluator};
    pub use crate::mapping::{GroupKind, ParameterGroup, ParameterMap};
    pub use crate::optimizer::{NopProgress, Optimizer, ProgressObserver, RunReport, RunToken};
    pub use crate::pareto::FrontEntry;
    pub use crate::stats::Measurement;
    pub use crate::storage::{DirectoryFrontStore, FrontStore, MemoryFrontStore};
    pub use crate::types::RunPhase;
}
