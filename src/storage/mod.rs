//! Archive snapshot persistence.
//!
//! The [`FrontStore`] trait defines how the per-iteration archive snapshot
//! is persisted. The control loop dumps one full snapshot per iteration —
//! never a delta — so every file is self-contained and can be inspected or
//! plotted on its own.
//!
//! # Available backends
//!
//! | Backend | Description |
//! |---------|-------------|
//! | [`MemoryFrontStore`] | In-memory `Vec` behind a read-write lock, for tests and embedding |
//! | [`DirectoryFrontStore`] | One `fronts.N` text file per iteration, with file locking |

mod snapshot;

pub use snapshot::{read_snapshot, DirectoryFrontStore};

use parking_lot::RwLock;

use crate::pareto::FrontEntry;
use crate::Result;

/// Trait for persisting per-iteration archive snapshots.
///
/// Implementations must be `Send + Sync`: the store may be shared with a
/// UI or inspection thread while the single-writer control loop runs.
pub trait FrontStore: Send + Sync {
    /// Persists the full archive for the given iteration index.
    ///
    /// Each iteration's snapshot replaces nothing and appends to nothing:
    /// it is a complete, standalone record of the archive at that point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`](crate::Error::Storage) if persisting fails.
    fn dump(&self, iteration: usize, front: &[FrontEntry]) -> Result<()>;

    /// Records a human-readable run summary once at run start.
    ///
    /// The default implementation discards it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`](crate::Error::Storage) if persisting fails.
    fn record_details(&self, details: &str) -> Result<()> {
        let _ = details;
        Ok(())
    }
}

/// An in-memory [`FrontStore`] keeping every snapshot in order.
#[derive(Default)]
pub struct MemoryFrontStore {
    snapshots: RwLock<Vec<(usize, Vec<FrontEntry>)>>,
}

impl MemoryFrontStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All snapshots dumped so far, as `(iteration, front)` pairs.
    #[must_use]
    pub fn snapshots(&self) -> Vec<(usize, Vec<FrontEntry>)> {
        self.snapshots.read().clone()
    }

    /// The most recent snapshot, if any.
    #[must_use]
    pub fn latest(&self) -> Option<Vec<FrontEntry>> {
        self.snapshots.read().last().map(|(_, front)| front.clone())
    }
}

impl FrontStore for MemoryFrontStore {
    fn dump(&self, iteration: usize, front: &[FrontEntry]) -> Result<()> {
        self.snapshots.write().push((iteration, front.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(objectives: Vec<f64>) -> FrontEntry {
        let m = objectives.len();
        FrontEntry {
            position: vec![0.0],
            objectives,
            error: vec![0.0; m],
            std_dev: vec![0.0; m],
        }
    }

    #[test]
    fn test_memory_store_keeps_order() {
        let store = MemoryFrontStore::new();
        store.dump(0, &[entry(vec![1.0, 2.0])]).unwrap();
        store.dump(1, &[entry(vec![3.0, 4.0])]).unwrap();

        let snapshots = store.snapshots();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].0, 0);
        assert_eq!(snapshots[1].0, 1);
        assert_eq!(store.latest().unwrap()[0].objectives, vec![3.0, 4.0]);
    }
}
