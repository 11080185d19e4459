use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mopso::evaluator::ChannelEvaluator;
use mopso::mapping::ParameterMap;
use mopso::pareto;
use mopso::storage::MemoryFrontStore;
use mopso::{
    GroupConfig, ObjectiveConfig, Optimizer, ProgressObserver, RunPhase, RunToken, SwarmConfig,
};

fn one_shot() -> ObjectiveConfig {
    ObjectiveConfig {
        min_sample_count: 1,
        sample_delay: Duration::ZERO,
    }
}

/// One absolute group over a single quantity, with two conflicting
/// objectives whose Pareto set is x in [0, 1].
fn toy_machine(lower: f64, upper: f64) -> (ChannelEvaluator, Vec<f64>, Vec<f64>) {
    let groups = vec![GroupConfig {
        lower_bound: lower,
        upper_bound: upper,
        relative: false,
        size: 1,
    }];
    let (map, abstract_lower, abstract_upper) =
        ParameterMap::from_configs(&groups, &[0.0]).unwrap();

    let mut evaluator = ChannelEvaluator::new(map, vec![0.0]);
    evaluator.add_channel(one_shot(), |mp| -(mp[0] * mp[0]));
    evaluator.add_channel(one_shot(), |mp| -((mp[0] - 1.0) * (mp[0] - 1.0)));
    (evaluator, abstract_lower, abstract_upper)
}

fn config(swarm_size: usize, max_iterations: usize) -> SwarmConfig {
    SwarmConfig::builder()
        .swarm_size(swarm_size)
        .max_iterations(max_iterations)
        .seed_with_current_state(false)
        .build()
}

#[test]
fn test_full_run_produces_non_dominated_archive() {
    let (evaluator, lower, upper) = toy_machine(-2.0, 2.0);
    let mut optimizer =
        Optimizer::with_seed(config(10, 4), lower.clone(), upper.clone(), evaluator, 42).unwrap();

    let store = MemoryFrontStore::new();
    let report = optimizer.run(&store).unwrap();

    assert_eq!(report.phase, RunPhase::Completed);
    assert_eq!(report.iterations, 4);
    assert!(!report.archive.is_empty());

    // Mutual non-domination across the whole archive.
    for a in &report.archive {
        for b in &report.archive {
            if a.position != b.position {
                assert!(!pareto::dominates(&a.objectives, &b.objectives));
            }
        }
    }

    // Every archived position stayed inside the search bounds.
    for entry in &report.archive {
        assert!(entry.position[0] >= lower[0] && entry.position[0] <= upper[0]);
    }

    // One snapshot per iteration, and the last one is the final archive.
    assert_eq!(store.snapshots().len(), 4);
    assert_eq!(store.latest().unwrap(), report.archive);
}

#[test]
fn test_run_finds_the_trade_off_region() {
    let (evaluator, lower, upper) = toy_machine(-2.0, 2.0);
    let mut optimizer =
        Optimizer::with_seed(config(20, 5), lower, upper, evaluator, 7).unwrap();

    let report = optimizer.run(&MemoryFrontStore::new()).unwrap();

    // Both objectives are non-positive by construction, and at least one
    // archive member sits near the x in [0, 1] trade-off segment where the
    // objective sum exceeds -2.
    let mut best_sum = f64::NEG_INFINITY;
    for entry in &report.archive {
        assert!(entry.objectives[0] <= 0.0);
        assert!(entry.objectives[1] <= 0.0);
        best_sum = best_sum.max(entry.objectives[0] + entry.objectives[1]);
    }
    assert!(best_sum > -2.0, "best objective sum {best_sum} too poor");
}

#[test]
fn test_same_seed_reproduces_the_run() {
    let run = |seed: u64| {
        let (evaluator, lower, upper) = toy_machine(-2.0, 2.0);
        let mut optimizer =
            Optimizer::with_seed(config(8, 3), lower, upper, evaluator, seed).unwrap();
        optimizer.run(&MemoryFrontStore::new()).unwrap().archive
    };

    assert_eq!(run(123), run(123));
    assert_ne!(run(123), run(456));
}

#[test]
fn test_seeding_with_current_state_evaluates_it() {
    let (evaluator, lower, upper) = toy_machine(-2.0, 2.0);
    let config = SwarmConfig::builder()
        .swarm_size(3)
        .max_iterations(1)
        .seed_with_current_state(true)
        .build();
    let mut optimizer = Optimizer::with_seed(config, lower, upper, evaluator, 5).unwrap();

    let report = optimizer.run(&MemoryFrontStore::new()).unwrap();

    // The machine sat at x = 0, which is Pareto-optimal for this pair of
    // objectives, so the seeded particle must appear in the archive.
    assert!(report
        .archive
        .iter()
        .any(|entry| entry.position[0].abs() < 1e-12));
}

#[test]
fn test_cancel_before_start_dumps_empty_partial() {
    let (evaluator, lower, upper) = toy_machine(-2.0, 2.0);
    let mut optimizer =
        Optimizer::with_seed(config(4, 3), lower, upper, evaluator, 11).unwrap();
    optimizer.token().cancel();

    let store = MemoryFrontStore::new();
    let report = optimizer.run(&store).unwrap();

    assert_eq!(report.phase, RunPhase::Cancelled);
    assert_eq!(report.iterations, 1);
    assert!(report.archive.is_empty());
    // The interrupted sweep is still archived, even when empty.
    assert_eq!(store.snapshots().len(), 1);
}

/// Cancels the run token after a fixed number of progress updates.
struct CancelAfter {
    token: RunToken,
    after: usize,
    seen: AtomicUsize,
}

impl ProgressObserver for CancelAfter {
    fn on_progress(&self, _fraction: f64, _iteration: usize) {
        if self.seen.fetch_add(1, Ordering::SeqCst) + 1 == self.after {
            self.token.cancel();
        }
    }
}

#[test]
fn test_cancel_mid_sweep_archives_partial_results() {
    let (evaluator, lower, upper) = toy_machine(-2.0, 2.0);
    let mut optimizer =
        Optimizer::with_seed(config(4, 5), lower, upper, evaluator, 21).unwrap();

    // Cancel during the second sweep: iteration 0 completes (4 updates),
    // then two particles of iteration 1 are measured.
    optimizer.set_observer(Arc::new(CancelAfter {
        token: optimizer.token(),
        after: 6,
        seen: AtomicUsize::new(0),
    }));

    let store = MemoryFrontStore::new();
    let report = optimizer.run(&store).unwrap();

    assert_eq!(report.phase, RunPhase::Cancelled);
    assert_eq!(report.iterations, 2);
    assert_eq!(store.snapshots().len(), 2);
    // The archive still carries iteration 0's results.
    assert!(!report.archive.is_empty());
}

#[test]
fn test_paused_run_resumes_and_completes() {
    let (evaluator, lower, upper) = toy_machine(-2.0, 2.0);
    let mut optimizer =
        Optimizer::with_seed(config(3, 2), lower, upper, evaluator, 31).unwrap();

    let token = optimizer.token();
    token.pause();
    let resumer = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        token.resume();
    });

    let report = optimizer.run(&MemoryFrontStore::new()).unwrap();
    resumer.join().unwrap();

    assert_eq!(report.phase, RunPhase::Completed);
    assert_eq!(report.iterations, 2);
}

#[test]
fn test_progress_reaches_one() {
    struct MaxFraction(parking_lot::Mutex<f64>);
    impl ProgressObserver for MaxFraction {
        fn on_progress(&self, fraction: f64, _iteration: usize) {
            let mut max = self.0.lock();
            assert!(fraction >= *max, "progress went backwards");
            *max = fraction;
        }
    }

    let (evaluator, lower, upper) = toy_machine(-2.0, 2.0);
    let mut optimizer =
        Optimizer::with_seed(config(5, 3), lower, upper, evaluator, 13).unwrap();
    let observer = Arc::new(MaxFraction(parking_lot::Mutex::new(0.0)));
    optimizer.set_observer(observer.clone());

    optimizer.run(&MemoryFrontStore::new()).unwrap();
    assert!((*observer.0.lock() - 1.0).abs() < 1e-9);
}

#[test]
fn test_relative_groups_audit_every_setting() {
    let groups = vec![GroupConfig {
        lower_bound: -0.5,
        upper_bound: 0.5,
        relative: true,
        size: 2,
    }];
    let (map, lower, upper) = ParameterMap::from_configs(&groups, &[10.0, 20.0]).unwrap();

    let mut evaluator = ChannelEvaluator::new(map, vec![10.0, 20.0]);
    evaluator.add_channel(one_shot(), |mp| -((mp[0] - 10.2) * (mp[0] - 10.2)));
    evaluator.add_channel(one_shot(), |mp| -((mp[1] - 19.8) * (mp[1] - 19.8)));

    let mut optimizer =
        Optimizer::with_seed(config(4, 2), lower, upper, evaluator, 17).unwrap();
    let report = optimizer.run(&MemoryFrontStore::new()).unwrap();
    assert_eq!(report.phase, RunPhase::Completed);

    // Every applied setting was recorded, and all offsets stayed in bounds.
    let audit = optimizer.evaluator().map().audit_log();
    assert_eq!(audit.len(), 4 * 2);
    for (abstract_coords, physical) in &audit {
        assert!(abstract_coords[0] >= -0.5 && abstract_coords[0] <= 0.5);
        assert!((physical[0] - (10.0 + abstract_coords[0])).abs() < 1e-12);
        assert!((physical[1] - (20.0 + abstract_coords[0])).abs() < 1e-12);
    }
}
