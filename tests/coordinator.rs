//! Work-distribution tests: every unordered pair exactly once, in both
//! execution modes, regardless of worker count.

mod common;
use common::{index_pairs, random_source};

use r2ks::{
    CollectSink, Coordinator, CoordinatorError, ExecMode, ListSource, PairPlan, RankArray,
    RunConfig, SourceError,
};

fn run_collect(
    source: &impl ListSource,
    workers: usize,
    mode: ExecMode,
    plan: &PairPlan,
) -> Vec<r2ks::PairResult> {
    let coordinator = Coordinator::new(source, RunConfig::default(), workers);
    let sink = CollectSink::new();
    let emitted = coordinator.run(plan, mode, &sink).expect("run succeeds");
    let results = sink.into_results();
    assert_eq!(emitted, results.len());
    results
}

fn expected_pairs(num_lists: u32) -> Vec<(u32, u32)> {
    let mut pairs = Vec::new();
    for a in 1..=num_lists {
        for b in (a + 1)..=num_lists {
            pairs.push((a, b));
        }
    }
    pairs
}

#[test]
fn enumeration_complete_for_any_worker_count() {
    let num_lists = 6usize;
    let source = random_source(8, num_lists, 11);
    let plan = PairPlan::new(num_lists);
    let expected = expected_pairs(num_lists as u32);
    assert_eq!(expected.len(), num_lists * (num_lists - 1) / 2);

    for workers in [1usize, 2, num_lists - 1] {
        for mode in [ExecMode::Threads, ExecMode::Workers] {
            let results = run_collect(&source, workers, mode, &plan);
            assert_eq!(
                index_pairs(&results),
                expected,
                "workers={workers} mode={mode:?}"
            );
        }
    }
}

#[test]
fn partition_coverage_five_genes_four_lists_three_workers() {
    // N=5 genes, L=4 lists, P=3 workers: all 6 unordered pairs exactly once.
    let source = random_source(5, 4, 23);
    let plan = PairPlan::new(4);

    for mode in [ExecMode::Threads, ExecMode::Workers] {
        let results = run_collect(&source, 3, mode, &plan);
        assert_eq!(
            index_pairs(&results),
            vec![(1, 2), (1, 3), (1, 4), (2, 3), (2, 4), (3, 4)],
            "mode={mode:?}"
        );
    }
}

#[test]
fn modes_agree_on_statistics() {
    let source = random_source(16, 5, 37);
    let plan = PairPlan::new(5);
    let config = RunConfig::default().with_pivot(4).two_tailed();

    let collect = |mode| {
        let coordinator = Coordinator::new(&source, config, 3);
        let sink = CollectSink::new();
        coordinator.run(&plan, mode, &sink).expect("run succeeds");
        let mut results = sink.into_results();
        results.sort_by_key(|r| (r.a, r.b));
        results
    };

    let threads = collect(ExecMode::Threads);
    let workers = collect(ExecMode::Workers);
    assert_eq!(threads.len(), workers.len());
    for (t, w) in threads.iter().zip(&workers) {
        assert_eq!((t.a, t.b), (w.a, w.b));
        assert_eq!(t.statistic, w.statistic, "pair {}_{}", t.a, t.b);
    }
}

#[test]
fn self_pairs_are_opt_in() {
    let source = random_source(6, 3, 41);
    let plan = PairPlan::new(3).with_self_pairs(true);
    let results = run_collect(&source, 2, ExecMode::Threads, &plan);
    assert_eq!(
        index_pairs(&results),
        vec![(1, 1), (1, 2), (1, 3), (2, 2), (2, 3), (3, 3)]
    );
    // Self pairs score as the identity comparison, the maximum for the list.
    let n = source.num_genes() as f64;
    for result in results.iter().filter(|r| r.a == r.b) {
        assert!((result.statistic - 0.25 * n.sqrt()).abs() < 1e-9);
    }
}

/// Source whose third list always fails to load.
struct FlakySource {
    inner: r2ks::MemorySource,
}

impl ListSource for FlakySource {
    fn num_genes(&self) -> usize {
        self.inner.num_genes()
    }

    fn num_lists(&self) -> usize {
        self.inner.num_lists()
    }

    fn load(&self, index: u32) -> Result<RankArray, SourceError> {
        if index == 3 {
            return Err(SourceError::MissingLine { index });
        }
        self.inner.load(index)
    }
}

#[test]
fn worker_failure_is_fatal_and_reported() {
    let source = FlakySource {
        inner: random_source(6, 4, 53),
    };
    let plan = PairPlan::new(4);

    for mode in [ExecMode::Threads, ExecMode::Workers] {
        let coordinator = Coordinator::new(&source, RunConfig::default(), 3);
        let sink = CollectSink::new();
        let err = coordinator.run(&plan, mode, &sink).unwrap_err();
        match err {
            CoordinatorError::Load { index: 3, .. } => {}
            CoordinatorError::WorkerFailed { b: 3, .. } | CoordinatorError::WorkerFailed { a: 3, .. } => {}
            other => panic!("unexpected error in mode {mode:?}: {other}"),
        }
    }
}

#[test]
fn plan_larger_than_source_is_rejected() {
    let source = random_source(6, 3, 61);
    let plan = PairPlan::new(5);
    let coordinator = Coordinator::new(&source, RunConfig::default(), 2);
    let err = coordinator
        .run(&plan, ExecMode::Threads, &CollectSink::new())
        .unwrap_err();
    assert!(matches!(
        err,
        CoordinatorError::PlanExceedsSource {
            required: 5,
            available: 3
        }
    ));
}
