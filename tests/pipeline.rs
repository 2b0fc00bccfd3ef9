//! End-to-end runs against an on-disk rank file.

mod common;
use common::{index_pairs, random_permutation};

use std::fmt::Write as _;
use std::io::Write as _;

use r2ks::{
    CollectSink, Coordinator, ExecMode, ListSource, MemorySource, PairPlan, RankArray, RankFile,
    RunConfig,
};

fn write_rank_file(num_genes: usize, lists: &[Vec<u32>]) -> tempfile::NamedTempFile {
    let mut contents = format!("{} {}\n", num_genes, lists.len());
    for list in lists {
        let mut line = String::new();
        for gene in list {
            let _ = write!(line, "{} ", gene);
        }
        contents.push_str(line.trim_end());
        contents.push('\n');
    }
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn full_run_covers_every_pair_in_both_modes() {
    let num_genes = 12usize;
    let orders: Vec<Vec<u32>> = (0..4)
        .map(|i| random_permutation(num_genes, 100 + i as u64))
        .collect();
    let file = write_rank_file(num_genes, &orders);
    let source = RankFile::open(file.path()).unwrap();
    assert_eq!(source.num_genes(), num_genes);
    assert_eq!(source.num_lists(), 4);

    let plan = PairPlan::new(source.num_lists());
    let config = RunConfig::default().with_pivot(3).two_tailed();

    for mode in [ExecMode::Threads, ExecMode::Workers] {
        let coordinator = Coordinator::new(&source, config, 3);
        let sink = CollectSink::new();
        let emitted = coordinator.run(&plan, mode, &sink).expect("run succeeds");
        assert_eq!(emitted, 6);
        let results = sink.into_results();
        assert_eq!(
            index_pairs(&results),
            vec![(1, 2), (1, 3), (1, 4), (2, 3), (2, 4), (3, 4)],
            "mode={mode:?}"
        );
        for result in &results {
            assert!(result.statistic >= 0.0);
            assert!(result.statistic <= (num_genes as f64).sqrt() + 1e-9);
        }
    }
}

#[test]
fn file_and_memory_sources_agree() {
    let num_genes = 10usize;
    let orders: Vec<Vec<u32>> = (0..3)
        .map(|i| random_permutation(num_genes, 7 + i as u64))
        .collect();
    let file = write_rank_file(num_genes, &orders);
    let file_source = RankFile::open(file.path()).unwrap();

    let memory_source = MemorySource::new(
        orders
            .iter()
            .map(|order| RankArray::from_order(order).unwrap())
            .collect(),
    )
    .unwrap();

    let plan = PairPlan::new(3);
    let config = RunConfig::default().with_pivot(2);

    let collect = |source: &dyn ListSource| {
        let coordinator = Coordinator::new(source, config, 2);
        let sink = CollectSink::new();
        coordinator
            .run(&plan, ExecMode::Threads, &sink)
            .expect("run succeeds");
        let mut results = sink.into_results();
        results.sort_by_key(|r| (r.a, r.b));
        results
    };

    assert_eq!(collect(&file_source), collect(&memory_source));
}

#[test]
fn malformed_file_fails_the_run() {
    // Second list is short a token; the failure must surface, not produce a
    // statistic.
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "4 2").unwrap();
    writeln!(file, "0 1 2 3").unwrap();
    writeln!(file, "0 1 2").unwrap();
    file.flush().unwrap();

    let source = RankFile::open(file.path()).unwrap();
    let plan = PairPlan::new(2);
    let coordinator = Coordinator::new(&source, RunConfig::default(), 2);
    for mode in [ExecMode::Threads, ExecMode::Workers] {
        let result = coordinator.run(&plan, mode, &CollectSink::new());
        assert!(result.is_err(), "mode={mode:?}");
    }
}
