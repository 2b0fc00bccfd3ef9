//! Work distribution across the pairwise workload.
//!
//! Scoring L lists against each other is L*(L-1)/2 independent evaluations.
//! The coordinator enumerates the unordered pairs, splits them across
//! workers, and funnels every [`PairResult`] into a [`ResultSink`]. Two
//! execution modes exist:
//!
//! - **Threads**: the pair list is evaluated on a rayon pool; each task loads
//!   its own rank arrays and emits directly to the sink, so output order
//!   interleaves nondeterministically.
//! - **Workers**: one coordinator plus `P-1` workers exchanging typed
//!   messages over channels. Each worker receives its whole chunk up front
//!   (static partitioning, no rebalancing) and reports one message per
//!   completed pair; the coordinator emits results in arrival order.
//!
//! Either way a worker failure is fatal and reported; there is no retry and
//! no partial-result checkpointing.

use std::sync::Mutex;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::score::{evaluate_pair, ScoreError};
use crate::source::{ListSource, SourceError};
use crate::RunConfig;

/// Statistic for one evaluated pair of lists (1-based indices).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairResult {
    /// First list index.
    pub a: u32,
    /// Second list index.
    pub b: u32,
    /// Weighted rank-rank KS statistic for the pair.
    pub statistic: f64,
}

/// Destination for completed pair results.
///
/// Sinks are shared across worker threads, so emission must tolerate
/// interleaved calls; no ordering is guaranteed.
pub trait ResultSink: Sync {
    /// Accept one completed result.
    fn emit(&self, result: &PairResult);
}

/// Prints each result to stdout as `"<a>_<b> <statistic>"`.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl ResultSink for StdoutSink {
    fn emit(&self, result: &PairResult) {
        println!("{}_{} {}", result.a, result.b, result.statistic);
    }
}

/// Collects results into memory, for library callers and tests.
#[derive(Debug, Default)]
pub struct CollectSink {
    results: Mutex<Vec<PairResult>>,
}

impl CollectSink {
    /// New, empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the sink and return everything emitted, in arrival order.
    pub fn into_results(self) -> Vec<PairResult> {
        self.results.into_inner().unwrap_or_default()
    }
}

impl ResultSink for CollectSink {
    fn emit(&self, result: &PairResult) {
        if let Ok(mut results) = self.results.lock() {
            results.push(*result);
        }
    }
}

/// Enumeration of the unordered list-index pairs to score.
///
/// Pairs are generated in row-major order: for each `a` from 1 to L, every
/// `b > a` (or `b >= a` when self pairs are enabled). Scoring a list against
/// itself is a mathematical identity, so self pairs are off by default and
/// exist only as an opt-in baseline.
#[derive(Debug, Clone, Copy)]
pub struct PairPlan {
    num_lists: usize,
    include_self_pairs: bool,
}

impl PairPlan {
    /// Plan over `num_lists` lists, self pairs excluded.
    pub fn new(num_lists: usize) -> Self {
        Self {
            num_lists,
            include_self_pairs: false,
        }
    }

    /// Toggle inclusion of `(a, a)` pairs.
    pub fn with_self_pairs(mut self, include: bool) -> Self {
        self.include_self_pairs = include;
        self
    }

    /// Number of lists the plan covers.
    pub fn num_lists(&self) -> usize {
        self.num_lists
    }

    /// Number of pairs the plan will generate.
    pub fn count(&self) -> usize {
        let unordered = self.num_lists * self.num_lists.saturating_sub(1) / 2;
        if self.include_self_pairs {
            unordered + self.num_lists
        } else {
            unordered
        }
    }

    /// Materialize the pair list.
    pub fn pairs(&self) -> Vec<(u32, u32)> {
        let mut pairs = Vec::with_capacity(self.count());
        for a in 1..=self.num_lists as u32 {
            let first_b = if self.include_self_pairs { a } else { a + 1 };
            for b in first_b..=self.num_lists as u32 {
                pairs.push((a, b));
            }
        }
        pairs
    }
}

/// Split the pair list into `workers` contiguous chunks.
///
/// Each chunk holds `total / workers` pairs; the remainder is appended to the
/// last chunk. Chunks concatenate back to the input in order.
pub fn chunk_pairs(pairs: &[(u32, u32)], workers: usize) -> Vec<&[(u32, u32)]> {
    let workers = workers.max(1);
    let per_worker = pairs.len() / workers;
    let mut chunks = Vec::with_capacity(workers);
    let mut start = 0;
    for worker in 0..workers {
        let end = if worker == workers - 1 {
            pairs.len()
        } else {
            start + per_worker
        };
        chunks.push(&pairs[start..end]);
        start = end;
    }
    chunks
}

/// Execution mode for the pairwise run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Shared-memory rayon pool over the pair list.
    Threads,
    /// Coordinator plus `P-1` workers exchanging channel messages.
    Workers,
}

/// Errors raised while distributing and collecting pairwise work.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The list loader failed for one of the pair's indices.
    #[error("failed to load list {index}: {source}")]
    Load {
        /// 1-based list index that failed to load.
        index: u32,
        /// Underlying loader failure.
        source: SourceError,
    },
    /// The scoring engine rejected its inputs.
    #[error(transparent)]
    Score(#[from] ScoreError),
    /// The rayon pool could not be constructed.
    #[error("failed to build scoring thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    /// A worker reported a fatal failure for one pair.
    #[error("worker failed on pair {a}_{b}: {message}")]
    WorkerFailed {
        /// First list index of the failed pair.
        a: u32,
        /// Second list index of the failed pair.
        b: u32,
        /// Worker-side error description.
        message: String,
    },
    /// Every worker channel closed before all results arrived.
    #[error("workers disconnected after {received} of {total} results")]
    WorkersDisconnected {
        /// Results collected before the disconnect.
        received: usize,
        /// Results that were expected in total.
        total: usize,
    },
    /// The plan references more lists than the source provides.
    #[error("plan covers {required} lists but the source provides {available}")]
    PlanExceedsSource {
        /// Lists the plan enumerates.
        required: usize,
        /// Lists the source can load.
        available: usize,
    },
}

/// Chunk of pairs handed to one worker, sent exactly once.
#[derive(Debug)]
struct WorkAssignment {
    pairs: Vec<(u32, u32)>,
}

/// One message back from a worker per completed (or failed) pair.
#[derive(Debug)]
enum WorkerMessage {
    Completed(PairResult),
    Failed { a: u32, b: u32, message: String },
}

/// Drives the full pairwise workload against a list source.
#[derive(Debug)]
pub struct Coordinator<'s, S: ListSource + ?Sized> {
    source: &'s S,
    config: RunConfig,
    workers: usize,
}

impl<'s, S: ListSource + ?Sized> Coordinator<'s, S> {
    /// New coordinator over `source` with `workers` parallel workers.
    ///
    /// In thread mode `workers` is the rayon pool size; in worker mode it is
    /// the process-count analogue P, of which one is the coordinator itself.
    pub fn new(source: &'s S, config: RunConfig, workers: usize) -> Self {
        Self {
            source,
            config,
            workers: workers.max(1),
        }
    }

    /// Evaluate every pair in the plan, emitting results into `sink`.
    ///
    /// Returns the number of results emitted. Results arrive in no
    /// particular order in either mode.
    pub fn run(
        &self,
        plan: &PairPlan,
        mode: ExecMode,
        sink: &dyn ResultSink,
    ) -> Result<usize, CoordinatorError> {
        if plan.num_lists() > self.source.num_lists() {
            return Err(CoordinatorError::PlanExceedsSource {
                required: plan.num_lists(),
                available: self.source.num_lists(),
            });
        }

        let pairs = plan.pairs();
        info!(
            pairs = pairs.len(),
            workers = self.workers,
            ?mode,
            "starting pairwise evaluation"
        );
        match mode {
            ExecMode::Threads => self.run_threads(&pairs, sink),
            ExecMode::Workers => self.run_workers(&pairs, sink),
        }
    }

    /// Load both lists and score one pair.
    fn evaluate(&self, a: u32, b: u32) -> Result<PairResult, CoordinatorError> {
        let list_a = self
            .source
            .load(a)
            .map_err(|source| CoordinatorError::Load { index: a, source })?;
        let list_b = self
            .source
            .load(b)
            .map_err(|source| CoordinatorError::Load { index: b, source })?;
        let statistic = evaluate_pair(&list_a, &list_b, &self.config)?;
        Ok(PairResult { a, b, statistic })
    }

    fn run_threads(
        &self,
        pairs: &[(u32, u32)],
        sink: &dyn ResultSink,
    ) -> Result<usize, CoordinatorError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;
        pool.install(|| {
            pairs.par_iter().try_for_each(|&(a, b)| {
                let result = self.evaluate(a, b)?;
                sink.emit(&result);
                Ok::<(), CoordinatorError>(())
            })
        })?;
        Ok(pairs.len())
    }

    fn run_workers(
        &self,
        pairs: &[(u32, u32)],
        sink: &dyn ResultSink,
    ) -> Result<usize, CoordinatorError> {
        let worker_count = self.workers.saturating_sub(1).max(1);
        let chunks = chunk_pairs(pairs, worker_count);
        let total = pairs.len();
        let (result_tx, result_rx) = unbounded::<WorkerMessage>();

        std::thread::scope(|scope| {
            for (worker_id, chunk) in chunks.into_iter().enumerate() {
                let (work_tx, work_rx) = bounded::<WorkAssignment>(1);
                let results = result_tx.clone();
                scope.spawn(move || self.worker_loop(worker_id, work_rx, results));
                // The send cannot block: the channel holds the one assignment
                // a worker ever receives.
                let assignment = WorkAssignment {
                    pairs: chunk.to_vec(),
                };
                if work_tx.send(assignment).is_err() {
                    return Err(CoordinatorError::WorkersDisconnected { received: 0, total });
                }
            }
            drop(result_tx);

            let mut received = 0usize;
            while received < total {
                match result_rx.recv() {
                    Ok(WorkerMessage::Completed(result)) => {
                        sink.emit(&result);
                        received += 1;
                    }
                    Ok(WorkerMessage::Failed { a, b, message }) => {
                        return Err(CoordinatorError::WorkerFailed { a, b, message });
                    }
                    Err(_) => {
                        return Err(CoordinatorError::WorkersDisconnected { received, total });
                    }
                }
            }
            Ok(received)
        })
    }

    /// Worker body: block for the assignment, then score pair after pair.
    ///
    /// A scoring or load failure is reported back and ends the worker; a
    /// closed result channel means the coordinator already gave up.
    fn worker_loop(
        &self,
        worker_id: usize,
        work: Receiver<WorkAssignment>,
        results: Sender<WorkerMessage>,
    ) {
        let Ok(assignment) = work.recv() else {
            return;
        };
        debug!(
            worker_id,
            pairs = assignment.pairs.len(),
            "worker received assignment"
        );
        for (a, b) in assignment.pairs {
            let message = match self.evaluate(a, b) {
                Ok(result) => WorkerMessage::Completed(result),
                Err(error) => WorkerMessage::Failed {
                    a,
                    b,
                    message: error.to_string(),
                },
            };
            let fatal = matches!(message, WorkerMessage::Failed { .. });
            if results.send(message).is_err() || fatal {
                return;
            }
        }
    }
}
