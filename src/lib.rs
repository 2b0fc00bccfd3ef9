//! # Weighted rank-rank Kolmogorov-Smirnov scoring
//!
//! This library scores every pair among a collection of ranked gene lists
//! with a weighted, rank-based KS-style divergence statistic (after Ni and
//! Vingron), and spreads the O(L^2) pairwise workload across parallel
//! workers.
//!
//! ## Core pieces
//!
//! 1. **Rank arrays** ([`ranks`]): each list is a dense permutation mapping
//!    gene identity to rank position, with the inverse modeled explicitly.
//! 2. **Staircase engine** ([`score`]): the statistic is computed
//!    incrementally over a compact staircase of cumulative weighted
//!    concordance, never materializing the full NxN matrix.
//! 3. **Weighting** ([`weight`]): an optional pivot emphasizes agreement
//!    among top-ranked genes.
//! 4. **Coordination** ([`coordinator`]): unordered pairs are enumerated,
//!    statically partitioned, and evaluated on a thread pool or by
//!    message-passing workers.
//!
//! ## Usage example
//!
//! ```ignore
//! use r2ks::{Coordinator, ExecMode, ListSource, PairPlan, RankFile, RunConfig, StdoutSink};
//!
//! let source = RankFile::open("lists.txt")?;
//! let plan = PairPlan::new(source.num_lists());
//! let coordinator = Coordinator::new(&source, RunConfig::default(), 8);
//! coordinator.run(&plan, ExecMode::Threads, &StdoutSink)?;
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod coordinator; // pair enumeration and work distribution
pub mod ranks; // dense rank permutations and their inverses
pub mod score; // the incremental staircase engine
pub mod source; // list-loader boundary (file and in-memory)
pub mod weight; // pivot-based positional weighting

// Re-exports for convenience
pub use coordinator::{
    chunk_pairs, CollectSink, Coordinator, CoordinatorError, ExecMode, PairPlan, PairResult,
    ResultSink, StdoutSink,
};
pub use ranks::{GeneOrder, RankArray, RankError};
pub use score::{evaluate_pair, score_lists, ScoreError};
pub use source::{ListSource, MemorySource, RankFile, SourceError};
pub use weight::{total_weight, weight};

/// Run-wide scoring parameters, fixed before any pair is evaluated.
///
/// Passed explicitly into every evaluation rather than held as shared state;
/// workers each see the same immutable copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    /// Rank index at or below which weighting ramps up; 0 disables
    /// weighting.
    pub pivot: u32,
    /// Also score against the reversed second list and keep the larger
    /// statistic.
    pub two_tailed: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            pivot: 0,
            two_tailed: false,
        }
    }
}

impl RunConfig {
    /// Set the weighting pivot.
    pub fn with_pivot(mut self, pivot: u32) -> Self {
        self.pivot = pivot;
        self
    }

    /// Enable the two-tailed test.
    pub fn two_tailed(mut self) -> Self {
        self.two_tailed = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_unweighted_one_tailed() {
        let config = RunConfig::default();
        assert_eq!(config.pivot, 0);
        assert!(!config.two_tailed);
    }

    #[test]
    fn builder_sets_fields() {
        let config = RunConfig::default().with_pivot(100).two_tailed();
        assert_eq!(config.pivot, 100);
        assert!(config.two_tailed);
    }
}
