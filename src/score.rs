//! The weighted rank-rank Kolmogorov-Smirnov scoring engine.
//!
//! Follows the incremental technique of Ni and Vingron: instead of
//! materializing the full NxN rank-concordance matrix, the engine keeps a
//! compact staircase of boundary nodes that records, for each boundary rank in
//! list B, the cumulative weighted mass of concordant prefix pairs seen so
//! far. Each processed position either extends the staircase (O(1)) or walks
//! back through the nodes above the new boundary (O(k), worst case O(N) per
//! step). Substantially concordant lists stay near the cheap path.

use thiserror::Error;

use crate::ranks::RankArray;
use crate::weight::{total_weight, weight};
use crate::RunConfig;

/// Errors raised by the scoring engine.
#[derive(Debug, Error)]
pub enum ScoreError {
    /// The two lists do not cover the same number of genes, so the statistic
    /// would be meaningless.
    #[error("rank lists differ in length ({left} vs {right} genes)")]
    LengthMismatch {
        /// Length of the first list.
        left: usize,
        /// Length of the second list.
        right: usize,
    },
}

/// One step of the cumulative-concordance staircase.
///
/// `value` is the total weighted mass of all processed points `(i, y)` with
/// `y <= pos_y`. The node sequence is strictly increasing in `pos_y`.
#[derive(Debug, Clone, Copy)]
struct HistoryNode {
    pos_y: u32,
    value: f64,
}

/// Weighted rank-rank KS statistic for two lists over the same gene universe.
///
/// Processes rank positions of `list_a` in increasing order; for each, `y` is
/// the rank the same gene occupies in `list_b`. The running maximum of
/// `mass/total_weight - expected` over every staircase node touched is scaled
/// by `sqrt(N)` so the statistic is comparable across list lengths.
///
/// Both arguments must rank the same gene universe; lengths are checked,
/// shared identity is guaranteed by [`RankArray`] construction.
pub fn score_lists(list_a: &RankArray, list_b: &RankArray, pivot: u32) -> Result<f64, ScoreError> {
    let n = list_a.len();
    if n != list_b.len() {
        return Err(ScoreError::LengthMismatch {
            left: n,
            right: list_b.len(),
        });
    }

    let norm = total_weight(n, pivot);
    let one_over_n2 = 1.0 / ((n * n) as f64);
    let order_a = list_a.order();

    let mut history: Vec<HistoryNode> = Vec::new();
    let mut max_deviation = 0.0f64;

    for i in 0..n {
        let gene = order_a.gene_at(i);
        let y = list_b.rank_of(gene);

        // The first position carries its one-sided weight; later positions
        // take the smaller of the two side weights.
        let w = if i == 0 {
            weight(0, pivot)
        } else {
            weight(i as u32, pivot).min(weight(y, pivot))
        };

        let deviation = |node: &HistoryNode| {
            node.value / norm - ((node.pos_y + 1) as u64 * (i + 1) as u64) as f64 * one_over_n2
        };

        match history.last().copied() {
            // Extend: the new boundary lies past the whole staircase.
            Some(last) if y > last.pos_y => {
                let node = HistoryNode {
                    pos_y: y,
                    value: last.value + w,
                };
                history.push(node);
                max_deviation = max_deviation.max(deviation(&node));
            }
            // Insert: bump every node above the new boundary, then splice the
            // new node in at its ordered slot.
            _ => {
                let mut idx = history.len();
                while idx > 0 && history[idx - 1].pos_y > y {
                    history[idx - 1].value += w;
                    max_deviation = max_deviation.max(deviation(&history[idx - 1]));
                    idx -= 1;
                }
                let below = if idx > 0 { history[idx - 1].value } else { 0.0 };
                let node = HistoryNode {
                    pos_y: y,
                    value: below + w,
                };
                history.insert(idx, node);
                max_deviation = max_deviation.max(deviation(&node));
            }
        }
    }

    Ok(max_deviation * (n as f64).sqrt())
}

/// Score a pair of lists, optionally two-tailed.
///
/// The two-tailed form also scores `list_a` against the reversal of `list_b`
/// and keeps the stronger deviation. Reversal allocates a fresh array; the
/// input lists are never mutated.
pub fn evaluate_pair(
    list_a: &RankArray,
    list_b: &RankArray,
    config: &RunConfig,
) -> Result<f64, ScoreError> {
    let forward = score_lists(list_a, list_b, config.pivot)?;
    if !config.two_tailed {
        return Ok(forward);
    }
    let reversed = list_b.reversed();
    let backward = score_lists(list_a, &reversed, config.pivot)?;
    Ok(forward.max(backward))
}
