//! Positional weighting for rank comparisons.
//!
//! A nonzero pivot biases the statistic toward agreement among top-ranked
//! genes: positions ahead of the pivot get a triangular ramp weight, positions
//! past it the minimum weight of 1.0.

/// Weight for a rank position under the given pivot.
///
/// A pivot of 0 disables weighting entirely (every position weighs 1.0).
/// Otherwise, with `h = pivot - position`, positions past the pivot
/// (`h < 0`) weigh 1.0 and earlier positions weigh `h * (h + 1) / 2`. Note
/// that the pivot position itself (`h == 0`) weighs 0.0.
pub fn weight(position: u32, pivot: u32) -> f64 {
    if pivot == 0 {
        return 1.0;
    }
    let h = pivot as f64 - position as f64;
    if h < 0.0 {
        1.0
    } else {
        h * (h + 1.0) / 2.0
    }
}

/// Total weight over all positions of a list of length `len`.
///
/// Normalizer for the cumulative weighted mass accumulated by the scoring
/// engine.
pub fn total_weight(len: usize, pivot: u32) -> f64 {
    (0..len).map(|position| weight(position as u32, pivot)).sum()
}
