//! Shared helpers for integration tests.

#![allow(dead_code)]

use r2ks::{MemorySource, PairResult, RankArray};

/// Deterministic xorshift so tests need no RNG dependency.
pub struct SplitMix64(pub u64);

impl SplitMix64 {
    pub fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9e3779b97f4a7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^ (z >> 31)
    }
}

/// Fisher-Yates permutation of `0..n` from a fixed seed.
pub fn random_permutation(n: usize, seed: u64) -> Vec<u32> {
    let mut rng = SplitMix64(seed);
    let mut values: Vec<u32> = (0..n as u32).collect();
    for i in (1..n).rev() {
        let j = (rng.next() % (i as u64 + 1)) as usize;
        values.swap(i, j);
    }
    values
}

/// In-memory source of `num_lists` random lists over `num_genes` genes.
pub fn random_source(num_genes: usize, num_lists: usize, seed: u64) -> MemorySource {
    let lists = (0..num_lists)
        .map(|i| {
            RankArray::from_ranks(random_permutation(num_genes, seed ^ (i as u64 + 1))).unwrap()
        })
        .collect();
    MemorySource::new(lists).unwrap()
}

/// Sorted `(a, b)` index pairs from a result set.
pub fn index_pairs(results: &[PairResult]) -> Vec<(u32, u32)> {
    let mut pairs: Vec<(u32, u32)> = results.iter().map(|r| (r.a, r.b)).collect();
    pairs.sort_unstable();
    pairs
}
