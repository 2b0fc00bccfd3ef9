use thiserror::Error;

/// Dense rank array for one gene list.
///
/// Indexed by gene identity; the stored value is that gene's 0-based rank
/// position within the list. A valid `RankArray` is always a permutation of
/// `{0, .., N-1}`: every gene appears exactly once and every rank position is
/// used exactly once. Construction enforces this, so downstream scoring can
/// assume it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankArray {
    ranks: Vec<u32>,
}

/// Errors raised while building a rank array.
#[derive(Debug, Error)]
pub enum RankError {
    /// A rank or gene value does not fit the list length.
    #[error("value {value} out of range for a list of {len} genes")]
    OutOfRange {
        /// Offending value.
        value: u32,
        /// Declared list length.
        len: usize,
    },
    /// A rank or gene value occurred more than once.
    #[error("duplicate value {value} in rank list")]
    Duplicate {
        /// Value seen twice.
        value: u32,
    },
    /// The list contains no entries.
    #[error("rank list is empty")]
    Empty,
}

fn check_permutation(values: &[u32]) -> Result<(), RankError> {
    if values.is_empty() {
        return Err(RankError::Empty);
    }
    let len = values.len();
    let mut seen = vec![false; len];
    for &value in values {
        let idx = value as usize;
        if idx >= len {
            return Err(RankError::OutOfRange { value, len });
        }
        if seen[idx] {
            return Err(RankError::Duplicate { value });
        }
        seen[idx] = true;
    }
    Ok(())
}

impl RankArray {
    /// Build from a gene-indexed rank vector (`ranks[gene] = rank`).
    pub fn from_ranks(ranks: Vec<u32>) -> Result<Self, RankError> {
        check_permutation(&ranks)?;
        Ok(Self { ranks })
    }

    /// Build from a ranked ordering of gene values.
    ///
    /// `order[position] = gene` is the shape the data file stores: scanning a
    /// list line left to right yields the gene at each successive rank. The
    /// resulting array records `rank[gene] = position`.
    pub fn from_order(order: &[u32]) -> Result<Self, RankError> {
        check_permutation(order)?;
        let mut ranks = vec![0u32; order.len()];
        for (position, &gene) in order.iter().enumerate() {
            ranks[gene as usize] = position as u32;
        }
        Ok(Self { ranks })
    }

    /// Number of genes in the list.
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    /// True when the list holds no genes. Construction rejects this, so a
    /// live `RankArray` always returns false.
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    /// Rank position of `gene` within this list.
    pub fn rank_of(&self, gene: u32) -> u32 {
        self.ranks[gene as usize]
    }

    /// Gene-indexed rank values.
    pub fn as_slice(&self) -> &[u32] {
        &self.ranks
    }

    /// Explicit inverse: the gene occupying each rank position.
    pub fn order(&self) -> GeneOrder {
        let mut genes = vec![0u32; self.ranks.len()];
        for (gene, &rank) in self.ranks.iter().enumerate() {
            genes[rank as usize] = gene as u32;
        }
        GeneOrder { genes }
    }

    /// A new list with the ranking reversed: position `i` holds the gene
    /// previously at position `N-1-i`. The original is untouched.
    pub fn reversed(&self) -> RankArray {
        let last = (self.ranks.len() - 1) as u32;
        let ranks = self.ranks.iter().map(|&rank| last - rank).collect();
        RankArray { ranks }
    }
}

/// The inverse of a [`RankArray`]: indexed by rank position, value = gene.
///
/// Built once per scoring pass so the engine can walk list A in rank order
/// without re-deriving the permutation inverse at every step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneOrder {
    genes: Vec<u32>,
}

impl GeneOrder {
    /// Gene occupying rank `position`.
    pub fn gene_at(&self, position: usize) -> u32 {
        self.genes[position]
    }

    /// Number of rank positions.
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// True when there are no positions.
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}
