//! The list-loader boundary.
//!
//! Scoring never touches the file format directly: it asks a [`ListSource`]
//! for the dense rank array of a 1-based list index. [`RankFile`] implements
//! the on-disk format (a header line `num_genes num_lists`, then one
//! whitespace-separated list per line); [`MemorySource`] serves pre-built
//! arrays for library use and tests. All malformed-input detection happens
//! here, so the engine can rely on well-formed permutations.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::ranks::{RankArray, RankError};

/// Errors raised while reading rank lists.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Underlying file I/O failed.
    #[error("i/o error reading rank data: {0}")]
    Io(#[from] std::io::Error),
    /// The header line is missing or does not parse as two counts.
    #[error("malformed header: {0}")]
    BadHeader(String),
    /// A list index outside `1..=num_lists` was requested.
    #[error("list index {index} out of range (file declares {num_lists} lists)")]
    IndexOutOfRange {
        /// Requested 1-based index.
        index: u32,
        /// Number of lists the header declares.
        num_lists: usize,
    },
    /// The file ended before the requested list line.
    #[error("list {index} missing: file has fewer data lines than the header declares")]
    MissingLine {
        /// Requested 1-based index.
        index: u32,
    },
    /// A list line holds the wrong number of tokens.
    #[error("malformed list {index}: expected {expected} values, found {found}")]
    WrongTokenCount {
        /// Requested 1-based index.
        index: u32,
        /// Gene count the header declares.
        expected: usize,
        /// Tokens actually present.
        found: usize,
    },
    /// A list line holds a token that is not a gene value.
    #[error("malformed list {index}: token '{token}' is not a gene value")]
    NonNumericToken {
        /// Requested 1-based index.
        index: u32,
        /// Offending token text.
        token: String,
    },
    /// A list line is numeric but not a permutation of the gene universe.
    #[error("malformed list {index}: {source}")]
    InvalidList {
        /// Requested 1-based index.
        index: u32,
        /// Underlying permutation violation.
        source: RankError,
    },
    /// An in-memory list does not match the shared gene count.
    #[error("list {index} ranks {found} genes, expected {expected}")]
    ListLengthMismatch {
        /// 1-based index of the offending list.
        index: u32,
        /// Gene count of the first list.
        expected: usize,
        /// Gene count actually found.
        found: usize,
    },
}

/// Provider of rank arrays by 1-based list index.
///
/// Implementations must be shareable across the worker threads that evaluate
/// pairs concurrently; each call returns a freshly owned array.
pub trait ListSource: Sync {
    /// Number of genes every list ranks.
    fn num_genes(&self) -> usize;

    /// Number of lists available.
    fn num_lists(&self) -> usize;

    /// Load the rank array for the given 1-based list index.
    fn load(&self, index: u32) -> Result<RankArray, SourceError>;
}

/// On-disk rank-list file.
///
/// The first line declares `num_genes num_lists`; each following line is one
/// list, written as gene values in rank order. List `i` (1-based) lives on
/// data line `i`. Every `load` re-reads the file, so concurrent loads never
/// contend on shared reader state.
#[derive(Debug, Clone)]
pub struct RankFile {
    path: PathBuf,
    num_genes: usize,
    num_lists: usize,
}

impl RankFile {
    /// Open a rank-list file and parse its header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();
        let mut reader = BufReader::new(File::open(&path)?);
        let mut header = String::new();
        reader.read_line(&mut header)?;

        let mut fields = header.split_whitespace();
        let num_genes = parse_header_field(fields.next(), &header)?;
        let num_lists = parse_header_field(fields.next(), &header)?;
        if num_genes == 0 {
            return Err(SourceError::BadHeader(
                "gene count must be nonzero".to_string(),
            ));
        }

        Ok(Self {
            path,
            num_genes,
            num_lists,
        })
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn parse_header_field(field: Option<&str>, header: &str) -> Result<usize, SourceError> {
    field
        .and_then(|token| token.parse::<usize>().ok())
        .ok_or_else(|| SourceError::BadHeader(header.trim().to_string()))
}

impl ListSource for RankFile {
    fn num_genes(&self) -> usize {
        self.num_genes
    }

    fn num_lists(&self) -> usize {
        self.num_lists
    }

    fn load(&self, index: u32) -> Result<RankArray, SourceError> {
        if index == 0 || index as usize > self.num_lists {
            return Err(SourceError::IndexOutOfRange {
                index,
                num_lists: self.num_lists,
            });
        }

        let reader = BufReader::new(File::open(&self.path)?);
        // Data line `index` sits `index` lines past the start (line 0 is the
        // header).
        let line = reader
            .lines()
            .nth(index as usize)
            .transpose()?
            .ok_or(SourceError::MissingLine { index })?;

        let mut order = Vec::with_capacity(self.num_genes);
        for token in line.split_whitespace() {
            let gene = token
                .parse::<u32>()
                .map_err(|_| SourceError::NonNumericToken {
                    index,
                    token: token.to_string(),
                })?;
            order.push(gene);
        }
        if order.len() != self.num_genes {
            return Err(SourceError::WrongTokenCount {
                index,
                expected: self.num_genes,
                found: order.len(),
            });
        }

        RankArray::from_order(&order).map_err(|source| SourceError::InvalidList { index, source })
    }
}

/// In-memory list source.
///
/// Holds pre-built rank arrays; `load` clones the requested one so callers
/// keep the exclusive ownership the scoring engine expects.
#[derive(Debug, Clone)]
pub struct MemorySource {
    lists: Vec<RankArray>,
    num_genes: usize,
}

impl MemorySource {
    /// Build from rank arrays, which must all cover the same gene universe.
    pub fn new(lists: Vec<RankArray>) -> Result<Self, SourceError> {
        let num_genes = lists.first().map(RankArray::len).unwrap_or(0);
        for (i, list) in lists.iter().enumerate() {
            if list.len() != num_genes {
                return Err(SourceError::ListLengthMismatch {
                    index: (i + 1) as u32,
                    expected: num_genes,
                    found: list.len(),
                });
            }
        }
        Ok(Self { lists, num_genes })
    }
}

impl ListSource for MemorySource {
    fn num_genes(&self) -> usize {
        self.num_genes
    }

    fn num_lists(&self) -> usize {
        self.lists.len()
    }

    fn load(&self, index: u32) -> Result<RankArray, SourceError> {
        if index == 0 || index as usize > self.lists.len() {
            return Err(SourceError::IndexOutOfRange {
                index,
                num_lists: self.lists.len(),
            });
        }
        Ok(self.lists[index as usize - 1].clone())
    }
}
