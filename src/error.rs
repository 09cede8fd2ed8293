//! Error taxonomy (spec §7), hand-rolled `Display`/`Error` impls in
//! the style of the teacher crate's `BPlusTreeError` rather than a
//! derive-macro crate: the corpus repo this crate is patterned on
//! carries no `thiserror` dependency, so neither does this one.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RrcfError {
    /// A point's dimension didn't match the tree's configured `d`.
    DimensionMismatch { expected: usize, found: usize },
    /// `forgetPoint` was called for a point absent from the tree.
    NotFound,
    /// A ring buffer read targeted an index that has already been
    /// evicted, or one that hasn't been written yet.
    Evicted { index: u64 },
}

impl fmt::Display for RrcfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RrcfError::DimensionMismatch { expected, found } => write!(
                f,
                "DimensionMismatch: expected {expected} dimensions, found {found}"
            ),
            RrcfError::NotFound => write!(f, "NotFound: no matching leaf in the tree"),
            RrcfError::Evicted { index } => {
                write!(f, "Evicted: ring buffer index {index} is no longer live")
            }
        }
    }
}

impl std::error::Error for RrcfError {}

pub type RrcfResult<T> = Result<T, RrcfError>;
