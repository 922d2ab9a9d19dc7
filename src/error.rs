//! Validation errors
//!
//! Everything here is checked before any tokenizing or indexing starts.
//! Failures that happen mid-join (I/O, a crashed worker) are reported
//! through `anyhow` with context instead.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum JoinError {
    #[error("invalid threshold {0}: edit distance threshold must be a finite value >= 0")]
    InvalidThreshold(f64),

    #[error("invalid comparison operator '{0}': expected one of '<=', '<', '='")]
    InvalidCompOp(String),

    #[error("edit distance join requires a q-gram tokenizer, got {0}")]
    InvalidTokenizer(&'static str),

    #[error("q-gram length must be at least 1")]
    InvalidQval,

    #[error("flush limit must be at least 1 row")]
    InvalidFlushLimit,

    #[error("{table}: key attribute '{attr}' is empty at row {row}")]
    MissingKey {
        table: String,
        attr: String,
        row: usize,
    },

    #[error("{table}: key attribute '{attr}' is not unique (duplicate key '{key}')")]
    DuplicateKey {
        table: String,
        attr: String,
        key: String,
    },

    #[error("{table}: row {row} has {found} output attribute values, expected {expected}")]
    AttributeArity {
        table: String,
        row: usize,
        expected: usize,
        found: usize,
    },
}
