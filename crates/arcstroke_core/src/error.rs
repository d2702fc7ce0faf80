//! Error types for batch construction and style parsing

use thiserror::Error;

/// Errors raised when assembling a batch from wire columns
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BatchError {
    #[error("column `{column}` has {actual} entries, expected {expected}")]
    LengthMismatch {
        column: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("segment {index} has unknown type value {value}")]
    UnknownKind { index: usize, value: u32 },
}

/// A join or cap name that is not recognised
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} `{value}`")]
pub struct StyleParseError {
    kind: &'static str,
    value: String,
}

impl StyleParseError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BatchError>;
