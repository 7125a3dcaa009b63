//! Error types for simulation operations
//!
//! Every error here is local and recoverable: the operation that produced it
//! is skipped and the state it would have touched is left as it was.

use crate::parser::ParseError;
use thiserror::Error;

/// Result alias used across the core
pub type SimResult<T> = Result<T, SimError>;

/// What an out-of-range index was pointing into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    ControlPoint,
    Particle,
    Spring,
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IndexKind::ControlPoint => "control point",
            IndexKind::Particle => "particle",
            IndexKind::Spring => "spring",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("{kind} index {index} out of range (len {len})")]
    IndexOutOfRange {
        kind: IndexKind,
        index: usize,
        len: usize,
    },

    #[error("spline is full: at most {capacity} control points")]
    CapacityExceeded { capacity: usize },

    #[error("spring {spring} references missing particle {particle}")]
    InvalidTopology { spring: usize, particle: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl SimError {
    pub fn out_of_range(kind: IndexKind, index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { kind, index, len }
    }
}
