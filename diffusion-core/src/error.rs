//! Errors raised while building or initializing a [`DiffusionEngine`].
//!
//! All of them surface synchronously at construction or initial-field time.
//! Stepping has no error path.
//!
//! [`DiffusionEngine`]: crate::DiffusionEngine

use std::error::Error;
use std::fmt;

use crate::engine::MAX_STABLE_ALPHA;

#[derive(Clone, Debug, PartialEq)]
pub enum EngineError {
    /// Grid too small to have interior cells (`nx < 3` or `ny < 3`).
    InvalidDimension { nx: usize, ny: usize },
    /// Diffusion coefficient outside the stable range `(0, 0.25]`.
    InvalidCoefficient { alpha: f64 },
    /// Supplied field does not match the engine's `nx × ny` shape.
    ShapeMismatch {
        /// Expected cell count (`nx * ny`).
        expected: usize,
        /// Cell count actually supplied.
        actual: usize,
    },
    /// The worker pool could not be created.
    ThreadPool { reason: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimension { nx, ny } => {
                write!(f, "grid {nx}x{ny} has no interior (need nx >= 3 and ny >= 3)")
            }
            Self::InvalidCoefficient { alpha } => {
                write!(f, "alpha {alpha} outside stable range (0, {MAX_STABLE_ALPHA}]")
            }
            Self::ShapeMismatch { expected, actual } => {
                write!(f, "field has {actual} cells, expected {expected}")
            }
            Self::ThreadPool { reason } => write!(f, "failed to build worker pool: {reason}"),
        }
    }
}

impl Error for EngineError {}

impl From<rayon::ThreadPoolBuildError> for EngineError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        Self::ThreadPool {
            reason: e.to_string(),
        }
    }
}
