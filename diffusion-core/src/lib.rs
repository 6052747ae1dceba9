//! Parallel explicit heat diffusion on a rectangular grid.
//!
//! A [`DiffusionEngine`] owns a double-buffered [`Field`], a
//! [`BoundaryPolicy`] for the border cells and a [`TileScheduler`] that fans
//! the 5-point [`StencilKernel`] out over row tiles on a fixed worker pool.
//!
//! ```
//! use diffusion_core::{BoundaryKind, DiffusionEngine};
//!
//! let mut engine = DiffusionEngine::<f32>::construct(5, 5, 0.2, BoundaryKind::Fixed, 2)?;
//! let mut init = vec![0.0; 25];
//! init[2 * 5 + 2] = 100.0;
//! engine.set_initial_field(&init)?;
//!
//! let outcome = engine.run_steps(1);
//! assert!((outcome.field.get(2, 2) - 20.0).abs() < 1e-4);
//! # Ok::<(), diffusion_core::EngineError>(())
//! ```

pub mod boundary;
pub mod engine;
pub mod error;
pub mod grid;
pub mod kernel;
pub mod scalar;
pub mod tile;

pub use boundary::{BoundaryKind, BoundaryPolicy, BorderSnapshot};
pub use engine::{DiffusionEngine, EngineConfig, EngineState, MAX_STABLE_ALPHA, RunOutcome};
pub use error::EngineError;
pub use grid::{DoubleBuffer, Field, MIN_EXTENT};
pub use kernel::StencilKernel;
pub use scalar::Scalar;
pub use tile::{Tile, TileScheduler, partition};
