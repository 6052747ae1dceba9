//! The step orchestrator: interior pass, barrier, border, swap.

use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use crate::boundary::{BoundaryKind, BoundaryPolicy};
use crate::error::EngineError;
use crate::grid::{DoubleBuffer, Field, MIN_EXTENT};
use crate::kernel::StencilKernel;
use crate::scalar::Scalar;
use crate::tile::{Tile, TileScheduler};

/// Largest `alpha` for which the explicit 5-point scheme stays bounded.
pub const MAX_STABLE_ALPHA: f64 = 0.25;

// ---- Configuration ----

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Rows.
    pub nx: usize,
    /// Columns.
    pub ny: usize,
    /// Diffusion coefficient, `0 < alpha <= 0.25`.
    pub alpha: f64,
    pub boundary: BoundaryKind,
    /// Worker count. `0` = available hardware parallelism.
    pub threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            nx: 64,
            ny: 64,
            alpha: 0.2,
            boundary: BoundaryKind::Fixed,
            threads: 0,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.nx < MIN_EXTENT || self.ny < MIN_EXTENT {
            return Err(EngineError::InvalidDimension {
                nx: self.nx,
                ny: self.ny,
            });
        }
        if !(self.alpha > 0.0 && self.alpha <= MAX_STABLE_ALPHA) {
            return Err(EngineError::InvalidCoefficient { alpha: self.alpha });
        }
        Ok(())
    }

    pub fn resolved_threads(&self) -> usize {
        match self.threads {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        }
    }

    pub fn interior_cells(&self) -> usize {
        self.nx.saturating_sub(2) * self.ny.saturating_sub(2)
    }
}

// ---- State ----

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    /// Only observable inside `advance`; `step` returns to `Idle`.
    Stepping,
    /// Terminal; further steps are ignored.
    Finished,
}

/// Result of [`DiffusionEngine::run_steps`].
#[derive(Debug)]
pub struct RunOutcome<'a, T> {
    pub elapsed: Duration,
    pub steps: usize,
    /// The authoritative field after the last step.
    pub field: &'a Field<T>,
}

impl<T: Scalar> RunOutcome<'_, T> {
    /// Interior cell updates per second, or 0 when nothing ran.
    pub fn cell_updates_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if self.steps == 0 || secs <= 0.0 {
            return 0.0;
        }
        let interior = (self.field.nx() - 2) * (self.field.ny() - 2);
        (interior as f64 * self.steps as f64) / secs
    }
}

// ---- Engine ----

pub struct DiffusionEngine<T: Scalar = f32> {
    config: EngineConfig,
    buffers: DoubleBuffer<T>,
    boundary: BoundaryPolicy<T>,
    kernel: StencilKernel<T>,
    scheduler: TileScheduler,
    state: EngineState,
    steps: u64,
}

impl<T: Scalar> DiffusionEngine<T> {
    /// Validates `config` and builds buffers, border policy and worker pool.
    ///
    /// Nothing is allocated when validation fails.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let buffers = DoubleBuffer::allocate(config.nx, config.ny)?;
        let boundary = BoundaryPolicy::new(config.boundary, buffers.current());
        // Validated in f64; the cell type may still round it to zero.
        let alpha = T::from_f64(config.alpha)
            .filter(|a| a.is_finite() && *a > T::zero())
            .ok_or(EngineError::InvalidCoefficient {
                alpha: config.alpha,
            })?;
        let kernel = StencilKernel::new(alpha);
        let mut scheduler = TileScheduler::new(config.resolved_threads())?;
        scheduler.tiles(config.nx);

        info!(
            nx = config.nx,
            ny = config.ny,
            alpha = config.alpha,
            boundary = config.boundary.as_str(),
            threads = scheduler.threads(),
            "diffusion engine ready"
        );

        Ok(DiffusionEngine {
            config,
            buffers,
            boundary,
            kernel,
            scheduler,
            state: EngineState::Idle,
            steps: 0,
        })
    }

    pub fn construct(
        nx: usize,
        ny: usize,
        alpha: f64,
        boundary: BoundaryKind,
        threads: usize,
    ) -> Result<Self, EngineError> {
        Self::new(EngineConfig {
            nx,
            ny,
            alpha,
            boundary,
            threads,
        })
    }

    // ---- Initial field ----

    /// Copies a row-major `nx × ny` slice into both buffers.
    pub fn set_initial_field(&mut self, values: &[T]) -> Result<(), EngineError> {
        let field = Field::from_values(self.config.nx, self.config.ny, values.to_vec())?;
        self.set_initial(&field)
    }

    /// Installs `field` as the starting state and re-snapshots fixed borders.
    pub fn set_initial(&mut self, field: &Field<T>) -> Result<(), EngineError> {
        if field.nx() != self.config.nx || field.ny() != self.config.ny {
            return Err(EngineError::ShapeMismatch {
                expected: self.config.nx * self.config.ny,
                actual: field.len(),
            });
        }
        self.buffers.fill(field)?;
        self.boundary = BoundaryPolicy::new(self.config.boundary, field);
        self.steps = 0;

        debug!(
            sum = field.sum(),
            max = field.max().as_f64(),
            "initial field installed"
        );
        Ok(())
    }

    // ---- Stepping ----

    /// Advances one time step.
    pub fn step(&mut self) {
        if self.state == EngineState::Finished {
            warn!("step() on a finished engine ignored");
            return;
        }
        self.advance();
    }

    fn advance(&mut self) {
        self.state = EngineState::Stepping;

        let (current, next) = self.buffers.split();
        self.scheduler.dispatch(current, next, &self.kernel);
        self.boundary.apply(current, next);
        self.buffers.swap();

        self.steps += 1;
        self.state = EngineState::Idle;
        trace!(step = self.steps, "step complete");
    }

    /// Runs `n` sequential steps and reports the wall time they took.
    pub fn run_steps(&mut self, n: usize) -> RunOutcome<'_, T> {
        if self.state == EngineState::Finished {
            warn!(requested = n, "run_steps() on a finished engine ignored");
            return RunOutcome {
                elapsed: Duration::ZERO,
                steps: 0,
                field: self.buffers.current(),
            };
        }

        let start = Instant::now();
        for _ in 0..n {
            self.advance();
        }
        let elapsed = start.elapsed();

        info!(
            steps = n,
            total_steps = self.steps,
            elapsed_ms = elapsed.as_secs_f64() * 1e3,
            "run complete"
        );

        RunOutcome {
            elapsed,
            steps: n,
            field: self.buffers.current(),
        }
    }

    /// Marks the run finished; the engine stops stepping.
    pub fn finish(&mut self) {
        self.state = EngineState::Finished;
    }

    // ---- Accessors ----

    /// Read-only view of the authoritative buffer.
    pub fn field(&self) -> &Field<T> {
        self.buffers.current()
    }

    pub fn snapshot(&self) -> Field<T> {
        self.buffers.current().clone()
    }

    pub fn into_field(self) -> Field<T> {
        self.buffers.into_current()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn steps_taken(&self) -> u64 {
        self.steps
    }

    pub fn thread_count(&self) -> usize {
        self.scheduler.threads()
    }

    /// The tile layout `step` dispatches.
    pub fn tiles(&self) -> &[Tile] {
        self.scheduler.cached_tiles()
    }

    pub fn boundary_kind(&self) -> BoundaryKind {
        self.boundary.kind()
    }

    pub fn alpha(&self) -> T {
        self.kernel.alpha()
    }
}

impl<T: Scalar> std::fmt::Debug for DiffusionEngine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffusionEngine")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("steps", &self.steps)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}
