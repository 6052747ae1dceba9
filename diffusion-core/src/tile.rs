//! Row-tile partitioning and parallel dispatch of the interior pass.
//!
//! The interior rows `1..=nx-2` are cut into one contiguous tile per worker.
//! Each tile gets an exclusive `&mut` slice of `next` (carved out with
//! `split_at_mut`) and a shared `&` to `current`, so workers never contend and
//! need no locks. The enclosing `rayon` scope is the end-of-step barrier.

use std::ops::Range;

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::EngineError;
use crate::grid::Field;
use crate::kernel::StencilKernel;
use crate::scalar::Scalar;

/// Half-open range of interior rows `[start, end)` handled by one worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    pub start: usize,
    pub end: usize,
}

impl Tile {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn rows(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Splits interior rows of an `nx`-row grid into `thread_count` tiles.
///
/// Tiles are contiguous and ordered; the first `rows % thread_count` get one
/// extra row. With more threads than rows the trailing tiles are empty.
/// A `thread_count` of zero is treated as one.
pub fn partition(nx: usize, thread_count: usize) -> Vec<Tile> {
    let tiles = thread_count.max(1);
    let rows = nx.saturating_sub(2);
    let base = rows / tiles;
    let extra = rows % tiles;

    let mut start = 1;
    (0..tiles)
        .map(|k| {
            let len = base + usize::from(k < extra);
            let tile = Tile {
                start,
                end: start + len,
            };
            start += len;
            tile
        })
        .collect()
}

#[derive(Debug, Default)]
struct TileCache {
    nx: usize,
    tiles: Vec<Tile>,
}

/// Owns the worker pool and the tile layout for the current grid height.
pub struct TileScheduler {
    pool: ThreadPool,
    threads: usize,
    cache: TileCache,
}

impl std::fmt::Debug for TileScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileScheduler")
            .field("threads", &self.threads)
            .field("tiles", &self.cache.tiles)
            .finish()
    }
}

impl TileScheduler {
    /// Builds a pool of exactly `threads` workers (at least one).
    pub fn new(threads: usize) -> Result<Self, EngineError> {
        let threads = threads.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("diffusion-worker-{i}"))
            .build()?;

        Ok(TileScheduler {
            pool,
            threads,
            cache: TileCache::default(),
        })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Tiles for a grid of `nx` rows, recomputed only when `nx` changes.
    pub fn tiles(&mut self, nx: usize) -> &[Tile] {
        self.refresh(nx);
        &self.cache.tiles
    }

    /// Layout from the last `tiles`/`dispatch` call; empty before either.
    pub fn cached_tiles(&self) -> &[Tile] {
        &self.cache.tiles
    }

    fn refresh(&mut self, nx: usize) {
        if self.cache.tiles.is_empty() || self.cache.nx != nx {
            self.cache = TileCache {
                nx,
                tiles: partition(nx, self.threads),
            };
        }
    }

    /// Runs `kernel` over every interior cell, reading `current` and writing
    /// `next`. Returns once every tile has finished. Border cells of `next`
    /// are not written.
    pub fn dispatch<T: Scalar>(
        &mut self,
        current: &Field<T>,
        next: &mut Field<T>,
        kernel: &StencilKernel<T>,
    ) {
        debug_assert_eq!(current.nx(), next.nx());
        debug_assert_eq!(current.ny(), next.ny());

        let ny = current.ny();
        self.refresh(current.nx());

        // Row 0 is border; tiles start at row 1 and are contiguous.
        let mut rest = &mut next.as_mut_slice()[ny..];
        let mut work = Vec::with_capacity(self.cache.tiles.len());
        for tile in self.cache.tiles.iter().filter(|t| !t.is_empty()) {
            let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(tile.len() * ny);
            work.push((*tile, chunk));
            rest = tail;
        }

        self.pool.scope(|s| {
            for (tile, chunk) in work {
                s.spawn(move |_| run_tile(kernel, current, tile, chunk));
            }
        });
    }
}

fn run_tile<T: Scalar>(kernel: &StencilKernel<T>, current: &Field<T>, tile: Tile, chunk: &mut [T]) {
    let ny = current.ny();
    for (i, out) in tile.rows().zip(chunk.chunks_exact_mut(ny)) {
        kernel.apply_row(current.row(i - 1), current.row(i), current.row(i + 1), out);
    }
}
