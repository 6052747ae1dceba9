//! Field storage and the current/next double buffer.

use crate::error::EngineError;
use crate::scalar::Scalar;

/// Smallest extent along either axis that still leaves an interior.
pub const MIN_EXTENT: usize = 3;

fn check_dims(nx: usize, ny: usize) -> Result<(), EngineError> {
    if nx < MIN_EXTENT || ny < MIN_EXTENT {
        return Err(EngineError::InvalidDimension { nx, ny });
    }
    Ok(())
}

/// A row-major `nx × ny` grid. Cell `(i, j)` lives at `i * ny + j`.
#[derive(Clone, Debug, PartialEq)]
pub struct Field<T> {
    nx: usize,
    ny: usize,
    data: Vec<T>,
}

impl<T: Scalar> Field<T> {
    pub fn allocate(nx: usize, ny: usize) -> Result<Self, EngineError> {
        check_dims(nx, ny)?;
        Ok(Field {
            nx,
            ny,
            data: vec![T::zero(); nx * ny],
        })
    }

    pub fn from_values(nx: usize, ny: usize, data: Vec<T>) -> Result<Self, EngineError> {
        check_dims(nx, ny)?;
        if data.len() != nx * ny {
            return Err(EngineError::ShapeMismatch {
                expected: nx * ny,
                actual: data.len(),
            });
        }
        Ok(Field { nx, ny, data })
    }

    // ---- Shape ----

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_border(&self, i: usize, j: usize) -> bool {
        i == 0 || j == 0 || i == self.nx - 1 || j == self.ny - 1
    }

    // ---- Access ----

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> T {
        self.data[i * self.ny + j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: T) {
        let idx = i * self.ny + j;
        self.data[idx] = value;
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[T] {
        &self.data[i * self.ny..(i + 1) * self.ny]
    }

    pub(crate) fn row_mut(&mut self, i: usize) -> &mut [T] {
        &mut self.data[i * self.ny..(i + 1) * self.ny]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    // ---- Diagnostics ----

    /// Total of all cells, accumulated in `f64`.
    pub fn sum(&self) -> f64 {
        self.data.iter().map(|v| v.as_f64()).sum()
    }

    pub fn max(&self) -> T {
        self.data
            .iter()
            .copied()
            .fold(self.data[0], |m, v| if v > m { v } else { m })
    }

    pub fn min(&self) -> T {
        self.data
            .iter()
            .copied()
            .fold(self.data[0], |m, v| if v < m { v } else { m })
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

/// The `(current, next)` pair. Only `current` is authoritative between steps.
#[derive(Debug)]
pub struct DoubleBuffer<T> {
    current: Field<T>,
    next: Field<T>,
}

impl<T: Scalar> DoubleBuffer<T> {
    pub fn allocate(nx: usize, ny: usize) -> Result<Self, EngineError> {
        Ok(DoubleBuffer {
            current: Field::allocate(nx, ny)?,
            next: Field::allocate(nx, ny)?,
        })
    }

    pub fn current(&self) -> &Field<T> {
        &self.current
    }

    /// Read-only `current` alongside writable `next` for one step.
    pub fn split(&mut self) -> (&Field<T>, &mut Field<T>) {
        (&self.current, &mut self.next)
    }

    /// Copies `field` into both buffers.
    pub fn fill(&mut self, field: &Field<T>) -> Result<(), EngineError> {
        if field.nx != self.current.nx || field.ny != self.current.ny {
            return Err(EngineError::ShapeMismatch {
                expected: self.current.len(),
                actual: field.len(),
            });
        }
        self.current.data.copy_from_slice(&field.data);
        self.next.data.copy_from_slice(&field.data);
        Ok(())
    }

    /// Exchanges roles of the two buffers without touching their contents.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }

    pub fn into_current(self) -> Field<T> {
        self.current
    }
}
