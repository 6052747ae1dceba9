//! The explicit 5-point diffusion update.
//!
//! ```text
//! next[i,j] = c + alpha * ((up + down) + (left + right) - 4c)
//! ```
//!
//! Neighbours are summed pairwise so a constant field maps to itself exactly.

use crate::grid::Field;
use crate::scalar::Scalar;

#[inline(always)]
fn relax<T: Scalar>(c: T, up: T, down: T, left: T, right: T, alpha: T) -> T {
    let two_c = c + c;
    let lap = (up + down) + (left + right) - (two_c + two_c);
    c + alpha * lap
}

#[derive(Clone, Copy, Debug)]
pub struct StencilKernel<T> {
    alpha: T,
}

impl<T: Scalar> StencilKernel<T> {
    pub fn new(alpha: T) -> Self {
        StencilKernel { alpha }
    }

    pub fn alpha(&self) -> T {
        self.alpha
    }

    /// Next value of interior cell `(i, j)`; reads `current` only.
    #[inline]
    pub fn update(&self, current: &Field<T>, i: usize, j: usize) -> T {
        debug_assert!(i >= 1 && i + 1 < current.nx());
        debug_assert!(j >= 1 && j + 1 < current.ny());
        relax(
            current.get(i, j),
            current.get(i - 1, j),
            current.get(i + 1, j),
            current.get(i, j - 1),
            current.get(i, j + 1),
            self.alpha,
        )
    }

    /// Updates the interior columns of one row. `out[0]` and `out[ny - 1]`
    /// are left alone.
    #[inline]
    pub fn apply_row(&self, up: &[T], mid: &[T], down: &[T], out: &mut [T]) {
        let ny = mid.len();
        debug_assert!(up.len() == ny && down.len() == ny && out.len() == ny);
        let (up, down, out) = (&up[..ny], &down[..ny], &mut out[..ny]);

        for j in 1..ny - 1 {
            out[j] = relax(mid[j], up[j], down[j], mid[j - 1], mid[j + 1], self.alpha);
        }
    }
}
