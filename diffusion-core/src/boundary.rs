//! Border handling applied to `next` after each interior pass.
//!
//! Border cells (row `0`, row `nx - 1`, column `0`, column `ny - 1`) are
//! never written by the stencil; the policy owns them.

use crate::grid::Field;
use crate::scalar::Scalar;

/// Which border rule an engine runs with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoundaryKind {
    /// Borders pinned to the initial field's border values.
    #[default]
    Fixed,
    /// Borders carried over from `current` each step.
    Clamped,
}

impl BoundaryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryKind::Fixed => "fixed",
            BoundaryKind::Clamped => "clamped",
        }
    }
}

/// Border values of a field, stored edge by edge.
///
/// The left and right columns exclude the corners, which belong to the top
/// and bottom rows.
#[derive(Clone, Debug, PartialEq)]
pub struct BorderSnapshot<T> {
    top: Vec<T>,
    bottom: Vec<T>,
    left: Vec<T>,
    right: Vec<T>,
}

impl<T: Scalar> BorderSnapshot<T> {
    pub fn capture(field: &Field<T>) -> Self {
        let (nx, ny) = (field.nx(), field.ny());
        BorderSnapshot {
            top: field.row(0).to_vec(),
            bottom: field.row(nx - 1).to_vec(),
            left: (1..nx - 1).map(|i| field.get(i, 0)).collect(),
            right: (1..nx - 1).map(|i| field.get(i, ny - 1)).collect(),
        }
    }

    fn write_into(&self, next: &mut Field<T>) {
        let (nx, ny) = (next.nx(), next.ny());
        next.row_mut(0).copy_from_slice(&self.top);
        next.row_mut(nx - 1).copy_from_slice(&self.bottom);
        for i in 1..nx - 1 {
            let row = next.row_mut(i);
            row[0] = self.left[i - 1];
            row[ny - 1] = self.right[i - 1];
        }
    }
}

#[derive(Clone, Debug)]
pub enum BoundaryPolicy<T> {
    Fixed(BorderSnapshot<T>),
    Clamped,
}

impl<T: Scalar> BoundaryPolicy<T> {
    /// Builds the policy for `kind`, snapshotting `initial` when fixed.
    pub fn new(kind: BoundaryKind, initial: &Field<T>) -> Self {
        match kind {
            BoundaryKind::Fixed => BoundaryPolicy::Fixed(BorderSnapshot::capture(initial)),
            BoundaryKind::Clamped => BoundaryPolicy::Clamped,
        }
    }

    pub fn kind(&self) -> BoundaryKind {
        match self {
            BoundaryPolicy::Fixed(_) => BoundaryKind::Fixed,
            BoundaryPolicy::Clamped => BoundaryKind::Clamped,
        }
    }

    /// Writes the border of `next`. Reads `current` only for `Clamped`.
    pub fn apply(&self, current: &Field<T>, next: &mut Field<T>) {
        debug_assert_eq!(current.nx(), next.nx());
        debug_assert_eq!(current.ny(), next.ny());

        match self {
            BoundaryPolicy::Fixed(snapshot) => snapshot.write_into(next),
            BoundaryPolicy::Clamped => {
                let (nx, ny) = (next.nx(), next.ny());
                next.row_mut(0).copy_from_slice(current.row(0));
                next.row_mut(nx - 1).copy_from_slice(current.row(nx - 1));
                for i in 1..nx - 1 {
                    let src = current.row(i);
                    let dst = next.row_mut(i);
                    dst[0] = src[0];
                    dst[ny - 1] = src[ny - 1];
                }
            }
        }
    }
}
