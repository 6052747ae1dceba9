use std::fmt::Debug;

use num_traits::{Float, FromPrimitive, ToPrimitive};

/// Floating-point cell type the engine can run on (`f32` by default, or `f64`).
pub trait Scalar: Float + FromPrimitive + ToPrimitive + Debug + Send + Sync + 'static {
    /// Widens to `f64` for diagnostics; lossless for `f32` and `f64`.
    #[inline]
    fn as_f64(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }
}

impl<T> Scalar for T where T: Float + FromPrimitive + ToPrimitive + Debug + Send + Sync + 'static
{}
