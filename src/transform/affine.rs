//! [`Pose`] and [`Lerp`] for `kurbo::Affine`.

use crate::foundation::core::Affine;
use crate::transform::{Lerp, Pose};

impl Pose for Affine {
    #[inline]
    fn identity() -> Self {
        Affine::IDENTITY
    }

    #[inline]
    fn then(&self, next: &Self) -> Self {
        // kurbo multiplies right-to-left: (n * s) * p == n * (s * p).
        *next * *self
    }

    #[inline]
    fn inverse(&self) -> Self {
        Affine::inverse(*self)
    }
}

/// Coefficient-wise blend. Exact for translations; rotations shrink slightly mid-blend, use
/// [`crate::Pose2D`] when that matters.
impl Lerp for Affine {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        let ca = a.as_coeffs();
        let cb = b.as_coeffs();
        let mut out = [0.0; 6];
        for (o, (x, y)) in out.iter_mut().zip(ca.iter().zip(cb.iter())) {
            *o = <f64 as Lerp>::lerp(x, y, t);
        }
        Affine::new(out)
    }
}

/// Largest absolute coefficient difference between two affines.
pub fn max_coeff_delta(a: Affine, b: Affine) -> f64 {
    a.as_coeffs()
        .iter()
        .zip(b.as_coeffs().iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

#[cfg(test)]
#[path = "../../tests/unit/transform/affine.rs"]
mod tests;
