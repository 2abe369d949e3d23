//! Geometry primitives consumed by transform chains.
//!
//! Chains only need three operations from a transform value: an identity, sequential
//! composition and inversion. Interpolation between two buffered samples is a separate
//! capability ([`Lerp`]) so that stores which never interpolate can hold any [`Pose`].

pub mod affine;
pub mod linear;
pub mod rigid;

/// Opaque transform value a chain can compose and invert.
///
/// A value attached to an edge `from -> to` maps points expressed in `from` into `to`.
pub trait Pose: Clone + std::fmt::Debug {
    /// Transform that leaves every point unchanged.
    fn identity() -> Self;

    /// Transform that applies `self` first and `next` afterwards.
    fn then(&self, next: &Self) -> Self;

    /// Transform that undoes `self`.
    fn inverse(&self) -> Self;
}

/// Blend between two values with parameter `t` in `[0, 1]`.
pub trait Lerp: Sized {
    /// `t == 0` yields `a`, `t == 1` yields `b`.
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}
