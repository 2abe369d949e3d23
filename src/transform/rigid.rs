//! Planar rigid transform.

use crate::foundation::core::{Affine, Vec2};
use crate::transform::linear::{lerp_angle, lerp_vec2, rotate_vec2, wrap_angle};
use crate::transform::{Lerp, Pose};

/// Rotation about the origin followed by a translation.
///
/// Unlike an arbitrary [`Affine`], composition and inversion stay rigid and interpolation
/// follows the shorter rotation arc.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Pose2D {
    /// Translation applied after the rotation.
    pub translation: Vec2,
    /// Counter-clockwise rotation, radians.
    pub rotation_rad: f64,
}

impl Default for Pose2D {
    fn default() -> Self {
        Self {
            translation: Vec2::ZERO,
            rotation_rad: 0.0,
        }
    }
}

impl Pose2D {
    /// Build from translation and rotation.
    pub fn new(translation: Vec2, rotation_rad: f64) -> Self {
        Self {
            translation,
            rotation_rad: wrap_angle(rotation_rad),
        }
    }

    /// Pure translation.
    pub fn from_translation(translation: Vec2) -> Self {
        Self::new(translation, 0.0)
    }

    /// Pure rotation about the origin.
    pub fn from_rotation(rotation_rad: f64) -> Self {
        Self::new(Vec2::ZERO, rotation_rad)
    }

    /// Equivalent affine matrix.
    pub fn to_affine(self) -> Affine {
        Affine::translate(self.translation) * Affine::rotate(self.rotation_rad)
    }

    /// Apply to a point given as a vector from the origin.
    pub fn apply(self, p: Vec2) -> Vec2 {
        rotate_vec2(p, self.rotation_rad) + self.translation
    }

    /// Whether both components are within `eps` of `other`.
    pub fn approx_eq(self, other: Self, eps: f64) -> bool {
        (self.translation - other.translation).hypot() <= eps
            && wrap_angle(self.rotation_rad - other.rotation_rad).abs() <= eps
    }
}

impl Pose for Pose2D {
    fn identity() -> Self {
        Self::default()
    }

    fn then(&self, next: &Self) -> Self {
        Self::new(
            rotate_vec2(self.translation, next.rotation_rad) + next.translation,
            self.rotation_rad + next.rotation_rad,
        )
    }

    fn inverse(&self) -> Self {
        Self::new(
            -rotate_vec2(self.translation, -self.rotation_rad),
            -self.rotation_rad,
        )
    }
}

impl Lerp for Pose2D {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            translation: lerp_vec2(a.translation, b.translation, t),
            rotation_rad: lerp_angle(a.rotation_rad, b.rotation_rad, t),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transform/rigid.rs"]
mod tests;
