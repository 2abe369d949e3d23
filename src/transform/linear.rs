//! Linear interpolation helpers.

use crate::foundation::core::Vec2;

#[inline]
/// Linearly interpolate between two vectors with clamped parameter `t`.
pub fn lerp_vec2(a: Vec2, b: Vec2, t: f64) -> Vec2 {
    let t = t.clamp(0.0, 1.0);
    Vec2::new(a.x + ((b.x - a.x) * t), a.y + ((b.y - a.y) * t))
}

#[inline]
/// Wrap an angle into `(-pi, pi]`.
pub fn wrap_angle(rad: f64) -> f64 {
    let tau = std::f64::consts::TAU;
    let mut r = rad.rem_euclid(tau);
    if r > std::f64::consts::PI {
        r -= tau;
    }
    r
}

#[inline]
/// Interpolate along the shorter arc between two angles, clamped `t`.
pub fn lerp_angle(a: f64, b: f64, t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    wrap_angle(a + wrap_angle(b - a) * t)
}

#[inline]
/// Rotate `v` counter-clockwise by `rad`.
pub fn rotate_vec2(v: Vec2, rad: f64) -> Vec2 {
    let (s, c) = rad.sin_cos();
    Vec2::new(c * v.x - s * v.y, s * v.x + c * v.y)
}
