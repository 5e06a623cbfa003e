//! 3- and 4-component vectors.
//!
//! [`Vec3`] carries positions, velocities, forces, and Euler angles
//! throughout the engine. Rotations about the principal axes use
//! [`f64::sin_cos`]; the composite [`Vec3::rotated_xyz`] applies X, then Y,
//! then Z — this ordering is part of the contract, because heading
//! composition across anchored reference frames depends on it.
//!
//! [`Vec4`] exists for spacetime quantities; only arithmetic and length are
//! provided.

use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Vec3
// ---------------------------------------------------------------------------

/// A 3-component `f64` vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// The zero vector.
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    /// All components one.
    pub const ONE: Vec3 = Vec3::new(1.0, 1.0, 1.0);
    /// Unit vector along +X.
    pub const UNIT_X: Vec3 = Vec3::new(1.0, 0.0, 0.0);
    /// Unit vector along +Y.
    pub const UNIT_Y: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    /// Unit vector along +Z.
    pub const UNIT_Z: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    /// Construct from components.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Whether every component is exactly zero.
    #[inline]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    /// Euclidean length.
    #[inline]
    pub fn len(self) -> f64 {
        self.sq_len().sqrt()
    }

    /// Squared Euclidean length. Prefer this in comparisons; the engine's
    /// hot paths never take a square root they can avoid.
    #[inline]
    pub fn sq_len(self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Dot product.
    #[inline]
    pub fn dot(self, u: Vec3) -> f64 {
        self.x * u.x + self.y * u.y + self.z * u.z
    }

    /// Componentwise absolute value.
    #[inline]
    pub fn abs(self) -> Vec3 {
        Vec3::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    /// Apply `f` to every component.
    #[inline]
    pub fn map(self, f: impl Fn(f64) -> f64) -> Vec3 {
        Vec3::new(f(self.x), f(self.y), f(self.z))
    }

    /// X · Y · Z.
    #[inline]
    pub fn volume(self) -> f64 {
        self.x * self.y * self.z
    }

    /// A vector of length 1 in the same direction. The zero vector
    /// normalizes to `UNIT_X`.
    pub fn normalized(self) -> Vec3 {
        if self.is_zero() {
            Vec3::UNIT_X
        } else {
            self * (1.0 / self.len())
        }
    }

    /// Componentwise remainder with divisor `n`; each result keeps the sign
    /// of its dividend. Used to canonicalize Euler angles after integration.
    #[inline]
    pub fn modulo(self, n: f64) -> Vec3 {
        Vec3::new(self.x % n, self.y % n, self.z % n)
    }

    /// The angle between the vector and the y-axis, about the z-axis.
    #[inline]
    pub fn angle_x(self) -> f64 {
        self.z.atan2(self.y)
    }

    /// The angle between the vector and the z-axis, about the x-axis.
    #[inline]
    pub fn angle_y(self) -> f64 {
        self.x.atan2(self.z)
    }

    /// The angle between the vector and the x-axis, about the y-axis.
    #[inline]
    pub fn angle_z(self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Rotation about the x-axis.
    pub fn rotated_x(self, angle: f64) -> Vec3 {
        let (s, c) = angle.sin_cos();
        Vec3::new(self.x, self.y * c - self.z * s, self.y * s + self.z * c)
    }

    /// Rotation about the y-axis.
    pub fn rotated_y(self, angle: f64) -> Vec3 {
        let (s, c) = angle.sin_cos();
        Vec3::new(self.x * c + self.z * s, self.y, -self.x * s + self.z * c)
    }

    /// Rotation about the z-axis.
    pub fn rotated_z(self, angle: f64) -> Vec3 {
        let (s, c) = angle.sin_cos();
        Vec3::new(self.x * c - self.y * s, self.x * s + self.y * c, self.z)
    }

    /// Composite rotation: X by `angles.x`, then Y by `angles.y`, then Z by
    /// `angles.z`, in exactly that order.
    pub fn rotated_xyz(self, angles: Vec3) -> Vec3 {
        self.rotated_x(angles.x)
            .rotated_y(angles.y)
            .rotated_z(angles.z)
    }

    /// Componentwise product.
    #[inline]
    pub fn scaled(self, u: Vec3) -> Vec3 {
        Vec3::new(self.x * u.x, self.y * u.y, self.z * u.z)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vec3({}, {}, {})", self.x, self.y, self.z)
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, u: Vec3) -> Vec3 {
        Vec3::new(self.x + u.x, self.y + u.y, self.z + u.z)
    }
}

impl AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, u: Vec3) {
        *self = *self + u;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, u: Vec3) -> Vec3 {
        Vec3::new(self.x - u.x, self.y - u.y, self.z - u.z)
    }
}

impl SubAssign for Vec3 {
    #[inline]
    fn sub_assign(&mut self, u: Vec3) {
        *self = *self - u;
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, n: f64) -> Vec3 {
        Vec3::new(self.x * n, self.y * n, self.z * n)
    }
}

impl MulAssign<f64> for Vec3 {
    #[inline]
    fn mul_assign(&mut self, n: f64) {
        *self = *self * n;
    }
}

impl Div<f64> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn div(self, n: f64) -> Vec3 {
        Vec3::new(self.x / n, self.y / n, self.z / n)
    }
}

impl DivAssign<f64> for Vec3 {
    #[inline]
    fn div_assign(&mut self, n: f64) {
        *self = *self / n;
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    #[inline]
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

// ---------------------------------------------------------------------------
// Vec4
// ---------------------------------------------------------------------------

/// A 4-component `f64` vector for spacetime quantities, `(t, x, y, z)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec4 {
    /// Time component.
    pub t: f64,
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec4 {
    /// The zero vector.
    pub const ZERO: Vec4 = Vec4::new(0.0, 0.0, 0.0, 0.0);

    /// Construct from components.
    #[inline]
    pub const fn new(t: f64, x: f64, y: f64, z: f64) -> Self {
        Self { t, x, y, z }
    }

    /// The spatial part.
    #[inline]
    pub fn spatial(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Euclidean length over all four components.
    #[inline]
    pub fn len(self) -> f64 {
        self.sq_len().sqrt()
    }

    /// Squared Euclidean length over all four components.
    #[inline]
    pub fn sq_len(self) -> f64 {
        self.t * self.t + self.x * self.x + self.y * self.y + self.z * self.z
    }
}

impl fmt::Display for Vec4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vec4({}, {}, {}, {})", self.t, self.x, self.y, self.z)
    }
}

impl Add for Vec4 {
    type Output = Vec4;
    #[inline]
    fn add(self, u: Vec4) -> Vec4 {
        Vec4::new(self.t + u.t, self.x + u.x, self.y + u.y, self.z + u.z)
    }
}

impl AddAssign for Vec4 {
    #[inline]
    fn add_assign(&mut self, u: Vec4) {
        *self = *self + u;
    }
}

impl Sub for Vec4 {
    type Output = Vec4;
    #[inline]
    fn sub(self, u: Vec4) -> Vec4 {
        Vec4::new(self.t - u.t, self.x - u.x, self.y - u.y, self.z - u.z)
    }
}

impl SubAssign for Vec4 {
    #[inline]
    fn sub_assign(&mut self, u: Vec4) {
        *self = *self - u;
    }
}

impl Mul<f64> for Vec4 {
    type Output = Vec4;
    #[inline]
    fn mul(self, n: f64) -> Vec4 {
        Vec4::new(self.t * n, self.x * n, self.y * n, self.z * n)
    }
}

impl Neg for Vec4 {
    type Output = Vec4;
    #[inline]
    fn neg(self) -> Vec4 {
        Vec4::new(-self.t, -self.x, -self.y, -self.z)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).sq_len() < EPS
    }

    // -- arithmetic round-trips ---------------------------------------------

    #[test]
    fn negate_twice_is_identity() {
        let v = Vec3::new(1.5, -2.0, 3.25);
        assert_eq!(-(-v), v);
    }

    #[test]
    fn add_sub_round_trip() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        let u = Vec3::new(-0.5, 4.0, 0.25);
        assert_eq!((v - u) + u, v);
    }

    #[test]
    fn scale_and_dot() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(v.dot(Vec3::UNIT_Y), 2.0);
        assert_eq!(v.scaled(Vec3::new(0.0, 1.0, 2.0)), Vec3::new(0.0, 2.0, 6.0));
    }

    #[test]
    fn lengths() {
        let v = Vec3::new(3.0, 4.0, 0.0);
        assert_eq!(v.sq_len(), 25.0);
        assert_eq!(v.len(), 5.0);
    }

    #[test]
    fn normalized_zero_is_unit_x() {
        assert_eq!(Vec3::ZERO.normalized(), Vec3::UNIT_X);
        let v = Vec3::new(0.0, 3.0, 4.0).normalized();
        assert!((v.len() - 1.0).abs() < EPS);
    }

    #[test]
    fn modulo_keeps_dividend_sign() {
        let v = Vec3::new(5.0, -5.0, 2.0).modulo(3.0);
        assert!(approx(v, Vec3::new(2.0, -2.0, 2.0)));
    }

    // -- rotations ----------------------------------------------------------

    #[test]
    fn quarter_turns() {
        let q = std::f64::consts::FRAC_PI_2;
        assert!(approx(Vec3::UNIT_Y.rotated_x(q), Vec3::UNIT_Z));
        assert!(approx(Vec3::UNIT_Z.rotated_y(q), Vec3::UNIT_X));
        assert!(approx(Vec3::UNIT_X.rotated_z(q), Vec3::UNIT_Y));
    }

    #[test]
    fn rotation_preserves_length() {
        let v = Vec3::new(1.0, -2.0, 0.5);
        let r = v.rotated_xyz(Vec3::new(0.3, -1.2, 2.5));
        assert!((r.sq_len() - v.sq_len()).abs() < EPS);
    }

    #[test]
    fn rotated_xyz_is_ordered_composition() {
        let v = Vec3::new(0.7, -1.3, 2.1);
        let a = Vec3::new(0.4, 1.1, -0.9);
        let composed = v.rotated_x(a.x).rotated_y(a.y).rotated_z(a.z);
        assert!(approx(v.rotated_xyz(a), composed));
    }

    #[test]
    fn full_turn_is_identity() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        let tau = std::f64::consts::TAU;
        assert!(approx(v.rotated_xyz(Vec3::new(tau, tau, tau)), v));
    }

    // -- Vec4 ---------------------------------------------------------------

    #[test]
    fn vec4_arithmetic_and_length() {
        let a = Vec4::new(1.0, 2.0, 3.0, 4.0);
        let b = Vec4::new(0.5, 0.5, 0.5, 0.5);
        assert_eq!((a - b) + b, a);
        assert_eq!(Vec4::new(2.0, 0.0, 0.0, 0.0).len(), 2.0);
        assert_eq!(a.spatial(), Vec3::new(2.0, 3.0, 4.0));
    }
}
