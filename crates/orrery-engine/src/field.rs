//! Closed-form field values: gravity and (for user blocks) magnetism.
//!
//! A [`GravityField`] is a plain value describing the field of a uniform
//! sphere: inside the radius the pull grows linearly with depth, outside it
//! falls off with the inverse square. Both `radius²` and `1/radius³` are
//! precomputed so [`GravityField::field_at`] never takes a square root it
//! does not need.
//!
//! Field snapshots shared between an emitting wave and its receivers are
//! `Arc<GravityField>`; the `Arc` strong count is the snapshot's reference
//! count.

use orrery_math::Vec3;
use serde::{Deserialize, Serialize};

/// The gravitational constant, N·m²/kg².
pub const G: f64 = 6.674e-11;

// ---------------------------------------------------------------------------
// GravityField
// ---------------------------------------------------------------------------

/// The gravity field of a uniform-density sphere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GravityField {
    pos: Vec3,
    mass: f64,
    radius: f64,
    r_sq: f64,
    inv_r_cubed: f64,
}

impl Default for GravityField {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 0.0, 0.0)
    }
}

impl GravityField {
    /// Construct a field centered at `pos` with the given mass and radius.
    pub fn new(pos: Vec3, mass: f64, radius: f64) -> Self {
        Self {
            pos,
            mass,
            radius,
            r_sq: radius * radius,
            inv_r_cubed: 1.0 / (radius * radius * radius),
        }
    }

    /// The field center.
    #[inline]
    pub fn pos(&self) -> Vec3 {
        self.pos
    }

    /// Move the field center.
    pub fn set_pos(&mut self, pos: Vec3) {
        self.pos = pos;
    }

    /// The field's source mass, kg.
    #[inline]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Replace the source mass.
    pub fn set_mass(&mut self, mass: f64) {
        self.mass = mass;
    }

    /// The source radius, m.
    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Replace the source radius, refreshing the cached powers.
    pub fn set_radius(&mut self, radius: f64) {
        self.radius = radius;
        self.r_sq = radius * radius;
        self.inv_r_cubed = 1.0 / (radius * radius * radius);
    }

    /// The acceleration the field produces at `pos`.
    ///
    /// Zero at the exact center. Inside the radius the uniform-sphere
    /// interior formula applies; outside, the inverse square.
    pub fn field_at(&self, pos: Vec3) -> Vec3 {
        let acc = self.pos - pos;
        let l_sq = acc.sq_len();
        if l_sq == 0.0 {
            return Vec3::ZERO;
        }
        if l_sq < self.r_sq {
            acc * (G * self.mass * self.inv_r_cubed)
        } else {
            let l = l_sq.sqrt();
            // normalization 1/l and G·m/l² merged into one scale
            acc * (G * self.mass / (l_sq * l))
        }
    }
}

// ---------------------------------------------------------------------------
// MagnetField
// ---------------------------------------------------------------------------

/// A simulated magnetic field.
///
/// Not the physical field: since magnetism decays quickly, the cubic
/// distance is used for an easier calculation. Kept as an interface for user
/// blocks; the engine itself does not couple to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MagnetField {
    /// Field strength, m³/s².
    power: f64,
}

impl MagnetField {
    /// Construct with the given power.
    pub fn new(power: f64) -> Self {
        Self { power }
    }

    /// The field power.
    #[inline]
    pub fn power(&self) -> f64 {
        self.power
    }

    /// Replace the field power.
    pub fn set_power(&mut self, power: f64) {
        self.power = power;
    }

    /// The acceleration at the given displacement from the source; zero at
    /// the origin.
    pub fn field_at(&self, displacement: Vec3) -> Vec3 {
        let l = displacement.len();
        if l == 0.0 {
            return Vec3::ZERO;
        }
        displacement * (self.power / (l * l * l))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_is_zero_at_center() {
        let f = GravityField::new(Vec3::new(1.0, 2.0, 3.0), 5e10, 10.0);
        assert_eq!(f.field_at(Vec3::new(1.0, 2.0, 3.0)), Vec3::ZERO);
    }

    #[test]
    fn exterior_is_inverse_square_toward_center() {
        let mass = 5.972e24;
        let f = GravityField::new(Vec3::ZERO, mass, 6.371e6);
        let d = 7.0e6;
        let acc = f.field_at(Vec3::new(d, 0.0, 0.0));
        let expected = -G * mass / (d * d);
        assert!((acc.x - expected).abs() / expected.abs() < 1e-12);
        assert_eq!(acc.y, 0.0);
        assert_eq!(acc.z, 0.0);
    }

    #[test]
    fn interior_grows_linearly_with_depth() {
        let f = GravityField::new(Vec3::ZERO, 1e24, 1000.0);
        let shallow = f.field_at(Vec3::new(100.0, 0.0, 0.0));
        let deep = f.field_at(Vec3::new(200.0, 0.0, 0.0));
        // Uniform sphere: |g| grows linearly with distance from the center.
        assert!((deep.x / shallow.x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn branches_meet_at_surface() {
        let f = GravityField::new(Vec3::ZERO, 1e24, 1000.0);
        let just_in = f.field_at(Vec3::new(1000.0 - 1e-6, 0.0, 0.0));
        let just_out = f.field_at(Vec3::new(1000.0 + 1e-6, 0.0, 0.0));
        assert!((just_in.x - just_out.x).abs() / just_out.x.abs() < 1e-6);
    }

    #[test]
    fn set_radius_refreshes_cached_powers() {
        let mut f = GravityField::new(Vec3::ZERO, 1e24, 1000.0);
        let before = f.field_at(Vec3::new(500.0, 0.0, 0.0));
        f.set_radius(2000.0);
        let after = f.field_at(Vec3::new(500.0, 0.0, 0.0));
        // Larger radius, same depth point: weaker interior pull.
        assert!(after.x.abs() < before.x.abs());
    }

    #[test]
    fn magnet_field_cubic_falloff() {
        let m = MagnetField::new(8.0);
        assert_eq!(m.field_at(Vec3::ZERO), Vec3::ZERO);
        let near = m.field_at(Vec3::new(1.0, 0.0, 0.0));
        let far = m.field_at(Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(near.x, 8.0);
        assert_eq!(far.x, 2.0 * 8.0 / 8.0); // power·d/|d|³ at d=2
    }
}
