//! Hamilton quaternions: `w + xi + yj + zk` with `i² = j² = k² = ijk = -1`.
//!
//! Same four-double layout as `HyperComplex`, different algebra.  The
//! product does not commute, but every non-zero quaternion has an
//! inverse.

use num::traits::{One, Zero};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

use crate::error::RenderError;
use crate::geometry::{equal, parse_components};

/// A quaternion with `f64` components.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Quaternion {
    /// Scalar part.
    pub w: f64,
    /// `i` part.
    pub x: f64,
    /// `j` part.
    pub y: f64,
    /// `k` part.
    pub z: f64,
}

impl Quaternion {
    /// Constructor.
    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Quaternion { w, x, y, z }
    }

    /// Negate the vector part.
    pub fn conjugate(self) -> Self {
        Quaternion::new(self.w, -self.x, -self.y, -self.z)
    }

    /// `q * conjugate(q)`, a real number.
    #[inline]
    pub fn norm_sqr(self) -> f64 {
        self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// The norm, computed hypot-style so that large components do
    /// not overflow on the way.
    pub fn magnitude(self) -> f64 {
        self.w.hypot(self.x).hypot(self.y.hypot(self.z))
    }

    /// Multiply every component by `k`.
    #[inline]
    pub fn scale(self, k: f64) -> Self {
        Quaternion::new(self.w * k, self.x * k, self.y * k, self.z * k)
    }

    /// `conjugate / norm²`; only zero has no inverse.
    pub fn inverse(self) -> Result<Self, RenderError> {
        let n = self.norm_sqr();
        if n.is_normal() {
            return Ok(self.conjugate().scale(1.0 / n));
        }
        // The squared norm under- or overflowed; divide by the norm twice.
        let m = self.magnitude();
        if m == 0.0 {
            return Err(RenderError::DivisionByZero);
        }
        Ok(self.conjugate().scale(1.0 / m).scale(1.0 / m))
    }

    /// Right division: `self * rhs⁻¹`.
    pub fn try_div(self, rhs: Quaternion) -> Result<Self, RenderError> {
        Ok(self * rhs.inverse()?)
    }

    /// Componentwise tolerance comparison.
    pub fn approx_eq(self, other: Quaternion, epsilon: f64) -> bool {
        equal(self.w, other.w, epsilon)
            && equal(self.x, other.x, epsilon)
            && equal(self.y, other.y, epsilon)
            && equal(self.z, other.z, epsilon)
    }
}

impl Add for Quaternion {
    type Output = Quaternion;
    #[inline]
    fn add(self, rhs: Quaternion) -> Quaternion {
        Quaternion::new(self.w + rhs.w, self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Quaternion {
    type Output = Quaternion;
    #[inline]
    fn sub(self, rhs: Quaternion) -> Quaternion {
        Quaternion::new(self.w - rhs.w, self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Quaternion {
    type Output = Quaternion;
    fn neg(self) -> Quaternion {
        self.scale(-1.0)
    }
}

impl Mul for Quaternion {
    type Output = Quaternion;
    #[inline]
    fn mul(self, r: Quaternion) -> Quaternion {
        Quaternion::new(
            self.w * r.w - self.x * r.x - self.y * r.y - self.z * r.z,
            self.w * r.x + self.x * r.w + self.y * r.z - self.z * r.y,
            self.w * r.y - self.x * r.z + self.y * r.w + self.z * r.x,
            self.w * r.z + self.x * r.y - self.y * r.x + self.z * r.w,
        )
    }
}

impl Zero for Quaternion {
    fn zero() -> Self {
        Quaternion::new(0.0, 0.0, 0.0, 0.0)
    }

    fn is_zero(&self) -> bool {
        self.w == 0.0 && self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }
}

impl One for Quaternion {
    fn one() -> Self {
        Quaternion::new(1.0, 0.0, 0.0, 0.0)
    }
}

impl fmt::Display for Quaternion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{},{},{},{}", self.w, self.x, self.y, self.z)
    }
}

impl FromStr for Quaternion {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = parse_components(s, 4)?;
        Ok(Quaternion::new(v[0], v[1], v[2], v[3]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::EPSILON;

    fn samples() -> Vec<Quaternion> {
        vec![
            Quaternion::new(1.0, 0.0, 0.0, 0.0),
            Quaternion::new(0.5, -1.5, 2.0, 0.25),
            Quaternion::new(-3.0, 0.1, -0.2, 7.0),
            Quaternion::new(1e-3, 1e-3, -1e-3, 1e-3),
        ]
    }

    #[test]
    fn product_with_inverse_is_identity() {
        for q in samples() {
            let i = q.inverse().unwrap();
            assert!((q * i).approx_eq(Quaternion::one(), EPSILON));
            assert!((i * q).approx_eq(Quaternion::one(), EPSILON));
        }
    }

    #[test]
    fn inverse_of_tiny_quaternion_is_finite() {
        let q = Quaternion::new(1e-170, 0.0, 1e-170, 0.0);
        let i = q.inverse().unwrap();
        assert!(i.w.is_finite() && i.y.is_finite());
        assert!((q * i).approx_eq(Quaternion::one(), 1e-6));
    }

    #[test]
    fn zero_has_no_inverse() {
        assert_eq!(
            Quaternion::zero().inverse(),
            Err(RenderError::DivisionByZero)
        );
        assert_eq!(
            Quaternion::one().try_div(Quaternion::zero()),
            Err(RenderError::DivisionByZero)
        );
    }

    #[test]
    fn multiplication_does_not_commute() {
        let i = Quaternion::new(0.0, 1.0, 0.0, 0.0);
        let j = Quaternion::new(0.0, 0.0, 1.0, 0.0);
        let k = Quaternion::new(0.0, 0.0, 0.0, 1.0);
        assert_eq!(i * j, k);
        assert_eq!(j * i, -k);
        assert_eq!(i * j * k, -Quaternion::one());
    }

    #[test]
    fn norm_is_multiplicative() {
        let p = Quaternion::new(0.5, -1.5, 2.0, 0.25);
        let q = Quaternion::new(-3.0, 0.1, -0.2, 7.0);
        assert!(equal(
            (p * q).magnitude(),
            p.magnitude() * q.magnitude(),
            1e-9
        ));
    }

    #[test]
    fn division_undoes_multiplication() {
        let p = Quaternion::new(0.5, -1.5, 2.0, 0.25);
        let q = Quaternion::new(-3.0, 0.1, -0.2, 7.0);
        assert!((p * q).try_div(q).unwrap().approx_eq(p, 1e-9));
    }

    #[test]
    fn text_round_trip() {
        let q = Quaternion::new(-0.2, 0.8, 0.0, 1e-7);
        let back: Quaternion = q.to_string().parse().unwrap();
        assert!(back.approx_eq(q, EPSILON));
    }
}
