//! Commutative hypercomplex numbers.
//!
//! A hypercomplex number is `a + bi + cj + dk` where `i² = j² = -1`,
//! `k² = 1` and `ij = ji = k`.  Unlike the quaternions the product
//! commutes, but the algebra has zero divisors, so not every non-zero
//! value has an inverse.
//!
//! The algebra is isomorphic to a pair of ordinary complex numbers:
//! `(a - d) + (b + c)i` and `(a + d) + (b - c)i`.  Multiplication is
//! performed directly on the four components, but division goes
//! through the complex pair, where it is well understood when (and
//! only when) both halves are non-zero.

use num::traits::{One, Zero};
use num::Complex;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

use crate::error::RenderError;
use crate::geometry::{equal, parse_components};

/// A four-component commutative hypercomplex value.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct HyperComplex {
    /// Real part.
    pub a: f64,
    /// `i` part.
    pub b: f64,
    /// `j` part.
    pub c: f64,
    /// `k` part.
    pub d: f64,
}

impl HyperComplex {
    /// Constructor.
    pub const fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        HyperComplex { a, b, c, d }
    }

    /// The two complex numbers this value decomposes into.
    pub fn to_complex_pair(self) -> (Complex<f64>, Complex<f64>) {
        (
            Complex::new(self.a - self.d, self.b + self.c),
            Complex::new(self.a + self.d, self.b - self.c),
        )
    }

    /// Reassemble a value from its complex pair.
    pub fn from_complex_pair(p: Complex<f64>, q: Complex<f64>) -> Self {
        HyperComplex::new(
            (p.re + q.re) * 0.5,
            (p.im + q.im) * 0.5,
            (p.im - q.im) * 0.5,
            (q.re - p.re) * 0.5,
        )
    }

    /// Sum of the squared components; the escape test compares this
    /// against the squared bailout radius.
    #[inline]
    pub fn norm_sqr(self) -> f64 {
        self.a * self.a + self.b * self.b + self.c * self.c + self.d * self.d
    }

    /// Euclidean magnitude of the four components.
    pub fn magnitude(self) -> f64 {
        self.a.hypot(self.b).hypot(self.c.hypot(self.d))
    }

    /// The algebraic norm: the product of the squared moduli of the
    /// complex pair.  Zero exactly when the value has no inverse.
    pub fn algebraic_norm(self) -> f64 {
        let (p, q) = self.to_complex_pair();
        p.norm_sqr() * q.norm_sqr()
    }

    /// Multiply every component by `k`.
    #[inline]
    pub fn scale(self, k: f64) -> Self {
        HyperComplex::new(self.a * k, self.b * k, self.c * k, self.d * k)
    }

    /// The multiplicative inverse, or `DivisionByZero` on a zero divisor.
    pub fn inverse(self) -> Result<Self, RenderError> {
        HyperComplex::one().try_div(self)
    }

    /// Divide by `rhs`, failing instead of producing NaN when `rhs`
    /// is a zero divisor.
    pub fn try_div(self, rhs: HyperComplex) -> Result<Self, RenderError> {
        let (p, q) = self.to_complex_pair();
        let (r, s) = rhs.to_complex_pair();
        let quotient = HyperComplex::from_complex_pair(complex_div(p, r)?, complex_div(q, s)?);
        if !quotient.components_finite() {
            return Err(RenderError::DivisionByZero);
        }
        Ok(quotient)
    }

    fn components_finite(self) -> bool {
        self.a.is_finite() && self.b.is_finite() && self.c.is_finite() && self.d.is_finite()
    }

    /// Componentwise tolerance comparison.
    pub fn approx_eq(self, other: HyperComplex, epsilon: f64) -> bool {
        equal(self.a, other.a, epsilon)
            && equal(self.b, other.b, epsilon)
            && equal(self.c, other.c, epsilon)
            && equal(self.d, other.d, epsilon)
    }
}

fn complex_div(p: Complex<f64>, r: Complex<f64>) -> Result<Complex<f64>, RenderError> {
    if r.norm_sqr().is_normal() {
        return Ok(p / r);
    }
    // The squared norm under- or overflowed; divide by the norm twice.
    let m = r.norm();
    if m == 0.0 || !m.is_finite() {
        return Err(RenderError::DivisionByZero);
    }
    Ok((p * r.conj()).unscale(m).unscale(m))
}

impl Add for HyperComplex {
    type Output = HyperComplex;
    #[inline]
    fn add(self, rhs: HyperComplex) -> HyperComplex {
        HyperComplex::new(self.a + rhs.a, self.b + rhs.b, self.c + rhs.c, self.d + rhs.d)
    }
}

impl Sub for HyperComplex {
    type Output = HyperComplex;
    #[inline]
    fn sub(self, rhs: HyperComplex) -> HyperComplex {
        HyperComplex::new(self.a - rhs.a, self.b - rhs.b, self.c - rhs.c, self.d - rhs.d)
    }
}

impl Neg for HyperComplex {
    type Output = HyperComplex;
    fn neg(self) -> HyperComplex {
        self.scale(-1.0)
    }
}

impl Mul for HyperComplex {
    type Output = HyperComplex;
    #[inline]
    fn mul(self, rhs: HyperComplex) -> HyperComplex {
        let (x1, y1, z1, w1) = (self.a, self.b, self.c, self.d);
        let (x2, y2, z2, w2) = (rhs.a, rhs.b, rhs.c, rhs.d);
        HyperComplex::new(
            x1 * x2 - y1 * y2 - z1 * z2 + w1 * w2,
            x1 * y2 + y1 * x2 - z1 * w2 - w1 * z2,
            x1 * z2 - y1 * w2 + z1 * x2 - w1 * y2,
            x1 * w2 + y1 * z2 + z1 * y2 + w1 * x2,
        )
    }
}

impl Zero for HyperComplex {
    fn zero() -> Self {
        HyperComplex::new(0.0, 0.0, 0.0, 0.0)
    }

    fn is_zero(&self) -> bool {
        self.a == 0.0 && self.b == 0.0 && self.c == 0.0 && self.d == 0.0
    }
}

impl One for HyperComplex {
    fn one() -> Self {
        HyperComplex::new(1.0, 0.0, 0.0, 0.0)
    }
}

impl fmt::Display for HyperComplex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{},{},{},{}", self.a, self.b, self.c, self.d)
    }
}

impl FromStr for HyperComplex {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = parse_components(s, 4)?;
        Ok(HyperComplex::new(v[0], v[1], v[2], v[3]))
    }
}
