//! Three-space primitives: vectors, points, rotation matrices and rays.
//!
//! The camera works in ordinary Cartesian three-space; the fractal
//! functions lift these points into four components by adding the
//! scene's slice coordinate.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};
use std::str::FromStr;

use crate::error::RenderError;

/// Tolerance used when comparing values that have made a trip through
/// text or through a long chain of arithmetic.
pub const EPSILON: f64 = 1e-9;

/// Compare two floats within an absolute tolerance.  Exact comparison
/// is meaningless once a value has been printed and parsed back.
#[inline]
pub fn equal(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() <= epsilon
}

/// Given a string of comma separated numbers, return exactly `count`
/// of them or an error naming the original text.
pub(crate) fn parse_components(s: &str, count: usize) -> Result<Vec<f64>, RenderError> {
    let parts: Result<Vec<f64>, _> = s.split(',').map(|p| f64::from_str(p.trim())).collect();
    match parts {
        Ok(ref values) if values.len() == count => Ok(values.clone()),
        _ => Err(RenderError::ParseComponents(s.to_string())),
    }
}

/// A direction or displacement in three-space.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vector3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

/// A location in three-space.  Shares the vector representation; the
/// name documents intent at call sites.
pub type Point3 = Vector3;

impl Vector3 {
    /// Constructor.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Vector3 { x, y, z }
    }

    /// The origin / zero vector.
    pub const fn zero() -> Self {
        Vector3::new(0.0, 0.0, 0.0)
    }

    /// Unit vector along X.
    pub const fn unit_x() -> Self {
        Vector3::new(1.0, 0.0, 0.0)
    }

    /// Unit vector along Y.
    pub const fn unit_y() -> Self {
        Vector3::new(0.0, 1.0, 0.0)
    }

    /// Unit vector along Z.
    pub const fn unit_z() -> Self {
        Vector3::new(0.0, 0.0, 1.0)
    }

    /// Inner product.
    #[inline]
    pub fn dot(self, other: Vector3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Right-handed cross product.
    pub fn cross(self, other: Vector3) -> Vector3 {
        Vector3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Euclidean length, computed without squaring large components.
    #[inline]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y).hypot(self.z)
    }

    /// The unit vector pointing the same way, or `None` when the vector
    /// is too short to have a meaningful direction.
    pub fn normalize(self) -> Option<Vector3> {
        let len = self.length();
        if len.is_finite() && len > EPSILON {
            Some(self * (1.0 / len))
        } else {
            None
        }
    }

    /// Componentwise tolerance comparison.
    pub fn approx_eq(self, other: Vector3, epsilon: f64) -> bool {
        equal(self.x, other.x, epsilon)
            && equal(self.y, other.y, epsilon)
            && equal(self.z, other.z, epsilon)
    }
}

impl Add for Vector3 {
    type Output = Vector3;
    #[inline]
    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vector3 {
    fn add_assign(&mut self, rhs: Vector3) {
        *self = *self + rhs;
    }
}

impl Sub for Vector3 {
    type Output = Vector3;
    #[inline]
    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Vector3;
    #[inline]
    fn mul(self, k: f64) -> Vector3 {
        Vector3::new(self.x * k, self.y * k, self.z * k)
    }
}

impl Neg for Vector3 {
    type Output = Vector3;
    fn neg(self) -> Vector3 {
        Vector3::new(-self.x, -self.y, -self.z)
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

impl FromStr for Vector3 {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = parse_components(s, 3)?;
        Ok(Vector3::new(v[0], v[1], v[2]))
    }
}

/// A row-major 3×3 matrix.  Only used for orientations, so every
/// matrix the crate builds is orthonormal.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Matrix3 {
    /// Rows, top to bottom.
    pub rows: [[f64; 3]; 3],
}

impl Matrix3 {
    /// The identity orientation.
    pub fn identity() -> Self {
        Matrix3 {
            rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Build a matrix from three row vectors.
    pub fn from_rows(a: Vector3, b: Vector3, c: Vector3) -> Self {
        Matrix3 {
            rows: [[a.x, a.y, a.z], [b.x, b.y, b.z], [c.x, c.y, c.z]],
        }
    }

    /// Row `i` as a vector.
    pub fn row(&self, i: usize) -> Vector3 {
        let r = self.rows[i];
        Vector3::new(r[0], r[1], r[2])
    }

    /// Swap rows and columns.  For orientations this is the inverse.
    pub fn transpose(&self) -> Matrix3 {
        let m = &self.rows;
        Matrix3 {
            rows: [
                [m[0][0], m[1][0], m[2][0]],
                [m[0][1], m[1][1], m[2][1]],
                [m[0][2], m[1][2], m[2][2]],
            ],
        }
    }

    /// Rotation of `angle` radians about `axis` (Rodrigues' formula).
    /// A degenerate axis yields the identity.
    pub fn rotation(axis: Vector3, angle: f64) -> Matrix3 {
        let u = match axis.normalize() {
            Some(u) => u,
            None => return Matrix3::identity(),
        };
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        Matrix3 {
            rows: [
                [
                    t * u.x * u.x + c,
                    t * u.x * u.y - s * u.z,
                    t * u.x * u.z + s * u.y,
                ],
                [
                    t * u.x * u.y + s * u.z,
                    t * u.y * u.y + c,
                    t * u.y * u.z - s * u.x,
                ],
                [
                    t * u.x * u.z - s * u.y,
                    t * u.y * u.z + s * u.x,
                    t * u.z * u.z + c,
                ],
            ],
        }
    }
}

impl Mul<Vector3> for Matrix3 {
    type Output = Vector3;
    fn mul(self, v: Vector3) -> Vector3 {
        Vector3::new(self.row(0).dot(v), self.row(1).dot(v), self.row(2).dot(v))
    }
}

impl Mul for Matrix3 {
    type Output = Matrix3;
    fn mul(self, rhs: Matrix3) -> Matrix3 {
        let mut rows = [[0.0; 3]; 3];
        for (i, row) in rows.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.rows[i][k] * rhs.rows[k][j]).sum();
            }
        }
        Matrix3 { rows }
    }
}

/// A half-line: everything at `origin + t * direction` for `t >= 0`.
/// The direction is always unit length when built by the camera.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    /// Where the ray starts.
    pub origin: Point3,
    /// Unit direction of travel.
    pub direction: Vector3,
}

impl Ray {
    /// Constructor.
    pub fn new(origin: Point3, direction: Vector3) -> Self {
        Ray { origin, direction }
    }

    /// The point at distance `t` along the ray.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn cross_product_is_right_handed() {
        let k = Vector3::unit_x().cross(Vector3::unit_y());
        assert_eq!(k, Vector3::unit_z());
    }

    #[test]
    fn length_survives_huge_components() {
        let v = Vector3::new(3e200, 4e200, 0.0);
        assert!(equal(v.length() / 1e200, 5.0, EPSILON));
    }

    #[test]
    fn zero_vector_has_no_direction() {
        assert!(Vector3::zero().normalize().is_none());
        let n = Vector3::new(0.0, 3.0, 4.0).normalize().unwrap();
        assert!(n.approx_eq(Vector3::new(0.0, 0.6, 0.8), EPSILON));
    }

    #[test]
    fn quarter_turn_about_z_maps_x_to_y() {
        let m = Matrix3::rotation(Vector3::unit_z(), FRAC_PI_2);
        assert!((m * Vector3::unit_x()).approx_eq(Vector3::unit_y(), EPSILON));
    }

    #[test]
    fn rotation_transpose_is_its_inverse() {
        let m = Matrix3::rotation(Vector3::new(1.0, 2.0, -0.5), 0.7);
        let i = m * m.transpose();
        for r in 0..3 {
            assert!(i.row(r).approx_eq(Matrix3::identity().row(r), EPSILON));
        }
    }

    #[test]
    fn vectors_round_trip_through_text() {
        let v = Vector3::new(0.1, -2.5, 1e-3);
        let back: Vector3 = format!("{}", v).parse().unwrap();
        assert!(v.approx_eq(back, EPSILON));
        assert!("1,2".parse::<Vector3>().is_err());
        assert!("1,x,3".parse::<Vector3>().is_err());
    }

    #[test]
    fn rays_walk_along_their_direction() {
        let r = Ray::new(Vector3::new(1.0, 0.0, 0.0), Vector3::unit_z());
        assert_eq!(r.at(2.0), Vector3::new(1.0, 0.0, 2.0));
    }
}
