//! The fractal function family.
//!
//! A point in three-space is lifted into four components by appending
//! the scene's slice coordinate.  In Julia mode that value seeds the
//! orbit and the scene constant is added at every step; in Mandelbrot
//! mode the orbit starts at the formula's critical point and the
//! lifted point is the constant.  A point whose orbit never leaves the
//! bailout radius within `max_iterations` steps is inside the set, and
//! the renderer treats the boundary of that set as a solid surface.
//!
//! Every formula runs over either algebra.  The selection is resolved
//! once per point, outside the loop: `escape` matches on the algebra
//! and formula and hands a closure to `iterate`, which the compiler
//! specializes for each combination.

use num::traits::{One, Zero};
use std::ops::{Add, Mul, Sub};

use crate::error::RenderError;
use crate::geometry::{Point3, Ray, Vector3};
use crate::hypercomplex::HyperComplex;
use crate::quaternion::Quaternion;

/// The arithmetic a formula needs from a four-component number system.
pub trait Algebra:
    Copy + Zero + One + Add<Output = Self> + Sub<Output = Self> + Mul<Output = Self>
{
    /// Build a value from its four components, real part first.
    fn from_components(c: [f64; 4]) -> Self;
    /// The four components, real part first.
    fn components(self) -> [f64; 4];
    /// Sum of the squared components.
    fn norm_sqr(self) -> f64;
}

impl Algebra for HyperComplex {
    #[inline]
    fn from_components(c: [f64; 4]) -> Self {
        HyperComplex::new(c[0], c[1], c[2], c[3])
    }

    fn components(self) -> [f64; 4] {
        [self.a, self.b, self.c, self.d]
    }

    #[inline]
    fn norm_sqr(self) -> f64 {
        HyperComplex::norm_sqr(self)
    }
}

impl Algebra for Quaternion {
    #[inline]
    fn from_components(c: [f64; 4]) -> Self {
        Quaternion::new(c[0], c[1], c[2], c[3])
    }

    fn components(self) -> [f64; 4] {
        [self.w, self.x, self.y, self.z]
    }

    #[inline]
    fn norm_sqr(self) -> f64 {
        Quaternion::norm_sqr(self)
    }
}

/// Which number system the orbit is computed in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AlgebraKind {
    /// Commutative hypercomplex numbers.
    HyperComplex,
    /// Hamilton quaternions.
    Quaternion,
}

/// The iterated formula.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FormulaKind {
    /// `z² + c`
    Quadratic,
    /// `z³ + c`
    Cubic,
    /// `zⁿ + c`, for `n >= 2`.
    Power(u32),
    /// `c·z·(1 − z)`
    Lambda,
    /// Every point is inside.  Useful for calibrating cameras, lights
    /// and palettes without a fractal in the way.
    Solid,
}

impl FormulaKind {
    /// The polynomial degree, used by the smooth iteration count.
    pub fn degree(self) -> f64 {
        match self {
            FormulaKind::Quadratic | FormulaKind::Lambda => 2.0,
            FormulaKind::Cubic => 3.0,
            FormulaKind::Power(n) => f64::from(n),
            FormulaKind::Solid => 1.0,
        }
    }

    /// Where a Mandelbrot-mode orbit starts.
    pub fn critical_point<A: Algebra>(self) -> A {
        match self {
            FormulaKind::Lambda => A::from_components([0.5, 0.0, 0.0, 0.0]),
            _ => A::zero(),
        }
    }
}

/// How a point in three-space maps onto the orbit's seed and constant.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FractalMode {
    /// The point seeds the orbit; the scene constant is `c`.
    Julia,
    /// The orbit starts at the critical point; the point is `c`.
    Mandelbrot,
}

/// The last orbit value, in whichever algebra produced it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FinalState {
    /// From a hypercomplex orbit.
    HyperComplex(HyperComplex),
    /// From a quaternion orbit.
    Quaternion(Quaternion),
}

impl FinalState {
    /// The four components, real part first.
    pub fn components(self) -> [f64; 4] {
        match self {
            FinalState::HyperComplex(h) => h.components(),
            FinalState::Quaternion(q) => q.components(),
        }
    }
}

/// The outcome of iterating one point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Escape<S> {
    /// Whether the orbit left the bailout radius.
    pub escaped: bool,
    /// Smooth (fractional) iteration count for escaped orbits;
    /// `max_iterations` for orbits that stayed inside.
    pub iterations: f64,
    /// The orbit's last value.
    pub final_state: S,
}

impl<S> Escape<S> {
    /// Carry the result over to a different state representation.
    pub fn map_state<T, F: FnOnce(S) -> T>(self, f: F) -> Escape<T> {
        Escape {
            escaped: self.escaped,
            iterations: self.iterations,
            final_state: f(self.final_state),
        }
    }
}

/// Iterate `step` from `z` until the orbit leaves the bailout radius
/// or `max_iterations` steps have been taken.  Escaped orbits report
/// the smooth iteration count `n + 1 - ln(ln|z|) / ln(degree)`.
#[inline]
pub fn iterate<A, F>(
    mut z: A,
    c: A,
    step: F,
    max_iterations: usize,
    bailout: f64,
    degree: f64,
) -> Escape<A>
where
    A: Algebra,
    F: Fn(A, A) -> A,
{
    let limit = bailout * bailout;
    for n in 1..=max_iterations {
        z = step(z, c);
        let r2 = z.norm_sqr();
        if r2 > limit {
            return Escape {
                escaped: true,
                iterations: smooth_count(n, r2, degree, max_iterations),
                final_state: z,
            };
        }
    }
    Escape {
        escaped: false,
        iterations: max_iterations as f64,
        final_state: z,
    }
}

fn smooth_count(n: usize, norm_sqr: f64, degree: f64, max_iterations: usize) -> f64 {
    let log_z = 0.5 * norm_sqr.ln();
    if degree <= 1.0 || !log_z.is_finite() || log_z <= 0.0 {
        return n as f64;
    }
    let mu = n as f64 + 1.0 - log_z.ln() / degree.ln();
    num::clamp(mu, 0.0, max_iterations as f64)
}

/// Ray marching controls.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MarchSettings {
    /// Uniform samples between the near and far distances.
    pub steps: usize,
    /// Bisection steps used to tighten the first inside sample.
    pub refinements: usize,
}

impl Default for MarchSettings {
    fn default() -> Self {
        MarchSettings {
            steps: 200,
            refinements: 10,
        }
    }
}

/// Where a ray meets the set.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Hit {
    /// Distance along the ray.
    pub distance: f64,
    /// The hit point.
    pub point: Point3,
    /// Normalized iteration count of the closest outside sample,
    /// in `[0, 1]`; the palette is indexed by this.
    pub color_index: f64,
}

/// A fully parameterized member of the fractal family.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Fractal {
    /// The iterated formula.
    pub formula: FormulaKind,
    /// The number system.
    pub algebra: AlgebraKind,
    /// Julia or Mandelbrot seeding.
    pub mode: FractalMode,
    /// The Julia constant, real part first.  Unused in Mandelbrot mode.
    pub constant: [f64; 4],
    /// Fourth coordinate of every lifted point.
    pub slice: f64,
    /// Orbits that survive this many steps are inside.
    pub max_iterations: usize,
    /// Escape radius.
    pub bailout: f64,
}

impl Default for Fractal {
    fn default() -> Self {
        Fractal {
            formula: FormulaKind::Quadratic,
            algebra: AlgebraKind::Quaternion,
            mode: FractalMode::Julia,
            constant: [-0.2, 0.8, 0.0, 0.0],
            slice: 0.0,
            max_iterations: 12,
            bailout: 4.0,
        }
    }
}

impl Fractal {
    /// Check the parameters before any point is iterated.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.max_iterations == 0 {
            return Err(RenderError::scene("max_iterations must be at least 1"));
        }
        if !(self.bailout.is_finite() && self.bailout > 0.0) {
            return Err(RenderError::scene("bailout radius must be positive"));
        }
        if let FormulaKind::Power(n) = self.formula {
            if n < 2 {
                return Err(RenderError::scene("power formulas need an exponent of 2 or more"));
            }
        }
        if !self.slice.is_finite() || self.constant.iter().any(|c| !c.is_finite()) {
            return Err(RenderError::scene("fractal constant and slice must be finite"));
        }
        Ok(())
    }

    /// Iterate the point `p` under this fractal.
    pub fn escape(&self, p: Point3) -> Escape<FinalState> {
        match self.algebra {
            AlgebraKind::HyperComplex => self
                .escape_in::<HyperComplex>(p)
                .map_state(FinalState::HyperComplex),
            AlgebraKind::Quaternion => self
                .escape_in::<Quaternion>(p)
                .map_state(FinalState::Quaternion),
        }
    }

    /// Whether `p` is inside the set.
    pub fn contains(&self, p: Point3) -> bool {
        !self.escape(p).escaped
    }

    fn escape_in<A: Algebra>(&self, p: Point3) -> Escape<A> {
        let lifted = A::from_components([p.x, p.y, p.z, self.slice]);
        let (z, c) = match self.mode {
            FractalMode::Julia => (lifted, A::from_components(self.constant)),
            FractalMode::Mandelbrot => (self.formula.critical_point(), lifted),
        };
        let (limit, bailout, degree) = (self.max_iterations, self.bailout, self.formula.degree());
        match self.formula {
            FormulaKind::Quadratic => iterate(z, c, |z, c| z * z + c, limit, bailout, degree),
            FormulaKind::Cubic => iterate(z, c, |z, c| z * z * z + c, limit, bailout, degree),
            FormulaKind::Power(n) => iterate(
                z,
                c,
                |z, c| num::pow(z, n as usize) + c,
                limit,
                bailout,
                degree,
            ),
            FormulaKind::Lambda => iterate(
                z,
                c,
                |z, c| c * z * (A::one() - z),
                limit,
                bailout,
                degree,
            ),
            FormulaKind::Solid => Escape {
                escaped: false,
                iterations: limit as f64,
                final_state: z,
            },
        }
    }

    /// The smooth iteration count at `p`, as a scalar field.  It rises
    /// toward the set and is flat inside it.
    pub fn potential(&self, p: Point3) -> f64 {
        self.escape(p).iterations
    }

    /// Estimate the outward surface normal at `p` by central
    /// differences of the potential, `epsilon` either side along each
    /// axis.  Returns `None` where the field is flat, which happens
    /// deep inside the set.
    pub fn normal(&self, p: Point3, epsilon: f64) -> Option<Vector3> {
        let diff = |axis: Vector3| {
            let d = axis * epsilon;
            self.potential(p + d) - self.potential(p - d)
        };
        let gradient = Vector3::new(
            diff(Vector3::unit_x()),
            diff(Vector3::unit_y()),
            diff(Vector3::unit_z()),
        );
        (-gradient).normalize()
    }

    /// March `ray` from `near` to `far` looking for the first inside
    /// sample, then bisect between it and the preceding outside sample.
    pub fn intersect(&self, ray: &Ray, near: f64, far: f64, march: &MarchSettings) -> Option<Hit> {
        let steps = march.steps.max(1);
        let dt = (far - near) / steps as f64;
        let max = self.max_iterations as f64;

        let mut outside: Option<(f64, f64)> = None;
        for i in 0..=steps {
            let t = near + dt * i as f64;
            let sample = self.escape(ray.at(t));
            if sample.escaped {
                outside = Some((t, sample.iterations));
                continue;
            }

            let (mut lo, mut count) = match outside {
                Some(o) => o,
                None => {
                    return Some(Hit {
                        distance: t,
                        point: ray.at(t),
                        color_index: num::clamp(sample.iterations / max, 0.0, 1.0),
                    });
                }
            };
            let mut hi = t;
            for _ in 0..march.refinements {
                let mid = 0.5 * (lo + hi);
                let e = self.escape(ray.at(mid));
                if e.escaped {
                    lo = mid;
                    count = e.iterations;
                } else {
                    hi = mid;
                }
            }
            return Some(Hit {
                distance: hi,
                point: ray.at(hi),
                color_index: num::clamp(count / max, 0.0, 1.0),
            });
        }
        None
    }
}
