#![warn(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! HyperMandel: a ray marcher for four dimensional fractals
//!
//! The Mandelbrot and Julia sets are usually drawn on the complex
//! plane.  The same iteration, `z ← z² + c`, can be run over any
//! algebra with a multiplication, and over the four dimensional
//! hypercomplex numbers and quaternions it produces solid, lumpy
//! objects.  We fix one of the four coordinates (the slice), which
//! leaves a three dimensional object that can be lit and shaded like
//! any other surface.
//!
//! There is no distance estimate for these sets, so each camera ray
//! is walked in uniform steps from the near plane to the far plane
//! until a sample lands inside the set, and the crossing is then
//! narrowed down by bisection.  The surface normal is the negated
//! gradient of the escape count, taken by central differences.  The
//! palette is indexed by the escape count of the last sample outside
//! the set, and the result is shaded by Lambert or Phong lighting.
//!
//! A `Renderer` owns the color raster and depth buffer for a scene,
//! visits pixels in a scattered dissolve order so partial renders look
//! like a whole picture, and can be cancelled and resumed, or split
//! over threads.

extern crate crossbeam;
extern crate failure;
extern crate image;
extern crate itertools;
extern crate log;
extern crate num;
extern crate rand;

pub mod camera;
pub mod color;
pub mod dissolve;
pub mod error;
pub mod fractal;
pub mod geometry;
pub mod hypercomplex;
pub mod light;
pub mod quaternion;
pub mod renderer;
pub mod scene;
pub mod shader;

pub use camera::{Camera, Projection};
pub use color::{Color, Palette};
pub use dissolve::DissolvePattern;
pub use error::RenderError;
pub use fractal::{
    Algebra, AlgebraKind, Escape, FinalState, FormulaKind, Fractal, FractalMode, Hit,
    MarchSettings,
};
pub use geometry::{Matrix3, Point3, Ray, Vector3};
pub use hypercomplex::HyperComplex;
pub use light::{Attenuation, Light};
pub use quaternion::Quaternion;
pub use renderer::{
    CancelToken, ColorFormula, PixelSample, Progress, RenderResult, RenderState, RenderTarget,
    Renderer, SUPER_SAMPLE_SIZE,
};
pub use scene::{FractalInfo, RenderContext, Resolution};
pub use shader::Shader;
