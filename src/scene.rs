//! Scene description: everything a render reads and nothing it writes.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

use crate::camera::Camera;
use crate::color::{Color, Palette};
use crate::dissolve::DissolvePattern;
use crate::error::RenderError;
use crate::fractal::{Fractal, MarchSettings};
use crate::geometry::Vector3;
use crate::light::Light;
use crate::shader::Shader;

/// Raster dimensions in pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Columns.
    pub width: usize,
    /// Rows.
    pub height: usize,
}

impl Resolution {
    /// Constructor; does not validate.
    pub const fn new(width: usize, height: usize) -> Self {
        Resolution { width, height }
    }

    /// Fails for rasters without pixels.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidResolution {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Total pixel count.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// True if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// The complete scene.  A render takes a shared snapshot of this and
/// never mutates it.
#[derive(Clone, Debug)]
pub struct FractalInfo {
    /// Preferred output size.
    pub resolution: Resolution,
    /// The view.
    pub camera: Camera,
    /// Which set, and how it is iterated.
    pub fractal: Fractal,
    /// Ray marching controls.
    pub march: MarchSettings,
    /// The lights, in no particular order.
    pub lights: Vec<Light>,
    /// Surface shading.
    pub shader: Shader,
    /// Surface colors, shared with whoever else uses them.
    pub palette: Arc<Palette>,
    /// Color of rays that reach the yon plane.
    pub background: Color,
    /// Average nine jittered rays per pixel.
    pub supersample: bool,
}

impl Default for FractalInfo {
    fn default() -> Self {
        FractalInfo {
            resolution: Resolution::new(320, 240),
            camera: Camera::default(),
            fractal: Fractal::default(),
            march: MarchSettings::default(),
            lights: vec![
                Light::ambient(0.2),
                Light::directional(Vector3::new(1.0, -1.0, 1.0), 0.8),
            ],
            shader: Shader::default(),
            palette: Arc::new(Palette::default()),
            background: Color::BLACK,
            supersample: false,
        }
    }
}

impl FractalInfo {
    /// Check every parameter the renderer depends on.
    pub fn validate(&self) -> Result<(), RenderError> {
        self.resolution.validate()?;
        self.validate_parameters()
    }

    /// As `validate`, but leaves the resolution alone for callers that
    /// render at a size of their own.
    pub fn validate_parameters(&self) -> Result<(), RenderError> {
        self.camera.validate()?;
        self.fractal.validate()?;
        if self.march.steps == 0 {
            return Err(RenderError::scene("march needs at least one step"));
        }
        for light in &self.lights {
            if let Light::Directional { direction, .. } = *light {
                if direction.normalize().is_none() {
                    return Err(RenderError::scene("directional light has no direction"));
                }
            }
        }
        if let Shader::Phong { shininess, .. } = self.shader {
            if !(shininess >= 0.0) {
                return Err(RenderError::scene("shininess must not be negative"));
            }
        }
        if self.palette.is_empty() {
            return Err(RenderError::scene("a palette needs at least one color"));
        }
        Ok(())
    }
}

/// Explicit seeds for everything random in a render.  Two renders with
/// equal contexts and scenes produce identical buffers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RenderContext {
    /// Keys the order in which pixels are visited.
    pub dissolve_seed: u64,
    /// Keys the sub-pixel jitter of supersampled rays.
    pub jitter_seed: u64,
}

impl RenderContext {
    /// Derive both seeds from one.
    pub fn new(seed: u64) -> Self {
        RenderContext {
            dissolve_seed: seed,
            jitter_seed: seed.rotate_left(32) ^ 0xA076_1D64_78BD_642F,
        }
    }

    /// The visiting order for a `width × height` raster.
    pub fn dissolve(&self, width: usize, height: usize) -> DissolvePattern {
        DissolvePattern::new(width, height, &mut StdRng::seed_from_u64(self.dissolve_seed))
    }

    /// The jitter source for one pixel.  Depends only on the seed and
    /// the pixel, never on the order pixels are rendered in.
    pub fn jitter(&self, x: usize, y: usize) -> StdRng {
        let pixel = ((y as u64) << 32) ^ (x as u64);
        StdRng::seed_from_u64(self.jitter_seed ^ pixel.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        RenderContext::new(0x5EED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn default_scene_is_renderable() {
        assert!(FractalInfo::default().validate().is_ok());
    }

    #[test]
    fn empty_resolutions_are_refused() {
        assert_eq!(
            Resolution::new(0, 10).validate(),
            Err(RenderError::InvalidResolution {
                width: 0,
                height: 10
            })
        );
        assert!(Resolution::new(10, 0).validate().is_err());
        assert!(Resolution::new(1, 1).validate().is_ok());
    }

    #[test]
    fn invalid_subobjects_fail_validation() {
        let mut scene = FractalInfo::default();
        scene.march.steps = 0;
        assert!(scene.validate().is_err());

        let mut scene = FractalInfo::default();
        scene.fractal.bailout = 0.0;
        assert!(scene.validate().is_err());

        let mut scene = FractalInfo::default();
        scene.camera.view_width = 0.0;
        assert!(scene.validate().is_err());

        let mut scene = FractalInfo::default();
        scene.lights.push(Light::directional(Vector3::zero(), 1.0));
        assert_eq!(
            scene.validate(),
            Err(RenderError::scene("directional light has no direction"))
        );
    }

    #[test]
    fn jitter_is_a_function_of_the_pixel() {
        let ctx = RenderContext::new(9);
        let a: f64 = ctx.jitter(3, 4).gen();
        let b: f64 = ctx.jitter(3, 4).gen();
        let c: f64 = ctx.jitter(4, 3).gen();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn dissolve_follows_the_seed() {
        let a: Vec<_> = RenderContext::new(1).dissolve(8, 8).collect();
        let b: Vec<_> = RenderContext::new(1).dissolve(8, 8).collect();
        assert_eq!(a, b);
    }
}
