//! The renderer drives the whole pipeline for every pixel: camera ray,
//! march into the set, surface normal, palette, shading, and finally
//! the write into the color and depth buffers.
//!
//! Pixels are independent of each other and of the order they are
//! visited in.  `render_all` walks them in dissolve order, checking for
//! cancellation between pixels, and can be called again after a
//! cancellation to carry on where it stopped.  `render_parallel` splits
//! the raster into bands of rows and shares them out between scoped
//! threads; both paths produce identical buffers.

use image::{GrayImage, Pixel, RgbImage};
use itertools::iproduct;
use log::{debug, info, warn};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use std::f32;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::color::Color;
use crate::dissolve::DissolvePattern;
use crate::error::RenderError;
use crate::scene::{FractalInfo, RenderContext, Resolution};

/// Rays averaged per pixel when supersampling: a jittered 3×3 grid.
pub const SUPER_SAMPLE_SIZE: usize = GRID * GRID;
const GRID: usize = 3;

/// Depth of a pixel that has not been rendered yet.
pub const NOT_COMPUTED: f32 = f32::NEG_INFINITY;

/// Depth of a pixel whose rays all reached the yon plane.
pub const ESCAPED: f32 = f32::INFINITY;

/// An externally compiled coloring function of the hit point.  Its
/// value replaces the iteration count as the palette index.
pub type ColorFormula = Arc<dyn Fn(f64, f64, f64) -> f64 + Send + Sync>;

/// Where the renderer is in its life.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenderState {
    /// No scene yet.
    Idle,
    /// Buffers were (re)allocated for a new scene or size; nothing
    /// has been rendered into them.
    Resizing,
    /// A render is under way.
    Rendering,
    /// Every pixel has been rendered.
    Completed,
    /// A render was cancelled; calling it again resumes.
    Cancelled,
}

/// A shareable flag asking a render to stop at the next pixel.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that has not been cancelled.
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Ask every render holding this token to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether `cancel` has been called since the last `reset`.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can drive another render.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Pixels done out of pixels total.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    /// Pixels visited so far.
    pub rendered: usize,
    /// Pixels in the raster.
    pub total: usize,
}

impl Progress {
    /// Completion in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.rendered as f64 / self.total as f64
        }
    }
}

/// The rendered value of one pixel.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PixelSample {
    /// Mean of the sample colors, unclamped.
    pub color: Color,
    /// Nearest hit distance, or `ESCAPED`.
    pub depth: f32,
}

/// A color raster and a parallel depth buffer.
#[derive(Clone, Debug)]
pub struct RenderTarget {
    pixels: RgbImage,
    depths: Vec<f32>,
}

impl RenderTarget {
    /// A black raster with every depth `NOT_COMPUTED`.
    pub fn new(resolution: Resolution) -> Self {
        RenderTarget {
            pixels: RgbImage::new(resolution.width as u32, resolution.height as u32),
            depths: vec![NOT_COMPUTED; resolution.len()],
        }
    }

    /// Columns.
    pub fn width(&self) -> usize {
        self.pixels.width() as usize
    }

    /// Rows.
    pub fn height(&self) -> usize {
        self.pixels.height() as usize
    }

    /// The color raster.
    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// Row-major depths.
    pub fn depths(&self) -> &[f32] {
        &self.depths
    }

    /// Depth at `(x, y)`.
    pub fn depth(&self, x: usize, y: usize) -> f32 {
        self.depths[y * self.width() + x]
    }

    /// Whether `(x, y)` has been written.
    pub fn is_computed(&self, x: usize, y: usize) -> bool {
        self.depth(x, y) != NOT_COMPUTED
    }

    /// How many pixels have been written.
    pub fn computed(&self) -> usize {
        self.depths.iter().filter(|&&d| d != NOT_COMPUTED).count()
    }

    fn write(&mut self, x: usize, y: usize, sample: PixelSample) {
        let width = self.width();
        self.depths[y * width + x] = sample.depth;
        self.pixels
            .get_pixel_mut(x as u32, y as u32)
            .channels_mut()
            .copy_from_slice(&sample.color.to_rgb8());
    }

    /// Depths as 8-bit gray: the nearest hit is white, the farthest
    /// dark gray, and escaped or unrendered pixels black.
    pub fn depth_image(&self) -> GrayImage {
        let finite = self.depths.iter().cloned().filter(|d| d.is_finite());
        let (near, far) = finite.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), d| {
            (lo.min(d), hi.max(d))
        });
        let span = far - near;
        let mut image = GrayImage::new(self.pixels.width(), self.pixels.height());
        for (y, x) in iproduct!(0..self.height(), 0..self.width()) {
            let d = self.depth(x, y);
            let level = if !d.is_finite() {
                0
            } else if span > 0.0 {
                (255.0 - 223.0 * (d - near) / span).round() as u8
            } else {
                255
            };
            image.get_pixel_mut(x as u32, y as u32).channels_mut()[0] = level;
        }
        image
    }
}

/// A copy of the buffers handed back to the caller.
#[derive(Clone, Debug)]
pub struct RenderResult {
    /// The color raster.
    pub pixels: RgbImage,
    /// Row-major depths, with `NOT_COMPUTED` and `ESCAPED` sentinels.
    pub depths: Vec<f32>,
    /// False if the render was cancelled before every pixel was done.
    pub completed: bool,
}

impl RenderResult {
    /// The 8-bit color at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let c = self.pixels.get_pixel(x as u32, y as u32).channels();
        [c[0], c[1], c[2]]
    }

    /// The depth at `(x, y)`.
    pub fn depth(&self, x: usize, y: usize) -> f32 {
        self.depths[y * self.pixels.width() as usize + x]
    }
}

struct Jitter(Uniform<f64>, StdRng);

impl Jitter {
    fn new(rng: StdRng) -> Self {
        Jitter(Uniform::new(0.0, 1.0), rng)
    }

    fn get(&mut self) -> f64 {
        self.0.sample(&mut self.1)
    }
}

/// Everything one pixel needs, borrowed so that it can be shared
/// between threads.
struct Sampler<'a> {
    scene: &'a FractalInfo,
    context: &'a RenderContext,
    formula: Option<&'a ColorFormula>,
    resolution: Resolution,
    epsilon: f64,
}

impl<'a> Sampler<'a> {
    fn new(
        scene: &'a FractalInfo,
        context: &'a RenderContext,
        formula: Option<&'a ColorFormula>,
        resolution: Resolution,
    ) -> Self {
        // Normals are differenced over half a pixel.
        let camera = &scene.camera;
        let epsilon = 0.5
            * (camera.view_width / resolution.width as f64)
                .min(camera.view_height / resolution.height as f64);
        Sampler {
            scene,
            context,
            formula,
            resolution,
            epsilon,
        }
    }

    fn pixel(&self, x: usize, y: usize) -> PixelSample {
        let (w, h) = (self.resolution.width as f64, self.resolution.height as f64);
        if !self.scene.supersample {
            let (color, depth) = self.trace((x as f64 + 0.5) / w, (y as f64 + 0.5) / h);
            return PixelSample {
                color,
                depth: depth as f32,
            };
        }

        let mut jitter = Jitter::new(self.context.jitter(x, y));
        let cell = GRID as f64;
        let mut sum = Color::BLACK;
        let mut nearest = std::f64::INFINITY;
        for (j, i) in iproduct!(0..GRID, 0..GRID) {
            let u = (x as f64 + (i as f64 + jitter.get()) / cell) / w;
            let v = (y as f64 + (j as f64 + jitter.get()) / cell) / h;
            let (color, depth) = self.trace(u, v);
            sum += color;
            nearest = nearest.min(depth);
        }
        PixelSample {
            color: sum / SUPER_SAMPLE_SIZE as f64,
            depth: nearest as f32,
        }
    }

    fn trace(&self, u: f64, v: f64) -> (Color, f64) {
        let scene = self.scene;
        let camera = &scene.camera;
        let ray = camera.generate_ray(u, v);
        let hit = match scene
            .fractal
            .intersect(&ray, camera.near, camera.far, &scene.march)
        {
            Some(hit) => hit,
            None => return (scene.background, std::f64::INFINITY),
        };

        let view = -ray.direction;
        let normal = scene
            .fractal
            .normal(hit.point, self.epsilon)
            .unwrap_or(view);
        let index = match self.formula {
            Some(f) => f(hit.point.x, hit.point.y, hit.point.z),
            None => hit.color_index,
        };
        let base = scene.palette.lookup(index);
        let color = scene
            .shader
            .shade(hit.point, normal, view, &scene.lights, base);
        (color, hit.distance)
    }
}

/// Renders one scene into its own buffers.
pub struct Renderer {
    scene: Option<Arc<FractalInfo>>,
    resolution: Resolution,
    context: RenderContext,
    color_formula: Option<ColorFormula>,
    target: RenderTarget,
    pattern: DissolvePattern,
    state: RenderState,
    progress_interval: usize,
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer::new(RenderContext::default())
    }
}

impl Renderer {
    /// An idle renderer with no scene.
    pub fn new(context: RenderContext) -> Self {
        let resolution = Resolution::new(0, 0);
        Renderer {
            scene: None,
            resolution,
            context,
            color_formula: None,
            target: RenderTarget::new(resolution),
            pattern: context.dissolve(0, 0),
            state: RenderState::Idle,
            progress_interval: 1024,
        }
    }

    /// A renderer configured for `scene` at the scene's own resolution.
    pub fn for_scene(scene: Arc<FractalInfo>, context: RenderContext) -> Result<Self, RenderError> {
        let mut renderer = Renderer::new(context);
        let resolution = scene.resolution;
        renderer.configure(resolution, scene)?;
        Ok(renderer)
    }

    /// Adopt a scene and raster size.  On error nothing changes.
    pub fn configure(
        &mut self,
        resolution: Resolution,
        scene: Arc<FractalInfo>,
    ) -> Result<(), RenderError> {
        resolution.validate()?;
        scene.validate_parameters()?;
        debug!(
            "configured {}x{} render, {:?} {:?} formula",
            resolution.width, resolution.height, scene.fractal.algebra, scene.fractal.formula
        );
        self.scene = Some(scene);
        self.resolution = resolution;
        self.reset();
        Ok(())
    }

    /// Reallocate the buffers for a new size, discarding any render in
    /// progress.
    pub fn set_resolution(&mut self, width: usize, height: usize) -> Result<(), RenderError> {
        let resolution = Resolution::new(width, height);
        resolution.validate()?;
        debug!("resizing to {}x{}", width, height);
        self.resolution = resolution;
        self.reset();
        Ok(())
    }

    /// Change the seeds.  Discards any render in progress.
    pub fn set_context(&mut self, context: RenderContext) {
        self.context = context;
        self.reset();
    }

    /// Install or remove the coloring function.  Discards any render
    /// in progress.
    pub fn set_color_formula(&mut self, formula: Option<ColorFormula>) {
        self.color_formula = formula;
        self.reset();
    }

    /// Report progress every `pixels` pixels (at least one).
    pub fn set_progress_interval(&mut self, pixels: usize) {
        self.progress_interval = pixels.max(1);
    }

    /// Clear the buffers and rewind the visiting order.
    pub fn reset(&mut self) {
        self.target = RenderTarget::new(self.resolution);
        self.pattern = self
            .context
            .dissolve(self.resolution.width, self.resolution.height);
        self.state = if self.scene.is_some() {
            RenderState::Resizing
        } else {
            RenderState::Idle
        };
    }

    /// Current state.
    pub fn state(&self) -> RenderState {
        self.state
    }

    /// True once every pixel has been rendered.
    pub fn is_complete(&self) -> bool {
        self.state == RenderState::Completed
    }

    /// Configured raster size.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// The configured scene, if any.
    pub fn scene(&self) -> Option<&Arc<FractalInfo>> {
        self.scene.as_ref()
    }

    /// The live buffers.
    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    /// Give up the buffers.
    pub fn into_target(self) -> RenderTarget {
        self.target
    }

    /// A copy of the buffers as they stand.
    pub fn snapshot(&self) -> RenderResult {
        RenderResult {
            pixels: self.target.pixels.clone(),
            depths: self.target.depths.clone(),
            completed: self.state == RenderState::Completed,
        }
    }

    /// Render a single pixel without touching the buffers.
    pub fn render_pixel(&self, x: usize, y: usize) -> Result<PixelSample, RenderError> {
        let scene = self.scene.as_ref().ok_or(RenderError::NotConfigured)?;
        if x >= self.resolution.width || y >= self.resolution.height {
            return Err(RenderError::PixelOutOfBounds { x, y });
        }
        let sampler = Sampler::new(
            scene,
            &self.context,
            self.color_formula.as_ref(),
            self.resolution,
        );
        Ok(sampler.pixel(x, y))
    }

    /// Render a single pixel and store it in the buffers.
    pub fn update_pixel(&mut self, x: usize, y: usize) -> Result<PixelSample, RenderError> {
        let sample = self.render_pixel(x, y)?;
        self.target.write(x, y, sample);
        if self.target.computed() == self.resolution.len() {
            self.state = RenderState::Completed;
        }
        Ok(sample)
    }

    /// Render every remaining pixel in dissolve order.
    pub fn render_all(&mut self, cancel: &CancelToken) -> Result<RenderResult, RenderError> {
        self.render_all_with_progress(cancel, |_| ())
    }

    /// As `render_all`, calling `progress` every `progress_interval`
    /// pixels and once at the end.  `progress` may cancel the token;
    /// the render stops before the next pixel.
    pub fn render_all_with_progress<F>(
        &mut self,
        cancel: &CancelToken,
        mut progress: F,
    ) -> Result<RenderResult, RenderError>
    where
        F: FnMut(Progress),
    {
        let scene = self.scene.clone().ok_or(RenderError::NotConfigured)?;
        let total = self.resolution.len();
        let interval = self.progress_interval;
        let sampler = Sampler::new(
            &scene,
            &self.context,
            self.color_formula.as_ref(),
            self.resolution,
        );
        let pattern = &mut self.pattern;
        let target = &mut self.target;

        self.state = RenderState::Rendering;
        info!(
            "rendering {} of {} pixels",
            total - pattern.emitted(),
            total
        );

        let mut reported = pattern.emitted();
        loop {
            if cancel.is_cancelled() {
                break;
            }
            let (x, y) = match pattern.next() {
                Some(p) => p,
                None => break,
            };
            if !target.is_computed(x, y) {
                target.write(x, y, sampler.pixel(x, y));
            }
            let rendered = pattern.emitted();
            if rendered % interval == 0 {
                reported = rendered;
                progress(Progress { rendered, total });
            }
        }

        let rendered = pattern.emitted();
        if rendered < total {
            info!("render cancelled after {} of {} pixels", rendered, total);
            self.state = RenderState::Cancelled;
        } else {
            if reported != rendered {
                progress(Progress { rendered, total });
            }
            info!("render complete, {} pixels", total);
            self.state = RenderState::Completed;
        }
        Ok(self.snapshot())
    }

    /// Render every pixel not yet computed on `threads` scoped threads,
    /// each taking bands of rows from a shared queue.  Cancellation is
    /// checked between pixels.
    pub fn render_parallel(
        &mut self,
        threads: usize,
        cancel: &CancelToken,
    ) -> Result<RenderResult, RenderError> {
        let scene = self.scene.clone().ok_or(RenderError::NotConfigured)?;
        let threads = threads.max(1);
        let Resolution { width, height } = self.resolution;
        let band = (height / (threads * 4)).max(1);
        let bands = Arc::new(Mutex::new((0..height).step_by(band)));

        self.state = RenderState::Rendering;
        info!(
            "rendering {}x{} on {} threads in bands of {} rows",
            width, height, threads, band
        );

        let sampler = Sampler::new(
            &scene,
            &self.context,
            self.color_formula.as_ref(),
            self.resolution,
        );
        let joined = {
            let sampler = &sampler;
            let target = &self.target;
            crossbeam::scope(|spawner| {
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let bands = bands.clone();
                        spawner.spawn(move |_| {
                            let mut done = vec![];
                            loop {
                                // A poisoned queue is still a valid iterator.
                                let top = match bands.lock() {
                                    Ok(mut queue) => queue.next(),
                                    Err(poisoned) => poisoned.into_inner().next(),
                                };
                                let top = match top {
                                    Some(top) => top,
                                    None => break,
                                };
                                for (y, x) in iproduct!(top..(top + band).min(height), 0..width) {
                                    if cancel.is_cancelled() {
                                        return done;
                                    }
                                    if !target.is_computed(x, y) {
                                        done.push((x, y, sampler.pixel(x, y)));
                                    }
                                }
                            }
                            done
                        })
                    })
                    .collect();

                handles
                    .into_iter()
                    .map(|handle| handle.join())
                    .collect::<Vec<_>>()
            })
        };

        let mut panicked = joined.is_err();
        for worker in joined.unwrap_or_default() {
            match worker {
                Ok(samples) => {
                    for (x, y, sample) in samples {
                        self.target.write(x, y, sample);
                    }
                }
                Err(_) => panicked = true,
            }
        }
        let computed = self.target.computed();
        if panicked {
            warn!(
                "render thread panicked; kept {} of {} pixels",
                computed,
                self.resolution.len()
            );
            self.state = RenderState::Cancelled;
            return Err(RenderError::WorkerPanicked);
        }
        if computed == self.resolution.len() {
            info!("render complete, {} pixels", computed);
            self.state = RenderState::Completed;
        } else {
            info!(
                "render cancelled with {} of {} pixels",
                computed,
                self.resolution.len()
            );
            self.state = RenderState::Cancelled;
        }
        Ok(self.snapshot())
    }
}
