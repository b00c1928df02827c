//! Linear RGB colors and the palettes that turn iteration counts into
//! them.
//!
//! Color arithmetic is unclamped: a surface lit by several bright
//! lights may well exceed 1.0 in some channel, and that headroom is
//! kept until the value is finally written to an 8-bit pixel.

use std::ops::{Add, AddAssign, Div, Mul};

use crate::error::RenderError;

/// An unclamped linear RGB triple.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Color {
    /// Red.
    pub r: f64,
    /// Green.
    pub g: f64,
    /// Blue.
    pub b: f64,
}

impl Color {
    /// Constructor.
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Color { r, g, b }
    }

    /// All channels zero.
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);

    /// All channels one.
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

    /// The same value in all three channels.
    pub const fn gray(v: f64) -> Self {
        Color::new(v, v, v)
    }

    /// From 8-bit channels.
    pub fn from_rgb8(rgb: [u8; 3]) -> Self {
        Color::new(
            f64::from(rgb[0]) / 255.0,
            f64::from(rgb[1]) / 255.0,
            f64::from(rgb[2]) / 255.0,
        )
    }

    /// Clamp each channel into `[0, 1]` and quantize to 8 bits.  NaN
    /// channels become zero.
    pub fn to_rgb8(self) -> [u8; 3] {
        [quantize(self.r), quantize(self.g), quantize(self.b)]
    }

    /// Straight-line interpolation; `t = 0` gives `self` exactly and
    /// `t = 1` gives `other` exactly.
    pub fn lerp(self, other: Color, t: f64) -> Color {
        self * (1.0 - t) + other * t
    }
}

fn quantize(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (num::clamp(v, 0.0, 1.0) * 255.0).round() as u8
}

impl Add for Color {
    type Output = Color;
    fn add(self, rhs: Color) -> Color {
        Color::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

impl AddAssign for Color {
    fn add_assign(&mut self, rhs: Color) {
        *self = *self + rhs;
    }
}

/// Channel-by-channel product: a surface color filtered by a light.
impl Mul for Color {
    type Output = Color;
    fn mul(self, rhs: Color) -> Color {
        Color::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b)
    }
}

impl Mul<f64> for Color {
    type Output = Color;
    fn mul(self, k: f64) -> Color {
        Color::new(self.r * k, self.g * k, self.b * k)
    }
}

impl Div<f64> for Color {
    type Output = Color;
    fn div(self, k: f64) -> Color {
        Color::new(self.r / k, self.g / k, self.b / k)
    }
}

/// An ordered, non-empty lookup table of colors.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    entries: Vec<Color>,
}

impl Palette {
    /// A palette from its entries; an empty table is refused.
    pub fn new(entries: Vec<Color>) -> Result<Palette, RenderError> {
        if entries.is_empty() {
            return Err(RenderError::scene("a palette needs at least one color"));
        }
        Ok(Palette { entries })
    }

    /// A palette that maps everything to `color`.
    pub fn constant(color: Color) -> Palette {
        Palette {
            entries: vec![color],
        }
    }

    /// `size` entries evenly spread along the piecewise-linear path
    /// through `stops`.
    pub fn gradient(stops: &[Color], size: usize) -> Result<Palette, RenderError> {
        let stops = Palette::new(stops.to_vec())?;
        if size < 2 {
            return Ok(Palette::constant(stops.lookup(0.0)));
        }
        let last = (size - 1) as f64;
        Palette::new((0..size).map(|i| stops.lookup(i as f64 / last)).collect())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Palettes are never empty; provided for symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The raw entries.
    pub fn entries(&self) -> &[Color] {
        &self.entries
    }

    /// Interpolate between the two entries either side of
    /// `t * (len - 1)`.  `t` is clamped to `[0, 1]`; NaN reads as 0.
    pub fn lookup(&self, t: f64) -> Color {
        let last = self.entries.len() - 1;
        if last == 0 || !(t > 0.0) {
            return self.entries[0];
        }
        if t >= 1.0 {
            return self.entries[last];
        }
        let pos = t * last as f64;
        let i = pos.floor() as usize;
        if i >= last {
            return self.entries[last];
        }
        self.entries[i].lerp(self.entries[i + 1], pos - i as f64)
    }
}

impl Default for Palette {
    /// Deep blue through white to orange.
    fn default() -> Self {
        Palette {
            entries: vec![
                Color::new(0.0, 0.03, 0.2),
                Color::new(0.1, 0.4, 0.8),
                Color::new(0.95, 0.95, 1.0),
                Color::new(1.0, 0.65, 0.1),
                Color::new(0.4, 0.1, 0.0),
            ],
        }
    }
}
