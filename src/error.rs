//! The error taxonomy for the renderer and its numeric primitives.

use failure::Fail;

/// Everything that can go wrong while configuring a scene, doing
/// four-component arithmetic, or asking the renderer for pixels.
/// Nothing in the per-pixel path can fail once a scene has been
/// configured; the errors below are all reported synchronously to the
/// caller that supplied the bad value.
#[derive(Debug, Clone, PartialEq, Fail)]
pub enum RenderError {
    /// The requested raster has no pixels.
    #[fail(display = "invalid resolution {}x{}", width, height)]
    InvalidResolution {
        /// Requested width, in pixels.
        width: usize,
        /// Requested height, in pixels.
        height: usize,
    },

    /// Division by (or inversion of) a value whose norm is zero.
    #[fail(display = "division by a zero-norm value")]
    DivisionByZero,

    /// A scene parameter is outside the domain the renderer accepts.
    #[fail(display = "invalid scene: {}", _0)]
    InvalidScene(String),

    /// A render was requested before `configure` succeeded.
    #[fail(display = "renderer has not been configured")]
    NotConfigured,

    /// A single pixel was requested outside the configured raster.
    #[fail(display = "pixel {},{} is outside the raster", x, y)]
    PixelOutOfBounds {
        /// Requested column.
        x: usize,
        /// Requested row.
        y: usize,
    },

    /// A render thread panicked.  Pixels finished by the other threads
    /// are kept and the render can be resumed.
    #[fail(display = "a render thread panicked")]
    WorkerPanicked,

    /// The text could not be read back as comma separated components.
    #[fail(display = "could not parse {:?} as comma separated components", _0)]
    ParseComponents(String),
}

impl RenderError {
    pub(crate) fn scene<S: Into<String>>(message: S) -> Self {
        RenderError::InvalidScene(message.into())
    }
}
