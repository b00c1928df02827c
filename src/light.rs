//! Light sources.

use crate::color::Color;
use crate::geometry::{Point3, Vector3, EPSILON};

/// How a point light fades with distance.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Attenuation {
    /// Constant intensity at any distance.
    None,
    /// `1 / d`
    InverseDistance,
    /// `1 / d²`
    InverseDistanceSquared,
}

impl Attenuation {
    /// The intensity factor at `distance`.  A light sitting on the
    /// surface, within `EPSILON`, is treated as unattenuated.
    pub fn factor(self, distance: f64) -> f64 {
        if distance <= EPSILON {
            return 1.0;
        }
        match self {
            Attenuation::None => 1.0,
            Attenuation::InverseDistance => 1.0 / distance,
            Attenuation::InverseDistanceSquared => 1.0 / (distance * distance),
        }
    }
}

/// A light in the scene.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Light {
    /// Uniform light from everywhere.
    Ambient {
        /// Light color.
        color: Color,
        /// Scale applied to `color`.
        intensity: f64,
    },
    /// Parallel light, as from a distant source.
    Directional {
        /// Light color.
        color: Color,
        /// Scale applied to `color`.
        intensity: f64,
        /// The direction the light travels.  Need not be unit length.
        direction: Vector3,
    },
    /// Light radiating from a point.
    Point {
        /// Light color.
        color: Color,
        /// Scale applied to `color`.
        intensity: f64,
        /// Where the light is.
        position: Point3,
        /// Distance falloff.
        attenuation: Attenuation,
    },
}

impl Light {
    /// White ambient light.
    pub fn ambient(intensity: f64) -> Light {
        Light::Ambient {
            color: Color::WHITE,
            intensity,
        }
    }

    /// White directional light travelling along `direction`.
    pub fn directional(direction: Vector3, intensity: f64) -> Light {
        Light::Directional {
            color: Color::WHITE,
            intensity,
            direction,
        }
    }

    /// White point light at `position`.
    pub fn point(position: Point3, intensity: f64, attenuation: Attenuation) -> Light {
        Light::Point {
            color: Color::WHITE,
            intensity,
            position,
            attenuation,
        }
    }

    /// True for lights that ignore geometry.
    pub fn is_ambient(&self) -> bool {
        match self {
            Light::Ambient { .. } => true,
            _ => false,
        }
    }

    /// The unit vector from `point` toward the light, or `None` for
    /// ambient light and for degenerate directions.
    pub fn direction_from(&self, point: Point3) -> Option<Vector3> {
        match *self {
            Light::Ambient { .. } => None,
            Light::Directional { direction, .. } => (-direction).normalize(),
            Light::Point { position, .. } => (position - point).normalize(),
        }
    }

    /// Color and intensity reaching `point`, before the surface
    /// orientation is considered.
    pub fn irradiance(&self, point: Point3) -> Color {
        match *self {
            Light::Ambient { color, intensity } | Light::Directional { color, intensity, .. } => {
                color * intensity
            }
            Light::Point {
                color,
                intensity,
                position,
                attenuation,
            } => color * (intensity * attenuation.factor((position - point).length())),
        }
    }

    /// The light arriving at a surface at `point` facing `normal`.
    /// Ambient light arrives regardless of orientation; the others are
    /// scaled by `max(0, normal · to_light)`.
    pub fn contribution(&self, point: Point3, normal: Vector3) -> Color {
        if self.is_ambient() {
            return self.irradiance(point);
        }
        match self.direction_from(point) {
            Some(to_light) => self.irradiance(point) * normal.dot(to_light).max(0.0),
            // The light sits on the surface: nothing to orient against.
            None => self.irradiance(point),
        }
    }
}
