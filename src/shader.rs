//! Surface shading models.
//!
//! Both models sum ambient light separately from the oriented lights.
//! Results are left unclamped.

use crate::color::Color;
use crate::geometry::{Point3, Vector3};
use crate::light::Light;

/// A surface shading model.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Shader {
    /// Ambient plus diffuse.
    Lambert,
    /// Ambient plus diffuse plus a specular highlight.
    Phong {
        /// Highlight color.
        specular: Color,
        /// Highlight tightness; larger is smaller and sharper.
        shininess: f64,
    },
}

impl Default for Shader {
    fn default() -> Self {
        Shader::Phong {
            specular: Color::gray(0.6),
            shininess: 24.0,
        }
    }
}

impl Shader {
    /// Shade a surface point.  `view` points from the surface toward
    /// the eye; `normal` and `view` are unit vectors.
    pub fn shade(
        &self,
        point: Point3,
        normal: Vector3,
        view: Vector3,
        lights: &[Light],
        base: Color,
    ) -> Color {
        let mut ambient = Color::BLACK;
        let mut diffuse = Color::BLACK;
        for light in lights {
            if light.is_ambient() {
                ambient += light.contribution(point, normal);
            } else {
                diffuse += light.contribution(point, normal);
            }
        }
        let lit = base * (ambient + diffuse);

        match *self {
            Shader::Lambert => lit,
            Shader::Phong {
                specular,
                shininess,
            } => {
                let mut highlight = Color::BLACK;
                for to_light in lights.iter().filter_map(|l| l.direction_from(point)) {
                    let n_dot_l = normal.dot(to_light);
                    if n_dot_l <= 0.0 {
                        continue;
                    }
                    let reflect = normal * (2.0 * n_dot_l) - to_light;
                    highlight += specular * reflect.dot(view).max(0.0).powf(shininess);
                }
                lit + highlight
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::EPSILON;

    const FACING: Vector3 = Vector3::new(0.0, 0.0, -1.0);

    #[test]
    fn lambert_with_pure_ambient_returns_the_base_color() {
        let base = Color::new(0.2, 0.4, 0.8);
        let c = Shader::Lambert.shade(
            Vector3::zero(),
            FACING,
            FACING,
            &[Light::ambient(1.0)],
            base,
        );
        assert_eq!(c, base);
    }

    #[test]
    fn lambert_sums_ambient_and_diffuse() {
        let lights = [
            Light::ambient(0.25),
            Light::directional(Vector3::unit_z(), 0.5),
        ];
        let c = Shader::Lambert.shade(Vector3::zero(), FACING, FACING, &lights, Color::WHITE);
        assert!((c.r - 0.75).abs() < EPSILON);
    }

    #[test]
    fn phong_adds_a_highlight_on_the_mirror_direction() {
        let lights = [Light::directional(Vector3::unit_z(), 1.0)];
        let phong = Shader::Phong {
            specular: Color::WHITE,
            shininess: 10.0,
        };
        let lambert = Shader::Lambert.shade(Vector3::zero(), FACING, FACING, &lights, Color::gray(0.5));
        let shiny = phong.shade(Vector3::zero(), FACING, FACING, &lights, Color::gray(0.5));
        assert!((shiny.g - lambert.g - 1.0).abs() < EPSILON);
        // Results are not clamped.
        assert!(shiny.g > 1.0);

        // Looking from the side, the highlight is gone.
        let side = phong.shade(Vector3::zero(), FACING, Vector3::unit_x(), &lights, Color::gray(0.5));
        assert!((side.g - lambert.g).abs() < EPSILON);
    }

    #[test]
    fn lights_behind_the_surface_add_nothing() {
        let lights = [Light::directional(-Vector3::unit_z(), 1.0)];
        let c = Shader::default().shade(Vector3::zero(), FACING, FACING, &lights, Color::WHITE);
        assert_eq!(c, Color::BLACK);
    }
}
