//! The camera maps the unit square of the image onto a rectangle in
//! three-space and shoots a ray through each point of it.
//!
//! Only the orthographic projection exists: every ray is parallel to
//! the view direction, and the rectangle keeps the same size at every
//! depth.  The near and far distances bound how far along each ray the
//! renderer marches; a ray that reaches the far (yon) plane without a
//! hit has escaped.

use crate::error::RenderError;
use crate::geometry::{Matrix3, Point3, Ray, Vector3};

/// How rays leave the view plane.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Projection {
    /// Parallel rays.
    Orthographic,
}

/// Position, orientation and extent of the view.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Camera {
    /// Centre of the view rectangle and start of every ray's march.
    pub eye: Point3,
    /// Rows are the right, up and forward axes, in world space.
    pub orientation: Matrix3,
    /// World-space width of the view rectangle.
    pub view_width: f64,
    /// World-space height of the view rectangle.
    pub view_height: f64,
    /// Distance along each ray where marching starts.
    pub near: f64,
    /// Distance along each ray where marching gives up: the yon plane.
    pub far: f64,
    /// Projection kind.
    pub projection: Projection,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            eye: Vector3::new(0.0, 0.0, -3.0),
            orientation: Matrix3::identity(),
            view_width: 3.0,
            view_height: 3.0,
            near: 0.0,
            far: 6.0,
            projection: Projection::Orthographic,
        }
    }
}

impl Camera {
    /// A camera at `eye` looking toward `target`, with `up` giving the
    /// rough vertical.  Fails if the three points do not define a
    /// basis or the view size is not positive.
    pub fn look_at(
        eye: Point3,
        target: Point3,
        up: Vector3,
        view_width: f64,
        view_height: f64,
    ) -> Result<Camera, RenderError> {
        let distance = (target - eye).length();
        let mut camera = Camera {
            eye,
            view_width,
            view_height,
            far: 2.0 * distance,
            ..Camera::default()
        };
        camera.orientation = basis(eye, target, up)?;
        camera.validate()?;
        Ok(camera)
    }

    /// Check the invariants `generate_ray` relies on.
    pub fn validate(&self) -> Result<(), RenderError> {
        if !(self.view_width > 0.0 && self.view_height > 0.0) {
            return Err(RenderError::scene("view width and height must be positive"));
        }
        if !(self.far > self.near) || !self.near.is_finite() || !self.far.is_finite() {
            return Err(RenderError::scene("far distance must lie beyond near distance"));
        }
        if self.forward().normalize().is_none() {
            return Err(RenderError::scene("camera orientation has no forward axis"));
        }
        Ok(())
    }

    /// World-space right axis.
    pub fn right(&self) -> Vector3 {
        self.orientation.row(0)
    }

    /// World-space up axis.
    pub fn up(&self) -> Vector3 {
        self.orientation.row(1)
    }

    /// World-space view direction.
    pub fn forward(&self) -> Vector3 {
        self.orientation.row(2)
    }

    /// Point the camera at `target` from where it stands.
    pub fn aim(&mut self, target: Point3, up: Vector3) -> Result<(), RenderError> {
        self.orientation = basis(self.eye, target, up)?;
        Ok(())
    }

    /// Move the camera without turning it.
    pub fn set_eye(&mut self, eye: Point3) {
        self.eye = eye;
    }

    /// Resize the view rectangle.
    pub fn set_view_size(&mut self, width: f64, height: f64) -> Result<(), RenderError> {
        if !(width > 0.0 && height > 0.0) {
            return Err(RenderError::scene("view width and height must be positive"));
        }
        self.view_width = width;
        self.view_height = height;
        Ok(())
    }

    /// Set the marching range.
    pub fn set_clip(&mut self, near: f64, far: f64) -> Result<(), RenderError> {
        if !(far > near) {
            return Err(RenderError::scene("far distance must lie beyond near distance"));
        }
        self.near = near;
        self.far = far;
        Ok(())
    }

    /// Turn the camera in place by `angle` radians about a world axis.
    pub fn rotate(&mut self, axis: Vector3, angle: f64) {
        let r = Matrix3::rotation(axis, angle);
        self.orientation = Matrix3::from_rows(r * self.right(), r * self.up(), r * self.forward());
    }

    /// The ray through image coordinate `(u, v)`, where `(0, 0)` is the
    /// top left corner and `(1, 1)` the bottom right.  Coordinates are
    /// clamped to the unit square.
    pub fn generate_ray(&self, u: f64, v: f64) -> Ray {
        let u = num::clamp(u, 0.0, 1.0) - 0.5;
        let v = 0.5 - num::clamp(v, 0.0, 1.0);
        match self.projection {
            Projection::Orthographic => {
                let unit = |axis: Vector3| axis.normalize().unwrap_or(axis);
                let origin = self.eye
                    + unit(self.right()) * (u * self.view_width)
                    + unit(self.up()) * (v * self.view_height);
                Ray::new(origin, unit(self.forward()))
            }
        }
    }
}

fn basis(eye: Point3, target: Point3, up: Vector3) -> Result<Matrix3, RenderError> {
    let forward = (target - eye)
        .normalize()
        .ok_or_else(|| RenderError::scene("camera eye and target coincide"))?;
    let right = up
        .cross(forward)
        .normalize()
        .ok_or_else(|| RenderError::scene("camera up vector is parallel to the view"))?;
    let up = forward.cross(right);
    Ok(Matrix3::from_rows(right, up, forward))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::EPSILON;
    use std::f64::consts::PI;

    #[test]
    fn default_camera_looks_down_z() {
        let c = Camera::default();
        assert!(c.validate().is_ok());
        let r = c.generate_ray(0.5, 0.5);
        assert_eq!(r.origin, Vector3::new(0.0, 0.0, -3.0));
        assert_eq!(r.direction, Vector3::unit_z());
    }

    #[test]
    fn corners_map_to_the_view_rectangle() {
        let c = Camera::default();
        let tl = c.generate_ray(0.0, 0.0);
        assert!(tl.origin.approx_eq(Vector3::new(-1.5, 1.5, -3.0), EPSILON));
        let br = c.generate_ray(1.0, 1.0);
        assert!(br.origin.approx_eq(Vector3::new(1.5, -1.5, -3.0), EPSILON));
        // Out-of-range coordinates stick to the edge.
        assert_eq!(c.generate_ray(-3.0, 7.0).origin, c.generate_ray(0.0, 1.0).origin);
    }

    #[test]
    fn rays_are_parallel() {
        let c = Camera::look_at(
            Vector3::new(2.0, 2.0, 2.0),
            Vector3::zero(),
            Vector3::unit_y(),
            1.0,
            2.0,
        )
        .unwrap();
        let a = c.generate_ray(0.1, 0.9);
        let b = c.generate_ray(0.8, 0.2);
        assert!(a.direction.approx_eq(b.direction, EPSILON));
        assert!((a.direction.length() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn scaled_orientations_still_give_unit_rays() {
        let mut c = Camera::default();
        c.orientation = Matrix3::from_rows(
            Vector3::unit_x() * 2.0,
            Vector3::unit_y() * 0.5,
            Vector3::unit_z() * 4.0,
        );
        assert!(c.validate().is_ok());
        let r = c.generate_ray(1.0, 0.0);
        assert!(r.direction.approx_eq(Vector3::unit_z(), EPSILON));
        assert!(r.origin.approx_eq(Vector3::new(1.5, 1.5, -3.0), EPSILON));
    }

    #[test]
    fn look_at_builds_an_orthonormal_basis() {
        let c = Camera::look_at(
            Vector3::new(0.0, 0.0, -3.0),
            Vector3::zero(),
            Vector3::unit_y(),
            3.0,
            3.0,
        )
        .unwrap();
        assert!(c.right().approx_eq(Vector3::unit_x(), EPSILON));
        assert!(c.up().approx_eq(Vector3::unit_y(), EPSILON));
        assert!(c.forward().approx_eq(Vector3::unit_z(), EPSILON));
        assert_eq!(c.far, 6.0);
    }

    #[test]
    fn degenerate_cameras_are_rejected() {
        let eye = Vector3::new(0.0, 0.0, -3.0);
        assert!(Camera::look_at(eye, eye, Vector3::unit_y(), 1.0, 1.0).is_err());
        assert!(Camera::look_at(eye, Vector3::zero(), Vector3::unit_z(), 1.0, 1.0).is_err());
        assert!(Camera::look_at(eye, Vector3::zero(), Vector3::unit_y(), 0.0, 1.0).is_err());

        let mut c = Camera::default();
        assert!(c.set_view_size(-1.0, 1.0).is_err());
        assert!(c.set_clip(2.0, 1.0).is_err());
        assert_eq!(c, Camera::default());
    }

    #[test]
    fn half_turn_reverses_the_view() {
        let mut c = Camera::default();
        c.rotate(Vector3::unit_y(), PI);
        assert!(c.forward().approx_eq(-Vector3::unit_z(), EPSILON));
        assert!(c.up().approx_eq(Vector3::unit_y(), EPSILON));
    }
}
