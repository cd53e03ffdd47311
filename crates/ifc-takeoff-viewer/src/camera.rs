// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Orbit camera with pan and zoom
//!
//! Spherical state around a pivot in Z-up model space. Yaw is measured from
//! +X towards +Y, pitch from the XY plane towards +Z.

use crate::config::ViewerConfig;
use crate::picking::Ray;
use ifc_takeoff_model::Bounds;
use nalgebra::{Point3, Vector3};
use std::f64::consts::FRAC_PI_2;

/// Isometric yaw of the home view
pub const HOME_YAW: f64 = -FRAC_PI_2 / 2.0;
/// Isometric pitch of the home view, about 35 degrees
pub const HOME_PITCH: f64 = 0.615;

/// Camera state; only the controller methods mutate it
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitCamera {
    pub yaw: f64,
    pub pitch: f64,
    /// Always positive
    pub distance: f64,
    pub target: Point3<f64>,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            yaw: HOME_YAW,
            pitch: HOME_PITCH,
            distance: 20.0,
            target: Point3::origin(),
        }
    }
}

/// Unit vector for a yaw and pitch
pub fn spherical(yaw: f64, pitch: f64) -> Vector3<f64> {
    Vector3::new(
        pitch.cos() * yaw.cos(),
        pitch.cos() * yaw.sin(),
        pitch.sin(),
    )
}

impl OrbitCamera {
    /// Eye position
    pub fn position(&self) -> Point3<f64> {
        self.target + spherical(self.yaw, self.pitch) * self.distance
    }

    /// Unit view direction, towards the target
    pub fn forward(&self) -> Vector3<f64> {
        -spherical(self.yaw, self.pitch)
    }

    /// Screen-right in world space
    pub fn right(&self) -> Vector3<f64> {
        // pitch never reaches a pole, so forward is never parallel to Z
        Vector3::new(-self.yaw.sin(), self.yaw.cos(), 0.0)
    }

    /// Screen-up in world space
    pub fn up(&self) -> Vector3<f64> {
        self.right().cross(&self.forward())
    }

    /// Primary drag: yaw freely, pitch within the pole margin
    pub fn orbit(&mut self, dx: f64, dy: f64, config: &ViewerConfig) {
        self.yaw += dx * config.yaw_sensitivity;
        let limit = FRAC_PI_2 - config.pitch_epsilon;
        self.pitch = (self.pitch + dy * config.pitch_sensitivity).clamp(-limit, limit);
    }

    /// Secondary or middle drag: move the target in the view plane
    pub fn pan(&mut self, dx: f64, dy: f64, config: &ViewerConfig) {
        let scale = config.pan_sensitivity * self.distance;
        self.target += (self.up() * dy - self.right() * dx) * scale;
    }

    /// Wheel: scale the distance, positive steps move closer
    pub fn zoom(&mut self, steps: f64, config: &ViewerConfig) {
        let factor = (1.0 - steps * config.zoom_sensitivity).max(0.0);
        self.distance = (self.distance * factor).clamp(config.min_distance, config.max_distance);
    }

    /// Recenter on a model
    ///
    /// The distance becomes twice the largest extent; a zero-extent model
    /// keeps the current distance.
    pub fn frame_bounds(&mut self, bounds: &Bounds) {
        if !bounds.is_valid() {
            return;
        }
        let [x, y, z] = bounds.center();
        self.target = Point3::new(x, y, z);
        let extent = bounds.max_dimension();
        if extent > 0.0 {
            self.distance = 2.0 * extent;
        }
    }

    /// Isometric preset, framed on `bounds` when given
    pub fn home(&mut self, bounds: Option<&Bounds>) {
        self.yaw = HOME_YAW;
        self.pitch = HOME_PITCH;
        if let Some(bounds) = bounds {
            self.frame_bounds(bounds);
        }
    }

    /// Ray from the eye through normalized device coordinates
    ///
    /// `ndc` runs from -1 to 1 on both axes with +Y up; `aspect` is
    /// width over height.
    pub fn ray(&self, ndc: [f64; 2], aspect: f64, config: &ViewerConfig) -> Ray {
        let half_height = (config.fov_radians() * 0.5).tan();
        let half_width = half_height * aspect;
        let direction = self.forward()
            + self.right() * (ndc[0] * half_width)
            + self.up() * (ndc[1] * half_height);
        Ray::new(self.position(), direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_position_on_sphere() {
        let camera = OrbitCamera {
            yaw: 0.0,
            pitch: 0.0,
            distance: 10.0,
            target: Point3::new(1.0, 2.0, 3.0),
        };
        assert_relative_eq!(camera.position(), Point3::new(11.0, 2.0, 3.0));
        assert_relative_eq!(camera.forward(), -Vector3::x());
        assert_relative_eq!(camera.up(), Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn test_basis_is_orthonormal() {
        let camera = OrbitCamera::default();
        let (f, r, u) = (camera.forward(), camera.right(), camera.up());
        assert_relative_eq!(f.dot(&r), 0.0, epsilon = 1e-12);
        assert_relative_eq!(r.dot(&u), 0.0, epsilon = 1e-12);
        assert_relative_eq!(u.norm(), 1.0, epsilon = 1e-12);
        assert!(u.z > 0.0);
    }

    #[test]
    fn test_pitch_stays_inside_poles() {
        let config = ViewerConfig::default();
        let mut camera = OrbitCamera::default();
        for _ in 0..1000 {
            camera.orbit(3.0, 500.0, &config);
            assert!(camera.pitch < FRAC_PI_2 && camera.pitch > -FRAC_PI_2);
        }
        for _ in 0..1000 {
            camera.orbit(0.0, -500.0, &config);
            assert!(camera.pitch < FRAC_PI_2 && camera.pitch > -FRAC_PI_2);
        }
        assert_relative_eq!(camera.pitch, -(FRAC_PI_2 - config.pitch_epsilon));
    }

    #[test]
    fn test_zoom_is_multiplicative_and_clamped() {
        let config = ViewerConfig::default();
        let mut camera = OrbitCamera::default();
        camera.distance = 10.0;
        camera.zoom(1.0, &config);
        assert_relative_eq!(camera.distance, 9.0);
        camera.zoom(-1.0, &config);
        assert_relative_eq!(camera.distance, 9.9, epsilon = 1e-12);
        camera.zoom(1e6, &config);
        assert_eq!(camera.distance, config.min_distance);
        for _ in 0..500 {
            camera.zoom(-5.0, &config);
        }
        assert_eq!(camera.distance, config.max_distance);
    }

    #[test]
    fn test_pan_moves_in_view_plane() {
        let config = ViewerConfig::default();
        let mut camera = OrbitCamera::default();
        let forward = camera.forward();
        camera.pan(40.0, -25.0, &config);
        let moved = camera.target - Point3::origin();
        assert!(moved.norm() > 0.0);
        assert_relative_eq!(moved.dot(&forward), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_frame_bounds() {
        let mut camera = OrbitCamera::default();
        camera.frame_bounds(&Bounds::from_points([0.0, 0.0, 0.0], [10.0, 4.0, 3.0]));
        assert_relative_eq!(camera.target, Point3::new(5.0, 2.0, 1.5));
        assert_relative_eq!(camera.distance, 20.0);

        // zero extent keeps the distance
        camera.frame_bounds(&Bounds::from_points([1.0; 3], [1.0; 3]));
        assert_relative_eq!(camera.target, Point3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(camera.distance, 20.0);

        camera.frame_bounds(&Bounds::empty());
        assert_relative_eq!(camera.target, Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_center_ray_hits_target() {
        let config = ViewerConfig::default();
        let camera = OrbitCamera::default();
        let ray = camera.ray([0.0, 0.0], 1.5, &config);
        assert_relative_eq!(ray.at(camera.distance), camera.target, epsilon = 1e-9);
    }
}
