use glam::{Mat4, Vec3};
use glyphrain_common::{CameraConfig, Transform};

/// Perspective camera. Only position and the Y rotation are driven at
/// runtime; the rest is set once from the profile and on resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    /// Euler angles in radians, XYZ order.
    pub rotation: Vec3,
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default(), 16.0 / 9.0)
    }
}

impl PerspectiveCamera {
    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            position: config.initial_position,
            rotation: Vec3::ZERO,
            fov_degrees: config.fov_degrees,
            aspect,
            near: config.near,
            far: config.far,
        }
    }

    pub fn world_matrix(&self) -> Mat4 {
        Transform {
            position: self.position,
            rotation: self.rotation,
            scale: Vec3::ONE,
        }
        .matrix()
    }

    /// Inverse of the world matrix.
    pub fn view_matrix(&self) -> Mat4 {
        self.world_matrix().inverse()
    }

    /// OpenGL clip depth (-1..1), matching the frustum plane extraction.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Unit view direction; -Z in camera space.
    pub fn forward(&self) -> Vec3 {
        self.world_matrix().transform_vector3(Vec3::NEG_Z).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera() {
        let cam = PerspectiveCamera::default();
        assert_eq!(cam.position, Vec3::new(-3.0, 0.0, 30.0));
        let vp = cam.view_projection();
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn view_is_inverse_of_world() {
        let cam = PerspectiveCamera {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Vec3::new(0.0, 0.4, 0.0),
            ..PerspectiveCamera::default()
        };
        let identity = cam.world_matrix() * cam.view_matrix();
        assert!(identity.abs_diff_eq(Mat4::IDENTITY, 1e-5));
    }

    #[test]
    fn yaw_turns_forward() {
        let mut cam = PerspectiveCamera::default();
        assert!(cam.forward().abs_diff_eq(Vec3::NEG_Z, 1e-6));
        cam.rotation.y = std::f32::consts::FRAC_PI_2;
        assert!(cam.forward().abs_diff_eq(Vec3::NEG_X, 1e-5));
    }
}
