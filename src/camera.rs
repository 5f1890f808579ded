use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::math::{oblique_near_plane, reflection_matrix, Plane};
use crate::types::CameraUniform;

pub const DEFAULT_FOV_Y: f32 = 0.785_398; // 45 degrees
pub const DEFAULT_NEAR: f32 = 0.1;
pub const DEFAULT_FAR: f32 = 200.0;

/// Position plus intrinsic XYZ Euler rotation
///
/// Poses blend component-wise, which is only valid while neighbouring poses
/// differ by small rotations (no wrap past ±π).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub rotation: Vec3,
}

impl CameraPose {
    pub const fn new(position: [f32; 3], rotation: [f32; 3]) -> Self {
        Self {
            position: Vec3::from_array(position),
            rotation: Vec3::from_array(rotation),
        }
    }

    /// Component-wise blend of position and Euler angles
    pub fn lerp(&self, other: &CameraPose, t: f32) -> CameraPose {
        CameraPose {
            position: self.position.lerp(other.position, t),
            rotation: self.rotation.lerp(other.rotation, t),
        }
    }

    pub fn quaternion(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Camera-to-world transform
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.quaternion(), self.position)
    }
}

/// View and projection pair handed to the backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    pub view: Mat4,
    pub projection: Mat4,
    pub position: Vec3,
}

impl CameraMatrices {
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    pub fn to_uniform(&self) -> CameraUniform {
        CameraUniform::new(self.view_projection(), self.position)
    }
}

/// Perspective camera looking down its local -Z
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pose: CameraPose,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(pose: CameraPose, aspect: f32) -> Self {
        Self {
            pose,
            fov_y: DEFAULT_FOV_Y,
            aspect: sanitize_aspect(aspect),
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = sanitize_aspect(aspect);
    }

    pub fn forward(&self) -> Vec3 {
        self.pose.quaternion() * Vec3::NEG_Z
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.pose.world_matrix().inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn matrices(&self) -> CameraMatrices {
        CameraMatrices {
            view: self.view_matrix(),
            projection: self.projection_matrix(),
            position: self.pose.position,
        }
    }

    /// Mirror camera for rendering a planar reflection across `plane`
    ///
    /// Geometry behind the mirror is clipped by an oblique near plane.
    pub fn reflected(&self, plane: &Plane) -> CameraMatrices {
        let mirror = reflection_matrix(plane);
        let view = self.view_matrix() * mirror;
        let view_plane = plane.transformed(view);
        CameraMatrices {
            view,
            projection: oblique_near_plane(self.projection_matrix(), &view_plane),
            position: mirror.transform_point3(self.pose.position),
        }
    }
}

fn sanitize_aspect(aspect: f32) -> f32 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_forward_is_neg_z() {
        let camera = Camera::new(CameraPose::default(), 1.0);
        assert!((camera.forward() - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn test_pose_lerp_endpoints_and_midpoint() {
        let a = CameraPose::new([0.0, 0.0, 10.0], [0.0, 0.0, 0.0]);
        let b = CameraPose::new([2.0, 4.0, 6.0], [0.2, -0.4, 0.0]);
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
        let mid = a.lerp(&b, 0.5);
        assert!((mid.position - Vec3::new(1.0, 2.0, 8.0)).length() < 1e-6);
        assert!((mid.rotation - Vec3::new(0.1, -0.2, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_view_matrix_moves_camera_to_origin() {
        let pose = CameraPose::new([1.0, 2.0, 3.0], [0.1, 0.2, 0.0]);
        let camera = Camera::new(pose, 1.5);
        let eye = camera.view_matrix().transform_point3(pose.position);
        assert!(eye.length() < 1e-5);
    }

    #[test]
    fn test_invalid_aspect_sanitized() {
        let mut camera = Camera::new(CameraPose::default(), 0.0);
        assert_eq!(camera.aspect, 1.0);
        camera.set_aspect(f32::NAN);
        assert_eq!(camera.aspect, 1.0);
        camera.set_aspect(2.0);
        assert_eq!(camera.aspect, 2.0);
    }

    #[test]
    fn test_reflected_camera_mirrors_position() {
        let camera = Camera::new(CameraPose::new([0.0, 3.0, 5.0], [-0.3, 0.0, 0.0]), 1.0);
        let ground = Plane::from_point_normal(Vec3::ZERO, Vec3::Y);
        let mirrored = camera.reflected(&ground);
        assert!((mirrored.position - Vec3::new(0.0, -3.0, 5.0)).length() < 1e-5);
    }

    #[test]
    fn test_reflected_camera_sees_mirrored_point() {
        let camera = Camera::new(CameraPose::new([0.0, 3.0, 5.0], [-0.3, 0.0, 0.0]), 1.0);
        let ground = Plane::from_point_normal(Vec3::ZERO, Vec3::Y);
        let mirrored = camera.reflected(&ground);

        // A point above the mirror projects where the normal camera sees its image below
        let point = Vec3::new(0.5, 1.0, 0.0);
        let image = Vec3::new(0.5, -1.0, 0.0);
        let a = mirrored.view.transform_point3(point);
        let b = camera.view_matrix().transform_point3(image);
        assert!((a - b).length() < 1e-4);
    }
}
