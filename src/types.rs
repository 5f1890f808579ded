use glam::{Mat4, Vec2};

use crate::scene::SceneObject;

/// Uniform block shared by every full-screen program
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PassUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub progress: f32,
    pub params: [[f32; 4]; 4],
}

/// Number of scalar slots in `PassUniforms::params`
pub const PARAM_SLOTS: usize = 16;

impl PassUniforms {
    pub fn new(resolution: Vec2, time: f32) -> Self {
        Self {
            resolution: resolution.to_array(),
            time,
            ..Default::default()
        }
    }

    pub fn with_progress(mut self, progress: f32) -> Self {
        self.progress = progress;
        self
    }

    /// Write scalar `value` into slot `index` (0..16); out-of-range slots are ignored.
    pub fn set_param(&mut self, index: usize, value: f32) {
        if index < PARAM_SLOTS {
            self.params[index / 4][index % 4] = value;
        }
    }

    pub fn param(&self, index: usize) -> f32 {
        if index < PARAM_SLOTS {
            self.params[index / 4][index % 4]
        } else {
            0.0
        }
    }
}

/// Camera uniform buffer data for the scene pipeline
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 3],
    pub _pad: f32,
}

/// Per-instance data for the scene pipeline
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceData {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl From<&SceneObject> for InstanceData {
    fn from(object: &SceneObject) -> Self {
        Self {
            model: object.transform.to_cols_array_2d(),
            color: object.color,
        }
    }
}

/// Unit cube vertex: position + normal
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Unit cube centred on the origin, 24 vertices / 36 indices
pub fn unit_cube() -> (Vec<Vertex>, Vec<u16>) {
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
        ([-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
        ([0.0, -1.0, 0.0], [0.0, 0.0, -1.0], [1.0, 0.0, 0.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v) in faces {
        let n = glam::Vec3::from_array(normal);
        let u = glam::Vec3::from_array(u);
        let v = glam::Vec3::from_array(v);
        let base = vertices.len() as u16;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let p = (n + u * su + v * sv) * 0.5;
            vertices.push(Vertex {
                position: p.to_array(),
                normal,
            });
        }
        // wind counter-clockwise when viewed from outside
        if n.dot(u.cross(v)) > 0.0 {
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        } else {
            indices.extend_from_slice(&[base, base + 2, base + 1, base, base + 3, base + 2]);
        }
    }
    (vertices, indices)
}

impl CameraUniform {
    pub fn new(view_proj: Mat4, position: glam::Vec3) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            position: position.to_array(),
            _pad: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_uniforms_layout() {
        // resolution(8) + time(4) + progress(4) + params(64)
        assert_eq!(std::mem::size_of::<PassUniforms>(), 80);
        assert_eq!(std::mem::size_of::<PassUniforms>() % 16, 0);
    }

    #[test]
    fn test_param_slots() {
        let mut u = PassUniforms::default();
        u.set_param(0, 1.0);
        u.set_param(5, 2.0);
        u.set_param(15, 3.0);
        u.set_param(16, 9.0); // ignored
        assert_eq!(u.params[0][0], 1.0);
        assert_eq!(u.params[1][1], 2.0);
        assert_eq!(u.params[3][3], 3.0);
        assert_eq!(u.param(5), 2.0);
        assert_eq!(u.param(99), 0.0);
    }

    #[test]
    fn test_camera_uniform_size() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 80);
    }

    #[test]
    fn test_unit_cube_counts() {
        let (vertices, indices) = unit_cube();
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        for v in &vertices {
            for c in v.position {
                assert!((c.abs() - 0.5).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_unit_cube_winding_faces_outward() {
        let (vertices, indices) = unit_cube();
        for tri in indices.chunks(3) {
            let a = glam::Vec3::from_array(vertices[tri[0] as usize].position);
            let b = glam::Vec3::from_array(vertices[tri[1] as usize].position);
            let c = glam::Vec3::from_array(vertices[tri[2] as usize].position);
            let n = glam::Vec3::from_array(vertices[tri[0] as usize].normal);
            assert!((b - a).cross(c - a).dot(n) > 0.0);
        }
    }
}
