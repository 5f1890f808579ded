use glam::{Mat4, Vec3, Vec4};

/// Plane in Hessian normal form: `normal · p + d = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize();
        Self {
            normal,
            d: -normal.dot(point),
        }
    }

    /// Signed distance; positive on the side the normal points to.
    pub fn distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }

    pub fn to_vec4(&self) -> Vec4 {
        self.normal.extend(self.d)
    }

    /// Plane expressed in the space `matrix` maps into.
    pub fn transformed(&self, matrix: Mat4) -> Plane {
        let v = matrix.inverse().transpose() * self.to_vec4();
        let length = v.truncate().length();
        Plane {
            normal: v.truncate() / length,
            d: v.w / length,
        }
    }
}

/// Affine matrix mirroring points across `plane`.
pub fn reflection_matrix(plane: &Plane) -> Mat4 {
    let n = plane.normal;
    let d = plane.d;
    Mat4::from_cols(
        Vec4::new(1.0 - 2.0 * n.x * n.x, -2.0 * n.x * n.y, -2.0 * n.x * n.z, 0.0),
        Vec4::new(-2.0 * n.x * n.y, 1.0 - 2.0 * n.y * n.y, -2.0 * n.y * n.z, 0.0),
        Vec4::new(-2.0 * n.x * n.z, -2.0 * n.y * n.z, 1.0 - 2.0 * n.z * n.z, 0.0),
        Vec4::new(-2.0 * d * n.x, -2.0 * d * n.y, -2.0 * d * n.z, 1.0),
    )
}

/// Replace the near plane of a `[0, 1]`-depth perspective projection with
/// `clip_plane` (given in view space), keeping the far plane as tight as possible.
///
/// Points on the positive side of the plane remain visible.
pub fn oblique_near_plane(projection: Mat4, clip_plane: &Plane) -> Mat4 {
    let c = clip_plane.to_vec4();

    // Far-plane corner opposite the clip plane, in view space.
    let corner_clip = Vec4::new(c.x.signum(), c.y.signum(), 1.0, 1.0);
    let q = projection.inverse() * corner_clip;

    let scaled = c * (projection.row(3).dot(q) / c.dot(q));

    let mut result = projection;
    result.x_axis.z = scaled.x;
    result.y_axis.z = scaled.y;
    result.z_axis.z = scaled.z;
    result.w_axis.z = scaled.w;
    result
}
