use glam::{Mat4, Vec3};

use crate::math::{hsv_to_rgba, reflection_matrix, Plane};
use crate::scene::{SceneObject, StaticScene};

const FLOOR_Y: f32 = -1.5;

/// Columns over a mirror floor
///
/// Each column also appears reflected across the floor plane, dimmed. Only
/// the centre is mirrored so the copy keeps its winding.
pub fn create_backdrop_scene() -> StaticScene {
    log::info!("Generating backdrop scene...");

    let floor = Plane::from_point_normal(Vec3::new(0.0, FLOOR_Y, 0.0), Vec3::Y);
    let mirror = reflection_matrix(&floor);
    let mut objects = Vec::new();

    objects.push(SceneObject::new(
        Mat4::from_scale_rotation_translation(
            Vec3::new(40.0, 0.05, 40.0),
            glam::Quat::IDENTITY,
            Vec3::new(0.0, FLOOR_Y - 0.025, 0.0),
        ),
        [0.05, 0.05, 0.07, 1.0],
    ));

    for x in -3..=3 {
        for z in 0..3 {
            let height = 1.0 + ((x * x + z) % 4) as f32;
            let position = Vec3::new(x as f32 * 2.5, FLOOR_Y + height * 0.5, -6.0 - z as f32 * 3.0);
            let transform = Mat4::from_scale_rotation_translation(
                Vec3::new(0.6, height, 0.6),
                glam::Quat::IDENTITY,
                position,
            );
            let hue = 0.55 + x as f32 * 0.02;
            let color = hsv_to_rgba(hue, 0.4, 0.7, 1.0);
            let dimmed = [color[0] * 0.35, color[1] * 0.35, color[2] * 0.35, 1.0];

            let reflected = Mat4::from_scale_rotation_translation(
                Vec3::new(0.6, height, 0.6),
                glam::Quat::IDENTITY,
                mirror.transform_point3(position),
            );

            objects.push(SceneObject::new(transform, color));
            objects.push(SceneObject::new(reflected, dimmed));
        }
    }

    StaticScene::new("backdrop", objects)
}
