use glam::{Mat4, Quat, Vec3};

use crate::core::{FrameInfo, StageContext};
use crate::math::hsv_to_rgba;
use crate::motion::{BrownianConfig, BrownianMotion};
use crate::scene::{Scene, SceneObject};

const GOLDEN_RATIO_CONJUGATE: f32 = 0.618_034;
/// Maximum pointer tilt in radians
const POINTER_TILT: f32 = 0.12;

struct FloatingItem {
    base: Mat4,
    motion: BrownianMotion,
}

/// Cubes drifting on a ring, each under its own brownian motion
///
/// The whole group tilts a little toward the pointer.
pub struct FloatingScene {
    name: String,
    items: Vec<FloatingItem>,
    objects: Vec<SceneObject>,
    tilt: Quat,
}

impl FloatingScene {
    pub fn new(name: impl Into<String>, count: usize, radius: f32, motion: BrownianConfig) -> Self {
        let mut items = Vec::with_capacity(count);
        let mut objects = Vec::with_capacity(count);
        for i in 0..count {
            let angle = i as f32 / count.max(1) as f32 * std::f32::consts::TAU;
            let height = ((i % 3) as f32 - 1.0) * 0.8;
            let scale = 0.6 + 0.25 * ((i * 7) % 4) as f32;
            let base = Mat4::from_scale_rotation_translation(
                Vec3::splat(scale),
                Quat::from_rotation_y(angle),
                Vec3::new(angle.cos() * radius, height, angle.sin() * radius),
            );
            let hue = (i as f32 * GOLDEN_RATIO_CONJUGATE) % 1.0;

            items.push(FloatingItem {
                base,
                motion: BrownianMotion::new(motion),
            });
            objects.push(SceneObject::new(base, hsv_to_rgba(hue, 0.55, 0.9, 1.0)));
        }

        Self {
            name: name.into(),
            items,
            objects,
            tilt: Quat::IDENTITY,
        }
    }

    /// Reseed every item's motion
    pub fn rehash(&mut self) {
        for item in &mut self.items {
            item.motion.rehash();
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Scene for FloatingScene {
    fn name(&self) -> &str {
        &self.name
    }

    fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    fn update(&mut self, frame: &FrameInfo, ctx: &StageContext) {
        let pointer = ctx.input.pointer();
        let target = Quat::from_euler(
            glam::EulerRot::XYZ,
            -pointer.y * POINTER_TILT,
            pointer.x * POINTER_TILT,
            0.0,
        );
        self.tilt = self.tilt.slerp(target, (frame.delta * 4.0).min(1.0));
        let group = Mat4::from_quat(self.tilt);

        for (item, object) in self.items.iter_mut().zip(&mut self.objects) {
            item.motion.update(frame.delta);
            object.transform = group * item.motion.apply(item.base);
        }
    }
}

impl std::fmt::Debug for FloatingScene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FloatingScene")
            .field("name", &self.name)
            .field("items", &self.items.len())
            .finish()
    }
}

pub fn create_floating_scene(count: usize, motion: BrownianConfig) -> FloatingScene {
    log::info!("Generating floating scene with {} objects...", count);
    FloatingScene::new("floating", count, 3.5, motion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Viewport;

    #[test]
    fn test_object_count() {
        let scene = create_floating_scene(12, BrownianConfig::default());
        assert_eq!(scene.objects().len(), 12);
        assert_eq!(scene.len(), 12);
    }

    #[test]
    fn test_update_moves_objects() {
        let mut scene = create_floating_scene(12, BrownianConfig::default());
        let before: Vec<_> = scene.objects().iter().map(|o| o.transform).collect();

        let ctx = StageContext::new(Viewport::new(100, 100));
        let mut frame = FrameInfo::default();
        for _ in 0..10 {
            frame = frame.advance(0.05);
            scene.update(&frame, &ctx);
        }

        let moved = scene
            .objects()
            .iter()
            .zip(&before)
            .filter(|(o, b)| o.transform != **b)
            .count();
        assert!(moved > 0);
    }

    #[test]
    fn test_pointer_tilts_group() {
        let mut still = FloatingScene::new("a", 1, 2.0, BrownianConfig::default());
        let mut tilted = FloatingScene::new("b", 1, 2.0, BrownianConfig::default());
        still.items[0].motion = BrownianMotion::with_seed(3, BrownianConfig::default());
        tilted.items[0].motion = BrownianMotion::with_seed(3, BrownianConfig::default());

        let ctx = StageContext::new(Viewport::new(100, 100));
        let mut moved_ctx = StageContext::new(Viewport::new(100, 100));
        let viewport = moved_ctx.viewport;
        moved_ctx.input.pointer_moved(100.0, 0.0, &viewport);

        let frame = FrameInfo::default().advance(0.05);
        still.update(&frame, &ctx);
        tilted.update(&frame, &moved_ctx);

        assert_ne!(still.objects()[0].transform, tilted.objects()[0].transform);
    }
}
