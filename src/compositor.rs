//! Pass queue over a ping-ponged pair of offscreen buffers.

use glam::Vec2;

use crate::core::{FrameInfo, StageContext, Viewport};
use crate::error::{PipelineError, Result};
use crate::pass::{CopyPass, Pass, PassContext, PassIo, SharedUniforms};
use crate::render::{Destination, RenderBackend, RendererState, TargetDesc, TargetId};
use crate::scene::SceneProvider;

/// Post-processing chain
///
/// Owns the scene-capture target and the `from`/`to` pair. Exactly one of
/// the pair holds the latest image at any time; [`Postprocessing::swap`]
/// exchanges their roles and refreshes the shared texture bindings.
pub struct Postprocessing {
    scene_target: TargetId,
    from: TargetId,
    to: TargetId,
    shared: SharedUniforms,
    copy: CopyPass,
    /// Registration order
    passes: Vec<Box<dyn Pass>>,
    size: (u32, u32),
    disposed: bool,
}

impl Postprocessing {
    /// Allocate the capture target and ping-pong pair at the viewport's
    /// drawing size. `samples` applies to the scene capture only.
    pub fn new(backend: &mut dyn RenderBackend, viewport: &Viewport, samples: u32) -> Result<Self> {
        let (width, height) = viewport.drawing_size();

        // Allocation may rebind the destination.
        let saved = RendererState::capture(backend);
        let scene_target =
            backend.create_target(&TargetDesc::new("scene capture", width, height, samples).with_depth());
        let from = backend.create_target(&TargetDesc::new("ping", width, height, 1));
        let to = backend.create_target(&TargetDesc::new("pong", width, height, 1));
        saved.restore(backend);

        let mut copy = CopyPass::named("scene copy");
        if let Err(e) = copy.init(backend, viewport) {
            for target in [scene_target, from, to] {
                backend.dispose_target(target);
            }
            return Err(e);
        }

        log::debug!("Postprocessing targets allocated at {}x{}", width, height);

        Ok(Self {
            scene_target,
            from,
            to,
            shared: SharedUniforms {
                from_texture: from,
                to_texture: to,
                resolution: Vec2::new(width as f32, height as f32),
                time: 0.0,
            },
            copy,
            passes: Vec::new(),
            size: (width, height),
            disposed: false,
        })
    }

    /// Initialise and register a pass
    ///
    /// Names are unique within the queue; a duplicate is rejected before init.
    /// A pass whose init fails is disposed and never enters the queue.
    pub fn add_pass(
        &mut self,
        backend: &mut dyn RenderBackend,
        viewport: &Viewport,
        mut pass: Box<dyn Pass>,
    ) -> Result<()> {
        if self.disposed {
            return Err(PipelineError::Disposed);
        }
        if self.passes.iter().any(|p| p.name() == pass.name()) {
            log::error!("Pass '{}' is already registered", pass.name());
            return Err(PipelineError::InvalidConfig {
                pass: pass.name().to_string(),
                reason: "duplicate pass name".to_string(),
            });
        }
        if let Err(e) = pass.init(backend, viewport) {
            log::error!("Pass '{}' failed to initialise: {}", pass.name(), e);
            pass.dispose(backend);
            return Err(e);
        }
        let (width, height) = self.size;
        if (width, height) != viewport.drawing_size() {
            pass.resize(backend, width, height)?;
        }
        log::info!("Added pass '{}' (order {})", pass.name(), pass.render_order());
        self.passes.push(pass);
        Ok(())
    }

    /// Unregister and dispose a pass; false if no pass has that name
    pub fn remove_pass(&mut self, backend: &mut dyn RenderBackend, name: &str) -> bool {
        match self.passes.iter().position(|p| p.name() == name) {
            Some(index) => {
                let mut pass = self.passes.remove(index);
                pass.dispose(backend);
                true
            }
            None => false,
        }
    }

    pub fn pass(&self, name: &str) -> Option<&dyn Pass> {
        self.passes
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref())
    }

    pub fn pass_mut(&mut self, name: &str) -> Option<&mut (dyn Pass + 'static)> {
        self.passes
            .iter_mut()
            .find(|p| p.name() == name)
            .map(|p| p.as_mut())
    }

    /// Typed access to a registered pass
    pub fn pass_as_mut<T: Pass + 'static>(&mut self, name: &str) -> Option<&mut T> {
        self.pass_mut(name)
            .and_then(|p| p.as_any_mut().downcast_mut::<T>())
    }

    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.pass_mut(name) {
            Some(pass) => {
                pass.set_enabled(enabled);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn has_active_passes(&self) -> bool {
        self.passes.iter().any(|p| p.enabled())
    }

    /// Indices of enabled passes, stably sorted by render order
    pub fn execution_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.passes.len())
            .filter(|&i| self.passes[i].enabled())
            .collect();
        order.sort_by_key(|&i| self.passes[i].render_order());
        order
    }

    pub fn ordered_names(&self) -> Vec<String> {
        self.execution_order()
            .into_iter()
            .map(|i| self.passes[i].name().to_string())
            .collect()
    }

    /// Exchange the ping-pong roles and refresh the shared bindings
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.from, &mut self.to);
        self.shared.from_texture = self.from;
        self.shared.to_texture = self.to;
    }

    pub fn from_target(&self) -> TargetId {
        self.from
    }

    pub fn to_target(&self) -> TargetId {
        self.to
    }

    pub fn scene_target(&self) -> TargetId {
        self.scene_target
    }

    pub fn shared(&self) -> &SharedUniforms {
        &self.shared
    }

    /// Current drawing-buffer size of every owned target
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Resize every owned target and every pass
    pub fn resize(&mut self, backend: &mut dyn RenderBackend, width: u32, height: u32) -> Result<()> {
        if self.disposed {
            return Err(PipelineError::Disposed);
        }
        let (width, height) = (width.max(1), height.max(1));

        let saved = RendererState::capture(backend);
        let resized = [self.scene_target, self.from, self.to]
            .into_iter()
            .try_for_each(|target| backend.resize_target(target, width, height));
        saved.restore(backend);
        resized?;

        self.size = (width, height);
        self.shared.resolution = Vec2::new(width as f32, height as f32);

        self.copy.resize(backend, width, height)?;
        for pass in &mut self.passes {
            pass.resize(backend, width, height)?;
        }
        log::debug!("Postprocessing resized to {}x{}", width, height);
        Ok(())
    }

    /// Resize if the targets no longer match `(width, height)`; true when a
    /// resize happened
    pub fn ensure_size(&mut self, backend: &mut dyn RenderBackend, width: u32, height: u32) -> Result<bool> {
        if self.size == (width.max(1), height.max(1)) {
            return Ok(false);
        }
        log::warn!(
            "Stale postprocessing size {:?}, expected {}x{}; resizing",
            self.size,
            width,
            height
        );
        self.resize(backend, width, height)?;
        Ok(true)
    }

    pub fn update(&mut self, frame: &FrameInfo, ctx: &StageContext) {
        self.shared.time = frame.time;
        for pass in &mut self.passes {
            pass.update(frame, ctx);
        }
    }

    /// Render the provider's scene and run the enabled chain
    ///
    /// With no enabled pass the scene goes straight to the screen. Otherwise
    /// the capture is copied into `from`, and each pass reads `from`, writes
    /// `to` (the last one writes the screen), then the pair swaps. Clear
    /// colour and auto-clear are restored even when a pass fails.
    pub fn render(
        &mut self,
        backend: &mut dyn RenderBackend,
        provider: &dyn SceneProvider,
        frame: &FrameInfo,
    ) -> Result<()> {
        if self.disposed {
            return Err(PipelineError::Disposed);
        }
        let order = self.execution_order();
        let camera = provider.camera();

        backend.set_render_target(if order.is_empty() {
            Destination::Screen
        } else {
            Destination::Target(self.scene_target)
        });
        let captured = backend.render_scene(provider.scene(), &camera.matrices());
        // A previous chain may have left auto-clear off.
        backend.set_auto_clear(true);
        captured?;

        if order.is_empty() {
            return Ok(());
        }

        backend.set_render_target(Destination::Screen);
        let shared = self.shared;
        self.copy.render(
            &mut PassContext {
                backend: &mut *backend,
                shared: &shared,
                frame: *frame,
            },
            PassIo {
                input: self.scene_target,
                output: self.from,
                render_to_screen: false,
                override_input: false,
            },
            camera,
        )?;

        let saved = RendererState::capture(backend);
        backend.set_auto_clear(false);

        let last = order.len() - 1;
        let mut result = Ok(());
        for (position, &index) in order.iter().enumerate() {
            let shared = self.shared;
            let io = PassIo {
                input: self.from,
                output: self.to,
                render_to_screen: position == last,
                override_input: self.passes[index].state().override_input,
            };
            let mut ctx = PassContext {
                backend: &mut *backend,
                shared: &shared,
                frame: *frame,
            };
            if let Err(e) = self.passes[index].render(&mut ctx, io, camera) {
                log::error!("Pass '{}' failed: {}", self.passes[index].name(), e);
                result = Err(e);
                break;
            }
            self.swap();
        }

        saved.restore(backend);
        result
    }

    /// Release every pass and target; later calls are no-ops
    pub fn dispose(&mut self, backend: &mut dyn RenderBackend) {
        if self.disposed {
            return;
        }
        self.copy.dispose(backend);
        for pass in &mut self.passes {
            pass.dispose(backend);
        }
        self.passes.clear();
        for target in [self.scene_target, self.from, self.to] {
            backend.dispose_target(target);
        }
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl std::fmt::Debug for Postprocessing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Postprocessing")
            .field("scene_target", &self.scene_target)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("passes", &self.ordered_names())
            .field("size", &self.size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HeadlessBackend;

    #[test]
    fn test_double_swap_is_identity() {
        let mut backend = HeadlessBackend::new(64, 64);
        let mut post = Postprocessing::new(&mut backend, &Viewport::new(64, 64), 1).unwrap();
        let before = *post.shared();

        post.swap();
        assert_eq!(post.shared().from_texture, before.to_texture);
        assert_eq!(post.shared().to_texture, before.from_texture);
        assert_eq!(post.from_target(), post.shared().from_texture);

        post.swap();
        assert_eq!(*post.shared(), before);
    }

    #[test]
    fn test_new_restores_destination() {
        let mut backend = HeadlessBackend::new(64, 64);
        backend.set_render_target(Destination::Screen);
        let post = Postprocessing::new(&mut backend, &Viewport::new(64, 64), 4).unwrap();
        assert_eq!(backend.render_target(), Destination::Screen);
        assert_eq!(backend.target_desc(post.scene_target()).unwrap().samples, 4);
        assert!(backend.target_desc(post.scene_target()).unwrap().depth);
    }

    #[test]
    fn test_dispose_once() {
        let mut backend = HeadlessBackend::new(32, 32);
        let mut post = Postprocessing::new(&mut backend, &Viewport::new(32, 32), 1).unwrap();
        post.dispose(&mut backend);
        post.dispose(&mut backend);
        assert!(backend.live_targets().is_empty());
        assert!(post.is_disposed());
    }
}
