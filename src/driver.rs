//! Per-frame sequencing of time, scroll, scene updates and rendering.

use crate::core::{clamp_delta, Clock, FrameInfo, StageContext, Viewport};
use crate::error::Result;
use crate::render::RenderBackend;
use crate::scene_renderer::SceneRenderer;
use crate::scroll::{Route, ScrollCameraMapper, SectionId, SectionProbe};

/// Callback run once per tick after the camera is placed
pub type UpdateCallback = Box<dyn FnMut(&FrameInfo, &StageContext)>;

/// Owns the frame loop's state and runs one tick at a time
///
/// Tick order: advance time, sync the section probe, step the camera mapper,
/// run update callbacks, update the scene and passes, render, then clear the
/// input accumulators.
pub struct FrameDriver {
    clock: Clock,
    context: StageContext,
    mapper: ScrollCameraMapper,
    renderer: SceneRenderer,
    callbacks: Vec<UpdateCallback>,
    active_section: Option<SectionId>,
}

impl FrameDriver {
    pub fn new(context: StageContext, mapper: ScrollCameraMapper, renderer: SceneRenderer) -> Self {
        Self {
            clock: Clock::new(),
            context,
            mapper,
            renderer,
            callbacks: Vec::new(),
            active_section: None,
        }
    }

    /// Register a per-tick update callback
    pub fn on_update(&mut self, callback: impl FnMut(&FrameInfo, &StageContext) + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    pub fn enter_route(&mut self, route: Route, probe: &mut dyn SectionProbe) {
        log::info!("Entering route {:?}", route);
        self.mapper.enter_route(route, probe);
    }

    /// Apply a new window size and resize every viewport-sized target now
    pub fn resize(
        &mut self,
        backend: &mut dyn RenderBackend,
        width: u32,
        height: u32,
        pixel_ratio: f32,
    ) -> Result<()> {
        let viewport = Viewport::with_pixel_ratio(width, height, pixel_ratio);
        if viewport == self.context.viewport {
            return Ok(());
        }
        log::info!("Viewport resized to {}x{} @{}", width, height, viewport.pixel_ratio);
        self.context.viewport = viewport;
        let (draw_width, draw_height) = viewport.drawing_size();
        backend.resize_screen(draw_width, draw_height);
        self.renderer.resize(backend, &viewport)
    }

    /// Run one frame using wall-clock time
    pub fn tick(&mut self, backend: &mut dyn RenderBackend, probe: &mut dyn SectionProbe) -> Result<()> {
        let delta = self.clock.tick();
        self.tick_with_delta(backend, probe, delta)
    }

    /// Run one frame with an explicit delta, clamped like the wall clock
    pub fn tick_with_delta(
        &mut self,
        backend: &mut dyn RenderBackend,
        probe: &mut dyn SectionProbe,
        delta: f32,
    ) -> Result<()> {
        let delta = clamp_delta(delta);
        let frame = self.context.time.advance(delta);
        self.context.time = frame;

        let viewport = self.context.viewport;
        probe.sync(delta, &self.context.input, &viewport);

        let section = self.mapper.update(
            delta,
            viewport.scroll_height(),
            &*probe,
            &mut self.renderer.active_mut().camera,
        );
        if section != self.active_section {
            log::debug!("Active section: {:?}", section);
            self.active_section = section;
        }

        for callback in &mut self.callbacks {
            callback(&frame, &self.context);
        }
        self.renderer.update(&frame, &self.context);

        let result = self.render_frame(backend, &frame);
        self.context.input.post_update();
        result
    }

    fn render_frame(&mut self, backend: &mut dyn RenderBackend, frame: &FrameInfo) -> Result<()> {
        backend.begin_frame()?;
        let rendered = self.renderer.render(backend, &self.context.viewport, frame);
        let presented = backend.end_frame();
        rendered.and(presented)
    }

    pub fn context(&self) -> &StageContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut StageContext {
        &mut self.context
    }

    pub fn mapper(&self) -> &ScrollCameraMapper {
        &self.mapper
    }

    pub fn mapper_mut(&mut self) -> &mut ScrollCameraMapper {
        &mut self.mapper
    }

    pub fn renderer(&self) -> &SceneRenderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut SceneRenderer {
        &mut self.renderer
    }

    pub fn frame(&self) -> FrameInfo {
        self.context.time
    }

    pub fn dispose(&mut self, backend: &mut dyn RenderBackend) {
        self.renderer.dispose(backend);
    }
}

impl std::fmt::Debug for FrameDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDriver")
            .field("frame", &self.context.time)
            .field("viewport", &self.context.viewport)
            .field("callbacks", &self.callbacks.len())
            .field("renderer", &self.renderer)
            .finish()
    }
}
