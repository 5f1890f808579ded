use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use scroll_stage::cli::Cli;
use scroll_stage::config::StageConfig;
use scroll_stage::core::{Throttled, Viewport};
use scroll_stage::driver::FrameDriver;
use scroll_stage::render::{GpuBackend, HeadlessBackend, RenderCommand};
use scroll_stage::scroll::{Route, SectionProbe, VirtualPage};
use scroll_stage::stage::build_driver;

const FPS_UPDATE_INTERVAL: f32 = 1.0;
const HEADLESS_DELTA: f32 = 1.0 / 60.0;
/// Wheel pixels fed per headless frame once the intro is over
const HEADLESS_WHEEL: f32 = 40.0;

// === Application ===

struct App {
    cli: Cli,
    config: StageConfig,
    window: Option<Arc<Window>>,
    backend: Option<GpuBackend>,
    driver: Option<FrameDriver>,
    page: VirtualPage,
    last_frame_time: Instant,
    frame_count: u32,
    fps_elapsed: f32,
    fps_timer: Throttled,
}

impl App {
    fn new(cli: Cli, config: StageConfig) -> Self {
        let page = VirtualPage::new(config.page.clone(), cli.height.max(1) as f32);
        Self {
            cli,
            config,
            window: None,
            backend: None,
            driver: None,
            page,
            last_frame_time: Instant::now(),
            frame_count: 0,
            fps_elapsed: 0.0,
            fps_timer: Throttled::new(FPS_UPDATE_INTERVAL),
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window = Arc::new(
            event_loop
                .create_window(
                    Window::default_attributes()
                        .with_title("Scroll Stage")
                        .with_inner_size(winit::dpi::LogicalSize::new(self.cli.width, self.cli.height)),
                )
                .context("failed to create window")?,
        );

        let mut backend =
            pollster::block_on(GpuBackend::new(window.clone())).context("failed to initialise GPU backend")?;
        let mut driver = build_driver(&self.config, &mut backend, window_viewport(&window), !self.cli.no_post)
            .context("failed to build stage")?;

        if self.cli.skip_intro {
            driver.mapper_mut().skip_intro();
        }
        driver.enter_route(Route::Root, &mut self.page);

        self.window = Some(window);
        self.backend = Some(backend);
        self.driver = Some(driver);
        Ok(())
    }

    fn update_fps(&mut self) {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;

        self.frame_count += 1;
        self.fps_elapsed += delta;
        if self.fps_timer.try_tick(delta) && self.fps_elapsed > 0.0 {
            log::info!("FPS: {:.1}", self.frame_count as f32 / self.fps_elapsed);
            self.frame_count = 0;
            self.fps_elapsed = 0.0;
        }
    }
}

/// Logical size plus scale factor of the window
fn window_viewport(window: &Window) -> Viewport {
    let scale = window.scale_factor();
    let logical = window.inner_size().to_logical::<u32>(scale);
    Viewport::with_pixel_ratio(logical.width, logical.height, scale as f32)
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                log::error!("{:#}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let (Some(window), Some(backend), Some(driver)) = (&self.window, &mut self.backend, &mut self.driver)
        else {
            return;
        };

        // winit reports pointer positions in physical pixels
        let (width, height) = driver.context().viewport.drawing_size();
        driver
            .context_mut()
            .input
            .process_event(&event, &Viewport::new(width, height));

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => {
                driver.dispose(backend);
                self.driver = None;
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                let viewport = window_viewport(window);
                if let Err(e) = driver.resize(backend, viewport.width, viewport.height, viewport.pixel_ratio) {
                    log::error!("Resize failed: {}", e);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = driver.tick(backend, &mut self.page) {
                    log::error!("Render error: {}", e);
                }
                self.update_fps();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Step the stage without a window, scrolling steadily once the intro ends
fn run_headless(cli: &Cli, config: &StageConfig, frames: u32) -> anyhow::Result<()> {
    let viewport = Viewport::new(cli.width, cli.height);
    let (width, height) = viewport.drawing_size();
    let mut backend = HeadlessBackend::new(width, height);
    let mut page = VirtualPage::new(config.page.clone(), viewport.scroll_height());

    let mut driver = build_driver(config, &mut backend, viewport, !cli.no_post)?;
    if cli.skip_intro {
        driver.mapper_mut().skip_intro();
    }
    driver.enter_route(Route::Root, &mut page);

    let mut draws = 0usize;
    let mut scenes = 0usize;
    for frame in 0..frames {
        if driver.mapper().intro_complete() {
            driver.context_mut().input.wheel(HEADLESS_WHEEL);
        }
        driver
            .tick_with_delta(&mut backend, &mut page, HEADLESS_DELTA)
            .with_context(|| format!("frame {} failed", frame))?;

        for command in backend.take_commands() {
            match command {
                RenderCommand::Draw { .. } => draws += 1,
                RenderCommand::RenderScene { .. } => scenes += 1,
                _ => {}
            }
        }
    }

    let pose = driver.mapper().pose();
    log::info!(
        "Headless run: {} frames, {} scene renders, {} full-screen draws",
        frames,
        scenes,
        draws
    );
    println!(
        "frames={} scenes={} draws={} scroll={:.1} section={:?} camera=({:.2}, {:.2}, {:.2})",
        frames,
        scenes,
        draws,
        page.scroll(),
        driver.mapper().active_section(),
        pose.position.x,
        pose.position.y,
        pose.position.z,
    );
    if let Some(region) = driver.mapper().active_section().and_then(|s| page.measure(s)) {
        log::debug!("Active region: {:?}", region);
    }

    driver.dispose(&mut backend);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = StageConfig::load(&cli.config)?;

    if let Some(frames) = cli.headless {
        return run_headless(&cli, &config, frames);
    }

    let event_loop = EventLoop::new()?;
    let mut app = App::new(cli, config);

    log::info!("Scroll Stage - wheel to scroll, Escape to quit");
    event_loop.run_app(&mut app)?;

    Ok(())
}
