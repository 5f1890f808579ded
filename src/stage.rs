//! Assembles a frame driver from a stage configuration.

use crate::camera::Camera;
use crate::compositor::Postprocessing;
use crate::config::{PassConfig, StageConfig};
use crate::core::{StageContext, Viewport};
use crate::driver::FrameDriver;
use crate::error::Result;
use crate::pass::{OutputPass, Pass, ShaderPass, TransitionPass};
use crate::render::RenderBackend;
use crate::scene::LogicalScene;
use crate::scene_renderer::SceneRenderer;
use crate::scenes::{create_backdrop_scene, create_floating_scene};
use crate::scroll::{default_transitions, KeyframeId, KeyframeSet, ScrollCameraMapper};

/// Construct one pass from its configuration
///
/// Transition passes get their own backdrop scene.
pub fn build_pass(config: &PassConfig, viewport: &Viewport) -> Result<Box<dyn Pass>> {
    let pass: Box<dyn Pass> = match config {
        PassConfig::Vignette(c) => Box::new(ShaderPass::new(c.shader_config())?),
        PassConfig::RgbShift(c) => Box::new(ShaderPass::new(c.shader_config())?),
        PassConfig::Shader(c) => Box::new(ShaderPass::new(c.clone())?),
        PassConfig::Transition(c) => {
            Box::new(TransitionPass::new(c.clone())?.with_scene(backdrop(viewport)))
        }
        PassConfig::Output(c) => Box::new(OutputPass::new(c.clone())?),
    };
    Ok(pass)
}

fn backdrop(viewport: &Viewport) -> LogicalScene {
    let keyframes = KeyframeSet::default();
    LogicalScene::new(
        Box::new(create_backdrop_scene()),
        Camera::new(keyframes.get(KeyframeId::Home), viewport.aspect()),
    )
}

/// Build the full stage: scenes, pass chain, camera mapper and driver
///
/// Any pass that fails to build aborts construction after releasing what
/// was already allocated.
pub fn build_driver(
    config: &StageConfig,
    backend: &mut dyn RenderBackend,
    viewport: Viewport,
    use_post: bool,
) -> Result<FrameDriver> {
    backend.set_clear_color(config.clear_color);
    backend.set_output_settings(config.output);

    let mut post = Postprocessing::new(backend, &viewport, config.samples)?;
    if use_post {
        for pass_config in &config.passes {
            let added = build_pass(pass_config, &viewport)
                .and_then(|pass| post.add_pass(backend, &viewport, pass));
            if let Err(e) = added {
                post.dispose(backend);
                return Err(e);
            }
        }
    }
    log::info!("Pass chain: {:?}", post.ordered_names());

    let keyframes = KeyframeSet::default();
    let main = LogicalScene::new(
        Box::new(create_floating_scene(config.objects, config.motion)),
        Camera::new(keyframes.get(KeyframeId::Intro), viewport.aspect()),
    );
    let mut renderer = SceneRenderer::new(post, main);
    renderer.add_scene(backdrop(&viewport));

    let mapper = ScrollCameraMapper::new(keyframes, default_transitions(), config.intro);
    Ok(FrameDriver::new(StageContext::new(viewport), mapper, renderer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VignetteConfig;
    use crate::error::PipelineError;
    use crate::pass::ShaderPassConfig;
    use crate::render::HeadlessBackend;

    #[test]
    fn test_default_chain() {
        let mut backend = HeadlessBackend::new(320, 240);
        let driver = build_driver(&StageConfig::default(), &mut backend, Viewport::new(320, 240), true).unwrap();
        assert_eq!(
            driver.renderer().post().ordered_names(),
            vec!["rgb_shift", "vignette", "output"]
        );
        assert_eq!(driver.renderer().scenes().len(), 2);
    }

    #[test]
    fn test_no_post() {
        let mut backend = HeadlessBackend::new(320, 240);
        let driver = build_driver(&StageConfig::default(), &mut backend, Viewport::new(320, 240), false).unwrap();
        assert!(driver.renderer().post().is_empty());
    }

    #[test]
    fn test_broken_pass_aborts_and_releases_targets() {
        let mut config = StageConfig::default();
        config.passes = vec![
            PassConfig::Vignette(VignetteConfig::default()),
            PassConfig::Shader(ShaderPassConfig {
                name: "broken".to_string(),
                fragment: "fn fs_main( {".to_string(),
                ..Default::default()
            }),
        ];
        let mut backend = HeadlessBackend::new(64, 64);
        assert!(build_driver(&config, &mut backend, Viewport::new(64, 64), true).is_err());
        assert!(backend.live_targets().is_empty());
    }

    #[test]
    fn test_duplicate_pass_names_abort() {
        let mut config = StageConfig::default();
        config.passes = vec![
            PassConfig::Vignette(VignetteConfig::default()),
            PassConfig::Vignette(VignetteConfig {
                render_order: 5,
                ..Default::default()
            }),
        ];
        let mut backend = HeadlessBackend::new(64, 64);
        let result = build_driver(&config, &mut backend, Viewport::new(64, 64), true);
        assert!(matches!(
            result,
            Err(PipelineError::InvalidConfig { ref pass, .. }) if pass == "vignette"
        ));
        assert!(backend.live_targets().is_empty());
    }

    #[test]
    fn test_transition_with_bad_samples_aborts() {
        let config = StageConfig::from_json(r#"{"passes": [{"kind": "transition", "samples": 3}]}"#).unwrap();
        let mut backend = HeadlessBackend::new(64, 64);
        assert!(build_driver(&config, &mut backend, Viewport::new(64, 64), true).is_err());
        assert!(backend.live_targets().is_empty());
    }
}
