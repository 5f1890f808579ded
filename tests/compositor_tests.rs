use scroll_stage::camera::{Camera, CameraPose};
use scroll_stage::compositor::Postprocessing;
use scroll_stage::core::{FrameInfo, StageContext, Viewport};
use scroll_stage::error::PipelineError;
use scroll_stage::pass::{
    OutputPass, OutputPassConfig, Pass, ShaderPass, ShaderPassConfig, TransitionPass,
    TransitionPassConfig,
};
use scroll_stage::render::{
    Destination, HeadlessBackend, OutputSettings, PixelFormat, RenderBackend, RenderCommand,
    TargetDesc, ToneMapping,
};
use scroll_stage::scene::{LogicalScene, StaticScene};

fn scene(name: &str) -> LogicalScene {
    LogicalScene::new(
        Box::new(StaticScene::new(name, Vec::new())),
        Camera::new(CameraPose::default(), 16.0 / 9.0),
    )
}

fn copy_pass(name: &str, render_order: i32) -> Box<ShaderPass> {
    let config = ShaderPassConfig {
        name: name.to_string(),
        ..Default::default()
    };
    Box::new(ShaderPass::new(config.with_render_order(render_order)).unwrap())
}

fn setup(width: u32, height: u32) -> (HeadlessBackend, Postprocessing, Viewport) {
    let viewport = Viewport::new(width, height);
    let mut backend = HeadlessBackend::new(width, height);
    let post = Postprocessing::new(&mut backend, &viewport, 1).unwrap();
    (backend, post, viewport)
}

fn render_frame(
    backend: &mut HeadlessBackend,
    post: &mut Postprocessing,
    provider: &LogicalScene,
    frame: FrameInfo,
) {
    backend.begin_frame().unwrap();
    post.render(backend, provider, &frame).unwrap();
    backend.end_frame().unwrap();
}

#[cfg(test)]
mod ordering_tests {
    use super::*;

    #[test]
    fn test_execution_order_is_stable_by_render_order() {
        let (mut backend, mut post, viewport) = setup(64, 64);
        post.add_pass(&mut backend, &viewport, copy_pass("a", 5)).unwrap();
        post.add_pass(&mut backend, &viewport, copy_pass("b", 1)).unwrap();
        post.add_pass(&mut backend, &viewport, copy_pass("c", 1)).unwrap();

        assert_eq!(post.ordered_names(), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_disabling_keeps_relative_order() {
        let (mut backend, mut post, viewport) = setup(64, 64);
        for (name, order) in [("a", 2), ("b", 0), ("c", 1), ("d", 0)] {
            post.add_pass(&mut backend, &viewport, copy_pass(name, order)).unwrap();
        }

        assert!(post.set_enabled("d", false));
        assert_eq!(post.ordered_names(), vec!["b", "c", "a"]);

        assert!(post.set_enabled("d", true));
        assert_eq!(post.ordered_names(), vec!["b", "d", "c", "a"]);
        assert!(!post.set_enabled("missing", false));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let (mut backend, mut post, viewport) = setup(64, 64);
        post.add_pass(&mut backend, &viewport, copy_pass("a", 0)).unwrap();
        let targets = backend.live_targets().len();

        let duplicate = post.add_pass(&mut backend, &viewport, copy_pass("a", 3));
        assert!(matches!(
            duplicate,
            Err(PipelineError::InvalidConfig { ref pass, .. }) if pass == "a"
        ));
        assert_eq!(post.len(), 1);
        assert_eq!(post.pass("a").unwrap().render_order(), 0);
        assert_eq!(backend.live_targets().len(), targets);

        // The name is free again once the first pass is removed.
        assert!(post.remove_pass(&mut backend, "a"));
        post.add_pass(&mut backend, &viewport, copy_pass("a", 3)).unwrap();
        assert_eq!(post.ordered_names(), vec!["a"]);
    }

    #[test]
    fn test_two_swaps_restore_roles() {
        let (_backend, mut post, _viewport) = setup(64, 64);
        let (from, to) = (post.from_target(), post.to_target());

        post.swap();
        assert_eq!((post.from_target(), post.to_target()), (to, from));
        assert_eq!(post.shared().from_texture, to);
        assert_eq!(post.shared().to_texture, from);

        post.swap();
        assert_eq!((post.from_target(), post.to_target()), (from, to));
    }
}

#[cfg(test)]
mod render_tests {
    use super::*;

    #[test]
    fn test_chain_end_to_end() {
        let (mut backend, mut post, viewport) = setup(1920, 1080);
        post.add_pass(&mut backend, &viewport, copy_pass("p0", 0)).unwrap();
        post.add_pass(&mut backend, &viewport, copy_pass("p1", 0)).unwrap();
        post.add_pass(&mut backend, &viewport, copy_pass("p2", 10)).unwrap();
        backend.take_commands();

        let main = scene("main");
        render_frame(&mut backend, &mut post, &main, FrameInfo::new(1, 0.016, 0.016));

        assert_eq!(backend.draw_sequence(), vec!["scene copy", "p0", "p1", "p2"]);

        let commands = backend.commands();
        let scene_renders: Vec<usize> = commands
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, RenderCommand::RenderScene { .. }))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(scene_renders.len(), 1);
        assert!(matches!(
            &commands[scene_renders[0]],
            RenderCommand::RenderScene { destination: Destination::Target(t), .. } if *t == post.scene_target()
        ));
        let first_pass = commands
            .iter()
            .position(|c| matches!(c, RenderCommand::Draw { program, .. } if program == "p0"))
            .unwrap();
        assert!(scene_renders[0] < first_pass);

        let screen_draws: Vec<&str> = commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::Draw {
                    program,
                    destination: Destination::Screen,
                    ..
                } => Some(program.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(screen_draws, vec!["p2"]);

        assert_eq!(backend.content(Destination::Screen), Some("p2(p1(p0(scene copy(main))))"));
        for id in [post.scene_target(), post.from_target(), post.to_target()] {
            assert_eq!(backend.target_size(id), Some((1920, 1080)));
        }
    }

    #[test]
    fn test_explicit_input_replaces_chain_image() {
        let (mut backend, mut post, viewport) = setup(64, 64);
        let own = backend.create_target(&TargetDesc::new("own", 64, 64, 1));
        post.add_pass(&mut backend, &viewport, copy_pass("p0", 0)).unwrap();
        post.add_pass(&mut backend, &viewport, copy_pass("fixed", 1)).unwrap();

        let other = scene("other");
        backend.begin_frame().unwrap();
        backend.set_render_target(Destination::Target(own));
        backend
            .render_scene(other.scene.as_ref(), &other.camera.matrices())
            .unwrap();
        backend.set_render_target(Destination::Screen);
        backend.end_frame().unwrap();

        let fixed = post.pass_as_mut::<ShaderPass>("fixed").unwrap();
        fixed.set_input(Some(own));
        assert!(fixed.state().override_input);
        backend.take_commands();

        let main = scene("main");
        render_frame(&mut backend, &mut post, &main, FrameInfo::default());
        assert!(backend.commands().iter().any(|c| matches!(
            c,
            RenderCommand::Draw { program, input, .. } if program == "fixed" && *input == Some(own)
        )));
        assert_eq!(backend.content(Destination::Screen), Some("fixed(other)"));

        // Clearing the binding hands the input back to the chain.
        let fixed = post.pass_as_mut::<ShaderPass>("fixed").unwrap();
        fixed.set_input(None);
        assert!(!fixed.state().override_input);
        render_frame(&mut backend, &mut post, &main, FrameInfo::default());
        assert_eq!(backend.content(Destination::Screen), Some("fixed(p0(scene copy(main)))"));
    }

    #[test]
    fn test_explicit_input_set_before_registration() {
        let (mut backend, mut post, viewport) = setup(64, 64);
        let own = backend.create_target(&TargetDesc::new("own", 64, 64, 1));
        let mut pass = copy_pass("fixed", 0);
        pass.set_input(Some(own));
        post.add_pass(&mut backend, &viewport, pass).unwrap();

        render_frame(&mut backend, &mut post, &scene("main"), FrameInfo::default());
        assert_eq!(backend.content(Destination::Screen), Some("fixed(empty)"));
    }

    #[test]
    fn test_no_passes_renders_directly_to_screen() {
        let (mut backend, mut post, _viewport) = setup(64, 64);
        backend.take_commands();

        let main = scene("main");
        render_frame(&mut backend, &mut post, &main, FrameInfo::default());

        assert!(backend.draw_sequence().is_empty());
        assert!(backend.commands().iter().any(|c| matches!(
            c,
            RenderCommand::RenderScene { destination: Destination::Screen, .. }
        )));
        assert_eq!(backend.content(Destination::Screen), Some("main"));
    }

    #[test]
    fn test_disabled_passes_fall_back_to_direct_render() {
        let (mut backend, mut post, viewport) = setup(64, 64);
        post.add_pass(&mut backend, &viewport, copy_pass("p0", 0)).unwrap();
        post.set_enabled("p0", false);
        assert!(!post.has_active_passes());

        render_frame(&mut backend, &mut post, &scene("main"), FrameInfo::default());
        assert_eq!(backend.content(Destination::Screen), Some("main"));
    }

    #[test]
    fn test_auto_clear_forced_and_state_restored() {
        let (mut backend, mut post, viewport) = setup(64, 64);
        post.add_pass(&mut backend, &viewport, copy_pass("p0", 0)).unwrap();
        post.add_pass(&mut backend, &viewport, copy_pass("p1", 0)).unwrap();

        let clear = [0.2, 0.1, 0.3, 1.0];
        backend.set_clear_color(clear);
        backend.set_auto_clear(false);
        backend.take_commands();

        let main = scene("main");
        render_frame(&mut backend, &mut post, &main, FrameInfo::default());
        assert!(backend.auto_clear());
        assert_eq!(backend.clear_color(), clear);

        // Second frame: the capture clears, passes inside the chain do not.
        backend.take_commands();
        render_frame(&mut backend, &mut post, &main, FrameInfo::default());
        let clears: Vec<Destination> = backend
            .commands()
            .iter()
            .filter_map(|c| match c {
                RenderCommand::Clear { destination, .. } => Some(*destination),
                _ => None,
            })
            .collect();
        assert!(clears.contains(&Destination::Target(post.scene_target())));
        assert!(!clears.contains(&Destination::Screen));
        assert!(backend.auto_clear());
    }

    #[test]
    fn test_broken_shader_rejected_at_registration() {
        let (mut backend, mut post, viewport) = setup(64, 64);
        let broken = ShaderPass::new(ShaderPassConfig {
            name: "broken".to_string(),
            fragment: "@fragment fn fs_main() -> @location(0) vec4<f32> { return undefined_value; }".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert!(post.add_pass(&mut backend, &viewport, Box::new(broken)).is_err());
        assert!(post.is_empty());

        post.add_pass(&mut backend, &viewport, copy_pass("ok", 0)).unwrap();
        render_frame(&mut backend, &mut post, &scene("main"), FrameInfo::default());
        assert!(!backend.draw_sequence().iter().any(|label| label == "broken"));
    }

    #[test]
    fn test_output_pass_relinks_on_settings_change() {
        let (mut backend, mut post, viewport) = setup(64, 64);
        let output = OutputPass::new(OutputPassConfig::default()).unwrap();
        post.add_pass(&mut backend, &viewport, Box::new(output)).unwrap();
        let main = scene("main");

        render_frame(&mut backend, &mut post, &main, FrameInfo::default());
        assert!(!backend
            .commands()
            .iter()
            .any(|c| matches!(c, RenderCommand::RelinkProgram { .. })));

        backend.set_output_settings(OutputSettings {
            tone_mapping: ToneMapping::Reinhard,
            ..Default::default()
        });
        backend.take_commands();
        render_frame(&mut backend, &mut post, &main, FrameInfo::default());

        let relinks: Vec<&RenderCommand> = backend
            .commands()
            .iter()
            .filter(|c| matches!(c, RenderCommand::RelinkProgram { label, .. } if label == "output"))
            .collect();
        assert_eq!(relinks.len(), 1);

        // Unchanged settings do not relink again.
        backend.take_commands();
        render_frame(&mut backend, &mut post, &main, FrameInfo::default());
        assert!(!backend
            .commands()
            .iter()
            .any(|c| matches!(c, RenderCommand::RelinkProgram { .. })));
    }

    #[test]
    fn test_transition_renders_second_scene_each_frame() {
        let (mut backend, mut post, viewport) = setup(64, 64);
        let transition = TransitionPass::new(TransitionPassConfig {
            progress: Some(0.5),
            clear_color: [1.0, 0.0, 0.0, 1.0],
            ..Default::default()
        })
        .unwrap()
        .with_scene(scene("backdrop"));
        post.add_pass(&mut backend, &viewport, Box::new(transition)).unwrap();

        let clear = [0.0, 0.0, 0.1, 1.0];
        backend.set_clear_color(clear);
        let main = scene("main");
        let ctx = StageContext::new(viewport);
        let mut frame = FrameInfo::default();
        backend.take_commands();

        for _ in 0..2 {
            frame = frame.advance(0.016);
            post.update(&frame, &ctx);
            render_frame(&mut backend, &mut post, &main, frame);
        }

        let backdrop_renders = backend
            .commands()
            .iter()
            .filter(|c| matches!(c, RenderCommand::RenderScene { scene, .. } if scene == "backdrop"))
            .count();
        assert_eq!(backdrop_renders, 2);
        assert_eq!(backend.clear_color(), clear);
        assert!(backend.auto_clear());

        let private = post.pass_as_mut::<TransitionPass>("transition").unwrap().scene_target();
        assert!(backend.commands().iter().any(|c| matches!(
            c,
            RenderCommand::Draw { program, aux, progress, destination: Destination::Screen, .. }
                if program == "transition" && *aux == private && *progress == 0.5
        )));
        assert_eq!(
            backend.content(Destination::Screen),
            Some("transition(scene copy(main), backdrop)")
        );
    }

    #[test]
    fn test_transition_without_scene_passes_through() {
        let (mut backend, mut post, viewport) = setup(64, 64);
        post.add_pass(
            &mut backend,
            &viewport,
            Box::new(TransitionPass::new(TransitionPassConfig::default()).unwrap()),
        )
        .unwrap();

        render_frame(&mut backend, &mut post, &scene("main"), FrameInfo::default());
        assert_eq!(backend.content(Destination::Screen), Some("transition(scene copy(main))"));
    }

    #[test]
    fn test_mirrored_transition_captures_in_half_float() {
        let (mut backend, mut post, viewport) = setup(64, 64);
        let transition = TransitionPass::new(TransitionPassConfig {
            progress: Some(1.0),
            mirror_height: Some(-1.5),
            ..Default::default()
        })
        .unwrap()
        .with_scene(scene("backdrop"));
        post.add_pass(&mut backend, &viewport, Box::new(transition)).unwrap();

        let private = post
            .pass_as_mut::<TransitionPass>("transition")
            .unwrap()
            .scene_target()
            .unwrap();
        assert_eq!(
            backend.target_desc(private).map(|d| d.format),
            Some(PixelFormat::Rgba16Float)
        );

        render_frame(&mut backend, &mut post, &scene("main"), FrameInfo::default());
        assert_eq!(backend.content(Destination::Target(private)), Some("backdrop"));
        assert_eq!(
            backend.content(Destination::Screen),
            Some("transition(scene copy(main), backdrop)")
        );
    }

    #[test]
    fn test_dispose_releases_every_target() {
        let (mut backend, mut post, viewport) = setup(64, 64);
        let transition = TransitionPass::new(TransitionPassConfig::default())
            .unwrap()
            .with_scene(scene("b"));
        post.add_pass(&mut backend, &viewport, Box::new(transition)).unwrap();
        assert_eq!(backend.live_targets().len(), 4);

        post.dispose(&mut backend);
        post.dispose(&mut backend);
        assert!(backend.live_targets().is_empty());
        assert!(post.is_disposed());

        backend.begin_frame().unwrap();
        assert!(post.render(&mut backend, &scene("main"), &FrameInfo::default()).is_err());
        backend.end_frame().unwrap();
    }
}
