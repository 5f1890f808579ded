//! Backend without a GPU.
//!
//! Tracks target storage and what each buffer currently holds, validates
//! programs with naga, and records every command. Used by tests and by the
//! `--headless` mode of the binary.

use std::collections::BTreeMap;

use super::backend::{FullscreenInputs, OutputSettings, RenderBackend, Rgba};
use super::program::{self, Program, ProgramDesc, ProgramId};
use super::target::{Destination, TargetDesc, TargetId};
use crate::camera::CameraMatrices;
use crate::error::{PipelineError, Result};
use crate::scene::Scene;

/// One recorded backend operation
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    BeginFrame,
    EndFrame,
    CreateTarget { id: TargetId, width: u32, height: u32 },
    ResizeTarget { id: TargetId, width: u32, height: u32 },
    DisposeTarget { id: TargetId },
    CompileProgram { label: String },
    RelinkProgram { label: String, version: u64 },
    Clear { destination: Destination, color: Rgba },
    RenderScene { scene: String, destination: Destination },
    Draw {
        program: String,
        destination: Destination,
        input: Option<TargetId>,
        aux: Option<TargetId>,
        progress: f32,
    },
}

#[derive(Debug, Clone)]
struct HeadlessTarget {
    desc: TargetDesc,
    /// Bumped on every storage (re)allocation
    generation: u32,
    /// Symbolic description of the image the buffer holds
    content: Option<String>,
}

#[derive(Debug)]
pub struct HeadlessBackend {
    targets: BTreeMap<TargetId, HeadlessTarget>,
    next_target: u32,
    next_program: u32,
    screen: (u32, u32),
    screen_content: Option<String>,
    destination: Destination,
    clear_color: Rgba,
    auto_clear: bool,
    output: OutputSettings,
    in_frame: bool,
    commands: Vec<RenderCommand>,
}

impl HeadlessBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            targets: BTreeMap::new(),
            next_target: 1,
            next_program: 1,
            screen: (width.max(1), height.max(1)),
            screen_content: None,
            destination: Destination::Screen,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            auto_clear: true,
            output: OutputSettings::default(),
            in_frame: false,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Labels of full-screen draws in order, for the recorded commands
    pub fn draw_sequence(&self) -> Vec<String> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::Draw { program, .. } => Some(program.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn target_desc(&self, id: TargetId) -> Option<&TargetDesc> {
        self.targets.get(&id).map(|t| &t.desc)
    }

    pub fn target_generation(&self, id: TargetId) -> Option<u32> {
        self.targets.get(&id).map(|t| t.generation)
    }

    /// Ids of targets that have not been disposed
    pub fn live_targets(&self) -> Vec<TargetId> {
        self.targets.keys().copied().collect()
    }

    /// What a destination currently holds, e.g. `output(copy(home))`
    pub fn content(&self, destination: Destination) -> Option<&str> {
        match destination {
            Destination::Screen => self.screen_content.as_deref(),
            Destination::Target(id) => self.targets.get(&id).and_then(|t| t.content.as_deref()),
        }
    }

    fn write(&mut self, content: Option<String>) {
        match self.destination {
            Destination::Screen => self.screen_content = content,
            Destination::Target(id) => match self.targets.get_mut(&id) {
                Some(target) => target.content = content,
                None => log::warn!("write to unknown target {:?}", id),
            },
        }
    }

    fn read(&self, id: Option<TargetId>) -> String {
        id.and_then(|id| self.targets.get(&id))
            .and_then(|t| t.content.clone())
            .unwrap_or_else(|| "empty".to_string())
    }

    fn check_destination(&self) -> Result<()> {
        if !self.in_frame {
            return Err(PipelineError::NoActiveFrame);
        }
        if let Destination::Target(id) = self.destination {
            if !self.targets.contains_key(&id) {
                return Err(PipelineError::UnknownTarget(id));
            }
        }
        Ok(())
    }

    fn clear_if_auto(&mut self) {
        if self.auto_clear {
            self.commands.push(RenderCommand::Clear {
                destination: self.destination,
                color: self.clear_color,
            });
            self.write(None);
        }
    }
}

impl RenderBackend for HeadlessBackend {
    fn begin_frame(&mut self) -> Result<()> {
        self.in_frame = true;
        self.commands.push(RenderCommand::BeginFrame);
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        if !self.in_frame {
            return Err(PipelineError::NoActiveFrame);
        }
        self.in_frame = false;
        self.commands.push(RenderCommand::EndFrame);
        Ok(())
    }

    fn screen_size(&self) -> (u32, u32) {
        self.screen
    }

    fn resize_screen(&mut self, width: u32, height: u32) {
        self.screen = (width.max(1), height.max(1));
        self.screen_content = None;
    }

    fn create_target(&mut self, desc: &TargetDesc) -> TargetId {
        let id = TargetId::new(self.next_target);
        self.next_target += 1;
        self.targets.insert(
            id,
            HeadlessTarget {
                desc: desc.clone(),
                generation: 0,
                content: None,
            },
        );
        self.commands.push(RenderCommand::CreateTarget {
            id,
            width: desc.width,
            height: desc.height,
        });
        id
    }

    fn resize_target(&mut self, id: TargetId, width: u32, height: u32) -> Result<()> {
        let target = self
            .targets
            .get_mut(&id)
            .ok_or(PipelineError::UnknownTarget(id))?;
        target.desc = target.desc.resized(width, height);
        target.generation += 1;
        target.content = None;
        let (width, height) = target.desc.size();
        self.commands.push(RenderCommand::ResizeTarget { id, width, height });
        Ok(())
    }

    fn dispose_target(&mut self, id: TargetId) {
        if self.targets.remove(&id).is_some() {
            self.commands.push(RenderCommand::DisposeTarget { id });
        } else {
            log::warn!("dispose of unknown target {:?}", id);
        }
    }

    fn target_size(&self, id: TargetId) -> Option<(u32, u32)> {
        self.targets.get(&id).map(|t| t.desc.size())
    }

    fn set_render_target(&mut self, destination: Destination) {
        self.destination = destination;
    }

    fn render_target(&self) -> Destination {
        self.destination
    }

    fn clear_color(&self) -> Rgba {
        self.clear_color
    }

    fn set_clear_color(&mut self, color: Rgba) {
        self.clear_color = color;
    }

    fn auto_clear(&self) -> bool {
        self.auto_clear
    }

    fn set_auto_clear(&mut self, enabled: bool) {
        self.auto_clear = enabled;
    }

    fn output_settings(&self) -> OutputSettings {
        self.output
    }

    fn set_output_settings(&mut self, settings: OutputSettings) {
        self.output = settings;
    }

    fn create_program(&mut self, desc: ProgramDesc) -> Result<Program> {
        program::compile(&desc)?;
        let id = ProgramId::new(self.next_program);
        self.next_program += 1;
        self.commands.push(RenderCommand::CompileProgram {
            label: desc.label.clone(),
        });
        Ok(Program::new(id, desc))
    }

    fn dispose_program(&mut self, _program: &Program) {}

    fn render_scene(&mut self, scene: &dyn Scene, _camera: &CameraMatrices) -> Result<()> {
        self.check_destination()?;
        self.clear_if_auto();
        self.commands.push(RenderCommand::RenderScene {
            scene: scene.name().to_string(),
            destination: self.destination,
        });
        self.write(Some(scene.name().to_string()));
        Ok(())
    }

    fn draw_fullscreen(&mut self, program: &mut Program, inputs: &FullscreenInputs) -> Result<()> {
        self.check_destination()?;
        if program.needs_update() {
            program::compile(program.desc())?;
            program.mark_linked();
            self.commands.push(RenderCommand::RelinkProgram {
                label: program.label().to_string(),
                version: program.version(),
            });
        }

        // Sample before clearing: a destination may also be an input.
        let content = match inputs.aux {
            Some(_) => format!(
                "{}({}, {})",
                program.label(),
                self.read(inputs.input),
                self.read(inputs.aux)
            ),
            None => format!("{}({})", program.label(), self.read(inputs.input)),
        };

        self.clear_if_auto();
        self.commands.push(RenderCommand::Draw {
            program: program.label().to_string(),
            destination: self.destination,
            input: inputs.input,
            aux: inputs.aux,
            progress: inputs.uniforms.progress,
        });
        self.write(Some(content));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{Camera, CameraPose};
    use crate::scene::StaticScene;

    const BODY: &str = r#"
@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    return textureSample(t_input, s_input, in.uv);
}
"#;

    #[test]
    fn test_resize_keeps_identity() {
        let mut backend = HeadlessBackend::new(100, 100);
        let id = backend.create_target(&TargetDesc::new("a", 100, 100, 1));
        assert_eq!(backend.target_generation(id), Some(0));

        backend.resize_target(id, 300, 200).unwrap();
        assert_eq!(backend.target_size(id), Some((300, 200)));
        assert_eq!(backend.target_generation(id), Some(1));
        assert_eq!(backend.live_targets(), vec![id]);
    }

    #[test]
    fn test_dispose_removes_target() {
        let mut backend = HeadlessBackend::new(100, 100);
        let id = backend.create_target(&TargetDesc::new("a", 10, 10, 1));
        backend.dispose_target(id);
        assert!(backend.live_targets().is_empty());
        assert!(matches!(
            backend.resize_target(id, 1, 1),
            Err(PipelineError::UnknownTarget(_))
        ));
    }

    #[test]
    fn test_draw_outside_frame_fails() {
        let mut backend = HeadlessBackend::new(10, 10);
        let mut program = backend.create_program(ProgramDesc::new("copy", BODY)).unwrap();
        let result = backend.draw_fullscreen(&mut program, &FullscreenInputs::default());
        assert!(matches!(result, Err(PipelineError::NoActiveFrame)));
    }

    #[test]
    fn test_content_tracking() {
        let mut backend = HeadlessBackend::new(10, 10);
        let target = backend.create_target(&TargetDesc::new("scene", 10, 10, 1));
        let scene = StaticScene::new("home", Vec::new());
        let camera = Camera::new(CameraPose::default(), 1.0).matrices();
        let mut program = backend.create_program(ProgramDesc::new("copy", BODY)).unwrap();

        backend.begin_frame().unwrap();
        backend.set_render_target(Destination::Target(target));
        backend.render_scene(&scene, &camera).unwrap();
        backend.set_render_target(Destination::Screen);
        backend
            .draw_fullscreen(
                &mut program,
                &FullscreenInputs {
                    input: Some(target),
                    ..Default::default()
                },
            )
            .unwrap();
        backend.end_frame().unwrap();

        assert_eq!(backend.content(Destination::Target(target)), Some("home"));
        assert_eq!(backend.content(Destination::Screen), Some("copy(home)"));
    }

    #[test]
    fn test_auto_clear_records_clear() {
        let mut backend = HeadlessBackend::new(10, 10);
        let scene = StaticScene::new("s", Vec::new());
        let camera = Camera::new(CameraPose::default(), 1.0).matrices();

        backend.begin_frame().unwrap();
        backend.render_scene(&scene, &camera).unwrap();
        backend.set_auto_clear(false);
        backend.render_scene(&scene, &camera).unwrap();
        backend.end_frame().unwrap();

        let clears = backend
            .commands()
            .iter()
            .filter(|c| matches!(c, RenderCommand::Clear { .. }))
            .count();
        assert_eq!(clears, 1);
    }

    #[test]
    fn test_relink_on_define_change() {
        use crate::render::program::Define;
        use std::collections::BTreeMap;

        let mut backend = HeadlessBackend::new(10, 10);
        let mut program = backend.create_program(ProgramDesc::new("tone", BODY)).unwrap();
        let mut defines = BTreeMap::new();
        defines.insert("MODE".to_string(), Define::U32(2));
        program.set_defines(defines);

        backend.begin_frame().unwrap();
        backend.draw_fullscreen(&mut program, &FullscreenInputs::default()).unwrap();
        backend.draw_fullscreen(&mut program, &FullscreenInputs::default()).unwrap();
        backend.end_frame().unwrap();

        let relinks: Vec<_> = backend
            .commands()
            .iter()
            .filter(|c| matches!(c, RenderCommand::RelinkProgram { .. }))
            .collect();
        assert_eq!(relinks.len(), 1);
        assert!(!program.needs_update());
    }

    #[test]
    fn test_invalid_program_rejected() {
        let mut backend = HeadlessBackend::new(10, 10);
        let result = backend.create_program(ProgramDesc::new("bad", "not wgsl"));
        assert!(matches!(result, Err(PipelineError::ShaderCompile { .. })));
    }
}
