use std::any::Any;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::copy::not_initialised;
use super::{FullscreenMaterial, Pass, PassContext, PassIo, PassState};
use crate::camera::Camera;
use crate::core::Viewport;
use crate::error::{PipelineError, Result};
use crate::render::{Define, ProgramDesc, RenderBackend, TargetId, INPUT_TEXTURE};
use crate::types::PARAM_SLOTS;

const COPY_SHADER: &str = include_str!("shaders/copy.wgsl");
const VIGNETTE_SHADER: &str = include_str!("shaders/vignette.wgsl");
const RGB_SHIFT_SHADER: &str = include_str!("shaders/rgb_shift.wgsl");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderPassConfig {
    pub name: String,
    /// WGSL body defining `fs_main`; params are read with `param(PARAM_<NAME>)`
    pub fragment: String,
    /// Named scalars packed into the uniform block, in key order
    pub params: BTreeMap<String, f32>,
    pub enabled: bool,
    pub render_order: i32,
}

impl Default for ShaderPassConfig {
    fn default() -> Self {
        Self {
            name: "shader".to_string(),
            fragment: COPY_SHADER.to_string(),
            params: BTreeMap::new(),
            enabled: true,
            render_order: 0,
        }
    }
}

impl ShaderPassConfig {
    /// Darkens toward the corners
    pub fn vignette(offset: f32, darkness: f32) -> Self {
        Self {
            name: "vignette".to_string(),
            fragment: VIGNETTE_SHADER.to_string(),
            params: BTreeMap::from([
                ("offset".to_string(), offset),
                ("darkness".to_string(), darkness),
            ]),
            ..Default::default()
        }
    }

    /// Splits red and blue channels along `angle` (radians)
    pub fn rgb_shift(amount: f32, angle: f32) -> Self {
        Self {
            name: "rgb_shift".to_string(),
            fragment: RGB_SHIFT_SHADER.to_string(),
            params: BTreeMap::from([
                ("amount".to_string(), amount),
                ("angle".to_string(), angle),
            ]),
            ..Default::default()
        }
    }

    pub fn with_render_order(mut self, render_order: i32) -> Self {
        self.render_order = render_order;
        self
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: String| PipelineError::InvalidConfig {
            pass: self.name.clone(),
            reason,
        };
        if self.params.len() > PARAM_SLOTS {
            return Err(invalid(format!(
                "{} params exceed the {} available slots",
                self.params.len(),
                PARAM_SLOTS
            )));
        }
        if let Some(bad) = self.params.keys().find(|k| !is_identifier(k)) {
            return Err(invalid(format!("param name `{}` is not an identifier", bad)));
        }
        if let Some((name, _)) = self.params.iter().find(|(_, v)| !v.is_finite()) {
            return Err(invalid(format!("param `{}` is not finite", name)));
        }
        Ok(())
    }
}

/// Full-screen pass running a user fragment over the chain's current image
#[derive(Debug)]
pub struct ShaderPass {
    config: ShaderPassConfig,
    state: PassState,
    slots: BTreeMap<String, usize>,
    input: Option<TargetId>,
    material: Option<FullscreenMaterial>,
}

impl ShaderPass {
    pub fn new(config: ShaderPassConfig) -> Result<Self> {
        config.validate()?;
        let slots = config
            .params
            .keys()
            .enumerate()
            .map(|(slot, name)| (name.clone(), slot))
            .collect();
        Ok(Self {
            state: PassState {
                enabled: config.enabled,
                render_order: config.render_order,
                override_input: false,
            },
            config,
            slots,
            input: None,
            material: None,
        })
    }

    pub fn config(&self) -> &ShaderPassConfig {
        &self.config
    }

    pub fn param(&self, name: &str) -> Option<f32> {
        self.config.params.get(name).copied()
    }

    /// Update a declared param; takes effect on the next draw
    pub fn set_param(&mut self, name: &str, value: f32) -> Result<()> {
        let slot = *self.slots.get(name).ok_or_else(|| PipelineError::InvalidConfig {
            pass: self.config.name.clone(),
            reason: format!("unknown param `{}`", name),
        })?;
        self.config.params.insert(name.to_string(), value);
        if let Some(material) = self.material.as_mut() {
            material.uniforms.set_param(slot, value);
        }
        Ok(())
    }

    /// Sample a fixed target instead of the chain's image
    ///
    /// `None` hands the input back to the compositor. The binding survives
    /// a later `init`.
    pub fn set_input(&mut self, target: Option<TargetId>) {
        self.input = target;
        self.state.override_input = target.is_some();
        if let Some(material) = self.material.as_mut() {
            material.input = target;
        }
    }

    pub fn input(&self) -> Option<TargetId> {
        self.input
    }

    pub fn set_aux(&mut self, target: Option<TargetId>) {
        if let Some(material) = self.material.as_mut() {
            material.aux = target;
        }
    }

    fn program_desc(&self) -> ProgramDesc {
        let mut desc = ProgramDesc::new(self.config.name.clone(), self.config.fragment.clone());
        for (name, slot) in &self.slots {
            desc = desc.define(param_define(name), Define::U32(*slot as u32));
        }
        if self.config.fragment.contains(INPUT_TEXTURE) {
            desc = desc.require(INPUT_TEXTURE);
        }
        desc
    }
}

impl Pass for ShaderPass {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn state(&self) -> &PassState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PassState {
        &mut self.state
    }

    fn init(&mut self, backend: &mut dyn RenderBackend, _viewport: &Viewport) -> Result<()> {
        let program = backend.create_program(self.program_desc())?;
        let mut material = FullscreenMaterial::new(program);
        for (name, slot) in &self.slots {
            material.uniforms.set_param(*slot, self.config.params[name]);
        }
        material.input = self.input;
        self.material = Some(material);
        Ok(())
    }

    fn render(&mut self, ctx: &mut PassContext<'_>, io: PassIo, _camera: &Camera) -> Result<()> {
        let material = self
            .material
            .as_mut()
            .ok_or_else(|| not_initialised(&self.config.name))?;
        material.draw(ctx, io)
    }

    fn dispose(&mut self, backend: &mut dyn RenderBackend) {
        if let Some(material) = self.material.take() {
            material.dispose(backend);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn param_define(name: &str) -> String {
    format!("PARAM_{}", name.to_ascii_uppercase())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HeadlessBackend;

    #[test]
    fn test_presets_compile() {
        let mut backend = HeadlessBackend::new(64, 64);
        let viewport = Viewport::new(64, 64);
        for config in [
            ShaderPassConfig::vignette(1.0, 1.2),
            ShaderPassConfig::rgb_shift(0.005, 0.0),
        ] {
            let mut pass = ShaderPass::new(config).unwrap();
            pass.init(&mut backend, &viewport).unwrap();
        }
    }

    #[test]
    fn test_param_slots_follow_key_order() {
        let pass = ShaderPass::new(ShaderPassConfig::vignette(1.0, 1.2)).unwrap();
        let desc = pass.program_desc();
        assert_eq!(desc.defines["PARAM_DARKNESS"], Define::U32(0));
        assert_eq!(desc.defines["PARAM_OFFSET"], Define::U32(1));
    }

    #[test]
    fn test_set_param_writes_uniform_slot() {
        let mut backend = HeadlessBackend::new(64, 64);
        let mut pass = ShaderPass::new(ShaderPassConfig::vignette(1.0, 1.2)).unwrap();
        pass.init(&mut backend, &Viewport::new(64, 64)).unwrap();

        pass.set_param("offset", 0.5).unwrap();
        assert_eq!(pass.param("offset"), Some(0.5));
        let material = pass.material.as_ref().unwrap();
        assert_eq!(material.uniforms.param(1), 0.5);
        assert_eq!(material.uniforms.param(0), 1.2);

        assert!(pass.set_param("missing", 1.0).is_err());
    }

    #[test]
    fn test_too_many_params_rejected() {
        let params = (0..17).map(|i| (format!("p{}", i), 0.0)).collect();
        let config = ShaderPassConfig {
            params,
            ..Default::default()
        };
        assert!(matches!(
            ShaderPass::new(config),
            Err(PipelineError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_bad_param_name_rejected() {
        let config = ShaderPassConfig {
            params: BTreeMap::from([("2fast".to_string(), 1.0)]),
            ..Default::default()
        };
        assert!(ShaderPass::new(config).is_err());
    }

    #[test]
    fn test_config_ignores_unknown_keys() {
        let config: ShaderPassConfig =
            serde_json::from_str(r#"{ "name": "grain", "render_order": 3, "strength": 9 }"#).unwrap();
        assert_eq!(config.name, "grain");
        assert_eq!(config.render_order, 3);
        assert!(config.enabled);
    }

    #[test]
    fn test_broken_fragment_fails_init() {
        let config = ShaderPassConfig {
            fragment: "@fragment fn fs_main() -> {".to_string(),
            ..Default::default()
        };
        let mut pass = ShaderPass::new(config).unwrap();
        let mut backend = HeadlessBackend::new(8, 8);
        assert!(matches!(
            pass.init(&mut backend, &Viewport::new(8, 8)),
            Err(PipelineError::ShaderCompile { .. })
        ));
    }
}
