use std::any::Any;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::copy::not_initialised;
use super::{FullscreenMaterial, Pass, PassContext, PassIo, PassState};
use crate::camera::Camera;
use crate::core::Viewport;
use crate::error::{PipelineError, Result};
use crate::render::{ColorSpace, Define, OutputSettings, ProgramDesc, RenderBackend, INPUT_TEXTURE};

const OUTPUT_SHADER: &str = include_str!("shaders/output.wgsl");
const EXPOSURE_SLOT: usize = 0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputPassConfig {
    pub name: String,
    pub enabled: bool,
    pub render_order: i32,
    pub exposure: f32,
}

impl Default for OutputPassConfig {
    fn default() -> Self {
        Self {
            name: "output".to_string(),
            enabled: true,
            render_order: 0,
            exposure: 1.0,
        }
    }
}

/// Tone mapping and colour-space conversion as shader permutations
///
/// The operator and colour space come from the backend's output settings.
/// When they differ from the cached copy the defines are rebuilt and the
/// program relinks before the next draw.
#[derive(Debug)]
pub struct OutputPass {
    config: OutputPassConfig,
    state: PassState,
    material: Option<FullscreenMaterial>,
    settings: Option<OutputSettings>,
}

impl OutputPass {
    pub fn new(config: OutputPassConfig) -> Result<Self> {
        if !config.exposure.is_finite() || config.exposure < 0.0 {
            return Err(PipelineError::InvalidConfig {
                pass: config.name.clone(),
                reason: format!("exposure {} must be finite and non-negative", config.exposure),
            });
        }
        Ok(Self {
            state: PassState {
                enabled: config.enabled,
                render_order: config.render_order,
                override_input: false,
            },
            config,
            material: None,
            settings: None,
        })
    }

    pub fn exposure(&self) -> f32 {
        self.config.exposure
    }

    pub fn set_exposure(&mut self, exposure: f32) {
        self.config.exposure = exposure.max(0.0);
        if let Some(material) = self.material.as_mut() {
            material.uniforms.set_param(EXPOSURE_SLOT, self.config.exposure);
        }
    }

    /// Settings the current defines were built from
    pub fn cached_settings(&self) -> Option<OutputSettings> {
        self.settings
    }

    pub fn program_version(&self) -> Option<u64> {
        self.material.as_ref().map(|m| m.program.version())
    }

    /// Rebuild defines if the backend's settings changed; true when they did
    fn sync_settings(&mut self, current: OutputSettings) -> bool {
        if self.settings == Some(current) {
            return false;
        }
        self.settings = Some(current);
        match self.material.as_mut() {
            Some(material) => {
                log::debug!(
                    "Output settings changed to {:?}/{:?}; relinking",
                    current.tone_mapping,
                    current.color_space
                );
                material.program.set_defines(output_defines(current))
            }
            None => false,
        }
    }
}

impl Pass for OutputPass {
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
        let settings = backend.output_settings();
        let mut desc = ProgramDesc::new(self.config.name.clone(), OUTPUT_SHADER).require(INPUT_TEXTURE);
        desc.defines = output_defines(settings);
        let mut material = FullscreenMaterial::new(backend.create_program(desc)?);
        material.uniforms.set_param(EXPOSURE_SLOT, self.config.exposure);
        self.material = Some(material);
        self.settings = Some(settings);
        Ok(())
    }

    fn render(&mut self, ctx: &mut PassContext<'_>, io: PassIo, _camera: &Camera) -> Result<()> {
        self.sync_settings(ctx.backend.output_settings());
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

fn output_defines(settings: OutputSettings) -> BTreeMap<String, Define> {
    BTreeMap::from([
        (
            "TONE_MAPPING".to_string(),
            Define::U32(settings.tone_mapping.shader_id()),
        ),
        (
            "OUTPUT_SRGB".to_string(),
            Define::Bool(settings.color_space == ColorSpace::Srgb),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{compile, HeadlessBackend, ToneMapping};

    #[test]
    fn test_every_permutation_compiles() {
        for tone_mapping in [
            ToneMapping::None,
            ToneMapping::Linear,
            ToneMapping::Reinhard,
            ToneMapping::Cineon,
            ToneMapping::AcesFilmic,
            ToneMapping::AgX,
        ] {
            for color_space in [ColorSpace::Srgb, ColorSpace::Linear] {
                let mut desc = ProgramDesc::new("output", OUTPUT_SHADER);
                desc.defines = output_defines(OutputSettings {
                    tone_mapping,
                    color_space,
                });
                assert!(compile(&desc).is_ok(), "{:?}/{:?}", tone_mapping, color_space);
            }
        }
    }

    #[test]
    fn test_settings_change_marks_relink() {
        let mut backend = HeadlessBackend::new(16, 16);
        let mut pass = OutputPass::new(OutputPassConfig::default()).unwrap();
        pass.init(&mut backend, &Viewport::new(16, 16)).unwrap();
        assert_eq!(pass.program_version(), Some(0));

        // unchanged settings: nothing to do
        assert!(!pass.sync_settings(backend.output_settings()));

        let changed = OutputSettings {
            tone_mapping: ToneMapping::Reinhard,
            color_space: ColorSpace::Linear,
        };
        assert!(pass.sync_settings(changed));
        assert_eq!(pass.program_version(), Some(1));
        assert_eq!(pass.cached_settings(), Some(changed));
        assert!(pass.material.as_ref().unwrap().program.needs_update());
    }

    #[test]
    fn test_negative_exposure_rejected() {
        let config = OutputPassConfig {
            exposure: -0.5,
            ..Default::default()
        };
        assert!(OutputPass::new(config).is_err());
    }
}
