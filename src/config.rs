//! JSON stage configuration.

use std::path::Path;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::motion::BrownianConfig;
use crate::pass::{OutputPassConfig, ShaderPassConfig, TransitionPassConfig};
use crate::render::{OutputSettings, Rgba};
use crate::scroll::{IntroConfig, PageConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VignetteConfig {
    pub offset: f32,
    pub darkness: f32,
    pub enabled: bool,
    pub render_order: i32,
}

impl Default for VignetteConfig {
    fn default() -> Self {
        Self {
            offset: 1.0,
            darkness: 1.2,
            enabled: true,
            render_order: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RgbShiftConfig {
    pub amount: f32,
    pub angle: f32,
    pub enabled: bool,
    pub render_order: i32,
}

impl Default for RgbShiftConfig {
    fn default() -> Self {
        Self {
            amount: 0.0015,
            angle: 0.0,
            enabled: true,
            render_order: 0,
        }
    }
}

impl VignetteConfig {
    pub fn shader_config(&self) -> ShaderPassConfig {
        ShaderPassConfig {
            enabled: self.enabled,
            render_order: self.render_order,
            ..ShaderPassConfig::vignette(self.offset, self.darkness)
        }
    }
}

impl RgbShiftConfig {
    pub fn shader_config(&self) -> ShaderPassConfig {
        ShaderPassConfig {
            enabled: self.enabled,
            render_order: self.render_order,
            ..ShaderPassConfig::rgb_shift(self.amount, self.angle)
        }
    }
}

/// One entry of the pass chain, selected by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PassConfig {
    Vignette(VignetteConfig),
    RgbShift(RgbShiftConfig),
    Shader(ShaderPassConfig),
    Transition(TransitionPassConfig),
    Output(OutputPassConfig),
}

impl PassConfig {
    /// Expand presets into their shader configuration
    pub fn shader_config(&self) -> Option<ShaderPassConfig> {
        match self {
            PassConfig::Vignette(c) => Some(c.shader_config()),
            PassConfig::RgbShift(c) => Some(c.shader_config()),
            PassConfig::Shader(c) => Some(c.clone()),
            PassConfig::Transition(_) | PassConfig::Output(_) => None,
        }
    }
}

/// Everything the stage reads at startup
///
/// Camera transitions are not configurable; the tuned table is always used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Pass chain; execution order comes from each pass's `render_order`
    pub passes: Vec<PassConfig>,
    pub clear_color: Rgba,
    pub output: OutputSettings,
    pub motion: BrownianConfig,
    pub intro: IntroConfig,
    pub page: PageConfig,
    /// MSAA sample count of the scene capture
    pub samples: u32,
    /// Number of floating objects in the main scene
    pub objects: usize,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            passes: vec![
                PassConfig::RgbShift(RgbShiftConfig {
                    render_order: 10,
                    ..Default::default()
                }),
                PassConfig::Vignette(VignetteConfig {
                    render_order: 20,
                    ..Default::default()
                }),
                PassConfig::Output(OutputPassConfig {
                    render_order: 100,
                    ..Default::default()
                }),
            ],
            clear_color: [0.02, 0.02, 0.03, 1.0],
            output: OutputSettings::default(),
            motion: BrownianConfig::default(),
            intro: IntroConfig::default(),
            page: PageConfig::default(),
            samples: 1,
            objects: 12,
        }
    }
}

impl StageConfig {
    /// Load from a JSON file; a missing file yields the defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            log::info!("No config at {}; using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_json(&text).with_context(|| format!("invalid config {}", path.display()))?;
        log::info!("Loaded config from {} ({} passes)", path.display(), config.passes.len());
        Ok(config)
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(text).context("failed to parse stage config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !matches!(self.samples, 1 | 4) {
            bail!("samples must be 1 or 4, got {}", self.samples);
        }
        if self.clear_color.iter().any(|c| !c.is_finite()) {
            bail!("clear_color must be finite");
        }
        if !(self.intro.duration.is_finite() && self.intro.duration >= 0.0) {
            bail!("intro duration must be a non-negative number of seconds");
        }
        Ok(())
    }
}
