use std::collections::BTreeMap;
use std::fmt::Write;

use naga::valid::{Capabilities, ValidationFlags, Validator};

use crate::error::{PipelineError, Result};

/// Bindings, uniform block and vertex stage shared by all full-screen programs.
pub const PRELUDE: &str = include_str!("../pass/shaders/prelude.wgsl");

/// Name of the texture binding that receives the pipeline's current image.
pub const INPUT_TEXTURE: &str = "t_input";

/// Fragment entry point every program must define.
pub const FRAGMENT_ENTRY: &str = "fs_main";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(u32);

impl ProgramId {
    pub(crate) fn new(raw: u32) -> Self {
        Self(raw)
    }
}

/// Compile-time constant injected ahead of the fragment body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Define {
    U32(u32),
    F32(f32),
    Bool(bool),
}

impl Define {
    fn declaration(&self, name: &str) -> String {
        match self {
            Define::U32(v) => format!("const {}: u32 = {}u;", name, v),
            Define::F32(v) => format!("const {}: f32 = {:?};", name, v),
            Define::Bool(v) => format!("const {}: bool = {};", name, v),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgramDesc {
    pub label: String,
    /// WGSL defining `fs_main(in: VsOut) -> @location(0) vec4<f32>`
    pub fragment: String,
    pub defines: BTreeMap<String, Define>,
    /// Identifiers the fragment must reference (e.g. `t_input`)
    pub required: Vec<String>,
}

impl ProgramDesc {
    pub fn new(label: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            fragment: fragment.into(),
            defines: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    pub fn define(mut self, name: impl Into<String>, value: Define) -> Self {
        self.defines.insert(name.into(), value);
        self
    }

    pub fn require(mut self, identifier: impl Into<String>) -> Self {
        self.required.push(identifier.into());
        self
    }

    /// Full WGSL module: prelude, one const per define, fragment body.
    pub fn assemble(&self) -> String {
        let mut source = String::with_capacity(PRELUDE.len() + self.fragment.len() + 256);
        source.push_str(PRELUDE);
        source.push('\n');
        for (name, value) in &self.defines {
            let _ = writeln!(source, "{}", value.declaration(name));
        }
        source.push('\n');
        source.push_str(&self.fragment);
        source
    }

    pub fn reads_input(&self) -> bool {
        self.fragment.contains(INPUT_TEXTURE)
    }
}

/// A created full-screen program.
///
/// Changing defines bumps `version`; backends relink before the next draw
/// whenever `needs_update()` is set.
#[derive(Debug, Clone)]
pub struct Program {
    id: ProgramId,
    desc: ProgramDesc,
    version: u64,
    linked_version: u64,
}

impl Program {
    pub(crate) fn new(id: ProgramId, desc: ProgramDesc) -> Self {
        Self {
            id,
            desc,
            version: 0,
            linked_version: 0,
        }
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.desc.label
    }

    pub fn desc(&self) -> &ProgramDesc {
        &self.desc
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn defines(&self) -> &BTreeMap<String, Define> {
        &self.desc.defines
    }

    /// Replace all defines; returns true if anything changed.
    pub fn set_defines(&mut self, defines: BTreeMap<String, Define>) -> bool {
        if defines == self.desc.defines {
            return false;
        }
        self.desc.defines = defines;
        self.version += 1;
        true
    }

    pub fn needs_update(&self) -> bool {
        self.version != self.linked_version
    }

    pub(crate) fn mark_linked(&mut self) {
        self.linked_version = self.version;
    }

    pub fn reads_input(&self) -> bool {
        self.desc.reads_input()
    }
}

/// Check required identifiers, parse and validate the assembled module.
///
/// Returns the assembled source on success.
pub fn compile(desc: &ProgramDesc) -> Result<String> {
    for name in &desc.required {
        if !desc.fragment.contains(name.as_str()) {
            return Err(PipelineError::MissingUniform {
                label: desc.label.clone(),
                name: name.clone(),
            });
        }
    }

    let source = desc.assemble();
    let module = naga::front::wgsl::parse_str(&source).map_err(|e| PipelineError::ShaderCompile {
        label: desc.label.clone(),
        message: e.emit_to_string(&source),
    })?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| PipelineError::ShaderCompile {
            label: desc.label.clone(),
            message: e.to_string(),
        })?;

    let has_fragment = module
        .entry_points
        .iter()
        .any(|ep| ep.name == FRAGMENT_ENTRY && ep.stage == naga::ShaderStage::Fragment);
    if !has_fragment {
        return Err(PipelineError::ShaderCompile {
            label: desc.label.clone(),
            message: format!("no @fragment entry point named `{}`", FRAGMENT_ENTRY),
        });
    }

    Ok(source)
}
