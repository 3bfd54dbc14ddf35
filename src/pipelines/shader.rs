//! Shader programs: a WGSL vertex file and a WGSL fragment file linked into
//! one render pipeline.
//!
//! Each stage is compiled inside its own validation error scope and the link
//! step (pipeline creation) inside another, so a broken shader comes back as an
//! [`EngineError`] instead of reaching the uncaptured-error handler.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::context::{Allocation, ResourceKind, ResourceLedger};
use crate::error::{EngineError, InitError, Result};
use crate::pipelines::basic::{Layouts, mk_render_pipeline};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ProgramKind {
    /// Untextured; used by `draw_triangle`.
    Flat,
    /// Samples the texture bound at group 1; used by `draw_texture`.
    Textured,
}

impl ProgramKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgramKind::Flat => "flat",
            ProgramKind::Textured => "textured",
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// WGSL text and where it came from, for error messages.
#[derive(Debug, Clone, Copy)]
pub struct StageSource<'a> {
    pub path: &'a Path,
    pub code: &'a str,
}

#[derive(Debug)]
pub struct Program {
    pub kind: ProgramKind,
    pub pipeline: wgpu::RenderPipeline,
    pub vertex_path: PathBuf,
    pub fragment_path: PathBuf,
    pub generation: u64,
    _allocation: Allocation,
}

/// Everything needed to build a pipeline besides the shader text.
pub struct ProgramTarget<'a> {
    pub device: &'a wgpu::Device,
    pub ledger: &'a ResourceLedger,
    pub layouts: &'a Layouts,
    pub format: wgpu::TextureFormat,
    pub blend: wgpu::BlendState,
}

fn compile_stage(
    device: &wgpu::Device,
    stage: ShaderStage,
    source: StageSource<'_>,
) -> Result<wgpu::ShaderModule> {
    let label = source.path.display().to_string();
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&label),
        source: wgpu::ShaderSource::Wgsl(source.code.into()),
    });
    if let Some(error) = pollster::block_on(device.pop_error_scope()) {
        return Err(EngineError::ShaderCompile {
            stage,
            path: source.path.to_path_buf(),
            message: error.to_string(),
        });
    }
    Ok(module)
}

impl Program {
    pub fn compile(
        target: &ProgramTarget<'_>,
        kind: ProgramKind,
        vertex: StageSource<'_>,
        fragment: StageSource<'_>,
        generation: u64,
    ) -> Result<Self> {
        let device = target.device;
        let vs = compile_stage(device, ShaderStage::Vertex, vertex)?;
        let fs = compile_stage(device, ShaderStage::Fragment, fragment)?;

        let layout = match kind {
            ProgramKind::Flat => &target.layouts.flat,
            ProgramKind::Textured => &target.layouts.textured,
        };
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = mk_render_pipeline(
            device,
            layout,
            target.format,
            Some(target.blend),
            &vs,
            &fs,
            kind.as_str(),
        );
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(EngineError::ShaderLink {
                message: error.to_string(),
            });
        }
        log::info!(
            "{} program linked from {:?} and {:?}",
            kind.as_str(),
            vertex.path,
            fragment.path
        );

        Ok(Self {
            kind,
            pipeline,
            vertex_path: vertex.path.to_path_buf(),
            fragment_path: fragment.path.to_path_buf(),
            generation,
            _allocation: target.ledger.issue(ResourceKind::Pipeline),
        })
    }
}

const FLAT_VERT: &str = include_str!("../../assets/shaders/flat.vert.wgsl");
const FLAT_FRAG: &str = include_str!("../../assets/shaders/flat.frag.wgsl");
const TEXTURED_VERT: &str = include_str!("../../assets/shaders/textured.vert.wgsl");
const TEXTURED_FRAG: &str = include_str!("../../assets/shaders/textured.frag.wgsl");

fn builtin_error(kind: ProgramKind, source: EngineError) -> InitError {
    InitError::BuiltinProgram {
        kind: kind.as_str(),
        source: Box::new(source),
    }
}

/// The two installed programs. Loading replaces one wholesale or not at all.
#[derive(Debug)]
pub struct Programs {
    flat: Program,
    textured: Program,
    next_generation: u64,
}

impl Programs {
    /// Builds both programs from the shaders compiled into the crate.
    pub fn builtin(target: &ProgramTarget<'_>) -> Result<Self> {
        let flat = Program::compile(
            target,
            ProgramKind::Flat,
            StageSource {
                path: Path::new("builtin/flat.vert.wgsl"),
                code: FLAT_VERT,
            },
            StageSource {
                path: Path::new("builtin/flat.frag.wgsl"),
                code: FLAT_FRAG,
            },
            0,
        )
        .map_err(|e| builtin_error(ProgramKind::Flat, e))?;
        let textured = Program::compile(
            target,
            ProgramKind::Textured,
            StageSource {
                path: Path::new("builtin/textured.vert.wgsl"),
                code: TEXTURED_VERT,
            },
            StageSource {
                path: Path::new("builtin/textured.frag.wgsl"),
                code: TEXTURED_FRAG,
            },
            1,
        )
        .map_err(|e| builtin_error(ProgramKind::Textured, e))?;
        Ok(Self {
            flat,
            textured,
            next_generation: 2,
        })
    }

    /// Compiles and installs a program; on error the old one stays.
    pub fn load(
        &mut self,
        target: &ProgramTarget<'_>,
        kind: ProgramKind,
        vertex: StageSource<'_>,
        fragment: StageSource<'_>,
    ) -> Result<u64> {
        let program = Program::compile(target, kind, vertex, fragment, self.next_generation)?;
        self.next_generation += 1;
        let generation = program.generation;
        match kind {
            ProgramKind::Flat => self.flat = program,
            ProgramKind::Textured => self.textured = program,
        }
        Ok(generation)
    }

    pub fn get(&self, kind: ProgramKind) -> &Program {
        match kind {
            ProgramKind::Flat => &self.flat,
            ProgramKind::Textured => &self.textured,
        }
    }

    pub fn generation(&self, kind: ProgramKind) -> u64 {
        self.get(kind).generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_shaders_declare_their_entry_points() {
        for vert in [FLAT_VERT, TEXTURED_VERT] {
            assert!(vert.contains("fn vs_main"));
        }
        for frag in [FLAT_FRAG, TEXTURED_FRAG] {
            assert!(frag.contains("fn fs_main"));
        }
    }

    #[test]
    fn stage_names_read_naturally_in_errors() {
        let err = EngineError::ShaderCompile {
            stage: ShaderStage::Fragment,
            path: PathBuf::from("broken.frag.wgsl"),
            message: "expected ';'".to_string(),
        };
        assert!(err.to_string().starts_with("fragment shader \"broken.frag.wgsl\""));
    }
}
