//! GLSL stage compilation and program reflection.
//!
//! Shader sources are Vulkan-flavoured GLSL 450. Each stage is parsed and
//! validated by naga on the CPU, then lowered to WGSL for the GPU backends.
//! The validated IR is kept so linking can check the stage interface and
//! derive uniform layouts without asking the driver.
//!
//! # Binding Conventions
//!
//! | Resource | Declaration | Notes |
//! |----------|-------------|-------|
//! | Uniform block | `layout(set = 0, binding = N) uniform Name { ... } inst;` | std140 layout |
//! | Texture | `layout(set = 0, binding = N) uniform texture2D name;` | slots follow binding order |
//! | Sampler | `layout(set = 0, binding = N) uniform sampler name;` | linear, clamp-to-edge |
//! | Vertex input | `layout(location = 0..=2) in ...` | see [`Vertex`](crate::Vertex) |

pub mod library;
mod reflect;

use std::fmt;

pub use reflect::{
    link, ProgramLayout, SamplerBinding, StageMask, TextureBinding, UniformBlock, UniformMember,
    UniformType,
};

/// A programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn to_naga(self) -> naga::ShaderStage {
        match self {
            Self::Vertex => naga::ShaderStage::Vertex,
            Self::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// A single stage that parsed and validated.
#[derive(Debug)]
pub struct CompiledStage {
    pub stage: ShaderStage,
    pub module: naga::Module,
    pub info: naga::valid::ModuleInfo,
    /// The stage lowered to WGSL.
    pub wgsl: String,
}

/// Compile one GLSL stage.
///
/// Returns the diagnostic text on failure.
pub fn compile(stage: ShaderStage, source: &str) -> Result<CompiledStage, String> {
    let options = naga::front::glsl::Options {
        stage: stage.to_naga(),
        defines: naga::FastHashMap::default(),
    };

    let mut frontend = naga::front::glsl::Frontend::default();
    let module = frontend
        .parse(&options, source)
        .map_err(|errors| format!("GLSL parse error:\n{errors}"))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    let info = validator
        .validate(&module)
        .map_err(|e| format!("Validation error: {e}"))?;

    let wgsl = naga::back::wgsl::write_string(
        &module,
        &info,
        naga::back::wgsl::WriterFlags::empty(),
    )
    .map_err(|e| format!("WGSL generation error: {e}"))?;

    log::trace!("compiled {stage} stage ({} bytes of WGSL)", wgsl.len());

    Ok(CompiledStage {
        stage,
        module,
        info,
        wgsl,
    })
}
