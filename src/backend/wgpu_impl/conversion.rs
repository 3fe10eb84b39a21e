//! Type conversions between crate types and wgpu types.

use crate::config::PowerPreference;
use crate::types::{BackendKind, BlendFactor, BlendFactors, Topology};

pub fn convert_power_preference(preference: PowerPreference) -> wgpu::PowerPreference {
    match preference {
        PowerPreference::LowPower => wgpu::PowerPreference::LowPower,
        PowerPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
    }
}

/// wgpu instance backends that can host a backend kind.
pub fn convert_backend_kind(kind: BackendKind) -> Option<wgpu::Backends> {
    match kind {
        BackendKind::Vulkan => Some(wgpu::Backends::VULKAN),
        BackendKind::OpenGL | BackendKind::OpenGLES => Some(wgpu::Backends::GL),
        BackendKind::None => None,
    }
}

/// Whether an adapter actually implements `kind`.
///
/// wgpu exposes desktop GL and GLES through the same backend, so the two are
/// told apart by the version string the driver reports.
pub fn adapter_matches(kind: BackendKind, info: &wgpu::AdapterInfo) -> bool {
    let is_es = info.driver_info.contains("OpenGL ES") || info.driver.contains("OpenGL ES");
    match kind {
        BackendKind::Vulkan => info.backend == wgpu::Backend::Vulkan,
        BackendKind::OpenGL => info.backend == wgpu::Backend::Gl && !is_es,
        BackendKind::OpenGLES => info.backend == wgpu::Backend::Gl && is_es,
        BackendKind::None => false,
    }
}

pub fn convert_blend_factor(factor: BlendFactor) -> wgpu::BlendFactor {
    match factor {
        BlendFactor::Zero => wgpu::BlendFactor::Zero,
        BlendFactor::One => wgpu::BlendFactor::One,
        BlendFactor::SrcColor => wgpu::BlendFactor::Src,
        BlendFactor::OneMinusSrcColor => wgpu::BlendFactor::OneMinusSrc,
        BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
        BlendFactor::DstColor => wgpu::BlendFactor::Dst,
        BlendFactor::OneMinusDstColor => wgpu::BlendFactor::OneMinusDst,
        BlendFactor::DstAlpha => wgpu::BlendFactor::DstAlpha,
        BlendFactor::OneMinusDstAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
    }
}

/// The same factor pair drives color and alpha.
pub fn convert_blend(blend: BlendFactors) -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: convert_blend_factor(blend.src),
        dst_factor: convert_blend_factor(blend.dst),
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}

pub fn convert_topology(topology: Topology) -> wgpu::PrimitiveTopology {
    match topology {
        Topology::Points => wgpu::PrimitiveTopology::PointList,
        Topology::Lines => wgpu::PrimitiveTopology::LineList,
        Topology::LineStrip => wgpu::PrimitiveTopology::LineStrip,
        Topology::Triangles => wgpu::PrimitiveTopology::TriangleList,
        Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
    }
}

/// Strip topologies need the index format fixed in the pipeline.
pub fn strip_index_format(topology: Topology) -> Option<wgpu::IndexFormat> {
    match topology {
        Topology::LineStrip | Topology::TriangleStrip => Some(wgpu::IndexFormat::Uint32),
        _ => None,
    }
}

pub fn convert_stage_mask(mask: crate::shader::StageMask) -> wgpu::ShaderStages {
    let mut stages = wgpu::ShaderStages::NONE;
    if mask.vertex {
        stages |= wgpu::ShaderStages::VERTEX;
    }
    if mask.fragment {
        stages |= wgpu::ShaderStages::FRAGMENT;
    }
    stages
}
