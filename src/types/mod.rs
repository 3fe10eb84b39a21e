//! Core types shared across the crate.

mod common;
mod handles;
mod vertex;

pub use common::{BackendKind, BlendFactor, BlendFactors, Region, Topology, Viewport};
pub use handles::{BufferHandle, ContextId, ShaderHandle, TextureHandle};
pub(crate) use handles::IdAllocator;
pub use vertex::{vertices_to_floats, Vertex};
