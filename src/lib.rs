//! # gfx-compositor
//!
//! GPU device abstraction and render-graph engine for a compositor.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`Negotiator`] - Picks the first working backend out of Vulkan,
//!   desktop OpenGL and OpenGL ES
//! - [`DeviceContext`] - One backend session with its viewport, bindings
//!   and resources (shaders, static vertex buffers, RGBA8 textures)
//! - [`passes`] - Blur, shadow, composite, color adjust, uniform upload and
//!   solid, gradient and rounded rectangle fills
//! - [`RenderGraph`] - Typed compositing operations, with the flat
//!   [`WireGraph`] form at the serialization boundary
//! - `DummyBackend` - A recording backend for tests
//!
//! ## Features
//!
//! - `wgpu-backend` (default): native backends through wgpu. Without it
//!   negotiation has nothing to try and always reports unavailable.
//! - `dummy` (default): the recording backend and its probe.
//!
//! ## Example
//!
//! ```ignore
//! use gfx_compositor::{DeviceContext, RenderGraph, WireGraph};
//!
//! let mut context = DeviceContext::create(1280, 720).expect("no GPU backend");
//! let wire = WireGraph::new(vec![0, 4, 2], vec![0.0, 0.0, 0.0, 1.0, 1.0, 4.0, 8.0]);
//! wire.execute(&mut context)?;
//! context.present()?;
//! ```

pub mod backend;
mod capabilities;
mod config;
mod device;
mod error;
pub mod graph;
mod negotiator;
pub mod passes;
mod resources;
pub mod shader;
pub mod types;

pub use backend::{Backend, BackendError};
#[cfg(any(test, feature = "dummy"))]
pub use backend::{DummyBackend, DummyProbe};
#[cfg(feature = "wgpu-backend")]
pub use backend::{WgpuBackend, WgpuProbe};
pub use capabilities::{vendor_name, DeviceCapabilities};
pub use config::{ContextConfig, PowerPreference};
pub use device::{DeviceContext, MAX_TEXTURE_SLOTS};
pub use error::{NegotiationError, ResourceError};
pub use graph::{
    DecodeError, Effect, EffectStack, ExecutionReport, GraphError, RenderGraph, RenderNode,
    WireGraph,
};
pub use negotiator::{acquire, BackendProbe, Negotiator};
pub use passes::{
    BlurParams, ColorAdjustParams, CompositeMode, Gradient, PassError, ShadowParams, UniformKind,
};
pub use resources::ResourceCounts;
pub use types::{
    BackendKind, BlendFactor, BlendFactors, BufferHandle, ContextId, Region, ShaderHandle,
    TextureHandle, Topology, Vertex, Viewport,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
