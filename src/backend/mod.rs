//! Native backend abstraction.
//!
//! A [`Backend`] is one initialized session with a native graphics API. The
//! device context owns exactly one, chosen at negotiation time, and never
//! branches on which kind it holds. All binding state (current program,
//! buffer, texture slots, blend, viewport, render target) lives in the
//! context; a backend only sees fully resolved [`DrawCall`]s.
//!
//! # Available Backends
//!
//! - `WgpuBackend` (`wgpu-backend` feature): Vulkan, desktop OpenGL or
//!   OpenGL ES through wgpu
//! - `DummyBackend` (`dummy` feature): records calls without touching a
//!   GPU, for tests
//!
//! Native objects are named by plain [`NativeId`] integers that only the
//! issuing backend understands.

#[cfg(any(test, feature = "dummy"))]
pub mod dummy;
mod error;
#[cfg(feature = "wgpu-backend")]
pub mod wgpu_impl;

use std::ops::Range;

use glam::Vec4;

use crate::shader::{CompiledStage, ProgramLayout};
use crate::types::{BackendKind, BlendFactors, Region, Topology};

#[cfg(any(test, feature = "dummy"))]
pub use dummy::{DummyBackend, DummyCall, DummyProbe, DummyRecorder};
pub use error::BackendError;
#[cfg(feature = "wgpu-backend")]
pub use wgpu_impl::{WgpuBackend, WgpuProbe};

/// Backend-local id of a native object.
pub type NativeId = u32;

/// Raw device properties as reported by a backend.
///
/// Every field is optional: a backend fills what it could query and the
/// device context substitutes empty/zero for the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityQuery {
    pub name: Option<String>,
    pub vendor: Option<String>,
    pub driver_version: Option<String>,
    pub max_texture_size: Option<u32>,
    pub supports_compute: Option<bool>,
}

/// CPU-side contents of one uniform block, uploaded per draw.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformData {
    pub binding: u32,
    pub bytes: Vec<u8>,
}

/// A fully resolved draw.
#[derive(Debug, Clone)]
pub struct DrawCall<'a> {
    pub program: NativeId,
    pub uniforms: &'a [UniformData],
    /// Texture bound to each sampling slot.
    pub textures: &'a [Option<NativeId>],
    pub vertex_buffer: NativeId,
    pub topology: Topology,
    pub vertices: Range<u32>,
    /// Index list for indexed draws; `vertices` is ignored when set.
    pub indices: Option<&'a [u32]>,
    /// `None` writes fragments unblended.
    pub blend: Option<BlendFactors>,
    pub viewport: Region,
    /// `None` targets the frame.
    pub target: Option<NativeId>,
}

/// One native graphics API session.
pub trait Backend: Send {
    fn kind(&self) -> BackendKind;

    fn capabilities(&self) -> CapabilityQuery;

    /// Size of the frame target in pixels.
    fn frame_size(&self) -> (u32, u32);

    fn create_stage(&mut self, stage: &CompiledStage) -> Result<NativeId, BackendError>;

    fn release_stage(&mut self, id: NativeId);

    /// Link two stages into a program. The stages stay alive until released.
    fn link_program(
        &mut self,
        vertex: NativeId,
        fragment: NativeId,
        layout: &ProgramLayout,
    ) -> Result<NativeId, BackendError>;

    fn delete_program(&mut self, id: NativeId);

    /// Create a static vertex buffer holding `data`.
    fn create_buffer(&mut self, data: &[u8]) -> Result<NativeId, BackendError>;

    fn delete_buffer(&mut self, id: NativeId);

    /// Create an RGBA8 texture, zeroed when `pixels` is `None`.
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        pixels: Option<&[u8]>,
    ) -> Result<NativeId, BackendError>;

    fn delete_texture(&mut self, id: NativeId);

    /// Fill the whole target with `color`.
    fn clear(&mut self, target: Option<NativeId>, color: Vec4);

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<(), BackendError>;

    /// Copy `region` of `src` so its top-left corner lands at `dst_origin` in `dst`.
    fn copy_region(
        &mut self,
        src: Option<NativeId>,
        dst: Option<NativeId>,
        region: Region,
        dst_origin: (u32, u32),
    ) -> Result<(), BackendError>;

    /// Submit recorded work and wait for the frame to complete.
    fn present(&mut self) -> Result<(), BackendError>;

    /// Tightly packed RGBA8 contents of a target.
    fn read_pixels(&mut self, target: Option<NativeId>) -> Result<Vec<u8>, BackendError>;

    /// Release the session. Called once, after every resource was deleted.
    fn shutdown(&mut self);
}
