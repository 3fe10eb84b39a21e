//! Device context: the long-lived owner of one backend session.
//!
//! A [`DeviceContext`] is created by negotiation and holds the only
//! reference to its [`Backend`]. It mirrors the binding state a GL-style
//! caller expects (bound program, buffer, texture slots, blend pair, render
//! target, viewport) and resolves it into a [`DrawCall`] for every draw.
//!
//! Once destroyed, or if it never had a backend, a context is *invalid*:
//! rendering calls become logged no-ops, resource creation fails with
//! [`ResourceError::InvalidContext`], and queries answer truthfully.
//!
//! The context is `Send` but not `Sync`; one thread drives it at a time.

use glam::Vec4;

use crate::backend::{Backend, BackendError, DrawCall, NativeId};
use crate::capabilities::DeviceCapabilities;
use crate::error::{NegotiationError, ResourceError};
use crate::negotiator::Negotiator;
use crate::passes::PassPrograms;
use crate::resources::{Registry, ResourceCounts};
use crate::types::{
    BackendKind, BlendFactors, BufferHandle, ContextId, Region, ShaderHandle, TextureHandle,
    Topology, Viewport,
};

/// Number of texture sampling slots.
pub const MAX_TEXTURE_SLOTS: usize = 16;

/// Binding state a pass can save and restore.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BindState {
    pub program: Option<ShaderHandle>,
    pub buffer: Option<BufferHandle>,
    pub textures: [Option<TextureHandle>; MAX_TEXTURE_SLOTS],
    pub blend: Option<BlendFactors>,
    pub render_target: Option<TextureHandle>,
    pub viewport: Viewport,
}

/// One active rendering session.
pub struct DeviceContext {
    id: ContextId,
    backend: Option<Box<dyn Backend>>,
    capabilities: DeviceCapabilities,
    pub(crate) state: BindState,
    pub(crate) registry: Registry,
    pub(crate) pass_programs: Option<PassPrograms>,
}

static_assertions::assert_impl_all!(DeviceContext: Send);

impl std::fmt::Debug for DeviceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceContext")
            .field("id", &self.id)
            .field("backend", &self.backend_kind())
            .field("viewport", &self.state.viewport)
            .finish_non_exhaustive()
    }
}

impl DeviceContext {
    /// Acquire a context with the default backend priority.
    ///
    /// Returns `None` when no backend could be negotiated; use
    /// [`Negotiator::acquire`] to see why.
    pub fn create(width: u32, height: u32) -> Option<DeviceContext> {
        match Negotiator::default().acquire(width, height) {
            Ok(context) => Some(context),
            Err(e) => {
                log::warn!("{e}");
                None
            }
        }
    }

    /// Like [`create`](Self::create) but keeps the failure.
    pub fn acquire(width: u32, height: u32) -> Result<DeviceContext, NegotiationError> {
        Negotiator::default().acquire(width, height)
    }

    /// Wrap an initialized backend. Capabilities are captured immediately.
    pub fn new(backend: Box<dyn Backend>) -> Self {
        let kind = backend.kind();
        let capabilities = DeviceCapabilities::from_query(kind, backend.capabilities());
        let (width, height) = backend.frame_size();

        log::debug!(
            "device context on {kind}: {} ({}), {width}x{height}",
            capabilities.name,
            capabilities.vendor
        );

        Self {
            id: ContextId::next(),
            backend: Some(backend),
            capabilities,
            state: BindState {
                program: None,
                buffer: None,
                textures: [None; MAX_TEXTURE_SLOTS],
                blend: None,
                render_target: None,
                viewport: Region::from_size(width, height),
            },
            registry: Registry::default(),
            pass_programs: None,
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn is_valid(&self) -> bool {
        self.backend.is_some()
    }

    /// The active backend, or [`BackendKind::None`] once destroyed.
    pub fn backend_kind(&self) -> BackendKind {
        self.backend
            .as_ref()
            .map_or(BackendKind::None, |backend| backend.kind())
    }

    /// Snapshot captured at creation. Stays readable after destruction.
    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// Frame size in pixels, zero when invalid.
    pub fn frame_size(&self) -> (u32, u32) {
        self.backend
            .as_ref()
            .map_or((0, 0), |backend| backend.frame_size())
    }

    pub fn viewport(&self) -> Viewport {
        self.state.viewport
    }

    /// Store a new viewport. Always recorded, even on an invalid context.
    pub fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.state.viewport = Region::new(x, y, width, height);
    }

    /// Fill the current render target with a color.
    pub fn clear(&mut self, color: Vec4) {
        let target = self.native_target();
        if let Some(backend) = self.backend_mut("clear") {
            log::trace!("clear {target:?} to {color}");
            backend.clear(target, color);
        }
    }

    /// Hand the finished frame over. The only call that waits on the GPU.
    pub fn present(&mut self) -> Result<(), BackendError> {
        match self.backend_mut("present") {
            Some(backend) => backend.present(),
            None => Ok(()),
        }
    }

    /// Blend pair for following draws; `None` disables blending.
    pub fn set_blend(&mut self, blend: Option<BlendFactors>) {
        self.state.blend = blend;
    }

    pub fn blend(&self) -> Option<BlendFactors> {
        self.state.blend
    }

    /// Render into a texture instead of the frame. `None` restores the frame.
    pub fn set_render_target(&mut self, target: Option<TextureHandle>) {
        if let Some(handle) = target {
            if !self.owns(handle.context, "set_render_target") {
                return;
            }
        }
        self.state.render_target = target;
    }

    pub fn render_target(&self) -> Option<TextureHandle> {
        self.state.render_target
    }

    /// Live shaders, buffers and textures owned by this context.
    pub fn resource_counts(&self) -> ResourceCounts {
        self.registry.counts()
    }

    /// Draw `count` vertices of the bound buffer starting at `first`.
    pub fn draw_arrays(
        &mut self,
        topology: Topology,
        first: u32,
        count: u32,
    ) -> Result<(), ResourceError> {
        self.draw(topology, first..first.saturating_add(count), None)
    }

    /// Draw the bound buffer through an index list.
    pub fn draw_elements(
        &mut self,
        topology: Topology,
        indices: &[u32],
    ) -> Result<(), ResourceError> {
        self.draw(topology, 0..0, Some(indices))
    }

    fn draw(
        &mut self,
        topology: Topology,
        vertices: std::ops::Range<u32>,
        indices: Option<&[u32]>,
    ) -> Result<(), ResourceError> {
        if !self.is_valid() {
            log::warn!("draw ignored: device context {} is invalid", self.id.raw());
            return Ok(());
        }
        if vertices.is_empty() && indices.is_none_or(|i| i.is_empty()) {
            return Ok(());
        }

        let program = self
            .state
            .program
            .and_then(|handle| self.registry.shaders.get(&handle.id))
            .ok_or(ResourceError::NothingBound("shader program"))?;
        let buffer = self
            .state
            .buffer
            .and_then(|handle| self.registry.buffers.get(&handle.id))
            .ok_or(ResourceError::NothingBound("vertex buffer"))?;

        let vertices =
            vertices.start.min(buffer.vertex_count)..vertices.end.min(buffer.vertex_count);
        let textures: Vec<Option<NativeId>> = self
            .state
            .textures
            .iter()
            .map(|slot| {
                slot.and_then(|handle| self.registry.textures.get(&handle.id))
                    .map(|texture| texture.native)
            })
            .collect();
        let target = self
            .state
            .render_target
            .and_then(|handle| self.registry.textures.get(&handle.id))
            .map(|texture| texture.native);

        let call = DrawCall {
            program: program.native,
            uniforms: &program.uniforms,
            textures: &textures,
            vertex_buffer: buffer.native,
            topology,
            vertices,
            indices,
            blend: self.state.blend,
            viewport: self.state.viewport,
            target,
        };

        let Some(backend) = self.backend.as_deref_mut() else {
            return Ok(());
        };
        backend.draw(&call)?;
        Ok(())
    }

    /// Copy pixels between the frame and textures.
    ///
    /// `region` is in source pixels; its top-left corner lands at
    /// `dst_origin` in the destination.
    pub fn copy_region(
        &mut self,
        src: Option<TextureHandle>,
        dst: Option<TextureHandle>,
        region: Region,
        dst_origin: (u32, u32),
    ) -> Result<(), ResourceError> {
        let src = self.resolve_target(src)?;
        let dst = self.resolve_target(dst)?;
        match self.backend_mut("copy_region") {
            Some(backend) => Ok(backend.copy_region(src, dst, region, dst_origin)?),
            None => Ok(()),
        }
    }

    /// Tightly packed RGBA8 contents of the frame.
    pub fn read_pixels(&mut self) -> Result<Vec<u8>, ResourceError> {
        let backend = self.backend.as_deref_mut().ok_or(ResourceError::InvalidContext)?;
        Ok(backend.read_pixels(None)?)
    }

    /// Tightly packed RGBA8 contents of a texture.
    pub fn read_texture(&mut self, texture: TextureHandle) -> Result<Vec<u8>, ResourceError> {
        let native = self.resolve_target(Some(texture))?;
        let backend = self.backend.as_deref_mut().ok_or(ResourceError::InvalidContext)?;
        Ok(backend.read_pixels(native)?)
    }

    /// Release every resource and the backend session, newest first.
    ///
    /// Safe to call repeatedly; later calls do nothing.
    pub fn destroy(&mut self) {
        let Some(mut backend) = self.backend.take() else {
            return;
        };

        let released = self.registry.drain_newest_first();
        log::debug!(
            "destroying device context {} ({} live resources)",
            self.id.raw(),
            released.len()
        );
        for resource in released {
            resource.release(backend.as_mut());
        }
        backend.shutdown();

        self.state.program = None;
        self.state.buffer = None;
        self.state.textures = [None; MAX_TEXTURE_SLOTS];
        self.state.render_target = None;
        self.pass_programs = None;
    }

    pub(crate) fn save_state(&self) -> BindState {
        self.state
    }

    pub(crate) fn restore_state(&mut self, state: BindState) {
        self.state = state;
    }

    /// The backend, or `None` with a warning when the context is invalid.
    pub(crate) fn backend_mut(
        &mut self,
        operation: &str,
    ) -> Option<&mut (dyn Backend + 'static)> {
        if self.backend.is_none() {
            log::warn!(
                "{operation} ignored: device context {} is invalid",
                self.id.raw()
            );
        }
        self.backend.as_deref_mut()
    }

    /// Whether a handle was issued by this context. Foreign handles are logged.
    pub(crate) fn owns(&self, context: ContextId, operation: &str) -> bool {
        if context != self.id {
            log::warn!(
                "{operation} ignored: handle from context {} used on context {}",
                context.raw(),
                self.id.raw()
            );
            return false;
        }
        true
    }

    fn native_target(&self) -> Option<NativeId> {
        self.state
            .render_target
            .and_then(|handle| self.registry.textures.get(&handle.id))
            .map(|texture| texture.native)
    }

    fn resolve_target(
        &self,
        texture: Option<TextureHandle>,
    ) -> Result<Option<NativeId>, ResourceError> {
        match texture {
            None => Ok(None),
            Some(handle) => {
                if handle.context != self.id {
                    return Err(ResourceError::ForeignHandle);
                }
                self.registry
                    .textures
                    .get(&handle.id)
                    .map(|texture| Some(texture.native))
                    .ok_or(ResourceError::NothingBound("texture"))
            }
        }
    }
}

impl Drop for DeviceContext {
    fn drop(&mut self) {
        self.destroy();
    }
}
