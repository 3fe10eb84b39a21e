//! wgpu backend.
//!
//! One backend type serves all three native APIs: the instance is restricted
//! to Vulkan or GL and the adapter it yields is checked against the requested
//! [`BackendKind`]. Rendering goes into an off-screen RGBA8 frame target that
//! stands in for the display surface.

mod conversion;
mod pass_encoding;
mod resources;

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec4;

use crate::capabilities::vendor_name;
use crate::config::PowerPreference;
use crate::negotiator::BackendProbe;
use crate::shader::{CompiledStage, ProgramLayout};
use crate::types::{BackendKind, Region};

use super::{Backend, BackendError, CapabilityQuery, DrawCall, NativeId};
use resources::{GpuTexture, Program};

/// Backend driving a wgpu device.
pub struct WgpuBackend {
    kind: BackendKind,
    adapter_info: wgpu::AdapterInfo,
    limits: wgpu::Limits,
    downlevel: wgpu::DownlevelCapabilities,
    device: wgpu::Device,
    queue: wgpu::Queue,
    frame: GpuTexture,
    /// Sampled when a program reads a slot with nothing bound.
    fallback: GpuTexture,
    sampler: wgpu::Sampler,
    stages: HashMap<NativeId, wgpu::ShaderModule>,
    programs: HashMap<NativeId, Program>,
    buffers: HashMap<NativeId, wgpu::Buffer>,
    textures: HashMap<NativeId, GpuTexture>,
    encoder: Option<wgpu::CommandEncoder>,
    next_id: NativeId,
}

impl std::fmt::Debug for WgpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuBackend")
            .field("kind", &self.kind)
            .field("adapter", &self.adapter_info.name)
            .field("frame", &(self.frame.width, self.frame.height))
            .finish_non_exhaustive()
    }
}

impl WgpuBackend {
    /// Bring up a device for `kind` with a `width` x `height` frame.
    pub fn new(
        kind: BackendKind,
        width: u32,
        height: u32,
        power_preference: PowerPreference,
        label: &str,
    ) -> Result<Self, BackendError> {
        let backends = conversion::convert_backend_kind(kind).ok_or_else(|| {
            BackendError::InitializationFailed("no native API for BackendKind::None".to_string())
        })?;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            flags: wgpu::InstanceFlags::default(),
            backend_options: wgpu::BackendOptions::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: conversion::convert_power_preference(power_preference),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| BackendError::InitializationFailed(format!("no {kind} adapter: {e}")))?;

        let adapter_info = adapter.get_info();
        if !conversion::adapter_matches(kind, &adapter_info) {
            return Err(BackendError::InitializationFailed(format!(
                "adapter '{}' ({}) does not provide {kind}",
                adapter_info.name, adapter_info.driver_info
            )));
        }
        log::info!("wgpu adapter for {kind}: {adapter_info:?}");

        let limits = adapter.limits();
        let downlevel = adapter.get_downlevel_capabilities();
        let max = limits.max_texture_dimension_2d;
        if width > max || height > max {
            return Err(BackendError::InitializationFailed(format!(
                "frame {width}x{height} exceeds the maximum texture size {max}"
            )));
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some(label),
            required_features: wgpu::Features::empty(),
            required_limits: limits.clone(),
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| BackendError::InitializationFailed(format!("device creation failed: {e}")))?;

        device.on_uncaptured_error(Arc::new(|error: wgpu::Error| {
            log::error!("uncaptured wgpu error: {error}");
        }));

        let frame = GpuTexture::new(&device, "frame", width, height);
        let fallback = GpuTexture::new(&device, "fallback texture", 1, 1);
        fallback.write(&queue, &[255; 4]);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("linear clamp sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Ok(Self {
            kind,
            adapter_info,
            limits,
            downlevel,
            device,
            queue,
            frame,
            fallback,
            sampler,
            stages: HashMap::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            encoder: None,
            next_id: 1,
        })
    }

    fn allocate(&mut self) -> NativeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl Backend for WgpuBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn capabilities(&self) -> CapabilityQuery {
        let info = &self.adapter_info;
        let vendor = vendor_name(info.vendor)
            .map(str::to_string)
            .or_else(|| (info.vendor != 0).then(|| format!("0x{:04X}", info.vendor)));

        CapabilityQuery {
            name: non_empty(&info.name),
            vendor,
            driver_version: non_empty(&format!("{} {}", info.driver, info.driver_info)),
            max_texture_size: Some(self.limits.max_texture_dimension_2d),
            supports_compute: Some(
                self.downlevel
                    .flags
                    .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS),
            ),
        }
    }

    fn frame_size(&self) -> (u32, u32) {
        (self.frame.width, self.frame.height)
    }

    fn create_stage(&mut self, stage: &CompiledStage) -> Result<NativeId, BackendError> {
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(match stage.stage {
                    crate::shader::ShaderStage::Vertex => "vertex stage",
                    crate::shader::ShaderStage::Fragment => "fragment stage",
                }),
                source: wgpu::ShaderSource::Wgsl(stage.wgsl.as_str().into()),
            });
        let id = self.allocate();
        self.stages.insert(id, module);
        Ok(id)
    }

    fn release_stage(&mut self, id: NativeId) {
        self.stages.remove(&id);
    }

    fn link_program(
        &mut self,
        vertex: NativeId,
        fragment: NativeId,
        layout: &ProgramLayout,
    ) -> Result<NativeId, BackendError> {
        let vs = self
            .stages
            .get(&vertex)
            .ok_or(BackendError::UnknownObject(vertex))?
            .clone();
        let fs = self
            .stages
            .get(&fragment)
            .ok_or(BackendError::UnknownObject(fragment))?
            .clone();

        let program = Program::new(&self.device, vs, fs, layout);
        let id = self.allocate();
        self.programs.insert(id, program);
        Ok(id)
    }

    fn delete_program(&mut self, id: NativeId) {
        self.programs.remove(&id);
    }

    fn create_buffer(&mut self, data: &[u8]) -> Result<NativeId, BackendError> {
        use wgpu::util::DeviceExt;

        if data.len() as u64 > self.limits.max_buffer_size {
            return Err(BackendError::ResourceCreationFailed(format!(
                "buffer of {} bytes exceeds the device limit",
                data.len()
            )));
        }

        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("vertex buffer"),
                contents: data,
                usage: wgpu::BufferUsages::VERTEX,
            });
        let id = self.allocate();
        self.buffers.insert(id, buffer);
        Ok(id)
    }

    fn delete_buffer(&mut self, id: NativeId) {
        self.buffers.remove(&id);
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        pixels: Option<&[u8]>,
    ) -> Result<NativeId, BackendError> {
        let max = self.limits.max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(BackendError::ResourceCreationFailed(format!(
                "texture size {width}x{height} outside 1..={max}"
            )));
        }

        let texture = GpuTexture::new(&self.device, "texture", width, height);
        if let Some(pixels) = pixels {
            texture.write(&self.queue, pixels);
        }
        let id = self.allocate();
        self.textures.insert(id, texture);
        Ok(id)
    }

    fn delete_texture(&mut self, id: NativeId) {
        self.textures.remove(&id);
    }

    fn clear(&mut self, target: Option<NativeId>, color: Vec4) {
        self.encode_clear(target, color);
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<(), BackendError> {
        self.encode_draw(call)
    }

    fn copy_region(
        &mut self,
        src: Option<NativeId>,
        dst: Option<NativeId>,
        region: Region,
        dst_origin: (u32, u32),
    ) -> Result<(), BackendError> {
        self.encode_copy(src, dst, region, dst_origin)
    }

    fn present(&mut self) -> Result<(), BackendError> {
        self.submit();
        self.wait_idle()
    }

    fn read_pixels(&mut self, target: Option<NativeId>) -> Result<Vec<u8>, BackendError> {
        self.encode_readback(target)
    }

    fn shutdown(&mut self) {
        self.submit();
        if let Err(e) = self.wait_idle() {
            log::warn!("wgpu shutdown: {e}");
        }
        self.programs.clear();
        self.stages.clear();
        self.buffers.clear();
        self.textures.clear();
        log::debug!("wgpu {} backend shut down", self.kind);
    }
}

/// Probe that brings up a [`WgpuBackend`] for one backend kind.
#[derive(Debug, Clone)]
pub struct WgpuProbe {
    kind: BackendKind,
    power_preference: PowerPreference,
    label: String,
}

impl WgpuProbe {
    pub fn new(kind: BackendKind, power_preference: PowerPreference, label: &str) -> Self {
        Self {
            kind,
            power_preference,
            label: label.to_string(),
        }
    }
}

impl BackendProbe for WgpuProbe {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn try_init(&self, width: u32, height: u32) -> Result<Box<dyn Backend>, BackendError> {
        let backend = WgpuBackend::new(
            self.kind,
            width,
            height,
            self.power_preference,
            &self.label,
        )?;
        Ok(Box::new(backend))
    }
}
