//! Dummy backend for testing and development.
//!
//! This backend doesn't touch a GPU. It records every call in a shared
//! [`DummyRecorder`] and tracks which native objects are alive, so tests can
//! observe what the device context sent down and whether anything leaked.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use glam::Vec4;
use parking_lot::Mutex;

use crate::negotiator::BackendProbe;
use crate::shader::{CompiledStage, ProgramLayout, ShaderStage};
use crate::types::{BackendKind, BlendFactors, Region, Topology};

use super::{Backend, BackendError, CapabilityQuery, DrawCall, NativeId, UniformData};

/// A call received by a [`DummyBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum DummyCall {
    CreateStage {
        id: NativeId,
        stage: ShaderStage,
    },
    ReleaseStage(NativeId),
    LinkProgram {
        id: NativeId,
        vertex: NativeId,
        fragment: NativeId,
    },
    DeleteProgram(NativeId),
    CreateBuffer {
        id: NativeId,
        size: usize,
    },
    DeleteBuffer(NativeId),
    CreateTexture {
        id: NativeId,
        width: u32,
        height: u32,
    },
    DeleteTexture(NativeId),
    Clear {
        target: Option<NativeId>,
        color: Vec4,
    },
    Draw {
        program: NativeId,
        topology: Topology,
        vertex_count: u32,
        indexed: bool,
        blend: Option<BlendFactors>,
        viewport: Region,
        target: Option<NativeId>,
        textures: Vec<Option<NativeId>>,
        uniforms: Vec<UniformData>,
    },
    Copy {
        src: Option<NativeId>,
        dst: Option<NativeId>,
        region: Region,
        dst_origin: (u32, u32),
    },
    Present,
    Shutdown,
}

#[derive(Debug, Default)]
struct RecorderState {
    calls: Vec<DummyCall>,
    stages: HashSet<NativeId>,
    programs: HashSet<NativeId>,
    buffers: HashSet<NativeId>,
    textures: HashMap<NativeId, (u32, u32)>,
    fail_link: bool,
    fail_allocation: bool,
    shut_down: bool,
}

/// Shared view of what a [`DummyBackend`] received.
#[derive(Debug, Clone, Default)]
pub struct DummyRecorder(Arc<Mutex<RecorderState>>);

impl DummyRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<DummyCall> {
        self.0.lock().calls.clone()
    }

    /// Only the draw calls.
    pub fn draws(&self) -> Vec<DummyCall> {
        self.0
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, DummyCall::Draw { .. }))
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.0.lock().calls.clear();
    }

    pub fn live_stages(&self) -> usize {
        self.0.lock().stages.len()
    }

    pub fn live_programs(&self) -> usize {
        self.0.lock().programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.0.lock().buffers.len()
    }

    pub fn live_textures(&self) -> usize {
        self.0.lock().textures.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.0.lock().shut_down
    }

    /// Make every following `link_program` fail.
    pub fn fail_link(&self, fail: bool) {
        self.0.lock().fail_link = fail;
    }

    /// Make every following buffer or texture creation fail.
    pub fn fail_allocation(&self, fail: bool) {
        self.0.lock().fail_allocation = fail;
    }

    fn record(&self, call: DummyCall) {
        self.0.lock().calls.push(call);
    }
}

/// Dummy GPU backend.
#[derive(Debug)]
pub struct DummyBackend {
    kind: BackendKind,
    width: u32,
    height: u32,
    next_id: NativeId,
    frame_color: Vec4,
    recorder: DummyRecorder,
}

impl DummyBackend {
    /// Create a backend reporting `kind` with a `width` x `height` frame.
    pub fn new(kind: BackendKind, width: u32, height: u32) -> Self {
        Self::with_recorder(kind, width, height, DummyRecorder::new())
    }

    /// Create a backend that reports into an existing recorder.
    pub fn with_recorder(
        kind: BackendKind,
        width: u32,
        height: u32,
        recorder: DummyRecorder,
    ) -> Self {
        Self {
            kind,
            width,
            height,
            next_id: 1,
            frame_color: Vec4::ZERO,
            recorder,
        }
    }

    pub fn recorder(&self) -> DummyRecorder {
        self.recorder.clone()
    }

    fn allocate(&mut self) -> NativeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn check_allocation(&self, what: &str) -> Result<(), BackendError> {
        if self.recorder.0.lock().fail_allocation {
            return Err(BackendError::ResourceCreationFailed(format!(
                "dummy {what} allocation disabled"
            )));
        }
        Ok(())
    }

    fn target_size(&self, target: Option<NativeId>) -> Result<(u32, u32), BackendError> {
        match target {
            None => Ok((self.width, self.height)),
            Some(id) => self
                .recorder
                .0
                .lock()
                .textures
                .get(&id)
                .copied()
                .ok_or(BackendError::UnknownObject(id)),
        }
    }
}

impl Backend for DummyBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn capabilities(&self) -> CapabilityQuery {
        CapabilityQuery {
            name: Some("Dummy Device".to_string()),
            vendor: Some("Dummy".to_string()),
            driver_version: None,
            max_texture_size: Some(8192),
            supports_compute: Some(false),
        }
    }

    fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn create_stage(&mut self, stage: &CompiledStage) -> Result<NativeId, BackendError> {
        let id = self.allocate();
        log::trace!("DummyBackend: creating {} stage {id}", stage.stage);
        self.recorder.0.lock().stages.insert(id);
        self.recorder.record(DummyCall::CreateStage {
            id,
            stage: stage.stage,
        });
        Ok(id)
    }

    fn release_stage(&mut self, id: NativeId) {
        log::trace!("DummyBackend: releasing stage {id}");
        self.recorder.0.lock().stages.remove(&id);
        self.recorder.record(DummyCall::ReleaseStage(id));
    }

    fn link_program(
        &mut self,
        vertex: NativeId,
        fragment: NativeId,
        _layout: &ProgramLayout,
    ) -> Result<NativeId, BackendError> {
        {
            let state = self.recorder.0.lock();
            if state.fail_link {
                return Err(BackendError::ResourceCreationFailed(
                    "dummy link failure".to_string(),
                ));
            }
            for stage in [vertex, fragment] {
                if !state.stages.contains(&stage) {
                    return Err(BackendError::UnknownObject(stage));
                }
            }
        }

        let id = self.allocate();
        log::trace!("DummyBackend: linking program {id} ({vertex}, {fragment})");
        self.recorder.0.lock().programs.insert(id);
        self.recorder.record(DummyCall::LinkProgram {
            id,
            vertex,
            fragment,
        });
        Ok(id)
    }

    fn delete_program(&mut self, id: NativeId) {
        self.recorder.0.lock().programs.remove(&id);
        self.recorder.record(DummyCall::DeleteProgram(id));
    }

    fn create_buffer(&mut self, data: &[u8]) -> Result<NativeId, BackendError> {
        self.check_allocation("buffer")?;
        let id = self.allocate();
        log::trace!("DummyBackend: creating buffer {id} (size: {})", data.len());
        self.recorder.0.lock().buffers.insert(id);
        self.recorder.record(DummyCall::CreateBuffer {
            id,
            size: data.len(),
        });
        Ok(id)
    }

    fn delete_buffer(&mut self, id: NativeId) {
        self.recorder.0.lock().buffers.remove(&id);
        self.recorder.record(DummyCall::DeleteBuffer(id));
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        _pixels: Option<&[u8]>,
    ) -> Result<NativeId, BackendError> {
        self.check_allocation("texture")?;
        let id = self.allocate();
        log::trace!("DummyBackend: creating texture {id} ({width}x{height})");
        self.recorder.0.lock().textures.insert(id, (width, height));
        self.recorder.record(DummyCall::CreateTexture { id, width, height });
        Ok(id)
    }

    fn delete_texture(&mut self, id: NativeId) {
        self.recorder.0.lock().textures.remove(&id);
        self.recorder.record(DummyCall::DeleteTexture(id));
    }

    fn clear(&mut self, target: Option<NativeId>, color: Vec4) {
        if target.is_none() {
            self.frame_color = color;
        }
        self.recorder.record(DummyCall::Clear { target, color });
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<(), BackendError> {
        {
            let state = self.recorder.0.lock();
            if !state.programs.contains(&call.program) {
                return Err(BackendError::UnknownObject(call.program));
            }
            if !state.buffers.contains(&call.vertex_buffer) {
                return Err(BackendError::UnknownObject(call.vertex_buffer));
            }
        }
        self.target_size(call.target)?;

        let vertex_count = match call.indices {
            Some(indices) => indices.len() as u32,
            None => call.vertices.end.saturating_sub(call.vertices.start),
        };
        self.recorder.record(DummyCall::Draw {
            program: call.program,
            topology: call.topology,
            vertex_count,
            indexed: call.indices.is_some(),
            blend: call.blend,
            viewport: call.viewport,
            target: call.target,
            textures: call.textures.to_vec(),
            uniforms: call.uniforms.to_vec(),
        });
        Ok(())
    }

    fn copy_region(
        &mut self,
        src: Option<NativeId>,
        dst: Option<NativeId>,
        region: Region,
        dst_origin: (u32, u32),
    ) -> Result<(), BackendError> {
        self.target_size(src)?;
        self.target_size(dst)?;
        self.recorder.record(DummyCall::Copy {
            src,
            dst,
            region,
            dst_origin,
        });
        Ok(())
    }

    fn present(&mut self) -> Result<(), BackendError> {
        self.recorder.record(DummyCall::Present);
        Ok(())
    }

    /// The frame reads back as its last clear color; textures read as zero.
    fn read_pixels(&mut self, target: Option<NativeId>) -> Result<Vec<u8>, BackendError> {
        let (width, height) = self.target_size(target)?;
        let texel = match target {
            None => (self.frame_color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0)
                .round()
                .to_array()
                .map(|c| c as u8),
            Some(_) => [0; 4],
        };
        Ok(texel.repeat((width * height) as usize))
    }

    fn shutdown(&mut self) {
        log::trace!("DummyBackend: shutdown");
        let mut state = self.recorder.0.lock();
        state.shut_down = true;
        state.calls.push(DummyCall::Shutdown);
    }
}

/// Probe that yields a [`DummyBackend`] or a scripted failure.
#[derive(Debug, Clone)]
pub struct DummyProbe {
    kind: BackendKind,
    available: bool,
    attempts: Arc<AtomicUsize>,
    recorder: DummyRecorder,
}

impl DummyProbe {
    pub fn available(kind: BackendKind) -> Self {
        Self {
            kind,
            available: true,
            attempts: Arc::new(AtomicUsize::new(0)),
            recorder: DummyRecorder::new(),
        }
    }

    pub fn failing(kind: BackendKind) -> Self {
        Self {
            available: false,
            ..Self::available(kind)
        }
    }

    /// How many times negotiation tried this probe.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Recorder shared with every backend this probe creates.
    pub fn recorder(&self) -> DummyRecorder {
        self.recorder.clone()
    }
}

impl BackendProbe for DummyProbe {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn try_init(&self, width: u32, height: u32) -> Result<Box<dyn Backend>, BackendError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if !self.available {
            return Err(BackendError::InitializationFailed(format!(
                "{} disabled for this probe",
                self.kind
            )));
        }
        Ok(Box::new(DummyBackend::with_recorder(
            self.kind,
            width,
            height,
            self.recorder.clone(),
        )))
    }
}
