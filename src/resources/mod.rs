//! Resource manager: shader programs, vertex buffers and textures.
//!
//! Resources are created through the owning [`DeviceContext`] and named by
//! context-scoped handles. The registry maps each handle to the backend's
//! native object plus whatever CPU-side state the resource needs (uniform
//! staging for programs, vertex counts, texture sizes).
//!
//! [`DeviceContext`]: crate::DeviceContext

mod buffer;
mod shader;
mod texture;

use std::collections::HashMap;
use std::num::NonZeroU32;

use crate::backend::{Backend, NativeId, UniformData};
use crate::shader::ProgramLayout;
use crate::types::IdAllocator;

pub(crate) struct ProgramEntry {
    pub native: NativeId,
    pub layout: ProgramLayout,
    /// CPU copy of every uniform block, uploaded with each draw.
    pub uniforms: Vec<UniformData>,
}

pub(crate) struct BufferEntry {
    pub native: NativeId,
    pub vertex_count: u32,
}

pub(crate) struct TextureEntry {
    pub native: NativeId,
    pub width: u32,
    pub height: u32,
}

/// A native object due for release.
pub(crate) enum Released {
    Program(NativeId),
    Buffer(NativeId),
    Texture(NativeId),
}

impl Released {
    pub fn release(self, backend: &mut dyn Backend) {
        match self {
            Self::Program(id) => backend.delete_program(id),
            Self::Buffer(id) => backend.delete_buffer(id),
            Self::Texture(id) => backend.delete_texture(id),
        }
    }
}

/// Live resource counts of one context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    pub shaders: usize,
    pub buffers: usize,
    pub textures: usize,
}

#[derive(Default)]
pub(crate) struct Registry {
    ids: IdAllocator,
    pub shaders: HashMap<NonZeroU32, ProgramEntry>,
    pub buffers: HashMap<NonZeroU32, BufferEntry>,
    pub textures: HashMap<NonZeroU32, TextureEntry>,
}

impl Registry {
    pub fn insert_shader(&mut self, native: NativeId, layout: ProgramLayout) -> NonZeroU32 {
        let uniforms = layout
            .uniform_blocks
            .iter()
            .map(|block| UniformData {
                binding: block.binding,
                bytes: vec![0; block.size as usize],
            })
            .collect();
        let id = self.ids.allocate();
        self.shaders.insert(
            id,
            ProgramEntry {
                native,
                layout,
                uniforms,
            },
        );
        id
    }

    pub fn insert_buffer(&mut self, native: NativeId, vertex_count: u32) -> NonZeroU32 {
        let id = self.ids.allocate();
        self.buffers.insert(
            id,
            BufferEntry {
                native,
                vertex_count,
            },
        );
        id
    }

    pub fn insert_texture(&mut self, native: NativeId, width: u32, height: u32) -> NonZeroU32 {
        let id = self.ids.allocate();
        self.textures.insert(
            id,
            TextureEntry {
                native,
                width,
                height,
            },
        );
        id
    }

    pub fn counts(&self) -> ResourceCounts {
        ResourceCounts {
            shaders: self.shaders.len(),
            buffers: self.buffers.len(),
            textures: self.textures.len(),
        }
    }

    /// Empty the registry, newest resource first.
    pub fn drain_newest_first(&mut self) -> Vec<Released> {
        let mut all: Vec<(NonZeroU32, Released)> = self
            .shaders
            .drain()
            .map(|(id, entry)| (id, Released::Program(entry.native)))
            .chain(
                self.buffers
                    .drain()
                    .map(|(id, entry)| (id, Released::Buffer(entry.native))),
            )
            .chain(
                self.textures
                    .drain()
                    .map(|(id, entry)| (id, Released::Texture(entry.native))),
            )
            .collect();
        all.sort_unstable_by(|a, b| b.0.cmp(&a.0));
        all.into_iter().map(|(_, released)| released).collect()
    }
}
