//! Static vertex buffers.

use crate::error::ResourceError;
use crate::types::{vertices_to_floats, BufferHandle, Vertex};
use crate::DeviceContext;

impl DeviceContext {
    /// Upload raw vertex data, [`Vertex::FLOATS`] floats per vertex.
    ///
    /// Buffers are written once here and never updated.
    pub fn create_buffer(&mut self, data: &[f32]) -> Result<BufferHandle, ResourceError> {
        if data.is_empty() {
            return Err(ResourceError::EmptyBuffer);
        }
        if data.len() % Vertex::FLOATS != 0 {
            return Err(ResourceError::PartialVertex(data.len()));
        }

        let backend = self
            .backend_mut("create_buffer")
            .ok_or(ResourceError::InvalidContext)?;
        let native = backend.create_buffer(bytemuck::cast_slice(data))?;

        let vertex_count = (data.len() / Vertex::FLOATS) as u32;
        let id = self.registry.insert_buffer(native, vertex_count);
        log::debug!("created buffer {id} ({vertex_count} vertices)");
        Ok(BufferHandle::new(self.id(), id))
    }

    pub fn create_vertex_buffer(&mut self, vertices: &[Vertex]) -> Result<BufferHandle, ResourceError> {
        self.create_buffer(&vertices_to_floats(vertices))
    }

    /// Bind the buffer following draws read from. `None` unbinds.
    pub fn bind_buffer(&mut self, buffer: Option<BufferHandle>) {
        if let Some(handle) = buffer {
            if !self.owns(handle.context, "bind_buffer") {
                return;
            }
        }
        self.state.buffer = buffer;
    }

    pub fn bound_buffer(&self) -> Option<BufferHandle> {
        self.state.buffer
    }

    /// Release a buffer, unbinding it if bound.
    pub fn delete_buffer(&mut self, buffer: BufferHandle) {
        if !self.owns(buffer.context, "delete_buffer") {
            return;
        }
        let Some(entry) = self.registry.buffers.remove(&buffer.id) else {
            log::warn!("delete_buffer: buffer {} does not exist", buffer.raw());
            return;
        };
        if self.state.buffer == Some(buffer) {
            self.state.buffer = None;
        }
        if let Some(backend) = self.backend_mut("delete_buffer") {
            backend.delete_buffer(entry.native);
        }
    }
}
