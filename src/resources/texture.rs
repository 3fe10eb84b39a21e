//! RGBA8 textures and sampling slots.

use crate::device::MAX_TEXTURE_SLOTS;
use crate::error::ResourceError;
use crate::types::TextureHandle;
use crate::DeviceContext;

impl DeviceContext {
    /// Create a texture from tightly packed RGBA8 pixels.
    pub fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<TextureHandle, ResourceError> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(ResourceError::PixelDataLength {
                expected,
                actual: pixels.len(),
            });
        }
        self.allocate_texture(width, height, Some(pixels))
    }

    /// Create a zeroed texture, typically used as an off-screen target.
    pub fn create_render_texture(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<TextureHandle, ResourceError> {
        self.allocate_texture(width, height, None)
    }

    fn allocate_texture(
        &mut self,
        width: u32,
        height: u32,
        pixels: Option<&[u8]>,
    ) -> Result<TextureHandle, ResourceError> {
        let max = match self.capabilities().max_texture_size {
            0 => u32::MAX,
            max => max,
        };
        if width == 0 || height == 0 || width > max || height > max {
            return Err(ResourceError::InvalidTextureSize { width, height, max });
        }

        let backend = self
            .backend_mut("create_texture")
            .ok_or(ResourceError::InvalidContext)?;
        let native = backend.create_texture(width, height, pixels)?;

        let id = self.registry.insert_texture(native, width, height);
        log::debug!("created texture {id} ({width}x{height})");
        Ok(TextureHandle::new(self.id(), id))
    }

    /// Associate a texture with a sampling slot. `None` empties the slot.
    pub fn bind_texture(&mut self, texture: Option<TextureHandle>, slot: u32) {
        let slot = slot as usize;
        if slot >= MAX_TEXTURE_SLOTS {
            log::warn!("bind_texture ignored: slot {slot} >= {MAX_TEXTURE_SLOTS}");
            return;
        }
        if let Some(handle) = texture {
            if !self.owns(handle.context, "bind_texture") {
                return;
            }
        }
        self.state.textures[slot] = texture;
    }

    pub fn bound_texture(&self, slot: u32) -> Option<TextureHandle> {
        self.state.textures.get(slot as usize).copied().flatten()
    }

    pub fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        if texture.context != self.id() {
            return None;
        }
        self.registry
            .textures
            .get(&texture.id)
            .map(|entry| (entry.width, entry.height))
    }

    /// Release a texture, clearing every slot and render target using it.
    pub fn delete_texture(&mut self, texture: TextureHandle) {
        if !self.owns(texture.context, "delete_texture") {
            return;
        }
        let Some(entry) = self.registry.textures.remove(&texture.id) else {
            log::warn!("delete_texture: texture {} does not exist", texture.raw());
            return;
        };
        for slot in self.state.textures.iter_mut() {
            if *slot == Some(texture) {
                *slot = None;
            }
        }
        if self.state.render_target == Some(texture) {
            self.state.render_target = None;
        }
        if let Some(backend) = self.backend_mut("delete_texture") {
            backend.delete_texture(entry.native);
        }
    }
}
