//! Recording clears, draws and copies into the pending command encoder.
//!
//! Each operation gets its own render pass so operations observe each
//! other's results in call order. Work is submitted by `present` or a
//! readback.

use wgpu::util::DeviceExt;

use crate::backend::{BackendError, DrawCall, NativeId};
use crate::types::Region;

use super::resources::GpuTexture;
use super::WgpuBackend;

impl WgpuBackend {
    pub(super) fn target(&self, target: Option<NativeId>) -> Result<&GpuTexture, BackendError> {
        match target {
            None => Ok(&self.frame),
            Some(id) => self.textures.get(&id).ok_or(BackendError::UnknownObject(id)),
        }
    }

    fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        let device = &self.device;
        self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            })
        })
    }

    pub(super) fn encode_clear(&mut self, target: Option<NativeId>, color: glam::Vec4) {
        let view = match self.target(target) {
            Ok(texture) => texture.view.clone(),
            Err(e) => {
                log::warn!("clear skipped: {e}");
                return;
            }
        };

        let encoder = self.encoder();
        let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: color.x as f64,
                        g: color.y as f64,
                        b: color.z as f64,
                        a: color.w as f64,
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }

    pub(super) fn encode_draw(&mut self, call: &DrawCall<'_>) -> Result<(), BackendError> {
        if let Some(target) = call.target {
            if call.textures.contains(&Some(target)) {
                return Err(BackendError::InvalidParameter(format!(
                    "texture {target} is bound for sampling and as the render target"
                )));
            }
        }

        let target = self.target(call.target)?.clone();
        let Some(viewport) = call
            .viewport
            .intersect(&Region::from_size(target.width, target.height))
        else {
            log::trace!("draw skipped: viewport outside the target");
            return Ok(());
        };

        let vertex_buffer = self
            .buffers
            .get(&call.vertex_buffer)
            .ok_or(BackendError::UnknownObject(call.vertex_buffer))?
            .clone();

        let program = self
            .programs
            .get_mut(&call.program)
            .ok_or(BackendError::UnknownObject(call.program))?;
        let pipeline = program.pipeline(&self.device, call.topology, call.blend);

        let uniform_buffers: Vec<(u32, wgpu::Buffer)> = call
            .uniforms
            .iter()
            .map(|block| {
                let buffer = self
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("uniform block"),
                        contents: &block.bytes,
                        usage: wgpu::BufferUsages::UNIFORM,
                    });
                (block.binding, buffer)
            })
            .collect();

        let mut texture_views = Vec::with_capacity(program.layout.textures.len());
        for binding in &program.layout.textures {
            let bound = call.textures.get(binding.slot as usize).copied().flatten();
            let view = match bound {
                Some(id) => self
                    .textures
                    .get(&id)
                    .ok_or(BackendError::UnknownObject(id))?
                    .view
                    .clone(),
                None => self.fallback.view.clone(),
            };
            texture_views.push((binding.binding, view));
        }

        let mut entries: Vec<wgpu::BindGroupEntry<'_>> = Vec::new();
        for (binding, buffer) in &uniform_buffers {
            entries.push(wgpu::BindGroupEntry {
                binding: *binding,
                resource: buffer.as_entire_binding(),
            });
        }
        for (binding, view) in &texture_views {
            entries.push(wgpu::BindGroupEntry {
                binding: *binding,
                resource: wgpu::BindingResource::TextureView(view),
            });
        }
        for sampler in &program.layout.samplers {
            entries.push(wgpu::BindGroupEntry {
                binding: sampler.binding,
                resource: wgpu::BindingResource::Sampler(&self.sampler),
            });
        }

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw bind group"),
            layout: &program.bind_group_layout,
            entries: &entries,
        });

        let index_buffer = call.indices.map(|indices| {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("index buffer"),
                    contents: bytemuck::cast_slice(indices),
                    usage: wgpu::BufferUsages::INDEX,
                })
        });

        log::trace!(
            "draw program {} ({:?}, {} vertices) into {:?}",
            call.program,
            call.topology,
            call.vertices.len(),
            call.target
        );

        let encoder = self.encoder();
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("draw"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_viewport(
            viewport.x as f32,
            viewport.y as f32,
            viewport.width as f32,
            viewport.height as f32,
            0.0,
            1.0,
        );
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.set_vertex_buffer(0, vertex_buffer.slice(..));

        match (&index_buffer, call.indices) {
            (Some(buffer), Some(indices)) => {
                pass.set_index_buffer(buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..indices.len() as u32, 0, 0..1);
            }
            _ => pass.draw(call.vertices.clone(), 0..1),
        }

        Ok(())
    }

    pub(super) fn encode_copy(
        &mut self,
        src: Option<NativeId>,
        dst: Option<NativeId>,
        region: Region,
        dst_origin: (u32, u32),
    ) -> Result<(), BackendError> {
        let src = self.target(src)?.clone();
        let dst = self.target(dst)?.clone();

        let width = region
            .width
            .min(src.width.saturating_sub(region.x.max(0) as u32))
            .min(dst.width.saturating_sub(dst_origin.0));
        let height = region
            .height
            .min(src.height.saturating_sub(region.y.max(0) as u32))
            .min(dst.height.saturating_sub(dst_origin.1));
        if region.x < 0 || region.y < 0 || width == 0 || height == 0 {
            return Err(BackendError::InvalidParameter(format!(
                "copy region {region:?} does not fit its textures"
            )));
        }

        self.encoder().copy_texture_to_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &src.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: region.x as u32,
                    y: region.y as u32,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyTextureInfo {
                texture: &dst.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: dst_origin.0,
                    y: dst_origin.1,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    /// Submit whatever was recorded so far.
    pub(super) fn submit(&mut self) -> Option<wgpu::SubmissionIndex> {
        self.encoder
            .take()
            .map(|encoder| self.queue.submit(std::iter::once(encoder.finish())))
    }

    pub(super) fn wait_idle(&self) -> Result<(), BackendError> {
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map(|_| ())
            .map_err(|e| BackendError::DeviceLost(e.to_string()))
    }

    pub(super) fn encode_readback(
        &mut self,
        target: Option<NativeId>,
    ) -> Result<Vec<u8>, BackendError> {
        let source = self.target(target)?.clone();
        let unpadded = source.width * 4;
        let padded = unpadded.next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback staging buffer"),
            size: padded as u64 * source.height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        self.encoder().copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &source.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(source.height),
                },
            },
            wgpu::Extent3d {
                width: source.width,
                height: source.height,
                depth_or_array_layers: 1,
            },
        );
        self.submit();

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.wait_idle()?;

        rx.recv()
            .map_err(|e| BackendError::ReadbackFailed(e.to_string()))?
            .map_err(|e| BackendError::ReadbackFailed(e.to_string()))?;

        let mut pixels = Vec::with_capacity((unpadded * source.height) as usize);
        {
            let mapped = slice.get_mapped_range();
            for row in mapped.chunks(padded as usize) {
                pixels.extend_from_slice(&row[..unpadded as usize]);
            }
        }
        staging.unmap();

        Ok(pixels)
    }
}
