//! wgpu-side resource objects: render targets and linked programs.

use std::collections::HashMap;

use crate::shader::ProgramLayout;
use crate::types::{BlendFactors, Topology, Vertex};

use super::conversion::{convert_blend, convert_stage_mask, convert_topology, strip_index_format};

/// Every texture and the frame share this format.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4, 2 => Float32x2];

/// A texture usable for sampling, copies and rendering.
#[derive(Debug, Clone)]
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl GpuTexture {
    pub fn new(device: &wgpu::Device, label: &str, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            width,
            height,
        }
    }

    /// Upload tightly packed RGBA8 pixels covering the whole texture.
    pub fn write(&self, queue: &wgpu::Queue, pixels: &[u8]) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.width * 4),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

/// A linked program and the pipelines built from it so far.
#[derive(Debug)]
pub struct Program {
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    pub layout: ProgramLayout,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<(Topology, Option<BlendFactors>), wgpu::RenderPipeline>,
}

impl Program {
    pub fn new(
        device: &wgpu::Device,
        vertex: wgpu::ShaderModule,
        fragment: wgpu::ShaderModule,
        layout: &ProgramLayout,
    ) -> Self {
        let mut entries = Vec::new();
        for block in &layout.uniform_blocks {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: block.binding,
                visibility: convert_stage_mask(block.visibility),
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            });
        }
        for texture in &layout.textures {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: texture.binding,
                visibility: convert_stage_mask(texture.visibility),
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
        }
        for sampler in &layout.samplers {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: sampler.binding,
                visibility: convert_stage_mask(sampler.visibility),
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            });
        }

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("program bind group layout"),
            entries: &entries,
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("program pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        Self {
            vertex,
            fragment,
            layout: layout.clone(),
            bind_group_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
        }
    }

    /// Pipeline for a topology and blend pair, built on first use.
    pub fn pipeline(
        &mut self,
        device: &wgpu::Device,
        topology: Topology,
        blend: Option<BlendFactors>,
    ) -> wgpu::RenderPipeline {
        if let Some(pipeline) = self.pipelines.get(&(topology, blend)) {
            return pipeline.clone();
        }

        log::debug!("building pipeline for {topology:?} with blend {blend:?}");
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("program pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &self.vertex,
                entry_point: None,
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: Vertex::STRIDE,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &VERTEX_ATTRIBUTES,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.fragment,
                entry_point: None,
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TARGET_FORMAT,
                    blend: blend.map(convert_blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: convert_topology(topology),
                strip_index_format: strip_index_format(topology),
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.pipelines.insert((topology, blend), pipeline.clone());
        pipeline
    }
}
