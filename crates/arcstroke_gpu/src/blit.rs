//! Full-screen blit pass
//!
//! Samples a rendered texture onto another target through a fragment stage,
//! either pass-through or a caller-supplied WGSL effect.

use std::sync::Arc;

use crate::attributes::{
    bind_attributes, buffer_layouts, vertex_attributes, BlitAttribute, VertexSource,
    BLIT_ATTRIBUTES,
};
use crate::context::GpuContext;
use crate::error::Result;
use crate::primitives::{BLIT_POSITIONS, BLIT_TEX_COORDS};
use crate::resources::{
    compile_and_link, create_render_pipeline_checked, create_vertex_buffer, RenderTarget,
};
use crate::shaders::blit_shader_source;

struct BlitBuffers {
    position: wgpu::Buffer,
    tex_coord: wgpu::Buffer,
}

impl VertexSource<BlitAttribute> for BlitBuffers {
    fn vertex_buffer(&self, role: BlitAttribute) -> &wgpu::Buffer {
        match role {
            BlitAttribute::Position => &self.position,
            BlitAttribute::TexCoord => &self.tex_coord,
        }
    }
}

pub struct BlitPass {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    buffers: BlitBuffers,
    clear_color: wgpu::Color,
}

impl BlitPass {
    /// Build a blit writing `format`. `effect` replaces the pass-through
    /// fragment stage; compile errors come back as `ShaderCompile`.
    pub fn new(ctx: &GpuContext, format: wgpu::TextureFormat, effect: Option<&str>) -> Result<Self> {
        let device = ctx.device().clone();
        let queue = ctx.queue().clone();

        let source = blit_shader_source(effect);
        let shader = compile_and_link(&device, "Blit Shader", &source)?;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Blit Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Blit Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let attributes = vertex_attributes(&BLIT_ATTRIBUTES);
        let vertex_buffers = buffer_layouts(&BLIT_ATTRIBUTES, &attributes);

        let pipeline = create_render_pipeline_checked(
            &device,
            &wgpu::RenderPipelineDescriptor {
                label: Some("Blit Pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &vertex_buffers,
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            },
        )?;

        // Nearest keeps a same-size copy exact
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Blit Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let buffers = BlitBuffers {
            position: create_vertex_buffer(
                &device,
                "Blit Positions",
                bytemuck::cast_slice(&BLIT_POSITIONS),
            ),
            tex_coord: create_vertex_buffer(
                &device,
                "Blit Tex Coords",
                bytemuck::cast_slice(&BLIT_TEX_COORDS),
            ),
        };

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
            sampler,
            buffers,
            clear_color: wgpu::Color::WHITE,
        })
    }

    /// Draw `source` over the whole of `target`
    pub fn process(&self, source: &wgpu::TextureView, target: &RenderTarget<'_>) {
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Blit Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Blit Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Blit Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &bind_group, &[]);
            bind_attributes(&mut render_pass, &BLIT_ATTRIBUTES, &self.buffers);
            render_pass.draw(0..BLIT_POSITIONS.len() as u32, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        tracing::trace!("Blit into {}x{}", target.width, target.height);
    }
}
