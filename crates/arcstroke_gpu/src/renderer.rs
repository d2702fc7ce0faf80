//! Instanced path stroke renderer
//!
//! Every segment of the current batch becomes one instance of a unit quad.
//! The vertex stage places the quad over the segment's stroke footprint and
//! the fragment stage computes antialiased coverage from the distance to the
//! segment, so a whole batch is a single indexed draw.

use std::sync::Arc;

use arcstroke_core::{PathBatch, StrokeStyle};

use crate::attributes::{bind_attributes, STROKE_ATTRIBUTES};
use crate::context::GpuContext;
use crate::error::Result;
use crate::pipeline::StrokePipeline;
use crate::primitives::StrokeUniforms;
use crate::resources::RenderTarget;
use crate::store::{PathBatchStore, StrokeVertexSource};

/// Counters for one [`PathRenderer::draw`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub instances: u32,
}

pub struct PathRenderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipeline: StrokePipeline,
    store: PathBatchStore,
    style: StrokeStyle,
    clear_color: wgpu::Color,
}

impl PathRenderer {
    /// Build the stroke pipeline for the context's texture format
    pub fn new(ctx: &GpuContext) -> Result<Self> {
        Self::with_format(ctx, ctx.texture_format())
    }

    /// Build the stroke pipeline for an explicit target format
    pub fn with_format(ctx: &GpuContext, format: wgpu::TextureFormat) -> Result<Self> {
        let device = ctx.device().clone();
        let queue = ctx.queue().clone();
        let pipeline = StrokePipeline::new(&device, format)?;
        let store = PathBatchStore::new(&device, ctx.config().max_instances);

        Ok(Self {
            device,
            queue,
            pipeline,
            store,
            style: StrokeStyle::default(),
            clear_color: ctx.config().clear_color,
        })
    }

    /// Replace the batch drawn by subsequent frames
    pub fn set_data(&mut self, batch: &PathBatch) -> Result<()> {
        self.store.set_data(&self.device, &self.queue, batch)
    }

    pub fn set_style(&mut self, style: StrokeStyle) {
        self.style = style;
    }

    pub fn style(&self) -> &StrokeStyle {
        &self.style
    }

    pub fn instance_count(&self) -> u32 {
        self.store.instance_count()
    }

    /// Clear `target` and draw the current batch into it.
    ///
    /// The indexed draw is issued even for an empty batch; zero instances
    /// rasterize nothing.
    pub fn draw(&self, target: &RenderTarget<'_>) -> FrameStats {
        let uniforms = StrokeUniforms::new(&self.style, target.width, target.height);
        self.pipeline.write_uniforms(&self.queue, &uniforms);

        let instances = self.store.instance_count();
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Stroke Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Stroke Render Pass"),
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

            render_pass.set_pipeline(self.pipeline.pipeline());
            render_pass.set_bind_group(0, self.pipeline.bind_group(), &[]);
            let source = StrokeVertexSource {
                corners: self.pipeline.corner_buffer(),
                store: &self.store,
            };
            bind_attributes(&mut render_pass, &STROKE_ATTRIBUTES, &source);
            render_pass.set_index_buffer(
                self.pipeline.index_buffer().slice(..),
                wgpu::IndexFormat::Uint16,
            );
            render_pass.draw_indexed(0..self.pipeline.index_count(), 0, 0..instances);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        tracing::trace!(
            "Drew {} stroke instances into {}x{}",
            instances,
            target.width,
            target.height
        );

        FrameStats {
            draw_calls: 1,
            instances,
        }
    }
}
