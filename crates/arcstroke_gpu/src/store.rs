//! Per-instance column buffers
//!
//! A [`PathBatchStore`] owns one GPU buffer per segment column. Uploading a
//! batch replaces every column at once; buffers grow on demand and are
//! reused when the new batch fits.

use arcstroke_core::PathBatch;

use crate::attributes::{StrokeAttribute, VertexSource};
use crate::error::{RendererError, Result};
use crate::resources::{create_vertex_buffer, replace_vertex_buffer_data};

/// Instance count for a draw call, or an error when `count` exceeds `limit`
/// or does not fit the draw call's `u32`.
fn checked_instance_count(count: usize, limit: usize) -> Result<u32> {
    let limit = limit.min(u32::MAX as usize);
    if count > limit {
        return Err(RendererError::InstanceLimit { count, limit });
    }
    u32::try_from(count).map_err(|_| RendererError::InstanceLimit { count, limit })
}

/// GPU-resident copy of the current path batch
pub struct PathBatchStore {
    start_pos: wgpu::Buffer,
    end_pos: wgpu::Buffer,
    prev_pos: wgpu::Buffer,
    next_pos: wgpu::Buffer,
    kind: wgpu::Buffer,
    cp: wgpu::Buffer,
    color: wgpu::Buffer,
    instance_count: u32,
    max_instances: usize,
}

impl PathBatchStore {
    /// Create an empty store holding at most `max_instances` segments
    pub fn new(device: &wgpu::Device, max_instances: usize) -> Self {
        Self {
            start_pos: create_vertex_buffer(device, "start_pos", &[]),
            end_pos: create_vertex_buffer(device, "end_pos", &[]),
            prev_pos: create_vertex_buffer(device, "prev_pos", &[]),
            next_pos: create_vertex_buffer(device, "next_pos", &[]),
            kind: create_vertex_buffer(device, "kind", &[]),
            cp: create_vertex_buffer(device, "cp", &[]),
            color: create_vertex_buffer(device, "color", &[]),
            instance_count: 0,
            max_instances,
        }
    }

    /// Replace the stored batch.
    ///
    /// On error nothing is uploaded and the previous batch stays current.
    pub fn set_data(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        batch: &PathBatch,
    ) -> Result<()> {
        let instance_count = checked_instance_count(batch.len(), self.max_instances)?;

        let columns = batch.columns();
        let mut grown = 0;
        let uploads: [(&mut wgpu::Buffer, &str, &[u8]); 7] = [
            (
                &mut self.start_pos,
                "start_pos",
                bytemuck::cast_slice(&columns.start_pos),
            ),
            (
                &mut self.end_pos,
                "end_pos",
                bytemuck::cast_slice(&columns.end_pos),
            ),
            (
                &mut self.prev_pos,
                "prev_pos",
                bytemuck::cast_slice(&columns.prev_pos),
            ),
            (
                &mut self.next_pos,
                "next_pos",
                bytemuck::cast_slice(&columns.next_pos),
            ),
            (&mut self.kind, "kind", bytemuck::cast_slice(&columns.kind)),
            (&mut self.cp, "cp", bytemuck::cast_slice(&columns.cp)),
            (&mut self.color, "color", bytemuck::cast_slice(&columns.color)),
        ];
        for (buffer, label, contents) in uploads {
            if replace_vertex_buffer_data(device, queue, buffer, label, contents) {
                grown += 1;
            }
        }

        self.instance_count = instance_count;
        tracing::debug!(
            "Uploaded {} segments ({} column buffers reallocated)",
            self.instance_count,
            grown
        );
        Ok(())
    }

    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }

    /// Buffer backing an instance column, `None` for the shared quad corner
    pub fn column(&self, role: StrokeAttribute) -> Option<&wgpu::Buffer> {
        match role {
            StrokeAttribute::Corner => None,
            StrokeAttribute::StartPos => Some(&self.start_pos),
            StrokeAttribute::EndPos => Some(&self.end_pos),
            StrokeAttribute::PrevPos => Some(&self.prev_pos),
            StrokeAttribute::NextPos => Some(&self.next_pos),
            StrokeAttribute::SegmentType => Some(&self.kind),
            StrokeAttribute::ControlParams => Some(&self.cp),
            StrokeAttribute::Color => Some(&self.color),
        }
    }
}

/// Instance columns paired with the quad corner buffer, for binding a draw
pub struct StrokeVertexSource<'a> {
    pub corners: &'a wgpu::Buffer,
    pub store: &'a PathBatchStore,
}

impl VertexSource<StrokeAttribute> for StrokeVertexSource<'_> {
    fn vertex_buffer(&self, role: StrokeAttribute) -> &wgpu::Buffer {
        self.store.column(role).unwrap_or(self.corners)
    }
}
