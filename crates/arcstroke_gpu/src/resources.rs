//! GPU resource helpers
//!
//! Shader compilation with CPU-side validation, pipeline creation inside a
//! validation error scope, vertex/index buffers and offscreen targets.

use wgpu::util::DeviceExt;

use crate::error::{RendererError, Result};

/// Smallest buffer ever allocated, so empty batches still bind a valid slice
pub const MIN_BUFFER_SIZE: u64 = 16;

/// Parse and validate WGSL with naga, returning the compiler diagnostic on failure
pub fn validate_wgsl(label: &str, source: &str) -> Result<naga::Module> {
    let module =
        naga::front::wgsl::parse_str(source).map_err(|e| RendererError::ShaderCompile {
            label: label.to_string(),
            log: e.emit_to_string(source),
        })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    )
    .validate(&module)
    .map_err(|e| RendererError::ShaderCompile {
        label: label.to_string(),
        log: e.emit_to_string(source),
    })?;

    Ok(module)
}

/// Compile a WGSL module holding both vertex and fragment stages.
///
/// Source is validated on the CPU first so errors carry the full diagnostic
/// instead of surfacing as a device validation panic.
pub fn compile_and_link(
    device: &wgpu::Device,
    label: &str,
    source: &str,
) -> Result<wgpu::ShaderModule> {
    validate_wgsl(label, source)?;
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    tracing::debug!("Compiled shader module `{}`", label);
    Ok(module)
}

/// Create a render pipeline, reporting validation failures (entry points,
/// vertex inputs, target formats) as [`RendererError::ShaderLink`].
pub fn create_render_pipeline_checked(
    device: &wgpu::Device,
    descriptor: &wgpu::RenderPipelineDescriptor<'_>,
) -> Result<wgpu::RenderPipeline> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline = device.create_render_pipeline(descriptor);
    if let Some(error) = pollster::block_on(device.pop_error_scope()) {
        return Err(RendererError::ShaderLink {
            label: descriptor.label.unwrap_or("unnamed").to_string(),
            log: error.to_string(),
        });
    }
    tracing::info!(
        "Created render pipeline `{}`",
        descriptor.label.unwrap_or("unnamed")
    );
    Ok(pipeline)
}

fn padded_size(len: usize) -> u64 {
    let size = (len as u64).max(MIN_BUFFER_SIZE);
    let align = wgpu::COPY_BUFFER_ALIGNMENT;
    size.div_ceil(align) * align
}

/// Vertex buffer initialised with `contents` (at least [`MIN_BUFFER_SIZE`] bytes)
pub fn create_vertex_buffer(device: &wgpu::Device, label: &str, contents: &[u8]) -> wgpu::Buffer {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: padded_size(contents.len()),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: true,
    });
    if !contents.is_empty() {
        buffer.slice(..).get_mapped_range_mut()[..contents.len()].copy_from_slice(contents);
    }
    buffer.unmap();
    buffer
}

/// Replace a vertex buffer's contents, reusing it when large enough.
///
/// Returns `true` when a new, larger buffer was allocated.
pub fn replace_vertex_buffer_data(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    buffer: &mut wgpu::Buffer,
    label: &str,
    contents: &[u8],
) -> bool {
    if buffer.size() >= contents.len() as u64 {
        if !contents.is_empty() {
            queue.write_buffer(buffer, 0, contents);
        }
        return false;
    }
    *buffer = create_vertex_buffer(device, label, contents);
    true
}

pub fn create_index_buffer(device: &wgpu::Device, label: &str, indices: &[u16]) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(indices),
        usage: wgpu::BufferUsages::INDEX,
    })
}

/// A texture rendered into offscreen, readable by copies and samplers
pub struct OffscreenTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
}

impl OffscreenTarget {
    pub fn new(device: &wgpu::Device, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen_target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            width,
            height,
            format,
        }
    }

    /// Borrow as a draw target
    pub fn target(&self) -> RenderTarget<'_> {
        RenderTarget {
            view: &self.view,
            width: self.width,
            height: self.height,
        }
    }
}

/// A borrowed color attachment and its pixel size
#[derive(Clone, Copy, Debug)]
pub struct RenderTarget<'a> {
    pub view: &'a wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl<'a> RenderTarget<'a> {
    pub fn new(view: &'a wgpu::TextureView, width: u32, height: u32) -> Self {
        Self {
            view,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaders::STROKE_SHADER;

    #[test]
    fn invalid_wgsl_reports_diagnostic() {
        let err = validate_wgsl("broken", "fn main( {").unwrap_err();
        match err {
            RendererError::ShaderCompile { label, log } => {
                assert_eq!(label, "broken");
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn type_errors_are_compile_errors() {
        let source = "fn f() -> f32 { return vec2<f32>(1.0); }";
        assert!(matches!(
            validate_wgsl("typed", source),
            Err(RendererError::ShaderCompile { .. })
        ));
    }

    #[test]
    fn stroke_shader_passes_validation() {
        assert!(validate_wgsl("stroke", STROKE_SHADER).is_ok());
    }

    #[test]
    fn buffer_sizes_are_padded() {
        assert_eq!(padded_size(0), 16);
        assert_eq!(padded_size(8), 16);
        assert_eq!(padded_size(20), 20);
        assert_eq!(padded_size(22), 24);
    }
}
