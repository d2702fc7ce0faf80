//! Framebuffer readback
//!
//! Copies an RGBA8 texture into CPU memory for image export and pixel tests.

use crate::context::GpuContext;
use crate::error::{RendererError, Result};

/// Tightly packed RGBA8 pixels, top row first
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl CapturedFrame {
    /// RGBA at `(x, y)`, `None` outside the frame
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        let px = self.pixels.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Pixels that differ between two frames of the same size
    /// (`None` when sizes differ)
    pub fn diff_pixel_count(&self, other: &CapturedFrame) -> Option<usize> {
        if self.width != other.width || self.height != other.height {
            return None;
        }
        Some(
            self.pixels
                .chunks_exact(4)
                .zip(other.pixels.chunks_exact(4))
                .filter(|(a, b)| a != b)
                .count(),
        )
    }

    pub fn is_identical_to(&self, other: &CapturedFrame) -> bool {
        self.diff_pixel_count(other) == Some(0)
    }

    /// Number of pixels matching `pred`
    pub fn count_pixels(&self, pred: impl Fn([u8; 4]) -> bool) -> usize {
        self.pixels
            .chunks_exact(4)
            .filter(|px| pred([px[0], px[1], px[2], px[3]]))
            .count()
    }
}

/// Read back a 4-byte-per-texel texture created with `COPY_SRC`
pub fn capture_texture(
    ctx: &GpuContext,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
) -> Result<CapturedFrame> {
    let device = ctx.device();
    let queue = ctx.queue();

    let unpadded_bytes_per_row = width * 4;
    let bytes_per_row = unpadded_bytes_per_row.next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
    let readback = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Buffer"),
        size: u64::from(bytes_per_row) * u64::from(height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Readback Encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &readback,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = readback.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);

    rx.recv()
        .map_err(|e| RendererError::Readback(e.to_string()))?
        .map_err(|e| RendererError::Readback(e.to_string()))?;

    let mut pixels = Vec::with_capacity((unpadded_bytes_per_row * height) as usize);
    {
        let data = slice.get_mapped_range();
        for row in data.chunks_exact(bytes_per_row as usize) {
            pixels.extend_from_slice(&row[..unpadded_bytes_per_row as usize]);
        }
    }
    readback.unmap();

    Ok(CapturedFrame {
        width,
        height,
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(pixels: &[[u8; 4]], width: u32) -> CapturedFrame {
        CapturedFrame {
            width,
            height: pixels.len() as u32 / width,
            pixels: pixels.iter().flatten().copied().collect(),
        }
    }

    #[test]
    fn pixel_lookup_is_row_major() {
        let f = frame(&[[1, 0, 0, 255], [2, 0, 0, 255], [3, 0, 0, 255], [4, 0, 0, 255]], 2);
        assert_eq!(f.pixel(1, 0), Some([2, 0, 0, 255]));
        assert_eq!(f.pixel(0, 1), Some([3, 0, 0, 255]));
        assert_eq!(f.pixel(2, 0), None);
    }

    #[test]
    fn diff_counts_changed_pixels() {
        let a = frame(&[[0; 4], [0; 4], [0; 4], [0; 4]], 2);
        let mut b = a.clone();
        b.pixels[4] = 9;
        assert_eq!(a.diff_pixel_count(&b), Some(1));
        assert!(!a.is_identical_to(&b));
        assert!(a.is_identical_to(&a.clone()));

        let c = frame(&[[0; 4], [0; 4]], 2);
        assert_eq!(a.diff_pixel_count(&c), None);
    }

    #[test]
    fn count_pixels_by_predicate() {
        let f = frame(&[[255; 4], [0, 0, 0, 255], [255; 4], [255; 4]], 2);
        assert_eq!(f.count_pixels(|px| px == [255; 4]), 3);
    }
}
