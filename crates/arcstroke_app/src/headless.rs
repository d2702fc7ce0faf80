//! Offscreen render to PNG

use std::path::Path;

use anyhow::{Context, Result};
use arcstroke_core::{PathBatch, StrokeStyle};
use arcstroke_gpu::{
    capture_texture, CapturedFrame, GpuContext, OffscreenTarget, PathRenderer, RendererConfig,
};

pub struct HeadlessOptions {
    pub width: u32,
    pub height: u32,
    pub style: StrokeStyle,
    pub clear_color: wgpu::Color,
}

/// Render `batch` offscreen and read the frame back
pub fn render_frame(batch: &PathBatch, options: &HeadlessOptions) -> Result<CapturedFrame> {
    let config = RendererConfig {
        clear_color: options.clear_color,
        ..Default::default()
    };
    let ctx = pollster::block_on(GpuContext::new(config)).context("Failed to create GPU context")?;

    let mut renderer = PathRenderer::new(&ctx)?;
    renderer.set_style(options.style);
    renderer.set_data(batch)?;

    let target = OffscreenTarget::new(
        ctx.device(),
        options.width,
        options.height,
        ctx.texture_format(),
    );
    let stats = renderer.draw(&target.target());
    tracing::info!(
        "Rendered {} segments in {} draw call(s)",
        stats.instances,
        stats.draw_calls
    );

    Ok(capture_texture(&ctx, &target.texture, target.width, target.height)?)
}

pub fn write_png(frame: CapturedFrame, path: &Path) -> Result<()> {
    let CapturedFrame {
        width,
        height,
        pixels,
    } = frame;
    let image = image::RgbaImage::from_raw(width, height, pixels)
        .context("Captured frame does not match its dimensions")?;
    image
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Wrote {}x{} image to {}", width, height, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_export_keeps_pixels() {
        let dir = std::env::temp_dir().join("arcstroke_png_export");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("frame.png");

        let frame = CapturedFrame {
            width: 2,
            height: 1,
            pixels: vec![255, 0, 0, 255, 0, 0, 255, 128],
        };
        write_png(frame.clone(), &path).unwrap();

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (2, 1));
        assert_eq!(loaded.into_raw(), frame.pixels);
    }

    #[test]
    fn short_pixel_buffer_is_rejected() {
        let frame = CapturedFrame {
            width: 4,
            height: 4,
            pixels: vec![0; 8],
        };
        let path = std::env::temp_dir().join("arcstroke_short.png");
        assert!(write_png(frame, &path).is_err());
    }
}
