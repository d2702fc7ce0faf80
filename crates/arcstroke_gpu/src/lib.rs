//! arcstroke GPU renderer
//!
//! Strokes batches of lines, quadratic Béziers and elliptical arcs with one
//! instanced draw using wgpu.
//!
//! # Example
//!
//! ```ignore
//! use arcstroke_core::sample::showcase_batch;
//! use arcstroke_gpu::{GpuContext, OffscreenTarget, PathRenderer, RendererConfig};
//!
//! let ctx = pollster::block_on(GpuContext::new(RendererConfig::default()))?;
//! let mut renderer = PathRenderer::new(&ctx)?;
//! renderer.set_data(&showcase_batch())?;
//!
//! let target = OffscreenTarget::new(ctx.device(), 800, 800, ctx.texture_format());
//! renderer.draw(&target.target());
//! ```

pub mod attributes;
pub mod blit;
pub mod capture;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod primitives;
pub mod renderer;
pub mod resources;
pub mod shaders;
pub mod store;

pub use blit::BlitPass;
pub use capture::{capture_texture, CapturedFrame};
pub use context::{GpuContext, RendererConfig};
pub use error::{RendererError, Result};
pub use primitives::StrokeUniforms;
pub use renderer::{FrameStats, PathRenderer};
pub use resources::{OffscreenTarget, RenderTarget};
pub use store::PathBatchStore;
