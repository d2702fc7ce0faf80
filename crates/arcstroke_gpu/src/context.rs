//! GPU device setup
//!
//! Owns the wgpu instance, device and queue shared by the stroke
//! renderer and the blit pass. Device and queue are `Arc`-shared so callers
//! can hold on to them while the context lives elsewhere.

use std::sync::Arc;

use crate::error::{RendererError, Result};

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
}

fn env_usize(name: &str) -> Option<usize> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
}

/// Widest per-instance column (`cp` and `color` are 4 x f32)
const MAX_COLUMN_STRIDE: u64 = 16;

fn device_required_limits(adapter: &wgpu::Adapter) -> wgpu::Limits {
    // Default wgpu limits include `max_buffer_size = 256 MiB`.
    // Raise with ARCSTROKE_WGPU_MAX_BUFFER_MB (clamped to the adapter maximum).
    let supported = adapter.limits();
    let mut limits = wgpu::Limits::default();

    if let Some(mib) = env_u64("ARCSTROKE_WGPU_MAX_BUFFER_MB") {
        let requested = mib.saturating_mul(1024 * 1024);
        limits.max_buffer_size = requested.min(supported.max_buffer_size);

        tracing::info!(
            "wgpu limits override: max_buffer_size={} MiB (requested {} MiB, supported {} MiB)",
            limits.max_buffer_size / (1024 * 1024),
            mib,
            supported.max_buffer_size / (1024 * 1024)
        );
    } else {
        tracing::debug!(
            "wgpu limits: max_buffer_size={} MiB (supported {} MiB)",
            limits.max_buffer_size / (1024 * 1024),
            supported.max_buffer_size / (1024 * 1024)
        );
    }

    limits
}

/// Apply `ARCSTROKE_*` environment overrides and clamp to device limits
pub fn apply_renderer_config_overrides(
    mut config: RendererConfig,
    required_limits: &wgpu::Limits,
) -> RendererConfig {
    // Env:
    // - ARCSTROKE_MAX_INSTANCES=20000000
    if let Some(v) = env_usize("ARCSTROKE_MAX_INSTANCES") {
        config.max_instances = v;
    }

    let instance_cap = (required_limits.max_buffer_size / MAX_COLUMN_STRIDE).max(1);
    // Draw calls take a u32 instance count
    let instance_cap = instance_cap.min(u64::from(u32::MAX));
    let instance_cap = usize::try_from(instance_cap).unwrap_or(usize::MAX);
    config.max_instances = config.max_instances.clamp(1, instance_cap);

    config
}

fn log_renderer_config(config: &RendererConfig) {
    tracing::info!(
        "gpu config: max_instances={}, texture_format={:?}",
        config.max_instances,
        config.texture_format
    );
}

/// Configuration for creating a renderer
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Maximum number of segments in one uploaded batch
    pub max_instances: usize,
    /// Preferred texture format (None = Rgba8Unorm headless, non-sRGB surface format otherwise)
    pub texture_format: Option<wgpu::TextureFormat>,
    /// Background the frame is cleared to before drawing
    pub clear_color: wgpu::Color,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_instances: 10_000_000,
            texture_format: None,
            clear_color: wgpu::Color::WHITE,
        }
    }
}

/// Device, queue and the resolved configuration
pub struct GpuContext {
    _instance: wgpu::Instance,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: RendererConfig,
    texture_format: wgpu::TextureFormat,
}

impl GpuContext {
    /// Texture format used when no surface dictates one
    pub const HEADLESS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    /// Get the preferred backend for the current platform
    fn preferred_backends() -> wgpu::Backends {
        #[cfg(target_os = "macos")]
        {
            wgpu::Backends::METAL
        }
        #[cfg(target_os = "windows")]
        {
            wgpu::Backends::DX12
        }
        #[cfg(target_os = "linux")]
        {
            wgpu::Backends::VULKAN | wgpu::Backends::GL
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        {
            wgpu::Backends::PRIMARY
        }
    }

    async fn request_device(
        adapter: &wgpu::Adapter,
        config: RendererConfig,
    ) -> Result<(wgpu::Device, wgpu::Queue, RendererConfig)> {
        let required_limits = device_required_limits(adapter);
        let config = apply_renderer_config_overrides(config, &required_limits);
        log_renderer_config(&config);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("arcstroke device"),
                    required_features: wgpu::Features::empty(),
                    required_limits,
                    memory_hints: wgpu::MemoryHints::MemoryUsage,
                },
                None,
            )
            .await?;

        Ok((device, queue, config))
    }

    /// Create a context without a surface (for offscreen rendering and tests)
    pub async fn new(config: RendererConfig) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: Self::preferred_backends(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RendererError::AdapterNotFound)?;
        tracing::info!("Using adapter: {:?}", adapter.get_info().name);

        let (device, queue, config) = Self::request_device(&adapter, config).await?;
        let texture_format = config.texture_format.unwrap_or(Self::HEADLESS_FORMAT);

        Ok(Self {
            _instance: instance,
            device: Arc::new(device),
            queue: Arc::new(queue),
            config,
            texture_format,
        })
    }

    /// Create a context with a window surface
    pub async fn with_surface<W>(
        window: Arc<W>,
        config: RendererConfig,
    ) -> Result<(Self, wgpu::Surface<'static>)>
    where
        W: raw_window_handle::HasWindowHandle
            + raw_window_handle::HasDisplayHandle
            + Send
            + Sync
            + 'static,
    {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: Self::preferred_backends(),
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RendererError::AdapterNotFound)?;
        tracing::info!("Using adapter: {:?}", adapter.get_info().name);

        let (device, queue, config) = Self::request_device(&adapter, config).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        tracing::debug!("Surface capabilities - formats: {:?}", surface_caps.formats);

        // Prefer a non-sRGB format so colors match the offscreen path
        let texture_format = match config.texture_format {
            Some(format) => format,
            None => surface_caps
                .formats
                .iter()
                .find(|f| !f.is_srgb())
                .or_else(|| surface_caps.formats.first())
                .copied()
                .ok_or(RendererError::AdapterNotFound)?,
        };
        tracing::debug!("Selected texture format: {:?}", texture_format);

        let context = Self {
            _instance: instance,
            device: Arc::new(device),
            queue: Arc::new(queue),
            config,
            texture_format,
        };
        Ok((context, surface))
    }

    /// Surface configuration for the given size at the context's format
    pub fn surface_config(&self, width: u32, height: u32) -> wgpu::SurfaceConfiguration {
        wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: self.texture_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            desired_maximum_frame_latency: 2,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
        }
    }

    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn texture_format(&self) -> wgpu::TextureFormat {
        self.texture_format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = RendererConfig::default();
        assert_eq!(config.max_instances, 10_000_000);
        assert_eq!(config.clear_color, wgpu::Color::WHITE);
        assert!(config.texture_format.is_none());
    }

    #[test]
    fn instance_limit_clamps_to_buffer_size() {
        let limits = wgpu::Limits {
            max_buffer_size: 1024,
            ..wgpu::Limits::default()
        };
        let config = RendererConfig {
            max_instances: 1_000,
            ..RendererConfig::default()
        };
        let config = apply_renderer_config_overrides(config, &limits);
        assert_eq!(config.max_instances, 64);
    }

    #[test]
    fn instance_limit_is_at_least_one() {
        let config = RendererConfig {
            max_instances: 0,
            ..RendererConfig::default()
        };
        let config = apply_renderer_config_overrides(config, &wgpu::Limits::default());
        assert_eq!(config.max_instances, 1);
    }

    #[test]
    fn instance_limit_fits_a_draw_call() {
        let limits = wgpu::Limits {
            max_buffer_size: u64::MAX,
            ..wgpu::Limits::default()
        };
        let config = RendererConfig {
            max_instances: usize::MAX,
            ..RendererConfig::default()
        };
        let config = apply_renderer_config_overrides(config, &limits);
        assert_eq!(config.max_instances, u32::MAX as usize);
    }
}
