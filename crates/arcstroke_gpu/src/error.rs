//! Error type for renderer operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RendererError {
    /// Failed to request GPU adapter
    #[error("No suitable GPU adapter found")]
    AdapterNotFound,

    /// Failed to request GPU device
    #[error("Failed to request GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    /// Failed to create surface
    #[error("Failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    /// WGSL source rejected by the front end or validator
    #[error("Shader `{label}` failed to compile:\n{log}")]
    ShaderCompile { label: String, log: String },

    /// Pipeline creation rejected (entry points or vertex inputs disagree)
    #[error("Pipeline `{label}` failed to link: {log}")]
    ShaderLink { label: String, log: String },

    /// Batch does not fit the configured instance capacity
    #[error("Batch of {count} segments exceeds the instance limit of {limit}")]
    InstanceLimit { count: usize, limit: usize },

    /// Mapping a readback buffer failed
    #[error("Framebuffer readback failed: {0}")]
    Readback(String),
}

pub type Result<T> = std::result::Result<T, RendererError>;
