//! GPU-side data layouts
//!
//! Everything here is `repr(C)` and `Pod` so it can be cast straight into
//! buffer contents with `bytemuck`.

use arcstroke_core::StrokeStyle;

/// Per-frame uniforms for the stroke shader
///
/// Memory layout (32 bytes):
/// - resolution: `vec2<f32>` (8 bytes) - target size in pixels
/// - line_width: `f32` (4 bytes)
/// - miter_limit: `f32` (4 bytes)
/// - line_join: `u32` (4 bytes) - 0=miter, 1=round, 2=bevel
/// - line_cap: `u32` (4 bytes) - 0=none, 1=butt, 2=round
/// - _pad0, _pad1: `u32` (8 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StrokeUniforms {
    pub resolution: [f32; 2],
    pub line_width: f32,
    pub miter_limit: f32,
    pub line_join: u32,
    pub line_cap: u32,
    pub _pad0: u32,
    pub _pad1: u32,
}

impl StrokeUniforms {
    pub fn new(style: &StrokeStyle, width: u32, height: u32) -> Self {
        Self {
            resolution: [width as f32, height as f32],
            line_width: style.line_width,
            miter_limit: style.miter_limit,
            line_join: style.join.wire(),
            line_cap: style.cap.wire(),
            _pad0: 0,
            _pad1: 0,
        }
    }
}

impl Default for StrokeUniforms {
    fn default() -> Self {
        Self::new(&StrokeStyle::default(), 800, 600)
    }
}

/// Unit quad corners shared by every instance
pub const QUAD_CORNERS: [[f32; 2]; 4] = [[-0.5, -0.5], [0.5, -0.5], [-0.5, 0.5], [0.5, 0.5]];

/// Two triangles over [`QUAD_CORNERS`]
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 1, 3, 2];

/// Full-screen quad for the blit pass: clip-space position and texture coordinate
pub const BLIT_POSITIONS: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [-1.0, 1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [1.0, 1.0],
];

pub const BLIT_TEX_COORDS: [[f32; 2]; 6] = [
    [0.0, 1.0],
    [1.0, 1.0],
    [0.0, 0.0],
    [0.0, 0.0],
    [1.0, 1.0],
    [1.0, 0.0],
];
