//! Path segments
//!
//! A segment is one stroked instance. Its [`SegmentKind`] carries the
//! type-specific parameters as a tagged variant; the packed 4-float control
//! block (`cp`) only exists at the upload boundary (see [`SegmentKind::control_params`]).

use crate::{Rgba, Vec2};

/// Segment type discriminants (must match shader constants)
pub const KIND_LINE: u32 = 0;
pub const KIND_QUADRATIC: u32 = 1;
pub const KIND_ARC: u32 = 2;

/// Packed arc flag bits stored in `cp.w`
pub const ARC_FLAG_LARGE: u32 = 1 << 0;
pub const ARC_FLAG_SWEEP: u32 = 1 << 1;

/// Elliptical arc parameters (SVG endpoint parameterization)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArcParams {
    /// Radius along the rotated x axis
    pub rx: f32,
    /// Radius along the rotated y axis
    pub ry: f32,
    /// Rotation of the ellipse x axis, in radians
    pub phi: f32,
    /// Choose the arc spanning more than 180 degrees
    pub large_arc: bool,
    /// Choose the arc drawn in the positive-angle direction
    pub sweep: bool,
}

impl ArcParams {
    pub fn new(rx: f32, ry: f32, phi: f32) -> Self {
        Self {
            rx,
            ry,
            phi,
            large_arc: false,
            sweep: false,
        }
    }

    pub fn with_large_arc(mut self, large_arc: bool) -> Self {
        self.large_arc = large_arc;
        self
    }

    pub fn with_sweep(mut self, sweep: bool) -> Self {
        self.sweep = sweep;
        self
    }

    /// Pack the two flags into their bit positions
    pub fn flags(&self) -> u32 {
        let mut flags = 0;
        if self.large_arc {
            flags |= ARC_FLAG_LARGE;
        }
        if self.sweep {
            flags |= ARC_FLAG_SWEEP;
        }
        flags
    }

    /// Decode arc parameters from a packed control block `(rx, ry, phi, flags)`.
    ///
    /// The flags travel as a float; negative or fractional values truncate the
    /// same way the shader's `u32()` conversion does.
    pub fn from_control_params(cp: [f32; 4]) -> Self {
        let flags = cp[3].max(0.0) as u32;
        Self {
            rx: cp[0],
            ry: cp[1],
            phi: cp[2],
            large_arc: flags & ARC_FLAG_LARGE != 0,
            sweep: flags & ARC_FLAG_SWEEP != 0,
        }
    }

    pub fn control_params(&self) -> [f32; 4] {
        [self.rx, self.ry, self.phi, self.flags() as f32]
    }
}

/// Segment type with its type-specific parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SegmentKind {
    /// Straight segment from start to end
    Line,
    /// Quadratic Bezier through a single control point
    Quadratic { control: Vec2 },
    /// Elliptical arc between start and end
    Arc(ArcParams),
}

impl SegmentKind {
    /// Numeric type value uploaded to the GPU
    pub fn wire_type(&self) -> u32 {
        match self {
            SegmentKind::Line => KIND_LINE,
            SegmentKind::Quadratic { .. } => KIND_QUADRATIC,
            SegmentKind::Arc(_) => KIND_ARC,
        }
    }

    /// Packed 4-float control block uploaded to the GPU
    pub fn control_params(&self) -> [f32; 4] {
        match self {
            SegmentKind::Line => [0.0; 4],
            SegmentKind::Quadratic { control } => [control[0], control[1], 0.0, 0.0],
            SegmentKind::Arc(arc) => arc.control_params(),
        }
    }

    /// Rebuild a kind from its wire form. Returns `None` for unknown type values.
    pub fn from_wire(wire_type: u32, cp: [f32; 4]) -> Option<Self> {
        match wire_type {
            KIND_LINE => Some(SegmentKind::Line),
            KIND_QUADRATIC => Some(SegmentKind::Quadratic {
                control: [cp[0], cp[1]],
            }),
            KIND_ARC => Some(SegmentKind::Arc(ArcParams::from_control_params(cp))),
            _ => None,
        }
    }
}

/// One stroked path segment
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathSegment {
    /// Chord start point
    pub start: Vec2,
    /// Chord end point
    pub end: Vec2,
    /// Tangent reference point before `start` (equal to `start` for a free end)
    pub prev: Vec2,
    /// Tangent reference point after `end` (equal to `end` for a free end)
    pub next: Vec2,
    pub kind: SegmentKind,
    pub color: Rgba,
}

impl PathSegment {
    const DEFAULT_COLOR: Rgba = [0.0, 0.0, 0.0, 1.0];

    /// Straight segment with both ends free
    pub fn line(start: Vec2, end: Vec2) -> Self {
        Self::new(start, end, SegmentKind::Line)
    }

    /// Quadratic curve with both ends free
    pub fn quadratic(start: Vec2, control: Vec2, end: Vec2) -> Self {
        Self::new(start, end, SegmentKind::Quadratic { control })
    }

    /// Elliptical arc with both ends free
    pub fn arc(start: Vec2, end: Vec2, params: ArcParams) -> Self {
        Self::new(start, end, SegmentKind::Arc(params))
    }

    fn new(start: Vec2, end: Vec2, kind: SegmentKind) -> Self {
        Self {
            start,
            end,
            prev: start,
            next: end,
            kind,
            color: Self::DEFAULT_COLOR,
        }
    }

    pub fn with_neighbors(mut self, prev: Vec2, next: Vec2) -> Self {
        self.prev = prev;
        self.next = next;
        self
    }

    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = color;
        self
    }

    /// True when nothing joins the start (it gets a cap)
    pub fn has_free_start(&self) -> bool {
        self.prev == self.start
    }

    /// True when nothing joins the end (it gets a cap)
    pub fn has_free_end(&self) -> bool {
        self.next == self.end
    }
}
