//! Stroke style
//!
//! Join, cap and width apply to every segment of a draw. They are closed
//! enums here and only turn into numbers when the uniforms are written.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StyleParseError;

/// Treatment of the corner where two segments meet
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    /// Extend the outer edges until they meet (falls back to bevel past the miter limit)
    #[default]
    Miter,
    /// Circular corner of radius `line_width / 2`
    Round,
    /// Cut the corner along the line joining the two outer edge corners
    Bevel,
}

impl LineJoin {
    /// Uniform value read by the shader
    pub fn wire(self) -> u32 {
        match self {
            LineJoin::Miter => 0,
            LineJoin::Round => 1,
            LineJoin::Bevel => 2,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            LineJoin::Miter => "miter",
            LineJoin::Round => "round",
            LineJoin::Bevel => "bevel",
        }
    }
}

impl fmt::Display for LineJoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LineJoin {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "miter" => Ok(LineJoin::Miter),
            "round" => Ok(LineJoin::Round),
            "bevel" => Ok(LineJoin::Bevel),
            _ => Err(StyleParseError::new("line join", s)),
        }
    }
}

/// Treatment of a free segment end
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    /// No extension past the endpoint (rendered the same as butt)
    None,
    /// Square end exactly at the endpoint
    #[default]
    Butt,
    /// Half-disc of radius `line_width / 2` past the endpoint
    Round,
}

impl LineCap {
    /// Uniform value read by the shader
    pub fn wire(self) -> u32 {
        match self {
            LineCap::None => 0,
            LineCap::Butt => 1,
            LineCap::Round => 2,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            LineCap::None => "none",
            LineCap::Butt => "butt",
            LineCap::Round => "round",
        }
    }
}

impl fmt::Display for LineCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LineCap {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(LineCap::None),
            "butt" => Ok(LineCap::Butt),
            "round" => Ok(LineCap::Round),
            _ => Err(StyleParseError::new("line cap", s)),
        }
    }
}

/// Per-draw stroke parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeStyle {
    /// Full stroke width in device pixels
    pub line_width: f32,
    pub join: LineJoin,
    pub cap: LineCap,
    /// Maximum miter length as a multiple of the line width
    pub miter_limit: f32,
}

impl StrokeStyle {
    pub const DEFAULT_LINE_WIDTH: f32 = 20.0;
    pub const DEFAULT_MITER_LIMIT: f32 = 4.0;

    pub fn with_line_width(mut self, line_width: f32) -> Self {
        self.line_width = line_width;
        self
    }

    pub fn with_join(mut self, join: LineJoin) -> Self {
        self.join = join;
        self
    }

    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_miter_limit(mut self, miter_limit: f32) -> Self {
        self.miter_limit = miter_limit;
        self
    }

    /// Half of the line width, clamped at zero
    pub fn half_width(&self) -> f32 {
        (self.line_width * 0.5).max(0.0)
    }
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            line_width: Self::DEFAULT_LINE_WIDTH,
            join: LineJoin::default(),
            cap: LineCap::default(),
            miter_limit: Self::DEFAULT_MITER_LIMIT,
        }
    }
}
