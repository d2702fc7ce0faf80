//! arcstroke core
//!
//! Host-side data model for the instanced stroke renderer:
//! - Path segments (lines, quadratic curves, elliptical arcs) with neighbour context
//! - Batches and their wire columns (the per-instance attribute layout)
//! - Stroke style (width, join, cap)
//! - A path builder that fills in adjacency
//! - Reference geometry that mirrors the GPU shader math

pub mod batch;
pub mod builder;
pub mod error;
pub mod geometry;
pub mod sample;
pub mod segment;
pub mod style;

pub use batch::{BatchColumns, PathBatch};
pub use builder::PathBuilder;
pub use error::{BatchError, StyleParseError};
pub use segment::{ArcParams, PathSegment, SegmentKind};
pub use style::{LineCap, LineJoin, StrokeStyle};

/// A 2D point or vector in device pixels
pub type Vec2 = [f32; 2];

/// RGBA color with components in [0, 1]
pub type Rgba = [f32; 4];
