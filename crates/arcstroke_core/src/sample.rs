//! Built-in showcase scene
//!
//! Five segments on an 800x800 canvas: an open line/quadratic/line path with
//! two joins, a free line, and an arc over the same chord.

use std::f32::consts::PI;

use crate::batch::PathBatch;
use crate::builder::PathBuilder;
use crate::segment::ArcParams;

pub const SHOWCASE_WIDTH: u32 = 800;
pub const SHOWCASE_HEIGHT: u32 = 800;

const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
const GREEN: [f32; 4] = [0.0, 1.0, 0.0, 1.0];
const BLUE: [f32; 4] = [0.0, 0.0, 1.0, 1.0];
const MAGENTA: [f32; 4] = [1.0, 0.0, 1.0, 1.0];
const CYAN: [f32; 4] = [0.0, 1.0, 1.0, 1.0];

pub fn showcase_batch() -> PathBatch {
    PathBuilder::new()
        .set_color(RED)
        .move_to(200.0, 500.0)
        .line_to(200.0, 300.0)
        .set_color(GREEN)
        .quad_to(400.0, 200.0, 600.0, 300.0)
        .set_color(BLUE)
        .line_to(600.0, 500.0)
        .set_color(MAGENTA)
        .move_to(100.0, 100.0)
        .line_to(300.0, 100.0)
        .set_color(CYAN)
        .move_to(100.0, 100.0)
        .arc_to(
            ArcParams::new(120.0, 100.0, PI / 3.0).with_sweep(true),
            300.0,
            100.0,
        )
        .build()
}
