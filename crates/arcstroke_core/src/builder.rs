//! Path building
//!
//! Turns move/line/quad/arc commands into segments with their neighbour
//! reference points filled in. Open subpaths get free ends at both
//! extremities; `close` wraps the last segment around to the first.

use crate::batch::PathBatch;
use crate::geometry;
use crate::segment::{ArcParams, PathSegment, SegmentKind};
use crate::{Rgba, Vec2};

/// Builder for constructing stroked batches
pub struct PathBuilder {
    batch: PathBatch,
    subpath: Vec<PathSegment>,
    subpath_start: Vec2,
    current: Vec2,
    color: Rgba,
}

/// Point behind `segment.end` along its travel direction.
///
/// A line neighbour contributes its start, a quadratic its control point.
/// Arcs (and curves whose control point sits on the joint) fall back to the
/// end tangent.
fn lead_in(segment: &PathSegment) -> Vec2 {
    let natural = match segment.kind {
        SegmentKind::Line => Some(segment.start),
        SegmentKind::Quadratic { control } => Some(control),
        SegmentKind::Arc(_) => None,
    };
    if let Some(point) = natural.filter(|p| *p != segment.end) {
        return point;
    }
    let reach = chord_length(segment).max(1.0);
    match geometry::end_tangents(segment) {
        Some((_, t1)) => [segment.end[0] - t1[0] * reach, segment.end[1] - t1[1] * reach],
        None => segment.end,
    }
}

/// Point ahead of `segment.start` along its travel direction
fn lead_out(segment: &PathSegment) -> Vec2 {
    let natural = match segment.kind {
        SegmentKind::Line => Some(segment.end),
        SegmentKind::Quadratic { control } => Some(control),
        SegmentKind::Arc(_) => None,
    };
    if let Some(point) = natural.filter(|p| *p != segment.start) {
        return point;
    }
    let reach = chord_length(segment).max(1.0);
    match geometry::end_tangents(segment) {
        Some((t0, _)) => [
            segment.start[0] + t0[0] * reach,
            segment.start[1] + t0[1] * reach,
        ],
        None => segment.start,
    }
}

fn chord_length(segment: &PathSegment) -> f32 {
    let dx = segment.end[0] - segment.start[0];
    let dy = segment.end[1] - segment.start[1];
    (dx * dx + dy * dy).sqrt()
}

impl PathBuilder {
    const DEFAULT_COLOR: Rgba = [0.0, 0.0, 0.0, 1.0];

    pub fn new() -> Self {
        Self {
            batch: PathBatch::new(),
            subpath: Vec::new(),
            subpath_start: [0.0, 0.0],
            current: [0.0, 0.0],
            color: Self::DEFAULT_COLOR,
        }
    }

    /// Color applied to segments added after this call
    pub fn set_color(mut self, color: Rgba) -> Self {
        self.color = color;
        self
    }

    /// Start a new subpath, leaving the current one open
    pub fn move_to(mut self, x: f32, y: f32) -> Self {
        self.finish_subpath(false);
        self.subpath_start = [x, y];
        self.current = [x, y];
        self
    }

    pub fn line_to(mut self, x: f32, y: f32) -> Self {
        self.push(PathSegment::line(self.current, [x, y]));
        self
    }

    pub fn quad_to(mut self, cx: f32, cy: f32, x: f32, y: f32) -> Self {
        self.push(PathSegment::quadratic(self.current, [cx, cy], [x, y]));
        self
    }

    /// Elliptical arc to `(x, y)` (SVG `A` command semantics)
    pub fn arc_to(mut self, params: ArcParams, x: f32, y: f32) -> Self {
        self.push(PathSegment::arc(self.current, [x, y], params));
        self
    }

    /// Close the subpath with a line back to its start and join the ends
    pub fn close(mut self) -> Self {
        if self.subpath.is_empty() {
            return self;
        }
        if self.current != self.subpath_start {
            self.push(PathSegment::line(self.current, self.subpath_start));
        }
        self.finish_subpath(true);
        self.current = self.subpath_start;
        self
    }

    pub fn build(mut self) -> PathBatch {
        self.finish_subpath(false);
        self.batch
    }

    fn push(&mut self, segment: PathSegment) {
        self.current = segment.end;
        self.subpath.push(segment.with_color(self.color));
    }

    fn finish_subpath(&mut self, closed: bool) {
        let mut segments = std::mem::take(&mut self.subpath);
        let count = segments.len();
        for i in 0..count {
            let prev = if i > 0 {
                Some(lead_in(&segments[i - 1]))
            } else if closed {
                Some(lead_in(&segments[count - 1]))
            } else {
                None
            };
            let next = if i + 1 < count {
                Some(lead_out(&segments[i + 1]))
            } else if closed {
                Some(lead_out(&segments[0]))
            } else {
                None
            };

            let segment = &mut segments[i];
            segment.prev = prev.unwrap_or(segment.start);
            segment.next = next.unwrap_or(segment.end);
        }
        for segment in segments {
            self.batch.push(segment);
        }
    }
}

impl Default for PathBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_polyline_matches_reference_adjacency() {
        let batch = PathBuilder::new()
            .move_to(200.0, 500.0)
            .line_to(200.0, 300.0)
            .quad_to(400.0, 200.0, 600.0, 300.0)
            .line_to(600.0, 500.0)
            .build();

        let columns = batch.columns();
        assert_eq!(
            columns.prev_pos,
            vec![[200.0, 500.0], [200.0, 500.0], [400.0, 200.0]]
        );
        assert_eq!(
            columns.next_pos,
            vec![[400.0, 200.0], [600.0, 500.0], [600.0, 500.0]]
        );
    }

    #[test]
    fn move_to_starts_a_free_subpath() {
        let batch = PathBuilder::new()
            .move_to(0.0, 0.0)
            .line_to(10.0, 0.0)
            .move_to(0.0, 10.0)
            .line_to(10.0, 10.0)
            .build();
        assert_eq!(batch.len(), 2);
        for seg in batch.segments() {
            assert!(seg.has_free_start());
            assert!(seg.has_free_end());
        }
    }

    #[test]
    fn close_wraps_around() {
        let batch = PathBuilder::new()
            .move_to(0.0, 0.0)
            .line_to(100.0, 0.0)
            .line_to(100.0, 100.0)
            .close()
            .build();

        let segs = batch.segments();
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[2].end, [0.0, 0.0]);
        assert_eq!(segs[0].prev, [100.0, 100.0]);
        assert_eq!(segs[2].next, [100.0, 0.0]);
        assert!(segs.iter().all(|s| !s.has_free_start() && !s.has_free_end()));
    }

    #[test]
    fn arc_neighbours_follow_the_tangent() {
        let batch = PathBuilder::new()
            .move_to(0.0, 0.0)
            .line_to(100.0, 0.0)
            .arc_to(ArcParams::new(50.0, 50.0, 0.0).with_sweep(true), 200.0, 0.0)
            .build();

        let line = batch.segments()[0];
        // Half circle starting at (100, 0), centre (150, 0), heading up then over
        assert!(!line.has_free_end());
        let dir = [line.next[0] - line.end[0], line.next[1] - line.end[1]];
        assert!(dir[0].abs() < 1e-3);

        let arc = batch.segments()[1];
        assert_eq!(arc.prev, [0.0, 0.0]);
    }

    #[test]
    fn color_applies_to_later_segments() {
        let batch = PathBuilder::new()
            .move_to(0.0, 0.0)
            .line_to(1.0, 0.0)
            .set_color([1.0, 0.0, 0.0, 1.0])
            .line_to(2.0, 0.0)
            .build();
        assert_eq!(batch.segments()[0].color, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(batch.segments()[1].color, [1.0, 0.0, 0.0, 1.0]);
    }
}
