//! Path batches
//!
//! A [`PathBatch`] is the unit of upload: an ordered list of segments drawn
//! with one instanced call. [`BatchColumns`] is its wire form, seven parallel
//! arrays with one entry per instance.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BatchError, Result};
use crate::geometry;
use crate::segment::{PathSegment, SegmentKind};
use crate::style::StrokeStyle;
use crate::{Rgba, Vec2};

/// Struct-of-arrays batch layout, one column per instance attribute
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchColumns {
    pub start_pos: Vec<Vec2>,
    pub end_pos: Vec<Vec2>,
    pub prev_pos: Vec<Vec2>,
    pub next_pos: Vec<Vec2>,
    #[serde(rename = "type")]
    pub kind: Vec<u32>,
    pub cp: Vec<[f32; 4]>,
    pub color: Vec<Rgba>,
}

impl BatchColumns {
    /// Check every column against `startPos`
    pub fn validate(&self) -> Result<usize> {
        let expected = self.start_pos.len();
        let columns = [
            ("endPos", self.end_pos.len()),
            ("prevPos", self.prev_pos.len()),
            ("nextPos", self.next_pos.len()),
            ("type", self.kind.len()),
            ("cp", self.cp.len()),
            ("color", self.color.len()),
        ];
        for (column, actual) in columns {
            if actual != expected {
                return Err(BatchError::LengthMismatch {
                    column,
                    expected,
                    actual,
                });
            }
        }
        Ok(expected)
    }
}

/// An ordered list of segments drawn together
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathBatch {
    segments: Vec<PathSegment>,
}

impl PathBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Flatten into the seven wire columns
    pub fn columns(&self) -> BatchColumns {
        let n = self.segments.len();
        let mut columns = BatchColumns {
            start_pos: Vec::with_capacity(n),
            end_pos: Vec::with_capacity(n),
            prev_pos: Vec::with_capacity(n),
            next_pos: Vec::with_capacity(n),
            kind: Vec::with_capacity(n),
            cp: Vec::with_capacity(n),
            color: Vec::with_capacity(n),
        };
        for segment in &self.segments {
            columns.start_pos.push(segment.start);
            columns.end_pos.push(segment.end);
            columns.prev_pos.push(segment.prev);
            columns.next_pos.push(segment.next);
            columns.kind.push(segment.kind.wire_type());
            columns.cp.push(segment.kind.control_params());
            columns.color.push(segment.color);
        }
        columns
    }

    /// Index of the topmost segment whose stroke covers `point`.
    ///
    /// Later segments draw over earlier ones, so the search runs back to front.
    pub fn hit_test(&self, point: Vec2, style: &StrokeStyle) -> Option<usize> {
        self.segments.iter().rposition(|segment| {
            geometry::stroke_distance(segment, style, point)
                .is_some_and(|d| geometry::coverage(d) > 0.0)
        })
    }
}

impl TryFrom<BatchColumns> for PathBatch {
    type Error = BatchError;

    fn try_from(columns: BatchColumns) -> Result<Self> {
        let count = columns.validate()?;
        let mut segments = Vec::with_capacity(count);
        for index in 0..count {
            let value = columns.kind[index];
            let kind = SegmentKind::from_wire(value, columns.cp[index])
                .ok_or(BatchError::UnknownKind { index, value })?;
            segments.push(PathSegment {
                start: columns.start_pos[index],
                end: columns.end_pos[index],
                prev: columns.prev_pos[index],
                next: columns.next_pos[index],
                kind,
                color: columns.color[index],
            });
        }
        debug!(segments = count, "Built path batch from columns");
        Ok(Self { segments })
    }
}

impl From<Vec<PathSegment>> for PathBatch {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self::from_segments(segments)
    }
}

impl FromIterator<PathSegment> for PathBatch {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self::from_segments(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::ArcParams;

    fn two_segments() -> PathBatch {
        PathBatch::from_segments(vec![
            PathSegment::line([0.0, 0.0], [10.0, 0.0]),
            PathSegment::arc(
                [10.0, 0.0],
                [20.0, 0.0],
                ArcParams::new(5.0, 5.0, 0.0).with_sweep(true),
            )
            .with_color([0.0, 1.0, 1.0, 1.0]),
        ])
    }

    #[test]
    fn columns_have_one_entry_per_segment() {
        let columns = two_segments().columns();
        assert_eq!(columns.validate(), Ok(2));
        assert_eq!(columns.kind, vec![0, 2]);
        assert_eq!(columns.cp[1], [5.0, 5.0, 0.0, 2.0]);
        assert_eq!(columns.color[1], [0.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn columns_convert_back() {
        let batch = two_segments();
        let rebuilt = PathBatch::try_from(batch.columns()).unwrap();
        assert_eq!(rebuilt, batch);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let mut columns = two_segments().columns();
        columns.color.pop();
        assert_eq!(
            PathBatch::try_from(columns),
            Err(BatchError::LengthMismatch {
                column: "color",
                expected: 2,
                actual: 1,
            })
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        let mut columns = two_segments().columns();
        columns.kind[1] = 7;
        assert_eq!(
            PathBatch::try_from(columns),
            Err(BatchError::UnknownKind { index: 1, value: 7 })
        );
    }

    #[test]
    fn empty_batch() {
        let batch = PathBatch::try_from(BatchColumns::default()).unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.columns(), BatchColumns::default());
    }

    #[test]
    fn json_uses_camel_case_columns() {
        let json = r#"{
            "startPos": [[200, 500]],
            "endPos": [[200, 300]],
            "prevPos": [[200, 500]],
            "nextPos": [[400, 200]],
            "type": [0],
            "cp": [[0, 0, 0, 0]],
            "color": [[1, 0, 0, 1]]
        }"#;
        let columns: BatchColumns = serde_json::from_str(json).unwrap();
        let batch = PathBatch::try_from(columns).unwrap();
        assert_eq!(batch.len(), 1);
        let seg = batch.segments()[0];
        assert!(seg.has_free_start());
        assert!(!seg.has_free_end());
    }

    #[test]
    fn hit_test_prefers_the_topmost_segment() {
        let style = StrokeStyle::default();
        let batch = PathBatch::from_segments(vec![
            PathSegment::line([0.0, 50.0], [100.0, 50.0]),
            PathSegment::line([50.0, 0.0], [50.0, 100.0]),
        ]);
        assert_eq!(batch.hit_test([50.0, 50.0], &style), Some(1));
        assert_eq!(batch.hit_test([10.0, 52.0], &style), Some(0));
        assert_eq!(batch.hit_test([10.0, 10.0], &style), None);
    }
}
