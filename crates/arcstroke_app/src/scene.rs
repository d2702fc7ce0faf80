//! Scene loading
//!
//! A scene file is a JSON object with the seven batch columns
//! (`startPos`, `endPos`, `prevPos`, `nextPos`, `type`, `cp`, `color`).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use arcstroke_core::sample::showcase_batch;
use arcstroke_core::{BatchColumns, PathBatch};

pub fn parse_scene(json: &str) -> Result<PathBatch> {
    let columns: BatchColumns = serde_json::from_str(json).context("Invalid scene JSON")?;
    let batch = PathBatch::try_from(columns).context("Invalid scene columns")?;
    Ok(batch)
}

pub fn load_scene(path: &Path) -> Result<PathBatch> {
    let json =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let batch = parse_scene(&json).with_context(|| format!("Failed to load {}", path.display()))?;
    tracing::info!("Loaded {} segments from {}", batch.len(), path.display());
    Ok(batch)
}

/// The scene at `path`, or the built-in showcase
pub fn resolve_scene(path: Option<&Path>) -> Result<PathBatch> {
    match path {
        Some(path) => load_scene(path),
        None => Ok(showcase_batch()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn showcase_survives_json() {
        let batch = showcase_batch();
        let json = serde_json::to_string(&batch.columns()).unwrap();
        assert!(json.contains("\"startPos\""));
        assert!(json.contains("\"type\""));
        let parsed = parse_scene(&json).unwrap().columns();
        let expected = batch.columns();
        assert_eq!(parsed.kind, expected.kind);
        assert_eq!(parsed.start_pos, expected.start_pos);
        assert_eq!(parsed.next_pos, expected.next_pos);
        assert!((parsed.cp[4][2] - expected.cp[4][2]).abs() < 1e-6);
    }

    #[test]
    fn mismatched_columns_are_rejected() {
        let json = r#"{
            "startPos": [[0, 0], [10, 10]],
            "endPos": [[10, 0]],
            "prevPos": [[0, 0]],
            "nextPos": [[10, 0]],
            "type": [0],
            "cp": [[0, 0, 0, 0]],
            "color": [[0, 0, 0, 1]]
        }"#;
        let err = parse_scene(json).unwrap_err();
        assert!(format!("{err:#}").contains("endPos"));
    }

    #[test]
    fn missing_file_has_context() {
        let err = load_scene(Path::new("does/not/exist.json")).unwrap_err();
        assert!(err.to_string().contains("does/not/exist.json"));
    }

    #[test]
    fn no_path_means_showcase() {
        assert_eq!(resolve_scene(None).unwrap().len(), 5);
    }
}
