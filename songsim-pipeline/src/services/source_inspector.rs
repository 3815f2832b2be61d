//! Source layout inspection
//!
//! Prints the group/table/field structure of the first discovered source
//! document, used to check a new provider export before running the pipeline.

use crate::extractors::{ExtractError, TrackDocument};
use crate::services::file_scanner::{FileScanner, ScanError};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InspectError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("No source documents found under {0}")]
    NoSourceFiles(PathBuf),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Structure of one source document
#[derive(Debug, Clone)]
pub struct SourceLayout {
    pub path: PathBuf,
    pub groups: Vec<(String, Vec<(String, Vec<String>)>)>,
}

impl fmt::Display for SourceLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Source structure of {}:", self.path.display())?;
        for (group, tables) in &self.groups {
            writeln!(f, "- {}", group)?;
            for (table, fields) in tables {
                writeln!(f, "  Subkeys in {}/{}:", group, table)?;
                for field in fields {
                    writeln!(f, "  - {}", field)?;
                }
            }
        }
        Ok(())
    }
}

/// Layout of the first source document under `root`
pub fn inspect_first(root: &Path) -> Result<SourceLayout, InspectError> {
    let files = FileScanner::new().scan(root)?;
    let first = files
        .into_iter()
        .next()
        .ok_or_else(|| InspectError::NoSourceFiles(root.to_path_buf()))?;

    let document = TrackDocument::open(&first)?;
    Ok(SourceLayout {
        path: first,
        groups: document.layout(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_inspect_first_document() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("TRA.json"),
            br#"{"analysis": {"songs": {"tempo": [120.0], "key": [1]}}}"#,
        )
        .unwrap();

        let layout = inspect_first(temp_dir.path()).unwrap();
        let text = layout.to_string();
        assert!(text.contains("- analysis"));
        assert!(text.contains("Subkeys in analysis/songs:"));
        assert!(text.contains("  - tempo"));
    }

    #[test]
    fn test_inspect_empty_tree() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            inspect_first(temp_dir.path()),
            Err(InspectError::NoSourceFiles(_))
        ));
    }
}
