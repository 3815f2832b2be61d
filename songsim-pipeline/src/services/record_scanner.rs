//! Record scanner
//!
//! Discovers source documents and extracts at most N [`TrackRecord`]s in
//! discovery order. A file that cannot be opened or parsed is logged and
//! skipped; scanning continues with the remaining files.

use crate::extractors::{ExtractError, Extraction, TrackDocument, TrackExtractor};
use crate::models::outcome::{FileOutcome, OutcomeTally, SkipReason};
use crate::services::fallback::FallbackGenerator;
use crate::services::file_scanner::{FileScanner, ScanError};
use songsim_common::TrackRecord;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Progress is logged every this many records
const PROGRESS_INTERVAL: usize = 10;

/// Outcome of one scanned file
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

/// Result of a scan
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Extracted records, in discovery order
    pub records: Vec<TrackRecord>,
    /// One entry per file examined, in discovery order
    pub files: Vec<FileReport>,
    /// Source documents found under the root (examined or not)
    pub files_discovered: usize,
    pub tally: OutcomeTally,
}

/// Scans a source tree into track records
pub struct RecordScanner {
    file_scanner: FileScanner,
    max_records: usize,
    imputation_seed: u64,
}

impl RecordScanner {
    pub fn new(max_records: usize, imputation_seed: u64) -> Self {
        Self {
            file_scanner: FileScanner::new(),
            max_records,
            imputation_seed,
        }
    }

    /// Discover source documents under `root` and extract records
    ///
    /// Stops once `max_records` records have been produced or the files are
    /// exhausted, whichever comes first.
    pub fn scan(&self, root: &Path) -> Result<ScanReport, ScanError> {
        let files = self.file_scanner.scan(root)?;
        info!("Found {} source documents under {}", files.len(), root.display());

        let mut report = ScanReport {
            files_discovered: files.len(),
            ..ScanReport::default()
        };
        let mut seen_ids = HashSet::new();

        for path in files {
            if report.records.len() >= self.max_records {
                debug!("Record limit {} reached", self.max_records);
                break;
            }

            let outcome = match self.extract_file(&path, root, report.records.len()) {
                Ok(extraction) => {
                    if seen_ids.contains(&extraction.record.song_id) {
                        warn!(
                            "Skipping {}: duplicate song_id {}",
                            path.display(),
                            extraction.record.song_id
                        );
                        FileOutcome::Skipped(SkipReason::DuplicateSongId)
                    } else {
                        let outcome = extraction.outcome();
                        for (field, reason) in extraction.fallbacks() {
                            report.tally.record_fallback(field.name(), reason);
                        }
                        seen_ids.insert(extraction.record.song_id.clone());
                        report.records.push(extraction.record);

                        if report.records.len() % PROGRESS_INTERVAL == 0 {
                            info!("Processed {} songs", report.records.len());
                        }
                        outcome
                    }
                }
                Err(e) => {
                    warn!("Error processing file {}: {}", path.display(), e);
                    FileOutcome::Skipped(skip_reason(&e))
                }
            };

            report.tally.record_file(outcome);
            report.files.push(FileReport { path, outcome });
        }

        info!(
            "Successfully processed {} songs ({} skipped, {} fallback values)",
            report.records.len(),
            report.tally.skipped,
            report.tally.total_fallbacks()
        );
        Ok(report)
    }

    /// Extract one file
    ///
    /// The document is read in full and its handle closed before any field is
    /// decoded.
    pub fn extract_file(
        &self,
        path: &Path,
        root: &Path,
        ordinal: usize,
    ) -> Result<Extraction, ExtractError> {
        let document = TrackDocument::open(path)?;

        let source_key = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        let mut generator = FallbackGenerator::for_source(self.imputation_seed, &source_key);

        let fallback_id = fallback_song_id(path, ordinal);
        Ok(TrackExtractor::new(&document).extract(&fallback_id, ordinal, &mut generator))
    }
}

/// Song id derived from the file name (`TRxxx.json` → `TRxxx`)
pub fn fallback_song_id(path: &Path, ordinal: usize) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().trim().to_string())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| format!("TR{:016}", ordinal))
}

fn skip_reason(error: &ExtractError) -> SkipReason {
    match error {
        ExtractError::Unreadable(_, _) => SkipReason::Unreadable,
        ExtractError::InvalidDocument(_, _) | ExtractError::MalformedContainer(_) => {
            SkipReason::InvalidDocument
        }
    }
}
