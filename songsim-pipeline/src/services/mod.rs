//! Pipeline stages
//!
//! Scanner → matrix builder → normalizer → cluster assigner → exporter.

pub mod cluster_assigner;
pub mod dataset_exporter;
pub mod fallback;
pub mod feature_matrix;
pub mod file_scanner;
pub mod normalizer;
pub mod record_scanner;
pub mod source_inspector;

pub use cluster_assigner::{ClusterAssigner, ClusterAssignment, ClusterError, KMeansConfig};
pub use dataset_exporter::{DatasetExporter, Datasets, ExportError, ExportPaths};
pub use fallback::FallbackGenerator;
pub use feature_matrix::{BuiltMatrix, FeatureMatrix, FeatureMatrixBuilder, MatrixError};
pub use file_scanner::{FileScanner, ScanError};
pub use normalizer::{ColumnStats, NormalizeError, Normalized, Normalizer};
pub use record_scanner::{FileReport, RecordScanner, ScanReport};
pub use source_inspector::{inspect_first, InspectError, SourceLayout};
