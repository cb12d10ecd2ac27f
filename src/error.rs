// Error types for ingestion and report output.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// A required header is absent. The whole dataset degrades to its empty shape.
    #[error("schema error in {dataset}: missing column(s) {}", .missing.join(", "))]
    Schema {
        dataset: &'static str,
        missing: Vec<String>,
    },

    /// A single malformed row. The row is skipped.
    #[error("parse error in {dataset} at row {row}: {message}")]
    Parse {
        dataset: &'static str,
        row: usize,
        message: String,
    },

    /// The text for a resource could not be read.
    #[error("fetch error for '{}': {source}", .path.display())]
    Fetch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IngestError>;
