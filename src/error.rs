use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Metadata file not found: {0}")]
    MetadataNotFound(PathBuf),

    #[error("Unsupported metadata format: .{0}")]
    UnsupportedMetadataFormat(String),

    #[error("Metadata is missing the '{0}' column")]
    MissingColumn(String),

    #[error("Malformed metadata: {0}")]
    MalformedMetadata(String),

    #[error("{path}, line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{0} contains no samples")]
    EmptyRecording(PathBuf),

    #[error("No label found for patient '{0}'")]
    LabelNotFound(String),

    #[error("Patient '{id}' matches several metadata rows: {candidates:?}")]
    AmbiguousLabel { id: String, candidates: Vec<String> },

    #[error("Cannot normalize: {0}")]
    DegenerateStatistics(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

pub type Result<T> = std::result::Result<T, LoaderError>;
