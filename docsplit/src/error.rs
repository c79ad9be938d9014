//! Error types for the `docsplit` crate.
//!
//! Two layers exist. [`DocsplitError`] is returned to callers and is only
//! produced by batch-level problems such as bad configuration or an
//! unwritable output target. [`ExtractionError`] and [`DocumentError`]
//! describe a single document and never escape a batch: they are recorded as
//! data in [`BatchResult::failures`](crate::BatchResult::failures).

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in batch-level operations.
#[derive(Debug, Error)]
pub enum DocsplitError {
    /// A configuration validation error. Raised before any document is processed.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error in the batch pipeline orchestration or document discovery.
    #[error("Pipeline error: {0}")]
    PipelineError(String),

    /// Writing the batch output failed.
    #[error("Output error ({path}): {source}")]
    OutputError {
        /// The output file being written.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// A convenience result type for batch-level operations.
pub type Result<T> = std::result::Result<T, DocsplitError>;

/// Why text could not be obtained from a single document.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The source file could not be read.
    #[error("failed to read '{path}': {source}")]
    Io {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file was read but its contents could not be decoded into text.
    #[error("corrupt document '{path}': {message}")]
    Corrupt {
        /// The offending file.
        path: PathBuf,
        /// A description of the decoding failure.
        message: String,
    },

    /// No extractor handles this file type.
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// Extraction succeeded but produced no usable text.
    #[error("document contains no extractable text")]
    Empty,
}

/// A per-document failure recorded by the batch pipeline.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The extractor rejected the document.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The job died while extracting or chunking (panic or lost worker).
    #[error("internal error: {0}")]
    Internal(String),
}
