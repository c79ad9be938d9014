//! Parallel document text extraction and recursive chunking.
//!
//! `docsplit` turns a batch of document files into overlapping, bounded-size
//! text chunks ready for embedding or retrieval indexing.
//!
//! - [`RecursiveChunker`] splits text at paragraph, line, word, then
//!   character boundaries, merging pieces up to `chunk_size` characters with
//!   `chunk_overlap` characters carried between consecutive chunks.
//! - [`BatchPipeline`] extracts and chunks many documents on a bounded pool
//!   of worker threads, isolating per-document failures.
//! - [`discover_documents`], the [`TextExtractor`] implementations, and
//!   [`write_batch`] cover the file-system edges of a batch run.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docsplit::{BatchPipeline, ChunkConfig, DiscoveryOptions, FileExtractor, OutputFormat};
//!
//! let sources = docsplit::discover_documents("./my_pdfs", &DiscoveryOptions::default())?;
//! let pipeline = BatchPipeline::builder()
//!     .config(ChunkConfig::builder().chunk_size(1000).chunk_overlap(200).build()?)
//!     .extractor(Arc::new(FileExtractor))
//!     .build()?;
//!
//! let result = pipeline.run(sources).await.sorted();
//! docsplit::write_batch("chunks_output.txt", &result, OutputFormat::Text)?;
//! ```

pub mod chunking;
pub mod config;
pub mod discovery;
pub mod document;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod result;

pub use chunking::{Chunker, RecursiveChunker};
pub use config::{ChunkConfig, ChunkConfigBuilder, DocsplitConfig, OutputFormat};
pub use discovery::{DiscoveryOptions, discover_documents};
pub use document::{Chunk, Document, DocumentSource};
pub use error::{DocsplitError, DocumentError, ExtractionError, Result};
#[cfg(feature = "pdf")]
pub use extract::PdfExtractor;
pub use extract::{FileExtractor, PlainTextExtractor, TextExtractor};
pub use output::{write_batch, write_chunks};
pub use pipeline::{BatchPipeline, BatchPipelineBuilder, run_batch};
pub use result::{BatchResult, DocumentFailure, DocumentOutcome};

/// Re-export of the cancellation token accepted by
/// [`BatchPipeline::run_with_cancellation`].
pub use tokio_util::sync::CancellationToken;
