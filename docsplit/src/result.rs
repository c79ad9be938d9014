//! Aggregated output of a batch run.

use crate::document::Chunk;
use crate::error::DocumentError;

/// A document that contributed no chunks, and why.
#[derive(Debug)]
pub struct DocumentFailure {
    /// The identifier of the failed document.
    pub document_id: String,
    /// What went wrong.
    pub error: DocumentError,
}

/// The result of one document's job, as delivered by
/// [`BatchPipeline::run_streaming`](crate::BatchPipeline::run_streaming).
#[derive(Debug)]
pub struct DocumentOutcome {
    /// The identifier of the processed document.
    pub document_id: String,
    /// The document's chunks in text order, or the reason it produced none.
    pub result: std::result::Result<Vec<Chunk>, DocumentError>,
}

/// Chunks and failures collected from a whole batch.
///
/// Chunks of one document appear in text order. Documents are interleaved in
/// completion order unless [`sort_by_document`](Self::sort_by_document) is called.
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Every chunk produced by a successful document.
    pub chunks: Vec<Chunk>,
    /// One entry per document that failed or was empty.
    pub failures: Vec<DocumentFailure>,
    /// `(document_id, chunk_count)` for every successful document, in completion order.
    pub succeeded: Vec<(String, usize)>,
    /// Documents that never completed because the batch was cancelled.
    pub cancelled: Vec<String>,
}

impl BatchResult {
    /// Create an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one finished document. Called once per job completion.
    pub fn record(&mut self, outcome: DocumentOutcome) {
        match outcome.result {
            Ok(chunks) => {
                self.succeeded.push((outcome.document_id, chunks.len()));
                self.chunks.extend(chunks);
            }
            Err(error) => {
                self.failures.push(DocumentFailure { document_id: outcome.document_id, error });
            }
        }
    }

    /// Number of documents that reached a final state.
    pub fn documents_processed(&self) -> usize {
        self.succeeded.len() + self.failures.len()
    }

    /// Whether every processed document succeeded and nothing was cancelled.
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty() && self.cancelled.is_empty()
    }

    /// Group chunks by document identifier for deterministic output.
    ///
    /// The sort is stable, so each document's chunks stay in text order.
    /// Failures, successes, and cancellations are sorted by identifier too.
    pub fn sort_by_document(&mut self) {
        self.chunks.sort_by(|a, b| a.document_id.cmp(&b.document_id));
        self.failures.sort_by(|a, b| a.document_id.cmp(&b.document_id));
        self.succeeded.sort();
        self.cancelled.sort();
    }

    /// Consume the result, returning it sorted by document.
    pub fn sorted(mut self) -> Self {
        self.sort_by_document();
        self
    }

    /// Chunks belonging to one document, in text order.
    pub fn chunks_for<'a>(&'a self, document_id: &'a str) -> impl Iterator<Item = &'a Chunk> + 'a {
        self.chunks.iter().filter(move |chunk| chunk.document_id == document_id)
    }
}
