//! Parallel batch orchestrator.
//!
//! The [`BatchPipeline`] runs one job per document (extract → chunk) on a
//! bounded pool of blocking worker threads and folds the results into a
//! [`BatchResult`] as jobs complete.
//!
//! # Example
//!
//! ```rust,ignore
//! use docsplit::{BatchPipeline, ChunkConfig, FileExtractor, discover_documents};
//!
//! let pipeline = BatchPipeline::builder()
//!     .config(ChunkConfig::default())
//!     .max_workers(8)
//!     .extractor(Arc::new(FileExtractor))
//!     .build()?;
//!
//! let sources = discover_documents("./my_pdfs", &DiscoveryOptions::default())?;
//! let result = pipeline.run(sources).await;
//! println!("{} chunks, {} failures", result.chunks.len(), result.failures.len());
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::chunking::{Chunker, RecursiveChunker};
use crate::config::{ChunkConfig, default_max_workers};
use crate::document::{Chunk, Document, DocumentSource};
use crate::error::{DocsplitError, DocumentError, ExtractionError, Result};
use crate::extract::TextExtractor;
use crate::result::{BatchResult, DocumentFailure, DocumentOutcome};

/// Upper bound on outcomes buffered by [`BatchPipeline::run_streaming`].
const OUTCOME_BUFFER_LIMIT: usize = 1024;

/// The batch orchestrator.
///
/// At most `max_workers` documents are extracted and chunked at the same
/// time, each on its own blocking thread. A failing document never affects
/// its siblings. Construct one via [`BatchPipeline::builder()`].
pub struct BatchPipeline {
    config: ChunkConfig,
    max_workers: usize,
    extractor: Arc<dyn TextExtractor>,
    chunker: Arc<dyn Chunker>,
}

impl BatchPipeline {
    /// Create a new [`BatchPipelineBuilder`].
    pub fn builder() -> BatchPipelineBuilder {
        BatchPipelineBuilder::default()
    }

    /// Return a reference to the chunking configuration.
    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Maximum number of documents processed concurrently.
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Process every source and wait for all of them to finish.
    ///
    /// Per-document failures are reported in [`BatchResult::failures`]; this
    /// method itself cannot fail once the pipeline has been built.
    pub async fn run(&self, sources: Vec<DocumentSource>) -> BatchResult {
        self.run_with_cancellation(sources, CancellationToken::new()).await
    }

    /// Like [`run`](Self::run), but stops early when `token` is cancelled.
    ///
    /// On cancellation, jobs still waiting for a worker slot never start and
    /// jobs already running are detached: they finish in the background but
    /// their output is discarded. Documents merged before the cancellation
    /// stay in the result; all others are listed in [`BatchResult::cancelled`].
    pub async fn run_with_cancellation(
        &self,
        sources: Vec<DocumentSource>,
        token: CancellationToken,
    ) -> BatchResult {
        let started = Instant::now();
        let submitted: Vec<String> = sources.iter().map(|s| s.id.clone()).collect();
        info!(
            document_count = submitted.len(),
            max_workers = self.max_workers,
            chunk_size = self.config.chunk_size,
            chunk_overlap = self.config.chunk_overlap,
            "starting batch"
        );

        let mut jobs = self.spawn_jobs(sources);
        let mut result = BatchResult::new();
        let mut was_cancelled = false;

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    was_cancelled = true;
                    break;
                }
                joined = jobs.join_next() => match joined {
                    Some(joined) => merge_joined(&mut result, joined),
                    None => break,
                },
            }
        }

        if was_cancelled {
            let in_flight = jobs.len();
            jobs.shutdown().await;
            warn!(in_flight, "batch cancelled, discarding unfinished documents");
        }

        let finished: HashSet<&str> = result
            .succeeded
            .iter()
            .map(|(id, _)| id.as_str())
            .chain(result.failures.iter().map(|f| f.document_id.as_str()))
            .collect();
        let missing: Vec<String> =
            submitted.into_iter().filter(|id| !finished.contains(id.as_str())).collect();

        if was_cancelled {
            result.cancelled = missing;
        } else {
            for document_id in missing {
                error!(document.id = %document_id, "job ended without reporting a result");
                result.failures.push(DocumentFailure {
                    document_id,
                    error: DocumentError::Internal("job ended without reporting a result".into()),
                });
            }
        }

        info!(
            documents = result.documents_processed(),
            chunk_count = result.chunks.len(),
            failed = result.failures.len(),
            cancelled = result.cancelled.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch finished"
        );

        result
    }

    /// Process every source, yielding each document's outcome as soon as it completes.
    ///
    /// Must be called from within a Tokio runtime. Dropping the receiver
    /// aborts jobs that have not started yet.
    pub fn run_streaming(&self, sources: Vec<DocumentSource>) -> mpsc::Receiver<DocumentOutcome> {
        let (tx, rx) = mpsc::channel(self.max_workers.saturating_mul(2).min(OUTCOME_BUFFER_LIMIT));
        let mut jobs = self.spawn_jobs(sources);

        tokio::spawn(async move {
            while let Some(joined) = jobs.join_next().await {
                match joined {
                    Ok(outcome) => {
                        log_outcome(&outcome);
                        if tx.send(outcome).await.is_err() {
                            debug!("outcome receiver dropped, stopping batch");
                            break;
                        }
                    }
                    Err(e) => error!(error = %e, "batch job aborted"),
                }
            }
        });

        rx
    }

    /// Spawn one job per source. Each job waits for a worker slot, then
    /// extracts and chunks its document on a blocking thread.
    fn spawn_jobs(&self, sources: Vec<DocumentSource>) -> JoinSet<DocumentOutcome> {
        let slots = Arc::new(Semaphore::new(self.max_workers));
        let mut jobs = JoinSet::new();

        for source in sources {
            let slots = Arc::clone(&slots);
            let extractor = Arc::clone(&self.extractor);
            let chunker = Arc::clone(&self.chunker);

            jobs.spawn(async move {
                let document_id = source.id.clone();
                let result = match slots.acquire_owned().await {
                    Ok(permit) => {
                        // The permit moves into the worker so the slot stays
                        // taken until the work ends, even if this task is aborted.
                        let worker = tokio::task::spawn_blocking(move || {
                            let _permit = permit;
                            process_document(&source, extractor.as_ref(), chunker.as_ref())
                        });
                        worker.await.unwrap_or_else(|e| Err(worker_failure(e)))
                    }
                    Err(e) => Err(DocumentError::Internal(format!("worker pool closed: {e}"))),
                };
                DocumentOutcome { document_id, result }
            });
        }

        jobs
    }
}

/// Extract and chunk a single document.
fn process_document(
    source: &DocumentSource,
    extractor: &dyn TextExtractor,
    chunker: &dyn Chunker,
) -> std::result::Result<Vec<Chunk>, DocumentError> {
    debug!(document.id = %source.id, path = %source.path.display(), "extracting document");
    let text = extractor.extract(source)?;
    if text.trim().is_empty() {
        return Err(ExtractionError::Empty.into());
    }

    let document = Document::from_source(source, text);
    let chunks = chunker.chunk(&document);
    if chunks.is_empty() {
        return Err(DocumentError::Internal("chunker produced no chunks".to_string()));
    }
    Ok(chunks)
}

fn worker_failure(err: JoinError) -> DocumentError {
    if err.is_panic() {
        let payload = err.into_panic();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        DocumentError::Internal(format!("worker panicked: {message}"))
    } else {
        DocumentError::Internal(format!("worker cancelled: {err}"))
    }
}

fn merge_joined(result: &mut BatchResult, joined: std::result::Result<DocumentOutcome, JoinError>) {
    match joined {
        Ok(outcome) => {
            log_outcome(&outcome);
            result.record(outcome);
        }
        Err(e) => error!(error = %e, "batch job aborted"),
    }
}

fn log_outcome(outcome: &DocumentOutcome) {
    match &outcome.result {
        Ok(chunks) => {
            info!(document.id = %outcome.document_id, chunk_count = chunks.len(), "finished document")
        }
        Err(e) => warn!(document.id = %outcome.document_id, error = %e, "document failed"),
    }
}

/// Builder for constructing a [`BatchPipeline`].
///
/// Only the extractor is required. The configuration defaults to
/// [`ChunkConfig::default()`], `max_workers` to the logical CPU count, and
/// the chunker to a [`RecursiveChunker`] built from the configuration.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = BatchPipeline::builder()
///     .config(ChunkConfig::builder().chunk_size(500).chunk_overlap(50).build()?)
///     .max_workers(4)
///     .extractor(Arc::new(FileExtractor))
///     .build()?;
/// ```
#[derive(Default)]
pub struct BatchPipelineBuilder {
    config: Option<ChunkConfig>,
    max_workers: Option<usize>,
    extractor: Option<Arc<dyn TextExtractor>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl BatchPipelineBuilder {
    /// Set the chunking configuration.
    pub fn config(mut self, config: ChunkConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the maximum number of documents processed concurrently.
    pub fn max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = Some(max_workers);
        self
    }

    /// Set the text extractor.
    pub fn extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Replace the default [`RecursiveChunker`].
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`BatchPipeline`], validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DocsplitError::ConfigError`] if the chunk configuration is
    /// invalid, `max_workers` is zero or larger than the semaphore can hold,
    /// or no extractor was set.
    pub fn build(self) -> Result<BatchPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let max_workers = self.max_workers.unwrap_or_else(default_max_workers);
        if max_workers == 0 {
            return Err(DocsplitError::ConfigError("max_workers must be at least 1".to_string()));
        }
        if max_workers > Semaphore::MAX_PERMITS {
            return Err(DocsplitError::ConfigError(format!(
                "max_workers must be at most {}",
                Semaphore::MAX_PERMITS
            )));
        }

        let extractor = self
            .extractor
            .ok_or_else(|| DocsplitError::ConfigError("extractor is required".to_string()))?;
        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(RecursiveChunker::new(config.clone())?),
        };

        Ok(BatchPipeline { config, max_workers, extractor, chunker })
    }
}

/// Validate the configuration, then process `sources` with a fresh pipeline.
///
/// # Errors
///
/// Returns [`DocsplitError::ConfigError`] before any document is touched if
/// `config` or `max_workers` is invalid. Per-document failures are data in
/// the returned [`BatchResult`].
pub async fn run_batch(
    sources: Vec<DocumentSource>,
    config: ChunkConfig,
    max_workers: usize,
    extractor: Arc<dyn TextExtractor>,
) -> Result<BatchResult> {
    let pipeline =
        BatchPipeline::builder().config(config).max_workers(max_workers).extractor(extractor).build()?;
    Ok(pipeline.run(sources).await)
}
