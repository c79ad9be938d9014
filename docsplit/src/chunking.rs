//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`RecursiveChunker`], which
//! splits text at the coarsest separator that yields pieces small enough to
//! merge into bounded chunks, descending to finer separators only for pieces
//! that are still too large.
//!
//! All lengths are counted in `char`s. Slicing never splits a UTF-8 sequence.

use crate::config::ChunkConfig;
use crate::document::{CHUNK_INDEX_KEY, Chunk, Document, SOURCE_FILE_KEY};
use crate::error::Result;

/// A strategy for splitting documents into chunks.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks, in text order.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Splits text hierarchically through a list of separators, coarse to fine.
///
/// With the default separators the text is first split into paragraphs
/// (`\n\n`), then lines, then words, and finally individual characters.
/// Consecutive pieces are merged greedily up to `chunk_size` characters.
/// Each chunk after the first starts with the last `chunk_overlap`
/// characters of the chunk before it.
///
/// Separators are kept at the end of the piece they terminate, so with
/// `chunk_overlap == 0` the chunks concatenate back to the original text.
///
/// # Example
///
/// ```rust
/// use docsplit::{ChunkConfig, RecursiveChunker};
///
/// let config = ChunkConfig::builder().chunk_size(10).chunk_overlap(2).build()?;
/// let chunker = RecursiveChunker::new(config)?;
/// assert_eq!(chunker.split_text("abcdefghijklmno"), vec!["abcdefghij", "ijklmno"]);
/// # Ok::<(), docsplit::DocsplitError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    config: ChunkConfig,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`DocsplitError::ConfigError`](crate::DocsplitError::ConfigError)
    /// if the configuration cannot guarantee forward progress.
    pub fn new(config: ChunkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create a chunker with the default separators.
    pub fn with_sizes(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        Self::new(ChunkConfig::builder().chunk_size(chunk_size).chunk_overlap(chunk_overlap).build()?)
    }

    /// Return a reference to the chunker configuration.
    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Split raw text into chunk strings, in text order.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let separators: Vec<&str> = self.config.separators.iter().map(String::as_str).collect();
        let mut merger = Merger::new(self.config.chunk_size, self.config.chunk_overlap);
        split_and_merge(text, &separators, &mut merger);
        merger.finish()
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }

        self.split_text(&document.text)
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let mut metadata = document.metadata.clone();
                metadata
                    .entry(SOURCE_FILE_KEY.to_string())
                    .or_insert_with(|| document.id.clone());
                metadata.insert(CHUNK_INDEX_KEY.to_string(), i.to_string());
                Chunk {
                    id: format!("{}_{i}", document.id),
                    text,
                    metadata,
                    document_id: document.id.clone(),
                }
            })
            .collect()
    }
}

/// Feed `span` into the merger, splitting it at the first separator and
/// descending to the next one for any piece that cannot fit even in a
/// freshly started chunk.
///
/// The merger is shared across tiers: a piece split at a finer separator
/// continues the running chunk, and the overlap seed always comes from
/// whichever chunk was emitted last, regardless of the tier that produced it.
/// An exhausted list behaves like the empty separator, which slices at
/// exactly `chunk_size` characters with a `chunk_size - chunk_overlap` step.
fn split_and_merge(span: &str, separators: &[&str], merger: &mut Merger) {
    let span_chars = span.chars().count();
    if merger.fits(span_chars) {
        merger.append(span, span_chars);
        return;
    }

    let (separator, finer) = match separators.split_first() {
        Some((separator, finer)) => (*separator, finer),
        None => ("", separators),
    };

    for piece in split_keeping_separator(span, separator) {
        let piece_chars = piece.chars().count();
        if !merger.fits(piece_chars) {
            merger.flush();
        }
        if merger.fits(piece_chars) {
            merger.append(piece, piece_chars);
        } else {
            // The flushed buffer still holds the overlap seed, so a piece that
            // would fit an empty chunk can land here too. It is split at the
            // finer separators rather than dropping the seed: every chunk keeps
            // its exact overlap prefix, at the cost of cutting such a piece.
            // A single character always fits after a flush.
            debug_assert!(!separator.is_empty());
            split_and_merge(piece, finer, merger);
        }
    }
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
///
/// The empty separator yields one segment per character.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text.char_indices().map(|(i, c)| &text[i..i + c.len_utf8()]).collect();
    }

    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// The last `n` characters of `text` (all of it if shorter).
fn tail_chars(text: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match text.char_indices().rev().nth(n - 1) {
        Some((start, _)) => &text[start..],
        None => text,
    }
}

/// Running chunk buffer.
///
/// `buffer` always starts with the overlap seed taken from the previous
/// chunk; `fresh_chars` counts what was appended after it. A buffer with no
/// fresh characters is never emitted.
struct Merger {
    chunk_size: usize,
    chunk_overlap: usize,
    buffer: String,
    buffer_chars: usize,
    fresh_chars: usize,
    chunks: Vec<String>,
}

impl Merger {
    fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            buffer: String::new(),
            buffer_chars: 0,
            fresh_chars: 0,
            chunks: Vec::new(),
        }
    }

    fn fits(&self, piece_chars: usize) -> bool {
        self.buffer_chars + piece_chars <= self.chunk_size
    }

    fn append(&mut self, piece: &str, piece_chars: usize) {
        self.buffer.push_str(piece);
        self.buffer_chars += piece_chars;
        self.fresh_chars += piece_chars;
    }

    /// Emit the buffer and reseed it with the overlap tail.
    fn flush(&mut self) {
        if self.fresh_chars == 0 {
            return;
        }
        let seed = tail_chars(&self.buffer, self.chunk_overlap).to_string();
        let emitted = std::mem::replace(&mut self.buffer, seed);
        self.buffer_chars = self.buffer_chars.min(self.chunk_overlap);
        self.fresh_chars = 0;
        self.chunks.push(emitted);
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.chunks
    }
}
