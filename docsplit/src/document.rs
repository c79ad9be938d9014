//! Data types for document sources, extracted documents, and chunks.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Metadata key naming the file a chunk came from.
pub const SOURCE_FILE_KEY: &str = "source_file";
/// Metadata key holding a chunk's zero-based position within its document.
pub const CHUNK_INDEX_KEY: &str = "chunk_index";

/// A document waiting to be processed: an identifier plus where to read it from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DocumentSource {
    /// Unique identifier for the document within a batch.
    pub id: String,
    /// Location handed to the extractor.
    pub path: PathBuf,
}

impl DocumentSource {
    /// Create a source with an explicit identifier.
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self { id: id.into(), path: path.into() }
    }

    /// Create a source identified by its own path.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self { id: path.display().to_string(), path: path.to_path_buf() }
    }

    /// The bare file name, used as the `source_file` metadata value.
    ///
    /// Falls back to the identifier when the path has no file name component.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.id.clone())
    }

    /// Lowercased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        self.path.extension().map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }
}

/// A document whose text has been extracted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The text content of the document.
    pub text: String,
    /// Key-value metadata copied onto every chunk.
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    /// Create a document with no metadata.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), metadata: BTreeMap::new() }
    }

    /// Create a document from extracted text, tagging it with the source file name.
    pub fn from_source(source: &DocumentSource, text: String) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(SOURCE_FILE_KEY.to_string(), source.file_name());
        Self { id: source.id.clone(), text, metadata }
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A bounded segment of a [`Document`]'s text with provenance metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Unique identifier for the chunk, `{document_id}_{chunk_index}`.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// Metadata inherited from the parent document plus `source_file` and `chunk_index`.
    pub metadata: BTreeMap<String, String>,
    /// The ID of the parent [`Document`].
    pub document_id: String,
}

impl Chunk {
    /// The `source_file` metadata value.
    pub fn source_file(&self) -> &str {
        self.metadata.get(SOURCE_FILE_KEY).map(String::as_str).unwrap_or(&self.document_id)
    }

    /// Position of this chunk within its document.
    pub fn index(&self) -> Option<usize> {
        self.metadata.get(CHUNK_INDEX_KEY).and_then(|value| value.parse().ok())
    }
}
