//! Configuration for chunking and batch runs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DocsplitError, Result};

/// Default maximum chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default overlap between consecutive chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Separators tried from coarse to fine: paragraph, line, word, character.
pub fn default_separators() -> Vec<String> {
    ["\n\n", "\n", " ", ""].iter().map(|s| s.to_string()).collect()
}

/// Chunking parameters.
///
/// Sizes are measured in characters (Unicode scalar values), not bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of characters repeated at the start of each chunk from the end of the previous one.
    pub chunk_overlap: usize,
    /// Split boundaries in priority order. The empty string splits between any two characters.
    pub separators: Vec<String>,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            separators: default_separators(),
        }
    }
}

impl ChunkConfig {
    /// Create a new builder for constructing a [`ChunkConfig`].
    pub fn builder() -> ChunkConfigBuilder {
        ChunkConfigBuilder::default()
    }

    /// Check that the parameters can guarantee forward progress.
    ///
    /// # Errors
    ///
    /// Returns [`DocsplitError::ConfigError`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(DocsplitError::ConfigError(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(DocsplitError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`ChunkConfig`].
#[derive(Debug, Clone, Default)]
pub struct ChunkConfigBuilder {
    config: ChunkConfig,
}

impl ChunkConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Replace the separator list.
    pub fn separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    /// Build the [`ChunkConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`ChunkConfig::validate`].
    pub fn build(self) -> Result<ChunkConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Output encoding for a finished batch.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `Source:`/`Content:` blocks joined by a separator line.
    #[default]
    Text,
    /// One JSON object per chunk.
    #[serde(alias = "jsonl")]
    JsonLines,
}

/// Settings file for a whole run, usually loaded from `docsplit.toml`.
///
/// ```toml
/// max_workers = 8
/// extensions = ["pdf", "txt"]
/// recursive = false
/// format = "text"
///
/// [chunking]
/// chunk_size = 1000
/// chunk_overlap = 200
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DocsplitConfig {
    /// Chunking parameters.
    pub chunking: ChunkConfig,
    /// Concurrent job limit. `None` means one per logical CPU.
    pub max_workers: Option<usize>,
    /// File extensions picked up by discovery.
    pub extensions: Vec<String>,
    /// Descend into subdirectories during discovery.
    pub recursive: bool,
    /// Output encoding.
    pub format: OutputFormat,
}

impl Default for DocsplitConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkConfig::default(),
            max_workers: None,
            extensions: vec!["pdf".to_string()],
            recursive: false,
            format: OutputFormat::default(),
        }
    }
}

impl DocsplitConfig {
    /// Parse a TOML settings document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`DocsplitError::ConfigError`] if the document is not valid
    /// TOML, does not match the schema, or describes invalid chunking values.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| DocsplitError::ConfigError(format!("invalid settings: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML settings file.
    ///
    /// # Errors
    ///
    /// Returns [`DocsplitError::ConfigError`] if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DocsplitError::ConfigError(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Validate chunking values and the worker limit.
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.max_workers == Some(0) {
            return Err(DocsplitError::ConfigError(
                "max_workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The worker limit to use, falling back to the host's logical CPU count.
    pub fn effective_max_workers(&self) -> usize {
        self.max_workers.unwrap_or_else(default_max_workers)
    }
}

/// One worker per logical CPU.
pub fn default_max_workers() -> usize {
    num_cpus::get().max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_overlap_not_below_size() {
        let err = ChunkConfig::builder().chunk_size(10).chunk_overlap(10).build().unwrap_err();
        assert!(matches!(err, DocsplitError::ConfigError(_)));

        let err = ChunkConfig::builder().chunk_size(10).chunk_overlap(25).build().unwrap_err();
        assert!(err.to_string().contains("chunk_overlap (25)"));
    }

    #[test]
    fn builder_rejects_zero_size() {
        let err = ChunkConfig::builder().chunk_size(0).chunk_overlap(0).build().unwrap_err();
        assert!(matches!(err, DocsplitError::ConfigError(_)));
    }

    #[test]
    fn defaults_are_valid() {
        let config = ChunkConfig::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.separators, vec!["\n\n", "\n", " ", ""]);
        config.validate().unwrap();
    }

    #[test]
    fn settings_file_fills_missing_keys() {
        let config = DocsplitConfig::from_toml_str(
            r#"
            max_workers = 3
            extensions = ["txt"]

            [chunking]
            chunk_size = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.max_workers, Some(3));
        assert_eq!(config.extensions, vec!["txt"]);
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, DEFAULT_CHUNK_OVERLAP);
        assert_eq!(config.chunking.separators, default_separators());
        assert!(!config.recursive);
    }

    #[test]
    fn settings_file_rejects_overlap_above_size() {
        let err = DocsplitConfig::from_toml_str("[chunking]\nchunk_size = 50\n").unwrap_err();
        assert!(matches!(err, DocsplitError::ConfigError(_)));
    }

    #[test]
    fn settings_file_rejects_zero_workers() {
        let err = DocsplitConfig::from_toml_str("max_workers = 0").unwrap_err();
        assert!(err.to_string().contains("max_workers"));
    }

    #[test]
    fn jsonl_alias_parses() {
        let config = DocsplitConfig::from_toml_str("format = \"jsonl\"").unwrap();
        assert_eq!(config.format, OutputFormat::JsonLines);
    }
}
