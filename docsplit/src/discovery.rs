//! Locating document files on disk.

use std::path::Path;

use tracing::warn;
use walkdir::WalkDir;

use crate::document::DocumentSource;
use crate::error::{DocsplitError, Result};

/// Which files [`discover_documents`] picks up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Accepted extensions without the leading dot, compared case-insensitively.
    pub extensions: Vec<String>,
    /// Descend into subdirectories.
    pub recursive: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self { extensions: vec!["pdf".to_string()], recursive: false }
    }
}

/// List the documents under `root` matching `options`, sorted by path.
///
/// Identifiers are paths relative to `root`.
pub fn discover_documents(
    root: impl AsRef<Path>,
    options: &DiscoveryOptions,
) -> Result<Vec<DocumentSource>> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(DocsplitError::PipelineError(format!(
            "document directory '{}' does not exist or is not a directory",
            root.display()
        )));
    }

    let extensions: Vec<String> = options
        .extensions
        .iter()
        .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
        .collect();
    let max_depth = if options.recursive { usize::MAX } else { 1 };

    let mut files = WalkDir::new(root)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry.path().extension().is_some_and(|ext| {
                extensions.contains(&ext.to_string_lossy().to_ascii_lowercase())
            })
        })
        .map(|entry| entry.into_path())
        .collect::<Vec<_>>();

    files.sort();
    Ok(files
        .into_iter()
        .map(|path| {
            let id = path.strip_prefix(root).unwrap_or(&path).display().to_string();
            DocumentSource::new(id, path)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn options(extensions: &[&str], recursive: bool) -> DiscoveryOptions {
        DiscoveryOptions {
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            recursive,
        }
    }

    #[test]
    fn discovers_top_level_matching_files() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("nested")).unwrap();
        fs::write(root.join("b.pdf"), "").unwrap();
        fs::write(root.join("a.PDF"), "").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();
        fs::write(root.join("nested/c.pdf"), "").unwrap();

        let sources = discover_documents(root, &DiscoveryOptions::default()).unwrap();
        let ids: Vec<_> = sources.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a.PDF", "b.pdf"]);
        assert!(sources.iter().all(|s| s.path.starts_with(root)));
    }

    #[test]
    fn recursive_discovery_includes_subdirectories() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("nested/deeper")).unwrap();
        fs::write(root.join("top.txt"), "").unwrap();
        fs::write(root.join("nested/deeper/low.md"), "").unwrap();
        fs::write(root.join("nested/skip.pdf"), "").unwrap();

        let sources = discover_documents(root, &options(&[".txt", "md"], true)).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].file_name(), "low.md");
        assert_eq!(sources[1].id, "top.txt");
    }

    #[test]
    fn empty_directory_is_not_an_error() {
        let temp = tempfile::tempdir().unwrap();
        assert!(discover_documents(temp.path(), &DiscoveryOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = discover_documents(temp.path().join("nope"), &DiscoveryOptions::default())
            .unwrap_err();
        assert!(matches!(err, DocsplitError::PipelineError(_)));
    }
}
