//! Text extraction from document files.
//!
//! Extractors are synchronous and stateless per call. The batch pipeline runs
//! them on blocking worker threads and shares one instance across all jobs.

use std::path::Path;

use crate::document::DocumentSource;
use crate::error::ExtractionError;

/// Produces the raw text of a document.
pub trait TextExtractor: Send + Sync {
    /// Extract the full text of `source`.
    ///
    /// # Errors
    ///
    /// Returns an [`ExtractionError`] if the source is unreadable, corrupt,
    /// or of an unsupported format.
    fn extract(&self, source: &DocumentSource) -> Result<String, ExtractionError>;
}

impl<F> TextExtractor for F
where
    F: Fn(&DocumentSource) -> Result<String, ExtractionError> + Send + Sync,
{
    fn extract(&self, source: &DocumentSource) -> Result<String, ExtractionError> {
        self(source)
    }
}

/// Reads UTF-8 text files as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, source: &DocumentSource) -> Result<String, ExtractionError> {
        let bytes = std::fs::read(&source.path)
            .map_err(|e| ExtractionError::Io { path: source.path.clone(), source: e })?;
        String::from_utf8(bytes).map_err(|e| ExtractionError::Corrupt {
            path: source.path.clone(),
            message: format!("invalid UTF-8: {e}"),
        })
    }
}

/// Extracts the text layer of PDF files.
#[cfg(feature = "pdf")]
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

#[cfg(feature = "pdf")]
impl TextExtractor for PdfExtractor {
    fn extract(&self, source: &DocumentSource) -> Result<String, ExtractionError> {
        if !source.path.is_file() {
            return Err(ExtractionError::Io {
                path: source.path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            });
        }
        // pdf-extract panics on some malformed inputs instead of returning an error.
        let path = source.path.clone();
        let extracted = std::panic::catch_unwind(move || pdf_extract::extract_text(&path));
        match extracted {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(ExtractionError::Corrupt {
                path: source.path.clone(),
                message: e.to_string(),
            }),
            Err(_) => Err(ExtractionError::Corrupt {
                path: source.path.clone(),
                message: "PDF parser aborted on malformed input".to_string(),
            }),
        }
    }
}

/// Extensions read by [`PlainTextExtractor`] inside a [`FileExtractor`].
pub const PLAIN_TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "text", "csv", "log"];

/// Chooses an extractor from the file extension.
///
/// `pdf` goes to [`PdfExtractor`] (when the `pdf` feature is enabled) and
/// [`PLAIN_TEXT_EXTENSIONS`] go to [`PlainTextExtractor`]. Anything else
/// fails with [`ExtractionError::UnsupportedFormat`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FileExtractor;

impl FileExtractor {
    /// Whether `path` has an extension this extractor handles.
    pub fn supports(path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|ext| Self::supports_extension(&ext))
    }

    fn supports_extension(ext: &str) -> bool {
        (cfg!(feature = "pdf") && ext == "pdf") || PLAIN_TEXT_EXTENSIONS.contains(&ext)
    }
}

impl TextExtractor for FileExtractor {
    fn extract(&self, source: &DocumentSource) -> Result<String, ExtractionError> {
        let ext = source.extension().unwrap_or_default();
        match ext.as_str() {
            #[cfg(feature = "pdf")]
            "pdf" => PdfExtractor.extract(source),
            ext if PLAIN_TEXT_EXTENSIONS.contains(&ext) => PlainTextExtractor.extract(source),
            "" => Err(ExtractionError::UnsupportedFormat(format!(
                "'{}' has no file extension",
                source.path.display()
            ))),
            other => Err(ExtractionError::UnsupportedFormat(format!(".{other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_plain_text() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("notes.txt");
        fs::write(&path, "hello\n\nworld").unwrap();

        let text = PlainTextExtractor.extract(&DocumentSource::from_path(&path)).unwrap();
        assert_eq!(text, "hello\n\nworld");
    }

    #[test]
    fn missing_file_is_io_error() {
        let temp = tempfile::tempdir().unwrap();
        let source = DocumentSource::from_path(temp.path().join("absent.txt"));
        let err = PlainTextExtractor.extract(&source).unwrap_err();
        assert!(matches!(err, ExtractionError::Io { .. }));
        assert!(err.to_string().contains("absent.txt"));
    }

    #[test]
    fn invalid_utf8_is_corrupt() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("bad.txt");
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        let err = PlainTextExtractor.extract(&DocumentSource::from_path(&path)).unwrap_err();
        assert!(matches!(err, ExtractionError::Corrupt { .. }));
    }

    #[test]
    fn file_extractor_dispatches_on_extension() {
        let temp = tempfile::tempdir().unwrap();
        let md = temp.path().join("README.MD");
        fs::write(&md, "# title").unwrap();

        assert_eq!(FileExtractor.extract(&DocumentSource::from_path(&md)).unwrap(), "# title");

        let err = FileExtractor.extract(&DocumentSource::new("x", "slides.pptx")).unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat(ref ext) if ext == ".pptx"));

        let err = FileExtractor.extract(&DocumentSource::new("x", "Makefile")).unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat(_)));
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn garbage_pdf_is_corrupt() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("broken.pdf");
        fs::write(&path, b"this is not a pdf").unwrap();

        let err = FileExtractor.extract(&DocumentSource::from_path(&path)).unwrap_err();
        assert!(matches!(err, ExtractionError::Corrupt { .. }));
    }

    #[test]
    fn closures_are_extractors() {
        let extractor =
            |source: &DocumentSource| Ok::<_, ExtractionError>(format!("text of {}", source.id));
        let text = extractor.extract(&DocumentSource::new("a", "a.txt")).unwrap();
        assert_eq!(text, "text of a");
    }

    #[test]
    fn supports_known_extensions() {
        assert!(FileExtractor::supports(Path::new("a/b.txt")));
        assert!(!FileExtractor::supports(Path::new("a/b.docx")));
        assert_eq!(FileExtractor::supports(Path::new("a/b.pdf")), cfg!(feature = "pdf"));
    }
}
