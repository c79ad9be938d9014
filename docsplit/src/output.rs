//! Serialization of finished batches.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::config::OutputFormat;
use crate::document::Chunk;
use crate::error::{DocsplitError, Result};
use crate::result::BatchResult;

/// Line placed between consecutive chunks in [`OutputFormat::Text`].
pub const CHUNK_SEPARATOR: &str = "\n\n---CHUNK SEPARATOR---\n\n";

/// Write `chunks` to `writer` in the given format.
pub fn write_chunks<W: Write>(writer: W, chunks: &[Chunk], format: OutputFormat) -> io::Result<()> {
    let mut writer = BufWriter::new(writer);
    match format {
        OutputFormat::Text => {
            for (i, chunk) in chunks.iter().enumerate() {
                if i > 0 {
                    writer.write_all(CHUNK_SEPARATOR.as_bytes())?;
                }
                write!(writer, "Source: {}\n\nContent:\n{}", chunk.source_file(), chunk.text)?;
            }
        }
        OutputFormat::JsonLines => {
            for chunk in chunks {
                serde_json::to_writer(&mut writer, chunk)?;
                writer.write_all(b"\n")?;
            }
        }
    }
    writer.flush()
}

/// Write every chunk of `result` to the file at `path`, replacing it.
///
/// # Errors
///
/// Returns [`DocsplitError::OutputError`] if the file cannot be created or written.
pub fn write_batch(path: impl AsRef<Path>, result: &BatchResult, format: OutputFormat) -> Result<()> {
    let path = path.as_ref();
    let to_output_error = |source| DocsplitError::OutputError { path: path.to_path_buf(), source };

    let file = File::create(path).map_err(to_output_error)?;
    write_chunks(file, &result.chunks, format).map_err(to_output_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SOURCE_FILE_KEY;
    use std::collections::BTreeMap;

    fn chunk(source_file: &str, text: &str) -> Chunk {
        let mut metadata = BTreeMap::new();
        metadata.insert(SOURCE_FILE_KEY.to_string(), source_file.to_string());
        Chunk {
            id: format!("{source_file}_0"),
            text: text.to_string(),
            metadata,
            document_id: source_file.to_string(),
        }
    }

    #[test]
    fn text_format_joins_with_separator() {
        let chunks = vec![chunk("a.pdf", "first"), chunk("b.pdf", "second")];
        let mut out = Vec::new();
        write_chunks(&mut out, &chunks, OutputFormat::Text).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Source: a.pdf\n\nContent:\nfirst\n\n---CHUNK SEPARATOR---\n\nSource: b.pdf\n\nContent:\nsecond"
        );
    }

    #[test]
    fn json_lines_has_one_object_per_chunk() {
        let chunks = vec![chunk("a.pdf", "first"), chunk("a.pdf", "second\nline")];
        let mut out = Vec::new();
        write_chunks(&mut out, &chunks, OutputFormat::JsonLines).unwrap();

        let text = String::from_utf8(out).unwrap();
        let parsed: Vec<Chunk> =
            text.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
        assert_eq!(parsed, chunks);
    }

    #[test]
    fn empty_batch_writes_empty_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("chunks_output.txt");
        write_batch(&path, &BatchResult::new(), OutputFormat::Text).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn unwritable_path_is_output_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("missing-dir").join("out.txt");
        let err = write_batch(&path, &BatchResult::new(), OutputFormat::Text).unwrap_err();
        assert!(matches!(err, DocsplitError::OutputError { .. }));
    }
}
