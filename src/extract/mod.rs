//! Text extraction for the supported document formats.
//!
//! Extraction is dispatched on the lowercase file extension. An unrecognized extension is an
//! error; a file that parses but contains no text yields an empty string, which the pipeline
//! treats as "no extractable text". Format-specific logic lives in one module per format.

mod docx;
mod pdf;
mod text;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while extracting text from a document.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// File extension is not one of the supported formats.
    #[error("unsupported file type '{extension}'; supported types are .pdf, .docx, .txt")]
    UnsupportedType {
        /// Extension that failed dispatch.
        extension: String,
    },
    /// Document file does not exist on disk.
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    /// PDF parsing failed.
    #[error("failed to parse PDF {path}: {message}")]
    Pdf {
        /// Document that failed to parse.
        path: PathBuf,
        /// Underlying parser diagnostic.
        message: String,
    },
    /// DOCX parsing failed.
    #[error("failed to parse DOCX {path}: {message}")]
    Docx {
        /// Document that failed to parse.
        path: PathBuf,
        /// Underlying parser diagnostic.
        message: String,
    },
    /// Reading the file from disk failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Document that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Capability consumed by the pipeline: turn a staged document into plain text.
pub trait TextExtractor: Send + Sync {
    /// Extract plain text from the document at `path`.
    fn extract(&self, path: &Path) -> Result<String, ExtractError>;
}

/// Extension-dispatched extractor covering all supported formats.
#[derive(Debug, Default)]
pub struct DocumentExtractor;

impl DocumentExtractor {
    /// Create a new extractor.
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for DocumentExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        if !path.exists() {
            return Err(ExtractError::NotFound(path.to_path_buf()));
        }

        let extension = path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_lowercase)
            .unwrap_or_default();

        tracing::debug!(path = %path.display(), extension = %extension, "Extracting text");
        match extension.as_str() {
            "pdf" => pdf::extract_text(path),
            "docx" => docx::extract_text(path),
            "txt" => text::extract_text(path),
            _ => Err(ExtractError::UnsupportedType { extension }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn rejects_unsupported_extension() {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .expect("tempfile");
        writeln!(file, "a,b,c").expect("write");

        let error = DocumentExtractor::new()
            .extract(file.path())
            .expect_err("unsupported type");
        assert!(matches!(
            error,
            ExtractError::UnsupportedType { extension } if extension == "csv"
        ));
    }

    #[test]
    fn rejects_missing_file() {
        let error = DocumentExtractor::new()
            .extract(Path::new("does/not/exist.txt"))
            .expect_err("missing file");
        assert!(matches!(error, ExtractError::NotFound(_)));
    }

    #[test]
    fn dispatches_on_uppercase_extension() {
        let mut file = tempfile::Builder::new()
            .suffix(".TXT")
            .tempfile()
            .expect("tempfile");
        writeln!(file, "upper case extension").expect("write");

        let text = DocumentExtractor::new()
            .extract(file.path())
            .expect("extracted text");
        assert_eq!(text, "upper case extension");
    }
}
