//! PDF text extraction.

use crate::extract::ExtractError;
use std::path::Path;

/// Extract text from a PDF, normalizing the parser's whitespace-heavy output.
///
/// Scanned PDFs without a text layer parse successfully but produce no text; that case is
/// reported as an empty string so the pipeline can flag it, not as an error.
pub(crate) fn extract_text(path: &Path) -> Result<String, ExtractError> {
    let raw = pdf_extract::extract_text(path).map_err(|error| ExtractError::Pdf {
        path: path.to_path_buf(),
        message: error.to_string(),
    })?;

    let text = normalize(&raw);
    if text.is_empty() {
        tracing::warn!(path = %path.display(), "PDF parsed but contains no text layer");
    }
    Ok(text)
}

/// Trim each line and collapse runs of blank lines left behind by the extractor.
fn normalize(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in raw.lines().map(str::trim) {
        let last_was_blank = lines.last().is_some_and(|last| last.is_empty());
        if line.is_empty() && (last_was_blank || lines.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|last| last.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}
