//! Plain text extraction.

use crate::extract::ExtractError;
use std::path::Path;

/// Read a `.txt` file, tolerating non-UTF-8 content with a lossy fallback.
pub(crate) fn extract_text(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let content = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(error) => {
            tracing::debug!(path = %path.display(), "File is not valid UTF-8; decoding lossily");
            String::from_utf8_lossy(error.as_bytes()).into_owned()
        }
    };

    Ok(content.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_utf8_content() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, "  first line\nsecond line\n").expect("write");

        let text = extract_text(file.path()).expect("text");
        assert_eq!(text, "first line\nsecond line");
    }

    #[test]
    fn whitespace_only_file_yields_empty_string() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, "   \n\t\n").expect("write");

        let text = extract_text(file.path()).expect("text");
        assert!(text.is_empty());
    }

    #[test]
    fn non_utf8_content_is_decoded_lossily() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(b"caf\xe9 latte").expect("write");

        let text = extract_text(file.path()).expect("text");
        assert!(text.starts_with("caf"));
        assert!(text.ends_with("latte"));
    }
}
