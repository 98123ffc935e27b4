//! DOCX text extraction.
//!
//! A `.docx` file is a ZIP archive; the document body lives in `word/document.xml`. Text is
//! collected per paragraph (`w:p`), which also covers table cells since each cell wraps its
//! content in paragraphs, so tables come out as one line per cell paragraph.

use crate::extract::ExtractError;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::Read;
use std::path::Path;

/// Extract the paragraph text of a DOCX document.
pub(crate) fn extract_text(path: &Path) -> Result<String, ExtractError> {
    let file = std::fs::File::open(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|error| ExtractError::Docx {
        path: path.to_path_buf(),
        message: format!("not a valid DOCX archive: {error}"),
    })?;
    let mut entry = archive
        .by_name("word/document.xml")
        .map_err(|error| ExtractError::Docx {
            path: path.to_path_buf(),
            message: format!("missing word/document.xml: {error}"),
        })?;

    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    parse_document_xml(&xml).map_err(|message| ExtractError::Docx {
        path: path.to_path_buf(),
        message,
    })
}

/// Walk the WordprocessingML body, emitting one line per non-empty paragraph.
fn parse_document_xml(xml: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::End(end)) if end.local_name().as_ref() == b"p" => {
                let line = current.trim();
                if !line.is_empty() {
                    paragraphs.push(line.to_string());
                }
                current.clear();
            }
            Ok(Event::Empty(empty)) => match empty.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(text)) => {
                let value = text
                    .unescape()
                    .map_err(|error| format!("invalid XML text node: {error}"))?;
                current.push_str(&value);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(error) => return Err(format!("invalid document XML: {error}")),
        }
    }

    if !current.trim().is_empty() {
        paragraphs.push(current.trim().to_string());
    }
    Ok(paragraphs.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn write_docx(document_xml: &str) -> tempfile::NamedTempFile {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            writer
                .start_file("word/document.xml", SimpleFileOptions::default())
                .expect("start entry");
            writer
                .write_all(document_xml.as_bytes())
                .expect("write entry");
            writer.finish().expect("finish archive");
        }

        let mut file = tempfile::Builder::new()
            .suffix(".docx")
            .tempfile()
            .expect("tempfile");
        file.write_all(cursor.get_ref()).expect("write archive");
        file
    }

    #[test]
    fn extracts_paragraphs_in_order() {
        let file = write_docx(
            r#"<?xml version="1.0"?>
            <w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
              <w:body>
                <w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p>
                <w:p><w:r><w:t>Col A</w:t><w:tab/><w:t>Col B</w:t></w:r></w:p>
                <w:p><w:r><w:t xml:space="preserve"> </w:t></w:r></w:p>
                <w:p><w:r><w:t>Last &amp; final.</w:t></w:r></w:p>
              </w:body>
            </w:document>"#,
        );

        let text = extract_text(file.path()).expect("text");
        assert_eq!(text, "First paragraph.\nCol A\tCol B\nLast & final.");
    }

    #[test]
    fn empty_body_yields_empty_string() {
        let file = write_docx(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
              <w:body></w:body>
            </w:document>"#,
        );

        let text = extract_text(file.path()).expect("text");
        assert!(text.is_empty());
    }

    #[test]
    fn non_archive_reports_parse_error() {
        let mut file = tempfile::Builder::new()
            .suffix(".docx")
            .tempfile()
            .expect("tempfile");
        file.write_all(b"plain bytes, not a zip").expect("write");

        let error = extract_text(file.path()).expect_err("parse failure");
        assert!(matches!(error, ExtractError::Docx { .. }));
    }
}
