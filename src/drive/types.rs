//! File source contract and data types.

use crate::auth::AuthError;
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// MIME types accepted from the Drive folder, paired with their local file extension.
const SUPPORTED_MIME_TYPES: &[(&str, &str)] = &[
    ("application/pdf", ".pdf"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ".docx",
    ),
    ("text/plain", ".txt"),
];

/// Enumerate the MIME types the file source will return.
pub fn supported_mime_types() -> impl Iterator<Item = &'static str> {
    SUPPORTED_MIME_TYPES.iter().map(|(mime, _)| *mime)
}

/// Map a supported MIME type to its local file extension.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    SUPPORTED_MIME_TYPES
        .iter()
        .find(|(candidate, _)| *candidate == mime)
        .map(|(_, extension)| *extension)
}

/// Metadata for one candidate document, plus its local path once downloaded.
#[derive(Debug, Clone, Serialize)]
pub struct FileDescriptor {
    /// Opaque Drive file identifier.
    pub id: String,
    /// Display name of the file.
    pub name: String,
    /// Declared MIME type.
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// Local file extension derived from the MIME type.
    pub extension: String,
    /// Staging path populated after download; `None` until then.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
}

/// Errors raised by the Drive file source.
#[derive(Debug, Error)]
pub enum DriveError {
    /// Credential acquisition failed.
    #[error("Drive authorization failed: {0}")]
    Auth(#[from] AuthError),
    /// Transport-level failure reaching the Drive API.
    #[error("failed to reach the Drive API: {0}")]
    Request(String),
    /// Drive API returned an error response.
    #[error("Drive API returned {status}: {message}")]
    Api {
        /// HTTP status code of the response.
        status: u16,
        /// Response body captured for diagnostics.
        message: String,
    },
    /// Drive API response could not be decoded.
    #[error("malformed Drive API response: {0}")]
    InvalidResponse(String),
    /// Writing a downloaded file to the staging directory failed.
    #[error("failed to write downloaded file: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability consumed by the pipeline: enumerate and stage candidate documents.
#[async_trait]
pub trait FileSource: Send + Sync {
    /// List supported files in the folder without downloading them.
    async fn list_files(&self, folder_id: &str) -> Result<Vec<FileDescriptor>, DriveError>;

    /// List and download all supported files into `download_dir`.
    ///
    /// Files whose individual download fails are skipped with a logged warning; a failure
    /// to enumerate the folder at all is an error.
    async fn fetch_all(
        &self,
        folder_id: &str,
        download_dir: &Path,
    ) -> Result<Vec<FileDescriptor>, DriveError>;

    /// Verify that credentials are usable and the Drive API is reachable.
    async fn check_connection(&self) -> Result<(), DriveError>;
}
