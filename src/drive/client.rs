//! HTTP client wrapper for the Google Drive v3 API.

use crate::auth::CredentialProvider;
use crate::drive::types::{DriveError, FileDescriptor, FileSource, extension_for_mime, supported_mime_types};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";
const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType)";

/// Lightweight Drive v3 client backed by an injected credential provider.
pub struct DriveClient {
    http: Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

/// One page of a `files.list` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListResponse {
    next_page_token: Option<String>,
    #[serde(default)]
    files: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileEntry {
    id: String,
    name: String,
    mime_type: String,
}

impl DriveClient {
    /// Construct a client against the public Drive API.
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self::with_base_url(credentials, DEFAULT_BASE_URL.to_string())
    }

    /// Construct a client against an explicit base URL (used by tests).
    pub fn with_base_url(credentials: Arc<dyn CredentialProvider>, base_url: String) -> Self {
        let http = Client::builder()
            .user_agent("docsum/drive")
            .build()
            .expect("Failed to construct reqwest::Client for Drive");
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/drive/v3/{path}", self.base_url)
    }

    /// Build the `files.list` query restricting results to supported, non-trashed documents.
    fn folder_query(folder_id: &str) -> String {
        let mime_clauses = supported_mime_types()
            .map(|mime| format!("mimeType='{mime}'"))
            .collect::<Vec<_>>()
            .join(" or ");
        format!("'{folder_id}' in parents and ({mime_clauses}) and trashed=false")
    }

    /// Download one file into `download_dir`, returning the local path.
    async fn download_file(
        &self,
        file: &FileDescriptor,
        download_dir: &Path,
    ) -> Result<PathBuf, DriveError> {
        tokio::fs::create_dir_all(download_dir).await?;
        let token = self.credentials.access_token().await?;

        let response = self
            .http
            .get(self.endpoint(&format!("files/{}", file.id)))
            .query(&[("alt", "media")])
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|error| DriveError::Request(error.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(DriveError::Api { status, message });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|error| DriveError::Request(error.to_string()))?;
        let local_path = download_dir.join(&file.name);
        tokio::fs::write(&local_path, &bytes).await?;
        tracing::debug!(
            file = %file.name,
            bytes = bytes.len(),
            path = %local_path.display(),
            "Downloaded file"
        );
        Ok(local_path)
    }
}

#[async_trait]
impl FileSource for DriveClient {
    async fn list_files(&self, folder_id: &str) -> Result<Vec<FileDescriptor>, DriveError> {
        let token = self.credentials.access_token().await?;
        let query = Self::folder_query(folder_id);
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(self.endpoint("files"))
                .query(&[
                    ("q", query.as_str()),
                    ("spaces", "drive"),
                    ("fields", LIST_FIELDS),
                ])
                .bearer_auth(&token);
            if let Some(ref cursor) = page_token {
                request = request.query(&[("pageToken", cursor.as_str())]);
            }

            let response = request
                .send()
                .await
                .map_err(|error| DriveError::Request(error.to_string()))?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let message = response.text().await.unwrap_or_default();
                return Err(DriveError::Api { status, message });
            }

            let page: FileListResponse = response
                .json()
                .await
                .map_err(|error| DriveError::InvalidResponse(error.to_string()))?;

            for entry in page.files {
                // The query already filters by MIME type; anything else is dropped.
                let Some(extension) = extension_for_mime(&entry.mime_type) else {
                    tracing::debug!(file = %entry.name, mime = %entry.mime_type, "Skipping unsupported file");
                    continue;
                };
                files.push(FileDescriptor {
                    id: entry.id,
                    name: entry.name,
                    mime_type: entry.mime_type,
                    extension: extension.to_string(),
                    local_path: None,
                });
            }

            match page.next_page_token {
                Some(cursor) => page_token = Some(cursor),
                None => break,
            }
        }

        tracing::info!(folder = folder_id, total = files.len(), "Listed folder");
        Ok(files)
    }

    async fn fetch_all(
        &self,
        folder_id: &str,
        download_dir: &Path,
    ) -> Result<Vec<FileDescriptor>, DriveError> {
        let files = self.list_files(folder_id).await?;
        if files.is_empty() {
            tracing::warn!(folder = folder_id, "No supported files found in folder");
            return Ok(Vec::new());
        }

        let total = files.len();
        let mut staged = Vec::with_capacity(total);
        for mut file in files {
            match self.download_file(&file, download_dir).await {
                Ok(local_path) => {
                    file.local_path = Some(local_path);
                    staged.push(file);
                }
                Err(error) => {
                    tracing::warn!(file = %file.name, error = %error, "Skipping file after download failure");
                }
            }
        }

        tracing::info!(
            folder = folder_id,
            downloaded = staged.len(),
            total,
            "Staged folder contents"
        );
        Ok(staged)
    }

    async fn check_connection(&self) -> Result<(), DriveError> {
        let token = self.credentials.access_token().await?;
        let response = self
            .http
            .get(self.endpoint("about"))
            .query(&[("fields", "user")])
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|error| DriveError::Request(error.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(DriveError::Api { status, message });
        }
        Ok(())
    }
}
