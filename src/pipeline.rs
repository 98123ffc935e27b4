//! Batch pipeline driving fetch → extract → summarize over a Drive folder.
//!
//! The pipeline calls the file source once to stage all candidate documents, then processes
//! them strictly in fetch order, one at a time. A failure while enumerating or downloading
//! the folder aborts the run; a failure while extracting or summarizing one file is recorded
//! as that file's result and the remaining files are still processed. This turns an
//! all-or-nothing batch job into a partial-success one, which is the right semantics for a
//! best-effort summarizer over heterogeneous documents.

use crate::auth::OAuthCredentialProvider;
use crate::drive::{DriveClient, DriveError, FileDescriptor, FileSource};
use crate::extract::{DocumentExtractor, TextExtractor};
use crate::summarizer::{OpenAiSummarizer, Summarizer};
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Diagnostic recorded when a document yields no usable text.
pub const NO_TEXT_DIAGNOSTIC: &str = "no extractable text";

const NO_TEXT_PLACEHOLDER: &str = "Could not extract any text from this document.";

/// Outcome classification for one processed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    /// Extraction and summarization both succeeded.
    Success,
    /// Extraction or summarization failed for this file.
    Error,
}

impl ResultStatus {
    /// Wire representation of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Per-file outcome record.
///
/// Exactly one field is "active" per the status: on success `summary` carries the real
/// AI summary and `error` is `None`; on error `error` carries the diagnostic and `summary`
/// holds a human-readable placeholder.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResult {
    /// Display name of the processed file.
    pub file_name: String,
    /// Outcome status.
    pub status: ResultStatus,
    /// AI summary on success, placeholder text on error.
    pub summary: String,
    /// Failure diagnostic, present iff the status is `error`.
    pub error: Option<String>,
}

impl ProcessingResult {
    fn success(file_name: &str, summary: String) -> Self {
        Self {
            file_name: file_name.to_string(),
            status: ResultStatus::Success,
            summary,
            error: None,
        }
    }

    fn failure(file_name: &str, summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            file_name: file_name.to_string(),
            status: ResultStatus::Error,
            summary: summary.into(),
            error: Some(detail.into()),
        }
    }

    /// Whether this file was summarized successfully.
    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }
}

/// Run-level pipeline failures. Per-file failures never surface here.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The file source could not enumerate or stage the folder at all.
    #[error("Drive fetch error: {0}")]
    Fetch(#[from] DriveError),
}

/// Abstraction over a full pipeline run, consumed by the HTTP surface.
#[async_trait]
pub trait SummarizeApi: Send + Sync {
    /// Fetch, extract, and summarize every supported file in the folder.
    async fn run_pipeline(
        &self,
        folder_id: &str,
        download_dir: &Path,
    ) -> Result<Vec<ProcessingResult>, PipelineError>;

    /// List candidate files without downloading or summarizing.
    async fn list_files(&self, folder_id: &str) -> Result<Vec<FileDescriptor>, DriveError>;

    /// Verify the file source's credential setup.
    async fn check_drive(&self) -> Result<(), DriveError>;
}

/// Orchestrates the injected file source, extractor, and summarizer capabilities.
pub struct Pipeline {
    source: Arc<dyn FileSource>,
    extractor: Box<dyn TextExtractor>,
    summarizer: Box<dyn Summarizer>,
}

impl Pipeline {
    /// Build a pipeline from explicit capabilities.
    pub fn new(
        source: Arc<dyn FileSource>,
        extractor: Box<dyn TextExtractor>,
        summarizer: Box<dyn Summarizer>,
    ) -> Self {
        Self {
            source,
            extractor,
            summarizer,
        }
    }

    /// Build the production pipeline: Drive file source, format extractors, OpenAI summarizer.
    pub fn from_config() -> Self {
        let credentials = Arc::new(OAuthCredentialProvider::from_config());
        Self::new(
            Arc::new(DriveClient::new(credentials)),
            Box::new(DocumentExtractor::new()),
            Box::new(OpenAiSummarizer::from_config()),
        )
    }

    /// Execute one full run over `folder_id`, staging downloads in `download_dir`.
    ///
    /// Returns an empty list when the folder holds zero supported files; that is success,
    /// distinct from a fetch failure which returns an error.
    pub async fn run(
        &self,
        folder_id: &str,
        download_dir: &Path,
    ) -> Result<Vec<ProcessingResult>, PipelineError> {
        tracing::info!(folder = folder_id, staging = %download_dir.display(), "Pipeline started");

        let files = self.source.fetch_all(folder_id, download_dir).await?;
        if files.is_empty() {
            tracing::warn!(folder = folder_id, "No files to process; pipeline stopped");
            return Ok(Vec::new());
        }

        let mut results = Vec::with_capacity(files.len());
        for file in &files {
            results.push(self.process_file(file).await);
        }

        let success = results.iter().filter(|r| r.is_success()).count();
        tracing::info!(
            folder = folder_id,
            success,
            failed = results.len() - success,
            "Pipeline complete"
        );
        Ok(results)
    }

    /// Process a single staged file, converting every failure into a result record.
    async fn process_file(&self, file: &FileDescriptor) -> ProcessingResult {
        let Some(local_path) = file.local_path.as_deref() else {
            // fetch_all only hands out staged descriptors; an unstaged one cannot be parsed.
            tracing::warn!(file = %file.name, "Descriptor has no local path");
            return ProcessingResult::failure(&file.name, NO_TEXT_PLACEHOLDER, NO_TEXT_DIAGNOSTIC);
        };

        let text = match self.extractor.extract(local_path) {
            Ok(text) => text,
            Err(error) => {
                tracing::warn!(file = %file.name, error = %error, "Extraction failed");
                return ProcessingResult::failure(
                    &file.name,
                    NO_TEXT_PLACEHOLDER,
                    NO_TEXT_DIAGNOSTIC,
                );
            }
        };
        if text.trim().is_empty() {
            tracing::warn!(file = %file.name, "No text extracted");
            return ProcessingResult::failure(&file.name, NO_TEXT_PLACEHOLDER, NO_TEXT_DIAGNOSTIC);
        }

        tracing::debug!(file = %file.name, chars = text.chars().count(), "Extracted text");
        match self.summarizer.summarize(&text, &file.name).await {
            Ok(summary) => ProcessingResult::success(&file.name, summary),
            Err(error) => {
                tracing::warn!(file = %file.name, error = %error, "Summarization failed");
                ProcessingResult::failure(
                    &file.name,
                    format!("Processing failed: {error}"),
                    error.to_string(),
                )
            }
        }
    }
}

#[async_trait]
impl SummarizeApi for Pipeline {
    async fn run_pipeline(
        &self,
        folder_id: &str,
        download_dir: &Path,
    ) -> Result<Vec<ProcessingResult>, PipelineError> {
        self.run(folder_id, download_dir).await
    }

    async fn list_files(&self, folder_id: &str) -> Result<Vec<FileDescriptor>, DriveError> {
        self.source.list_files(folder_id).await
    }

    async fn check_drive(&self) -> Result<(), DriveError> {
        self.source.check_connection().await
    }
}
