#![deny(missing_docs)]

//! Core library for the document summarizer service.

/// HTTP routing and REST handlers.
pub mod api;
/// Google OAuth2 credential provider.
pub mod auth;
/// Environment-driven configuration management.
pub mod config;
/// Google Drive file source.
pub mod drive;
/// Text extraction for the supported document formats.
pub mod extract;
/// Structured logging and tracing setup.
pub mod logging;
/// Batch pipeline orchestrating fetch, extract, and summarize.
pub mod pipeline;
/// OpenAI-backed summarization client.
pub mod summarizer;
