//! Google Drive integration.
//!
//! The pipeline only depends on the [`FileSource`] trait; [`DriveClient`] is the concrete
//! implementation speaking to the Drive v3 REST API. Listing is filtered server-side to the
//! three supported document types (PDF, DOCX, plain text); everything else in the folder is
//! silently excluded.

mod client;
mod types;

pub use client::DriveClient;
pub use types::{DriveError, FileDescriptor, FileSource, extension_for_mime, supported_mime_types};
