use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use super::conversion_models::{ExportProgress, FilePage, NativeKind};

/// Errors raised while talking to the remote store or the local scratch dir.
#[derive(Debug, Error)]
pub enum DriveError {
    #[error("Credential error: {0}")]
    Credential(String),
    #[error("Drive API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Unexpected response: {0}")]
    Malformed(String),
    #[error("Local I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DriveError {
    /// Fatal errors abort the whole run instead of just the current file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DriveError::Credential(_) | DriveError::Io(_))
    }
}

/// The operations the pipeline needs from the remote store.
#[async_trait]
pub trait DriveApi: Send + Sync {
    /// Fetches one page of files whose type is one of `kinds`.
    async fn list_page(
        &self,
        kinds: &[NativeKind],
        page_token: Option<&str>,
    ) -> Result<FilePage, DriveError>;

    /// Returns the ids of files named exactly `name` inside any of `parents`.
    async fn find_named(&self, name: &str, parents: &[String]) -> Result<Vec<String>, DriveError>;

    /// Exports `file_id` rendered as `mime_type`, reporting progress per chunk.
    async fn export(
        &self,
        file_id: &str,
        mime_type: &str,
        on_progress: &mut (dyn FnMut(ExportProgress) + Send),
    ) -> Result<Vec<u8>, DriveError>;

    /// Uploads the local file at `path` and returns the new remote id.
    async fn upload(
        &self,
        path: &Path,
        name: &str,
        mime_type: &str,
        parents: &[String],
    ) -> Result<String, DriveError>;
}
