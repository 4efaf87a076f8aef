// =============================================================================
// GOOGLE DRIVE v3 CLIENT
// =============================================================================
//
// Thin HTTP implementation of the core `DriveApi` trait:
// - files.list     GET  /drive/v3/files
// - files.export   GET  /drive/v3/files/{id}/export
// - files.create   POST /upload/drive/v3/files?uploadType=multipart
//
// Only the calls the pipeline needs are exposed.

use std::path::Path;

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::Deserialize;

use super::drive_query::{named_in_parents_filter, native_types_filter};
use super::service_account::{CredentialError, ServiceAccountAuth};
use crate::core::conversion::{
    DriveApi, DriveError, ExportProgress, FilePage, NativeKind, RemoteFile,
};

const API_ROOT: &str = "https://www.googleapis.com";
const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, parents)";
const DUPLICATE_FIELDS: &str = "files(id, parents)";
pub const DEFAULT_PAGE_SIZE: u32 = 100;
/// Upper bound on the buffer reserved from an export's Content-Length.
const MAX_EXPORT_PREALLOC: u64 = 16 << 20;

// =============================================================================
// API RESPONSE STRUCTURES
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiFile {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    parents: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiFileList {
    #[serde(default)]
    files: Vec<ApiFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiCreated {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// =============================================================================
// CREDENTIAL PROVIDER
// =============================================================================

/// Loads the service-account key and returns an authenticated handle for
/// `api_name`/`api_version` scoped to `scopes`.
pub async fn get_service(
    api_name: &str,
    api_version: &str,
    scopes: &[&str],
    key_file: &Path,
) -> Result<GoogleDriveClient, CredentialError> {
    let auth = ServiceAccountAuth::from_file(key_file, scopes).await?;
    tracing::info!(
        account = auth.client_email(),
        api = api_name,
        version = api_version,
        "Loaded service account"
    );
    Ok(GoogleDriveClient::new(auth, api_name, api_version))
}

/// Base URLs for regular calls and media uploads.
fn endpoint_bases(api_name: &str, api_version: &str) -> (String, String) {
    (
        format!("{}/{}/{}", API_ROOT, api_name, api_version),
        format!("{}/upload/{}/{}", API_ROOT, api_name, api_version),
    )
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct GoogleDriveClient {
    client: Client,
    auth: ServiceAccountAuth,
    api_base: String,
    upload_base: String,
    page_size: u32,
}

impl GoogleDriveClient {
    pub fn new(auth: ServiceAccountAuth, api_name: &str, api_version: &str) -> Self {
        let (api_base, upload_base) = endpoint_bases(api_name, api_version);
        Self {
            client: Client::new(),
            auth,
            api_base,
            upload_base,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    async fn token(&self) -> Result<String, DriveError> {
        Ok(self.auth.get_access_token().await?)
    }

    fn map_file(api: ApiFile) -> Option<RemoteFile> {
        match NativeKind::from_mime_type(&api.mime_type) {
            Some(kind) => Some(RemoteFile {
                id: api.id,
                name: api.name,
                kind,
                parents: api.parents,
            }),
            None => {
                tracing::warn!(
                    file_id = %api.id,
                    mime_type = %api.mime_type,
                    "Skipping file with no conversion target"
                );
                None
            }
        }
    }

    async fn check(response: Response) -> Result<Response, DriveError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        Err(api_error(status, &text))
    }
}

fn transport(e: reqwest::Error) -> DriveError {
    DriveError::Transport(e.to_string())
}

/// Turns an error response into `DriveError::Api`, preferring Google's
/// `{"error": {"message": ...}}` envelope over the raw body.
fn api_error(status: u16, body: &str) -> DriveError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    DriveError::Api { status, message }
}

/// Running byte count for one export body.
struct ExportTally {
    total: Option<u64>,
    received: u64,
}

impl ExportTally {
    fn new(total: Option<u64>) -> Self {
        Self { total, received: 0 }
    }

    /// Buffer size to reserve up front. A bogus Content-Length cannot force a
    /// huge allocation.
    fn initial_capacity(&self) -> usize {
        self.total.unwrap_or(0).min(MAX_EXPORT_PREALLOC) as usize
    }

    fn chunk(&mut self, len: usize) -> ExportProgress {
        self.received += len as u64;
        ExportProgress {
            received: self.received,
            total: self.total,
        }
    }

    /// The closing 100% report, unless the last chunk already was one.
    fn finish(&self) -> Option<ExportProgress> {
        if self.total == Some(self.received) && self.received > 0 {
            return None;
        }
        Some(ExportProgress {
            received: self.received,
            total: Some(self.received),
        })
    }
}

fn random_boundary() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect();
    format!("convertio_{}", suffix)
}

/// Builds a `multipart/related` body: JSON metadata, then the media.
fn multipart_related_body(
    boundary: &str,
    metadata: &serde_json::Value,
    media_type: &str,
    content: &[u8],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(content.len() + 512);

    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(b"\r\n");

    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", media_type).as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--", boundary).as_bytes());

    body
}

#[async_trait]
impl DriveApi for GoogleDriveClient {
    async fn list_page(
        &self,
        kinds: &[NativeKind],
        page_token: Option<&str>,
    ) -> Result<FilePage, DriveError> {
        let token = self.token().await?;

        let mut query = vec![
            ("q", native_types_filter(kinds)),
            ("spaces", "drive".to_string()),
            ("fields", LIST_FIELDS.to_string()),
            ("pageSize", self.page_size.to_string()),
        ];
        if let Some(page_token) = page_token {
            query.push(("pageToken", page_token.to_string()));
        }

        let response = self
            .client
            .get(format!("{}/files", self.api_base))
            .bearer_auth(token)
            .query(&query)
            .send()
            .await
            .map_err(transport)?;
        let list: ApiFileList = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| DriveError::Malformed(e.to_string()))?;

        Ok(FilePage {
            files: list.files.into_iter().filter_map(Self::map_file).collect(),
            next_page_token: list.next_page_token,
        })
    }

    async fn find_named(&self, name: &str, parents: &[String]) -> Result<Vec<String>, DriveError> {
        let token = self.token().await?;
        let filter = named_in_parents_filter(name, parents);
        tracing::debug!(filter = %filter, "Querying for duplicates");

        let response = self
            .client
            .get(format!("{}/files", self.api_base))
            .bearer_auth(token)
            .query(&[
                ("q", filter.as_str()),
                ("spaces", "drive"),
                ("fields", DUPLICATE_FIELDS),
            ])
            .send()
            .await
            .map_err(transport)?;
        let list: ApiFileList = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| DriveError::Malformed(e.to_string()))?;

        Ok(list.files.into_iter().map(|f| f.id).collect())
    }

    async fn export(
        &self,
        file_id: &str,
        mime_type: &str,
        on_progress: &mut (dyn FnMut(ExportProgress) + Send),
    ) -> Result<Vec<u8>, DriveError> {
        let token = self.token().await?;

        let response = self
            .client
            .get(format!("{}/files/{}/export", self.api_base, file_id))
            .bearer_auth(token)
            .query(&[("mimeType", mime_type)])
            .send()
            .await
            .map_err(transport)?;
        let mut response = Self::check(response).await?;

        let mut tally = ExportTally::new(response.content_length());
        let mut bytes = Vec::with_capacity(tally.initial_capacity());
        while let Some(chunk) = response.chunk().await.map_err(transport)? {
            bytes.extend_from_slice(&chunk);
            on_progress(tally.chunk(chunk.len()));
        }

        // Exports without a Content-Length still end with a 100% report.
        if let Some(last) = tally.finish() {
            on_progress(last);
        }

        Ok(bytes)
    }

    async fn upload(
        &self,
        path: &Path,
        name: &str,
        mime_type: &str,
        parents: &[String],
    ) -> Result<String, DriveError> {
        let content = tokio::fs::read(path).await?;
        let metadata = serde_json::json!({
            "name": name,
            "parents": parents,
        });
        let boundary = random_boundary();
        let body = multipart_related_body(&boundary, &metadata, mime_type, &content);

        let token = self.token().await?;
        let response = self
            .client
            .post(format!("{}/files", self.upload_base))
            .bearer_auth(token)
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await
            .map_err(transport)?;
        let created: ApiCreated = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| DriveError::Malformed(e.to_string()))?;

        Ok(created.id)
    }
}
