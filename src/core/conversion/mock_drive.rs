// In-memory stand-ins for the remote store and the console, shared by the
// conversion tests.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;

use super::conversion_models::{ExportProgress, FilePage, NativeKind, PipelineEvent, RemoteFile};
use super::conversion_pipeline::Reporter;
use super::drive_api::{DriveApi, DriveError};

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub name: String,
    pub parents: Vec<String>,
    pub bytes: Vec<u8>,
}

/// Mock drive: listing pages are fixed up front, uploads land in `stored`.
pub struct MockDrive {
    pages: Vec<FilePage>,
    pub stored: DashMap<String, StoredFile>,
    exports: DashMap<String, Vec<u8>>,
    export_errors: DashMap<String, fn() -> DriveError>,
    find_fails: AtomicBool,
    upload_fails: AtomicBool,
    list_fails: AtomicBool,
    next_id: AtomicUsize,
    pub export_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
}

impl MockDrive {
    pub fn new() -> Self {
        Self::with_pages(Vec::new())
    }

    pub fn with_pages(pages: Vec<FilePage>) -> Self {
        Self {
            pages,
            stored: DashMap::new(),
            exports: DashMap::new(),
            export_errors: DashMap::new(),
            find_fails: AtomicBool::new(false),
            upload_fails: AtomicBool::new(false),
            list_fails: AtomicBool::new(false),
            next_id: AtomicUsize::new(1),
            export_calls: AtomicUsize::new(0),
            upload_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn seed_stored(&self, name: &str, parents: &[&str]) {
        let id = format!("seed-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.stored.insert(
            id,
            StoredFile {
                name: name.to_string(),
                parents: parents.iter().map(|p| p.to_string()).collect(),
                bytes: Vec::new(),
            },
        );
    }

    pub fn set_export(&self, file_id: &str, bytes: &[u8]) {
        self.exports.insert(file_id.to_string(), bytes.to_vec());
    }

    pub fn fail_export(&self, file_id: &str, error: fn() -> DriveError) {
        self.export_errors.insert(file_id.to_string(), error);
    }

    pub fn fail_find(&self) {
        self.find_fails.store(true, Ordering::SeqCst);
    }

    pub fn fail_upload(&self) {
        self.upload_fails.store(true, Ordering::SeqCst);
    }

    pub fn fail_list(&self) {
        self.list_fails.store(true, Ordering::SeqCst);
    }

    pub fn count_named(&self, name: &str, parent: &str) -> usize {
        self.stored
            .iter()
            .filter(|f| f.name == name && f.parents.iter().any(|p| p == parent))
            .count()
    }
}

#[async_trait]
impl DriveApi for MockDrive {
    async fn list_page(
        &self,
        _kinds: &[NativeKind],
        page_token: Option<&str>,
    ) -> Result<FilePage, DriveError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.list_fails.load(Ordering::SeqCst) {
            return Err(DriveError::Api {
                status: 403,
                message: "insufficient permissions".into(),
            });
        }

        let index = page_token
            .map(|t| t.parse::<usize>().expect("mock page tokens are indexes"))
            .unwrap_or(0);
        let mut page = self.pages.get(index).cloned().unwrap_or_default();
        page.next_page_token = if index + 1 < self.pages.len() {
            Some((index + 1).to_string())
        } else {
            None
        };
        Ok(page)
    }

    async fn find_named(&self, name: &str, parents: &[String]) -> Result<Vec<String>, DriveError> {
        if self.find_fails.load(Ordering::SeqCst) {
            return Err(DriveError::Transport("connection reset".into()));
        }
        Ok(self
            .stored
            .iter()
            .filter(|f| f.name == name && f.parents.iter().any(|p| parents.contains(p)))
            .map(|f| f.key().clone())
            .collect())
    }

    async fn export(
        &self,
        file_id: &str,
        _mime_type: &str,
        on_progress: &mut (dyn FnMut(ExportProgress) + Send),
    ) -> Result<Vec<u8>, DriveError> {
        self.export_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(make_error) = self.export_errors.get(file_id) {
            return Err((*make_error)());
        }

        let bytes = self
            .exports
            .get(file_id)
            .map(|b| b.value().clone())
            .unwrap_or_else(|| format!("exported {}", file_id).into_bytes());
        let total = bytes.len() as u64;
        let half = total / 2;
        on_progress(ExportProgress {
            received: half,
            total: Some(total),
        });
        on_progress(ExportProgress {
            received: total,
            total: Some(total),
        });
        Ok(bytes)
    }

    async fn upload(
        &self,
        path: &Path,
        name: &str,
        _mime_type: &str,
        parents: &[String],
    ) -> Result<String, DriveError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if self.upload_fails.load(Ordering::SeqCst) {
            return Err(DriveError::Api {
                status: 500,
                message: "backend error".into(),
            });
        }

        let bytes = tokio::fs::read(path).await?;
        let id = format!("new-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.stored.insert(
            id.clone(),
            StoredFile {
                name: name.to_string(),
                parents: parents.to_vec(),
                bytes,
            },
        );
        Ok(id)
    }
}

/// Reporter that just remembers what it was told.
#[derive(Default)]
pub struct RecordingReporter {
    pub events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: PipelineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn remote_file(id: &str, name: &str, kind: NativeKind, parents: &[&str]) -> RemoteFile {
    RemoteFile {
        id: id.to_string(),
        name: name.to_string(),
        kind,
        parents: parents.iter().map(|p| p.to_string()).collect(),
    }
}
