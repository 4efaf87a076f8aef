// ============================================================================
// DOMAIN MODELS
// ============================================================================
// These types describe what we convert and what happened to each file.
// Nothing here knows about HTTP or the terminal.

use std::fmt;

/// The three Google-native document types we know how to convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeKind {
    Document,
    Spreadsheet,
    Presentation,
}

impl NativeKind {
    pub const ALL: [NativeKind; 3] = [
        NativeKind::Document,
        NativeKind::Spreadsheet,
        NativeKind::Presentation,
    ];

    /// The mime type the remote store reports for this kind.
    pub fn mime_type(self) -> &'static str {
        match self {
            NativeKind::Document => "application/vnd.google-apps.document",
            NativeKind::Spreadsheet => "application/vnd.google-apps.spreadsheet",
            NativeKind::Presentation => "application/vnd.google-apps.presentation",
        }
    }

    pub fn from_mime_type(mime: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.mime_type() == mime)
    }

    /// Static lookup from native kind to its Office-XML export format.
    pub fn target(self) -> ConversionTarget {
        match self {
            NativeKind::Document => ConversionTarget {
                mime_type:
                    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                extension: ".docx",
            },
            NativeKind::Spreadsheet => ConversionTarget {
                mime_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                extension: ".xlsx",
            },
            NativeKind::Presentation => ConversionTarget {
                mime_type:
                    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
                extension: ".pptx",
            },
        }
    }
}

impl fmt::Display for NativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionTarget {
    pub mime_type: &'static str,
    pub extension: &'static str,
}

impl ConversionTarget {
    /// Builds the local/remote filename for a converted copy of `source_name`.
    ///
    /// Path separators are replaced so the name is always a single path
    /// component, and the extension is appended exactly once.
    pub fn file_name(&self, source_name: &str) -> String {
        format!("{}{}", sanitize_name(source_name), self.extension)
    }
}

/// Replaces path-separator characters with `-`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .collect()
}

/// A native file as reported by the remote listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    pub kind: NativeKind,
    /// Folder ids, in the order the remote store returned them.
    pub parents: Vec<String>,
}

impl RemoteFile {
    /// Folders the converted copy belongs in. Files without a parent
    /// (e.g. the owner's top level) go to `root`.
    pub fn parent_folders(&self) -> Vec<String> {
        if self.parents.is_empty() {
            vec!["root".to_string()]
        } else {
            self.parents.clone()
        }
    }
}

/// One page of listing results plus the continuation token, if any.
#[derive(Debug, Clone, Default)]
pub struct FilePage {
    pub files: Vec<RemoteFile>,
    pub next_page_token: Option<String>,
}

/// Download progress for a single export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportProgress {
    pub received: u64,
    /// Total size when the server announced one.
    pub total: Option<u64>,
}

impl ExportProgress {
    pub fn percent(&self) -> Option<u8> {
        match self.total {
            Some(0) => Some(100),
            Some(total) => Some((self.received.min(total) * 100 / total) as u8),
            None => None,
        }
    }
}

/// What to do when the duplicate query itself fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Treat a failed query as "no duplicate" and upload anyway.
    #[default]
    FailOpen,
    /// Treat a failed query as "duplicate" and skip the upload.
    FailClosed,
}

impl std::str::FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-open" | "open" => Ok(DuplicatePolicy::FailOpen),
            "fail-closed" | "closed" => Ok(DuplicatePolicy::FailClosed),
            other => Err(format!(
                "unknown duplicate policy '{}' (expected fail-open or fail-closed)",
                other
            )),
        }
    }
}

/// Result of running the pipeline on one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Uploaded { id: String },
    SkippedDuplicate,
    Failed { reason: String },
}

/// Events emitted while listing and converting. The CLI layer renders these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    Listed { file: RemoteFile },
    Downloading { index: usize, file: RemoteFile },
    Progress(ExportProgress),
    Saving { name: String },
    CheckingDuplicate { name: String, parents: Vec<String> },
    DuplicateFound { name: String },
    Uploading { name: String },
    Uploaded { name: String, id: String },
    Deleted { name: String },
    FileFailed { name: String, reason: String },
    Finished(RunSummary),
}

/// Counts for the end-of-run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub listed: usize,
    pub uploaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Everything the driver learned during one run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub files: Vec<RemoteFile>,
    pub outcomes: Vec<(RemoteFile, FileOutcome)>,
    pub cancelled: bool,
}

impl RunReport {
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            listed: self.files.len(),
            ..Default::default()
        };
        for (_, outcome) in &self.outcomes {
            match outcome {
                FileOutcome::Uploaded { .. } => summary.uploaded += 1,
                FileOutcome::SkippedDuplicate => summary.skipped += 1,
                FileOutcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }
}
