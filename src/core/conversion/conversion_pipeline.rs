// The per-file converter/transfer pipeline:
// export -> save -> duplicate check -> upload or skip -> clean up.
//
// Every step is a possible exit point. Remote faults end the current file
// only; credential and local I/O faults bubble up and end the run.

use std::path::PathBuf;

use super::conversion_models::{
    ConversionTarget, ExportProgress, FileOutcome, PipelineEvent, RemoteFile,
};
use super::drive_api::{DriveApi, DriveError};
use super::duplicate_checker::DuplicateChecker;
use super::local_artifact::LocalArtifact;

/// Receives pipeline events. The CLI layer prints them; tests record them.
pub trait Reporter: Send + Sync {
    fn report(&self, event: PipelineEvent);
}

pub struct ConversionPipeline<D: DriveApi, R: Reporter> {
    drive: D,
    reporter: R,
    work_dir: PathBuf,
    checker: DuplicateChecker,
}

impl<D: DriveApi, R: Reporter> ConversionPipeline<D, R> {
    pub fn new(drive: D, reporter: R, work_dir: impl Into<PathBuf>, checker: DuplicateChecker) -> Self {
        Self {
            drive,
            reporter,
            work_dir: work_dir.into(),
            checker,
        }
    }

    pub fn drive(&self) -> &D {
        &self.drive
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Converts one file and uploads the result next to the original.
    ///
    /// `index` is the 1-based position in the run, used only for display.
    pub async fn convert(
        &self,
        index: usize,
        file: &RemoteFile,
        target: ConversionTarget,
        target_name: &str,
    ) -> Result<FileOutcome, DriveError> {
        tracing::info!(
            file_id = %file.id,
            source = %file.name,
            file_name = target_name,
            "Converting file"
        );
        self.reporter.report(PipelineEvent::Downloading {
            index,
            file: file.clone(),
        });

        let reporter = &self.reporter;
        let mut on_progress = |progress: ExportProgress| {
            reporter.report(PipelineEvent::Progress(progress));
        };
        let bytes = match self
            .drive
            .export(&file.id, target.mime_type, &mut on_progress)
            .await
        {
            Ok(bytes) => bytes,
            Err(e) => return self.file_failed(target_name, e),
        };

        self.reporter.report(PipelineEvent::Saving {
            name: target_name.to_string(),
        });
        let artifact = match LocalArtifact::create(&self.work_dir, target_name, &bytes).await {
            Ok(artifact) => artifact,
            Err(e) => {
                let reason = format!("could not save {}: {}", target_name, e);
                tracing::error!(file_name = target_name, error = %e, "Failed to write local artifact");
                self.reporter.report(PipelineEvent::FileFailed {
                    name: target_name.to_string(),
                    reason: reason.clone(),
                });
                return Ok(FileOutcome::Failed { reason });
            }
        };
        drop(bytes);

        let parents = file.parent_folders();
        self.reporter.report(PipelineEvent::CheckingDuplicate {
            name: target_name.to_string(),
            parents: parents.clone(),
        });
        if self
            .checker
            .has_duplicate(&self.drive, target_name, &parents)
            .await
        {
            tracing::info!(file_name = target_name, "Duplicate found, skipping upload");
            self.reporter.report(PipelineEvent::DuplicateFound {
                name: target_name.to_string(),
            });
            self.discard(artifact, target_name).await?;
            return Ok(FileOutcome::SkippedDuplicate);
        }

        self.reporter.report(PipelineEvent::Uploading {
            name: target_name.to_string(),
        });
        let uploaded = self
            .drive
            .upload(artifact.path(), target_name, target.mime_type, &parents)
            .await;
        self.discard(artifact, target_name).await?;

        match uploaded {
            Ok(id) => {
                tracing::info!(file_name = target_name, new_id = %id, "Uploaded converted file");
                self.reporter.report(PipelineEvent::Uploaded {
                    name: target_name.to_string(),
                    id: id.clone(),
                });
                Ok(FileOutcome::Uploaded { id })
            }
            Err(e) => self.file_failed(target_name, e),
        }
    }

    async fn discard(&self, artifact: LocalArtifact, name: &str) -> Result<(), DriveError> {
        artifact.remove().await?;
        self.reporter.report(PipelineEvent::Deleted {
            name: name.to_string(),
        });
        Ok(())
    }

    fn file_failed(&self, name: &str, error: DriveError) -> Result<FileOutcome, DriveError> {
        if error.is_fatal() {
            return Err(error);
        }

        tracing::error!(file_name = name, error = %error, "Conversion failed for file");
        let reason = error.to_string();
        self.reporter.report(PipelineEvent::FileFailed {
            name: name.to_string(),
            reason: reason.clone(),
        });
        Ok(FileOutcome::Failed { reason })
    }
}
