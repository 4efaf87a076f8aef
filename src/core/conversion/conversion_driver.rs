// The driver walks through Listing -> Confirming -> Processing -> Done.
//
// The whole listing is gathered before the user is asked anything, so there
// is exactly one confirmation per run and the count shown is the real total.

use thiserror::Error;

use super::conversion_models::{NativeKind, PipelineEvent, RemoteFile, RunReport};
use super::conversion_pipeline::{ConversionPipeline, Reporter};
use super::drive_api::{DriveApi, DriveError};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Listing failed: {0}")]
    Listing(DriveError),
    #[error("Conversion aborted: {0}")]
    Fatal(DriveError),
    #[error("Could not read confirmation: {0}")]
    Prompt(#[from] std::io::Error),
}

/// Asks the user whether to go ahead with `file_count` conversions.
pub trait Confirmation {
    fn confirm(&mut self, file_count: usize) -> std::io::Result<bool>;
}

pub struct ConversionDriver<D: DriveApi, R: Reporter> {
    pipeline: ConversionPipeline<D, R>,
}

impl<D: DriveApi, R: Reporter> ConversionDriver<D, R> {
    pub fn new(pipeline: ConversionPipeline<D, R>) -> Self {
        Self { pipeline }
    }

    #[allow(dead_code)]
    pub fn pipeline(&self) -> &ConversionPipeline<D, R> {
        &self.pipeline
    }

    /// Lists every native file, asks once, then converts them one at a time.
    pub async fn run<C: Confirmation>(&self, confirmation: &mut C) -> Result<RunReport, RunError> {
        let mut report = RunReport {
            files: self.list_all().await?,
            ..Default::default()
        };

        if report.files.is_empty() {
            tracing::info!("No native documents found, nothing to convert");
            self.finish(&report);
            return Ok(report);
        }

        if !confirmation.confirm(report.files.len())? {
            tracing::info!("Conversion declined by user");
            report.cancelled = true;
            return Ok(report);
        }

        for (position, file) in report.files.iter().enumerate() {
            let target = file.kind.target();
            let target_name = target.file_name(&file.name);
            let outcome = self
                .pipeline
                .convert(position + 1, file, target, &target_name)
                .await
                .map_err(RunError::Fatal)?;
            report.outcomes.push((file.clone(), outcome));
        }

        self.finish(&report);
        Ok(report)
    }

    /// Follows continuation tokens until the remote store runs out of pages.
    async fn list_all(&self) -> Result<Vec<RemoteFile>, RunError> {
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .pipeline
                .drive()
                .list_page(&NativeKind::ALL, page_token.as_deref())
                .await
                .map_err(RunError::Listing)?;

            tracing::debug!(count = page.files.len(), "Fetched listing page");
            for file in page.files {
                self.pipeline
                    .reporter()
                    .report(PipelineEvent::Listed { file: file.clone() });
                files.push(file);
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(files)
    }

    fn finish(&self, report: &RunReport) {
        let summary = report.summary();
        tracing::info!(
            listed = summary.listed,
            uploaded = summary.uploaded,
            skipped = summary.skipped,
            failed = summary.failed,
            "Run finished"
        );
        self.pipeline
            .reporter()
            .report(PipelineEvent::Finished(summary));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conversion::conversion_models::{DuplicatePolicy, FilePage, FileOutcome};
    use crate::core::conversion::duplicate_checker::DuplicateChecker;
    use crate::core::conversion::mock_drive::{remote_file, MockDrive, RecordingReporter};
    use std::sync::atomic::Ordering;
    use tempfile::tempdir;

    /// Answers with a fixed reply and remembers the counts it was shown.
    struct ScriptedConfirmation {
        answer: bool,
        asked: Vec<usize>,
    }

    impl ScriptedConfirmation {
        fn new(answer: bool) -> Self {
            Self {
                answer,
                asked: Vec::new(),
            }
        }
    }

    impl Confirmation for ScriptedConfirmation {
        fn confirm(&mut self, file_count: usize) -> std::io::Result<bool> {
            self.asked.push(file_count);
            Ok(self.answer)
        }
    }

    fn two_pages() -> Vec<FilePage> {
        vec![
            FilePage {
                files: vec![
                    remote_file("d1", "Q1 Plan", NativeKind::Document, &["F1"]),
                    remote_file("s1", "Budget/2024", NativeKind::Spreadsheet, &["F1"]),
                ],
                next_page_token: None,
            },
            FilePage {
                files: vec![remote_file("p1", "Kickoff", NativeKind::Presentation, &["F2"])],
                next_page_token: None,
            },
        ]
    }

    fn driver(drive: MockDrive, dir: &std::path::Path) -> ConversionDriver<MockDrive, RecordingReporter> {
        ConversionDriver::new(ConversionPipeline::new(
            drive,
            RecordingReporter::default(),
            dir,
            DuplicateChecker::new(DuplicatePolicy::FailOpen),
        ))
    }

    #[tokio::test]
    async fn test_lists_all_pages_and_confirms_once() {
        let dir = tempdir().unwrap();
        let driver = driver(MockDrive::with_pages(two_pages()), dir.path());
        let mut confirmation = ScriptedConfirmation::new(true);

        let report = driver.run(&mut confirmation).await.unwrap();

        assert_eq!(confirmation.asked, vec![3]);
        assert_eq!(report.files.len(), 3);
        assert_eq!(driver.pipeline().drive().list_calls.load(Ordering::SeqCst), 2);
        assert_eq!(report.summary().uploaded, 3);

        let drive = driver.pipeline().drive();
        assert_eq!(drive.count_named("Q1 Plan.docx", "F1"), 1);
        assert_eq!(drive.count_named("Budget-2024.xlsx", "F1"), 1);
        assert_eq!(drive.count_named("Kickoff.pptx", "F2"), 1);
    }

    #[tokio::test]
    async fn test_declining_makes_no_remote_changes() {
        let dir = tempdir().unwrap();
        let driver = driver(MockDrive::with_pages(two_pages()), dir.path());
        let mut confirmation = ScriptedConfirmation::new(false);

        let report = driver.run(&mut confirmation).await.unwrap();

        assert!(report.cancelled);
        assert!(report.outcomes.is_empty());
        let drive = driver.pipeline().drive();
        assert_eq!(drive.export_calls.load(Ordering::SeqCst), 0);
        assert_eq!(drive.upload_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rerun_uploads_nothing_new() {
        let dir = tempdir().unwrap();
        let driver = driver(MockDrive::with_pages(two_pages()), dir.path());

        driver.run(&mut ScriptedConfirmation::new(true)).await.unwrap();
        let second = driver.run(&mut ScriptedConfirmation::new(true)).await.unwrap();

        assert_eq!(second.summary().skipped, 3);
        assert_eq!(second.summary().uploaded, 0);
        assert_eq!(driver.pipeline().drive().upload_calls.load(Ordering::SeqCst), 3);
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_one_failure_does_not_stop_the_rest() {
        let dir = tempdir().unwrap();
        let drive = MockDrive::with_pages(two_pages());
        drive.fail_export("s1", || DriveError::Transport("timed out".into()));
        let driver = driver(drive, dir.path());

        let report = driver.run(&mut ScriptedConfirmation::new(true)).await.unwrap();

        let summary = report.summary();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.uploaded, 2);
        assert!(matches!(report.outcomes[1].1, FileOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_listing_fault_aborts_run() {
        let dir = tempdir().unwrap();
        let drive = MockDrive::with_pages(two_pages());
        drive.fail_list();
        let driver = driver(drive, dir.path());
        let mut confirmation = ScriptedConfirmation::new(true);

        let result = driver.run(&mut confirmation).await;

        assert!(matches!(result, Err(RunError::Listing(_))));
        assert!(confirmation.asked.is_empty());
    }

    #[tokio::test]
    async fn test_empty_listing_skips_prompt() {
        let dir = tempdir().unwrap();
        let driver = driver(MockDrive::new(), dir.path());
        let mut confirmation = ScriptedConfirmation::new(true);

        let report = driver.run(&mut confirmation).await.unwrap();

        assert!(confirmation.asked.is_empty());
        assert!(report.files.is_empty());
        assert!(matches!(
            driver.pipeline().reporter().events().last(),
            Some(PipelineEvent::Finished(_))
        ));
    }

    #[tokio::test]
    async fn test_fatal_fault_stops_run() {
        let dir = tempdir().unwrap();
        let drive = MockDrive::with_pages(two_pages());
        drive.fail_export("d1", || DriveError::Credential("revoked".into()));
        let driver = driver(drive, dir.path());

        let result = driver.run(&mut ScriptedConfirmation::new(true)).await;

        assert!(matches!(result, Err(RunError::Fatal(DriveError::Credential(_)))));
        assert_eq!(driver.pipeline().drive().export_calls.load(Ordering::SeqCst), 1);
    }
}
