pub mod conversion_driver;
pub mod conversion_models;
pub mod conversion_pipeline;
pub mod drive_api;
pub mod duplicate_checker;
pub mod local_artifact;

#[cfg(test)]
pub mod mock_drive;

#[allow(unused_imports)]
pub use conversion_driver::{Confirmation, ConversionDriver, RunError};
#[allow(unused_imports)]
pub use conversion_models::{
    ConversionTarget, DuplicatePolicy, ExportProgress, FileOutcome, FilePage, NativeKind,
    PipelineEvent, RemoteFile, RunReport, RunSummary,
};
pub use conversion_pipeline::{ConversionPipeline, Reporter};
pub use drive_api::{DriveApi, DriveError};
pub use duplicate_checker::DuplicateChecker;
