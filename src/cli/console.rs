// Renders pipeline events as plain console lines.

use crate::core::conversion::{PipelineEvent, Reporter};

pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&self, event: PipelineEvent) {
        println!("{}", render(&event));
    }
}

pub fn render(event: &PipelineEvent) -> String {
    match event {
        PipelineEvent::Listed { file } => format!(
            "{}, {}, {}, [{}]",
            file.name,
            file.id,
            file.kind,
            file.parents.join(", ")
        ),
        PipelineEvent::Downloading { index, file } => format!(
            "downloading item: {} id: {} name: {}",
            index, file.id, file.name
        ),
        PipelineEvent::Progress(progress) => match progress.percent() {
            Some(percent) => format!("downloaded: {}%", percent),
            None => format!("downloaded: {} bytes", progress.received),
        },
        PipelineEvent::Saving { name } => format!("creating: {}", name),
        PipelineEvent::CheckingDuplicate { name, parents } => format!(
            "checking for duplicates of {} in {}",
            name,
            parents.join(", ")
        ),
        PipelineEvent::DuplicateFound { name } => {
            format!("duplicate of {} found, skipping", name)
        }
        PipelineEvent::Uploading { name } => format!("uploading: {} to google drive", name),
        PipelineEvent::Uploaded { name, id } => format!("id: {} created ({})", id, name),
        PipelineEvent::Deleted { name } => format!("deleted local copy of {}", name),
        PipelineEvent::FileFailed { name, reason } => {
            format!("An error occurred converting {}: {}", name, reason)
        }
        PipelineEvent::Finished(summary) => format!(
            "done: {} listed, {} uploaded, {} skipped as duplicates, {} failed",
            summary.listed, summary.uploaded, summary.skipped, summary.failed
        ),
    }
}
