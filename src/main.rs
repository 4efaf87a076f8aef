// Entry point of the Drive -> Office converter.
//
// **Architecture Overview:**
// - `core/` = Listing, duplicate checks and the conversion pipeline (no I/O details)
// - `infra/` = Google Drive v3 over HTTP, service account authentication
// - `cli/` = The confirmation prompt and console output
//
// This file's job is to:
// 1. Load configuration
// 2. Authenticate and build the services (dependency injection)
// 3. Run the driver once and report how it went

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with several mod.rs files that all look the same.
#[path = "cli/cli_layer.rs"]
mod cli;
mod config;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use anyhow::Context;

use crate::cli::{ConsoleReporter, YesNoPrompt};
use crate::config::AppConfig;
use crate::core::conversion::{ConversionDriver, ConversionPipeline, DuplicateChecker};
use crate::infra::google_drive::{get_service, DRIVE_SCOPE};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout belongs to the prompt and progress lines.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()?;
    tracing::debug!(?config, "Loaded configuration");

    // Converted files are staged here one at a time before upload.
    std::fs::create_dir_all(&config.work_dir).with_context(|| {
        format!(
            "Failed to create work directory {}",
            config.work_dir.display()
        )
    })?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================

    let drive = get_service("drive", "v3", &[DRIVE_SCOPE], &config.key_file)
        .await
        .context("Failed to load service account credentials")?
        .with_page_size(config.page_size);

    let pipeline = ConversionPipeline::new(
        drive,
        ConsoleReporter,
        config.work_dir.clone(),
        DuplicateChecker::new(config.duplicate_policy),
    );
    let driver = ConversionDriver::new(pipeline);

    let stdin = std::io::stdin();
    let mut prompt = YesNoPrompt::new(stdin.lock(), std::io::stdout());

    let report = driver.run(&mut prompt).await?;
    if report.cancelled {
        return Ok(());
    }

    let summary = report.summary();
    if summary.failed > 0 {
        tracing::warn!(failed = summary.failed, "Some files could not be converted");
    }

    Ok(())
}
