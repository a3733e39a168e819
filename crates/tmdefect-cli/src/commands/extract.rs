use crate::cli::ExtractArgs;
use crate::config::FileConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use tmdefect::engine::progress::ProgressReporter;
use tmdefect::workflows;
use tracing::info;

pub fn run(args: ExtractArgs, file_config: &FileConfig) -> Result<()> {
    let config = file_config.extraction_config(&args)?;
    info!(
        "Extracting defects from {:?} into {:?} with {} worker(s).",
        &config.input_dir, &config.output_dir, config.workers
    );

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting defect extraction...");
    let report = workflows::extract::run(&config, &reporter)?;

    println!(
        "✓ Wrote {} defect structure(s) to {}",
        report.succeeded.len(),
        config.output_dir.display()
    );

    if !report.is_complete() {
        println!("  {} structure(s) skipped", progress_handler.skipped());
        return Err(CliError::PartialBatch {
            failed: report.failed.len(),
            total: report.failed.len() + report.succeeded.len(),
        });
    }
    Ok(())
}
