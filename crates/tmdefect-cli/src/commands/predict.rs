use crate::cli::PredictArgs;
use crate::config::FileConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use tmdefect::engine::progress::ProgressReporter;
use tmdefect::workflows;
use tracing::{info, warn};

pub fn run(args: PredictArgs, file_config: &FileConfig) -> Result<()> {
    let config = file_config.predict_config(&args)?;
    info!(
        "Predicting with {:?} model from {:?}",
        config.model_kind, &config.weights_path
    );

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting prediction...");
    let report = workflows::predict::run(&config, &reporter)?;

    println!(
        "✓ {} prediction(s) written to: {}",
        report.predictions.len(),
        config.output_path.display()
    );
    match (report.score, &config.targets_path) {
        (Some(score), _) => println!(
            "  Energy within threshold: {:.4} ({} scored)",
            score, report.scored
        ),
        (None, Some(path)) => {
            warn!("No prediction matched an id in {:?}", path);
            println!("  No prediction matched a target; score unavailable.");
        }
        (None, None) => {}
    }
    Ok(())
}
