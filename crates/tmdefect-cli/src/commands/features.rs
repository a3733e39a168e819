use crate::cli::FeaturesArgs;
use crate::config::FileConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use tmdefect::engine::progress::ProgressReporter;
use tmdefect::workflows;
use tracing::info;

pub fn run(args: FeaturesArgs, file_config: &FileConfig) -> Result<()> {
    let config = file_config.feature_config(&args)?;
    info!("Featurizing structures in {:?}", &config.structures_dir);
    if config.training.is_none() {
        info!("No training targets given; formula band-gap features will be zero.");
    }

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting feature extraction...");
    let table = workflows::featurize::run(&config, &reporter)?;

    println!(
        "✓ Feature table ({} rows, {} columns) written to: {}",
        table.len(),
        table.columns.len() + 2,
        config.output_path.display()
    );
    Ok(())
}
