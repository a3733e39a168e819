use crate::cli::IdealArgs;
use crate::config::FileConfig;
use crate::error::Result;
use tmdefect::workflows;
use tracing::info;

pub fn run(args: IdealArgs, file_config: &FileConfig) -> Result<()> {
    let template = file_config.template_for_ideal(&args);
    match &template {
        Some(path) => info!("Building ideal lattice from template {:?}", path),
        None => info!("Building the built-in MoS₂ ideal lattice."),
    }

    let structure = workflows::ideal::run(template.as_deref(), &args.output)?;
    println!(
        "✓ Ideal lattice ({}, {} sites) written to: {}",
        structure.formula(),
        structure.num_sites(),
        args.output.display()
    );
    Ok(())
}
