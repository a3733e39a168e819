use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "tmdefect - Schottky-defect extraction, featurization and band-gap prediction for TMD monolayers.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Path to a configuration file in TOML format.
    /// Defaults to `config.toml` in the platform configuration directory, if present.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S extraction.workers=8
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", global = true)]
    pub set_values: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract Schottky defects from every structure in a directory.
    Extract(ExtractArgs),
    /// Write the defect-free reference supercell.
    Ideal(IdealArgs),
    /// Compute the feature table of a structure directory.
    Features(FeaturesArgs),
    /// Predict band gaps with a pretrained model and write a submission table.
    Predict(PredictArgs),
}

/// Arguments for the `extract` subcommand.
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Directory of input structure files (`*.json`).
    #[arg(short, long, value_name = "DIR")]
    pub input: Option<PathBuf>,

    /// Directory receiving one defect structure per input.
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Number of extraction workers.
    #[arg(short, long, value_name = "NUM")]
    pub workers: Option<usize>,

    /// Skip structures that fail and report them instead of aborting the batch.
    #[arg(long)]
    pub skip_failures: bool,

    /// Create the output directory if it does not exist.
    #[arg(long)]
    pub create_output: bool,

    /// Ideal-lattice template (TOML) replacing the built-in MoS₂ supercell.
    #[arg(long, value_name = "PATH")]
    pub template: Option<PathBuf>,
}

/// Arguments for the `ideal` subcommand.
#[derive(Args, Debug)]
pub struct IdealArgs {
    /// Output structure file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Ideal-lattice template (TOML) replacing the built-in MoS₂ supercell.
    #[arg(long, value_name = "PATH")]
    pub template: Option<PathBuf>,
}

/// Options shared by every command that computes formula statistics.
#[derive(Args, Debug, Clone, Default)]
pub struct StatsArgs {
    /// Targets table (`_id,band_gap`) of the training set used for formula statistics.
    #[arg(long, value_name = "PATH")]
    pub stats_from: Option<PathBuf>,

    /// Structure directory of the training set. Defaults to the input directory.
    #[arg(long, value_name = "DIR")]
    pub stats_structures: Option<PathBuf>,
}

/// Arguments for the `features` subcommand.
#[derive(Args, Debug)]
pub struct FeaturesArgs {
    /// Directory of input structure files (`*.json`).
    #[arg(short, long, value_name = "DIR")]
    pub input: Option<PathBuf>,

    /// Output feature table (CSV).
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Targets table joined by id; adds a `band_gap` column.
    #[arg(long, value_name = "PATH")]
    pub targets: Option<PathBuf>,

    /// Bond cutoff of the coordination graph, in Å.
    #[arg(long, value_name = "FLOAT")]
    pub bond_cutoff: Option<f64>,

    #[command(flatten)]
    pub stats: StatsArgs,
}

/// Mutually exclusive sources of prediction rows.
#[derive(Args, Debug, Clone, Default)]
#[group(required = false, multiple = false)]
pub struct PredictionSource {
    /// Precomputed feature table (CSV).
    #[arg(long, value_name = "PATH")]
    pub features: Option<PathBuf>,

    /// Directory of structure files, featurized on the fly.
    #[arg(long, value_name = "DIR")]
    pub structures: Option<PathBuf>,
}

/// Arguments for the `predict` subcommand.
#[derive(Args, Debug)]
pub struct PredictArgs {
    #[command(flatten)]
    pub source: PredictionSource,

    /// Model weights file (JSON).
    #[arg(long, value_name = "PATH")]
    pub weights: Option<PathBuf>,

    /// Model family of the weights file.
    #[arg(long, value_name = "KIND", value_parser = ["tree", "linear"])]
    pub kind: Option<String>,

    /// Output submission table (CSV).
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Known band gaps; when given, the energy-within-threshold score is printed.
    #[arg(long, value_name = "PATH")]
    pub targets: Option<PathBuf>,

    /// Bond cutoff of the coordination graph, in Å.
    #[arg(long, value_name = "FLOAT")]
    pub bond_cutoff: Option<f64>,

    #[command(flatten)]
    pub stats: StatsArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_are_accepted_after_subcommand() {
        let cli = Cli::parse_from([
            "tmdefect", "extract", "-i", "in", "-o", "out", "-vv", "-S", "extraction.workers=3",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.set_values, vec!["extraction.workers=3"]);
        match cli.command {
            Commands::Extract(args) => {
                assert_eq!(args.input, Some(PathBuf::from("in")));
                assert!(!args.skip_failures);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn predict_sources_are_mutually_exclusive() {
        let result = Cli::try_parse_from([
            "tmdefect", "predict", "--features", "f.csv", "--structures", "dir",
        ]);
        assert!(result.is_err());
    }
}
