use crate::cli::{ExtractArgs, FeaturesArgs, IdealArgs, PredictArgs, StatsArgs};
use crate::error::{CliError, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tmdefect::core::inference::model::ModelKind;
use tmdefect::core::models::element::Element;
use tmdefect::engine::config as core_config;
use tracing::debug;

const CONFIG_FILE_NAME: &str = "config.toml";
const DEFAULT_SUBMISSION: &str = "submission.csv";

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct FileDataConfig {
    structures: Option<PathBuf>,
    defects: Option<PathBuf>,
    targets: Option<PathBuf>,
    features: Option<PathBuf>,
    train_structures: Option<PathBuf>,
    train_targets: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct FileIdealConfig {
    template: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct FileExtractionConfig {
    workers: Option<usize>,
    failure_policy: Option<core_config::FailurePolicy>,
    create_output_dir: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct FileFeaturesConfig {
    bond_cutoff: Option<f64>,
    elements: Option<Vec<Element>>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct FileModelConfig {
    kind: Option<ModelKind>,
    weights: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct FileOutputConfig {
    submission: Option<PathBuf>,
}

/// The TOML configuration file. Every key is optional; command-line flags take
/// precedence over `--set` values, which take precedence over the file.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    data: Option<FileDataConfig>,
    ideal: Option<FileIdealConfig>,
    extraction: Option<FileExtractionConfig>,
    features: Option<FileFeaturesConfig>,
    model: Option<FileModelConfig>,
    output: Option<FileOutputConfig>,
}

fn parse_value<T: FromStr>(key: &str, value: &str, expected: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CliError::Config(format!("Invalid {} value for {}: {}", expected, key, value))
    })
}

fn parse_failure_policy(key: &str, value: &str) -> Result<core_config::FailurePolicy> {
    match value.trim() {
        "fail-fast" => Ok(core_config::FailurePolicy::FailFast),
        "skip-and-report" => Ok(core_config::FailurePolicy::SkipAndReport),
        other => Err(CliError::Config(format!(
            "Invalid value for {}: '{}' (expected 'fail-fast' or 'skip-and-report')",
            key, other
        ))),
    }
}

fn parse_elements(key: &str, value: &str) -> Result<Vec<Element>> {
    value
        .split(',')
        .map(|symbol| parse_value(key, symbol, "element symbol"))
        .collect()
}

fn required(cli: Option<&PathBuf>, file: Option<&PathBuf>, key: &str) -> Result<PathBuf> {
    cli.or(file).cloned().ok_or_else(|| {
        CliError::Config(format!(
            "A value for '{}' is required either in the config file or via CLI argument.",
            key
        ))
    })
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// `config.toml` in the platform configuration directory.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "tmdefect").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Loads the explicit file, else the default file if it exists, else an empty config.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => {
                debug!("No configuration file found; using built-in defaults.");
                Ok(Self::default())
            }
        }
    }

    pub fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let key = key.trim();
            let path = || PathBuf::from(value.trim());

            match key {
                "data.structures" => self.data_mut().structures = Some(path()),
                "data.defects" => self.data_mut().defects = Some(path()),
                "data.targets" => self.data_mut().targets = Some(path()),
                "data.features" => self.data_mut().features = Some(path()),
                "data.train-structures" => self.data_mut().train_structures = Some(path()),
                "data.train-targets" => self.data_mut().train_targets = Some(path()),
                "ideal.template" => {
                    self.ideal.get_or_insert_with(Default::default).template = Some(path())
                }
                "extraction.workers" => {
                    self.extraction_mut().workers = Some(parse_value(key, value, "integer")?)
                }
                "extraction.failure-policy" => {
                    self.extraction_mut().failure_policy = Some(parse_failure_policy(key, value)?)
                }
                "extraction.create-output-dir" => {
                    self.extraction_mut().create_output_dir =
                        Some(parse_value(key, value, "boolean")?)
                }
                "features.bond-cutoff" => {
                    self.features_mut().bond_cutoff = Some(parse_value(key, value, "float")?)
                }
                "features.elements" => {
                    self.features_mut().elements = Some(parse_elements(key, value)?)
                }
                "model.kind" => {
                    self.model_mut().kind = Some(ModelKind::from_str(value).map_err(|e| {
                        CliError::Config(format!("Invalid value for {}: {}", key, e))
                    })?)
                }
                "model.weights" => self.model_mut().weights = Some(path()),
                "output.submission" => {
                    self.output.get_or_insert_with(Default::default).submission = Some(path())
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }

    fn data_mut(&mut self) -> &mut FileDataConfig {
        self.data.get_or_insert_with(Default::default)
    }

    fn extraction_mut(&mut self) -> &mut FileExtractionConfig {
        self.extraction.get_or_insert_with(Default::default)
    }

    fn features_mut(&mut self) -> &mut FileFeaturesConfig {
        self.features.get_or_insert_with(Default::default)
    }

    fn model_mut(&mut self) -> &mut FileModelConfig {
        self.model.get_or_insert_with(Default::default)
    }

    fn data(&self) -> FileDataConfig {
        self.data.clone().unwrap_or_default()
    }

    fn ideal_template(&self) -> Option<PathBuf> {
        self.ideal.as_ref().and_then(|i| i.template.clone())
    }

    fn training_set(&self, args: &StatsArgs, input: &Path) -> Option<core_config::TrainingSet> {
        let data = self.data();
        let targets_path = args.stats_from.clone().or(data.train_targets)?;
        let structures_dir = args
            .stats_structures
            .clone()
            .or(data.train_structures)
            .unwrap_or_else(|| input.to_path_buf());
        Some(core_config::TrainingSet {
            structures_dir,
            targets_path,
        })
    }

    pub fn template_for_ideal(&self, args: &IdealArgs) -> Option<PathBuf> {
        args.template.clone().or_else(|| self.ideal_template())
    }

    pub fn extraction_config(&self, args: &ExtractArgs) -> Result<core_config::ExtractionConfig> {
        let data = self.data();
        let file = self.extraction.clone().unwrap_or_default();

        let failure_policy = if args.skip_failures {
            core_config::FailurePolicy::SkipAndReport
        } else {
            file.failure_policy.unwrap_or_default()
        };

        let mut builder = core_config::ExtractionConfigBuilder::new()
            .input_dir(required(args.input.as_ref(), data.structures.as_ref(), "data.structures")?)
            .output_dir(required(args.output.as_ref(), data.defects.as_ref(), "data.defects")?)
            .failure_policy(failure_policy)
            .create_output_dir(args.create_output || file.create_output_dir.unwrap_or(false))
            .template(args.template.clone().or_else(|| self.ideal_template()));
        if let Some(workers) = args.workers.or(file.workers) {
            builder = builder.workers(workers);
        }
        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    pub fn feature_config(&self, args: &FeaturesArgs) -> Result<core_config::FeatureConfig> {
        let data = self.data();
        let file = self.features.clone().unwrap_or_default();
        let input = required(args.input.as_ref(), data.structures.as_ref(), "data.structures")?;

        let mut builder = core_config::FeatureConfigBuilder::new()
            .output_path(required(args.output.as_ref(), data.features.as_ref(), "data.features")?)
            .targets_path(args.targets.clone().or(data.targets))
            .training(self.training_set(&args.stats, &input))
            .structures_dir(input);
        if let Some(cutoff) = args.bond_cutoff.or(file.bond_cutoff) {
            builder = builder.bond_cutoff(cutoff);
        }
        if let Some(elements) = file.elements {
            builder = builder.elements(elements);
        }
        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    pub fn predict_config(&self, args: &PredictArgs) -> Result<core_config::PredictConfig> {
        let data = self.data();
        let features = self.features.clone().unwrap_or_default();
        let model = self.model.clone().unwrap_or_default();

        let input = match (&args.source.features, &args.source.structures) {
            (Some(path), _) => core_config::PredictionInput::Features(path.clone()),
            (None, Some(dir)) => core_config::PredictionInput::Structures(dir.clone()),
            (None, None) => match (&data.features, &data.structures) {
                (Some(path), _) => core_config::PredictionInput::Features(path.clone()),
                (None, Some(dir)) => core_config::PredictionInput::Structures(dir.clone()),
                (None, None) => {
                    return Err(CliError::Config(
                        "Prediction needs --features or --structures (or data.features / data.structures in the config file).".to_string(),
                    ));
                }
            },
        };
        let training = match &input {
            core_config::PredictionInput::Structures(dir) => self.training_set(&args.stats, dir),
            core_config::PredictionInput::Features(_) => None,
        };

        let kind = match &args.kind {
            Some(kind) => ModelKind::from_str(kind).map_err(|e| CliError::Argument(e.to_string()))?,
            None => model.kind.unwrap_or(ModelKind::Tree),
        };

        let mut builder = core_config::PredictConfigBuilder::new()
            .input(input)
            .model_kind(kind)
            .weights_path(required(args.weights.as_ref(), model.weights.as_ref(), "model.weights")?)
            .output_path(
                args.output
                    .clone()
                    .or(self.output.as_ref().and_then(|o| o.submission.clone()))
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SUBMISSION)),
            )
            .targets_path(args.targets.clone())
            .training(training);
        if let Some(cutoff) = args.bond_cutoff.or(features.bond_cutoff) {
            builder = builder.bond_cutoff(cutoff);
        }
        if let Some(elements) = features.elements {
            builder = builder.elements(elements);
        }
        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }
}
