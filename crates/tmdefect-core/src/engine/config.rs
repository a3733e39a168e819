use crate::core::features::extractor::FeatureExtractor;
use crate::core::inference::model::ModelKind;
use crate::core::models::element::Element;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_WORKERS: usize = 2;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// What a batch does when a single item fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort the whole batch before anything is written.
    #[default]
    FailFast,
    /// Skip failed items, write the rest, and list the failures in the report.
    SkipAndReport,
}

/// A labelled dataset used to derive formula-grouped band-gap statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingSet {
    pub structures_dir: PathBuf,
    pub targets_path: PathBuf,
}

/// Settings of the structure featurizer.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSettings {
    pub bond_cutoff: f64,
    pub elements: Vec<Element>,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        let extractor = FeatureExtractor::default();
        Self {
            bond_cutoff: extractor.bond_cutoff(),
            elements: extractor.elements().to_vec(),
        }
    }
}

impl FeatureSettings {
    pub fn extractor(&self) -> FeatureExtractor {
        FeatureExtractor::new(self.bond_cutoff, self.elements.clone())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.bond_cutoff.is_finite() && self.bond_cutoff > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "bond_cutoff",
                reason: format!("expected a positive distance, got {}", self.bond_cutoff),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub workers: usize,
    pub failure_policy: FailurePolicy,
    pub create_output_dir: bool,
    /// Ideal-lattice template; `None` selects the built-in MoS₂ supercell.
    pub template: Option<PathBuf>,
}

#[derive(Default)]
pub struct ExtractionConfigBuilder {
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    workers: Option<usize>,
    failure_policy: Option<FailurePolicy>,
    create_output_dir: bool,
    template: Option<PathBuf>,
}

impl ExtractionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_dir(mut self, path: PathBuf) -> Self {
        self.input_dir = Some(path);
        self
    }
    pub fn output_dir(mut self, path: PathBuf) -> Self {
        self.output_dir = Some(path);
        self
    }
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = Some(policy);
        self
    }
    pub fn create_output_dir(mut self, create: bool) -> Self {
        self.create_output_dir = create;
        self
    }
    pub fn template(mut self, path: Option<PathBuf>) -> Self {
        self.template = path;
        self
    }

    pub fn build(self) -> Result<ExtractionConfig, ConfigError> {
        let workers = self.workers.unwrap_or(DEFAULT_WORKERS);
        if workers == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "workers",
                reason: "at least one worker is required".into(),
            });
        }
        Ok(ExtractionConfig {
            input_dir: self
                .input_dir
                .ok_or(ConfigError::MissingParameter("input_dir"))?,
            output_dir: self
                .output_dir
                .ok_or(ConfigError::MissingParameter("output_dir"))?,
            workers,
            failure_policy: self.failure_policy.unwrap_or_default(),
            create_output_dir: self.create_output_dir,
            template: self.template,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureConfig {
    pub structures_dir: PathBuf,
    pub output_path: PathBuf,
    /// Joined by id; adds a `band_gap` column and drops unlabelled structures.
    pub targets_path: Option<PathBuf>,
    /// Source of the formula statistics; without it every formula maps to zeros.
    pub training: Option<TrainingSet>,
    pub settings: FeatureSettings,
}

#[derive(Default)]
pub struct FeatureConfigBuilder {
    structures_dir: Option<PathBuf>,
    output_path: Option<PathBuf>,
    targets_path: Option<PathBuf>,
    training: Option<TrainingSet>,
    bond_cutoff: Option<f64>,
    elements: Option<Vec<Element>>,
}

impl FeatureConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn structures_dir(mut self, path: PathBuf) -> Self {
        self.structures_dir = Some(path);
        self
    }
    pub fn output_path(mut self, path: PathBuf) -> Self {
        self.output_path = Some(path);
        self
    }
    pub fn targets_path(mut self, path: Option<PathBuf>) -> Self {
        self.targets_path = path;
        self
    }
    pub fn training(mut self, training: Option<TrainingSet>) -> Self {
        self.training = training;
        self
    }
    pub fn bond_cutoff(mut self, cutoff: f64) -> Self {
        self.bond_cutoff = Some(cutoff);
        self
    }
    pub fn elements(mut self, elements: Vec<Element>) -> Self {
        self.elements = Some(elements);
        self
    }

    pub fn build(self) -> Result<FeatureConfig, ConfigError> {
        let defaults = FeatureSettings::default();
        let settings = FeatureSettings {
            bond_cutoff: self.bond_cutoff.unwrap_or(defaults.bond_cutoff),
            elements: self.elements.unwrap_or(defaults.elements),
        };
        settings.validate()?;
        Ok(FeatureConfig {
            structures_dir: self
                .structures_dir
                .ok_or(ConfigError::MissingParameter("structures_dir"))?,
            output_path: self
                .output_path
                .ok_or(ConfigError::MissingParameter("output_path"))?,
            targets_path: self.targets_path,
            training: self.training,
            settings,
        })
    }
}

/// Where prediction rows come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictionInput {
    /// A precomputed feature table.
    Features(PathBuf),
    /// A directory of structure files, featurized on the fly.
    Structures(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictConfig {
    pub input: PredictionInput,
    pub model_kind: ModelKind,
    pub weights_path: PathBuf,
    pub output_path: PathBuf,
    /// Known band gaps used to score the predictions.
    pub targets_path: Option<PathBuf>,
    pub training: Option<TrainingSet>,
    pub settings: FeatureSettings,
}

#[derive(Default)]
pub struct PredictConfigBuilder {
    input: Option<PredictionInput>,
    model_kind: Option<ModelKind>,
    weights_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    targets_path: Option<PathBuf>,
    training: Option<TrainingSet>,
    bond_cutoff: Option<f64>,
    elements: Option<Vec<Element>>,
}

impl PredictConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, input: PredictionInput) -> Self {
        self.input = Some(input);
        self
    }
    pub fn model_kind(mut self, kind: ModelKind) -> Self {
        self.model_kind = Some(kind);
        self
    }
    pub fn weights_path(mut self, path: PathBuf) -> Self {
        self.weights_path = Some(path);
        self
    }
    pub fn output_path(mut self, path: PathBuf) -> Self {
        self.output_path = Some(path);
        self
    }
    pub fn targets_path(mut self, path: Option<PathBuf>) -> Self {
        self.targets_path = path;
        self
    }
    pub fn training(mut self, training: Option<TrainingSet>) -> Self {
        self.training = training;
        self
    }
    pub fn bond_cutoff(mut self, cutoff: f64) -> Self {
        self.bond_cutoff = Some(cutoff);
        self
    }
    pub fn elements(mut self, elements: Vec<Element>) -> Self {
        self.elements = Some(elements);
        self
    }

    pub fn build(self) -> Result<PredictConfig, ConfigError> {
        let defaults = FeatureSettings::default();
        let settings = FeatureSettings {
            bond_cutoff: self.bond_cutoff.unwrap_or(defaults.bond_cutoff),
            elements: self.elements.unwrap_or(defaults.elements),
        };
        settings.validate()?;
        Ok(PredictConfig {
            input: self.input.ok_or(ConfigError::MissingParameter("input"))?,
            model_kind: self
                .model_kind
                .ok_or(ConfigError::MissingParameter("model_kind"))?,
            weights_path: self
                .weights_path
                .ok_or(ConfigError::MissingParameter("weights_path"))?,
            output_path: self
                .output_path
                .ok_or(ConfigError::MissingParameter("output_path"))?,
            targets_path: self.targets_path,
            training: self.training,
            settings,
        })
    }
}
