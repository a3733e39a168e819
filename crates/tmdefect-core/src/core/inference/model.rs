use super::linear::LinearModel;
use super::tree::TreeEnsemble;
use crate::core::features::extractor::{FeatureError, FeatureExtractor};
use crate::core::features::formula_stats::FormulaStatistics;
use crate::core::features::table::{FeatureRow, FeatureTable};
use crate::core::models::structure::Structure;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Malformed model weights in '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("Feature '{0}' required by the model is missing from the input table")]
    MissingFeature(String),
    #[error("Tree {tree}, node {node}: {reason}")]
    InvalidTree {
        tree: usize,
        node: usize,
        reason: String,
    },
    #[error("Unknown model kind '{0}' (expected 'linear' or 'tree')")]
    UnknownKind(String),
    #[error("Featurization of '{id}' failed: {source}")]
    Featurization { id: String, source: FeatureError },
}

/// A scorer that maps one feature row to one scalar.
pub trait TabularModel: Send + Sync {
    /// Names of the features the model reads, in the order [`score`](Self::score)
    /// expects them.
    fn feature_names(&self) -> &[String];

    /// Scores one feature vector laid out as [`feature_names`](Self::feature_names).
    fn score(&self, features: &[f64]) -> f64;

    fn predict_row(&self, columns: &[String], row: &FeatureRow) -> Result<f64, ModelError> {
        let indices = resolve_columns(self.feature_names(), columns)?;
        Ok(self.score(&gather(row, &indices)))
    }

    fn predict_table(&self, table: &FeatureTable) -> Result<Vec<f64>, ModelError> {
        let indices = resolve_columns(self.feature_names(), &table.columns)?;
        Ok(table
            .rows
            .iter()
            .map(|row| self.score(&gather(row, &indices)))
            .collect())
    }
}

/// A predictor that maps one structure to one scalar.
pub trait StructureModel: Send + Sync {
    fn predict_structures(&self, structures: &[(String, Structure)]) -> Result<Vec<f64>, ModelError>;
}

fn resolve_columns(features: &[String], columns: &[String]) -> Result<Vec<usize>, ModelError> {
    features
        .iter()
        .map(|name| {
            columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| ModelError::MissingFeature(name.clone()))
        })
        .collect()
}

fn gather(row: &FeatureRow, indices: &[usize]) -> Vec<f64> {
    indices
        .iter()
        .map(|&i| row.values.get(i).copied().unwrap_or(f64::NAN))
        .collect()
}

/// Turns a [`TabularModel`] into a [`StructureModel`] by featurizing each structure first.
pub struct FeaturizingModel<M> {
    model: M,
    extractor: FeatureExtractor,
    stats: FormulaStatistics,
}

impl<M: TabularModel> FeaturizingModel<M> {
    pub fn new(model: M, extractor: FeatureExtractor, stats: FormulaStatistics) -> Self {
        Self {
            model,
            extractor,
            stats,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<M: TabularModel> StructureModel for FeaturizingModel<M> {
    fn predict_structures(&self, structures: &[(String, Structure)]) -> Result<Vec<f64>, ModelError> {
        let columns = self.extractor.column_names();
        let indices = resolve_columns(self.model.feature_names(), &columns)?;

        #[cfg(not(feature = "parallel"))]
        let iterator = structures.iter();

        #[cfg(feature = "parallel")]
        let iterator = structures.par_iter();

        iterator
            .map(|(id, structure)| {
                let row = self
                    .extractor
                    .extract(id, structure, &self.stats)
                    .map_err(|source| ModelError::Featurization {
                        id: id.clone(),
                        source,
                    })?;
                Ok(self.model.score(&gather(&row, &indices)))
            })
            .collect()
    }
}

/// The scorer families that can be loaded from a weights file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    Linear,
    Tree,
}

impl FromStr for ModelKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "tree" | "gbdt" => Ok(Self::Tree),
            other => Err(ModelError::UnknownKind(other.to_string())),
        }
    }
}

/// A loaded scorer of either family.
#[derive(Debug, Clone)]
pub enum LoadedModel {
    Linear(LinearModel),
    Tree(TreeEnsemble),
}

impl LoadedModel {
    pub fn load(kind: ModelKind, path: &Path) -> Result<Self, ModelError> {
        Ok(match kind {
            ModelKind::Linear => Self::Linear(LinearModel::load(path)?),
            ModelKind::Tree => Self::Tree(TreeEnsemble::load(path)?),
        })
    }
}

impl TabularModel for LoadedModel {
    fn feature_names(&self) -> &[String] {
        match self {
            Self::Linear(m) => m.feature_names(),
            Self::Tree(m) => m.feature_names(),
        }
    }

    fn score(&self, features: &[f64]) -> f64 {
        match self {
            Self::Linear(m) => m.score(features),
            Self::Tree(m) => m.score(features),
        }
    }
}

pub(crate) fn read_weights(path: &Path) -> Result<String, ModelError> {
    std::fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.to_string_lossy().to_string(),
        source,
    })
}
