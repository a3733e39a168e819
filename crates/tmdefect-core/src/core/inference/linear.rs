use super::model::{ModelError, TabularModel, read_weights};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LinearWeights {
    intercept: f64,
    coefficients: BTreeMap<String, f64>,
}

/// `intercept + Σ coefficient · feature` over named features.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    intercept: f64,
    names: Vec<String>,
    coefficients: Vec<f64>,
}

impl LinearModel {
    pub fn new(intercept: f64, coefficients: Vec<(String, f64)>) -> Self {
        let (names, coefficients) = coefficients.into_iter().unzip();
        Self {
            intercept,
            names,
            coefficients,
        }
    }

    /// Parses `{"intercept": f64, "coefficients": {"name": f64, ...}}`.
    pub fn from_json_str(content: &str, origin: &str) -> Result<Self, ModelError> {
        let weights: LinearWeights =
            serde_json::from_str(content).map_err(|source| ModelError::Json {
                path: origin.to_string(),
                source,
            })?;
        Ok(Self::new(
            weights.intercept,
            weights.coefficients.into_iter().collect(),
        ))
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        Self::from_json_str(&read_weights(path)?, &path.to_string_lossy())
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl TabularModel for LinearModel {
    fn feature_names(&self) -> &[String] {
        &self.names
    }

    fn score(&self, features: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }
}
