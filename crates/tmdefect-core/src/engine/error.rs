use thiserror::Error;

use super::config::ConfigError;
use crate::core::defects::diff::DefectError;
use crate::core::defects::ideal::TemplateError;
use crate::core::features::extractor::FeatureError;
use crate::core::inference::model::ModelError;
use crate::core::io::json::StructureFileError;
use crate::core::io::table::TableError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Structure file '{path}': {source}")]
    StructureFile {
        path: String,
        source: StructureFileError,
    },

    #[error("Ideal lattice template error: {source}")]
    Template {
        #[from]
        source: TemplateError,
    },

    #[error("Table error: {source}")]
    Table {
        #[from]
        source: TableError,
    },

    #[error("Defect extraction failed for '{id}': {source}")]
    Defect { id: String, source: DefectError },

    #[error("Featurization failed for '{id}': {source}")]
    Feature { id: String, source: FeatureError },

    #[error("Model error: {source}")]
    Model {
        #[from]
        source: ModelError,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl EngineError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
