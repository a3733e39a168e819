use crate::core::features::formula_stats::FormulaStatistics;
use crate::core::io::dataset::{StructureEntry, list_structure_files};
use crate::core::io::json::JsonFile;
use crate::core::io::table::read_targets_path;
use crate::core::io::traits::StructureFile;
use crate::core::models::structure::Structure;
use crate::engine::config::TrainingSet;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub(crate) fn require_dir(path: &Path, role: &str) -> Result<(), EngineError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(EngineError::Precondition(format!(
            "{role} directory '{}' does not exist or is not a directory",
            path.display()
        )))
    }
}

/// Lists the structure files of `dir`, requiring at least one.
pub(crate) fn list_entries(dir: &Path) -> Result<Vec<StructureEntry>, EngineError> {
    require_dir(dir, "Input")?;
    let entries = list_structure_files(dir).map_err(|source| EngineError::io(dir, source))?;
    if entries.is_empty() {
        return Err(EngineError::Precondition(format!(
            "no structure files (*.json) found in '{}'",
            dir.display()
        )));
    }
    debug!(count = entries.len(), dir = %dir.display(), "Discovered structure files.");
    Ok(entries)
}

pub(crate) fn read_structure(entry: &StructureEntry) -> Result<Structure, EngineError> {
    JsonFile::read_from_path(&entry.path)
        .map(|(structure, _)| structure)
        .map_err(|source| EngineError::StructureFile {
            path: entry.path.display().to_string(),
            source,
        })
}

/// Reads every entry, failing on the first unreadable file in entry order.
pub(crate) fn load_structures(
    entries: &[StructureEntry],
    reporter: &ProgressReporter,
) -> Result<Vec<(String, Structure)>, EngineError> {
    reporter.start_task(entries.len());

    #[cfg(not(feature = "parallel"))]
    let iterator = entries.iter();

    #[cfg(feature = "parallel")]
    let iterator = entries.par_iter();

    let loaded: Vec<Result<(String, Structure), EngineError>> = iterator
        .map(|entry| {
            let result = read_structure(entry).map(|s| (entry.id.clone(), s));
            reporter.report(Progress::TaskIncrement);
            result
        })
        .collect();

    reporter.report(Progress::TaskFinish);
    loaded.into_iter().collect()
}

/// Builds formula-grouped band-gap statistics from a labelled dataset.
///
/// Only structures with a target contribute; targets without a structure file are
/// ignored.
pub(crate) fn formula_statistics(
    training: Option<&TrainingSet>,
    reporter: &ProgressReporter,
) -> Result<FormulaStatistics, EngineError> {
    let Some(training) = training else {
        debug!("No training set given; formula statistics resolve to zeros.");
        return Ok(FormulaStatistics::default());
    };

    let targets: HashMap<String, f64> = read_targets_path(&training.targets_path)?
        .into_iter()
        .map(|record| (record.id, record.band_gap))
        .collect();

    let entries: Vec<StructureEntry> = list_entries(&training.structures_dir)?
        .into_iter()
        .filter(|entry| targets.contains_key(&entry.id))
        .collect();
    if entries.is_empty() {
        return Err(EngineError::Precondition(format!(
            "no structure in '{}' has a target in '{}'",
            training.structures_dir.display(),
            training.targets_path.display()
        )));
    }

    let structures = load_structures(&entries, reporter)?;
    let stats = FormulaStatistics::from_pairs(
        structures
            .iter()
            .map(|(id, structure)| (structure.formula(), targets[id])),
    );
    info!(
        structures = structures.len(),
        formulas = stats.len(),
        "Built formula band-gap statistics."
    );
    Ok(stats)
}
