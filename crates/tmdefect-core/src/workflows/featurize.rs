use super::dataset::{formula_statistics, list_entries, load_structures};
use crate::core::features::extractor::FeatureExtractor;
use crate::core::features::formula_stats::FormulaStatistics;
use crate::core::features::table::{FeatureRow, FeatureTable};
use crate::core::io::table::{read_targets_path, write_feature_table_path};
use crate::core::models::structure::Structure;
use crate::engine::config::FeatureConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use std::collections::HashMap;
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub const TARGET_COLUMN: &str = "band_gap";

/// Computes one feature row per structure, sorted by id.
///
/// Fails on the first structure (in input order) that cannot be featurized.
pub fn featurize_structures(
    structures: &[(String, Structure)],
    extractor: &FeatureExtractor,
    stats: &FormulaStatistics,
    reporter: &ProgressReporter,
) -> Result<FeatureTable, EngineError> {
    reporter.start_task(structures.len());

    #[cfg(not(feature = "parallel"))]
    let iterator = structures.iter();

    #[cfg(feature = "parallel")]
    let iterator = structures.par_iter();

    let rows: Vec<Result<FeatureRow, EngineError>> = iterator
        .map(|(id, structure)| {
            let row = extractor
                .extract(id, structure, stats)
                .map_err(|source| EngineError::Feature {
                    id: id.clone(),
                    source,
                });
            reporter.report(Progress::TaskIncrement);
            row
        })
        .collect();
    reporter.report(Progress::TaskFinish);

    let mut table = FeatureTable::new(extractor.column_names());
    table.rows = rows.into_iter().collect::<Result<_, _>>()?;
    table.rows.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(table)
}

/// Keeps only rows with a known target and appends the target as the last column.
pub fn join_targets(table: &mut FeatureTable, targets: &HashMap<String, f64>) {
    table.rows.retain(|row| targets.contains_key(&row.id));
    let values: Vec<f64> = table.rows.iter().map(|row| targets[&row.id]).collect();
    table.push_column(TARGET_COLUMN, &values);
}

/// Featurizes a structure directory and writes the feature table.
#[instrument(skip_all, name = "featurize_workflow")]
pub fn run(config: &FeatureConfig, reporter: &ProgressReporter) -> Result<FeatureTable, EngineError> {
    // === Phase 0: Formula statistics ===
    reporter.report(Progress::PhaseStart {
        name: "Formula Statistics",
    });
    let stats = formula_statistics(config.training.as_ref(), reporter)?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 1: Loading ===
    reporter.report(Progress::PhaseStart { name: "Loading" });
    let entries = list_entries(&config.structures_dir)?;
    let structures = load_structures(&entries, reporter)?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Featurization ===
    reporter.report(Progress::PhaseStart {
        name: "Featurization",
    });
    info!(
        structures = structures.len(),
        bond_cutoff = config.settings.bond_cutoff,
        "Extracting features."
    );
    let extractor = config.settings.extractor();
    let mut table = featurize_structures(&structures, &extractor, &stats, reporter)?;
    reporter.report(Progress::PhaseFinish);

    if let Some(targets_path) = &config.targets_path {
        let targets: HashMap<String, f64> = read_targets_path(targets_path)?
            .into_iter()
            .map(|record| (record.id, record.band_gap))
            .collect();
        let before = table.len();
        join_targets(&mut table, &targets);
        info!(
            kept = table.len(),
            dropped = before - table.len(),
            "Joined feature rows with targets."
        );
    }

    write_feature_table_path(&table, &config.output_path)?;
    info!(
        rows = table.len(),
        columns = table.columns.len(),
        output = %config.output_path.display(),
        "Wrote feature table."
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::super::dataset::test_support::{with_vacancies, write_structure};
    use super::*;
    use crate::core::io::table::read_feature_table_path;
    use crate::engine::config::{FeatureConfigBuilder, TrainingSet};
    use tempfile::tempdir;

    #[test]
    fn writes_sorted_rows_with_all_columns() {
        let dir = tempdir().unwrap();
        write_structure(dir.path(), "b", &with_vacancies(1));
        write_structure(dir.path(), "a", &with_vacancies(0));
        let output = dir.path().join("features.csv");
        let config = FeatureConfigBuilder::new()
            .structures_dir(dir.path().to_path_buf())
            .output_path(output.clone())
            .build()
            .unwrap();

        let table = run(&config, &ProgressReporter::new()).unwrap();
        let ids: Vec<&str> = table.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(table.columns, FeatureExtractor::default().column_names());

        let read = read_feature_table_path(&output).unwrap();
        assert_eq!(read.columns, table.columns);
        assert_eq!(read.len(), 2);
        let num_sites = read.column_index("num_sites").unwrap();
        assert_eq!(read.rows[0].values[num_sites], 192.0);
        assert_eq!(read.rows[1].values[num_sites], 191.0);
    }

    #[test]
    fn targets_join_drops_unlabelled_rows_and_adds_band_gap() {
        let dir = tempdir().unwrap();
        let structures = dir.path().join("structures");
        std::fs::create_dir(&structures).unwrap();
        write_structure(&structures, "a", &with_vacancies(1));
        write_structure(&structures, "b", &with_vacancies(1));
        write_structure(&structures, "c", &with_vacancies(2));
        let targets = dir.path().join("targets.csv");
        std::fs::write(&targets, "_id,band_gap\na,1.0\nc,0.25\n").unwrap();

        let config = FeatureConfigBuilder::new()
            .structures_dir(structures.clone())
            .output_path(dir.path().join("features.csv"))
            .targets_path(Some(targets.clone()))
            .training(Some(TrainingSet {
                structures_dir: structures,
                targets_path: targets,
            }))
            .build()
            .unwrap();

        let table = run(&config, &ProgressReporter::new()).unwrap();
        let ids: Vec<&str> = table.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(table.columns.last().map(String::as_str), Some(TARGET_COLUMN));

        let gap = table.column_index(TARGET_COLUMN).unwrap();
        let mean_gap = table.column_index("mean_formula_band_gap").unwrap();
        assert_eq!(table.rows[0].values[gap], 1.0);
        assert_eq!(table.rows[0].values[mean_gap], 1.0);
        assert_eq!(table.rows[1].values[mean_gap], 0.25);
    }

    #[test]
    fn featurization_failure_names_the_structure() {
        let dir = tempdir().unwrap();
        let empty = Structure::empty(with_vacancies(0).lattice().clone());
        write_structure(dir.path(), "void", &empty);
        let config = FeatureConfigBuilder::new()
            .structures_dir(dir.path().to_path_buf())
            .output_path(dir.path().join("features.csv"))
            .build()
            .unwrap();

        match run(&config, &ProgressReporter::new()) {
            Err(EngineError::Feature { id, .. }) => assert_eq!(id, "void"),
            other => panic!("unexpected result: {:?}", other.map(|t| t.len())),
        }
    }
}
