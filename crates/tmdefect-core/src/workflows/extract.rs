use super::dataset::{list_entries, read_structure, require_dir};
use super::ideal::reference_structure;
use crate::core::defects::diff::DefectContext;
use crate::core::io::dataset::StructureEntry;
use crate::core::io::json::JsonFile;
use crate::core::io::traits::StructureFile;
use crate::core::models::structure::Structure;
use crate::engine::config::{ExtractionConfig, FailurePolicy};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// An input that produced no output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub id: String,
    pub reason: String,
}

/// Outcome of an extraction batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Ids whose defect file was written, in input order.
    pub succeeded: Vec<String>,
    /// Ids skipped under [`FailurePolicy::SkipAndReport`], in input order.
    pub failed: Vec<ItemFailure>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

fn extract_one(entry: &StructureEntry, context: &DefectContext) -> Result<Structure, EngineError> {
    let observed = read_structure(entry)?;
    let defects = context
        .extract(&observed)
        .map_err(|source| EngineError::Defect {
            id: entry.id.clone(),
            source,
        })?;
    debug!(id = %entry.id, defects = defects.num_sites(), "Extracted defects.");
    Ok(defects)
}

fn prepare_output_dir(path: &Path, create: bool) -> Result<(), EngineError> {
    if !path.exists() && create {
        std::fs::create_dir_all(path).map_err(|source| EngineError::io(path, source))?;
        info!(path = %path.display(), "Created output directory.");
    }
    require_dir(path, "Output")
}

#[cfg(feature = "parallel")]
fn extract_all(
    entries: &[StructureEntry],
    context: &DefectContext,
    workers: usize,
    reporter: &ProgressReporter,
) -> Result<Vec<Result<Structure, EngineError>>, EngineError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| EngineError::Internal(format!("failed to start worker pool: {e}")))?;
    Ok(pool.install(|| {
        entries
            .par_iter()
            .map(|entry| {
                let result = extract_one(entry, context);
                reporter.report(Progress::TaskIncrement);
                result
            })
            .collect()
    }))
}

#[cfg(not(feature = "parallel"))]
fn extract_all(
    entries: &[StructureEntry],
    context: &DefectContext,
    _workers: usize,
    reporter: &ProgressReporter,
) -> Result<Vec<Result<Structure, EngineError>>, EngineError> {
    Ok(entries
        .iter()
        .map(|entry| {
            let result = extract_one(entry, context);
            reporter.report(Progress::TaskIncrement);
            result
        })
        .collect())
}

/// Extracts the defect structure of every `*.json` file in the input directory and
/// writes each as `<id>.json` into the output directory.
///
/// Items are processed by `config.workers` threads; nothing is written until every
/// item has finished. Under [`FailurePolicy::FailFast`] the first failure in input
/// order aborts the batch with no output written.
#[instrument(skip_all, name = "extract_workflow")]
pub fn run(config: &ExtractionConfig, reporter: &ProgressReporter) -> Result<BatchReport, EngineError> {
    // === Phase 0: Preconditions and reference ===
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    let entries = list_entries(&config.input_dir)?;
    prepare_output_dir(&config.output_dir, config.create_output_dir)?;
    let context = DefectContext::new(reference_structure(config.template.as_deref())?);
    info!(
        inputs = entries.len(),
        reference_sites = context.reference().num_sites(),
        workers = config.workers,
        "Starting defect extraction."
    );
    reporter.report(Progress::PhaseFinish);

    // === Phase 1: Extraction ===
    reporter.report(Progress::PhaseStart { name: "Extraction" });
    reporter.start_task(entries.len());
    let results = extract_all(&entries, &context, config.workers, reporter)?;
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    let mut report = BatchReport::default();
    let mut outputs = Vec::with_capacity(results.len());
    for (entry, result) in entries.iter().zip(results) {
        match result {
            Ok(defects) => outputs.push((entry, defects)),
            Err(e) => match config.failure_policy {
                FailurePolicy::FailFast => return Err(e),
                FailurePolicy::SkipAndReport => {
                    warn!(id = %entry.id, error = %e, "Skipping failed item.");
                    reporter.skip(&entry.id, &e);
                    report.failed.push(ItemFailure {
                        id: entry.id.clone(),
                        reason: e.to_string(),
                    });
                }
            },
        }
    }

    // === Phase 2: Writing ===
    reporter.report(Progress::PhaseStart { name: "Writing" });
    for (entry, defects) in outputs {
        let path = config.output_dir.join(format!("{}.json", entry.id));
        JsonFile::write_structure_to_path(&defects, &path).map_err(|source| {
            EngineError::StructureFile {
                path: path.display().to_string(),
                source,
            }
        })?;
        report.succeeded.push(entry.id.clone());
    }
    reporter.report(Progress::PhaseFinish);

    info!(
        written = report.succeeded.len(),
        failed = report.failed.len(),
        "Defect extraction finished."
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::super::dataset::test_support::{with_vacancies, write_structure};
    use super::*;
    use crate::core::defects::ideal::ideal_lattice;
    use crate::engine::config::ExtractionConfigBuilder;
    use std::path::PathBuf;
    use tempfile::{TempDir, tempdir};

    struct Dirs {
        _root: TempDir,
        input: PathBuf,
        output: PathBuf,
    }

    fn dirs() -> Dirs {
        let root = tempdir().unwrap();
        let input = root.path().join("structures");
        let output = root.path().join("defects");
        std::fs::create_dir(&input).unwrap();
        std::fs::create_dir(&output).unwrap();
        Dirs {
            _root: root,
            input,
            output,
        }
    }

    fn config(dirs: &Dirs, policy: FailurePolicy) -> ExtractionConfig {
        ExtractionConfigBuilder::new()
            .input_dir(dirs.input.clone())
            .output_dir(dirs.output.clone())
            .workers(2)
            .failure_policy(policy)
            .build()
            .unwrap()
    }

    fn output_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn read_output(dirs: &Dirs, id: &str) -> Structure {
        JsonFile::read_from_path(dirs.output.join(format!("{id}.json")))
            .unwrap()
            .0
    }

    #[test]
    fn writes_one_defect_file_per_input() {
        let dirs = dirs();
        write_structure(&dirs.input, "perfect", &ideal_lattice());
        write_structure(&dirs.input, "two_vacancies", &with_vacancies(2));

        let report = run(&config(&dirs, FailurePolicy::FailFast), &ProgressReporter::new()).unwrap();
        assert_eq!(report.succeeded, vec!["perfect", "two_vacancies"]);
        assert!(report.is_complete());
        assert_eq!(output_files(&dirs.output), vec!["perfect.json", "two_vacancies.json"]);

        assert!(read_output(&dirs, "perfect").is_empty());
        let defects = read_output(&dirs, "two_vacancies");
        assert_eq!(defects.atoms(), &ideal_lattice().atoms()[..2]);
    }

    #[test]
    fn fail_fast_writes_nothing() {
        let dirs = dirs();
        write_structure(&dirs.input, "a", &with_vacancies(1));
        std::fs::write(dirs.input.join("b.json"), "{ broken").unwrap();

        let result = run(&config(&dirs, FailurePolicy::FailFast), &ProgressReporter::new());
        assert!(matches!(result, Err(EngineError::StructureFile { .. })));
        assert!(output_files(&dirs.output).is_empty());
    }

    #[test]
    fn skip_and_report_writes_successes_and_lists_failures() {
        let dirs = dirs();
        write_structure(&dirs.input, "a", &with_vacancies(1));
        std::fs::write(dirs.input.join("b.json"), "{ broken").unwrap();
        write_structure(&dirs.input, "c", &Structure::empty(ideal_lattice().lattice().clone()));

        let report = run(
            &config(&dirs, FailurePolicy::SkipAndReport),
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(report.succeeded, vec!["a"]);
        let failed: Vec<&str> = report.failed.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(failed, vec!["b", "c"]);
        assert_eq!(output_files(&dirs.output), vec!["a.json"]);
    }

    #[test]
    fn reruns_produce_identical_bytes() {
        let dirs = dirs();
        write_structure(&dirs.input, "a", &with_vacancies(3));
        let config = config(&dirs, FailurePolicy::FailFast);

        run(&config, &ProgressReporter::new()).unwrap();
        let first = std::fs::read(dirs.output.join("a.json")).unwrap();
        run(&config, &ProgressReporter::new()).unwrap();
        let second = std::fs::read(dirs.output.join("a.json")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn preconditions_fail_before_any_work() {
        let dirs = dirs();
        let empty = run(&config(&dirs, FailurePolicy::FailFast), &ProgressReporter::new());
        assert!(matches!(empty, Err(EngineError::Precondition(_))));

        write_structure(&dirs.input, "a", &with_vacancies(1));
        let mut missing_output = config(&dirs, FailurePolicy::FailFast);
        missing_output.output_dir = dirs.output.join("nested");
        let result = run(&missing_output, &ProgressReporter::new());
        assert!(matches!(result, Err(EngineError::Precondition(_))));

        missing_output.create_output_dir = true;
        run(&missing_output, &ProgressReporter::new()).unwrap();
        assert_eq!(output_files(&missing_output.output_dir), vec!["a.json"]);
    }

    #[test]
    fn reports_progress_for_every_item() {
        use std::sync::atomic::{AtomicU64, Ordering};

        let dirs = dirs();
        for id in ["a", "b", "c"] {
            write_structure(&dirs.input, id, &with_vacancies(1));
        }
        let increments = AtomicU64::new(0);
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::TaskIncrement = event {
                increments.fetch_add(1, Ordering::Relaxed);
            }
        }));
        run(&config(&dirs, FailurePolicy::FailFast), &reporter).unwrap();
        drop(reporter);
        assert_eq!(increments.into_inner(), 3);
    }
}
