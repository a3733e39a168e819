use super::dataset::{formula_statistics, list_entries, load_structures};
use crate::core::inference::metrics::{ENERGY_THRESHOLD_EV, energy_within_threshold};
use crate::core::inference::model::{FeaturizingModel, LoadedModel, StructureModel, TabularModel};
use crate::core::io::table::{read_feature_table_path, read_targets_path, write_submission_path};
use crate::engine::config::{PredictConfig, PredictionInput};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionReport {
    /// `(id, predicted band gap)` in input order.
    pub predictions: Vec<(String, f64)>,
    /// Energy-within-threshold over the ids that have a target.
    pub score: Option<f64>,
    /// Number of predictions that had a target.
    pub scored: usize,
}

fn score_against_targets(
    predictions: &[(String, f64)],
    targets: &HashMap<String, f64>,
) -> (Option<f64>, usize) {
    let (predicted, actual): (Vec<f64>, Vec<f64>) = predictions
        .iter()
        .filter_map(|(id, value)| targets.get(id).map(|target| (*value, *target)))
        .unzip();
    (
        energy_within_threshold(&predicted, &actual, ENERGY_THRESHOLD_EV),
        predicted.len(),
    )
}

/// Predicts one band gap per input row or structure and writes the submission table.
#[instrument(skip_all, name = "predict_workflow")]
pub fn run(config: &PredictConfig, reporter: &ProgressReporter) -> Result<PredictionReport, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Model Loading",
    });
    let model = LoadedModel::load(config.model_kind, &config.weights_path)?;
    info!(
        kind = ?config.model_kind,
        features = model.feature_names().len(),
        "Loaded model."
    );
    reporter.report(Progress::PhaseFinish);

    let predictions: Vec<(String, f64)> = match &config.input {
        PredictionInput::Features(path) => {
            reporter.report(Progress::PhaseStart { name: "Prediction" });
            let table = read_feature_table_path(path)?;
            let values = model.predict_table(&table)?;
            reporter.report(Progress::PhaseFinish);
            table.rows.into_iter().map(|row| row.id).zip(values).collect()
        }
        PredictionInput::Structures(dir) => {
            reporter.report(Progress::PhaseStart {
                name: "Formula Statistics",
            });
            let stats = formula_statistics(config.training.as_ref(), reporter)?;
            reporter.report(Progress::PhaseFinish);

            reporter.report(Progress::PhaseStart { name: "Loading" });
            let entries = list_entries(dir)?;
            let structures = load_structures(&entries, reporter)?;
            reporter.report(Progress::PhaseFinish);

            reporter.report(Progress::PhaseStart { name: "Prediction" });
            let featurizing = FeaturizingModel::new(model, config.settings.extractor(), stats);
            let values = featurizing.predict_structures(&structures)?;
            reporter.report(Progress::PhaseFinish);
            structures.into_iter().map(|(id, _)| id).zip(values).collect()
        }
    };

    write_submission_path(&predictions, &config.output_path)?;
    info!(
        rows = predictions.len(),
        output = %config.output_path.display(),
        "Wrote submission."
    );

    let (score, scored) = match &config.targets_path {
        Some(path) => {
            let targets: HashMap<String, f64> = read_targets_path(path)?
                .into_iter()
                .map(|record| (record.id, record.band_gap))
                .collect();
            let (score, scored) = score_against_targets(&predictions, &targets);
            match score {
                Some(score) => info!(scored, score, "Energy within threshold."),
                None => warn!("No prediction has a matching target; nothing to score."),
            }
            (score, scored)
        }
        None => (None, 0),
    };

    Ok(PredictionReport {
        predictions,
        score,
        scored,
    })
}

#[cfg(test)]
mod tests {
    use super::super::dataset::test_support::{with_vacancies, write_structure};
    use super::*;
    use crate::core::inference::model::{ModelError, ModelKind};
    use crate::engine::config::PredictConfigBuilder;
    use tempfile::tempdir;

    const LINEAR_SITES: &str = r#"{"intercept": 0.5, "coefficients": {"num_sites": 0.01}}"#;

    #[test]
    fn predicts_from_feature_table_in_input_order() {
        let dir = tempdir().unwrap();
        let features = dir.path().join("features.csv");
        std::fs::write(&features, "id,formula,num_sites,density\nz,X,100,1.0\na,X,200,2.0\n").unwrap();
        let weights = dir.path().join("weights.json");
        std::fs::write(&weights, LINEAR_SITES).unwrap();
        let output = dir.path().join("submission.csv");

        let config = PredictConfigBuilder::new()
            .input(PredictionInput::Features(features))
            .model_kind(ModelKind::Linear)
            .weights_path(weights)
            .output_path(output.clone())
            .build()
            .unwrap();
        let report = run(&config, &ProgressReporter::new()).unwrap();

        assert_eq!(
            report.predictions,
            vec![("z".to_string(), 1.5), ("a".to_string(), 2.5)]
        );
        assert_eq!(report.score, None);
        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.starts_with("id,predictions\nz,1.5\n"));
    }

    #[test]
    fn predicts_from_structures_and_scores_against_targets() {
        let dir = tempdir().unwrap();
        let structures = dir.path().join("structures");
        std::fs::create_dir(&structures).unwrap();
        write_structure(&structures, "a", &with_vacancies(0));
        write_structure(&structures, "b", &with_vacancies(1));
        let weights = dir.path().join("gbdt.json");
        std::fs::write(
            &weights,
            r#"{"base_score": 1.0, "trees": [{"nodes": [
                {"feature": "num_sites", "threshold": 191.5, "left": 1, "right": 2},
                {"leaf": 0.25},
                {"leaf": 0.0}
            ]}]}"#,
        )
        .unwrap();
        let targets = dir.path().join("targets.csv");
        std::fs::write(&targets, "_id,band_gap\na,1.0\nb,1.5\n").unwrap();

        let config = PredictConfigBuilder::new()
            .input(PredictionInput::Structures(structures))
            .model_kind(ModelKind::Tree)
            .weights_path(weights)
            .output_path(dir.path().join("submission.csv"))
            .targets_path(Some(targets))
            .build()
            .unwrap();
        let report = run(&config, &ProgressReporter::new()).unwrap();

        assert_eq!(
            report.predictions,
            vec![("a".to_string(), 1.0), ("b".to_string(), 1.25)]
        );
        assert_eq!(report.scored, 2);
        assert_eq!(report.score, Some(0.5));
    }

    #[test]
    fn missing_feature_column_is_an_error() {
        let dir = tempdir().unwrap();
        let features = dir.path().join("features.csv");
        std::fs::write(&features, "id,formula,density\na,X,1.0\n").unwrap();
        let weights = dir.path().join("weights.json");
        std::fs::write(&weights, LINEAR_SITES).unwrap();

        let config = PredictConfigBuilder::new()
            .input(PredictionInput::Features(features))
            .model_kind(ModelKind::Linear)
            .weights_path(weights)
            .output_path(dir.path().join("submission.csv"))
            .build()
            .unwrap();
        let result = run(&config, &ProgressReporter::new());
        assert!(matches!(
            result,
            Err(EngineError::Model {
                source: ModelError::MissingFeature(_)
            })
        ));
    }
}
