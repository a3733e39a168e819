use super::stats::Summary;
use std::collections::HashMap;

/// Band-gap statistics of the training structures grouped by chemical formula.
///
/// Built once from labelled data and then only read. Formulas absent from the
/// training data resolve to zeros.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormulaStatistics {
    by_formula: HashMap<String, Summary>,
}

impl FormulaStatistics {
    /// Groups `(formula, band_gap)` pairs by formula. NaN band gaps are skipped.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut grouped: HashMap<String, Vec<f64>> = HashMap::new();
        for (formula, band_gap) in pairs {
            if band_gap.is_nan() {
                continue;
            }
            grouped.entry(formula.into()).or_default().push(band_gap);
        }
        let by_formula = grouped
            .into_iter()
            .filter_map(|(formula, gaps)| Summary::of(gaps).map(|s| (formula, s)))
            .collect();
        Self { by_formula }
    }

    pub fn get(&self, formula: &str) -> Summary {
        self.by_formula.get(formula).copied().unwrap_or(Summary::ZERO)
    }

    pub fn len(&self) -> usize {
        self.by_formula.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_formula.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_band_gaps_by_formula() {
        let stats = FormulaStatistics::from_pairs([
            ("Mo63 S128", 1.0),
            ("Mo63 S128", 2.0),
            ("Mo64 S127", 0.5),
            ("Mo63 S128", 3.0),
        ]);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats.get("Mo63 S128"), Summary { min: 1.0, mean: 2.0, max: 3.0 });
        assert_eq!(stats.get("Mo64 S127"), Summary { min: 0.5, mean: 0.5, max: 0.5 });
    }

    #[test]
    fn unknown_formula_yields_zeros() {
        let stats = FormulaStatistics::from_pairs([("Mo63 S128", 1.0)]);
        assert_eq!(stats.get("W64 Se128"), Summary::ZERO);
    }

    #[test]
    fn nan_targets_are_ignored() {
        let stats = FormulaStatistics::from_pairs([("A1", f64::NAN), ("A1", 2.0), ("B1", f64::NAN)]);
        assert_eq!(stats.get("A1").mean, 2.0);
        assert_eq!(stats.get("B1"), Summary::ZERO);
    }
}
