/// One flat feature vector for a single structure.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub id: String,
    pub formula: String,
    /// Values in the column order of the owning [`FeatureTable`].
    pub values: Vec<f64>,
}

/// A set of feature rows sharing one column layout.
///
/// `id` and `formula` are identity columns and are not part of `columns`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureTable {
    pub columns: Vec<String>,
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a column, filling it row by row from `values`.
    ///
    /// Returns `false` and leaves the table untouched if the lengths differ.
    pub fn push_column(&mut self, name: impl Into<String>, values: &[f64]) -> bool {
        if values.len() != self.rows.len() {
            return false;
        }
        self.columns.push(name.into());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.values.push(*value);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> FeatureTable {
        FeatureTable {
            columns: vec!["density".into(), "num_sites".into()],
            rows: vec![
                FeatureRow {
                    id: "a".into(),
                    formula: "Mo1 S2".into(),
                    values: vec![5.0, 3.0],
                },
                FeatureRow {
                    id: "b".into(),
                    formula: "Mo1 S1".into(),
                    values: vec![4.0, 2.0],
                },
            ],
        }
    }

    #[test]
    fn column_index_finds_columns_by_name() {
        let table = table();
        assert_eq!(table.column_index("num_sites"), Some(1));
        assert_eq!(table.column_index("band_gap"), None);
    }

    #[test]
    fn push_column_requires_matching_length() {
        let mut table = table();
        assert!(!table.push_column("band_gap", &[1.0]));
        assert_eq!(table.columns.len(), 2);

        assert!(table.push_column("band_gap", &[1.0, 2.0]));
        assert_eq!(table.rows[1].values, vec![4.0, 2.0, 2.0]);
    }
}
