use crate::core::features::table::{FeatureRow, FeatureTable};
use csv::{ReaderBuilder, StringRecord, Writer};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use thiserror::Error;

const ID_COLUMNS: [&str; 2] = ["_id", "id"];
const FORMULA_COLUMN: &str = "formula";
const BAND_GAP_COLUMN: &str = "band_gap";

#[derive(Debug, Error)]
pub enum TableError {
    #[error("File I/O error for '{path}': {source}")]
    Io { path: String, source: io::Error },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("Row {row}: invalid number '{value}' in column '{column}'")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },
}

/// A known band gap for one structure id.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetRecord {
    pub id: String,
    pub band_gap: f64,
}

fn open(path: &Path) -> Result<File, TableError> {
    File::open(path).map_err(|source| TableError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn create(path: &Path) -> Result<File, TableError> {
    File::create(path).map_err(|source| TableError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Parses a numeric field; an empty field denotes NaN.
fn parse_number(record: &StringRecord, index: usize, row: usize, column: &str) -> Result<f64, TableError> {
    let raw = record.get(index).unwrap_or_default().trim();
    if raw.is_empty() {
        return Ok(f64::NAN);
    }
    raw.parse().map_err(|_| TableError::InvalidNumber {
        row,
        column: column.to_string(),
        value: raw.to_string(),
    })
}

fn format_number(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

/// Reads a targets table with an `_id` (or `id`) column and a `band_gap` column.
pub fn read_targets(reader: impl Read) -> Result<Vec<TargetRecord>, TableError> {
    let mut csv = ReaderBuilder::new().from_reader(reader);
    let headers = csv.headers()?.clone();
    let id_index = ID_COLUMNS
        .iter()
        .find_map(|name| headers.iter().position(|h| h == *name))
        .ok_or(TableError::MissingColumn("_id"))?;
    let gap_index = headers
        .iter()
        .position(|h| h == BAND_GAP_COLUMN)
        .ok_or(TableError::MissingColumn(BAND_GAP_COLUMN))?;

    let mut records = Vec::new();
    for (row, record) in csv.records().enumerate() {
        let record = record?;
        records.push(TargetRecord {
            id: record.get(id_index).unwrap_or_default().to_string(),
            band_gap: parse_number(&record, gap_index, row + 1, BAND_GAP_COLUMN)?,
        });
    }
    Ok(records)
}

pub fn read_targets_path(path: &Path) -> Result<Vec<TargetRecord>, TableError> {
    read_targets(open(path)?)
}

/// Reads a feature table whose first two columns are `id` and `formula`.
pub fn read_feature_table(reader: impl Read) -> Result<FeatureTable, TableError> {
    let mut csv = ReaderBuilder::new().from_reader(reader);
    let headers = csv.headers()?.clone();
    if headers.get(0) != Some("id") {
        return Err(TableError::MissingColumn("id"));
    }
    if headers.get(1) != Some(FORMULA_COLUMN) {
        return Err(TableError::MissingColumn(FORMULA_COLUMN));
    }
    let columns: Vec<String> = headers.iter().skip(2).map(str::to_string).collect();

    let mut table = FeatureTable::new(columns);
    for (row, record) in csv.records().enumerate() {
        let record = record?;
        let values = table
            .columns
            .iter()
            .enumerate()
            .map(|(offset, column)| parse_number(&record, offset + 2, row + 1, column))
            .collect::<Result<Vec<_>, _>>()?;
        table.rows.push(FeatureRow {
            id: record.get(0).unwrap_or_default().to_string(),
            formula: record.get(1).unwrap_or_default().to_string(),
            values,
        });
    }
    Ok(table)
}

pub fn read_feature_table_path(path: &Path) -> Result<FeatureTable, TableError> {
    read_feature_table(open(path)?)
}

/// Writes a feature table. NaN values become empty fields.
pub fn write_feature_table(table: &FeatureTable, writer: impl Write) -> Result<(), TableError> {
    let mut csv = Writer::from_writer(writer);
    let header = ["id", FORMULA_COLUMN]
        .into_iter()
        .chain(table.columns.iter().map(String::as_str));
    csv.write_record(header)?;
    for row in &table.rows {
        let mut record = Vec::with_capacity(row.values.len() + 2);
        record.push(row.id.clone());
        record.push(row.formula.clone());
        record.extend(row.values.iter().map(|v| format_number(*v)));
        csv.write_record(&record)?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_feature_table_path(table: &FeatureTable, path: &Path) -> Result<(), TableError> {
    write_feature_table(table, create(path)?)
}

/// Writes the `id,predictions` submission table in the given order.
pub fn write_submission(predictions: &[(String, f64)], writer: impl Write) -> Result<(), TableError> {
    let mut csv = Writer::from_writer(writer);
    csv.write_record(["id", "predictions"])?;
    for (id, value) in predictions {
        csv.write_record([id.as_str(), format_number(*value).as_str()])?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_submission_path(predictions: &[(String, f64)], path: &Path) -> Result<(), TableError> {
    write_submission(predictions, create(path)?)
}
