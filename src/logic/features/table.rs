//! Feature Table - Batch input parsed from an uploaded CSV
//!
//! Cells are kept as text until projection so that extra, non-numeric
//! columns (experiment ids, process labels) never fail a request.

use super::layout::FEATURE_LAYOUT;
use super::schema::validate_columns;
use super::vector::FeatureVector;
use crate::logic::error::PipelineError;

/// Parsed CSV: header names plus raw cells.
///
/// Every error position is a 1-based line number in the original text.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    columns: Vec<String>,
    rows: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq)]
struct Record {
    line: usize,
    cells: Vec<String>,
}

impl FeatureTable {
    /// Parse comma separated text. First non-blank line is the header.
    pub fn parse_csv(text: &str) -> Result<Self, PipelineError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let mut lines = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let (header_index, header) = lines
            .next()
            .ok_or_else(|| PipelineError::Input("CSV is empty".to_string()))?;
        let columns = split_record(header, header_index + 1)?;

        let mut rows = Vec::new();
        for (index, line) in lines {
            let line_no = index + 1;
            let cells = split_record(line, line_no)?;
            if cells.len() != columns.len() {
                return Err(PipelineError::Input(format!(
                    "line {}: expected {} fields, found {}",
                    line_no,
                    columns.len(),
                    cells.len()
                )));
            }
            rows.push(Record { line: line_no, cells });
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Project every row onto the canonical feature order.
    ///
    /// Columns are looked up by name, so the file's column order is irrelevant.
    pub fn project(&self) -> Result<Vec<FeatureVector>, PipelineError> {
        validate_columns(&self.columns)?;

        let mut indices = Vec::with_capacity(FEATURE_LAYOUT.len());
        for name in FEATURE_LAYOUT {
            let mut positions = self
                .columns
                .iter()
                .enumerate()
                .filter(|(_, c)| c.as_str() == *name)
                .map(|(i, _)| i);

            // validate_columns guarantees at least one match
            let first = positions.next().unwrap_or_default();
            if positions.next().is_some() {
                return Err(PipelineError::Input(format!(
                    "column '{}' appears more than once",
                    name
                )));
            }
            indices.push(first);
        }

        self.rows
            .iter()
            .map(|record| {
                let mut vector = FeatureVector::new();
                for (slot, (&col, name)) in vector
                    .values
                    .iter_mut()
                    .zip(indices.iter().zip(FEATURE_LAYOUT.iter()))
                {
                    *slot = parse_cell(&record.cells[col], record.line, name)?;
                }
                Ok(vector)
            })
            .collect()
    }
}

/// Parse one numeric cell. Empty, non-numeric and non-finite cells are rejected.
fn parse_cell(cell: &str, line_no: usize, column: &str) -> Result<f32, PipelineError> {
    let value: f32 = cell.trim().parse().map_err(|_| {
        PipelineError::Input(format!(
            "line {}, column '{}': '{}' is not a number",
            line_no, column, cell
        ))
    })?;

    if !value.is_finite() {
        return Err(PipelineError::Input(format!(
            "line {}, column '{}': value must be finite",
            line_no, column
        )));
    }

    Ok(value)
}

/// Split one CSV record. Supports double-quoted fields with `""` escapes.
fn split_record(line: &str, line_no: usize) -> Result<Vec<String>, PipelineError> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.trim_end_matches('\r').chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            ('"', true) => in_quotes = false,
            ('"', false) if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            (',', false) => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            (c, _) => current.push(c),
        }
    }

    if in_quotes {
        return Err(PipelineError::Input(format!(
            "line {}: unterminated quoted field",
            line_no
        )));
    }

    fields.push(current.trim().to_string());
    Ok(fields)
}
