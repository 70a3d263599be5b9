//! Column-ordered in-memory table.
//!
//! Cells are stored as optional strings exactly as ingested; typed views
//! (numeric parses, value counts) are computed on demand. A `DataTable` is
//! immutable after construction, which is what lets sessions hand out cheap
//! shared snapshots.

use std::collections::HashMap;
use std::collections::HashSet;

use crate::error::{Result, TabulaError};

/// A single named column of optional string cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    cells: Vec<Option<String>>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Option<String>] {
        &self.cells
    }

    /// Count of missing cells. Whitespace-only cells count as missing.
    pub fn null_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| match c {
                None => true,
                Some(s) => s.trim().is_empty(),
            })
            .count()
    }

    /// Iterate over present, non-blank cell values.
    pub fn present_values(&self) -> impl Iterator<Item = &str> {
        self.cells
            .iter()
            .filter_map(|c| c.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Number of distinct present values.
    pub fn distinct_count(&self) -> usize {
        self.present_values().collect::<HashSet<_>>().len()
    }

    /// Parse every present cell as a number, skipping failures.
    pub fn numeric_values(&self) -> Vec<f64> {
        self.present_values().filter_map(parse_numeric).collect()
    }

    /// Value frequencies sorted by descending count, ties broken by value.
    ///
    /// The tie-break keeps the ordering deterministic so downstream chart
    /// payloads and summaries are byte-stable.
    pub fn value_counts(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for v in self.present_values() {
            *counts.entry(v).or_insert(0) += 1;
        }
        let mut out: Vec<(String, usize)> =
            counts.into_iter().map(|(v, c)| (v.to_string(), c)).collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out
    }
}

/// Parse a cell as a number, tolerating surrounding whitespace, thousands
/// separators, and a leading currency sign.
pub fn parse_numeric(s: &str) -> Option<f64> {
    let trimmed = s.trim().trim_start_matches(['$', '€', '£']);
    if trimmed.is_empty() {
        return None;
    }
    let cleaned: String = trimmed.chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// A rectangular, column-ordered table.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    columns: Vec<Column>,
    n_rows: usize,
}

impl DataTable {
    /// Build a table from columns, validating rectangular shape and unique
    /// column names.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let n_rows = columns.first().map(|c| c.len()).unwrap_or(0);
        for col in &columns {
            if col.len() != n_rows {
                return Err(TabulaError::Validation(format!(
                    "column '{}' has {} cells, expected {}",
                    col.name(),
                    col.len(),
                    n_rows
                )));
            }
            if col.name().trim().is_empty() {
                return Err(TabulaError::Validation(
                    "column names must be non-empty".to_string(),
                ));
            }
        }
        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.name()) {
                return Err(TabulaError::Validation(format!(
                    "duplicate column name '{}'",
                    col.name()
                )));
            }
        }
        Ok(Self { columns, n_rows })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    /// Look up a column by exact name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Number of rows that are exact duplicates of an earlier row.
    pub fn duplicate_row_count(&self) -> usize {
        let mut seen: HashSet<Vec<Option<&str>>> = HashSet::new();
        let mut duplicates = 0;
        for i in 0..self.n_rows {
            let row: Vec<Option<&str>> = self
                .columns
                .iter()
                .map(|c| c.cells()[i].as_deref())
                .collect();
            if !seen.insert(row) {
                duplicates += 1;
            }
        }
        duplicates
    }

    /// Rough in-memory footprint of the cell data in bytes.
    pub fn estimated_memory_bytes(&self) -> usize {
        self.columns
            .iter()
            .map(|c| {
                c.cells()
                    .iter()
                    .map(|cell| {
                        std::mem::size_of::<Option<String>>()
                            + cell.as_ref().map(|s| s.capacity()).unwrap_or(0)
                    })
                    .sum::<usize>()
                    + c.name().len()
            })
            .sum()
    }
}
