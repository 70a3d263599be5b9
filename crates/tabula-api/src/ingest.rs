//! CSV ingestion: raw upload bytes to a `DataTable`.

use tabula_core::{Column, DataTable, Result, TabulaError};

/// Parse CSV bytes into a table. The first record is the header row; blank
/// cells become nulls. Short records are padded with nulls rather than
/// rejected.
pub fn parse_csv(bytes: &[u8]) -> Result<DataTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| TabulaError::Validation(format!("invalid CSV header: {}", e)))?
        .clone();
    if headers.is_empty() {
        return Err(TabulaError::Validation("CSV has no header row".to_string()));
    }

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record =
            record.map_err(|e| TabulaError::Validation(format!("invalid CSV record: {}", e)))?;
        for (i, column) in cells.iter_mut().enumerate() {
            let value = record
                .get(i)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            column.push(value);
        }
    }

    let columns: Vec<Column> = headers
        .iter()
        .zip(cells)
        .map(|(name, cells)| Column::new(name.trim(), cells))
        .collect();
    DataTable::new(columns)
}
