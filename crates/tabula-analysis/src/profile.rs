//! Table profiling and the data health score.

use tabula_core::config::AnalysisConfig;
use tabula_core::{ColumnProfile, DataTable, Dtype, NumericSummary, Profile, TopValue};

use crate::dtype::infer_dtype;

/// How many top values to keep per categorical column.
const TOP_VALUES: usize = 5;

/// Build the full profile for a table.
pub fn build_profile(table: &DataTable, config: &AnalysisConfig) -> Profile {
    let rows = table.n_rows();
    let cols = table.n_cols();
    let total_cells = rows * cols;

    let columns: Vec<ColumnProfile> = table
        .columns()
        .iter()
        .map(|col| {
            let dtype = infer_dtype(col, config.max_categories);
            let numeric = if dtype == Dtype::Numeric {
                numeric_summary(&col.numeric_values())
            } else {
                None
            };
            let top_values = if matches!(dtype, Dtype::Categorical | Dtype::Boolean) {
                col.value_counts()
                    .into_iter()
                    .take(TOP_VALUES)
                    .map(|(value, count)| TopValue { value, count })
                    .collect()
            } else {
                Vec::new()
            };
            ColumnProfile {
                name: col.name().to_string(),
                dtype,
                null_count: col.null_count(),
                distinct_count: col.distinct_count(),
                numeric,
                top_values,
            }
        })
        .collect();

    let null_cells: usize = columns.iter().map(|c| c.null_count).sum();
    let non_null_cells = total_cells.saturating_sub(null_cells);
    let completeness_percentage = if total_cells == 0 {
        0.0
    } else {
        round1(100.0 * non_null_cells as f64 / total_cells as f64)
    };
    let duplicate_rows = table.duplicate_row_count();

    let data_health_score = health_score(rows, total_cells, null_cells, duplicate_rows, &columns);

    Profile {
        rows,
        cols,
        columns,
        total_cells,
        non_null_cells,
        completeness_percentage,
        duplicate_rows,
        memory_usage_bytes: table.estimated_memory_bytes(),
        data_health_score,
    }
}

/// Data health score in [0, 100].
///
/// Starts at 100; loses the missing-cell percentage, half the duplicate-row
/// percentage, and 5 points per column that is more than half missing; gains
/// 5 points when the table mixes numeric and categorical columns.
pub fn health_score(
    rows: usize,
    total_cells: usize,
    null_cells: usize,
    duplicate_rows: usize,
    columns: &[ColumnProfile],
) -> f64 {
    if rows == 0 || total_cells == 0 {
        return 0.0;
    }
    let missing_pct = 100.0 * null_cells as f64 / total_cells as f64;
    let duplicate_pct = 100.0 * duplicate_rows as f64 / rows as f64;
    let sparse_columns = columns
        .iter()
        .filter(|c| c.null_count as f64 > rows as f64 / 2.0)
        .count();

    let has_numeric = columns.iter().any(|c| c.dtype == Dtype::Numeric);
    let has_categorical = columns
        .iter()
        .any(|c| matches!(c.dtype, Dtype::Categorical | Dtype::Boolean));
    let mix_bonus = if has_numeric && has_categorical { 5.0 } else { 0.0 };

    let score =
        100.0 - missing_pct - 0.5 * duplicate_pct - 5.0 * sparse_columns as f64 + mix_bonus;
    round1(score.clamp(0.0, 100.0))
}

fn numeric_summary(values: &[f64]) -> Option<NumericSummary> {
    if values.is_empty() {
        return None;
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let std = if values.len() < 2 {
        0.0
    } else {
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64).sqrt()
    };
    Some(NumericSummary { min, max, mean, std })
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::Column;

    fn config() -> AnalysisConfig {
        AnalysisConfig::default()
    }

    fn table(columns: Vec<(&str, Vec<Option<&str>>)>) -> DataTable {
        DataTable::new(
            columns
                .into_iter()
                .map(|(name, cells)| {
                    Column::new(name, cells.into_iter().map(|c| c.map(String::from)).collect())
                })
                .collect(),
        )
        .unwrap()
    }

    fn clean_table() -> DataTable {
        table(vec![
            ("Age", vec![Some("22"), Some("38"), Some("26"), Some("35")]),
            (
                "Sex",
                vec![Some("male"), Some("female"), Some("female"), Some("male")],
            ),
        ])
    }

    #[test]
    fn test_profile_shape_and_counts() {
        let p = build_profile(&clean_table(), &config());
        assert_eq!(p.rows, 4);
        assert_eq!(p.cols, 2);
        assert_eq!(p.total_cells, 8);
        assert_eq!(p.non_null_cells, 8);
        assert_eq!(p.completeness_percentage, 100.0);
        assert_eq!(p.duplicate_rows, 0);
    }

    #[test]
    fn test_profile_dtypes_and_stats() {
        let p = build_profile(&clean_table(), &config());
        let age = p.column("Age").unwrap();
        assert_eq!(age.dtype, Dtype::Numeric);
        let stats = age.numeric.as_ref().unwrap();
        assert_eq!(stats.min, 22.0);
        assert_eq!(stats.max, 38.0);

        let sex = p.column("Sex").unwrap();
        assert_eq!(sex.dtype, Dtype::Categorical);
        assert_eq!(sex.top_values.len(), 2);
    }

    #[test]
    fn test_health_score_clean_mixed_table() {
        let p = build_profile(&clean_table(), &config());
        // No missing, no duplicates, mixed types: 100 + 5 clamps to 100.
        assert_eq!(p.data_health_score, 100.0);
    }

    #[test]
    fn test_health_score_bounded() {
        // A pathological table: one column 100% missing, all rows duplicate.
        let t = table(vec![("A", vec![None, None, None, None])]);
        let p = build_profile(&t, &config());
        assert!((0.0..=100.0).contains(&p.data_health_score));
    }

    #[test]
    fn test_health_score_monotone_in_missingness() {
        let few_missing = table(vec![
            ("Age", vec![Some("22"), Some("38"), Some("26"), None]),
            ("Sex", vec![Some("m"), Some("f"), Some("f"), Some("m")]),
        ]);
        let more_missing = table(vec![
            ("Age", vec![Some("22"), None, None, None]),
            ("Sex", vec![Some("m"), Some("f"), Some("f"), Some("m")]),
        ]);
        let p1 = build_profile(&few_missing, &config());
        let p2 = build_profile(&more_missing, &config());
        assert!(p2.data_health_score <= p1.data_health_score);
    }

    #[test]
    fn test_health_score_monotone_in_duplicates() {
        let no_dups = table(vec![(
            "A",
            vec![Some("1"), Some("2"), Some("3"), Some("4")],
        )]);
        let with_dups = table(vec![(
            "A",
            vec![Some("1"), Some("1"), Some("1"), Some("4")],
        )]);
        let p1 = build_profile(&no_dups, &config());
        let p2 = build_profile(&with_dups, &config());
        assert!(p2.data_health_score <= p1.data_health_score);
    }

    #[test]
    fn test_health_score_sparse_column_penalty() {
        let dense = table(vec![
            ("A", vec![Some("1"), Some("2"), Some("3"), Some("4")]),
            ("B", vec![Some("x"), Some("y"), Some("x"), Some("y")]),
        ]);
        // B is 75% missing: sparse-column penalty applies.
        let sparse = table(vec![
            ("A", vec![Some("1"), Some("2"), Some("3"), Some("4")]),
            ("B", vec![Some("x"), None, None, None]),
        ]);
        let p1 = build_profile(&dense, &config());
        let p2 = build_profile(&sparse, &config());
        assert!(p1.data_health_score - p2.data_health_score >= 5.0);
    }

    #[test]
    fn test_health_score_zero_rows_is_zero() {
        assert_eq!(health_score(0, 0, 0, 0, &[]), 0.0);
    }

    #[test]
    fn test_entirely_null_column_profile() {
        let t = table(vec![
            ("Empty", vec![None, None, None]),
            ("A", vec![Some("1"), Some("2"), Some("3")]),
        ]);
        let p = build_profile(&t, &config());
        let empty = p.column("Empty").unwrap();
        assert_eq!(empty.dtype, Dtype::Categorical);
        assert_eq!(empty.distinct_count, 0);
        assert_eq!(empty.null_count, 3);
    }

    #[test]
    fn test_single_cell_table_profiles() {
        let t = table(vec![("Only", vec![Some("42")])]);
        let p = build_profile(&t, &config());
        assert_eq!(p.rows, 1);
        assert_eq!(p.cols, 1);
        assert_eq!(p.column("Only").unwrap().dtype, Dtype::Numeric);
    }
}
