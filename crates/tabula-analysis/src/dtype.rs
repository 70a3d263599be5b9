//! Column dtype inference.
//!
//! Inference never fails: a column that matches nothing specific falls back
//! to categorical (low cardinality) or text. Heuristics run in a fixed
//! order so the result is deterministic.

use chrono::NaiveDate;

use tabula_core::table::{parse_numeric, Column};
use tabula_core::Dtype;

/// Fraction of present values that must parse for numeric/datetime
/// classification.
const PARSE_THRESHOLD: f64 = 0.8;

/// Distinct-to-present ratio at or under which a column counts as
/// categorical even above the cardinality cap.
const CATEGORICAL_RATIO: f64 = 0.5;

const BOOLEAN_LITERALS: [&str; 6] = ["true", "false", "yes", "no", "t", "f"];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.fZ",
];

/// Infer the dtype of a column.
///
/// Order: boolean literals, numeric parse, datetime parse, cardinality-based
/// categorical, text.
pub fn infer_dtype(column: &Column, max_categories: usize) -> Dtype {
    let values: Vec<&str> = column.present_values().collect();
    if values.is_empty() {
        // An entirely missing column carries no signal; treat it as
        // categorical with zero levels.
        return Dtype::Categorical;
    }
    let n = values.len() as f64;

    if values
        .iter()
        .all(|v| BOOLEAN_LITERALS.contains(&v.to_lowercase().as_str()))
    {
        return Dtype::Boolean;
    }

    let numeric_hits = values.iter().filter(|v| parse_numeric(v).is_some()).count();
    if numeric_hits as f64 / n >= PARSE_THRESHOLD {
        return Dtype::Numeric;
    }

    let datetime_hits = values.iter().filter(|v| parses_as_datetime(v)).count();
    if datetime_hits as f64 / n >= PARSE_THRESHOLD {
        return Dtype::Datetime;
    }

    let distinct = column.distinct_count();
    if distinct <= max_categories || (distinct as f64 / n) <= CATEGORICAL_RATIO {
        return Dtype::Categorical;
    }

    Dtype::Text
}

fn parses_as_datetime(value: &str) -> bool {
    let v = value.trim();
    DATE_FORMATS
        .iter()
        .any(|f| NaiveDate::parse_from_str(v, f).is_ok())
        || DATETIME_FORMATS
            .iter()
            .any(|f| chrono::NaiveDateTime::parse_from_str(v, f).is_ok())
        || chrono::DateTime::parse_from_rfc3339(v).is_ok()
}
