//! Local aggregate answers.
//!
//! A small family of query shapes is computed directly from the table:
//! row counts, column counts, mean/min/max, and "average X by Y" group-bys.
//! Anything else returns `None` and is delegated to the language model.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use tabula_core::{DataTable, Profile, QueryResponse};

use crate::columns::resolve;

struct AggregatePatterns {
    row_count: Regex,
    mean: Regex,
    min_max: Regex,
    count_of: Regex,
}

static PATTERNS: LazyLock<AggregatePatterns> = LazyLock::new(|| AggregatePatterns {
    row_count: Regex::new(
        r"(?i)\b(?:how many|number of|count of)\s+(?:rows|records|entries)\b|\brow count\b",
    )
    .unwrap(),
    mean: Regex::new(r"(?i)\b(?:average|mean)\s+(?:of\s+|the\s+)?(\w+)(?:\s+by\s+(\w+))?").unwrap(),
    min_max: Regex::new(
        r"(?i)\b(max|maximum|highest|largest|min|minimum|lowest|smallest)\s+(?:of\s+|the\s+)?(\w+)",
    )
    .unwrap(),
    count_of: Regex::new(r"(?i)\bhow many\s+(\w+)").unwrap(),
});

/// Try to answer a query from the table alone.
pub fn answer(query: &str, table: &DataTable, profile: &Profile) -> Option<QueryResponse> {
    let names = table.column_names();

    if PATTERNS.row_count.is_match(query) {
        return Some(QueryResponse::text(format!(
            "The dataset has {} rows and {} columns.",
            profile.rows, profile.cols
        )));
    }

    if let Some(caps) = PATTERNS.mean.captures(query) {
        let reference = caps.get(1).map(|m| m.as_str())?;
        let column = resolve(&names, reference)?;
        let values = table.column(&column)?.numeric_values();
        if values.is_empty() {
            return Some(QueryResponse::text(format!(
                "Column '{}' has no numeric values to average.",
                column
            )));
        }
        if let Some(group_ref) = caps.get(2).map(|m| m.as_str()) {
            if let Some(group) = resolve(&names, group_ref) {
                return group_means(table, &column, &group);
            }
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        return Some(QueryResponse::text(format!(
            "The average {} is {:.2}.",
            column, mean
        )));
    }

    if let Some(caps) = PATTERNS.min_max.captures(query) {
        let word = caps.get(1)?.as_str().to_lowercase();
        let reference = caps.get(2)?.as_str();
        let column = resolve(&names, reference)?;
        let values = table.column(&column)?.numeric_values();
        if values.is_empty() {
            return None;
        }
        let wants_max = matches!(word.as_str(), "max" | "maximum" | "highest" | "largest");
        let value = if wants_max {
            values.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
        } else {
            values.iter().cloned().fold(f64::INFINITY, f64::min)
        };
        return Some(QueryResponse::text(format!(
            "The {} {} is {:.2}.",
            if wants_max { "maximum" } else { "minimum" },
            column,
            value
        )));
    }

    if let Some(caps) = PATTERNS.count_of.captures(query) {
        let reference = caps.get(1)?.as_str();
        if let Some(column) = resolve(&names, reference) {
            let col = table.column(&column)?;
            return Some(QueryResponse::text(format!(
                "Column '{}' has {} non-null values out of {} rows.",
                column,
                col.len() - col.null_count(),
                profile.rows
            )));
        }
        // "how many passengers" and friends: a plain row count.
        return Some(QueryResponse::text(format!(
            "The dataset has {} rows and {} columns.",
            profile.rows, profile.cols
        )));
    }

    None
}

/// Per-group means, groups listed in lexical order for stable output.
fn group_means(table: &DataTable, column: &str, group: &str) -> Option<QueryResponse> {
    let values = table.column(column)?;
    let groups = table.column(group)?;

    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for (value, label) in values.cells().iter().zip(groups.cells().iter()) {
        let (Some(v), Some(l)) = (value.as_deref(), label.as_deref()) else {
            continue;
        };
        let l = l.trim();
        if l.is_empty() {
            continue;
        }
        if let Some(parsed) = tabula_core::table::parse_numeric(v) {
            let entry = sums.entry(l.to_string()).or_insert((0.0, 0));
            entry.0 += parsed;
            entry.1 += 1;
        }
    }
    if sums.is_empty() {
        return None;
    }

    let parts: Vec<String> = sums
        .into_iter()
        .map(|(label, (sum, count))| format!("{}: {:.2}", label, sum / count as f64))
        .collect();
    Some(QueryResponse::text(format!(
        "Average {} by {}: {}.",
        column,
        group,
        parts.join(", ")
    )))
}
