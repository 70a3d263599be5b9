//! The chart battery.
//!
//! Built at upload time: an overview chart, domain charts for well-known
//! column names, numeric histograms, categorical donuts, and a correlation
//! heatmap when the table has enough numeric columns. The same builders are
//! reused by the chat router for on-demand charts.

use std::collections::BTreeSet;

use tabula_core::config::AnalysisConfig;
use tabula_core::table::parse_numeric;
use tabula_core::{Chart, ChartKind, DataTable, Dtype, Profile};
use tabula_insight::stats;

use crate::backend::{ChartBackend, ChartSpec};

/// Build the full battery for a freshly analyzed table.
pub fn build_charts(
    table: &DataTable,
    profile: &Profile,
    config: &AnalysisConfig,
    backend: &dyn ChartBackend,
) -> Vec<Chart> {
    let mut charts = Vec::new();
    let mut used: BTreeSet<String> = BTreeSet::new();

    charts.push(overview_chart(profile, backend));

    // Domain charts first: they claim their columns so the generic passes
    // skip them.
    for col in profile.columns.iter() {
        if let Some(chart) = domain_chart(table, &col.name, config, backend) {
            used.insert(col.name.clone());
            charts.push(chart);
        }
    }
    if let Some(chart) = family_size_chart(table, backend) {
        used.insert("SibSp".to_string());
        used.insert("Parch".to_string());
        charts.push(chart);
    }

    // Numeric histograms, widest spread first.
    let mut numeric: Vec<_> = profile
        .columns
        .iter()
        .filter(|c| c.dtype == Dtype::Numeric && !used.contains(&c.name))
        .collect();
    numeric.sort_by(|a, b| {
        let sa = a.numeric.as_ref().map(|n| n.std).unwrap_or(0.0);
        let sb = b.numeric.as_ref().map(|n| n.std).unwrap_or(0.0);
        sb.partial_cmp(&sa)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    for col in numeric.into_iter().take(config.max_histograms) {
        if let Some(chart) = histogram_chart(table, &col.name, config, backend) {
            used.insert(col.name.clone());
            charts.push(chart);
        }
    }

    // Categorical donuts for usable cardinalities.
    for col in profile.columns.iter() {
        if used.contains(&col.name) {
            continue;
        }
        if matches!(col.dtype, Dtype::Categorical | Dtype::Boolean)
            && col.distinct_count > 1
            && col.distinct_count <= config.max_categories
        {
            if let Some(chart) = categorical_chart(table, &col.name, backend) {
                used.insert(col.name.clone());
                charts.push(chart);
            }
        }
    }

    if let Some(chart) = correlation_chart(table, profile, config, backend) {
        charts.push(chart);
    }

    charts
}

/// Null-ratio bar over every column.
pub fn overview_chart(profile: &Profile, backend: &dyn ChartBackend) -> Chart {
    let labels: Vec<String> = profile.columns.iter().map(|c| c.name.clone()).collect();
    let values: Vec<f64> = profile
        .columns
        .iter()
        .map(|c| {
            if profile.rows == 0 {
                0.0
            } else {
                100.0 * c.null_count as f64 / profile.rows as f64
            }
        })
        .collect();
    let spec = ChartSpec::Bar {
        title: "Dataset Overview: Missing Data by Column".to_string(),
        x_title: "Column".to_string(),
        y_title: "Missing (%)".to_string(),
        labels: labels.clone(),
        values,
    };
    Chart {
        kind: ChartKind::Overview,
        title: "Dataset Overview: Missing Data by Column".to_string(),
        columns: labels,
        chart_json: backend.render(&spec),
        insights: None,
    }
}

/// Histogram for a numeric column.
pub fn histogram_chart(
    table: &DataTable,
    name: &str,
    config: &AnalysisConfig,
    backend: &dyn ChartBackend,
) -> Option<Chart> {
    let values = table.column(name)?.numeric_values();
    if values.is_empty() {
        return None;
    }
    let title = format!("{} Distribution", name);
    let kind = match domain_kind(name) {
        Some(k @ (ChartKind::Age | ChartKind::Fare)) => k,
        _ => ChartKind::Histogram,
    };
    let spec = ChartSpec::Histogram {
        title: title.clone(),
        column: name.to_string(),
        values,
        bins: config.histogram_bins,
    };
    Some(Chart {
        kind,
        title,
        columns: vec![name.to_string()],
        chart_json: backend.render(&spec),
        insights: None,
    })
}

/// Donut for a categorical column's value counts.
pub fn categorical_chart(
    table: &DataTable,
    name: &str,
    backend: &dyn ChartBackend,
) -> Option<Chart> {
    let counts = table.column(name)?.value_counts();
    if counts.is_empty() {
        return None;
    }
    let kind = domain_kind(name).unwrap_or(ChartKind::Categorical);
    let (labels, values): (Vec<String>, Vec<u64>) = counts
        .into_iter()
        .map(|(v, c)| (display_label(kind, &v), c as u64))
        .unzip();
    let title = match kind {
        ChartKind::Survival => "Survival Breakdown".to_string(),
        ChartKind::Gender => "Gender Split".to_string(),
        ChartKind::Embarkation => "Embarkation Port Breakdown".to_string(),
        _ => format!("{} Breakdown", name),
    };
    let spec = ChartSpec::Donut {
        title: title.clone(),
        labels,
        values,
    };
    Some(Chart {
        kind,
        title,
        columns: vec![name.to_string()],
        chart_json: backend.render(&spec),
        insights: None,
    })
}

/// Bar of counts per class for a low-cardinality ordinal column.
pub fn class_chart(table: &DataTable, name: &str, backend: &dyn ChartBackend) -> Option<Chart> {
    let counts = table.column(name)?.value_counts();
    if counts.is_empty() {
        return None;
    }
    let mut sorted = counts;
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    let (labels, values): (Vec<String>, Vec<f64>) = sorted
        .into_iter()
        .map(|(v, c)| (v, c as f64))
        .unzip();
    let title = "Passenger Class Distribution".to_string();
    let spec = ChartSpec::Bar {
        title: title.clone(),
        x_title: name.to_string(),
        y_title: "Count".to_string(),
        labels,
        values,
    };
    Some(Chart {
        kind: ChartKind::Class,
        title,
        columns: vec![name.to_string()],
        chart_json: backend.render(&spec),
        insights: None,
    })
}

/// The natural chart for one resolved column: domain shape when the name is
/// well known, else histogram for numerics and donut for categoricals.
pub fn column_chart(
    table: &DataTable,
    profile: &Profile,
    name: &str,
    config: &AnalysisConfig,
    backend: &dyn ChartBackend,
) -> Option<Chart> {
    if let Some(chart) = domain_chart(table, name, config, backend) {
        return Some(chart);
    }
    let col = profile.column(name)?;
    match col.dtype {
        Dtype::Numeric => histogram_chart(table, name, config, backend),
        Dtype::Categorical | Dtype::Boolean => categorical_chart(table, name, backend),
        // Datetime and free text get a frequency donut of their top values
        // only when the cardinality is sane; otherwise nothing.
        _ if col.distinct_count > 1 && col.distinct_count <= config.max_categories => {
            categorical_chart(table, name, backend)
        }
        _ => None,
    }
}

/// Domain chart for a single well-known column name, if any.
fn domain_chart(
    table: &DataTable,
    name: &str,
    config: &AnalysisConfig,
    backend: &dyn ChartBackend,
) -> Option<Chart> {
    match domain_kind(name)? {
        ChartKind::Survival | ChartKind::Gender | ChartKind::Embarkation => {
            categorical_chart(table, name, backend)
        }
        ChartKind::Age | ChartKind::Fare => histogram_chart(table, name, config, backend),
        ChartKind::Class => class_chart(table, name, backend),
        _ => None,
    }
}

/// Family size bar from sibling/spouse and parent/child counts, when both
/// columns exist.
pub fn family_size_chart(table: &DataTable, backend: &dyn ChartBackend) -> Option<Chart> {
    let sibsp = find_column(table, &["sibsp", "siblings_spouses"])?;
    let parch = find_column(table, &["parch", "parents_children"])?;
    let col_a = table.column(&sibsp)?;
    let col_b = table.column(&parch)?;

    let mut counts: std::collections::BTreeMap<u64, u64> = std::collections::BTreeMap::new();
    for (a, b) in col_a.cells().iter().zip(col_b.cells().iter()) {
        let (Some(va), Some(vb)) = (a.as_deref(), b.as_deref()) else {
            continue;
        };
        if let (Some(x), Some(y)) = (parse_numeric(va), parse_numeric(vb)) {
            let size = (x + y + 1.0).round() as u64;
            *counts.entry(size).or_insert(0) += 1;
        }
    }
    if counts.is_empty() {
        return None;
    }

    let (labels, values): (Vec<String>, Vec<f64>) = counts
        .into_iter()
        .map(|(size, count)| (size.to_string(), count as f64))
        .unzip();
    let title = "Family Size Distribution".to_string();
    let spec = ChartSpec::Bar {
        title: title.clone(),
        x_title: "Family Size".to_string(),
        y_title: "Count".to_string(),
        labels,
        values,
    };
    Some(Chart {
        kind: ChartKind::FamilySize,
        title,
        columns: vec![sibsp, parch],
        chart_json: backend.render(&spec),
        insights: None,
    })
}

/// Pairwise Pearson heatmap over all numeric columns.
pub fn correlation_chart(
    table: &DataTable,
    profile: &Profile,
    config: &AnalysisConfig,
    backend: &dyn ChartBackend,
) -> Option<Chart> {
    let numeric: Vec<String> = profile
        .columns
        .iter()
        .filter(|c| c.dtype == Dtype::Numeric)
        .map(|c| c.name.clone())
        .collect();
    if numeric.len() < config.min_numeric_for_correlation {
        return None;
    }

    let series: Vec<Vec<Option<f64>>> = numeric
        .iter()
        .map(|name| {
            table
                .column(name)
                .map(|c| {
                    c.cells()
                        .iter()
                        .map(|cell| cell.as_deref().and_then(parse_numeric))
                        .collect()
                })
                .unwrap_or_default()
        })
        .collect();

    let n = numeric.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i == j {
                matrix[i][j] = 1.0;
                continue;
            }
            let mut xs = Vec::new();
            let mut ys = Vec::new();
            for (a, b) in series[i].iter().zip(series[j].iter()) {
                if let (Some(x), Some(y)) = (a, b) {
                    xs.push(*x);
                    ys.push(*y);
                }
            }
            matrix[i][j] = stats::pearson(&xs, &ys).unwrap_or(0.0);
        }
    }

    let title = "Correlation Heatmap".to_string();
    let spec = ChartSpec::Heatmap {
        title: title.clone(),
        axis: numeric.clone(),
        matrix,
    };
    Some(Chart {
        kind: ChartKind::Correlation,
        title,
        columns: numeric,
        chart_json: backend.render(&spec),
        insights: None,
    })
}

/// Map a well-known column name to its domain chart kind.
pub fn domain_kind(name: &str) -> Option<ChartKind> {
    match name.to_lowercase().as_str() {
        "survived" | "survival" => Some(ChartKind::Survival),
        "sex" | "gender" => Some(ChartKind::Gender),
        "age" => Some(ChartKind::Age),
        "fare" | "price" => Some(ChartKind::Fare),
        "pclass" | "class" | "passenger_class" => Some(ChartKind::Class),
        "embarked" | "embarkation" | "port" => Some(ChartKind::Embarkation),
        _ => None,
    }
}

fn display_label(kind: ChartKind, value: &str) -> String {
    if kind == ChartKind::Survival {
        match value {
            "0" => return "Did Not Survive".to_string(),
            "1" => return "Survived".to_string(),
            _ => {}
        }
    }
    value.to_string()
}

fn find_column(table: &DataTable, candidates: &[&str]) -> Option<String> {
    table
        .column_names()
        .iter()
        .find(|name| candidates.contains(&name.to_lowercase().as_str()))
        .map(|s| s.to_string())
}
