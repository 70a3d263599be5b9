//! Significance tests attached to chart insights.
//!
//! Test selection is driven by the chart's source columns: chi-square for a
//! categorical column paired with another low-cardinality categorical,
//! Welch's t for a numeric column split by a two-group categorical. When no
//! applicable pair exists the bundle simply carries no test.

use std::collections::BTreeMap;

use tabula_core::{Chart, DataTable, Dtype, Profile, SignificanceTest};

use crate::stats::{chi_square_p, mean, std_dev, t_test_p};

const ALPHA: f64 = 0.05;
const MAX_TEST_LEVELS: usize = 10;

/// Pearson chi-square test of independence between two categorical columns.
///
/// Returns `None` when either column has fewer than two levels, more than
/// [`MAX_TEST_LEVELS`] levels, or there are too few complete pairs.
pub fn chi_square_test(table: &DataTable, a: &str, b: &str) -> Option<SignificanceTest> {
    let col_a = table.column(a)?;
    let col_b = table.column(b)?;

    // Contingency counts over rows where both cells are present. BTreeMaps
    // keep level ordering deterministic.
    let mut counts: BTreeMap<(String, String), usize> = BTreeMap::new();
    let mut row_totals: BTreeMap<String, usize> = BTreeMap::new();
    let mut col_totals: BTreeMap<String, usize> = BTreeMap::new();
    let mut n = 0usize;

    for (cell_a, cell_b) in col_a.cells().iter().zip(col_b.cells().iter()) {
        let (Some(va), Some(vb)) = (cell_a.as_deref(), cell_b.as_deref()) else {
            continue;
        };
        let (va, vb) = (va.trim(), vb.trim());
        if va.is_empty() || vb.is_empty() {
            continue;
        }
        *counts.entry((va.to_string(), vb.to_string())).or_insert(0) += 1;
        *row_totals.entry(va.to_string()).or_insert(0) += 1;
        *col_totals.entry(vb.to_string()).or_insert(0) += 1;
        n += 1;
    }

    let r = row_totals.len();
    let c = col_totals.len();
    if r < 2 || c < 2 || r > MAX_TEST_LEVELS || c > MAX_TEST_LEVELS || n < 10 {
        return None;
    }

    let mut statistic = 0.0;
    for (level_a, total_a) in &row_totals {
        for (level_b, total_b) in &col_totals {
            let expected = (*total_a as f64) * (*total_b as f64) / n as f64;
            if expected <= 0.0 {
                return None;
            }
            let observed = *counts
                .get(&(level_a.clone(), level_b.clone()))
                .unwrap_or(&0) as f64;
            statistic += (observed - expected).powi(2) / expected;
        }
    }

    let df = (r - 1) * (c - 1);
    let p_value = chi_square_p(statistic, df);
    let significant = p_value < ALPHA;

    Some(SignificanceTest {
        test: "chi-square".to_string(),
        p_value,
        result: result_label(significant),
        interpretation: if significant {
            format!(
                "{} and {} show a statistically significant association (chi2 = {:.2}, df = {}).",
                a, b, statistic, df
            )
        } else {
            format!(
                "No significant association detected between {} and {} (chi2 = {:.2}, df = {}).",
                a, b, statistic, df
            )
        },
    })
}

/// Welch's t-test of a numeric column split by a two-group categorical.
pub fn welch_t_test(table: &DataTable, numeric: &str, group: &str) -> Option<SignificanceTest> {
    let num_col = table.column(numeric)?;
    let group_col = table.column(group)?;

    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (value, label) in num_col.cells().iter().zip(group_col.cells().iter()) {
        let (Some(v), Some(l)) = (value.as_deref(), label.as_deref()) else {
            continue;
        };
        let l = l.trim();
        if l.is_empty() {
            continue;
        }
        if let Some(parsed) = tabula_core::table::parse_numeric(v) {
            groups.entry(l.to_string()).or_default().push(parsed);
        }
    }

    if groups.len() != 2 {
        return None;
    }
    let mut iter = groups.into_iter();
    let (label_a, a) = iter.next()?;
    let (label_b, b) = iter.next()?;
    if a.len() < 2 || b.len() < 2 {
        return None;
    }

    let (ma, mb) = (mean(&a), mean(&b));
    let (sa, sb) = (std_dev(&a), std_dev(&b));
    let se = (sa.powi(2) / a.len() as f64 + sb.powi(2) / b.len() as f64).sqrt();
    if se == 0.0 {
        return None;
    }
    let statistic = (ma - mb) / se;
    let p_value = t_test_p(statistic);
    let significant = p_value < ALPHA;

    Some(SignificanceTest {
        test: "welch-t".to_string(),
        p_value,
        result: result_label(significant),
        interpretation: if significant {
            format!(
                "Mean {} differs significantly between {} ({:.2}) and {} ({:.2}).",
                numeric, label_a, ma, label_b, mb
            )
        } else {
            format!(
                "Mean {} does not differ significantly between {} ({:.2}) and {} ({:.2}).",
                numeric, label_a, ma, label_b, mb
            )
        },
    })
}

/// Pick and run the applicable test for a chart, if any.
pub fn select_test(table: &DataTable, profile: &Profile, chart: &Chart) -> Option<SignificanceTest> {
    let primary = chart.columns.first()?;
    let primary_profile = profile.column(primary)?;

    match primary_profile.dtype {
        Dtype::Categorical | Dtype::Boolean => {
            let partner = test_partner(profile, primary, &[Dtype::Categorical, Dtype::Boolean])?;
            chi_square_test(table, primary, &partner)
        }
        Dtype::Numeric => {
            // A two-group categorical makes a t-test meaningful.
            let partner = profile
                .columns
                .iter()
                .find(|c| {
                    c.name != *primary
                        && matches!(c.dtype, Dtype::Categorical | Dtype::Boolean)
                        && c.distinct_count == 2
                })
                .map(|c| c.name.clone())?;
            welch_t_test(table, primary, &partner)
        }
        _ => None,
    }
}

/// First other column of an allowed dtype with usable cardinality, binary
/// columns preferred (they usually encode the outcome of interest).
fn test_partner(profile: &Profile, exclude: &str, dtypes: &[Dtype]) -> Option<String> {
    let candidates: Vec<_> = profile
        .columns
        .iter()
        .filter(|c| {
            c.name != exclude
                && dtypes.contains(&c.dtype)
                && c.distinct_count >= 2
                && c.distinct_count <= MAX_TEST_LEVELS
        })
        .collect();
    candidates
        .iter()
        .find(|c| c.distinct_count == 2)
        .or_else(|| candidates.first())
        .map(|c| c.name.clone())
}

fn result_label(significant: bool) -> String {
    if significant {
        "significant".to_string()
    } else {
        "not significant".to_string()
    }
}
