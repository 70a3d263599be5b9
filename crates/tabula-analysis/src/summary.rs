//! Deterministic dataset summary text.
//!
//! The summary is assembled from the profile alone with fixed formatting,
//! so the same table always produces the same bytes.

use tabula_core::{Dtype, Profile};

/// Quality label for a health score.
pub fn quality_label(score: f64) -> &'static str {
    if score >= 85.0 {
        "excellent"
    } else if score >= 70.0 {
        "good"
    } else if score >= 50.0 {
        "fair"
    } else {
        "poor"
    }
}

/// Render the markdown summary for a profile.
pub fn generate_summary(profile: &Profile) -> String {
    let mut out = String::new();

    out.push_str("# Dataset Analysis Summary\n\n");
    out.push_str(&format!(
        "**Shape:** {} rows x {} columns\n",
        profile.rows, profile.cols
    ));
    out.push_str(&format!(
        "**Data Health Score:** {:.1}/100 ({})\n",
        profile.data_health_score,
        quality_label(profile.data_health_score)
    ));
    out.push_str(&format!(
        "**Completeness:** {:.1}% ({} of {} cells)\n",
        profile.completeness_percentage, profile.non_null_cells, profile.total_cells
    ));
    out.push_str(&format!("**Duplicate rows:** {}\n", profile.duplicate_rows));

    out.push_str("\n## Column Types\n");
    for dtype in [
        Dtype::Numeric,
        Dtype::Categorical,
        Dtype::Datetime,
        Dtype::Boolean,
        Dtype::Text,
    ] {
        let names: Vec<&str> = profile
            .columns
            .iter()
            .filter(|c| c.dtype == dtype)
            .map(|c| c.name.as_str())
            .collect();
        if !names.is_empty() {
            out.push_str(&format!(
                "- {}: {} ({})\n",
                dtype.as_str(),
                names.len(),
                names.join(", ")
            ));
        }
    }

    let notable: Vec<String> = profile
        .columns
        .iter()
        .filter(|c| c.null_count > 0)
        .map(|c| {
            format!(
                "- {}: {} missing ({:.1}%)",
                c.name,
                c.null_count,
                100.0 * c.null_count as f64 / profile.rows.max(1) as f64
            )
        })
        .collect();
    if !notable.is_empty() {
        out.push_str("\n## Missing Data\n");
        for line in notable {
            out.push_str(&line);
            out.push('\n');
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::ColumnProfile;

    fn profile() -> Profile {
        Profile {
            rows: 891,
            cols: 3,
            columns: vec![
                ColumnProfile {
                    name: "Age".to_string(),
                    dtype: Dtype::Numeric,
                    null_count: 177,
                    distinct_count: 88,
                    numeric: None,
                    top_values: vec![],
                },
                ColumnProfile {
                    name: "Fare".to_string(),
                    dtype: Dtype::Numeric,
                    null_count: 0,
                    distinct_count: 248,
                    numeric: None,
                    top_values: vec![],
                },
                ColumnProfile {
                    name: "Sex".to_string(),
                    dtype: Dtype::Categorical,
                    null_count: 0,
                    distinct_count: 2,
                    numeric: None,
                    top_values: vec![],
                },
            ],
            total_cells: 2673,
            non_null_cells: 2496,
            completeness_percentage: 93.4,
            duplicate_rows: 0,
            memory_usage_bytes: 4096,
            data_health_score: 86.4,
        }
    }

    #[test]
    fn test_quality_labels() {
        assert_eq!(quality_label(92.0), "excellent");
        assert_eq!(quality_label(85.0), "excellent");
        assert_eq!(quality_label(75.0), "good");
        assert_eq!(quality_label(55.0), "fair");
        assert_eq!(quality_label(20.0), "poor");
    }

    #[test]
    fn test_summary_contains_key_sections() {
        let s = generate_summary(&profile());
        assert!(s.contains("# Dataset Analysis Summary"));
        assert!(s.contains("**Shape:** 891 rows x 3 columns"));
        assert!(s.contains("86.4/100 (excellent)"));
        assert!(s.contains("- numeric: 2 (Age, Fare)"));
        assert!(s.contains("- categorical: 1 (Sex)"));
        assert!(s.contains("- Age: 177 missing (19.9%)"));
    }

    #[test]
    fn test_summary_is_deterministic() {
        let a = generate_summary(&profile());
        let b = generate_summary(&profile());
        assert_eq!(a, b);
    }

    #[test]
    fn test_summary_omits_empty_sections() {
        let mut p = profile();
        for c in &mut p.columns {
            c.null_count = 0;
        }
        let s = generate_summary(&p);
        assert!(!s.contains("## Missing Data"));
    }
}
