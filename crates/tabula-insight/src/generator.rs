//! Per-chart insight assembly.
//!
//! The deterministic layer always runs and always succeeds. The narrative
//! layer is best-effort: any collaborator failure flags the bundle as
//! partial and the chart ships without narrative text.

use std::sync::Arc;
use std::time::Duration;

use tabula_core::{Chart, DataTable, Dtype, InsightBundle, Profile};
use tabula_llm::{complete_with_timeout, LanguageModel};

use crate::narrative;
use crate::significance;
use crate::stats;

pub struct InsightGenerator {
    model: Option<Arc<dyn LanguageModel>>,
    timeout: Duration,
}

impl InsightGenerator {
    pub fn new(model: Option<Arc<dyn LanguageModel>>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    /// A generator with no narrative layer. Output is fully deterministic.
    pub fn deterministic() -> Self {
        Self {
            model: None,
            timeout: Duration::from_secs(10),
        }
    }

    /// Build the insight bundle for one chart. Never fails; the worst case
    /// is a deterministic-only bundle with `insights_partial` set.
    pub async fn generate(&self, table: &DataTable, profile: &Profile, chart: &Chart) -> InsightBundle {
        let mut bundle = InsightBundle::default();

        for name in &chart.columns {
            let Some(col_profile) = profile.column(name) else {
                continue;
            };
            match col_profile.dtype {
                Dtype::Numeric => self.numeric_insights(table, name, &mut bundle),
                Dtype::Categorical | Dtype::Boolean => {
                    self.categorical_insights(table, name, &mut bundle)
                }
                _ => {}
            }
        }

        if chart.columns.len() >= 2 {
            self.correlation_insights(table, profile, chart, &mut bundle);
        }

        bundle.statistical_significance = significance::select_test(table, profile, chart);
        if let Some(test) = &bundle.statistical_significance {
            if test.result == "significant" {
                bundle
                    .business_recommendations
                    .push(format!("Investigate the drivers behind: {}", test.interpretation));
            }
        }
        self.quality_recommendations(profile, chart, &mut bundle);

        if let Some(model) = &self.model {
            match self.narrate(model.as_ref(), profile, chart, &bundle.key_findings).await {
                Ok((findings, recommendations)) => {
                    bundle.key_findings.extend(findings);
                    bundle.business_recommendations.extend(recommendations);
                }
                Err(e) => {
                    tracing::warn!(chart = %chart.title, error = %e, "narrative layer failed");
                    bundle.insights_partial = true;
                }
            }
        }

        bundle
    }

    fn numeric_insights(&self, table: &DataTable, name: &str, bundle: &mut InsightBundle) {
        let Some(col) = table.column(name) else { return };
        let values = col.numeric_values();
        if values.is_empty() {
            return;
        }
        let mean = stats::mean(&values);
        let std = stats::std_dev(&values);
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        bundle.key_findings.push(format!(
            "Mean {} is {:.2} (min {:.2}, max {:.2}, std {:.2}).",
            name, mean, min, max, std
        ));

        let skew = stats::skewness(&values);
        if skew.abs() >= 1.0 {
            bundle.key_findings.push(format!(
                "{} is highly skewed to the {} (skewness {:.2}).",
                name,
                tail_direction(skew),
                skew
            ));
        } else if skew.abs() >= 0.5 {
            bundle.key_findings.push(format!(
                "{} is moderately skewed to the {} (skewness {:.2}).",
                name,
                tail_direction(skew),
                skew
            ));
        }

        // Drift across row order, reported only when it exceeds the noise
        // floor of one standard deviation end to end.
        let slope = stats::trend_slope(&values);
        let drift = slope * (values.len().saturating_sub(1)) as f64;
        if std > 0.0 && drift.abs() > std {
            bundle.trends.push(format!(
                "{} trends {} across the dataset.",
                name,
                if drift > 0.0 { "upward" } else { "downward" }
            ));
        }
    }

    fn categorical_insights(&self, table: &DataTable, name: &str, bundle: &mut InsightBundle) {
        let Some(col) = table.column(name) else { return };
        let counts = col.value_counts();
        let total: usize = counts.iter().map(|(_, c)| c).sum();
        if total == 0 {
            return;
        }
        if let Some((top_value, top_count)) = counts.first() {
            bundle.key_findings.push(format!(
                "Most common {} is '{}' ({} of {}, {:.1}%).",
                name,
                top_value,
                top_count,
                total,
                100.0 * *top_count as f64 / total as f64
            ));
        }
        if counts.len() >= 2 {
            let (a, ca) = &counts[0];
            let (b, cb) = &counts[1];
            bundle.comparisons.push(format!(
                "'{}' outnumbers '{}' in {} by {:.1}x.",
                a,
                b,
                name,
                *ca as f64 / (*cb).max(1) as f64
            ));
        }
    }

    fn correlation_insights(
        &self,
        table: &DataTable,
        profile: &Profile,
        chart: &Chart,
        bundle: &mut InsightBundle,
    ) {
        let numeric_cols: Vec<&String> = chart
            .columns
            .iter()
            .filter(|c| {
                profile
                    .column(c)
                    .map(|p| p.dtype == Dtype::Numeric)
                    .unwrap_or(false)
            })
            .collect();

        for i in 0..numeric_cols.len() {
            for j in (i + 1)..numeric_cols.len() {
                let (a, b) = (numeric_cols[i], numeric_cols[j]);
                let Some(pairs) = paired_values(table, a, b) else {
                    continue;
                };
                let Some(r) = stats::pearson(&pairs.0, &pairs.1) else {
                    continue;
                };
                let label = stats::interpret_correlation(r);
                if label != "negligible" {
                    bundle.trends.push(format!(
                        "{} and {} show a {} {} correlation (r = {:.2}).",
                        a,
                        b,
                        label,
                        if r > 0.0 { "positive" } else { "negative" },
                        r
                    ));
                }
            }
        }
    }

    fn quality_recommendations(&self, profile: &Profile, chart: &Chart, bundle: &mut InsightBundle) {
        for name in &chart.columns {
            let Some(col) = profile.column(name) else { continue };
            if profile.rows > 0 {
                let missing_pct = 100.0 * col.null_count as f64 / profile.rows as f64;
                if missing_pct > 10.0 {
                    bundle.business_recommendations.push(format!(
                        "Address missing values in {} ({:.1}% of rows) before drawing conclusions.",
                        name, missing_pct
                    ));
                }
            }
        }
    }

    async fn narrate(
        &self,
        model: &dyn LanguageModel,
        profile: &Profile,
        chart: &Chart,
        findings: &[String],
    ) -> Result<(Vec<String>, Vec<String>), tabula_llm::LlmError> {
        let prompt = narrative::build_prompt(&chart.title, findings, profile);
        let reply = complete_with_timeout(model, &prompt, self.timeout).await?;
        Ok(narrative::parse_reply(&reply))
    }
}

fn tail_direction(skew: f64) -> &'static str {
    if skew > 0.0 {
        "right"
    } else {
        "left"
    }
}

/// Row-aligned numeric pairs where both cells parse.
fn paired_values(table: &DataTable, a: &str, b: &str) -> Option<(Vec<f64>, Vec<f64>)> {
    let col_a = table.column(a)?;
    let col_b = table.column(b)?;
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for (ca, cb) in col_a.cells().iter().zip(col_b.cells().iter()) {
        let (Some(va), Some(vb)) = (ca.as_deref(), cb.as_deref()) else {
            continue;
        };
        if let (Some(x), Some(y)) = (
            tabula_core::table::parse_numeric(va),
            tabula_core::table::parse_numeric(vb),
        ) {
            xs.push(x);
            ys.push(y);
        }
    }
    if xs.len() < 2 {
        None
    } else {
        Some((xs, ys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tabula_core::{ChartKind, Column, ColumnProfile, NumericSummary, TopValue};
    use tabula_llm::StubModel;

    fn table() -> DataTable {
        let mut fare = Vec::new();
        let mut sex = Vec::new();
        for i in 0..40 {
            fare.push(Some(format!("{}", if i < 20 { 10 + i } else { 80 + i })));
            sex.push(Some(if i < 20 { "male" } else { "female" }.to_string()));
        }
        DataTable::new(vec![Column::new("Fare", fare), Column::new("Sex", sex)]).unwrap()
    }

    fn profile() -> Profile {
        Profile {
            rows: 40,
            cols: 2,
            columns: vec![
                ColumnProfile {
                    name: "Fare".to_string(),
                    dtype: Dtype::Numeric,
                    null_count: 0,
                    distinct_count: 40,
                    numeric: Some(NumericSummary {
                        min: 10.0,
                        max: 119.0,
                        mean: 59.5,
                        std: 40.0,
                    }),
                    top_values: vec![],
                },
                ColumnProfile {
                    name: "Sex".to_string(),
                    dtype: Dtype::Categorical,
                    null_count: 0,
                    distinct_count: 2,
                    numeric: None,
                    top_values: vec![TopValue {
                        value: "male".to_string(),
                        count: 20,
                    }],
                },
            ],
            total_cells: 80,
            non_null_cells: 80,
            completeness_percentage: 100.0,
            duplicate_rows: 0,
            memory_usage_bytes: 640,
            data_health_score: 95.0,
        }
    }

    fn histogram_chart() -> Chart {
        Chart {
            kind: ChartKind::Histogram,
            title: "Fare Distribution".to_string(),
            columns: vec!["Fare".to_string()],
            chart_json: json!({"data": [], "layout": {}}),
            insights: None,
        }
    }

    #[tokio::test]
    async fn test_deterministic_bundle_for_numeric_chart() {
        let gen = InsightGenerator::deterministic();
        let bundle = gen.generate(&table(), &profile(), &histogram_chart()).await;

        assert!(!bundle.key_findings.is_empty());
        assert!(bundle.key_findings[0].contains("Mean Fare"));
        assert!(!bundle.insights_partial);
        // Fare splits cleanly by the two-group Sex column.
        let test = bundle.statistical_significance.unwrap();
        assert_eq!(test.test, "welch-t");
        assert_eq!(test.result, "significant");
    }

    #[tokio::test]
    async fn test_deterministic_bundle_is_stable() {
        let gen = InsightGenerator::deterministic();
        let a = gen.generate(&table(), &profile(), &histogram_chart()).await;
        let b = gen.generate(&table(), &profile(), &histogram_chart()).await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_categorical_chart_gets_chi_square() {
        let gen = InsightGenerator::deterministic();
        let mut survived = Vec::new();
        let mut sex = Vec::new();
        for i in 0..40 {
            sex.push(Some(if i < 20 { "male" } else { "female" }.to_string()));
            survived.push(Some(if i < 18 || i >= 38 { "0" } else { "1" }.to_string()));
        }
        let table =
            DataTable::new(vec![Column::new("Sex", sex), Column::new("Survived", survived)])
                .unwrap();
        let profile = Profile {
            rows: 40,
            cols: 2,
            columns: vec![
                ColumnProfile {
                    name: "Sex".to_string(),
                    dtype: Dtype::Categorical,
                    null_count: 0,
                    distinct_count: 2,
                    numeric: None,
                    top_values: vec![],
                },
                ColumnProfile {
                    name: "Survived".to_string(),
                    dtype: Dtype::Categorical,
                    null_count: 0,
                    distinct_count: 2,
                    numeric: None,
                    top_values: vec![],
                },
            ],
            total_cells: 80,
            non_null_cells: 80,
            completeness_percentage: 100.0,
            duplicate_rows: 0,
            memory_usage_bytes: 400,
            data_health_score: 95.0,
        };
        let chart = Chart {
            kind: ChartKind::Categorical,
            title: "Sex Breakdown".to_string(),
            columns: vec!["Sex".to_string()],
            chart_json: json!({}),
            insights: None,
        };

        let bundle = gen.generate(&table, &profile, &chart).await;
        let test = bundle.statistical_significance.unwrap();
        assert_eq!(test.test, "chi-square");
        assert!(bundle
            .key_findings
            .iter()
            .any(|f| f.contains("Most common Sex")));
    }

    #[tokio::test]
    async fn test_narrative_appends_findings() {
        let model = Arc::new(StubModel::with_reply(
            "FINDINGS:\n- Fares split into two bands.\nRECOMMENDATIONS:\n- Segment pricing analysis by band.",
        ));
        let gen = InsightGenerator::new(Some(model.clone()), Duration::from_secs(1));
        let bundle = gen.generate(&table(), &profile(), &histogram_chart()).await;

        assert!(bundle
            .key_findings
            .iter()
            .any(|f| f == "Fares split into two bands."));
        assert!(bundle
            .business_recommendations
            .iter()
            .any(|r| r == "Segment pricing analysis by band."));
        assert!(!bundle.insights_partial);
        // Prompt carried aggregates, not raw cells.
        let prompts = model.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Mean Fare"));
    }

    #[tokio::test]
    async fn test_narrative_failure_marks_partial() {
        let model = Arc::new(StubModel::unavailable());
        let gen = InsightGenerator::new(Some(model), Duration::from_secs(1));
        let bundle = gen.generate(&table(), &profile(), &histogram_chart()).await;

        assert!(bundle.insights_partial);
        // Deterministic layer still present.
        assert!(!bundle.key_findings.is_empty());
    }

    #[tokio::test]
    async fn test_narrative_timeout_marks_partial() {
        let model = Arc::new(StubModel::slow("late", Duration::from_secs(5)));
        let gen = InsightGenerator::new(Some(model), Duration::from_millis(20));
        let bundle = gen.generate(&table(), &profile(), &histogram_chart()).await;
        assert!(bundle.insights_partial);
    }
}
