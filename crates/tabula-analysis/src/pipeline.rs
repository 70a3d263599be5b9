//! The upload-time analysis pipeline.
//!
//! profile -> summary -> chart battery -> per-chart insights. Insight
//! failures degrade the affected chart; everything else is deterministic.

use std::sync::Arc;

use tabula_core::config::AnalysisConfig;
use tabula_core::{AnalysisReport, DataTable, Result, TabulaError};
use tabula_insight::InsightGenerator;

use crate::backend::{ChartBackend, PlotlyBackend};
use crate::charts::build_charts;
use crate::profile::build_profile;
use crate::summary::generate_summary;

pub struct Analyzer {
    config: AnalysisConfig,
    backend: Arc<dyn ChartBackend>,
    insights: InsightGenerator,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig, insights: InsightGenerator) -> Self {
        Self {
            config,
            backend: Arc::new(PlotlyBackend),
            insights,
        }
    }

    pub fn with_backend(
        config: AnalysisConfig,
        insights: InsightGenerator,
        backend: Arc<dyn ChartBackend>,
    ) -> Self {
        Self {
            config,
            backend,
            insights,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn backend(&self) -> &dyn ChartBackend {
        self.backend.as_ref()
    }

    /// Run the full pipeline for one uploaded table.
    pub async fn analyze(&self, table: &DataTable) -> Result<AnalysisReport> {
        if table.n_cols() == 0 {
            return Err(TabulaError::Validation(
                "table has no columns".to_string(),
            ));
        }
        if table.n_rows() == 0 {
            return Err(TabulaError::Validation("table has no rows".to_string()));
        }

        let profile = build_profile(table, &self.config);
        tracing::info!(
            rows = profile.rows,
            cols = profile.cols,
            health = profile.data_health_score,
            "table profiled"
        );

        let summary = generate_summary(&profile);
        let mut charts = build_charts(table, &profile, &self.config, self.backend.as_ref());
        tracing::info!(charts = charts.len(), "chart battery built");

        for chart in &mut charts {
            let bundle = self.insights.generate(table, &profile, chart).await;
            if bundle.insights_partial {
                tracing::warn!(chart = %chart.title, "insights degraded to deterministic layer");
            }
            chart.insights = Some(bundle);
        }

        Ok(AnalysisReport {
            profile,
            summary,
            charts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tabula_core::Column;
    use tabula_llm::StubModel;

    fn analyzer() -> Analyzer {
        Analyzer::new(AnalysisConfig::default(), InsightGenerator::deterministic())
    }

    fn small_table() -> DataTable {
        DataTable::new(vec![
            Column::new(
                "Age",
                (0..12).map(|i| Some((20 + i * 2).to_string())).collect(),
            ),
            Column::new(
                "Sex",
                (0..12)
                    .map(|i| Some(if i % 3 == 0 { "male" } else { "female" }.to_string()))
                    .collect(),
            ),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_analyze_rejects_zero_columns() {
        let table = DataTable::new(vec![]).unwrap();
        let result = analyzer().analyze(&table).await;
        assert!(matches!(result, Err(TabulaError::Validation(_))));
    }

    #[tokio::test]
    async fn test_analyze_rejects_zero_rows() {
        let table = DataTable::new(vec![Column::new("A", vec![])]).unwrap();
        let result = analyzer().analyze(&table).await;
        assert!(matches!(result, Err(TabulaError::Validation(_))));
    }

    #[tokio::test]
    async fn test_analyze_single_cell_table() {
        let table = DataTable::new(vec![Column::new("Only", vec![Some("1".to_string())])]).unwrap();
        let report = analyzer().analyze(&table).await.unwrap();
        assert_eq!(report.profile.rows, 1);
        assert!(!report.charts.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_attaches_insights_to_every_chart() {
        let report = analyzer().analyze(&small_table()).await.unwrap();
        assert!(report.charts.iter().all(|c| c.insights.is_some()));
    }

    #[tokio::test]
    async fn test_analyze_is_deterministic() {
        let a = analyzer().analyze(&small_table()).await.unwrap();
        let b = analyzer().analyze(&small_table()).await.unwrap();
        assert_eq!(a.summary, b.summary);
        assert_eq!(a.profile, b.profile);
        assert_eq!(a.charts, b.charts);
    }

    #[tokio::test]
    async fn test_analyze_survives_unavailable_narrator() {
        let insights = InsightGenerator::new(
            Some(std::sync::Arc::new(StubModel::unavailable())),
            Duration::from_millis(100),
        );
        let analyzer = Analyzer::new(AnalysisConfig::default(), insights);
        let report = analyzer.analyze(&small_table()).await.unwrap();
        // Analysis succeeded; each chart is flagged partial.
        assert!(report
            .charts
            .iter()
            .all(|c| c.insights.as_ref().unwrap().insights_partial));
    }
}
