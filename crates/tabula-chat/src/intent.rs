//! Query intent classification.
//!
//! The LLM is the primary classifier; the keyword lexicon is both the
//! fallback and the only classifier when no model is configured.
//! Classification therefore always succeeds.

use std::sync::Arc;
use std::time::Duration;

use tabula_llm::{complete_with_timeout, LanguageModel};

/// What the user wants back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryIntent {
    Visualization,
    Informational,
}

/// Phrases that signal a chart request.
const CHART_KEYWORDS: [&str; 16] = [
    "plot",
    "chart",
    "graph",
    "visualize",
    "visualise",
    "draw",
    "histogram",
    "bar chart",
    "pie chart",
    "heatmap",
    "scatter",
    "distribution",
    "show me a",
    "show a",
    "display a",
    "breakdown of",
];

/// Deterministic keyword pass. Defaults to informational.
pub fn classify_keywords(query: &str) -> QueryIntent {
    let lower = query.to_lowercase();
    if CHART_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        QueryIntent::Visualization
    } else {
        QueryIntent::Informational
    }
}

pub struct IntentClassifier {
    model: Option<Arc<dyn LanguageModel>>,
    timeout: Duration,
}

impl IntentClassifier {
    pub fn new(model: Option<Arc<dyn LanguageModel>>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    pub fn keyword_only() -> Self {
        Self {
            model: None,
            timeout: Duration::from_secs(5),
        }
    }

    pub async fn classify(&self, query: &str) -> QueryIntent {
        if let Some(model) = &self.model {
            let prompt = format!(
                "Classify this data-analysis question as either a chart request or a \
                 text question. Respond with exactly one word: chart or text.\n\n\
                 Question: {}",
                query
            );
            match complete_with_timeout(model.as_ref(), &prompt, self.timeout).await {
                Ok(reply) => {
                    let reply = reply.to_lowercase();
                    if reply.contains("chart") {
                        return QueryIntent::Visualization;
                    }
                    if reply.contains("text") {
                        return QueryIntent::Informational;
                    }
                    tracing::debug!(reply = %reply, "unusable intent reply, using keywords");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "intent classification fell back to keywords");
                }
            }
        }
        classify_keywords(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_llm::StubModel;

    // ---- keyword fallback ----

    #[test]
    fn test_keywords_chart_phrases() {
        for q in [
            "plot the ages",
            "show me a chart of fares",
            "draw a histogram of Age",
            "what does the age distribution look like",
            "visualize survival",
        ] {
            assert_eq!(classify_keywords(q), QueryIntent::Visualization, "{}", q);
        }
    }

    #[test]
    fn test_keywords_text_phrases() {
        for q in [
            "how many rows are there",
            "what is the average age",
            "tell me about the data",
            "which column has the most missing values",
        ] {
            assert_eq!(classify_keywords(q), QueryIntent::Informational, "{}", q);
        }
    }

    #[test]
    fn test_keywords_default_is_informational() {
        assert_eq!(classify_keywords(""), QueryIntent::Informational);
        assert_eq!(classify_keywords("hmm"), QueryIntent::Informational);
    }

    // ---- LLM primary ----

    #[tokio::test]
    async fn test_llm_decision_wins() {
        // Keyword pass would say informational; the model says chart.
        let classifier = IntentClassifier::new(
            Some(Arc::new(StubModel::with_reply("chart"))),
            Duration::from_secs(1),
        );
        assert_eq!(
            classifier.classify("age info please").await,
            QueryIntent::Visualization
        );
    }

    #[tokio::test]
    async fn test_llm_failure_falls_back_to_keywords() {
        let classifier = IntentClassifier::new(
            Some(Arc::new(StubModel::unavailable())),
            Duration::from_secs(1),
        );
        assert_eq!(
            classifier.classify("plot the ages").await,
            QueryIntent::Visualization
        );
        assert_eq!(
            classifier.classify("how many rows").await,
            QueryIntent::Informational
        );
    }

    #[tokio::test]
    async fn test_llm_timeout_falls_back_to_keywords() {
        let classifier = IntentClassifier::new(
            Some(Arc::new(StubModel::slow("chart", Duration::from_secs(5)))),
            Duration::from_millis(20),
        );
        assert_eq!(
            classifier.classify("how many rows").await,
            QueryIntent::Informational
        );
    }

    #[tokio::test]
    async fn test_garbage_llm_reply_falls_back() {
        let classifier = IntentClassifier::new(
            Some(Arc::new(StubModel::with_reply("purple monkey dishwasher"))),
            Duration::from_secs(1),
        );
        assert_eq!(
            classifier.classify("draw a histogram of Age").await,
            QueryIntent::Visualization
        );
    }
}
