//! The chat query router.
//!
//! Read-only over the session's analysis artifacts: the router computes a
//! response; the caller appends the message pair afterwards. No session or
//! store lock is held across the collaborator awaits -- the router only
//! touches the `Arc<Session>` snapshot it was handed.

use std::sync::Arc;
use std::time::Duration;

use tabula_analysis::charts::column_chart;
use tabula_analysis::{ChartBackend, PlotlyBackend};
use tabula_core::config::{AnalysisConfig, ChatConfig};
use tabula_core::{Dtype, Message, Profile, QueryResponse, Role, TabulaError};
use tabula_llm::{complete_with_timeout, LanguageModel};
use tabula_session::Session;

use crate::aggregate;
use crate::columns::{extract_target, TargetColumn};
use crate::intent::{IntentClassifier, QueryIntent};

pub struct QueryRouter {
    classifier: IntentClassifier,
    model: Option<Arc<dyn LanguageModel>>,
    chat: ChatConfig,
    analysis: AnalysisConfig,
    backend: Arc<dyn ChartBackend>,
    timeout: Duration,
}

impl QueryRouter {
    pub fn new(
        model: Option<Arc<dyn LanguageModel>>,
        chat: ChatConfig,
        analysis: AnalysisConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(model.clone(), timeout),
            model,
            chat,
            analysis,
            backend: Arc::new(PlotlyBackend),
            timeout,
        }
    }

    /// Fully deterministic router: keyword intent, local aggregates only.
    pub fn deterministic(chat: ChatConfig, analysis: AnalysisConfig) -> Self {
        Self::new(None, chat, analysis, Duration::from_secs(10))
    }

    /// Answer one query against a session snapshot.
    pub async fn handle(&self, session: &Session, query: &str) -> QueryResponse {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return QueryResponse::error("Query must not be empty.");
        }
        if trimmed.len() > self.chat.max_query_len {
            return QueryResponse::error(format!(
                "Query too long: {} characters exceeds the {} character limit.",
                trimmed.len(),
                self.chat.max_query_len
            ));
        }

        let intent = self.classifier.classify(trimmed).await;
        tracing::debug!(session_id = %session.id, ?intent, "query classified");

        match intent {
            QueryIntent::Visualization => self.handle_visualization(session, trimmed),
            QueryIntent::Informational => self.handle_informational(session, trimmed).await,
        }
    }

    fn handle_visualization(&self, session: &Session, query: &str) -> QueryResponse {
        let table = &session.table;
        let profile = &session.report.profile;
        let names = table.column_names();

        match extract_target(query, &names) {
            TargetColumn::Resolved(column) => {
                match column_chart(table, profile, &column, &self.analysis, self.backend.as_ref())
                {
                    Some(chart) => QueryResponse::chart(chart.chart_json),
                    None => QueryResponse::error(format!(
                        "Column '{}' cannot be charted.",
                        column
                    )),
                }
            }
            TargetColumn::Unresolved(reference) => {
                let err = TabulaError::ColumnNotFound(format!(
                    "'{}'. Available columns: {}",
                    reference,
                    names.join(", ")
                ));
                QueryResponse::error(err.to_string())
            }
            TargetColumn::None => self.default_chart(session),
        }
    }

    /// Generic fallback when a chart is asked for without naming a column:
    /// the first numeric histogram, else the first chartable categorical.
    fn default_chart(&self, session: &Session) -> QueryResponse {
        let table = &session.table;
        let profile = &session.report.profile;
        let candidate = profile
            .columns
            .iter()
            .find(|c| c.dtype == Dtype::Numeric)
            .or_else(|| {
                profile.columns.iter().find(|c| {
                    matches!(c.dtype, Dtype::Categorical | Dtype::Boolean)
                        && c.distinct_count > 1
                        && c.distinct_count <= self.analysis.max_categories
                })
            });
        match candidate.and_then(|c| {
            column_chart(table, profile, &c.name, &self.analysis, self.backend.as_ref())
        }) {
            Some(chart) => QueryResponse::chart(chart.chart_json),
            None => QueryResponse::error("No chartable column found in this dataset."),
        }
    }

    async fn handle_informational(&self, session: &Session, query: &str) -> QueryResponse {
        let table = &session.table;
        let profile = &session.report.profile;

        if let Some(response) = aggregate::answer(query, table, profile) {
            return response;
        }

        let Some(model) = &self.model else {
            return QueryResponse::error(
                "I can answer counts, averages, minimums and maximums directly; \
                 this question needs the language model, which is not configured.",
            );
        };

        let history = session.recent_history(self.chat.history_context);
        let prompt = build_text_prompt(profile, &history, query);
        match complete_with_timeout(model.as_ref(), &prompt, self.timeout).await {
            Ok(reply) => QueryResponse::text(reply),
            Err(e) => {
                tracing::warn!(session_id = %session.id, error = %e, "text delegation failed");
                QueryResponse::error(
                    "The language model is currently unavailable. Please try again.",
                )
            }
        }
    }
}

/// Prompt for delegated text questions: profile statistics and recent
/// conversation only, never raw rows.
fn build_text_prompt(profile: &Profile, history: &[Message], query: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str("You are a data analyst assistant answering questions about a dataset.\n");
    prompt.push_str(&format!(
        "The dataset has {} rows and {} columns. Health score {:.0}/100, {:.1}% complete.\n",
        profile.rows, profile.cols, profile.data_health_score, profile.completeness_percentage
    ));
    prompt.push_str("Columns:\n");
    for col in profile.columns.iter().take(15) {
        let mut line = format!(
            "- {} ({}, {} missing, {} distinct",
            col.name,
            col.dtype.as_str(),
            col.null_count,
            col.distinct_count
        );
        if let Some(numeric) = &col.numeric {
            line.push_str(&format!(
                ", mean {:.2}, min {:.2}, max {:.2}",
                numeric.mean, numeric.min, numeric.max
            ));
        }
        if let Some(top) = col.top_values.first() {
            line.push_str(&format!(", most common '{}'", top.value));
        }
        line.push(')');
        prompt.push_str(&line);
        prompt.push('\n');
    }

    if !history.is_empty() {
        prompt.push_str("\nRecent conversation:\n");
        for message in history {
            let role = match message.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            prompt.push_str(&format!("{}: {}\n", role, message.content));
        }
    }

    prompt.push_str(&format!(
        "\nQuestion: {}\nAnswer concisely using only the statistics above. If the \
         statistics cannot answer the question, say so.",
        query
    ));
    prompt
}
