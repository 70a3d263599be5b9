//! Application state shared across all route handlers.
//!
//! AppState holds references to all services and shared resources.
//! It is passed to handlers via axum's State extractor.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tabula_analysis::Analyzer;
use tabula_chat::QueryRouter;
use tabula_core::config::TabulaConfig;
use tabula_insight::InsightGenerator;
use tabula_llm::{GeminiModel, LanguageModel};
use tabula_session::SessionStore;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<TabulaConfig>,
    /// In-memory session store.
    pub store: Arc<SessionStore>,
    /// Upload-time analysis pipeline.
    pub analyzer: Arc<Analyzer>,
    /// Chat query router.
    pub router: Arc<QueryRouter>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Build state from config, wiring the language model when enabled.
    pub fn new(config: TabulaConfig) -> Self {
        let model: Option<Arc<dyn LanguageModel>> = if config.llm.enabled {
            match GeminiModel::from_config(&config.llm) {
                Ok(model) => Some(Arc::new(model)),
                Err(e) => {
                    tracing::warn!(error = %e, "language model disabled: running deterministic only");
                    None
                }
            }
        } else {
            None
        };
        Self::with_model(config, model)
    }

    /// Build state with an explicit model (or none). Used by tests to
    /// inject stubs.
    pub fn with_model(config: TabulaConfig, model: Option<Arc<dyn LanguageModel>>) -> Self {
        let timeout = Duration::from_millis(config.llm.timeout_ms);
        let insights = InsightGenerator::new(model.clone(), timeout);
        let analyzer = Analyzer::new(config.analysis.clone(), insights);
        let router = QueryRouter::new(
            model,
            config.chat.clone(),
            config.analysis.clone(),
            timeout,
        );
        Self {
            config: Arc::new(config),
            store: Arc::new(SessionStore::new()),
            analyzer: Arc::new(analyzer),
            router: Arc::new(router),
            start_time: Instant::now(),
        }
    }
}
