//! Language-model collaborator boundary.
//!
//! The engine talks to its LLM through the narrow [`LanguageModel`] trait:
//! one prompt in, one completion out, always under a timeout. The HTTP
//! implementation lives in [`gemini`]; tests inject [`StubModel`].

pub mod gemini;
pub mod stub;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use gemini::GeminiModel;
pub use stub::StubModel;

/// Errors from the collaborator boundary.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("network error: {0}")]
    Network(String),
    #[error("api error: {0}")]
    Api(String),
    #[error("timed out")]
    Timeout,
    #[error("missing api key: environment variable {0} not set")]
    MissingApiKey(String),
    #[error("unparseable response")]
    InvalidResponse,
}

impl From<LlmError> for tabula_core::TabulaError {
    fn from(err: LlmError) -> Self {
        tabula_core::TabulaError::CollaboratorUnavailable(err.to_string())
    }
}

/// A completion backend. Implementations must be cheap to share behind an
/// `Arc<dyn LanguageModel>`.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Run a completion with a hard deadline. Every call site in the engine goes
/// through this; a hung collaborator can never stall a request.
pub async fn complete_with_timeout(
    model: &dyn LanguageModel,
    prompt: &str,
    timeout: Duration,
) -> Result<String, LlmError> {
    match tokio::time::timeout(timeout, model.complete(prompt)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(model = model.name(), "collaborator call timed out");
            Err(LlmError::Timeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_complete_with_timeout_passes_through() {
        let model = StubModel::with_reply("hello");
        let out = complete_with_timeout(&model, "hi", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn test_complete_with_timeout_times_out() {
        let model = StubModel::slow("late", Duration::from_secs(5));
        let result = complete_with_timeout(&model, "hi", Duration::from_millis(20)).await;
        assert!(matches!(result, Err(LlmError::Timeout)));
    }

    #[test]
    fn test_llm_error_maps_to_collaborator_unavailable() {
        let err: tabula_core::TabulaError = LlmError::Timeout.into();
        assert!(matches!(
            err,
            tabula_core::TabulaError::CollaboratorUnavailable(_)
        ));
    }
}
