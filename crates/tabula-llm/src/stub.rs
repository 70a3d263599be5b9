//! Deterministic in-process [`LanguageModel`] for tests and LLM-disabled
//! deployments.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::{LanguageModel, LlmError};

/// Scripted model: returns canned replies in order, repeating the last one
/// once exhausted. Records every prompt it receives so tests can assert on
/// prompt contents.
pub struct StubModel {
    replies: Vec<String>,
    cursor: Mutex<usize>,
    prompts: Mutex<Vec<String>>,
    fail: bool,
    delay: Option<Duration>,
}

impl StubModel {
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self::with_replies(vec![reply.into()])
    }

    pub fn with_replies(replies: Vec<String>) -> Self {
        Self {
            replies,
            cursor: Mutex::new(0),
            prompts: Mutex::new(Vec::new()),
            fail: false,
            delay: None,
        }
    }

    /// A model whose every call fails with a network error.
    pub fn unavailable() -> Self {
        Self {
            replies: Vec::new(),
            cursor: Mutex::new(0),
            prompts: Mutex::new(Vec::new()),
            fail: true,
            delay: None,
        }
    }

    /// A model that sleeps before answering. Used to exercise timeouts and
    /// concurrency ordering.
    pub fn slow(reply: impl Into<String>, delay: Duration) -> Self {
        Self {
            replies: vec![reply.into()],
            cursor: Mutex::new(0),
            prompts: Mutex::new(Vec::new()),
            fail: false,
            delay: Some(delay),
        }
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for StubModel {
    fn name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(LlmError::Network("stub configured unavailable".to_string()));
        }
        let mut cursor = self.cursor.lock().unwrap();
        let reply = self
            .replies
            .get(*cursor)
            .or_else(|| self.replies.last())
            .cloned()
            .ok_or(LlmError::InvalidResponse)?;
        if *cursor + 1 < self.replies.len() {
            *cursor += 1;
        }
        Ok(reply)
    }
}
