//! Session map and per-session conversation locking.
//!
//! The map is guarded by an `RwLock`; each session's conversation has its
//! own `Mutex`. Callers get `Arc<Session>` snapshots, so a session deleted
//! mid-query stays readable by the query that holds it -- but the follow-up
//! `append_pair` re-resolves the id and fails with `NotFound`, dropping the
//! result. No lock here is ever held across an `.await`: the store is fully
//! synchronous.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use tabula_core::{AnalysisReport, DataTable, Message, Result, SessionId, TabulaError};

/// One session: immutable analysis artifacts plus a guarded conversation.
pub struct Session {
    pub id: SessionId,
    pub table: DataTable,
    pub report: AnalysisReport,
    pub created_at: DateTime<Utc>,
    last_active: Mutex<DateTime<Utc>>,
    conversation: Mutex<Vec<Message>>,
}

impl Session {
    fn new(id: SessionId, table: DataTable, report: AnalysisReport) -> Self {
        let now = Utc::now();
        Self {
            id,
            table,
            report,
            created_at: now,
            last_active: Mutex::new(now),
            conversation: Mutex::new(Vec::new()),
        }
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        *self
            .last_active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn touch(&self) {
        *self
            .last_active
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Utc::now();
    }

    /// Snapshot of the most recent `last_n` messages.
    pub fn recent_history(&self, last_n: usize) -> Vec<Message> {
        let conversation = self
            .conversation
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let start = conversation.len().saturating_sub(last_n);
        conversation[start..].to_vec()
    }

    pub fn message_count(&self) -> usize {
        self.conversation
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

/// The in-memory session map.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fully analyzed table. Only called after the pipeline
    /// succeeded; a session never exists in a half-analyzed state.
    pub fn create(&self, table: DataTable, report: AnalysisReport) -> Result<SessionId> {
        let id = Uuid::new_v4();
        let session = Arc::new(Session::new(id, table, report));
        self.sessions
            .write()
            .map_err(|_| poisoned())?
            .insert(id, session);
        tracing::info!(session_id = %id, "session created");
        Ok(id)
    }

    /// Shared handle to a live session.
    pub fn get(&self, id: &SessionId) -> Result<Arc<Session>> {
        let session = self
            .sessions
            .read()
            .map_err(|_| poisoned())?
            .get(id)
            .cloned()
            .ok_or_else(|| TabulaError::NotFound(format!("session {}", id)))?;
        session.touch();
        Ok(session)
    }

    /// Append a user/assistant message pair as one atomic unit.
    ///
    /// The session is re-resolved here: a pair computed against a session
    /// that has since been deleted is discarded with `NotFound`.
    pub fn append_pair(&self, id: &SessionId, user: Message, assistant: Message) -> Result<()> {
        let session = self
            .sessions
            .read()
            .map_err(|_| poisoned())?
            .get(id)
            .cloned()
            .ok_or_else(|| TabulaError::NotFound(format!("session {}", id)))?;

        let mut conversation = session
            .conversation
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        conversation.push(user);
        conversation.push(assistant);
        drop(conversation);
        session.touch();
        Ok(())
    }

    /// Recent conversation context for a session.
    pub fn history(&self, id: &SessionId, last_n: usize) -> Result<Vec<Message>> {
        Ok(self.get(id)?.recent_history(last_n))
    }

    /// Remove a session. Idempotent: deleting an absent id is fine.
    pub fn delete(&self, id: &SessionId) -> Result<()> {
        let removed = self
            .sessions
            .write()
            .map_err(|_| poisoned())?
            .remove(id)
            .is_some();
        if removed {
            tracing::info!(session_id = %id, "session deleted");
        } else {
            tracing::debug!(session_id = %id, "delete for unknown session ignored");
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .map(|m| m.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop sessions idle longer than `max_idle`. Returns how many were
    /// evicted.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let Ok(mut sessions) = self.sessions.write() else {
            return 0;
        };
        let before = sessions.len();
        sessions.retain(|_, s| s.last_active() >= cutoff);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, "idle sessions swept");
        }
        evicted
    }
}

fn poisoned() -> TabulaError {
    TabulaError::Storage("session map lock poisoned".to_string())
}
