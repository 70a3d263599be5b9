//! Route handlers for the Tabula API.

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tabula_core::{Chart, Message, Profile, QueryResponse, SessionId};

use crate::error::ApiError;
use crate::ingest;
use crate::state::AppState;

// =============================================================================
// Request / response DTOs
// =============================================================================

/// Structural summary of the uploaded table as the client sees it.
#[derive(Debug, Serialize, Deserialize)]
pub struct DataframeInfo {
    /// `[rows, cols]`.
    pub shape: [usize; 2],
    pub columns: Vec<String>,
    pub dtypes: BTreeMap<String, String>,
    pub null_counts: BTreeMap<String, usize>,
    /// Estimated bytes.
    pub memory_usage: usize,
    pub data_health_score: f64,
}

impl From<&Profile> for DataframeInfo {
    fn from(profile: &Profile) -> Self {
        Self {
            shape: [profile.rows, profile.cols],
            columns: profile.columns.iter().map(|c| c.name.clone()).collect(),
            dtypes: profile
                .columns
                .iter()
                .map(|c| (c.name.clone(), c.dtype.as_str().to_string()))
                .collect(),
            null_counts: profile
                .columns
                .iter()
                .map(|c| (c.name.clone(), c.null_count))
                .collect(),
            memory_usage: profile.memory_usage_bytes,
            data_health_score: profile.data_health_score,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InitialAnalysisResponse {
    pub session_id: SessionId,
    pub summary: String,
    pub charts: Vec<Chart>,
    pub dataframe_info: DataframeInfo,
}

#[derive(Debug, Deserialize)]
pub struct ChatQueryRequest {
    pub session_id: Uuid,
    pub user_query: String,
    /// History echoed by the client. The server-side conversation log is
    /// authoritative; the field is accepted for wire compatibility and not
    /// read.
    #[serde(default)]
    pub conversation_history: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatQueryResponse {
    pub response: QueryResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub active_sessions: usize,
    pub uptime_secs: u64,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/initial-analysis
///
/// Accepts a CSV upload, runs the full analysis pipeline, and opens a
/// session. The session exists only if analysis succeeded end to end.
pub async fn initial_analysis(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<InitialAnalysisResponse>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("upload body is empty".to_string()));
    }

    let table = ingest::parse_csv(&body)?;
    let report = state.analyzer.analyze(&table).await?;
    let session_id = state.store.create(table, report)?;
    let session = state.store.get(&session_id)?;

    tracing::info!(
        session_id = %session_id,
        rows = session.report.profile.rows,
        charts = session.report.charts.len(),
        "initial analysis complete"
    );

    Ok(Json(InitialAnalysisResponse {
        session_id,
        summary: session.report.summary.clone(),
        charts: session.report.charts.clone(),
        dataframe_info: DataframeInfo::from(&session.report.profile),
    }))
}

/// POST /api/chat-query
///
/// Routes a query against a session and appends the message pair. Chat-level
/// failures (unknown column, collaborator down) come back as a 200 with a
/// `type: "error"` response; only an unknown session is an HTTP error.
pub async fn chat_query(
    State(state): State<AppState>,
    Json(request): Json<ChatQueryRequest>,
) -> Result<Json<ChatQueryResponse>, ApiError> {
    let session = state.store.get(&request.session_id)?;

    // The router works on the snapshot; the store is untouched until the
    // append below.
    let response = state.router.handle(&session, &request.user_query).await;

    let user = Message::user(request.user_query.clone());
    let assistant = Message::assistant(&response, request.user_query.clone());
    // If the session was deleted while the query ran, this fails NotFound
    // and the computed response is dropped.
    state
        .store
        .append_pair(&request.session_id, user, assistant)?;

    Ok(Json(ChatQueryResponse { response }))
}

/// DELETE /api/cleanup/{session_id}
///
/// Best-effort and idempotent: cleaning an unknown session reports success,
/// and internal failures are logged rather than surfaced.
pub async fn cleanup(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Json<CleanupResponse> {
    if let Err(e) = state.store.delete(&session_id) {
        tracing::warn!(session_id = %session_id, error = %e, "cleanup failed");
    }
    Json(CleanupResponse {
        status: "cleaned".to_string(),
    })
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        active_sessions: state.store.len(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::{ColumnProfile, Dtype};

    fn profile() -> Profile {
        Profile {
            rows: 3,
            cols: 2,
            columns: vec![
                ColumnProfile {
                    name: "Age".to_string(),
                    dtype: Dtype::Numeric,
                    null_count: 1,
                    distinct_count: 2,
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
            total_cells: 6,
            non_null_cells: 5,
            completeness_percentage: 83.33,
            duplicate_rows: 0,
            memory_usage_bytes: 120,
            data_health_score: 88.0,
        }
    }

    #[test]
    fn test_dataframe_info_from_profile() {
        let info = DataframeInfo::from(&profile());
        assert_eq!(info.shape, [3, 2]);
        assert_eq!(info.columns, vec!["Age", "Sex"]);
        assert_eq!(info.dtypes["Age"], "numeric");
        assert_eq!(info.dtypes["Sex"], "categorical");
        assert_eq!(info.null_counts["Age"], 1);
        assert_eq!(info.memory_usage, 120);
        assert_eq!(info.data_health_score, 88.0);
    }

    #[test]
    fn test_dataframe_info_wire_keys() {
        let json = serde_json::to_value(DataframeInfo::from(&profile())).unwrap();
        for key in [
            "shape",
            "columns",
            "dtypes",
            "null_counts",
            "memory_usage",
            "data_health_score",
        ] {
            assert!(json.get(key).is_some(), "missing key: {}", key);
        }
        assert_eq!(json["shape"], serde_json::json!([3, 2]));
    }

    #[test]
    fn test_chat_request_accepts_conversation_history() {
        let request: ChatQueryRequest = serde_json::from_str(
            r#"{
                "session_id": "6f91f0f0-2f5a-4a3e-9d84-9e2f8a3b1c00",
                "user_query": "how many rows?",
                "conversation_history": [
                    {"role": "user", "type": "text", "content": "hello"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(request.user_query, "how many rows?");
        assert_eq!(request.conversation_history.len(), 1);
    }

    #[test]
    fn test_chat_request_history_is_optional() {
        let request: ChatQueryRequest = serde_json::from_str(
            r#"{"session_id": "6f91f0f0-2f5a-4a3e-9d84-9e2f8a3b1c00", "user_query": "hi"}"#,
        )
        .unwrap();
        assert!(request.conversation_history.is_empty());
    }
}
