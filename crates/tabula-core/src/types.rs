//! Shared domain types: column dtypes, profiles, charts, insight bundles,
//! conversation messages, and the chat response union.
//!
//! Everything here serializes with serde; these structs are the wire contract
//! between the engine and its HTTP surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Session identifier. Always a v4 UUID.
pub type SessionId = Uuid;

/// Inferred column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dtype {
    Numeric,
    Categorical,
    Datetime,
    Boolean,
    Text,
}

impl Dtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dtype::Numeric => "numeric",
            Dtype::Categorical => "categorical",
            Dtype::Datetime => "datetime",
            Dtype::Boolean => "boolean",
            Dtype::Text => "text",
        }
    }
}

/// Descriptive statistics for a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
}

/// One entry of a categorical column's frequency table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopValue {
    pub value: String,
    pub count: usize,
}

/// Per-column slice of a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: Dtype,
    pub null_count: usize,
    pub distinct_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub top_values: Vec<TopValue>,
}

/// Structural and statistical description of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub rows: usize,
    pub cols: usize,
    pub columns: Vec<ColumnProfile>,
    pub total_cells: usize,
    pub non_null_cells: usize,
    pub completeness_percentage: f64,
    pub duplicate_rows: usize,
    pub memory_usage_bytes: usize,
    pub data_health_score: f64,
}

impl Profile {
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn columns_of(&self, dtype: Dtype) -> Vec<&ColumnProfile> {
        self.columns.iter().filter(|c| c.dtype == dtype).collect()
    }
}

/// What a chart shows. Domain variants are produced when column names match
/// a well-known vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Overview,
    Histogram,
    Categorical,
    Correlation,
    Survival,
    Gender,
    Age,
    Fare,
    Class,
    Embarkation,
    FamilySize,
}

/// A rendered chart: an opaque plotly-style payload plus optional insights.
///
/// On the wire a chart is `{type, title, data, insights?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub title: String,
    /// Source columns the chart was built from. Always a subset of the
    /// table's columns. Internal only, never serialized.
    #[serde(skip)]
    pub columns: Vec<String>,
    #[serde(rename = "data")]
    pub chart_json: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insights: Option<InsightBundle>,
}

/// A significance test attached to an insight bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignificanceTest {
    pub test: String,
    pub p_value: f64,
    pub result: String,
    pub interpretation: String,
}

/// Per-chart insights: deterministic statistics plus optional narrative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct InsightBundle {
    pub key_findings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistical_significance: Option<SignificanceTest>,
    pub trends: Vec<String>,
    pub comparisons: Vec<String>,
    pub business_recommendations: Vec<String>,
    /// True when the narrative layer failed and only deterministic fields
    /// are present.
    #[serde(default)]
    pub insights_partial: bool,
}

/// Everything the analysis pipeline produces for one upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub profile: Profile,
    pub summary: String,
    pub charts: Vec<Chart>,
}

/// Who authored a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// Payload shape of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Chart,
    Error,
}

/// One entry in a session's conversation log.
///
/// The payload kind serializes as `type`; a missing timestamp on input is
/// filled at receipt time so client-echoed history deserializes cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_json: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_query: Option<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(query: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            kind: MessageKind::Text,
            content: query.into(),
            chart_json: None,
            original_query: None,
            timestamp: Utc::now(),
        }
    }

    /// Build the assistant half of a message pair from a response.
    pub fn assistant(response: &QueryResponse, original_query: impl Into<String>) -> Self {
        let (kind, content, chart_json) = match response {
            QueryResponse::Text { text_response } => {
                (MessageKind::Text, text_response.clone(), None)
            }
            QueryResponse::Chart { chart_json } => (
                MessageKind::Chart,
                "[chart]".to_string(),
                Some(chart_json.clone()),
            ),
            QueryResponse::Error { error } => (MessageKind::Error, error.clone(), None),
        };
        Self {
            role: Role::Assistant,
            kind,
            content,
            chart_json,
            original_query: Some(original_query.into()),
            timestamp: Utc::now(),
        }
    }
}

/// The chat answer union. Exactly one of text, chart, or error -- the enum
/// representation makes any other combination unrepresentable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryResponse {
    Text { text_response: String },
    Chart { chart_json: Value },
    Error { error: String },
}

impl QueryResponse {
    pub fn text(s: impl Into<String>) -> Self {
        QueryResponse::Text {
            text_response: s.into(),
        }
    }

    pub fn chart(payload: Value) -> Self {
        QueryResponse::Chart {
            chart_json: payload,
        }
    }

    pub fn error(s: impl Into<String>) -> Self {
        QueryResponse::Error { error: s.into() }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QueryResponse::Error { .. })
    }
}
