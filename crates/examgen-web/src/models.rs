use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

use examgen_core::{Allocation, AnalysisReport, ExamPattern, PriorityScores, TopicHours};

/// Uniform error shape for every API endpoint.
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub report: AnalysisReport,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub api_key: Option<String>,
    pub priority_scores: PriorityScores,
    pub allocation: Allocation,
    pub paper_pattern: Option<ExamPattern>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub paper_text: String,
    /// True when a deadline or per-section error left gaps in the paper.
    pub partial: bool,
}

#[derive(Debug, Deserialize)]
pub struct DownloadPdfRequest {
    pub text_content: String,
    /// Free-form header text, one institution detail per line.
    pub header_text_raw: Option<String>,
    /// Base64-encoded PNG logo.
    pub header_image: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub api_key: Option<String>,
    pub message: String,
    #[serde(default)]
    pub syllabus_topics: TopicHours,
    pub paper_pattern: Option<ExamPattern>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}
