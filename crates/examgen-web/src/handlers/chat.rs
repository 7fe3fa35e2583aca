use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use examgen_core::chat::{ChatContext, process_message};
use examgen_llm::GroqClient;

use crate::models::{ApiError, ChatRequest, ChatResponse};
use crate::state::AppState;

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let key = state
        .api_key(request.api_key.as_deref())
        .ok_or_else(|| ApiError::bad_request("No API key configured or supplied"))?;

    if request.message.trim().is_empty() {
        return Err(ApiError::bad_request("message is empty"));
    }

    let context = ChatContext {
        syllabus_topics: request.syllabus_topics.keys().cloned().collect(),
        paper_pattern: request.paper_pattern.clone(),
    };

    let client = GroqClient::new(key);
    let reply = process_message(
        &request.message,
        &context,
        &client,
        &state.config.generator_model,
    )
    .await;

    Ok(Json(ChatResponse {
        reply: reply.reply,
        action: reply.action,
    }))
}
