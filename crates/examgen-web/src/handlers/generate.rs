use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use examgen_core::generate::{GenerationOptions, generate_paper};
use examgen_llm::GroqClient;

use crate::models::{ApiError, GenerateRequest, GenerateResponse};
use crate::state::AppState;

pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let key = state
        .api_key(request.api_key.as_deref())
        .ok_or_else(|| ApiError::bad_request("No API key configured or supplied"))?;

    // An empty allocation with no pattern is the no-modules degraded
    // state; the generator answers it with one general-purpose prompt.
    let client = GroqClient::new(key);
    let options = GenerationOptions {
        model: state.config.generator_model.clone(),
        focus_topics: state.config.focus_topics,
        deadline: state
            .config
            .generation_deadline_secs
            .map(std::time::Duration::from_secs),
        fallback_questions: state.config.total_questions,
        ..Default::default()
    };

    let paper = generate_paper(
        &request.priority_scores,
        &request.allocation,
        request.paper_pattern.as_ref(),
        &client,
        &options,
    )
    .await;

    if !paper.has_content() {
        return Err(ApiError::internal("Generation produced no output"));
    }

    let partial = paper.blocks.iter().any(|b| b.is_error);
    Ok(Json(GenerateResponse {
        paper_text: paper.to_markdown(),
        partial,
    }))
}
