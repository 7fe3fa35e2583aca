use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use examgen_core::chat::refine_header_lines;
use examgen_llm::GroqClient;
use examgen_render::{HeaderConfig, render_paper};

use crate::models::{ApiError, DownloadPdfRequest};
use crate::state::AppState;

pub async fn download_pdf(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DownloadPdfRequest>,
) -> Result<Response, ApiError> {
    if request.text_content.trim().is_empty() {
        return Err(ApiError::bad_request("text_content is empty"));
    }

    let header_lines = match &request.header_text_raw {
        Some(raw) if !raw.trim().is_empty() => {
            // Tidy the free-form header through the LLM when a key is
            // available; otherwise take the lines as given.
            match state.api_key(request.api_key.as_deref()) {
                Some(key) => {
                    let client = GroqClient::new(key);
                    refine_header_lines(raw, &client, &state.config.generator_model).await
                }
                None => raw.lines().map(str::to_string).collect(),
            }
        }
        _ => Vec::new(),
    };

    let mut header = HeaderConfig::from_lines(&header_lines);
    if let Some(encoded) = &request.header_image {
        let png = BASE64
            .decode(strip_data_uri(encoded))
            .map_err(|e| ApiError::bad_request(format!("Invalid header image: {}", e)))?;
        header.logo_png = Some(png);
    }

    let pdf = render_paper(&request.text_content, &header)
        .map_err(|e| ApiError::internal(format!("PDF rendering failed: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"exam_paper.pdf\"".to_string(),
            ),
        ],
        pdf,
    )
        .into_response())
}

/// Accept both bare base64 and `data:image/png;base64,...` URIs.
fn strip_data_uri(encoded: &str) -> &str {
    match encoded.split_once(";base64,") {
        Some((_, data)) => data,
        None => encoded,
    }
}
