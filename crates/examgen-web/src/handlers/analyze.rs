use std::path::Path;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, State};

use examgen_core::pattern::extract_pattern;
use examgen_core::syllabus::parse_syllabus_with_fallback;
use examgen_core::{
    AnalysisReport, Config, TextCompletion, allocate_questions, classify_frequency,
    compute_priority_scores,
};
use examgen_llm::GroqClient;
use examgen_pdf::{GarbleRules, OcrFallback, OcrService, extract_document_text};
use examgen_pdf_mupdf::MupdfBackend;

use crate::models::{AnalyzeResponse, ApiError};
use crate::state::AppState;
use crate::upload::{self, UploadedFile};

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let fields = upload::parse_multipart(multipart)
        .await
        .map_err(ApiError::bad_request)?;

    let key = state
        .api_key(fields.api_key.as_deref())
        .ok_or_else(|| ApiError::bad_request("No API key configured or supplied"))?
        .to_string();

    let mut config = state.config.clone();
    config.api_key = Some(key.clone());
    if let Some(total) = fields.total_questions {
        config.total_questions = total;
    }

    let mut client = GroqClient::new(key);
    if let Some(model) = &config.vision_model {
        client = client.with_vision_model(model.clone());
    }

    // Temp dir is auto-cleaned on drop, after extraction completes.
    let temp_dir = tempfile::tempdir()
        .map_err(|e| ApiError::internal(format!("Failed to create temp directory: {}", e)))?;

    let syllabus_text = match (&fields.syllabus_text, &fields.syllabus_file) {
        (Some(text), _) => text.clone(),
        (None, Some(file)) => extract_upload(file, temp_dir.path(), &config).await?,
        (None, None) => unreachable!("parse_multipart enforces a syllabus source"),
    };

    let mut pyq_text = String::new();
    for file in &fields.pyq_files {
        pyq_text.push_str(&extract_upload(file, temp_dir.path(), &config).await?);
        pyq_text.push('\n');
    }

    let syllabus = parse_syllabus_with_fallback(
        &syllabus_text,
        &config.syllabus_rules,
        Some(&client as &dyn TextCompletion),
        &config.classifier_model,
    )
    .await;

    // Classification against an empty topic list is pointless; the flag
    // tells callers to fall back to pattern-only or general prompting.
    let no_modules_detected = syllabus.is_empty();
    if no_modules_detected {
        tracing::warn!("no syllabus modules detected, skipping classification");
    }

    let frequency = if no_modules_detected {
        Default::default()
    } else {
        classify_frequency(
            &syllabus,
            &pyq_text,
            &client,
            &config.classifier_model,
            config.min_fragment_len,
            |_| {},
        )
        .await
    };

    let priority_scores = compute_priority_scores(&syllabus, &frequency, &config.weights);
    let default_allocation = allocate_questions(
        &priority_scores,
        config.total_questions,
        config.min_allocation_score,
    );

    let paper_pattern = match &fields.reference_file {
        Some(file) => {
            let sample_text = extract_upload(file, temp_dir.path(), &config).await?;
            extract_pattern(&sample_text, &client, &config.generator_model).await
        }
        None => None,
    };

    Ok(Json(AnalyzeResponse {
        report: AnalysisReport {
            syllabus_topics: syllabus,
            frequency,
            priority_scores,
            default_allocation,
            paper_pattern,
            no_modules_detected,
        },
    }))
}

/// Write an uploaded PDF to the temp dir and run it through the
/// extraction stack. OCR is wired in only when a vision model is set.
async fn extract_upload(
    file: &UploadedFile,
    temp_dir: &Path,
    config: &Config,
) -> Result<String, ApiError> {
    let path = temp_dir.join(sanitize_filename(&file.filename));
    tokio::fs::write(&path, &file.data)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store upload: {}", e)))?;

    let backend = MupdfBackend::new();
    let rules = GarbleRules::default();

    let result = if config.vision_model.is_some() {
        let service = OcrService::with_engine(Box::new(ocr_client(config)));
        extract_document_text(
            &path,
            &backend,
            Some(OcrFallback {
                rasterizer: &backend,
                service: &service,
            }),
            &rules,
        )
        .await
    } else {
        extract_document_text(&path, &backend, None, &rules).await
    };

    result.map_err(|e| ApiError::bad_request(format!("{}: {}", file.filename, e)))
}

fn ocr_client(config: &Config) -> GroqClient {
    let mut ocr = GroqClient::new(config.api_key.clone().unwrap_or_default());
    if let Some(model) = &config.vision_model {
        ocr = ocr.with_vision_model(model.clone());
    }
    ocr
}

/// Keep only the final path component so uploads can't escape the
/// temp directory.
fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("upload.pdf");
    if base.is_empty() {
        "upload.pdf".to_string()
    } else {
        base.to_string()
    }
}
