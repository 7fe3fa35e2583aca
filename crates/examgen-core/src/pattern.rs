//! Exam pattern extraction from a sample paper.
//!
//! One JSON-constrained completion turns sample-paper text into a
//! structured section list. Parse failures of any kind yield `None` —
//! downstream falls back to default per-topic allocation mode.

use examgen_parsing::parse_lenient_json;

use crate::llm::{CompletionRequest, TextCompletion};
use crate::{ExamPattern, PatternSection, truncate_chars};

const SAMPLE_PROMPT_CAP: usize = 15_000;

/// Extract the exam pattern from sample-paper text, or `None` when the
/// model output is unusable.
pub async fn extract_pattern(
    sample_text: &str,
    backend: &dyn TextCompletion,
    model: &str,
) -> Option<ExamPattern> {
    let prompt = pattern_prompt(sample_text);
    let request = CompletionRequest::new(model, &prompt)
        .with_system("You are an expert exam analyzer.")
        .with_temperature(0.0)
        .with_max_tokens(1024)
        .json();

    match backend.complete(request).await {
        Ok(raw) => pattern_from_json(&raw),
        Err(e) => {
            tracing::warn!(error = %e, "pattern extraction failed");
            None
        }
    }
}

fn pattern_prompt(sample_text: &str) -> String {
    format!(
        "Analyze the following text from a sample question paper and extract the \
         exam structure.\n\n\
         Sample paper text:\n{}\n\n\
         Respond with strict JSON of the form:\n\
         {{\"sections\": [{{\"label\": \"Section A\", \"description\": \"...\", \
         \"marks_per_question\": 2, \"questions_to_attempt\": 5, \
         \"total_questions\": 7}}]}}\n\
         Rules: questions_to_attempt must not exceed total_questions. A question \
         with an internal choice (part a OR part b) counts as ONE question to \
         attempt. No prose outside the JSON object.",
        truncate_chars(sample_text, SAMPLE_PROMPT_CAP),
    )
}

/// Decode and validate a pattern response. The choice invariant is
/// enforced by clamping rather than rejecting the whole pattern.
pub fn pattern_from_json(raw: &str) -> Option<ExamPattern> {
    let value = parse_lenient_json(raw)?;

    let sections: Vec<PatternSection> = match value.get("sections") {
        Some(sections) => serde_json::from_value(sections.clone()).ok()?,
        // Tolerate a bare label → record object.
        None => value
            .as_object()?
            .iter()
            .filter_map(|(label, record)| {
                let mut section: PatternSection =
                    serde_json::from_value(record.clone()).ok()?;
                if section.label.is_empty() {
                    section.label = label.clone();
                }
                Some(section)
            })
            .collect(),
    };

    if sections.is_empty() {
        return None;
    }

    let mut pattern = ExamPattern { sections };
    pattern.enforce_choice_invariant();
    Some(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::{MockCompletion, MockResponse};

    const SECTIONS_JSON: &str = r#"{"sections": [
        {"label": "Section A", "description": "short answers",
         "marks_per_question": 2, "questions_to_attempt": 5, "total_questions": 7},
        {"label": "Section B", "description": "long answers",
         "marks_per_question": 10, "questions_to_attempt": 3, "total_questions": 5}
    ]}"#;

    #[tokio::test]
    async fn parses_sections_shape() {
        let mock = MockCompletion::always(SECTIONS_JSON);
        let pattern = extract_pattern("SECTION A ...", &mock, "m").await.unwrap();
        assert_eq!(pattern.sections.len(), 2);
        assert_eq!(pattern.sections[0].marks_per_question, 2);
        assert!(pattern.is_valid());
    }

    #[test]
    fn clamps_choice_invariant_violation() {
        let raw = r#"{"sections": [{"label": "A", "marks_per_question": 5,
                      "questions_to_attempt": 9, "total_questions": 6}]}"#;
        let pattern = pattern_from_json(raw).unwrap();
        assert_eq!(pattern.sections[0].questions_to_attempt, 6);
        assert!(pattern.is_valid());
    }

    #[test]
    fn accepts_label_keyed_object() {
        let raw = r#"{"Section A": {"label": "", "marks_per_question": 2,
                      "questions_to_attempt": 5, "total_questions": 5}}"#;
        let pattern = pattern_from_json(raw).unwrap();
        assert_eq!(pattern.sections[0].label, "Section A");
    }

    #[test]
    fn malformed_json_yields_none() {
        assert!(pattern_from_json("not json at all").is_none());
        assert!(pattern_from_json("{\"sections\": \"oops\"}").is_none());
        assert!(pattern_from_json("{\"sections\": []}").is_none());
    }

    #[tokio::test]
    async fn backend_failure_yields_none() {
        let mock = MockCompletion::with_sequence(vec![MockResponse::RateLimited]);
        assert!(extract_pattern("sample", &mock, "m").await.is_none());
    }
}
