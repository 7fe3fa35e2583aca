//! Syllabus parsing with LLM fallback.
//!
//! The regex pass from `examgen-parsing` runs first. Only when it yields
//! nothing and a backend is available is one JSON-constrained completion
//! issued; a failed fallback degrades to the empty "no modules detected"
//! state rather than raising.

use examgen_parsing::{SyllabusRules, parse_lenient_json};

use crate::llm::{CompletionRequest, TextCompletion};
use crate::{TopicHours, truncate_chars};

const SYLLABUS_PROMPT_CAP: usize = 12_000;

/// Parse syllabus text into topic → hours, regex first, LLM fallback.
pub async fn parse_syllabus_with_fallback(
    text: &str,
    rules: &SyllabusRules,
    backend: Option<&dyn TextCompletion>,
    model: &str,
) -> TopicHours {
    let topics = examgen_parsing::parse_syllabus(text, rules);
    if !topics.is_empty() {
        return topics;
    }

    let Some(backend) = backend else {
        return TopicHours::new();
    };

    tracing::info!("regex pass found no topics, trying LLM fallback");
    let prompt = fallback_prompt(text, rules);
    let request = CompletionRequest::new(model, &prompt)
        .with_temperature(0.0)
        .with_max_tokens(1024)
        .json();

    match backend.complete(request).await {
        Ok(raw) => topics_from_json(&raw, rules),
        Err(e) => {
            tracing::warn!(error = %e, "syllabus LLM fallback failed");
            TopicHours::new()
        }
    }
}

fn fallback_prompt(text: &str, rules: &SyllabusRules) -> String {
    format!(
        "Extract the course topics and their allocated teaching hours from the \
         syllabus text below.\n\n\
         Syllabus text:\n{}\n\n\
         Respond with a single JSON object mapping each topic name to an integer \
         number of hours, e.g. {{\"Graph Algorithms\": 10}}. If hours are not \
         stated explicitly, estimate them from content length or mark \
         distribution. Hours must be between {} and {}. No other keys, no prose.",
        truncate_chars(text, SYLLABUS_PROMPT_CAP),
        rules.min_hours,
        rules.max_hours,
    )
}

/// Decode the fallback response. Anything unusable degrades to empty.
fn topics_from_json(raw: &str, rules: &SyllabusRules) -> TopicHours {
    let Some(value) = parse_lenient_json(raw) else {
        tracing::warn!("syllabus fallback response was not parseable JSON");
        return TopicHours::new();
    };
    let Some(object) = value.as_object() else {
        return TopicHours::new();
    };

    object
        .iter()
        .filter_map(|(topic, hours)| {
            let topic = topic.trim();
            let hours = hours.as_u64()?;
            let hours = u32::try_from(hours).ok()?;
            (topic.len() >= rules.min_topic_len
                && hours >= rules.min_hours
                && hours <= rules.max_hours)
                .then(|| (topic.to_string(), hours))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::{MockCompletion, MockResponse};

    #[tokio::test]
    async fn regex_hit_skips_backend() {
        let mock = MockCompletion::always("{}");
        let text = "Module 1\nIntroduction to Algebra\n8\n";
        let topics = parse_syllabus_with_fallback(
            text,
            &SyllabusRules::default(),
            Some(&mock),
            "test-model",
        )
        .await;
        assert_eq!(topics.get("Introduction to Algebra"), Some(&8));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn fallback_parses_fenced_json() {
        let mock = MockCompletion::always(
            "```json\n{\"Graph Algorithms\": 10, \"Sorting\": 6}\n```",
        );
        let topics = parse_syllabus_with_fallback(
            "prose syllabus with no structure",
            &SyllabusRules::default(),
            Some(&mock),
            "test-model",
        )
        .await;
        assert_eq!(topics.get("Graph Algorithms"), Some(&10));
        assert_eq!(topics.get("Sorting"), Some(&6));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn fallback_failure_degrades_to_empty() {
        let mock =
            MockCompletion::with_sequence(vec![MockResponse::Error("backend down".into())]);
        let topics = parse_syllabus_with_fallback(
            "unstructured",
            &SyllabusRules::default(),
            Some(&mock),
            "test-model",
        )
        .await;
        assert!(topics.is_empty());
    }

    #[tokio::test]
    async fn fallback_filters_out_of_range_hours() {
        let mock = MockCompletion::always("{\"Revision Week\": 50, \"Graphs\": 8}");
        let topics = parse_syllabus_with_fallback(
            "unstructured",
            &SyllabusRules::default(),
            Some(&mock),
            "test-model",
        )
        .await;
        assert_eq!(topics.len(), 1);
        assert_eq!(topics.get("Graphs"), Some(&8));
    }

    #[tokio::test]
    async fn no_backend_yields_empty() {
        let topics =
            parse_syllabus_with_fallback("unstructured", &SyllabusRules::default(), None, "m")
                .await;
        assert!(topics.is_empty());
    }
}
