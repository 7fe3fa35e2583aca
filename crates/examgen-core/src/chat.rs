//! Conversational assistant over the current analysis context.

use serde::{Deserialize, Serialize};

use crate::llm::{CompletionRequest, TextCompletion};
use crate::ExamPattern;

/// Analysis state the assistant can talk about.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatContext {
    #[serde(default)]
    pub syllabus_topics: Vec<String>,
    #[serde(default)]
    pub paper_pattern: Option<ExamPattern>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    /// Advisory action hint for the caller's UI, e.g.
    /// `"regenerate_suggestion"`. Never executed here.
    pub action: Option<String>,
}

/// Answer a user message against the analysis context.
///
/// Backend errors come back as the reply text rather than an error —
/// the chat surface stays up even when the model is unavailable.
pub async fn process_message(
    message: &str,
    context: &ChatContext,
    backend: &dyn TextCompletion,
    model: &str,
) -> ChatReply {
    let pattern_json = context
        .paper_pattern
        .as_ref()
        .and_then(|p| serde_json::to_string_pretty(p).ok())
        .unwrap_or_else(|| "none detected".to_string());

    let system = format!(
        "You are an expert exam-setter assistant for a question paper generator.\n\n\
         Context:\n\
         - Syllabus topics: {:?}\n\
         - Current pattern: {}\n\n\
         Capabilities:\n\
         1. Answer questions about the syllabus or analyzed topics.\n\
         2. Suggest questions for specific modules.\n\
         3. Help refine the paper pattern.\n\n\
         Be concise and professional. If the user asks to change the pattern or \
         regenerate, acknowledge it and point them at the generation controls.",
        context.syllabus_topics, pattern_json,
    );

    let request = CompletionRequest::new(model, message)
        .with_system(&system)
        .with_temperature(0.7)
        .with_max_tokens(500);

    let reply = match backend.complete(request).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "chat completion failed");
            format!("Error interacting with the model: {e}")
        }
    };

    ChatReply {
        reply,
        action: detect_intent(message),
    }
}

/// Clean up free-form header text into at most four printable lines for
/// the rendered PDF. Falls back to the raw lines when the model call
/// fails — a broken assistant must not block the download.
pub async fn refine_header_lines(
    raw: &str,
    backend: &dyn TextCompletion,
    model: &str,
) -> Vec<String> {
    let prompt = format!(
        "Rewrite the following institution header for the top of an exam paper. \
         Return at most 4 lines: institution name first, then optional \
         subtitle/details lines. Fix casing and spacing. Output only the lines, \
         one per line, no commentary.\n\n{raw}"
    );
    let request = CompletionRequest::new(model, &prompt)
        .with_temperature(0.0)
        .with_max_tokens(120);

    let text = match backend.complete(request).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "header refinement failed, using raw lines");
            raw.to_string()
        }
    };

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(4)
        .map(String::from)
        .collect()
}

fn detect_intent(message: &str) -> Option<String> {
    let lower = message.to_lowercase();
    if lower.contains("regenerate") || lower.contains("create new") {
        Some("regenerate_suggestion".to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::{MockCompletion, MockResponse};

    #[tokio::test]
    async fn replies_and_detects_regenerate_intent() {
        let mock = MockCompletion::always("Sure, here is a suggestion.");
        let context = ChatContext {
            syllabus_topics: vec!["Graph Theory".to_string()],
            paper_pattern: None,
        };
        let reply =
            process_message("Please regenerate section A", &context, &mock, "m").await;
        assert_eq!(reply.reply, "Sure, here is a suggestion.");
        assert_eq!(reply.action.as_deref(), Some("regenerate_suggestion"));
    }

    #[tokio::test]
    async fn backend_error_becomes_reply_text() {
        let mock = MockCompletion::with_sequence(vec![MockResponse::Error("down".into())]);
        let reply = process_message("hello", &ChatContext::default(), &mock, "m").await;
        assert!(reply.reply.contains("Error interacting"));
        assert!(reply.action.is_none());
    }

    #[tokio::test]
    async fn header_refinement_caps_at_four_lines() {
        let mock = MockCompletion::always("One\nTwo\nThree\nFour\nFive");
        let lines = refine_header_lines("raw header", &mock, "m").await;
        assert_eq!(lines.len(), 4);
    }

    #[tokio::test]
    async fn header_refinement_falls_back_to_raw() {
        let mock = MockCompletion::with_sequence(vec![MockResponse::RateLimited]);
        let lines = refine_header_lines("My College\nPune", &mock, "m").await;
        assert_eq!(lines, vec!["My College".to_string(), "Pune".to_string()]);
    }
}
