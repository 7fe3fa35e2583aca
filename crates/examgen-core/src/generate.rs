//! Final paper generation.
//!
//! Two mutually exclusive modes: pattern mode issues one call per
//! detected section with the highest-priority topics as focus content;
//! default mode issues one call per topic with a non-zero allocation.
//! A single failed call becomes an inline error marker block — it never
//! aborts the remaining sections. An optional wall-clock deadline
//! converts the rest of the paper into timeout markers and returns what
//! was already generated.

use std::time::{Duration, Instant};

use crate::llm::{CompletionRequest, TextCompletion};
use crate::{Allocation, ExamPattern, GeneratedPaper, PaperBlock, PriorityScores};

/// Tunables for a generation run.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub model: String,
    /// How many top-priority topics pattern-mode prompts mention.
    pub focus_topics: usize,
    /// Advisory overall ceiling; checked between calls, not mid-call.
    pub deadline: Option<Duration>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Question count for the general-purpose prompt used when no
    /// pattern was found and the allocation is empty (no syllabus
    /// modules detected).
    pub fallback_questions: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "llama-3.3-70b-versatile".to_string(),
            focus_topics: 10,
            deadline: Some(Duration::from_secs(300)),
            temperature: 0.7,
            max_tokens: 1200,
            fallback_questions: 10,
        }
    }
}

/// Generate the paper. Pattern mode when `pattern` is present, default
/// per-topic mode otherwise.
pub async fn generate_paper(
    scores: &PriorityScores,
    allocation: &Allocation,
    pattern: Option<&ExamPattern>,
    backend: &dyn TextCompletion,
    options: &GenerationOptions,
) -> GeneratedPaper {
    let started = Instant::now();
    match pattern {
        Some(pattern) => {
            generate_from_pattern(scores, pattern, backend, options, started).await
        }
        None => generate_from_allocation(allocation, backend, options, started).await,
    }
}

async fn generate_from_pattern(
    scores: &PriorityScores,
    pattern: &ExamPattern,
    backend: &dyn TextCompletion,
    options: &GenerationOptions,
    started: Instant,
) -> GeneratedPaper {
    let focus = focus_topics(scores, options.focus_topics);
    let mut paper = GeneratedPaper::default();

    for section in &pattern.sections {
        if deadline_exceeded(started, options.deadline) {
            tracing::warn!(section = %section.label, "generation deadline exceeded, returning partial paper");
            paper.blocks.push(timeout_block(&section.label));
            continue;
        }

        // Attempt count of 0 means the extractor saw no explicit
        // instruction; ask for every question in the section instead.
        let question_count = if section.questions_to_attempt > 0 {
            section.questions_to_attempt
        } else {
            section.total_questions
        };

        let prompt = format!(
            "Generate {count} exam questions for \"{label}\".\n\
             Section description: {description}\n\
             Marks per question: {marks}\n\n\
             Focus on these high-priority topics:\n{focus}\n\n\
             Rules:\n\
             - Do not reproduce past question patterns verbatim\n\
             - Academic, clear, unambiguous wording\n\
             - State the marks for each question\n\
             - Professional formatting",
            count = question_count,
            label = section.label,
            description = section.description,
            marks = section.marks_per_question,
            focus = focus,
        );

        let block = request_block(
            backend,
            options,
            &prompt,
            section.label.clone(),
        )
        .await;
        paper.blocks.push(block);
    }

    paper
}

async fn generate_from_allocation(
    allocation: &Allocation,
    backend: &dyn TextCompletion,
    options: &GenerationOptions,
    started: Instant,
) -> GeneratedPaper {
    // No modules detected upstream leaves the allocation empty; fall
    // back to one general-purpose request instead of per-topic calls.
    if allocation.values().all(|&count| count == 0) {
        let count = options.fallback_questions;
        let prompt = format!(
            "Generate {count} new exam questions covering the full breadth of \
             the course material.\n\n\
             Rules:\n\
             - Avoid repeating past patterns\n\
             - Mix difficulty levels across the paper\n\
             - Maintain academic difficulty\n\
             - Professional formatting\n\
             - Include marks for each question"
        );
        let block = request_block(backend, options, &prompt, "General Questions".to_string()).await;
        return GeneratedPaper {
            blocks: vec![block],
        };
    }

    let mut paper = GeneratedPaper::default();

    for (topic, count) in allocation {
        if *count == 0 {
            continue;
        }
        let heading = format!("Topic: {topic}");
        if deadline_exceeded(started, options.deadline) {
            tracing::warn!(topic = %topic, "generation deadline exceeded, returning partial paper");
            paper.blocks.push(timeout_block(&heading));
            continue;
        }

        let prompt = format!(
            "Generate {count} new exam questions for topic: {topic}\n\n\
             Rules:\n\
             - Avoid repeating past patterns\n\
             - Create new structure\n\
             - Maintain academic difficulty\n\
             - Professional formatting\n\
             - Include marks for each question"
        );

        let block = request_block(backend, options, &prompt, heading).await;
        paper.blocks.push(block);
    }

    paper
}

async fn request_block(
    backend: &dyn TextCompletion,
    options: &GenerationOptions,
    prompt: &str,
    heading: String,
) -> PaperBlock {
    let request = CompletionRequest::new(&options.model, prompt)
        .with_system("You are an expert academic question paper setter.")
        .with_temperature(options.temperature)
        .with_max_tokens(options.max_tokens);

    match backend.complete(request).await {
        Ok(body) => PaperBlock {
            heading,
            body,
            is_error: false,
        },
        Err(e) => {
            tracing::warn!(block = %heading, error = %e, "generation failed for block");
            PaperBlock {
                heading,
                body: format!("[Error generating questions: {e}]"),
                is_error: true,
            }
        }
    }
}

fn timeout_block(heading: &str) -> PaperBlock {
    PaperBlock {
        heading: heading.to_string(),
        body: "[Skipped: generation time limit reached]".to_string(),
        is_error: true,
    }
}

fn deadline_exceeded(started: Instant, deadline: Option<Duration>) -> bool {
    deadline.is_some_and(|limit| started.elapsed() > limit)
}

/// Render the top-N topics by priority as a bulleted focus list.
fn focus_topics(scores: &PriorityScores, n: usize) -> String {
    let mut ranked: Vec<(&String, &f64)> = scores.iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked
        .into_iter()
        .take(n)
        .map(|(topic, score)| format!("- {topic} (priority {score:.3})"))
        .collect::<Vec<_>>()
        .join("\n")
}
