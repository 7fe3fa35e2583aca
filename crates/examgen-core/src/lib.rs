use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod allocate;
pub mod chat;
pub mod classify;
pub mod config_file;
pub mod generate;
pub mod llm;
pub mod pattern;
pub mod scoring;
pub mod syllabus;

// Re-export for convenience
pub use allocate::{DEFAULT_MIN_ALLOCATION_SCORE, allocate_questions};
pub use classify::{ClassifyEvent, classify_frequency};
pub use examgen_parsing::{SyllabusRules, split_questions};
pub use llm::{CompletionError, CompletionRequest, ResponseFormat, TextCompletion};
pub use scoring::{ScoringWeights, compute_priority_scores};

/// Topic name → allocated teaching hours, parsed once per run from the
/// syllabus. Keys are unique; immutable after parse.
pub type TopicHours = BTreeMap<String, u32>;

/// Topic name → occurrence count in previous-year questions. Keys are
/// always a subset of the syllabus topics.
pub type FrequencyTable = BTreeMap<String, u32>;

/// Topic name → priority in [0, 1], rounded to 3 decimals.
pub type PriorityScores = BTreeMap<String, f64>;

/// Topic (or section) name → allocated question count.
pub type Allocation = BTreeMap<String, u32>;

/// One section of a detected exam pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSection {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
    pub marks_per_question: u32,
    /// Questions the candidate must attempt. An internal-choice question
    /// ("answer part a OR part b") counts as one.
    pub questions_to_attempt: u32,
    pub total_questions: u32,
}

/// Structured description of a sample paper, produced by one constrained
/// generation call. Absent pattern means default per-topic allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamPattern {
    pub sections: Vec<PatternSection>,
}

impl ExamPattern {
    /// Clamp `questions_to_attempt` down to `total_questions` wherever a
    /// parsed section violates the choice invariant.
    pub fn enforce_choice_invariant(&mut self) {
        for section in &mut self.sections {
            if section.questions_to_attempt > section.total_questions {
                tracing::warn!(
                    section = %section.label,
                    attempt = section.questions_to_attempt,
                    total = section.total_questions,
                    "clamping questions_to_attempt to total_questions"
                );
                section.questions_to_attempt = section.total_questions;
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        self.sections
            .iter()
            .all(|s| s.questions_to_attempt <= s.total_questions)
    }
}

/// One generated block of the output paper: a section or topic heading
/// plus its question text. `is_error` marks inline failure placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperBlock {
    pub heading: String,
    pub body: String,
    pub is_error: bool,
}

/// The terminal artifact: an ordered sequence of generated blocks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratedPaper {
    pub blocks: Vec<PaperBlock>,
}

impl GeneratedPaper {
    pub fn to_markdown(&self) -> String {
        self.blocks
            .iter()
            .map(|b| format!("## {}\n\n{}", b.heading, b.body))
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")
    }

    /// True if at least one block carries real content.
    pub fn has_content(&self) -> bool {
        self.blocks.iter().any(|b| !b.is_error)
    }
}

/// Everything the analysis stage produces, returned as one unit to the
/// CLI/web layers. Each field is computed by exactly one component and
/// consumed read-only downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub syllabus_topics: TopicHours,
    pub frequency: FrequencyTable,
    pub priority_scores: PriorityScores,
    pub default_allocation: Allocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper_pattern: Option<ExamPattern>,
    /// Set when no topics were detected and the caller should warn the
    /// user and proceed in the degraded equal-weights mode.
    #[serde(default)]
    pub no_modules_detected: bool,
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("completion backend error: {0}")]
    Completion(#[from] CompletionError),
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Runtime configuration for one analysis/generation run.
#[derive(Clone)]
pub struct Config {
    pub api_key: Option<String>,
    /// Model used for per-fragment question classification.
    pub classifier_model: String,
    /// Model used for pattern extraction, generation, and chat.
    pub generator_model: String,
    /// Vision model used by the OCR fallback; `None` disables it.
    pub vision_model: Option<String>,
    pub weights: ScoringWeights,
    pub syllabus_rules: SyllabusRules,
    pub min_fragment_len: usize,
    pub min_allocation_score: f64,
    pub total_questions: u32,
    /// How many of the highest-priority topics to feed pattern-mode
    /// generation prompts.
    pub focus_topics: usize,
    /// Advisory wall-clock ceiling for generation; partial output is
    /// returned once exceeded.
    pub generation_deadline_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            classifier_model: "llama-3.1-8b-instant".to_string(),
            generator_model: "llama-3.3-70b-versatile".to_string(),
            vision_model: None,
            weights: ScoringWeights::default(),
            syllabus_rules: SyllabusRules::default(),
            min_fragment_len: examgen_parsing::DEFAULT_MIN_FRAGMENT_LEN,
            min_allocation_score: DEFAULT_MIN_ALLOCATION_SCORE,
            total_questions: 10,
            focus_topics: 10,
            generation_deadline_secs: Some(300),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("classifier_model", &self.classifier_model)
            .field("generator_model", &self.generator_model)
            .field("vision_model", &self.vision_model)
            .field("weights", &self.weights)
            .field("syllabus_rules", &self.syllabus_rules)
            .field("min_fragment_len", &self.min_fragment_len)
            .field("min_allocation_score", &self.min_allocation_score)
            .field("total_questions", &self.total_questions)
            .field("focus_topics", &self.focus_topics)
            .field(
                "generation_deadline_secs",
                &self.generation_deadline_secs,
            )
            .finish()
    }
}

impl Config {
    /// Fail fast when no credential is configured, before any network
    /// call is attempted.
    pub fn require_api_key(&self) -> Result<&str, CoreError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                CoreError::Configuration(
                    "missing API key (set GROQ_API_KEY or [api_keys] groq_key)".to_string(),
                )
            })
    }
}

/// Truncate to at most `max_chars` characters on a char boundary.
/// Prompt payloads are capped this way before being sent to the backend.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
