//! Pure text parsing for the exam analysis pipeline.
//!
//! Everything in this crate is deterministic and offline: syllabus
//! topic/hours extraction, question-fragment splitting, and lenient JSON
//! recovery for generative-backend output. Network-dependent fallbacks
//! live in `examgen-core`.

pub mod json_recovery;
pub mod questions;
pub mod syllabus;

pub use json_recovery::parse_lenient_json;
pub use questions::{DEFAULT_MIN_FRAGMENT_LEN, split_questions};
pub use syllabus::{SyllabusRules, parse_syllabus};
