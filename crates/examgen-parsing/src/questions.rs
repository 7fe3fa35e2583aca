//! Splitting previous-year-question text into candidate fragments.

/// Fragments shorter than this are treated as noise (headers, marks
/// columns, "attempt any three" instructions) and dropped.
pub const DEFAULT_MIN_FRAGMENT_LEN: usize = 30;

/// Split raw question-paper text on the question-mark delimiter.
///
/// Deliberately naive: question papers are question-dense enough that
/// `?` boundaries recover most items, and the downstream classifier is
/// tolerant of partial fragments.
pub fn split_questions(text: &str, min_len: usize) -> Vec<String> {
    text.split('?')
        .map(str::trim)
        .filter(|fragment| fragment.len() >= min_len)
        .map(|fragment| fragment.to_string())
        .collect()
}
