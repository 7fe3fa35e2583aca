//! Frequency classification of previous-year questions.
//!
//! Each candidate fragment gets one temperature-0 completion asking the
//! model to name a topic from the syllabus list. Matching is
//! case-insensitive substring containment — intentionally lossy:
//! unmatched responses undercount, and a topic whose name contains
//! another's can steal a credit. A failed fragment is skipped, never
//! fatal to the batch.

use examgen_parsing::split_questions;

use crate::llm::{CompletionRequest, TextCompletion};
use crate::{FrequencyTable, TopicHours};

/// Progress events emitted while classifying fragments.
#[derive(Debug, Clone)]
pub enum ClassifyEvent {
    Classifying {
        index: usize,
        total: usize,
    },
    Matched {
        index: usize,
        topic: String,
    },
    /// The response matched no known topic, or the call failed.
    Skipped {
        index: usize,
    },
}

/// Count topic occurrences across previous-year-question text.
///
/// Calls are issued sequentially; latency scales linearly with the
/// number of fragments. Keys of the result are always a subset of the
/// syllabus keys.
pub async fn classify_frequency(
    syllabus: &TopicHours,
    pyq_text: &str,
    backend: &dyn TextCompletion,
    model: &str,
    min_fragment_len: usize,
    mut progress: impl FnMut(ClassifyEvent),
) -> FrequencyTable {
    let mut frequency = FrequencyTable::new();
    if syllabus.is_empty() {
        return frequency;
    }

    let fragments = split_questions(pyq_text, min_fragment_len);
    let total = fragments.len();
    let topic_list = syllabus.keys().cloned().collect::<Vec<_>>().join(", ");

    for (index, fragment) in fragments.iter().enumerate() {
        progress(ClassifyEvent::Classifying { index, total });

        let prompt = classification_prompt(&topic_list, fragment);
        let request = CompletionRequest::new(model, &prompt)
            .with_temperature(0.0)
            .with_max_tokens(60);

        match backend.complete(request).await {
            Ok(response) => match match_topic(syllabus, &response) {
                Some(topic) => {
                    *frequency.entry(topic.clone()).or_insert(0) += 1;
                    progress(ClassifyEvent::Matched { index, topic });
                }
                None => {
                    progress(ClassifyEvent::Skipped { index });
                }
            },
            Err(e) => {
                tracing::warn!(fragment = index, error = %e, "classification failed, skipping fragment");
                progress(ClassifyEvent::Skipped { index });
            }
        }
    }

    frequency
}

fn classification_prompt(topic_list: &str, fragment: &str) -> String {
    format!(
        "Classify the following exam question into one of these topics:\n\
         {topic_list}\n\n\
         Question:\n{fragment}\n\n\
         Respond ONLY with the exact topic name from the list."
    )
}

/// First syllabus topic whose name appears (case-insensitively) as a
/// substring of the response.
pub fn match_topic(syllabus: &TopicHours, response: &str) -> Option<String> {
    let response_lower = response.to_lowercase();
    syllabus
        .keys()
        .find(|topic| response_lower.contains(&topic.to_lowercase()))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::{MockCompletion, MockResponse};

    fn syllabus() -> TopicHours {
        [
            ("Introduction to Algebra".to_string(), 8),
            ("Graph Theory".to_string(), 12),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn matching_is_case_insensitive_containment() {
        let topic = match_topic(&syllabus(), "introduction to algebra (basics)");
        assert_eq!(topic.as_deref(), Some("Introduction to Algebra"));
    }

    #[test]
    fn unmatched_response_is_none() {
        assert!(match_topic(&syllabus(), "Number Theory").is_none());
    }

    #[tokio::test]
    async fn counts_per_topic() {
        let mock = MockCompletion::with_sequence(vec![
            MockResponse::Text("Graph Theory".into()),
            MockResponse::Text("graph theory, clearly".into()),
            MockResponse::Text("Introduction to Algebra".into()),
        ]);
        let pyq = "Prove that every tree with n vertices has n-1 edges, showing work? \
                   Describe breadth-first search and its complexity in detail? \
                   Solve the following system of linear equations by substitution?";
        let frequency = classify_frequency(&syllabus(), pyq, &mock, "m", 30, |_| {}).await;
        assert_eq!(frequency.get("Graph Theory"), Some(&2));
        assert_eq!(frequency.get("Introduction to Algebra"), Some(&1));
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn failed_fragments_are_skipped_not_fatal() {
        let mock = MockCompletion::with_sequence(vec![
            MockResponse::Error("timeout".into()),
            MockResponse::Text("Graph Theory".into()),
        ]);
        let pyq = "Explain Dijkstra's algorithm with a worked example in full? \
                   Explain Prim's algorithm with a worked example in full?";
        let mut skipped = 0;
        let frequency = classify_frequency(&syllabus(), pyq, &mock, "m", 30, |e| {
            if matches!(e, ClassifyEvent::Skipped { .. }) {
                skipped += 1;
            }
        })
        .await;
        assert_eq!(frequency.get("Graph Theory"), Some(&1));
        assert_eq!(skipped, 1);
    }

    #[tokio::test]
    async fn unknown_topics_never_enter_the_table() {
        let mock = MockCompletion::always("Quantum Mechanics");
        let pyq = "Derive the time complexity of merge sort from its recurrence?";
        let frequency = classify_frequency(&syllabus(), pyq, &mock, "m", 30, |_| {}).await;
        assert!(frequency.is_empty());
    }

    #[tokio::test]
    async fn empty_syllabus_short_circuits() {
        let mock = MockCompletion::always("anything");
        let frequency = classify_frequency(
            &TopicHours::new(),
            "A long enough question about something?",
            &mock,
            "m",
            30,
            |_| {},
        )
        .await;
        assert!(frequency.is_empty());
        assert_eq!(mock.call_count(), 0);
    }
}
