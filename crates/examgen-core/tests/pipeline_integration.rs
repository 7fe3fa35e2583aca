//! End-to-end pipeline tests over a scripted completion backend:
//! syllabus text in, generated paper out, with the scoring and
//! allocation stages checked at each seam.

use examgen_core::generate::{GenerationOptions, generate_paper};
use examgen_core::llm::mock::{MockCompletion, MockResponse};
use examgen_core::syllabus::parse_syllabus_with_fallback;
use examgen_core::{
    ClassifyEvent, SyllabusRules, allocate_questions, classify_frequency,
    compute_priority_scores, scoring::ScoringWeights,
};

const SYLLABUS: &str = "\
Module 1
Introduction to Algebra
8

Module 2
Linear Equations
4
";

// Two questions on Algebra, one on Linear Equations. Each fragment has
// to clear the 30-char minimum after the '?' split.
const PYQ: &str = "\
Solve the quadratic using basic algebraic manipulation techniques?\
 Explain how the rules of introductory algebra apply to polynomials?\
 Rewrite the system of linear equations in matrix form and solve it?";

#[tokio::test]
async fn full_pipeline_from_syllabus_to_allocation() {
    let rules = SyllabusRules::default();
    let syllabus = parse_syllabus_with_fallback(SYLLABUS, &rules, None, "unused").await;
    assert_eq!(syllabus.get("Introduction to Algebra"), Some(&8));
    assert_eq!(syllabus.get("Linear Equations"), Some(&4));

    let classifier = MockCompletion::with_sequence(vec![
        MockResponse::Text("Introduction to Algebra".into()),
        MockResponse::Text("introduction to algebra".into()),
        MockResponse::Text("Linear Equations".into()),
    ]);
    let mut events = Vec::new();
    let frequency = classify_frequency(&syllabus, PYQ, &classifier, "m", 30, |e| {
        events.push(e);
    })
    .await;
    assert_eq!(classifier.call_count(), 3);
    assert_eq!(frequency.get("Introduction to Algebra"), Some(&2));
    assert_eq!(frequency.get("Linear Equations"), Some(&1));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, ClassifyEvent::Matched { .. }))
    );

    let scores = compute_priority_scores(&syllabus, &frequency, &ScoringWeights::default());
    // Algebra has both max hours and max frequency: full score.
    assert_eq!(scores["Introduction to Algebra"], 1.0);
    // 0.6 * (4/8) + 0.4 * (1/2) = 0.5
    assert_eq!(scores["Linear Equations"], 0.5);

    let allocation = allocate_questions(&scores, 10, 0.1);
    assert_eq!(allocation["Introduction to Algebra"], 6);
    assert_eq!(allocation["Linear Equations"], 3);
}

#[tokio::test]
async fn default_mode_generation_produces_topic_blocks() {
    let rules = SyllabusRules::default();
    let syllabus = parse_syllabus_with_fallback(SYLLABUS, &rules, None, "unused").await;
    let frequency = [("Introduction to Algebra".to_string(), 2u32)]
        .into_iter()
        .collect();
    let scores = compute_priority_scores(&syllabus, &frequency, &ScoringWeights::default());
    let allocation = allocate_questions(&scores, 10, 0.1);

    let generator = MockCompletion::always("1. What is a variable?\n2. Simplify 2x + 3x.");
    let options = GenerationOptions {
        model: "m".into(),
        ..Default::default()
    };
    let paper = generate_paper(&scores, &allocation, None, &generator, &options).await;

    assert!(paper.has_content());
    // One block per allocated topic, with the topic in the heading.
    let markdown = paper.to_markdown();
    assert!(markdown.contains("Topic: Introduction to Algebra"));
    assert_eq!(
        generator.call_count(),
        allocation.values().filter(|&&n| n > 0).count()
    );
    assert!(paper.blocks.iter().all(|b| !b.is_error));
}

#[tokio::test]
async fn generation_error_becomes_inline_block() {
    let scores = [("Graph Theory".to_string(), 0.9f64)].into_iter().collect();
    let allocation = [("Graph Theory".to_string(), 4u32)].into_iter().collect();

    let generator = MockCompletion::with_sequence(vec![MockResponse::Error("connection reset".into())]);
    let options = GenerationOptions {
        model: "m".into(),
        ..Default::default()
    };
    let paper = generate_paper(&scores, &allocation, None, &generator, &options).await;

    assert_eq!(paper.blocks.len(), 1);
    assert!(paper.blocks[0].is_error);
    assert!(paper.blocks[0].body.contains("connection reset"));
}

#[tokio::test]
async fn no_detected_modules_yields_one_general_block() {
    // Nothing module-shaped here, and no LLM fallback to lean on.
    let rules = SyllabusRules::default();
    let topics = parse_syllabus_with_fallback("just a paragraph of prose", &rules, None, "m").await;
    assert!(topics.is_empty());

    // Downstream stages stay empty rather than inventing a topic.
    let scores = compute_priority_scores(&topics, &Default::default(), &ScoringWeights::default());
    let allocation = allocate_questions(&scores, 10, 0.1);
    assert!(scores.is_empty());
    assert!(allocation.is_empty());

    let generator = MockCompletion::always("Q1. Anything at all. (5 marks)");
    let options = GenerationOptions {
        model: "m".into(),
        fallback_questions: 10,
        ..Default::default()
    };
    let paper = generate_paper(&scores, &allocation, None, &generator, &options).await;

    assert_eq!(paper.blocks.len(), 1);
    assert_eq!(paper.blocks[0].heading, "General Questions");
    assert!(!paper.blocks[0].is_error);
    assert!(generator.prompts()[0].contains("full breadth"));
}

#[tokio::test]
async fn llm_fallback_parses_when_regex_finds_nothing() {
    // Prose syllabus that the layout regexes can't handle.
    let prose = "This course spends a while on graph theory and a bit on hashing.";
    let backend = MockCompletion::always(
        r#"{"Graph Theory": 10, "Hashing": 4, "Too Short": 50}"#,
    );
    let rules = SyllabusRules::default();
    let topics = parse_syllabus_with_fallback(prose, &rules, Some(&backend), "m").await;

    assert_eq!(backend.call_count(), 1);
    assert_eq!(topics.get("Graph Theory"), Some(&10));
    assert_eq!(topics.get("Hashing"), Some(&4));
    // 50 hours is outside the accepted range.
    assert!(!topics.contains_key("Too Short"));
}
