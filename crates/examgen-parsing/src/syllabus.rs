//! Regex-first syllabus parsing: raw text → topic name → teaching hours.
//!
//! Two textual layouts are recognized:
//!
//! 1. Inline: a line ending in an hour count next to a unit token,
//!    e.g. `3. Graph Algorithms ............ 12 Hours`
//! 2. Three-line: a module index line, a topic line, and a standalone
//!    integer hours line, e.g. `Module 1\nIntroduction to Algebra\n8`
//!
//! Hour values outside the plausible range are rejected so that page
//! numbers and other stray digits don't masquerade as teaching hours.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bounds applied while parsing syllabus text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SyllabusRules {
    /// Minimum plausible teaching hours per topic.
    pub min_hours: u32,
    /// Maximum plausible teaching hours per topic.
    pub max_hours: u32,
    /// Topics shorter than this many characters are treated as noise.
    pub min_topic_len: usize,
}

impl Default for SyllabusRules {
    fn default() -> Self {
        Self {
            min_hours: 2,
            max_hours: 20,
            min_topic_len: 4,
        }
    }
}

/// Trailing hour count with a unit token, e.g. "12 Hours" or "8 hrs".
static INLINE_HOURS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s*(?:hours|hrs)\b").unwrap());

/// Leading enumeration tokens: "1.", "3 -", "2.1 " etc.
static ENUMERATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\d.\-\s)]+").unwrap());

/// Module index line: "Module 1", "Unit 3", or a bare integer.
static MODULE_INDEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:module|unit)?[\s.:\-]*(\d+)$").unwrap());

/// Parse syllabus text into a topic → hours mapping.
///
/// The inline layout is tried first across all lines; if it yields
/// nothing, the three-line layout is attempted. An empty map means no
/// topics were detected — callers decide how to degrade.
pub fn parse_syllabus(text: &str, rules: &SyllabusRules) -> BTreeMap<String, u32> {
    let topics = parse_inline_layout(text, rules);
    if !topics.is_empty() {
        return topics;
    }
    parse_three_line_layout(text, rules)
}

fn parse_inline_layout(text: &str, rules: &SyllabusRules) -> BTreeMap<String, u32> {
    let mut topics = BTreeMap::new();

    for line in text.lines() {
        let Some(m) = INLINE_HOURS_RE.captures(line) else {
            continue;
        };
        let Ok(hours) = m[1].parse::<u32>() else {
            continue;
        };
        if hours < rules.min_hours || hours > rules.max_hours {
            continue;
        }

        let full = m.get(0).map(|g| g.start()).unwrap_or(0);
        let topic = clean_topic(&line[..full]);
        if topic.len() >= rules.min_topic_len {
            topics.insert(topic, hours);
        }
    }

    topics
}

fn parse_three_line_layout(text: &str, rules: &SyllabusRules) -> BTreeMap<String, u32> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut topics = BTreeMap::new();

    for window in lines.windows(3) {
        let [index_line, topic_line, hours_line] = window else {
            continue;
        };
        if !MODULE_INDEX_RE.is_match(index_line) {
            continue;
        }
        let Ok(hours) = hours_line.parse::<u32>() else {
            continue;
        };
        if hours < rules.min_hours || hours > rules.max_hours {
            continue;
        }

        let topic = clean_topic(topic_line);
        if topic.len() >= rules.min_topic_len && topic.parse::<u32>().is_err() {
            topics.insert(topic, hours);
        }
    }

    topics
}

/// Strip leading enumeration tokens and trailing filler punctuation.
fn clean_topic(raw: &str) -> String {
    let stripped = ENUMERATION_RE.replace(raw.trim(), "");
    stripped
        .trim_end_matches(['.', ':', '-', ' ', '\t'])
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> SyllabusRules {
        SyllabusRules::default()
    }

    #[test]
    fn inline_hours_layout() {
        let text = "1. Introduction to Algebra 8 Hours\n2. Graph Theory 12 Hrs\n";
        let topics = parse_syllabus(text, &rules());
        assert_eq!(topics.get("Introduction to Algebra"), Some(&8));
        assert_eq!(topics.get("Graph Theory"), Some(&12));
    }

    #[test]
    fn three_line_module_layout() {
        let text = "Module 1\nIntroduction to Algebra\n8\n";
        let topics = parse_syllabus(text, &rules());
        assert_eq!(topics.get("Introduction to Algebra"), Some(&8));
        assert_eq!(topics.len(), 1);
    }

    #[test]
    fn bare_integer_module_index() {
        let text = "1\nLinear Data Structures\n6\n2\nTrees and Heaps\n10\n";
        let topics = parse_syllabus(text, &rules());
        assert_eq!(topics.get("Linear Data Structures"), Some(&6));
        assert_eq!(topics.get("Trees and Heaps"), Some(&10));
    }

    #[test]
    fn rejects_out_of_range_hours() {
        // 50 looks like a page number, not teaching hours.
        let text = "Module 1\nIntroduction to Algebra\n50\n";
        let topics = parse_syllabus(text, &rules());
        assert!(topics.is_empty());

        let text = "Appendix Reading 50 Hours\n";
        assert!(parse_syllabus(text, &rules()).is_empty());
    }

    #[test]
    fn rejects_short_topics() {
        let text = "Module 1\nAI\n8\n";
        let topics = parse_syllabus(text, &rules());
        assert!(topics.is_empty());
    }

    #[test]
    fn strips_enumeration_prefix() {
        let text = "3.2 Dynamic Programming 10 Hours\n";
        let topics = parse_syllabus(text, &rules());
        assert_eq!(topics.get("Dynamic Programming"), Some(&10));
    }

    #[test]
    fn duplicate_topics_keep_one_entry() {
        let text = "Sorting Networks 8 Hours\nSorting Networks 10 Hours\n";
        let topics = parse_syllabus(text, &rules());
        assert_eq!(topics.len(), 1);
    }

    #[test]
    fn empty_text_yields_empty_map() {
        assert!(parse_syllabus("", &rules()).is_empty());
    }

    #[test]
    fn hours_line_is_not_a_topic() {
        // "8" alone must never become a topic entry in the 3-line scan.
        let text = "Module 1\n8\n8\n";
        assert!(parse_syllabus(text, &rules()).is_empty());
    }
}
