use std::io::Write;

use examgen_core::AnalysisReport;
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the topic table: hours, PYQ frequency, priority, allocation.
pub fn print_analysis_summary(
    w: &mut dyn Write,
    report: &AnalysisReport,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w, "Found {} syllabus topics", report.syllabus_topics.len())?;
    writeln!(w)?;
    writeln!(
        w,
        "{:<40} {:>5} {:>5} {:>8} {:>9}",
        "Topic", "Hours", "Freq", "Priority", "Questions"
    )?;
    writeln!(w, "{}", "-".repeat(70))?;

    for (topic, hours) in &report.syllabus_topics {
        let freq = report.frequency.get(topic).copied().unwrap_or(0);
        let score = report.priority_scores.get(topic).copied().unwrap_or(0.0);
        let count = report.default_allocation.get(topic).copied().unwrap_or(0);

        let short = if topic.chars().count() > 38 {
            let truncated: String = topic.chars().take(35).collect();
            format!("{truncated}...")
        } else {
            topic.clone()
        };

        let row = format!("{short:<40} {hours:>5} {freq:>5} {score:>8.3} {count:>9}");
        if color.enabled() && count > 0 {
            writeln!(w, "{}", row.green())?;
        } else if color.enabled() {
            writeln!(w, "{}", row.dimmed())?;
        } else {
            writeln!(w, "{row}")?;
        }
    }

    if let Some(pattern) = &report.paper_pattern {
        writeln!(w)?;
        writeln!(w, "Paper pattern ({} sections):", pattern.sections.len())?;
        for section in &pattern.sections {
            writeln!(
                w,
                "  {}: {} questions x {} marks (attempt {})",
                section.label,
                section.total_questions,
                section.marks_per_question,
                section.questions_to_attempt
            )?;
        }
    }
    writeln!(w)?;
    Ok(())
}

/// Warn that syllabus parsing found nothing and equal weighting is in
/// effect.
pub fn print_no_modules_warning(w: &mut dyn Write, color: ColorMode) -> std::io::Result<()> {
    let msg = "Warning: no syllabus modules detected; falling back to equal topic weighting";
    if color.enabled() {
        writeln!(w, "{}", msg.yellow())
    } else {
        writeln!(w, "{msg}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_is_plain_without_color() {
        let report = AnalysisReport {
            syllabus_topics: [("Algebra".to_string(), 8u32)].into_iter().collect(),
            frequency: [("Algebra".to_string(), 2u32)].into_iter().collect(),
            priority_scores: [("Algebra".to_string(), 1.0f64)].into_iter().collect(),
            default_allocation: [("Algebra".to_string(), 6u32)].into_iter().collect(),
            paper_pattern: None,
            no_modules_detected: false,
        };
        let mut buf = Vec::new();
        print_analysis_summary(&mut buf, &report, ColorMode(false)).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Algebra"));
        assert!(text.contains("1.000"));
        assert!(!text.contains('\u{1b}'));
    }
}
