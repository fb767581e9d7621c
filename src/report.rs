use std::fmt::{Display, Write};

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::heatmap::{self, HeatmapGrid, PeakCell, DAYS, HOURS, INTENSITY_LEVELS};
use crate::models::Submission;
use crate::questions::PollDefinition;
use crate::tally::{self, Tally, NO_TOP_ANSWER};

const HEAT_GLYPHS: [&str; INTENSITY_LEVELS] = ["·", "▁", "▂", "▃", "▅", "▆", "█"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_responses: usize,
    pub emails_collected: usize,
    pub question_count: usize,
    pub latest_response: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionRow {
    pub label: String,
    pub count: usize,
    pub percent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionAnalytics {
    pub number: usize,
    pub headline: String,
    pub multi_select: bool,
    pub top_answer: String,
    pub options: Vec<OptionRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionAnalytics {
    pub name: String,
    pub questions: Vec<QuestionAnalytics>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakActivity {
    pub day: usize,
    pub hour: usize,
    pub day_label: String,
    pub hour_label: String,
}

impl From<PeakCell> for PeakActivity {
    fn from(cell: PeakCell) -> Self {
        PeakActivity {
            day: cell.day,
            hour: cell.hour,
            day_label: cell.day_label().to_string(),
            hour_label: cell.hour_label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapView {
    pub grid: HeatmapGrid,
    /// Absent when the grid is empty.
    pub peak: Option<PeakActivity>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analytics {
    pub summary: Summary,
    pub heatmap: HeatmapView,
    pub sections: Vec<SectionAnalytics>,
}

/// Share of all responses, one decimal, or `"0"` when there are none.
pub fn format_percent(count: usize, total: usize) -> String {
    if total == 0 {
        return "0".to_string();
    }
    format!("{:.1}", count as f64 / total as f64 * 100.0)
}

fn question_analytics(number: usize, tally: &Tally, total: usize) -> QuestionAnalytics {
    QuestionAnalytics {
        number,
        headline: tally.headline.clone(),
        multi_select: tally.multi_select,
        top_answer: tally.top_answer_label().to_string(),
        options: tally
            .counts
            .iter()
            .map(|entry| OptionRow {
                label: entry.label.clone(),
                count: entry.count,
                percent: format_percent(entry.count, total),
            })
            .collect(),
    }
}

pub fn build_analytics<Tz: TimeZone>(
    poll: &PollDefinition,
    submissions: &[Submission],
    tz: &Tz,
) -> Analytics {
    let total = submissions.len();
    let summary = Summary {
        total_responses: total,
        emails_collected: submissions
            .iter()
            .filter(|s| s.email.as_deref().is_some_and(|e| !e.trim().is_empty()))
            .count(),
        question_count: poll.len(),
        latest_response: submissions.iter().map(|s| s.created_at).max(),
    };

    let grid = HeatmapGrid::from_instants(submissions.iter().map(|s| s.created_at), tz);
    let heatmap = HeatmapView {
        peak: grid.peak().map(PeakActivity::from),
        grid,
    };

    let tallies = tally::tally_poll(poll, submissions);
    let sections = poll
        .sections()
        .into_iter()
        .map(|section| SectionAnalytics {
            name: section.name.to_string(),
            questions: section
                .questions
                .iter()
                .map(|question| {
                    let index = question.field.index();
                    question_analytics(index + 1, &tallies[index], total)
                })
                .collect(),
        })
        .collect();

    Analytics {
        summary,
        heatmap,
        sections,
    }
}

fn render_heatmap(output: &mut String, view: &HeatmapView) {
    let _ = writeln!(output, "## Response Heatmap");
    if let Some(peak) = &view.peak {
        let _ = writeln!(output, "Peak activity: {} at {}", peak.day_label, peak.hour_label);
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "```");

    let mut hours = String::from("     ");
    for hour in (0..HOURS).step_by(3) {
        let _ = write!(hours, "{:<6}", heatmap::format_hour(hour));
    }
    let _ = writeln!(output, "{}", hours.trim_end());

    for day in 0..DAYS {
        let mut row = format!("{:<5}", heatmap::day_label(day));
        for hour in 0..HOURS {
            row.push_str(HEAT_GLYPHS[view.grid.intensity(day, hour)]);
            row.push(' ');
        }
        let _ = writeln!(output, "{}", row.trim_end());
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Less {} More", HEAT_GLYPHS.join(" "));
    let _ = writeln!(output, "```");
}

pub fn build_report<Tz>(analytics: &Analytics, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut output = String::new();
    let summary = &analytics.summary;
    let latest = summary
        .latest_response
        .map(|at| at.with_timezone(tz).format("%Y-%m-%d %H:%M %:z").to_string())
        .unwrap_or_else(|| NO_TOP_ANSWER.to_string());

    let _ = writeln!(output, "# Poll Analytics");
    let _ = writeln!(output);
    let _ = writeln!(output, "- Total responses: {}", summary.total_responses);
    let _ = writeln!(output, "- Emails collected: {}", summary.emails_collected);
    let _ = writeln!(output, "- Questions: {}", summary.question_count);
    let _ = writeln!(output, "- Latest response: {}", latest);
    let _ = writeln!(output);

    if summary.total_responses == 0 {
        let _ = writeln!(output, "## No responses yet");
        let _ = writeln!(
            output,
            "Share the poll link with your community to start collecting responses."
        );
        return output;
    }

    render_heatmap(&mut output, &analytics.heatmap);

    for section in &analytics.sections {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {}", section.name);

        for question in &section.questions {
            let _ = writeln!(output);
            let kind = if question.multi_select { " (multi-select)" } else { "" };
            let _ = writeln!(
                output,
                "### {}/{} {}{}",
                question.number, summary.question_count, question.headline, kind
            );
            let _ = writeln!(output, "Top answer: {}", question.top_answer);
            for option in &question.options {
                let _ = writeln!(
                    output,
                    "- {}: {} ({}%)",
                    option.label, option.count, option.percent
                );
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnswerField, AnswerSet};

    fn submission(
        id: i32,
        email: Option<&str>,
        picks: &[(AnswerField, &str)],
        at: &str,
    ) -> Submission {
        let mut answers = AnswerSet::default();
        for (field, value) in picks {
            answers.answers[field.index()] = Some(value.to_string());
        }
        Submission {
            id,
            email: email.map(str::to_string),
            answers,
            created_at: heatmap::parse_timestamp(at).unwrap(),
        }
    }

    fn sample() -> Vec<Submission> {
        vec![
            submission(
                1,
                Some("a@example.com"),
                &[(AnswerField::Q0, "Luxury Lover"), (AnswerField::Q19, "Travel, Arts")],
                "2024-01-07T14:30:00Z",
            ),
            submission(
                2,
                Some("  "),
                &[(AnswerField::Q0, "Luxury Lover"), (AnswerField::Q19, "Arts")],
                "2024-01-07T14:05:00Z",
            ),
            submission(3, None, &[(AnswerField::Q0, "Lifelong Learner")], "2024-01-09T08:00:00Z"),
        ]
    }

    #[test]
    fn percentages_use_one_decimal() {
        assert_eq!(format_percent(0, 0), "0");
        assert_eq!(format_percent(1, 3), "33.3");
        assert_eq!(format_percent(2, 2), "100.0");
    }

    #[test]
    fn analytics_summarise_submissions() {
        let poll = PollDefinition::builtin().unwrap();
        let analytics = build_analytics(&poll, &sample(), &Utc);

        assert_eq!(analytics.summary.total_responses, 3);
        assert_eq!(analytics.summary.emails_collected, 1);
        assert_eq!(analytics.summary.question_count, 21);
        assert_eq!(
            analytics.summary.latest_response,
            heatmap::parse_timestamp("2024-01-09T08:00:00Z")
        );

        let peak = analytics.heatmap.peak.as_ref().unwrap();
        assert_eq!((peak.day_label.as_str(), peak.hour_label.as_str()), ("Sun", "2p"));
        assert_eq!(analytics.heatmap.grid.total(), 3);

        assert_eq!(analytics.sections.len(), 8);
        let first = &analytics.sections[0].questions[0];
        assert_eq!(first.number, 1);
        assert_eq!(first.top_answer, "Luxury Lover");
        assert_eq!(first.options[0].count, 2);
        assert_eq!(first.options[0].percent, "66.7");

        let hobbies = &analytics.sections[6].questions[1];
        assert_eq!(hobbies.number, 20);
        assert!(hobbies.multi_select);
        assert_eq!(hobbies.top_answer, "Arts");
        assert_eq!(hobbies.options[0].count, 2);

        let unanswered = &analytics.sections[7].questions[0];
        assert_eq!(unanswered.top_answer, NO_TOP_ANSWER);
    }

    #[test]
    fn report_lists_sections_and_peak() {
        let poll = PollDefinition::builtin().unwrap();
        let analytics = build_analytics(&poll, &sample(), &Utc);
        let report = build_report(&analytics, &Utc);

        assert!(report.contains("- Total responses: 3"));
        assert!(report.contains("- Latest response: 2024-01-09 08:00 +00:00"));
        assert!(report.contains("Peak activity: Sun at 2p"));
        assert!(report.contains("## Pets & Hobbies"));
        assert!(report.contains("### 20/21 Hobbies? (multi-select)"));
        assert!(report.contains("- Luxury Lover: 2 (66.7%)"));
        assert!(report.contains("Sun  · "));
    }

    #[test]
    fn empty_poll_suppresses_heatmap_and_tallies() {
        let poll = PollDefinition::builtin().unwrap();
        let analytics = build_analytics(&poll, &[], &Utc);
        assert!(analytics.heatmap.peak.is_none());
        assert!(analytics.heatmap.grid.is_empty());

        let report = build_report(&analytics, &Utc);
        assert!(report.contains("## No responses yet"));
        assert!(report.contains("- Latest response: —"));
        assert!(!report.contains("Peak activity"));
        assert!(!report.contains("Top answer"));
    }

    #[test]
    fn analytics_serialize_for_charting() {
        let poll = PollDefinition::builtin().unwrap();
        let analytics = build_analytics(&poll, &sample(), &Utc);
        let json = serde_json::to_value(&analytics).unwrap();
        assert_eq!(json["summary"]["total_responses"], 3);
        assert_eq!(json["heatmap"]["grid"]["cells"][0][14], 2);
        assert_eq!(json["heatmap"]["peak"]["hour_label"], "2p");
        assert_eq!(json["sections"][0]["questions"][0]["options"][0]["label"], "Luxury Lover");
    }
}
