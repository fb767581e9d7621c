use serde::Serialize;

use crate::models::Submission;
use crate::questions::{PollDefinition, Question};

/// Shown in place of a top answer when nobody picked anything.
pub const NO_TOP_ANSWER: &str = "—";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub headline: String,
    pub section: String,
    pub multi_select: bool,
    /// Every defined label, highest count first; ties keep definition order.
    pub counts: Vec<OptionCount>,
}

impl Tally {
    pub fn top_answer(&self) -> Option<&str> {
        self.counts
            .first()
            .filter(|first| first.count > 0)
            .map(|first| first.label.as_str())
    }

    pub fn top_answer_label(&self) -> &str {
        self.top_answer().unwrap_or(NO_TOP_ANSWER)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|entry| entry.count).sum()
    }
}

/// Counts how often each defined option of `question` appears in `answers`.
///
/// Values that are not one of the question's labels are ignored. Multi-select
/// answers are split on `,` and each fragment trimmed; a label repeated inside
/// one answer is counted once per occurrence.
pub fn tally_answers<'a, I>(question: &Question, answers: I) -> Tally
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut counts: Vec<OptionCount> = question
        .labels()
        .map(|label| OptionCount {
            label: label.to_string(),
            count: 0,
        })
        .collect();

    let mut bump = |value: &str| {
        if let Some(entry) = counts.iter_mut().find(|entry| entry.label == value) {
            entry.count += 1;
        }
    };

    for answer in answers {
        let Some(answer) = answer.filter(|answer| !answer.is_empty()) else {
            continue;
        };

        if question.multi_select {
            answer
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .for_each(&mut bump);
        } else {
            bump(answer);
        }
    }

    // sort_by is stable, so equal counts stay in option order
    counts.sort_by(|a, b| b.count.cmp(&a.count));

    Tally {
        headline: question.headline.clone(),
        section: question.section.clone(),
        multi_select: question.multi_select,
        counts,
    }
}

pub fn tally_question(question: &Question, submissions: &[Submission]) -> Tally {
    tally_answers(
        question,
        submissions
            .iter()
            .map(|submission| submission.answer(question.field)),
    )
}

pub fn tally_poll(poll: &PollDefinition, submissions: &[Submission]) -> Vec<Tally> {
    poll.questions()
        .iter()
        .map(|question| tally_question(question, submissions))
        .collect()
}
