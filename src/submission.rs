use std::collections::HashSet;

use crate::error::SubmissionError;
use crate::models::{AnswerSet, NewSubmission, SubmissionInput};
use crate::questions::{PollDefinition, Question};

const EXCLUSIVE_LABEL: &str = "None";
const SINGLE_COLUMN_WIDTH: usize = 255;
const MULTI_COLUMN_WIDTH: usize = 512;
const EMAIL_WIDTH: usize = 320;

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn check_width(field: &str, value: &str, limit: usize) -> Result<(), SubmissionError> {
    if value.chars().count() > limit {
        return Err(SubmissionError::TooLong {
            field: field.to_string(),
            limit,
        });
    }
    Ok(())
}

fn validate_email(email: Option<&str>) -> Result<Option<String>, SubmissionError> {
    let Some(email) = non_blank(email) else {
        return Ok(None);
    };
    if !email.contains('@') || email.len() < 3 {
        return Err(SubmissionError::InvalidEmail(email.to_string()));
    }
    check_width("email", email, EMAIL_WIDTH)?;
    Ok(Some(email.to_string()))
}

/// Checks one raw answer and returns the selected labels.
fn selected_labels<'a>(
    question: &Question,
    raw: &'a str,
) -> Result<Vec<&'a str>, SubmissionError> {
    let index = question.field.index();

    if !question.multi_select {
        if !question.has_label(raw) {
            return Err(SubmissionError::UnknownOption {
                index,
                value: raw.to_string(),
            });
        }
        check_width(question.field.column(), raw, SINGLE_COLUMN_WIDTH)?;
        return Ok(vec![raw]);
    }

    check_width(question.field.column(), raw, MULTI_COLUMN_WIDTH)?;

    let mut seen = HashSet::new();
    let mut labels = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        if !question.has_label(part) {
            return Err(SubmissionError::UnknownOption {
                index,
                value: part.to_string(),
            });
        }
        if !seen.insert(part) {
            return Err(SubmissionError::RepeatedOption {
                index,
                label: part.to_string(),
            });
        }
        labels.push(part);
    }

    if labels.len() > 1 && labels.contains(&EXCLUSIVE_LABEL) {
        return Err(SubmissionError::NoneNotExclusive { index });
    }
    if let Some(max) = question.max_select {
        if labels.len() > max {
            return Err(SubmissionError::TooManySelections {
                index,
                selected: labels.len(),
                max,
            });
        }
    }

    Ok(labels)
}

/// Applies the questionnaire's selection rules to a submit payload.
///
/// Multi-select answers are normalised to a `,`-joined list without spaces.
/// A conditional free-text value is kept only when its trigger is selected.
pub fn validate_submission(
    poll: &PollDefinition,
    input: &SubmissionInput,
) -> Result<NewSubmission, SubmissionError> {
    let email = validate_email(input.email.as_deref())?;
    let mut answers = AnswerSet::default();

    for question in poll.questions() {
        let Some(raw) = non_blank(input.answer(question.field)) else {
            continue;
        };
        let labels = selected_labels(question, raw)?;

        if let Some(prompt) = &question.conditional {
            let triggered = labels.contains(&prompt.trigger.as_str());
            let text = non_blank(input.conditional(prompt.field)).filter(|_| triggered);
            if let Some(text) = text {
                check_width(prompt.field.column(), text, SINGLE_COLUMN_WIDTH)?;
            }
            answers.set_conditional(prompt.field, text.map(str::to_string));
        }

        answers.answers[question.field.index()] = Some(labels.join(","));
    }

    Ok(NewSubmission {
        email,
        answers,
        created_at: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnswerField, ConditionalField};

    fn poll() -> PollDefinition {
        PollDefinition::builtin().unwrap()
    }

    #[test]
    fn accepts_a_complete_response() {
        let input: SubmissionInput = serde_json::from_str(
            r#"{
                "email": "  resident@example.com ",
                "q0": "Luxury Lover",
                "q9": "Yes",
                "q9Ages": " 4 and 7 ",
                "q14": "Yoga / Pilates, Meditation",
                "q18": "Dog(s)",
                "q18Other": "Parrot",
                "q20": "Text"
            }"#,
        )
        .unwrap();

        let submission = validate_submission(&poll(), &input).unwrap();
        assert_eq!(submission.email.as_deref(), Some("resident@example.com"));
        assert_eq!(submission.answers.answer(AnswerField::Q0), Some("Luxury Lover"));
        assert_eq!(
            submission.answers.answer(AnswerField::Q14),
            Some("Yoga / Pilates,Meditation")
        );
        assert_eq!(
            submission.answers.conditional(ConditionalField::ChildrenAges),
            Some("4 and 7")
        );
        // "Other" was not picked, so the free text is dropped
        assert_eq!(submission.answers.conditional(ConditionalField::OtherPet), None);
        assert_eq!(submission.answers.answer(AnswerField::Q1), None);
    }

    #[test]
    fn blank_fields_are_absent() {
        let input = SubmissionInput {
            email: Some("".to_string()),
            q3: Some("   ".to_string()),
            ..SubmissionInput::default()
        };
        let submission = validate_submission(&poll(), &input).unwrap();
        assert_eq!(submission.email, None);
        assert_eq!(submission.answers, AnswerSet::default());
    }

    #[test]
    fn rejects_unknown_single_select_value() {
        let input = SubmissionInput {
            q1: Some("Stay Home".to_string()),
            ..SubmissionInput::default()
        };
        assert_eq!(
            validate_submission(&poll(), &input),
            Err(SubmissionError::UnknownOption {
                index: 1,
                value: "Stay Home".to_string()
            })
        );
    }

    #[test]
    fn enforces_max_select() {
        let input = SubmissionInput {
            q16: Some(
                "Social Mixers,Live Music,Themed Parties,Game Nights,Outdoor Events,Family Events"
                    .to_string(),
            ),
            ..SubmissionInput::default()
        };
        assert_eq!(
            validate_submission(&poll(), &input),
            Err(SubmissionError::TooManySelections {
                index: 16,
                selected: 6,
                max: 5
            })
        );
    }

    #[test]
    fn none_cannot_be_combined() {
        let input = SubmissionInput {
            q14: Some("None,Mobility".to_string()),
            ..SubmissionInput::default()
        };
        assert_eq!(
            validate_submission(&poll(), &input),
            Err(SubmissionError::NoneNotExclusive { index: 14 })
        );

        let alone = SubmissionInput {
            q14: Some("None".to_string()),
            ..SubmissionInput::default()
        };
        assert!(validate_submission(&poll(), &alone).is_ok());
    }

    #[test]
    fn rejects_repeated_selection() {
        let input = SubmissionInput {
            q19: Some("Travel,Arts,Travel".to_string()),
            ..SubmissionInput::default()
        };
        assert!(matches!(
            validate_submission(&poll(), &input),
            Err(SubmissionError::RepeatedOption { index: 19, .. })
        ));
    }

    #[test]
    fn rejects_bad_email() {
        let input = SubmissionInput {
            email: Some("not-an-email".to_string()),
            ..SubmissionInput::default()
        };
        assert!(matches!(
            validate_submission(&poll(), &input),
            Err(SubmissionError::InvalidEmail(_))
        ));
    }

    #[test]
    fn keeps_conditional_text_when_triggered() {
        let input = SubmissionInput {
            q18: Some("Other".to_string()),
            q18_other: Some("Tortoise".to_string()),
            ..SubmissionInput::default()
        };
        let submission = validate_submission(&poll(), &input).unwrap();
        assert_eq!(
            submission.answers.conditional(ConditionalField::OtherPet),
            Some("Tortoise")
        );
    }

    #[test]
    fn rejects_overlong_free_text() {
        let input = SubmissionInput {
            q9: Some("Yes".to_string()),
            q9_ages: Some("7".repeat(256)),
            ..SubmissionInput::default()
        };
        assert!(matches!(
            validate_submission(&poll(), &input),
            Err(SubmissionError::TooLong { .. })
        ));
    }
}
