use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::models::{AnswerField, ConditionalField};

const BUILTIN_POLL: &str = include_str!("../poll.toml");

#[derive(Debug, Clone, Deserialize)]
struct RawPoll {
    #[serde(default)]
    question: Vec<RawQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawQuestion {
    headline: String,
    section: String,
    options: Vec<PollOption>,
    #[serde(default)]
    multi_select: bool,
    max_select: Option<usize>,
    conditional: Option<RawConditional>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawConditional {
    trigger: String,
    placeholder: String,
    field_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PollOption {
    pub label: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalPrompt {
    pub trigger: String,
    pub placeholder: String,
    pub field: ConditionalField,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub headline: String,
    pub section: String,
    pub options: Vec<PollOption>,
    pub multi_select: bool,
    pub max_select: Option<usize>,
    pub conditional: Option<ConditionalPrompt>,
    pub field: AnswerField,
}

impl Question {
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|option| option.label.as_str())
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels().any(|known| known == label)
    }
}

/// The ordered, validated questionnaire. Built once and passed by reference
/// to everything that needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollDefinition {
    questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    pub name: &'a str,
    pub questions: Vec<&'a Question>,
}

impl PollDefinition {
    pub fn builtin() -> Result<PollDefinition, ConfigError> {
        PollDefinition::from_toml_str(BUILTIN_POLL)
    }

    pub fn load(path: Option<&Path>) -> Result<PollDefinition, ConfigError> {
        match path {
            None => PollDefinition::builtin(),
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                PollDefinition::from_toml_str(&contents)
            }
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<PollDefinition, ConfigError> {
        let raw: RawPoll = toml::from_str(contents)?;
        if raw.question.is_empty() {
            return Err(ConfigError::Empty);
        }

        let mut used_keys = HashSet::new();
        let mut questions = Vec::with_capacity(raw.question.len());

        for (index, raw) in raw.question.into_iter().enumerate() {
            let field = AnswerField::from_index(index)?;

            if raw.options.is_empty() {
                return Err(ConfigError::NoOptions {
                    index,
                    headline: raw.headline,
                });
            }

            let mut seen = HashSet::new();
            for option in &raw.options {
                if !seen.insert(option.label.as_str()) {
                    return Err(ConfigError::DuplicateOption {
                        index,
                        label: option.label.clone(),
                    });
                }
            }

            match raw.max_select {
                Some(_) if !raw.multi_select => {
                    return Err(ConfigError::MaxSelectOnSingle { index })
                }
                Some(0) => return Err(ConfigError::ZeroMaxSelect { index }),
                _ => {}
            }

            let conditional = match raw.conditional {
                None => None,
                Some(conditional) => {
                    if !seen.contains(conditional.trigger.as_str()) {
                        return Err(ConfigError::UnknownTrigger {
                            index,
                            trigger: conditional.trigger,
                        });
                    }
                    let field = ConditionalField::from_key(&conditional.field_key)?;
                    if !used_keys.insert(field) {
                        return Err(ConfigError::DuplicateFieldKey(conditional.field_key));
                    }
                    Some(ConditionalPrompt {
                        trigger: conditional.trigger,
                        placeholder: conditional.placeholder,
                        field,
                    })
                }
            };

            questions.push(Question {
                headline: raw.headline,
                section: raw.section,
                options: raw.options,
                multi_select: raw.multi_select,
                max_select: raw.max_select,
                conditional,
                field,
            });
        }

        Ok(PollDefinition { questions })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Runs of consecutive questions that share a section name.
    pub fn sections(&self) -> Vec<Section<'_>> {
        let mut sections: Vec<Section<'_>> = Vec::new();
        for question in &self.questions {
            match sections.last_mut() {
                Some(section) if section.name == question.section => {
                    section.questions.push(question)
                }
                _ => sections.push(Section {
                    name: &question.section,
                    questions: vec![question],
                }),
            }
        }
        sections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_POLL: &str = r#"
        [[question]]
        headline = "Pick one"
        section = "Basics"
        options = [{ label = "A" }, { label = "B" }]

        [[question]]
        headline = "Pick some"
        section = "Basics"
        multi_select = true
        max_select = 2
        options = [{ label = "X" }, { label = "Y" }, { label = "Z" }]

        [[question]]
        headline = "Pets?"
        section = "Home"
        options = [{ label = "No" }, { label = "Other" }]
        conditional = { trigger = "Other", placeholder = "What kind?", field_key = "q18_other" }
    "#;

    #[test]
    fn builtin_poll_has_all_questions() {
        let poll = PollDefinition::builtin().unwrap();
        assert_eq!(poll.len(), 21);
        assert_eq!(poll.questions()[20].field, AnswerField::Q20);

        let multi: Vec<usize> = poll
            .questions()
            .iter()
            .filter(|q| q.multi_select)
            .map(|q| q.field.index())
            .collect();
        assert_eq!(multi, vec![14, 16, 19]);
        assert_eq!(poll.questions()[16].max_select, Some(5));

        let illustrated: Vec<usize> = poll
            .questions()
            .iter()
            .filter(|q| q.options.iter().all(|o| o.image.is_some()))
            .map(|q| q.field.index())
            .collect();
        assert_eq!(illustrated, vec![0, 1, 2, 3, 4, 5, 6, 14, 16, 18, 19]);
        assert!(poll.questions()[7].options.iter().all(|o| o.image.is_none()));
        assert_eq!(
            poll.questions()[0].options[0].image.as_deref(),
            Some(
                "https://files.manuscdn.com/user_upload_by_module/session_file/\
                 310419663030067302/SnfGcyEfDodHDCpd.jpg"
            )
        );

        let prompts: Vec<(usize, &str, ConditionalField)> = poll
            .questions()
            .iter()
            .filter_map(|q| {
                q.conditional
                    .as_ref()
                    .map(|p| (q.field.index(), p.trigger.as_str(), p.field))
            })
            .collect();
        assert_eq!(
            prompts,
            vec![
                (9, "Yes", ConditionalField::ChildrenAges),
                (18, "Other", ConditionalField::OtherPet)
            ]
        );
    }

    #[test]
    fn sections_group_consecutive_questions() {
        let poll = PollDefinition::from_toml_str(SMALL_POLL).unwrap();
        let sections = poll.sections();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].name, "Basics");
        assert_eq!(sections[0].questions.len(), 2);
        assert_eq!(sections[1].name, "Home");

        let builtin = PollDefinition::builtin().unwrap();
        let names: Vec<&str> = builtin.sections().iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "Lifestyle",
                "Household",
                "Age",
                "Availability",
                "Wellness",
                "Lifestyle Interests",
                "Pets & Hobbies",
                "Communication"
            ]
        );
    }

    #[test]
    fn rejects_more_questions_than_columns() {
        let mut toml = String::new();
        for i in 0..22 {
            toml.push_str(&format!(
                "[[question]]\nheadline = \"Q{i}\"\nsection = \"S\"\n\
                 options = [{{ label = \"A\" }}]\n\n"
            ));
        }
        assert!(matches!(
            PollDefinition::from_toml_str(&toml),
            Err(ConfigError::NoAnswerColumn(21))
        ));
    }

    #[test]
    fn rejects_inconsistent_questions() {
        let empty = "question = []";
        assert!(matches!(
            PollDefinition::from_toml_str(empty),
            Err(ConfigError::Empty)
        ));

        let duplicate = r#"
            [[question]]
            headline = "Q"
            section = "S"
            options = [{ label = "A" }, { label = "A" }]
        "#;
        assert!(matches!(
            PollDefinition::from_toml_str(duplicate),
            Err(ConfigError::DuplicateOption { index: 0, .. })
        ));

        let max_on_single = r#"
            [[question]]
            headline = "Q"
            section = "S"
            max_select = 2
            options = [{ label = "A" }]
        "#;
        assert!(matches!(
            PollDefinition::from_toml_str(max_on_single),
            Err(ConfigError::MaxSelectOnSingle { index: 0 })
        ));

        let bad_trigger = r#"
            [[question]]
            headline = "Q"
            section = "S"
            options = [{ label = "A" }]
            conditional = { trigger = "B", placeholder = "?", field_key = "q9_ages" }
        "#;
        assert!(matches!(
            PollDefinition::from_toml_str(bad_trigger),
            Err(ConfigError::UnknownTrigger { index: 0, .. })
        ));

        let bad_key = r#"
            [[question]]
            headline = "Q"
            section = "S"
            options = [{ label = "A" }]
            conditional = { trigger = "A", placeholder = "?", field_key = "notes" }
        "#;
        assert!(matches!(
            PollDefinition::from_toml_str(bad_key),
            Err(ConfigError::UnknownFieldKey(_))
        ));
    }

    #[test]
    fn rejects_reused_conditional_key() {
        let reused = r#"
            [[question]]
            headline = "Q0"
            section = "S"
            options = [{ label = "A" }]
            conditional = { trigger = "A", placeholder = "?", field_key = "q9_ages" }

            [[question]]
            headline = "Q1"
            section = "S"
            options = [{ label = "B" }]
            conditional = { trigger = "B", placeholder = "?", field_key = "q9_ages" }
        "#;
        assert!(matches!(
            PollDefinition::from_toml_str(reused),
            Err(ConfigError::DuplicateFieldKey(_))
        ));
    }
}
