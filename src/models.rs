use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const ANSWER_FIELD_COUNT: usize = 21;

/// One answer column of the submissions table, `q0` through `q20`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnswerField {
    Q0,
    Q1,
    Q2,
    Q3,
    Q4,
    Q5,
    Q6,
    Q7,
    Q8,
    Q9,
    Q10,
    Q11,
    Q12,
    Q13,
    Q14,
    Q15,
    Q16,
    Q17,
    Q18,
    Q19,
    Q20,
}

impl AnswerField {
    pub const ALL: [AnswerField; ANSWER_FIELD_COUNT] = [
        AnswerField::Q0,
        AnswerField::Q1,
        AnswerField::Q2,
        AnswerField::Q3,
        AnswerField::Q4,
        AnswerField::Q5,
        AnswerField::Q6,
        AnswerField::Q7,
        AnswerField::Q8,
        AnswerField::Q9,
        AnswerField::Q10,
        AnswerField::Q11,
        AnswerField::Q12,
        AnswerField::Q13,
        AnswerField::Q14,
        AnswerField::Q15,
        AnswerField::Q16,
        AnswerField::Q17,
        AnswerField::Q18,
        AnswerField::Q19,
        AnswerField::Q20,
    ];

    pub fn from_index(index: usize) -> Result<AnswerField, ConfigError> {
        AnswerField::ALL
            .get(index)
            .copied()
            .ok_or(ConfigError::NoAnswerColumn(index))
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn column(self) -> &'static str {
        match self {
            AnswerField::Q0 => "q0",
            AnswerField::Q1 => "q1",
            AnswerField::Q2 => "q2",
            AnswerField::Q3 => "q3",
            AnswerField::Q4 => "q4",
            AnswerField::Q5 => "q5",
            AnswerField::Q6 => "q6",
            AnswerField::Q7 => "q7",
            AnswerField::Q8 => "q8",
            AnswerField::Q9 => "q9",
            AnswerField::Q10 => "q10",
            AnswerField::Q11 => "q11",
            AnswerField::Q12 => "q12",
            AnswerField::Q13 => "q13",
            AnswerField::Q14 => "q14",
            AnswerField::Q15 => "q15",
            AnswerField::Q16 => "q16",
            AnswerField::Q17 => "q17",
            AnswerField::Q18 => "q18",
            AnswerField::Q19 => "q19",
            AnswerField::Q20 => "q20",
        }
    }
}

/// Free-text columns that are only filled when a trigger option is picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionalField {
    ChildrenAges,
    OtherPet,
}

impl ConditionalField {
    pub const ALL: [ConditionalField; 2] =
        [ConditionalField::ChildrenAges, ConditionalField::OtherPet];

    pub fn from_key(key: &str) -> Result<ConditionalField, ConfigError> {
        match key {
            "q9_ages" => Ok(ConditionalField::ChildrenAges),
            "q18_other" => Ok(ConditionalField::OtherPet),
            other => Err(ConfigError::UnknownFieldKey(other.to_string())),
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            ConditionalField::ChildrenAges => "q9_ages",
            ConditionalField::OtherPet => "q18_other",
        }
    }
}

/// Answer values as stored: one optional raw string per answer column, plus
/// the conditional free-text columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSet {
    pub answers: [Option<String>; ANSWER_FIELD_COUNT],
    pub children_ages: Option<String>,
    pub other_pet: Option<String>,
}

impl AnswerSet {
    pub fn answer(&self, field: AnswerField) -> Option<&str> {
        self.answers[field.index()].as_deref()
    }

    pub fn conditional(&self, field: ConditionalField) -> Option<&str> {
        match field {
            ConditionalField::ChildrenAges => self.children_ages.as_deref(),
            ConditionalField::OtherPet => self.other_pet.as_deref(),
        }
    }

    pub fn set_conditional(&mut self, field: ConditionalField, value: Option<String>) {
        match field {
            ConditionalField::ChildrenAges => self.children_ages = value,
            ConditionalField::OtherPet => self.other_pet = value,
        }
    }
}

/// A persisted poll response. Never updated once written.
#[derive(Debug, Clone)]
pub struct Submission {
    pub id: i32,
    pub email: Option<String>,
    pub answers: AnswerSet,
    pub created_at: DateTime<Utc>,
}

impl Submission {
    pub fn answer(&self, field: AnswerField) -> Option<&str> {
        self.answers.answer(field)
    }
}

/// A validated response ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    pub email: Option<String>,
    pub answers: AnswerSet,
    pub created_at: Option<DateTime<Utc>>,
}

/// Submit payload as sent by the questionnaire client.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionInput {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub q0: Option<String>,
    #[serde(default)]
    pub q1: Option<String>,
    #[serde(default)]
    pub q2: Option<String>,
    #[serde(default)]
    pub q3: Option<String>,
    #[serde(default)]
    pub q4: Option<String>,
    #[serde(default)]
    pub q5: Option<String>,
    #[serde(default)]
    pub q6: Option<String>,
    #[serde(default)]
    pub q7: Option<String>,
    #[serde(default)]
    pub q8: Option<String>,
    #[serde(default)]
    pub q9: Option<String>,
    #[serde(default)]
    pub q9_ages: Option<String>,
    #[serde(default)]
    pub q10: Option<String>,
    #[serde(default)]
    pub q11: Option<String>,
    #[serde(default)]
    pub q12: Option<String>,
    #[serde(default)]
    pub q13: Option<String>,
    #[serde(default)]
    pub q14: Option<String>,
    #[serde(default)]
    pub q15: Option<String>,
    #[serde(default)]
    pub q16: Option<String>,
    #[serde(default)]
    pub q17: Option<String>,
    #[serde(default)]
    pub q18: Option<String>,
    #[serde(default)]
    pub q18_other: Option<String>,
    #[serde(default)]
    pub q19: Option<String>,
    #[serde(default)]
    pub q20: Option<String>,
}

impl SubmissionInput {
    pub fn answer(&self, field: AnswerField) -> Option<&str> {
        let value = match field {
            AnswerField::Q0 => &self.q0,
            AnswerField::Q1 => &self.q1,
            AnswerField::Q2 => &self.q2,
            AnswerField::Q3 => &self.q3,
            AnswerField::Q4 => &self.q4,
            AnswerField::Q5 => &self.q5,
            AnswerField::Q6 => &self.q6,
            AnswerField::Q7 => &self.q7,
            AnswerField::Q8 => &self.q8,
            AnswerField::Q9 => &self.q9,
            AnswerField::Q10 => &self.q10,
            AnswerField::Q11 => &self.q11,
            AnswerField::Q12 => &self.q12,
            AnswerField::Q13 => &self.q13,
            AnswerField::Q14 => &self.q14,
            AnswerField::Q15 => &self.q15,
            AnswerField::Q16 => &self.q16,
            AnswerField::Q17 => &self.q17,
            AnswerField::Q18 => &self.q18,
            AnswerField::Q19 => &self.q19,
            AnswerField::Q20 => &self.q20,
        };
        value.as_deref()
    }

    pub fn answer_mut(&mut self, field: AnswerField) -> &mut Option<String> {
        match field {
            AnswerField::Q0 => &mut self.q0,
            AnswerField::Q1 => &mut self.q1,
            AnswerField::Q2 => &mut self.q2,
            AnswerField::Q3 => &mut self.q3,
            AnswerField::Q4 => &mut self.q4,
            AnswerField::Q5 => &mut self.q5,
            AnswerField::Q6 => &mut self.q6,
            AnswerField::Q7 => &mut self.q7,
            AnswerField::Q8 => &mut self.q8,
            AnswerField::Q9 => &mut self.q9,
            AnswerField::Q10 => &mut self.q10,
            AnswerField::Q11 => &mut self.q11,
            AnswerField::Q12 => &mut self.q12,
            AnswerField::Q13 => &mut self.q13,
            AnswerField::Q14 => &mut self.q14,
            AnswerField::Q15 => &mut self.q15,
            AnswerField::Q16 => &mut self.q16,
            AnswerField::Q17 => &mut self.q17,
            AnswerField::Q18 => &mut self.q18,
            AnswerField::Q19 => &mut self.q19,
            AnswerField::Q20 => &mut self.q20,
        }
    }

    pub fn conditional(&self, field: ConditionalField) -> Option<&str> {
        match field {
            ConditionalField::ChildrenAges => self.q9_ages.as_deref(),
            ConditionalField::OtherPet => self.q18_other.as_deref(),
        }
    }

    pub fn conditional_mut(&mut self, field: ConditionalField) -> &mut Option<String> {
        match field {
            ConditionalField::ChildrenAges => &mut self.q9_ages,
            ConditionalField::OtherPet => &mut self.q18_other,
        }
    }
}
