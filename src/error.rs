use thiserror::Error;

/// Problems with the poll definition, caught when it is loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse poll definition: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read poll definition: {0}")]
    Io(#[from] std::io::Error),

    #[error("poll definition has no questions")]
    Empty,

    #[error("question {0} has no answer column (only q0-q20 exist)")]
    NoAnswerColumn(usize),

    #[error("question {index} ({headline}) has no options")]
    NoOptions { index: usize, headline: String },

    #[error("question {index} lists option {label:?} more than once")]
    DuplicateOption { index: usize, label: String },

    #[error("question {index} sets max_select but is not multi-select")]
    MaxSelectOnSingle { index: usize },

    #[error("question {index} sets max_select to zero")]
    ZeroMaxSelect { index: usize },

    #[error("question {index} conditional trigger {trigger:?} is not one of its options")]
    UnknownTrigger { index: usize, trigger: String },

    #[error("unknown conditional field key {0:?}")]
    UnknownFieldKey(String),

    #[error("conditional field key {0:?} is used by more than one question")]
    DuplicateFieldKey(String),
}

/// Reasons a submitted answer set is refused before it reaches storage.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("question {index}: {value:?} is not an option")]
    UnknownOption { index: usize, value: String },

    #[error("question {index}: {label:?} selected more than once")]
    RepeatedOption { index: usize, label: String },

    #[error("question {index}: {selected} selections exceed the limit of {max}")]
    TooManySelections {
        index: usize,
        selected: usize,
        max: usize,
    },

    #[error("question {index}: \"None\" cannot be combined with other options")]
    NoneNotExclusive { index: usize },

    #[error("{field}: value is longer than {limit} characters")]
    TooLong { field: String, limit: usize },

    #[error("invalid email address {0:?}")]
    InvalidEmail(String),
}
