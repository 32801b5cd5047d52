pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("{operation}: unknown field '{field}'")]
    UnknownField {
        operation: &'static str,
        field: String,
    },

    #[error("{operation}: missing required field '{field}'")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },

    #[error("Field '{field}' must be {expected}, got {actual}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Field '{field}' = {value} is outside {min}..={max} (step {step})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
        step: i64,
    },

    #[error("Field '{field}' = '{value}' is not one of {options:?}")]
    InvalidOption {
        field: &'static str,
        value: String,
        options: &'static [&'static str],
    },

    #[error("Parse error: {0}")]
    Parse(String),
}
