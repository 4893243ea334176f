use thiserror::Error;

/// Configuration errors raised while compiling field specifications.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("field spec entry {entry:?} must have 1 to 3 parts (name, type, modifier)")]
    InvalidArity { entry: Vec<String> },
    #[error("field spec entry has an empty field name")]
    EmptyName,
    #[error("field '{field}': unknown field type '{token}'")]
    UnknownType { field: String, token: String },
    #[error("field '{field}': {token} is not a valid field property")]
    InvalidModifier { field: String, token: String },
    #[error("field '{0}' is specified more than once")]
    DuplicateField(String),
}
