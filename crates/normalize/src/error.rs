use thiserror::Error;

/// Errors raised while normalizing a table.
///
/// `InvalidPrice` and `InvalidLatLong` are data-format errors: a typed field
/// held a cell that cannot be parsed. Nothing is silently coerced to null.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum NormalizeError {
    #[error("invalid normalize config: {0}")]
    InvalidConfig(String),
    #[error("field '{0}' is not a column of the table")]
    UnknownColumn(String),
    #[error("column '{column}': cannot parse '{value}' as a price")]
    InvalidPrice { column: String, value: String },
    #[error("column '{column}': cannot parse '{value}' as a lat/long pair; {hint}")]
    InvalidLatLong {
        column: String,
        value: String,
        hint: &'static str,
    },
}
